//! Page rasterization
//!
//! Pages are drawn in unrotated page space (origin bottom-left, points)
//! and the finished raster is turned to match the page rotation.

use crate::image_codec::to_rgba;
use crate::{RenderTarget, Result, StoreError};
use doc_model::{AnnotationVisitor, EmbeddedImage, Page, PageBox, PageContent, Point, Rect};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([20, 20, 120, 255]);
const NOTE_FILL: Rgba<u8> = Rgba([255, 230, 110, 255]);

/// Draw `page` at `target` size
pub fn render_page(page: &Page, target: RenderTarget) -> Result<RgbaImage> {
    let crop = page.bounds(PageBox::Crop);
    // Rotation is applied last, so lay out the unrotated page
    let (rotated_w, rotated_h) = target.pixel_size(page.display_size().width, page.display_size().height);
    let (width, height) = if page.rotation() % 180 == 0 {
        (rotated_w, rotated_h)
    } else {
        (rotated_h, rotated_w)
    };

    let mut canvas = Canvas::new(crop, width, height);
    if let PageContent::Image(image) = page.content() {
        canvas.draw_image(crop, image)?;
    }
    for annotation in page.annotations() {
        annotation.accept(&mut canvas);
    }
    if let Some(e) = canvas.error.take() {
        return Err(e);
    }

    Ok(match page.rotation() {
        90 => imageops::rotate90(&canvas.pixels),
        180 => imageops::rotate180(&canvas.pixels),
        270 => imageops::rotate270(&canvas.pixels),
        _ => canvas.pixels,
    })
}

struct Canvas {
    pixels: RgbaImage,
    origin: Rect,
    scale_x: f32,
    scale_y: f32,
    error: Option<StoreError>,
}

impl Canvas {
    fn new(origin: Rect, width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, WHITE),
            origin,
            scale_x: width as f32 / origin.width.max(1.0),
            scale_y: height as f32 / origin.height.max(1.0),
            error: None,
        }
    }

    /// Page space to pixel space; y flips because rasters grow downwards
    fn to_pixel(&self, point: Point) -> (f32, f32) {
        (
            (point.x - self.origin.x) * self.scale_x,
            (self.origin.max_y() - point.y) * self.scale_y,
        )
    }

    /// Pixel rectangle `(left, top, width, height)` covering `bounds`
    fn pixel_rect(&self, bounds: Rect) -> (i64, i64, u32, u32) {
        let (left, top) = self.to_pixel(Point::new(bounds.x, bounds.max_y()));
        let width = (bounds.width * self.scale_x).round().max(1.0) as u32;
        let height = (bounds.height * self.scale_y).round().max(1.0) as u32;
        (left.round() as i64, top.round() as i64, width, height)
    }

    fn draw_image(&mut self, bounds: Rect, image: &EmbeddedImage) -> Result<()> {
        let source = to_rgba(image)?;
        let (left, top, width, height) = self.pixel_rect(bounds);
        let scaled = imageops::resize(&source, width, height, FilterType::Triangle);
        imageops::overlay(&mut self.pixels, &scaled, left, top);
        Ok(())
    }

    fn fill(&mut self, bounds: Rect, color: Rgba<u8>) {
        let (left, top, width, height) = self.pixel_rect(bounds);
        for y in top.max(0)..(top + height as i64).min(self.pixels.height() as i64) {
            for x in left.max(0)..(left + width as i64).min(self.pixels.width() as i64) {
                self.pixels.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    /// Square pen stamped along the segment
    fn line(&mut self, from: Point, to: Point, line_width: f32) {
        let (x0, y0) = self.to_pixel(from);
        let (x1, y1) = self.to_pixel(to);
        let radius = ((line_width * self.scale_x) / 2.0).max(0.5);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;

        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let (cx, cy) = (x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
            let (min_x, max_x) = ((cx - radius).floor() as i64, (cx + radius).ceil() as i64);
            let (min_y, max_y) = ((cy - radius).floor() as i64, (cy + radius).ceil() as i64);
            for y in min_y.max(0)..max_y.min(self.pixels.height() as i64) {
                for x in min_x.max(0)..max_x.min(self.pixels.width() as i64) {
                    self.pixels.put_pixel(x as u32, y as u32, INK);
                }
            }
        }
    }
}

impl AnnotationVisitor for Canvas {
    fn visit_stamp(&mut self, bounds: Rect, image: &EmbeddedImage) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.draw_image(bounds, image) {
            self.error = Some(e);
        }
    }

    fn visit_ink(&mut self, _bounds: Rect, strokes: &[Vec<Point>], line_width: f32) {
        for stroke in strokes {
            match stroke.as_slice() {
                [] => {}
                [only] => self.line(*only, *only, line_width),
                points => {
                    for pair in points.windows(2) {
                        self.line(pair[0], pair[1], line_width);
                    }
                }
            }
        }
    }

    fn visit_note(&mut self, bounds: Rect, _contents: &str) {
        self.fill(bounds, NOTE_FILL);
    }
}
