//! PDF file writer
//!
//! Tracks byte offsets of indirect objects so the cross-reference table
//! can be emitted at the end.

use super::objects::{PdfDictionary, PdfObject, PdfStream};
use crate::Result;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

pub const PDF_VERSION: &str = "1.7";

pub struct PdfWriter {
    out: Vec<u8>,
    /// Offset of object `n` at index `n - 1`; `None` until written
    offsets: Vec<Option<usize>>,
    compress: bool,
}

impl PdfWriter {
    pub fn new(compress: bool) -> Self {
        let mut out = format!("%PDF-{}\n", PDF_VERSION).into_bytes();
        // Binary marker so transfer tools treat the file as binary
        out.extend_from_slice(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n']);
        Self { out, offsets: Vec::new(), compress }
    }

    /// Reserve an object number
    pub fn allocate(&mut self) -> u32 {
        self.offsets.push(None);
        self.offsets.len() as u32
    }

    fn begin(&mut self, number: u32) -> Result<()> {
        let slot = (number as usize)
            .checked_sub(1)
            .and_then(|index| self.offsets.get_mut(index))
            .ok_or_else(|| crate::StoreError::Write(format!("object {} was never allocated", number)))?;
        *slot = Some(self.out.len());
        write!(self.out, "{} 0 obj\n", number)?;
        Ok(())
    }

    pub fn write_object(&mut self, number: u32, object: &PdfObject) -> Result<()> {
        self.begin(number)?;
        object.write_to(&mut self.out)?;
        self.out.extend_from_slice(b"\nendobj\n");
        Ok(())
    }

    /// Write a stream, deflating it unless it is already encoded
    pub fn write_stream(&mut self, number: u32, mut stream: PdfStream) -> Result<()> {
        if self.compress && !stream.encoded {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&stream.data)?;
            stream.data = encoder.finish()?;
            stream.dict.insert("Filter", PdfObject::name("FlateDecode"));
        }
        stream.dict.insert("Length", stream.data.len() as i64);

        self.begin(number)?;
        stream.dict.write_to(&mut self.out)?;
        self.out.extend_from_slice(b"\nstream\n");
        self.out.extend_from_slice(&stream.data);
        self.out.extend_from_slice(b"\nendstream\nendobj\n");
        Ok(())
    }

    /// Emit the xref table and trailer and return the file
    pub fn finish(mut self, catalog: u32, info: Option<u32>) -> Result<Vec<u8>> {
        let xref_offset = self.out.len();
        write!(self.out, "xref\n0 {}\n", self.offsets.len() + 1)?;
        self.out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &self.offsets {
            match offset {
                Some(offset) => write!(self.out, "{:010} 00000 n \n", offset)?,
                None => self.out.extend_from_slice(b"0000000000 65535 f \n"),
            }
        }

        let mut trailer = PdfDictionary::new()
            .with("Size", (self.offsets.len() + 1) as i64)
            .with("Root", PdfObject::Reference(catalog));
        if let Some(info) = info {
            trailer.insert("Info", PdfObject::Reference(info));
        }
        self.out.extend_from_slice(b"trailer\n");
        trailer.write_to(&mut self.out)?;
        write!(self.out, "\nstartxref\n{}\n%%EOF\n", xref_offset)?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_trailer() {
        let mut writer = PdfWriter::new(false);
        let catalog = writer.allocate();
        writer.write_object(catalog, &PdfDictionary::typed("Catalog").into()).unwrap();
        let bytes = writer.finish(catalog, None).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.starts_with("%PDF-1.7"));
        assert!(text.contains("1 0 obj\n<< /Type /Catalog >>\nendobj"));
        assert!(text.contains("xref\n0 2\n"));
        assert!(text.contains("/Root 1 0 R"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut writer = PdfWriter::new(false);
        let first = writer.allocate();
        let second = writer.allocate();
        writer.write_object(first, &PdfObject::Integer(1)).unwrap();
        writer.write_object(second, &PdfObject::Integer(2)).unwrap();
        let bytes = writer.finish(first, None).unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();

        let xref = &text[text.find("xref\n").unwrap()..];
        let offsets: Vec<usize> = xref
            .lines()
            .skip(3)
            .take(2)
            .map(|line| line[..10].parse().unwrap())
            .collect();
        assert!(text[offsets[0]..].starts_with("1 0 obj"));
        assert!(text[offsets[1]..].starts_with("2 0 obj"));
    }

    #[test]
    fn test_streams_are_deflated() {
        let mut writer = PdfWriter::new(true);
        let number = writer.allocate();
        let data = vec![b'x'; 4096];
        writer.write_stream(number, PdfStream::new(PdfDictionary::new(), data)).unwrap();
        let bytes = writer.finish(number, None).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Filter /FlateDecode"));
        assert!(bytes.len() < 4096);
    }

    #[test]
    fn test_pre_encoded_streams_are_left_alone() {
        let mut writer = PdfWriter::new(true);
        let number = writer.allocate();
        let stream = PdfStream::pre_encoded(PdfDictionary::new().with("Filter", PdfObject::name("DCTDecode")), vec![1, 2, 3]);
        writer.write_stream(number, stream).unwrap();
        let bytes = writer.finish(number, None).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Length 3"));
        assert!(!text.contains("FlateDecode"));
    }

    #[test]
    fn test_unallocated_object_is_an_error() {
        let mut writer = PdfWriter::new(false);
        assert!(writer.write_object(3, &PdfObject::Integer(0)).is_err());
    }
}
