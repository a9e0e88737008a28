//! PDF object model and serialization
//!
//! Only the object kinds a flattened export needs. Dictionaries keep their
//! keys sorted so output is deterministic.

use std::collections::BTreeMap;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Integer(i64),
    Real(f64),
    /// Literal string, escaped on output
    String(Vec<u8>),
    /// Hexadecimal string
    Hex(Vec<u8>),
    Name(String),
    Array(Vec<PdfObject>),
    Dictionary(PdfDictionary),
    /// Indirect reference to object `n 0`
    Reference(u32),
}

impl PdfObject {
    pub fn name(name: impl Into<String>) -> Self {
        PdfObject::Name(name.into())
    }

    /// A text string. ASCII is written literally, anything else as
    /// UTF-16BE with a byte order mark.
    pub fn text(text: &str) -> Self {
        if text.is_ascii() {
            PdfObject::String(text.as_bytes().to_vec())
        } else {
            let mut bytes = vec![0xFE, 0xFF];
            bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
            PdfObject::Hex(bytes)
        }
    }

    /// `[x y width height]` style rectangle as `[llx lly urx ury]`
    pub fn rect(width: f32, height: f32) -> Self {
        PdfObject::Array(vec![
            PdfObject::Integer(0),
            PdfObject::Integer(0),
            PdfObject::Real(width as f64),
            PdfObject::Real(height as f64),
        ])
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self {
            PdfObject::Integer(n) => write!(out, "{}", n),
            PdfObject::Real(n) => write_real(out, *n),
            PdfObject::String(bytes) => write_literal(out, bytes),
            PdfObject::Hex(bytes) => {
                out.write_all(b"<")?;
                for byte in bytes {
                    write!(out, "{:02X}", byte)?;
                }
                out.write_all(b">")
            }
            PdfObject::Name(name) => write_name(out, name),
            PdfObject::Array(items) => {
                out.write_all(b"[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.write_all(b" ")?;
                    }
                    item.write_to(out)?;
                }
                out.write_all(b"]")
            }
            PdfObject::Dictionary(dict) => dict.write_to(out),
            PdfObject::Reference(number) => write!(out, "{} 0 R", number),
        }
    }
}

impl From<PdfDictionary> for PdfObject {
    fn from(dict: PdfDictionary) -> Self {
        PdfObject::Dictionary(dict)
    }
}

impl From<i64> for PdfObject {
    fn from(n: i64) -> Self {
        PdfObject::Integer(n)
    }
}

fn write_real<W: Write>(out: &mut W, n: f64) -> io::Result<()> {
    if n.fract() == 0.0 {
        return write!(out, "{}", n as i64);
    }
    let formatted = format!("{:.4}", n);
    write!(out, "{}", formatted.trim_end_matches('0').trim_end_matches('.'))
}

fn write_literal<W: Write>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    out.write_all(b"(")?;
    for &byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => out.write_all(&[b'\\', byte])?,
            b'\n' => out.write_all(b"\\n")?,
            b'\r' => out.write_all(b"\\r")?,
            0x20..=0x7E => out.write_all(&[byte])?,
            _ => write!(out, "\\{:03o}", byte)?,
        }
    }
    out.write_all(b")")
}

fn write_name<W: Write>(out: &mut W, name: &str) -> io::Result<()> {
    out.write_all(b"/")?;
    for byte in name.bytes() {
        let delimiter = b"#()<>[]{}/%".contains(&byte);
        if (0x21..=0x7E).contains(&byte) && !delimiter {
            out.write_all(&[byte])?;
        } else {
            write!(out, "#{:02X}", byte)?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfDictionary {
    entries: BTreeMap<String, PdfObject>,
}

impl PdfDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dictionary with a `/Type` entry
    pub fn typed(type_name: &str) -> Self {
        let mut dict = Self::new();
        dict.insert("Type", PdfObject::name(type_name));
        dict
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PdfObject>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PdfObject>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(b"<<")?;
        for (key, value) in &self.entries {
            out.write_all(b" ")?;
            write_name(out, key)?;
            out.write_all(b" ")?;
            value.write_to(out)?;
        }
        out.write_all(b" >>")
    }
}

/// Stream dictionary plus payload
#[derive(Debug, Clone)]
pub struct PdfStream {
    pub dict: PdfDictionary,
    pub data: Vec<u8>,
    /// Payload already carries its own filter (e.g. JPEG)
    pub encoded: bool,
}

impl PdfStream {
    pub fn new(dict: PdfDictionary, data: Vec<u8>) -> Self {
        Self { dict, data, encoded: false }
    }

    pub fn pre_encoded(dict: PdfDictionary, data: Vec<u8>) -> Self {
        Self { dict, data, encoded: true }
    }
}
