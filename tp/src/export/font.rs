//! TrueType fonts embedded in PDF exports
//!
//! DejaVu Sans ships inside the binary and covers Latin, Greek, Cyrillic and
//! common symbols. Scripts outside it (CJK for example) need a TTF supplied
//! through `export.pdf-font`; characters the font lacks are reported rather
//! than rendered.

use std::fs;
use std::path::Path;

use owned_ttf_parser::{AsFaceRef, Face, OwnedFace};
use tracing::debug;

use super::ExportError;

const DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

/// Typographic points per millimetre
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// A parsed TrueType font
#[derive(Debug)]
pub struct PdfFont {
    face: OwnedFace,
}

impl PdfFont {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ExportError> {
        let face = OwnedFace::from_vec(bytes, 0).map_err(|e| ExportError::Font(format!("{:?}", e)))?;
        Ok(Self { face })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();
        debug!(?path, "PdfFont::from_file: called");
        let bytes = fs::read(path).map_err(|e| ExportError::Font(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(bytes)
    }

    /// Raw font file, as embedded in the PDF
    pub fn bytes(&self) -> &[u8] {
        self.face.as_slice()
    }

    fn face(&self) -> &Face<'_> {
        self.face.as_face_ref()
    }

    /// Glyph id for `c`, if the font has one
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face().glyph_index(c).map(|g| g.0)
    }

    /// Width of `text` in millimetres at `size` points
    ///
    /// Characters without a glyph take no space, matching what gets drawn.
    pub fn width_mm(&self, text: &str, size: f32) -> f32 {
        let face = self.face();
        let units: u32 = text
            .chars()
            .filter_map(|c| face.glyph_index(c))
            .filter_map(|g| face.glyph_hor_advance(g))
            .map(u32::from)
            .sum();
        units as f32 / f32::from(face.units_per_em()) * size / PT_PER_MM
    }

    /// Distinct characters of `text` this font cannot draw, in order of appearance
    pub fn missing_chars(&self, text: &str) -> Vec<char> {
        let mut missing = Vec::new();
        for c in text.chars() {
            if c.is_control() || missing.contains(&c) {
                continue;
            }
            if self.glyph_id(c).is_none() {
                missing.push(c);
            }
        }
        missing
    }
}

/// Heading and body fonts of a PDF export
#[derive(Debug)]
pub struct PdfFonts {
    pub heading: PdfFont,
    pub body: PdfFont,
}

impl PdfFonts {
    /// Bundled DejaVu Sans (bold heading, regular body)
    pub fn bundled() -> Result<Self, ExportError> {
        Ok(Self {
            heading: PdfFont::from_bytes(DEJAVU_SANS_BOLD.to_vec())?,
            body: PdfFont::from_bytes(DEJAVU_SANS.to_vec())?,
        })
    }

    /// One user-supplied TTF for both heading and body
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();
        Ok(Self {
            heading: PdfFont::from_file(path)?,
            body: PdfFont::from_file(path)?,
        })
    }

    /// `path` when configured, the bundled fonts otherwise
    pub fn load(path: Option<&Path>) -> Result<Self, ExportError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::bundled(),
        }
    }
}
