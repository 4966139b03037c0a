//! Export of an itinerary to downloadable documents
//!
//! Both formats are pure functions of the itinerary string (and, for PDF,
//! the font). Anything that could not be put on the page is reported back in
//! [`Rendered`] instead of being dropped silently.

mod docx;
mod font;
mod pdf;
mod wrap;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub use docx::{docx_text, to_docx};
pub use font::{PT_PER_MM, PdfFont, PdfFonts};
pub use pdf::{MAX_FONT_SIZE, MIN_FONT_SIZE, PageLayout, layout, to_pdf};
pub use wrap::{wrap_by, wrap_text};

/// Title line of every exported document
pub const HEADING: &str = "Travel Itinerary";

/// Errors producing or writing an export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("DOCX rendering failed: {0}")]
    Docx(String),

    #[error("Failed to load PDF font: {0}")]
    Font(String),

    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported document formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    /// `itinerary.<ext>` in `dir`
    pub fn default_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(format!("itinerary.{}", self.extension()))
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" => Ok(Self::Docx),
            _ => Err(format!("Unknown export format: {}. Use: pdf, docx", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A rendered document plus whatever did not make it in
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    /// Wrapped lines left off the page
    pub lines_dropped: usize,
    /// Characters the font has no glyph for
    pub missing_chars: Vec<char>,
}

impl Rendered {
    pub fn complete(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            lines_dropped: 0,
            missing_chars: Vec::new(),
        }
    }

    /// True when the document shows the whole itinerary
    pub fn is_complete(&self) -> bool {
        self.lines_dropped == 0 && self.missing_chars.is_empty()
    }

    /// Human-readable notes about missing content, empty when complete
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.lines_dropped > 0 {
            warnings.push(format!(
                "{} line(s) did not fit on the page and were left out",
                self.lines_dropped
            ));
        }
        if !self.missing_chars.is_empty() {
            warnings.push(format!(
                "The PDF font cannot draw {}; set export.pdf-font to a TTF that covers them",
                self.missing_chars.iter().collect::<String>()
            ));
        }
        warnings
    }
}

/// Renders and writes documents with a fixed set of PDF fonts
#[derive(Debug)]
pub struct Exporter {
    fonts: PdfFonts,
}

impl Exporter {
    /// Use the TTF at `pdf_font`, or the bundled fonts when `None`
    pub fn new(pdf_font: Option<&Path>) -> Result<Self, ExportError> {
        debug!(?pdf_font, "Exporter::new: called");
        Ok(Self {
            fonts: PdfFonts::load(pdf_font)?,
        })
    }

    /// Render `itinerary` in `format`
    pub fn render(&self, itinerary: &str, format: ExportFormat) -> Result<Rendered, ExportError> {
        match format {
            ExportFormat::Pdf => to_pdf(itinerary, &self.fonts),
            ExportFormat::Docx => to_docx(itinerary).map(Rendered::complete),
        }
    }

    /// Render and write to `path`, creating parent directories
    pub fn write(&self, itinerary: &str, format: ExportFormat, path: impl AsRef<Path>) -> Result<Rendered, ExportError> {
        let path = path.as_ref();
        debug!(%format, ?path, "Exporter::write: called");
        let rendered = self.render(itinerary, format)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &rendered.bytes)?;
        info!(
            %format,
            path = %path.display(),
            bytes = rendered.bytes.len(),
            complete = rendered.is_complete(),
            "Wrote export"
        );
        Ok(rendered)
    }
}
