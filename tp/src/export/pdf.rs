//! Single-page PDF rendering

use printpdf::{Mm, PdfDocument};
use tracing::{debug, warn};

use super::font::{PT_PER_MM, PdfFont, PdfFonts};
use super::wrap::wrap_by;
use super::{ExportError, HEADING, Rendered};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const HEADING_SIZE: f32 = 16.0;
const HEADING_Y_MM: f32 = 277.0;
const BODY_TOP_MM: f32 = 265.0;

/// Body text starts at this size and shrinks until the page fits
pub const MAX_FONT_SIZE: f32 = 11.0;
/// Smallest body size; past this, lines are dropped
pub const MIN_FONT_SIZE: f32 = 7.0;
const FONT_SIZE_STEP: f32 = 0.5;
const LINE_SPACING: f32 = 1.3;

/// Where the body text goes on the page
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Body font size in points
    pub font_size: f32,
    pub line_height_mm: f32,
    pub lines: Vec<String>,
    /// Wrapped lines that did not fit even at [`MIN_FONT_SIZE`]
    pub lines_dropped: usize,
}

/// Lay out `itinerary` in the largest body size that fits one page
pub fn layout(itinerary: &str, font: &PdfFont) -> PageLayout {
    let text_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let text_height = BODY_TOP_MM - MARGIN_MM;
    let mut font_size = MAX_FONT_SIZE;

    loop {
        let line_height_mm = font_size * LINE_SPACING / PT_PER_MM;
        let capacity = (text_height / line_height_mm).floor() as usize + 1;
        let mut lines = wrap_by(itinerary, text_width, |s| font.width_mm(s, font_size));

        if lines.len() <= capacity {
            debug!(font_size, line_count = lines.len(), "layout: fits");
            return PageLayout {
                font_size,
                line_height_mm,
                lines,
                lines_dropped: 0,
            };
        }

        if font_size <= MIN_FONT_SIZE {
            let lines_dropped = lines.len() - capacity;
            warn!(total = lines.len(), kept = capacity, "layout: itinerary does not fit on one page");
            lines.truncate(capacity);
            return PageLayout {
                font_size,
                line_height_mm,
                lines,
                lines_dropped,
            };
        }

        font_size = (font_size - FONT_SIZE_STEP).max(MIN_FONT_SIZE);
    }
}

/// Render the itinerary as a one-page A4 PDF
pub fn to_pdf(itinerary: &str, fonts: &PdfFonts) -> Result<Rendered, ExportError> {
    let page = layout(itinerary, &fonts.body);
    let missing_chars = fonts.body.missing_chars(itinerary);
    if !missing_chars.is_empty() {
        warn!(missing = %missing_chars.iter().collect::<String>(), "to_pdf: font has no glyphs for some characters");
    }
    debug!(line_count = page.lines.len(), font_size = page.font_size, "to_pdf: called");

    let (doc, page_index, layer_index) = PdfDocument::new(HEADING, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Itinerary");
    let heading_font = doc
        .add_external_font(fonts.heading.bytes())
        .map_err(|e| ExportError::Pdf(format!("{:?}", e)))?;
    let body_font = doc
        .add_external_font(fonts.body.bytes())
        .map_err(|e| ExportError::Pdf(format!("{:?}", e)))?;

    let layer = doc.get_page(page_index).get_layer(layer_index);
    layer.use_text(HEADING, HEADING_SIZE, Mm(MARGIN_MM), Mm(HEADING_Y_MM), &heading_font);

    let mut y = BODY_TOP_MM;
    for line in &page.lines {
        if !line.is_empty() {
            layer.use_text(line.as_str(), page.font_size, Mm(MARGIN_MM), Mm(y), &body_font);
        }
        y -= page.line_height_mm;
    }

    let bytes = doc.save_to_bytes().map_err(|e| ExportError::Pdf(format!("{:?}", e)))?;
    Ok(Rendered {
        bytes,
        lines_dropped: page.lines_dropped,
        missing_chars,
    })
}
