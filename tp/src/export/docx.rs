//! Word document rendering

use std::io::Cursor;

use docx_rs::{BreakType, DocumentChild, Docx, Paragraph, ParagraphChild, Run, RunChild};
use tracing::debug;

use super::{ExportError, HEADING};

/// Render the itinerary as a DOCX: one bold heading, one paragraph
///
/// Lines of the itinerary become line breaks inside the paragraph.
pub fn to_docx(itinerary: &str) -> Result<Vec<u8>, ExportError> {
    debug!(len = itinerary.len(), "to_docx: called");
    let heading = Paragraph::new().add_run(Run::new().add_text(HEADING).bold().size(32));

    let mut run = Run::new();
    for (i, line) in itinerary.lines().enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    let body = Paragraph::new().add_run(run);

    let mut buf = Vec::new();
    Docx::new()
        .add_paragraph(heading)
        .add_paragraph(body)
        .build()
        .pack(Cursor::new(&mut buf))
        .map_err(|e| ExportError::Docx(e.to_string()))?;
    Ok(buf)
}

/// Text of each paragraph in a DOCX, line breaks as `\n`
pub fn docx_text(bytes: &[u8]) -> Result<Vec<String>, ExportError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExportError::Docx(e.to_string()))?;

    let mut paragraphs = Vec::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let mut text = String::new();
            for paragraph_child in &paragraph.children {
                if let ParagraphChild::Run(run) = paragraph_child {
                    for run_child in &run.children {
                        match run_child {
                            RunChild::Text(t) => text.push_str(&t.text),
                            RunChild::Break(_) => text.push('\n'),
                            _ => {}
                        }
                    }
                }
            }
            paragraphs.push(text);
        }
    }
    Ok(paragraphs)
}
