//! Prompt Loader
//!
//! Loads prompt templates from an override directory or falls back to the
//! embedded defaults, then renders them with Handlebars.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

const SYSTEM_TEMPLATE: &str = "itinerary-system";
const HUMAN_TEMPLATE: &str = "itinerary-human";

/// Values substituted into the itinerary templates
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    /// Destination city, verbatim
    pub city: String,
    /// Normalized interests re-joined with `", "`
    pub interests: String,
}

/// The two messages sent for one itinerary request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub human: String,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// Override directory (e.g., `~/.config/tripplanner/prompts/`)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `dir` for `{name}.pmt` before the embedded templates
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let exists = dir.is_dir();
        debug!(?dir, %exists, "PromptLoader::new: called");

        Self {
            hbs: plain_text_engine(),
            override_dir: exists.then(|| dir.to_path_buf()),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: plain_text_engine(),
            override_dir: None,
        }
    }

    /// Build from an optional configured directory
    pub fn from_dir(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => Self::new(dir),
            None => Self::embedded_only(),
        }
    }

    /// Load a template by name, override directory first
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt override {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    ///
    /// Trailing whitespace of the template file is dropped so an editor's
    /// final newline never leaks into the message.
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        debug!(%template_name, city = %context.city, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(template.trim_end(), context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Render the system and human messages of an itinerary request
    pub fn itinerary(&self, context: &PromptContext) -> Result<RenderedPrompt> {
        Ok(RenderedPrompt {
            system: self.render(SYSTEM_TEMPLATE, context)?,
            human: self.render(HUMAN_TEMPLATE, context)?,
        })
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

/// Handlebars escapes HTML by default; prompts are plain text
fn plain_text_engine() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(handlebars::no_escape);
    hbs
}
