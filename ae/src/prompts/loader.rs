//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Context, Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::domain::{CLASSIFICATION_TABLE_VERSION, Objective, TaskTag};

/// One row of the digit table, as rendered into the classify prompts
#[derive(Debug, Clone, Serialize)]
pub struct TagOption {
    pub digit: u32,
    pub meaning: &'static str,
}

/// Context for rendering prompt templates
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    /// The user's objective
    pub objective: String,
    /// Free-text constraints on the objective
    pub context: String,
    /// Task text for subdivide/classify prompts
    pub task: Option<String>,
    /// Capability document for the feasibility prompt
    pub abilities: Option<String>,
    /// Digit table rows for the classify prompts
    pub options: Vec<TagOption>,
    /// Digit to answer with when unsure
    pub fallback_digit: Option<u32>,
    /// Version of the digit table the options came from
    pub table_version: u32,
}

impl PromptContext {
    /// Context grounded in one objective
    pub fn for_objective(objective: &Objective) -> Self {
        debug!(objective = %objective.objective(), "PromptContext::for_objective: called");
        Self {
            objective: objective.objective().to_string(),
            context: objective.context().to_string(),
            table_version: CLASSIFICATION_TABLE_VERSION,
            ..Self::default()
        }
    }

    /// Scope the prompt to a single task
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Interpolate the capability document
    pub fn with_abilities(mut self, abilities: impl Into<String>) -> Self {
        self.abilities = Some(abilities.into());
        self
    }

    /// Render the option list from the digit table
    pub fn with_tag_options(mut self) -> Self {
        self.options = TaskTag::ALL
            .iter()
            .map(|tag| TagOption {
                digit: tag.digit(),
                meaning: tag.meaning(),
            })
            .collect();
        self.fallback_digit = Some(TaskTag::Subdivide.digit());
        self
    }
}

/// Loads and renders prompt templates
///
/// Lookup order: `.autoevolver/prompts/`, then `prompts/`, then the copies
/// compiled into the binary.
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// Existing override directories, highest priority first
    search_dirs: Vec<PathBuf>,
}

impl PromptLoader {
    /// Create a loader whose override directories live under `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let search_dirs: Vec<PathBuf> = [root.join(".autoevolver").join("prompts"), root.join("prompts")]
            .into_iter()
            .filter(|dir| dir.is_dir())
            .collect();
        debug!(?root, ?search_dirs, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            search_dirs,
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            search_dirs: Vec::new(),
        }
    }

    /// Prompts are plain text, not HTML
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Raw text of template `name` from the first source that has it
    pub fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        let file_name = format!("{}.pmt", name);

        for dir in &self.search_dirs {
            let path = dir.join(&file_name);
            if path.is_file() {
                debug!(?path, "PromptLoader::load_template: override found");
                return std::fs::read_to_string(&path).context(format!("Failed to read prompt {}", path.display()));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("No prompt template named '{}'", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        debug!(%template_name, objective = %context.objective, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}
