pub mod document;
pub mod persistence;

pub use document::{fill_missing_function_uuids, get_by_value, refsort, Document, FunctionRef};

use crate::config::{Config, EditorSettings};
use crate::templates::TemplateLibrary;

/// Everything an editor command operates on: the open document, where to
/// find fixture templates, and the behaviour settings from config.
///
/// Passed by `&mut` into every dispatch; there is no global document.
pub struct Session {
    pub document: Document,
    pub templates: TemplateLibrary,
    pub settings: EditorSettings,
}

impl Session {
    pub fn new(document: Document, templates: TemplateLibrary, settings: EditorSettings) -> Self {
        Self {
            document,
            templates,
            settings,
        }
    }

    /// Empty document, templates and settings taken from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Document::new(),
            TemplateLibrary::new(config.data_dirs()),
            config.settings(),
        )
    }
}
