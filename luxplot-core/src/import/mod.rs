//! Importers that rebuild plot records from console export files.
//!
//! Importers never touch the document directly when an editor command
//! exists for the job; they synthesise [`EditorAction`]s and run them through
//! the same dispatcher the command line uses.
//!
//! [`EditorAction`]: luxplot_types::EditorAction

pub mod ascii;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use luxplot_types::ImportAction;

use crate::dispatch::DispatchResult;
use crate::error::{Error, Result};
use crate::state::Session;

/// What to read out of an ASCII file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportTarget {
    /// `Patch` lines: one conventional-template fixture per channel.
    ConventionalPatch,
    /// `$Personality` and `$Patch` blocks written by Eos consoles.
    EosPatch,
    /// `Cue` blocks with their levels.
    Cues,
}

impl FromStr for ImportTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "conventional_patch" => Ok(ImportTarget::ConventionalPatch),
            "eos_patch" => Ok(ImportTarget::EosPatch),
            "cues" => Ok(ImportTarget::Cues),
            other => Err(Error::UnsupportedTarget(other.to_string())),
        }
    }
}

impl fmt::Display for ImportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImportTarget::ConventionalPatch => "conventional_patch",
            ImportTarget::EosPatch => "eos_patch",
            ImportTarget::Cues => "cues",
        })
    }
}

/// Outcome of an import, for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Records added to the document, including registries created while
    /// patching.
    pub created: usize,
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub(crate) fn absorb(&mut self, result: DispatchResult) {
        self.warnings.extend(result.warnings);
    }

    pub(crate) fn warn(&mut self, message: String) {
        log::warn!(target: "import", "{}", message);
        self.warnings.push(message);
    }
}

/// Import an ASCII file into the session's document.
///
/// On a fatal error the document keeps whatever was imported before it.
pub fn import_ascii(session: &mut Session, path: &Path, target: ImportTarget) -> Result<ImportReport> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    log::info!(target: "import", "importing {} from {}", target, path.display());
    let before = session.document.len();
    let mut report = ascii::import_text(session, &text, target)?;
    report.created = session.document.len().saturating_sub(before);
    log::info!(target: "import", "{}: {} records created, {} warnings", path.display(), report.created, report.warnings.len());
    Ok(report)
}

pub(crate) fn dispatch_import(action: &ImportAction, session: &mut Session) -> Result<DispatchResult> {
    match action {
        ImportAction::Ascii { path, target } => {
            let target: ImportTarget = target.parse()?;
            let report = import_ascii(session, path, target)?;
            let mut result = DispatchResult::with_lines(vec![format!(
                "Imported {} records from {}",
                report.created,
                path.display()
            )]);
            result.warnings = report.warnings;
            Ok(result)
        }
    }
}
