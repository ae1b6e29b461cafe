//! Editor command dispatch.
//!
//! Every user intent, whether typed on the command line or synthesised by
//! the ASCII importer, arrives here as an [`EditorAction`] and is applied to
//! the session's document.

mod cue;
mod fixture;
mod metadata;
mod registry;

use luxplot_types::{EditorAction, RecordType, Ref};

use crate::error::{Error, Result};
use crate::reference::{resolve_target, RefTarget};
use crate::state::{Document, Session};

/// Printable outcome of one command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchResult {
    pub lines: Vec<String>,
    /// Items that were skipped; the rest of the command still ran.
    pub warnings: Vec<String>,
}

impl DispatchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            warnings: Vec::new(),
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Record a skipped item. Logged by [`dispatch_action`] under the
    /// command's area.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: DispatchResult) {
        self.lines.extend(other.lines);
        self.warnings.extend(other.warnings);
    }

    /// Downgrade a not-found error to a warning; anything else propagates.
    pub(crate) fn skip_missing<T>(&mut self, outcome: Result<T>) -> Result<Option<T>> {
        match outcome {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => {
                self.warn(e.to_string());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Apply an action to the session. Malformed input aborts the command;
/// missing records are reported in [`DispatchResult::warnings`].
pub fn dispatch_action(action: &EditorAction, session: &mut Session) -> Result<DispatchResult> {
    let result = match action {
        EditorAction::Metadata(a) => metadata::dispatch_metadata(a, session)?,
        EditorAction::Fixture(a) => fixture::dispatch_fixture(a, session)?,
        EditorAction::Registry(a) => registry::dispatch_registry(a, session)?,
        EditorAction::Cue(a) => cue::dispatch_cue(a, session)?,
        EditorAction::Import(a) => crate::import::dispatch_import(a, session)?,
    };
    if let Some(target) = log_target(action) {
        for warning in &result.warnings {
            log::warn!(target: target, "{}", warning);
        }
    }
    Ok(result)
}

/// Log target for an action's warnings. Imports log their own as they go.
fn log_target(action: &EditorAction) -> Option<&'static str> {
    match action {
        EditorAction::Metadata(_) => Some("metadata"),
        EditorAction::Fixture(_) => Some("fixture"),
        EditorAction::Registry(_) => Some("registry"),
        EditorAction::Cue(_) => Some("cue"),
        EditorAction::Import(_) => None,
    }
}

/// Refs for a construction command: `auto` allocates the next free ref.
fn creation_refs(doc: &Document, kind: RecordType, expr: &str) -> Result<Vec<Ref>> {
    match resolve_target(expr)? {
        RefTarget::Auto => Ok(vec![doc.autoref(kind)]),
        RefTarget::Refs(refs) => Ok(refs),
    }
}

/// A single ref argument, such as a clone source or a universe.
fn single_ref(expr: &str) -> Result<Ref> {
    expr.trim()
        .parse()
        .map_err(|_| Error::MalformedReference(expr.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorSettings;
    use crate::templates::TemplateLibrary;
    use luxplot_types::{CueAction, FixtureAction, ImportAction, MetadataAction};

    pub(super) fn session() -> Session {
        Session::new(
            Document::new(),
            TemplateLibrary::default(),
            EditorSettings::default(),
        )
    }

    #[test]
    fn test_warnings_log_under_command_area() {
        let cue = EditorAction::Cue(CueAction::List);
        assert_eq!(log_target(&cue), Some("cue"));
        assert_eq!(log_target(&EditorAction::Fixture(FixtureAction::List)), Some("fixture"));
        let import = EditorAction::Import(ImportAction::Ascii {
            path: "show.asc".into(),
            target: "cues".into(),
        });
        assert_eq!(log_target(&import), None);
    }

    #[test]
    fn test_creation_refs_auto() {
        let mut doc = Document::new();
        doc.append(luxplot_types::Cue::new(Ref::new(1))).unwrap();
        assert_eq!(creation_refs(&doc, RecordType::Cue, "auto").unwrap(), vec![Ref::new(2)]);
        assert_eq!(
            creation_refs(&doc, RecordType::Cue, "4-5").unwrap(),
            vec![Ref::new(4), Ref::new(5)]
        );
        assert!(creation_refs(&doc, RecordType::Cue, "x").is_err());
    }

    #[test]
    fn test_malformed_input_aborts() {
        let mut session = session();
        let err = dispatch_action(
            &EditorAction::Fixture(FixtureAction::New { refs: "3-1".into() }),
            &mut session,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedReference(_)));
        assert!(session.document.is_empty());
    }

    #[test]
    fn test_missing_records_become_warnings() {
        let mut session = session();
        dispatch_action(
            &EditorAction::Metadata(MetadataAction::New {
                refs: "1".into(),
                name: "venue".into(),
            }),
            &mut session,
        )
        .unwrap();
        let result = dispatch_action(
            &EditorAction::Metadata(MetadataAction::Set {
                refs: "1 2".into(),
                value: "Old Vic".into(),
            }),
            &mut session,
        )
        .unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("metadata"));
        let listed = dispatch_action(&EditorAction::Metadata(MetadataAction::List), &mut session).unwrap();
        assert_eq!(listed.lines, vec!["Metadata 1: venue = Old Vic"]);
    }
}
