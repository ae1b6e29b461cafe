//! Editor actions.
//!
//! Every action is a user intent against the plot document. Reference
//! arguments are kept as raw reference expressions (`"1-4"`, `"auto"`,
//! `"2 3.1"`) and resolved by the dispatcher, so the same action can be
//! produced by the command line or by the ASCII importer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataAction {
    New { refs: String, name: String },
    Set { refs: String, value: String },
    Remove { refs: String },
    Get { name: String },
    List,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FixtureAction {
    New { refs: String },
    FromTemplate { refs: String, template: String },
    Clone { src: String, dest: String },
    List,
    Filter { tag: String, value: String },
    Remove { refs: String },
    Get { refs: String },
    GetAll { refs: String },
    Set { refs: String, tag: String, value: String },
    /// `address` is a number, `auto`, or `0` for "do not patch".
    Address { refs: String, universe: String, address: String },
    Unaddress { refs: String },
    CompleteFromTemplate { refs: String, template: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegistryAction {
    New { refs: String },
    Remove { refs: String },
    List,
    Query { refs: String },
    /// Patch the functions at the given offsets of one fixture by hand.
    Add { fixture: String, functions: String, universe: String, address: String },
    Summarise { refs: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CueAction {
    /// `moves` are optional initial intensities, `fixtures@level` groups
    /// separated by `;` (`1-3@50;7@H80`).
    New { refs: String, moves: Option<String> },
    Remove { refs: String },
    List,
    Set { refs: String, tag: String, value: String },
    SetFixtureLevel { cues: String, fixtures: String, level: String },
    GetIntensity { refs: String },
    GetFixtureLevels { cues: String, fixtures: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImportAction {
    Ascii { path: PathBuf, target: String },
}

/// Top-level editor action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorAction {
    Metadata(MetadataAction),
    Fixture(FixtureAction),
    Registry(RegistryAction),
    Cue(CueAction),
    Import(ImportAction),
}

impl EditorAction {
    /// Whether the action can change the document.
    pub fn is_mutating(&self) -> bool {
        match self {
            EditorAction::Metadata(a) => !matches!(a, MetadataAction::Get { .. } | MetadataAction::List),
            EditorAction::Fixture(a) => !matches!(
                a,
                FixtureAction::List
                    | FixtureAction::Filter { .. }
                    | FixtureAction::Get { .. }
                    | FixtureAction::GetAll { .. }
            ),
            EditorAction::Registry(a) => !matches!(
                a,
                RegistryAction::List | RegistryAction::Query { .. } | RegistryAction::Summarise { .. }
            ),
            EditorAction::Cue(a) => !matches!(
                a,
                CueAction::List | CueAction::GetIntensity { .. } | CueAction::GetFixtureLevels { .. }
            ),
            EditorAction::Import(_) => true,
        }
    }
}
