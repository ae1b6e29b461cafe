//! Fixture templates: JSON files shaped like a fixture record, found under
//! `fixture/<name>.json` in the data directories.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use luxplot_types::{Fixture, Function, FunctionId, RecordId, Ref, Tags, RESERVED_TAGS};

use crate::error::{Error, Result};

const TEMPLATE_DIR: &str = "fixture";

/// Tags and personality shared by every fixture built from it.
///
/// Templates are never appended to a document directly; [`instantiate`]
/// makes a fixture with its own ids each time.
///
/// [`instantiate`]: FixtureTemplate::instantiate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureTemplate {
    #[serde(default)]
    pub personality: Vec<Function>,
    #[serde(flatten)]
    pub tags: Tags,
}

impl FixtureTemplate {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut template: FixtureTemplate = serde_json::from_str(&text)?;
        template.tags.retain(|k, _| !RESERVED_TAGS.contains(&k.as_str()));
        Ok(template)
    }

    /// A new fixture at `reference` with a fresh record id and fresh ids on
    /// every function.
    pub fn instantiate(&self, reference: Ref) -> Fixture {
        let mut fixture = Fixture::new(reference);
        fixture.tags = self.tags.clone();
        fixture.personality = self.personality.iter().map(individuate).collect();
        fixture
    }

    /// Merge this template into an existing fixture without overwriting:
    /// tags the fixture lacks are copied, as are functions whose name is not
    /// already in its personality. Returns how many items were added.
    pub fn complete(&self, fixture: &mut Fixture) -> usize {
        let mut added = 0;
        for (key, value) in &self.tags {
            if !fixture.tags.contains_key(key) {
                fixture.tags.insert(key.clone(), value.clone());
                added += 1;
            }
        }
        for function in &self.personality {
            let present = fixture
                .personality
                .iter()
                .any(|f| f.name() == function.name());
            if !present {
                fixture.personality.push(individuate(function));
                added += 1;
            }
        }
        added
    }
}

fn individuate(function: &Function) -> Function {
    Function {
        uuid: Some(FunctionId::new()),
        ..function.clone()
    }
}

/// Give a copied fixture its own identity: a new record id and new function
/// ids, everything else kept.
pub fn reidentify(mut fixture: Fixture, reference: Ref) -> Fixture {
    fixture.uuid = RecordId::new();
    fixture.reference = reference;
    for function in &mut fixture.personality {
        function.uuid = Some(FunctionId::new());
    }
    fixture
}

/// Template lookup across data directories, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    dirs: Vec<PathBuf>,
}

impl TemplateLibrary {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Path of the first `fixture/<name>.json` that exists.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(TEMPLATE_DIR).join(format!("{}.json", name)))
            .find(|path| path.is_file())
    }

    pub fn load(&self, name: &str) -> Result<FixtureTemplate> {
        let path = self
            .find(name)
            .ok_or_else(|| Error::Missing(format!("template {}", name)))?;
        log::debug!(target: "store", "loading template {} from {}", name, path.display());
        FixtureTemplate::load(&path)
    }
}
