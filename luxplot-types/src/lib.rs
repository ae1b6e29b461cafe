//! # luxplot-types
//!
//! Shared type definitions for the luxplot lighting-plot editor.
//! This crate holds the record model (fixtures, registries, cues, metadata),
//! user-facing references and the editor action enum. It carries no behaviour
//! beyond parsing and simple accessors; the store and its algorithms live in
//! `luxplot-core`.

pub mod action;
pub mod record;
mod reference;
mod value;

pub use action::*;
pub use record::*;
pub use reference::{ParseRefError, Ref};
pub use value::{Tags, Value};

/// Permanent identifier of a record. Assigned once at creation, never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(uuid::Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn get(self) -> uuid::Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a single fixture function.
///
/// Registries and cues hold these as weak references: the function itself
/// lives inside its fixture's personality and may disappear with it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct FunctionId(uuid::Uuid);

impl FunctionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn get(self) -> uuid::Uuid {
        self.0
    }
}

impl Default for FunctionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
