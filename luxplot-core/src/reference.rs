//! Reference expressions.
//!
//! Grammar, tokens separated by whitespace or commas:
//!
//! - `12`   a ref
//! - `12.3` a sub-ref, distinct from `12`
//! - `3-5`  every integer ref from 3 to 5 inclusive (ascending only)
//! - `auto` allocate a new ref (only valid on its own)
//!
//! Order is preserved and duplicates are kept.

use luxplot_types::{RecordType, Ref};

use crate::error::{Error, Result};
use crate::state::Document;

pub const AUTO: &str = "auto";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// The caller should allocate a fresh ref.
    Auto,
    Refs(Vec<Ref>),
}

/// Resolve an expression that may be `auto`.
pub fn resolve_target(expr: &str) -> Result<RefTarget> {
    if expr.trim() == AUTO {
        return Ok(RefTarget::Auto);
    }
    resolve_references(expr).map(RefTarget::Refs)
}

/// Resolve an expression into concrete refs.
pub fn resolve_references(expr: &str) -> Result<Vec<Ref>> {
    let malformed = || Error::MalformedReference(expr.to_string());
    let mut refs = Vec::new();
    for token in tokens(expr) {
        match token.split_once('-') {
            Some((start, end)) => {
                let start: u32 = start.parse().map_err(|_| malformed())?;
                let end: u32 = end.parse().map_err(|_| malformed())?;
                if start > end {
                    return Err(malformed());
                }
                refs.extend((start..=end).map(Ref::new));
            }
            None => refs.push(token.parse().map_err(|_| malformed())?),
        }
    }
    if refs.is_empty() {
        return Err(malformed());
    }
    Ok(refs)
}

/// Like [`resolve_references`], but silently drops refs with no live record
/// of `kind`. Used by destructive and printing commands so a stale ref does
/// not abort the batch. A malformed expression is still an error.
pub fn safe_resolve_references(doc: &Document, kind: RecordType, expr: &str) -> Result<Vec<Ref>> {
    let refs = resolve_references(expr)?;
    Ok(refs
        .into_iter()
        .filter(|r| {
            let live = doc.contains(kind, *r);
            if !live {
                log::debug!(target: "store", "dropping unknown {} ref {}", kind, r);
            }
            live
        })
        .collect())
}

fn tokens(expr: &str) -> impl Iterator<Item = &str> {
    expr.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
}
