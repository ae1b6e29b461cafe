//! Cue levels: per-function entries, with 16-bit parameters split across
//! their coarse and fine functions.

use luxplot_types::{Cue, Fixture, Function, FunctionId};

use crate::error::{Error, Result};
use crate::state::Document;

/// Highest level of a single 8-bit function.
pub const MAX_LEVEL: u32 = 255;

/// Highest level of a coarse/fine function pair.
pub const MAX_LEVEL_16BIT: u32 = 65535;

fn check_range(level: u32, max: u32) -> Result<()> {
    if level > max {
        return Err(Error::MalformedLevel(format!("{} (maximum {})", level, max)));
    }
    Ok(())
}

/// Parse a level as typed by a user or found in an import file.
///
/// `H` followed by one or two hex digits is a raw DMX value (`H80` is 128);
/// anything else must be a decimal integer.
pub fn parse_level(text: &str) -> Result<u32> {
    let text = text.trim();
    let malformed = || Error::MalformedLevel(text.to_string());
    match text.strip_prefix('H') {
        Some(hex) if (1..=2).contains(&hex.len()) => {
            u32::from_str_radix(hex, 16).map_err(|_| malformed())
        }
        Some(_) => Err(malformed()),
        None => text.parse().map_err(|_| malformed()),
    }
}

/// The function a fixture's intensity is set through: the first one whose
/// parameter is `intensity_param`.
pub fn find_fixture_intensity<'a>(fixture: &'a Fixture, intensity_param: &str) -> Option<&'a Function> {
    fixture.function_by_param(intensity_param)
}

/// Append a level for the fixture's intensity function. The level is an
/// 8-bit value.
pub fn set_fixture_level(
    cue: &mut Cue,
    fixture: &Fixture,
    level: u32,
    intensity_param: &str,
) -> Result<()> {
    check_range(level, MAX_LEVEL)?;
    let func = find_fixture_intensity(fixture, intensity_param)
        .and_then(|f| f.uuid)
        .ok_or_else(|| {
            Error::Missing(format!(
                "{} function of fixture {}",
                intensity_param, fixture.reference
            ))
        })?;
    cue.push_level(func, level);
    Ok(())
}

/// Append a level for one function.
///
/// If the fixture has a fine sibling for the function, the value is treated
/// as 16-bit: `level / 256` goes to the coarse function and `level % 256` to
/// the fine one. Otherwise it must fit in 8 bits.
pub fn set_function_level(cue: &mut Cue, fixture: &Fixture, function: &Function, level: u32) -> Result<()> {
    let coarse = function_id(fixture, function)?;
    match fixture.fine_sibling(function) {
        Some(fine) => {
            check_range(level, MAX_LEVEL_16BIT)?;
            let fine = function_id(fixture, fine)?;
            cue.push_level(coarse, level / 256);
            cue.push_level(fine, level % 256);
        }
        None => {
            check_range(level, MAX_LEVEL)?;
            cue.push_level(coarse, level);
        }
    }
    Ok(())
}

/// Drop every entry for `func`. Returns the number removed.
pub fn remove_function_levels(cue: &mut Cue, func: FunctionId) -> usize {
    let before = cue.levels.len();
    cue.levels.retain(|l| l.func != func);
    before - cue.levels.len()
}

fn function_id(fixture: &Fixture, function: &Function) -> Result<FunctionId> {
    function.uuid.ok_or_else(|| {
        Error::Missing(format!(
            "id of function {} on fixture {}",
            function.param, fixture.reference
        ))
    })
}

/// A cue level resolved back to its function.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLevel<'a> {
    pub fixture: &'a Fixture,
    pub function: &'a Function,
    pub level: u32,
}

/// Resolve every level entry of a cue, in cue order. Entries whose function
/// no longer exists are skipped.
fn resolve_levels<'a>(doc: &'a Document, cue: &Cue) -> Vec<ResolvedLevel<'a>> {
    cue.levels
        .iter()
        .filter_map(|entry| match doc.find_function(entry.func) {
            Some(found) => Some(ResolvedLevel {
                fixture: found.fixture,
                function: found.function,
                level: entry.level,
            }),
            None => {
                log::debug!(target: "store", "cue {}: level for unknown function {}", cue.reference, entry.func);
                None
            }
        })
        .collect()
}

/// Levels in `cue` that belong to the given fixture's functions.
pub fn fixture_levels<'a>(doc: &'a Document, cue: &Cue, fixture: &Fixture) -> Vec<ResolvedLevel<'a>> {
    resolve_levels(doc, cue)
        .into_iter()
        .filter(|l| l.fixture.uuid == fixture.uuid)
        .collect()
}

/// Levels in `cue` set on intensity functions, across all fixtures.
pub fn intensity_levels<'a>(doc: &'a Document, cue: &Cue, intensity_param: &str) -> Vec<ResolvedLevel<'a>> {
    resolve_levels(doc, cue)
        .into_iter()
        .filter(|l| l.function.param == intensity_param)
        .collect()
}
