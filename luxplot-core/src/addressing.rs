//! DMX address allocation.
//!
//! Holds no state of its own: every operation reads and writes the registry
//! records in the document. A registry's ref is its universe number.

use std::collections::BTreeMap;
use std::str::FromStr;

use luxplot_types::{FunctionId, Ref, UNIVERSE_SIZE};

use crate::error::{Error, Result};
use crate::state::{fill_missing_function_uuids, Document};

/// Where to start patching a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAddress {
    /// First free block large enough for the whole fixture.
    Auto,
    /// An absolute address counted from the start universe: 513 is address
    /// 1 of the next universe and 1030 is address 6 two universes on.
    At(u32),
    /// Address `0`: leave the fixture unpatched.
    Unpatched,
}

impl FromStr for StartAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == crate::reference::AUTO {
            return Ok(StartAddress::Auto);
        }
        match s.parse::<u32>() {
            Ok(0) => Ok(StartAddress::Unpatched),
            Ok(addr) => Ok(StartAddress::At(addr)),
            Err(_) => Err(Error::MalformedAddress(s.to_string())),
        }
    }
}

/// A universe/address pair written by a patch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patched {
    pub universe: Ref,
    pub address: u16,
    pub function: FunctionId,
}

/// Occupied addresses, ascending.
pub fn get_occupied(table: &BTreeMap<u16, FunctionId>) -> Vec<u16> {
    table.keys().copied().collect()
}

/// First-fit search for `n` contiguous free addresses.
///
/// An empty table always yields 1. Otherwise the gaps following each
/// occupied address are tried in ascending order, the last one running up to
/// the end of the universe; the first gap of at least `n` wins. `None` means
/// the universe has no room.
pub fn get_start_address(table: &BTreeMap<u16, FunctionId>, n: usize) -> Option<u16> {
    if table.is_empty() {
        return Some(1);
    }
    let occupied = get_occupied(table);
    let boundary = usize::from(UNIVERSE_SIZE) + 1;
    for (i, &addr) in occupied.iter().enumerate() {
        let next = occupied.get(i + 1).map_or(boundary, |&a| usize::from(a));
        let gap = next.saturating_sub(usize::from(addr) + 1);
        if gap >= n && gap > 0 {
            return Some(addr + 1);
        }
    }
    None
}

/// Write position that rolls over into the next universe past address 512.
struct Cursor {
    universe: Ref,
    address: u32,
}

impl Cursor {
    /// Start at `address` in `universe`. Fails if writing `span` addresses
    /// from there would run past the highest universe number.
    fn new(universe: Ref, address: u32, span: usize) -> Result<Self> {
        let size = u64::from(UNIVERSE_SIZE);
        let last = u64::from(address) + (span as u64).saturating_sub(1);
        let extra = last.saturating_sub(1) / size;
        if u64::from(universe.major()) + extra > u64::from(u32::MAX) {
            return Err(Error::MalformedAddress(format!(
                "{} addresses from {} in universe {}",
                span, address, universe
            )));
        }
        let mut cursor = Self { universe, address };
        cursor.normalize()?;
        Ok(cursor)
    }

    fn normalize(&mut self) -> Result<()> {
        let size = u32::from(UNIVERSE_SIZE);
        while self.address > size {
            let next = self.universe.major().checked_add(1).ok_or_else(|| {
                Error::MalformedAddress(format!("{} past universe {}", self.address, self.universe))
            })?;
            self.universe = Ref::new(next);
            self.address -= size;
            log::info!(target: "addressing", "rolling over into universe {}", self.universe);
        }
        Ok(())
    }

    fn write(&mut self, doc: &mut Document, function: FunctionId) -> Result<Patched> {
        self.normalize()?;
        // normalize() keeps the address within 1..=512
        let address = self.address as u16;
        let registry = doc.registry_or_create(self.universe);
        if let Some(previous) = registry.table.insert(address, function) {
            if previous != function {
                log::warn!(target: "addressing", "universe {} address {} reassigned (was {})", self.universe, address, previous);
            }
        }
        let patched = Patched {
            universe: self.universe,
            address,
            function,
        };
        self.address += 1;
        Ok(patched)
    }
}

/// Patch every function of a fixture, in personality order, at consecutive
/// addresses starting in `universe`.
///
/// Fixtures with no functions and the [`StartAddress::Unpatched`] sentinel
/// are skipped and return nothing.
pub fn assign(
    doc: &mut Document,
    fixture: Ref,
    universe: Ref,
    start: StartAddress,
) -> Result<Vec<Patched>> {
    let filled = fill_missing_function_uuids(doc.fixture_mut(fixture)?);
    if filled > 0 {
        log::debug!(target: "addressing", "fixture {}: assigned {} missing function ids", fixture, filled);
    }
    let functions = doc.fixture(fixture)?.function_ids();
    if functions.is_empty() || start == StartAddress::Unpatched {
        log::debug!(target: "addressing", "fixture {} left unpatched", fixture);
        return Ok(Vec::new());
    }

    let address = match start {
        StartAddress::At(addr) => addr,
        StartAddress::Auto => {
            let registry = doc.registry_or_create(universe);
            let found = get_start_address(&registry.table, functions.len()).ok_or(
                Error::UniverseFull {
                    universe,
                    needed: functions.len(),
                },
            )?;
            u32::from(found)
        }
        StartAddress::Unpatched => return Ok(Vec::new()),
    };

    let mut cursor = Cursor::new(universe, address, functions.len())?;
    let patched = functions
        .into_iter()
        .map(|function| cursor.write(doc, function))
        .collect::<Result<Vec<Patched>>>()?;
    log::debug!(target: "addressing", "fixture {} patched at {}/{}", fixture, patched[0].universe, patched[0].address);
    Ok(patched)
}

/// Patch selected functions of a fixture, chosen by personality offset, at
/// consecutive addresses.
pub fn patch_functions(
    doc: &mut Document,
    fixture: Ref,
    offsets: &[u32],
    universe: Ref,
    address: u32,
) -> Result<Vec<Patched>> {
    if address == 0 {
        return Err(Error::MalformedAddress(address.to_string()));
    }
    let functions = {
        let f = doc.fixture(fixture)?;
        offsets
            .iter()
            .map(|&offset| {
                f.function_by_offset(offset)
                    .and_then(|func| func.uuid)
                    .ok_or_else(|| Error::Missing(format!("function at offset {} of fixture {}", offset, fixture)))
            })
            .collect::<Result<Vec<FunctionId>>>()?
    };
    let mut cursor = Cursor::new(universe, address, functions.len())?;
    functions
        .into_iter()
        .map(|function| cursor.write(doc, function))
        .collect()
}

/// Remove every table entry, in every registry, that points at one of the
/// fixture's functions. Returns the number of entries removed.
pub fn unassign(doc: &mut Document, fixture: Ref) -> Result<usize> {
    let functions = doc.fixture(fixture)?.function_ids();
    let mut removed = 0;
    for registry in doc.registries_mut() {
        let before = registry.table.len();
        registry.table.retain(|_, f| !functions.contains(f));
        removed += before - registry.table.len();
    }
    log::debug!(target: "addressing", "fixture {}: {} addresses released", fixture, removed);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use luxplot_types::{Fixture, Function};

    fn table(addresses: impl IntoIterator<Item = u16>) -> BTreeMap<u16, FunctionId> {
        addresses.into_iter().map(|a| (a, FunctionId::new())).collect()
    }

    fn fixture_with(reference: u32, n: u32) -> Fixture {
        let mut f = Fixture::new(Ref::new(reference));
        for offset in 1..=n {
            f.personality.push(Function::new(format!("Param{}", offset), offset));
        }
        f
    }

    #[test]
    fn test_start_address_empty_table() {
        assert_eq!(get_start_address(&BTreeMap::new(), 4), Some(1));
    }

    #[test]
    fn test_start_address_first_fit() {
        let t = table([1, 2, 5]);
        assert_eq!(get_start_address(&t, 2), Some(3));
        assert_eq!(get_start_address(&t, 1), Some(3));
        assert_eq!(get_start_address(&t, 3), Some(6));
    }

    #[test]
    fn test_start_address_full_universe() {
        let t = table(1..=512);
        assert_eq!(get_start_address(&t, 1), None);
        assert_eq!(get_start_address(&t, 8), None);
    }

    #[test]
    fn test_start_address_tail_gap() {
        let t = table(1..=510);
        assert_eq!(get_start_address(&t, 2), Some(511));
        assert_eq!(get_start_address(&t, 3), None);
    }

    #[test]
    fn test_parse_start_address() {
        assert_eq!("auto".parse::<StartAddress>().unwrap(), StartAddress::Auto);
        assert_eq!("0".parse::<StartAddress>().unwrap(), StartAddress::Unpatched);
        assert_eq!("101".parse::<StartAddress>().unwrap(), StartAddress::At(101));
        assert!(matches!(
            "1O1".parse::<StartAddress>(),
            Err(Error::MalformedAddress(_))
        ));
    }

    #[test]
    fn test_assign_rolls_over_into_next_universe() {
        let mut doc = Document::new();
        let f = fixture_with(1, 3);
        let ids = f.function_ids();
        doc.append(f).unwrap();

        let patched = assign(&mut doc, Ref::new(1), Ref::new(1), StartAddress::At(511)).unwrap();
        assert_eq!(patched.len(), 3);

        let u1 = doc.registry(Ref::new(1)).unwrap();
        assert_eq!(u1.table.get(&511), Some(&ids[0]));
        assert_eq!(u1.table.get(&512), Some(&ids[1]));
        let u2 = doc.registry(Ref::new(2)).unwrap();
        assert_eq!(u2.table.get(&1), Some(&ids[2]));
        assert_eq!(u2.table.len(), 1);
    }

    #[test]
    fn test_assign_rolls_over_repeatedly() {
        let mut doc = Document::new();
        doc.append(fixture_with(1, 1030)).unwrap();
        assign(&mut doc, Ref::new(1), Ref::new(1), StartAddress::At(1)).unwrap();
        assert_eq!(doc.registry(Ref::new(1)).unwrap().table.len(), 512);
        assert_eq!(doc.registry(Ref::new(2)).unwrap().table.len(), 512);
        assert_eq!(doc.registry(Ref::new(3)).unwrap().table.len(), 6);
    }

    #[test]
    fn test_rollover_past_last_universe_is_error() {
        let mut doc = Document::new();
        doc.append(fixture_with(1, 3)).unwrap();
        let last = Ref::new(u32::MAX);

        let err = assign(&mut doc, Ref::new(1), last, StartAddress::At(513)).unwrap_err();
        assert!(matches!(err, Error::MalformedAddress(_)));
        let err = assign(&mut doc, Ref::new(1), last, StartAddress::At(511)).unwrap_err();
        assert!(matches!(err, Error::MalformedAddress(_)));
        assert_eq!(doc.registries().count(), 0);

        // A run that ends on address 512 still fits.
        let patched = assign(&mut doc, Ref::new(1), last, StartAddress::At(510)).unwrap();
        assert_eq!(patched[2].universe, last);
        assert_eq!(patched[2].address, 512);

        let err = patch_functions(&mut doc, Ref::new(1), &[1], last, 600).unwrap_err();
        assert!(matches!(err, Error::MalformedAddress(_)));
    }

    #[test]
    fn test_explicit_address_is_absolute() {
        let mut doc = Document::new();
        doc.append(fixture_with(1, 1)).unwrap();
        let patched = assign(&mut doc, Ref::new(1), Ref::new(1), StartAddress::At(1030)).unwrap();
        assert_eq!(patched[0].universe, Ref::new(3));
        assert_eq!(patched[0].address, 6);
    }

    #[test]
    fn test_assign_auto_uses_first_fit() {
        let mut doc = Document::new();
        doc.append(fixture_with(1, 4)).unwrap();
        doc.append(fixture_with(2, 2)).unwrap();
        assign(&mut doc, Ref::new(1), Ref::new(1), StartAddress::Auto).unwrap();
        let patched = assign(&mut doc, Ref::new(2), Ref::new(1), StartAddress::Auto).unwrap();
        assert_eq!(patched[0].address, 5);
        assert_eq!(patched[1].address, 6);
    }

    #[test]
    fn test_assign_auto_full_universe_is_error() {
        let mut doc = Document::new();
        doc.append(fixture_with(1, 512)).unwrap();
        doc.append(fixture_with(2, 1)).unwrap();
        assign(&mut doc, Ref::new(1), Ref::new(1), StartAddress::At(1)).unwrap();
        let err = assign(&mut doc, Ref::new(2), Ref::new(1), StartAddress::Auto).unwrap_err();
        assert!(matches!(err, Error::UniverseFull { needed: 1, .. }));
    }

    #[test]
    fn test_unpatched_sentinel_and_empty_personality() {
        let mut doc = Document::new();
        doc.append(fixture_with(1, 2)).unwrap();
        doc.append(Fixture::new(Ref::new(2))).unwrap();
        assert!(assign(&mut doc, Ref::new(1), Ref::new(1), StartAddress::Unpatched)
            .unwrap()
            .is_empty());
        assert!(assign(&mut doc, Ref::new(2), Ref::new(1), StartAddress::At(1))
            .unwrap()
            .is_empty());
        assert_eq!(doc.registries().count(), 0);
    }

    #[test]
    fn test_assign_missing_fixture() {
        let mut doc = Document::new();
        let err = assign(&mut doc, Ref::new(9), Ref::new(1), StartAddress::At(1)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unassign_clears_every_registry() {
        let mut doc = Document::new();
        doc.append(fixture_with(1, 3)).unwrap();
        doc.append(fixture_with(2, 1)).unwrap();
        assign(&mut doc, Ref::new(1), Ref::new(1), StartAddress::At(511)).unwrap();
        assign(&mut doc, Ref::new(2), Ref::new(1), StartAddress::At(1)).unwrap();

        assert_eq!(unassign(&mut doc, Ref::new(1)).unwrap(), 3);
        let ids = doc.fixture(Ref::new(1)).unwrap().function_ids();
        for registry in doc.registries() {
            assert!(registry.table.values().all(|f| !ids.contains(f)));
        }
        assert_eq!(doc.registry(Ref::new(1)).unwrap().table.len(), 1);
    }

    #[test]
    fn test_patch_functions_by_offset() {
        let mut doc = Document::new();
        let f = fixture_with(1, 4);
        let ids = f.function_ids();
        doc.append(f).unwrap();
        let patched = patch_functions(&mut doc, Ref::new(1), &[2, 4], Ref::new(3), 20).unwrap();
        assert_eq!(patched.len(), 2);
        let reg = doc.registry(Ref::new(3)).unwrap();
        assert_eq!(reg.table.get(&20), Some(&ids[1]));
        assert_eq!(reg.table.get(&21), Some(&ids[3]));

        let err = patch_functions(&mut doc, Ref::new(1), &[9], Ref::new(3), 30).unwrap_err();
        assert!(err.is_not_found());
    }
}
