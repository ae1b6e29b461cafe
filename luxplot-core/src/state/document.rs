//! The plot document: a flat, insertion-ordered collection of records.

use luxplot_types::{
    Cue, Fixture, Function, FunctionId, Metadata, Record, RecordType, Ref, Registry,
};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    records: Vec<Record>,
}

/// A function together with the fixture that owns it.
#[derive(Debug, Clone, Copy)]
pub struct FunctionRef<'a> {
    pub fixture: &'a Fixture,
    pub function: &'a Function,
}

impl Document {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Build a document from already-loaded records. Duplicate `(type, ref)`
    /// pairs are kept but logged, since the file is the source of truth.
    pub fn from_records(records: Vec<Record>) -> Self {
        for (i, record) in records.iter().enumerate() {
            let clash = records[..i]
                .iter()
                .any(|r| r.kind() == record.kind() && r.reference() == record.reference());
            if clash {
                log::warn!(target: "store", "duplicate {} ref {} in loaded document", record.kind(), record.reference());
            }
        }
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a new record. Fails if its `(type, ref)` pair is taken.
    pub fn append(&mut self, record: impl Into<Record>) -> Result<Ref> {
        let record = record.into();
        let (kind, reference) = (record.kind(), record.reference());
        if self.contains(kind, reference) {
            return Err(Error::RefOccupied { kind, reference });
        }
        log::debug!(target: "store", "append {} {}", kind, reference);
        self.records.push(record);
        Ok(reference)
    }

    pub fn contains(&self, kind: RecordType, reference: Ref) -> bool {
        self.get_by_ref(kind, reference).is_some()
    }

    pub fn get_by_ref(&self, kind: RecordType, reference: Ref) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.kind() == kind && r.reference() == reference)
    }

    pub fn get_by_ref_mut(&mut self, kind: RecordType, reference: Ref) -> Option<&mut Record> {
        self.records
            .iter_mut()
            .find(|r| r.kind() == kind && r.reference() == reference)
    }

    /// All records of one type, in insertion order.
    pub fn get_by_type(&self, kind: RecordType) -> Vec<&Record> {
        self.records.iter().filter(|r| r.kind() == kind).collect()
    }

    /// Delete the record with this ref. Absence is returned as not-found.
    pub fn remove_by_ref(&mut self, kind: RecordType, reference: Ref) -> Result<Record> {
        let pos = self
            .records
            .iter()
            .position(|r| r.kind() == kind && r.reference() == reference)
            .ok_or(Error::NotFound { kind, reference })?;
        log::debug!(target: "store", "remove {} {}", kind, reference);
        Ok(self.records.remove(pos))
    }

    /// Smallest positive integer ref not currently used by this type.
    pub fn autoref(&self, kind: RecordType) -> Ref {
        let mut used: Vec<u32> = self
            .records
            .iter()
            .filter(|r| r.kind() == kind)
            .map(Record::reference)
            .filter(|r| r.is_integer())
            .map(Ref::major)
            .collect();
        used.sort_unstable();
        used.dedup();
        let mut candidate = 1;
        for major in used {
            if major == candidate {
                candidate += 1;
            } else if major > candidate {
                break;
            }
        }
        Ref::new(candidate)
    }

    pub fn fixtures(&self) -> impl Iterator<Item = &Fixture> + '_ {
        self.records.iter().filter_map(Record::as_fixture)
    }

    pub fn registries(&self) -> impl Iterator<Item = &Registry> + '_ {
        self.records.iter().filter_map(Record::as_registry)
    }

    pub fn registries_mut(&mut self) -> impl Iterator<Item = &mut Registry> + '_ {
        self.records.iter_mut().filter_map(Record::as_registry_mut)
    }

    pub fn fixture(&self, reference: Ref) -> Result<&Fixture> {
        self.get_by_ref(RecordType::Fixture, reference)
            .and_then(Record::as_fixture)
            .ok_or(Error::NotFound {
                kind: RecordType::Fixture,
                reference,
            })
    }

    pub fn fixture_mut(&mut self, reference: Ref) -> Result<&mut Fixture> {
        self.get_by_ref_mut(RecordType::Fixture, reference)
            .and_then(Record::as_fixture_mut)
            .ok_or(Error::NotFound {
                kind: RecordType::Fixture,
                reference,
            })
    }

    pub fn registry(&self, reference: Ref) -> Result<&Registry> {
        self.get_by_ref(RecordType::Registry, reference)
            .and_then(Record::as_registry)
            .ok_or(Error::NotFound {
                kind: RecordType::Registry,
                reference,
            })
    }

    pub fn registry_mut(&mut self, reference: Ref) -> Result<&mut Registry> {
        self.get_by_ref_mut(RecordType::Registry, reference)
            .and_then(Record::as_registry_mut)
            .ok_or(Error::NotFound {
                kind: RecordType::Registry,
                reference,
            })
    }

    /// Fetch a registry, creating an empty one if this universe has none yet.
    pub fn registry_or_create(&mut self, reference: Ref) -> &mut Registry {
        if !self.contains(RecordType::Registry, reference) {
            log::info!(target: "store", "no registry with ref {}, creating a new one", reference);
            self.records.push(Record::Registry(Registry::new(reference)));
        }
        match self
            .records
            .iter_mut()
            .filter_map(Record::as_registry_mut)
            .find(|r| r.reference == reference)
        {
            Some(registry) => registry,
            None => unreachable!("registry {} was just inserted", reference),
        }
    }

    pub fn cue(&self, reference: Ref) -> Result<&Cue> {
        self.get_by_ref(RecordType::Cue, reference)
            .and_then(Record::as_cue)
            .ok_or(Error::NotFound {
                kind: RecordType::Cue,
                reference,
            })
    }

    pub fn cue_mut(&mut self, reference: Ref) -> Result<&mut Cue> {
        self.get_by_ref_mut(RecordType::Cue, reference)
            .and_then(Record::as_cue_mut)
            .ok_or(Error::NotFound {
                kind: RecordType::Cue,
                reference,
            })
    }

    pub fn metadata_mut(&mut self, reference: Ref) -> Result<&mut Metadata> {
        self.get_by_ref_mut(RecordType::Metadata, reference)
            .and_then(Record::as_metadata_mut)
            .ok_or(Error::NotFound {
                kind: RecordType::Metadata,
                reference,
            })
    }

    /// Resolve a function uuid back to its owning fixture.
    ///
    /// This is a plain scan over every personality; nothing is cached, so a
    /// uuid whose fixture has been removed simply comes back as `None`.
    pub fn find_function(&self, id: FunctionId) -> Option<FunctionRef<'_>> {
        self.fixtures().find_map(|fixture| {
            fixture
                .function(id)
                .map(|function| FunctionRef { fixture, function })
        })
    }
}

/// Records from `records` whose `field` equals `value`. Records without the
/// field are skipped.
pub fn get_by_value<'a, I>(records: I, field: &str, value: &str) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|r| r.field(field).is_some_and(|v| v.matches(value)))
        .collect()
}

/// Give a fresh uuid to every function that lacks one. Returns how many were
/// filled in.
pub fn fill_missing_function_uuids(fixture: &mut Fixture) -> usize {
    let mut filled = 0;
    for function in fixture.personality.iter_mut().filter(|f| f.uuid.is_none()) {
        function.uuid = Some(FunctionId::new());
        filled += 1;
    }
    filled
}

/// Records sorted by ascending ref, for listing.
pub fn refsort(mut records: Vec<&Record>) -> Vec<&Record> {
    records.sort_by_key(|r| r.reference());
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use luxplot_types::Value;

    fn fixture(reference: u32) -> Fixture {
        let mut f = Fixture::new(Ref::new(reference));
        f.personality.push(Function::new("Intens", 1));
        f
    }

    #[test]
    fn test_append_rejects_occupied_ref() {
        let mut doc = Document::new();
        doc.append(fixture(1)).unwrap();
        let err = doc.append(fixture(1)).unwrap_err();
        assert!(matches!(err, Error::RefOccupied { .. }));
        // Same ref in another type is fine
        doc.append(Cue::new(Ref::new(1))).unwrap();
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_sub_ref_is_distinct() {
        let mut doc = Document::new();
        doc.append(fixture(3)).unwrap();
        doc.append(Fixture::new(Ref::with_sub(3, 1))).unwrap();
        assert!(doc.fixture(Ref::new(3)).is_ok());
        assert!(doc.fixture(Ref::with_sub(3, 1)).is_ok());
        assert!(doc.fixture(Ref::with_sub(3, 2)).is_err());
    }

    #[test]
    fn test_get_by_type_keeps_insertion_order() {
        let mut doc = Document::new();
        for r in [5, 2, 9] {
            doc.append(fixture(r)).unwrap();
        }
        doc.append(Registry::new(Ref::new(1))).unwrap();
        let refs: Vec<Ref> = doc
            .get_by_type(RecordType::Fixture)
            .into_iter()
            .map(Record::reference)
            .collect();
        assert_eq!(refs, vec![Ref::new(5), Ref::new(2), Ref::new(9)]);
    }

    #[test]
    fn test_autoref_fills_gaps() {
        let mut doc = Document::new();
        assert_eq!(doc.autoref(RecordType::Fixture), Ref::new(1));
        for r in [1, 2, 4] {
            doc.append(fixture(r)).unwrap();
        }
        assert_eq!(doc.autoref(RecordType::Fixture), Ref::new(3));
        doc.append(fixture(3)).unwrap();
        assert_eq!(doc.autoref(RecordType::Fixture), Ref::new(5));
        doc.remove_by_ref(RecordType::Fixture, Ref::new(2)).unwrap();
        assert_eq!(doc.autoref(RecordType::Fixture), Ref::new(2));
        // Other types do not interfere
        assert_eq!(doc.autoref(RecordType::Cue), Ref::new(1));
    }

    #[test]
    fn test_autoref_never_returns_occupied_ref() {
        let mut doc = Document::new();
        for _ in 0..20 {
            let r = doc.autoref(RecordType::Cue);
            assert!(!doc.contains(RecordType::Cue, r));
            doc.append(Cue::new(r)).unwrap();
        }
        let refs: Vec<u32> = doc.records().iter().map(|r| r.reference().major()).collect();
        assert_eq!(refs, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_autoref_ignores_sub_refs() {
        let mut doc = Document::new();
        doc.append(Fixture::new(Ref::with_sub(1, 5))).unwrap();
        assert_eq!(doc.autoref(RecordType::Fixture), Ref::new(1));
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let mut doc = Document::new();
        let err = doc.remove_by_ref(RecordType::Cue, Ref::new(4)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_by_value_tolerates_missing_field() {
        let mut doc = Document::new();
        let mut lit = fixture(1);
        lit.tags.insert("gel".into(), Value::Text("L201".into()));
        doc.append(lit).unwrap();
        doc.append(fixture(2)).unwrap();
        let matches = get_by_value(doc.get_by_type(RecordType::Fixture), "gel", "L201");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].reference(), Ref::new(1));
        assert!(get_by_value(doc.records(), "gel", "L202").is_empty());
    }

    #[test]
    fn test_fill_missing_function_uuids() {
        let mut f = fixture(1);
        let kept = f.personality[0].uuid;
        f.personality.push(Function {
            uuid: None,
            offset: 2,
            param: "Pan".into(),
            tags: Default::default(),
        });
        assert_eq!(fill_missing_function_uuids(&mut f), 1);
        assert_eq!(f.personality[0].uuid, kept);
        assert!(f.personality[1].uuid.is_some());
        assert_eq!(fill_missing_function_uuids(&mut f), 0);
    }

    #[test]
    fn test_find_function_after_removal_is_none() {
        let mut doc = Document::new();
        let f = fixture(7);
        let id = f.personality[0].uuid.unwrap();
        doc.append(f).unwrap();
        let found = doc.find_function(id).unwrap();
        assert_eq!(found.fixture.reference, Ref::new(7));
        assert_eq!(found.function.param, "Intens");
        doc.remove_by_ref(RecordType::Fixture, Ref::new(7)).unwrap();
        assert!(doc.find_function(id).is_none());
    }

    #[test]
    fn test_registry_or_create_is_lazy() {
        let mut doc = Document::new();
        doc.registry_or_create(Ref::new(2)).table.insert(1, FunctionId::new());
        doc.registry_or_create(Ref::new(2));
        assert_eq!(doc.registries().count(), 1);
        assert_eq!(doc.registry(Ref::new(2)).unwrap().table.len(), 1);
    }
}
