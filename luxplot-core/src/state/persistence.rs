//! JSON plot files: the whole document as one array of type-tagged records.

use std::path::Path;

use luxplot_types::Record;

use super::document::Document;
use crate::error::{Error, Result};

/// Save the document through a sibling temp file renamed over `path`.
pub fn save_document(path: &Path, document: &Document) -> Result<()> {
    let json = serde_json::to_string_pretty(document.records())?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| Error::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| Error::io(path, e))?;
    log::info!(target: "store", "saved {} records to {}", document.len(), path.display());
    Ok(())
}

pub fn load_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let records: Vec<Record> = serde_json::from_str(&text)?;
    log::info!(target: "store", "loaded {} records from {}", records.len(), path.display());
    Ok(Document::from_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use luxplot_types::{Cue, Fixture, Function, Metadata, Ref, Registry, Value};

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.json");

        let mut doc = Document::new();
        let mut fixture = Fixture::new(Ref::new(1));
        fixture.personality.push(Function::new("Intens", 1));
        fixture.tags.insert("gel".into(), Value::Text("L201".into()));
        let func = fixture.personality[0].uuid.unwrap();
        doc.append(fixture).unwrap();
        let mut reg = Registry::new(Ref::new(1));
        reg.table.insert(101, func);
        doc.append(reg).unwrap();
        let mut cue = Cue::new(Ref::with_sub(1, 5));
        cue.push_level(func, 255);
        doc.append(cue).unwrap();
        doc.append(Metadata::new(Ref::new(1), "production")).unwrap();

        save_document(&path, &doc).unwrap();
        let loaded = load_document(&path).unwrap();
        assert_eq!(loaded, doc);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn load_rejects_unknown_record_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"[{"type": "truss", "uuid": "x", "ref": 1}]"#).unwrap();
        assert!(matches!(load_document(&path), Err(Error::Json(_))));
    }
}
