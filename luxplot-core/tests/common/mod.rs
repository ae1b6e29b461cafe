#![allow(dead_code)]

use std::path::Path;

use luxplot_core::config::EditorSettings;
use luxplot_core::dispatch::{dispatch_action, DispatchResult};
use luxplot_core::state::{Document, Session};
use luxplot_core::templates::TemplateLibrary;
use luxplot_types::EditorAction;

pub const DIMMER: &str = r#"{
    "fixture-type": "Dimmer",
    "personality": [{"param": "Intens", "offset": 1, "name": "Intensity"}]
}"#;

pub const MOVER: &str = r#"{
    "manufacturer": "Acme",
    "fixture-type": "Spot 250",
    "personality": [
        {"param": "Intens", "offset": 1},
        {"param": "Pan", "offset": 2},
        {"param": "Pan (16b)", "offset": 3},
        {"param": "Tilt", "offset": 4},
        {"param": "Tilt (16b)", "offset": 5}
    ]
}"#;

pub fn write_template(data_dir: &Path, name: &str, json: &str) {
    let dir = data_dir.join("fixture");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{}.json", name)), json).unwrap();
}

/// Session whose only data directory is `data_dir`, holding the `generic`
/// and `mover` templates.
pub fn make_session(data_dir: &Path) -> Session {
    write_template(data_dir, "generic", DIMMER);
    write_template(data_dir, "mover", MOVER);
    Session::new(
        Document::new(),
        TemplateLibrary::new(vec![data_dir.to_path_buf()]),
        EditorSettings::default(),
    )
}

pub fn run(session: &mut Session, action: EditorAction) -> DispatchResult {
    dispatch_action(&action, session).unwrap()
}
