mod common;

use luxplot_core::state::persistence::{load_document, save_document};
use luxplot_types::{CueAction, EditorAction, FixtureAction, Ref, RegistryAction};

use common::run;

#[test]
fn test_patch_cue_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = common::make_session(dir.path());

    run(
        &mut session,
        EditorAction::Fixture(FixtureAction::FromTemplate {
            refs: "1-3".into(),
            template: "mover".into(),
        }),
    );
    run(
        &mut session,
        EditorAction::Fixture(FixtureAction::Address {
            refs: "1".into(),
            universe: "1".into(),
            address: "1".into(),
        }),
    );
    run(
        &mut session,
        EditorAction::Fixture(FixtureAction::Address {
            refs: "2 3".into(),
            universe: "1".into(),
            address: "auto".into(),
        }),
    );
    let doc = &session.document;
    let table = &doc.registry(Ref::new(1)).unwrap().table;
    assert_eq!(table.len(), 15);
    assert_eq!(table.keys().last(), Some(&15));

    run(&mut session, EditorAction::Cue(CueAction::New { refs: "auto".into(), moves: None }));
    run(
        &mut session,
        EditorAction::Cue(CueAction::SetFixtureLevel {
            cues: "1".into(),
            fixtures: "1-3".into(),
            level: "80".into(),
        }),
    );

    let path = dir.path().join("plot.json");
    save_document(&path, &session.document).unwrap();
    session.document = load_document(&path).unwrap();

    let shown = run(&mut session, EditorAction::Cue(CueAction::GetIntensity { refs: "1".into() }));
    assert_eq!(shown.lines.len(), 4);
    assert!(shown.lines[3].starts_with("Fixture 3 ["));

    let query = run(&mut session, EditorAction::Registry(RegistryAction::Query { refs: "1".into() }));
    assert_eq!(query.lines[1], "15 Used Addresses:");
    assert_eq!(query.lines[2], "DMX001: Fixture 1 (Intens)");
    assert_eq!(query.lines[8], "DMX007: Fixture 2 (Pan)");
}

#[test]
fn test_auto_patch_rolls_into_new_universe() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = common::make_session(dir.path());
    run(
        &mut session,
        EditorAction::Fixture(FixtureAction::FromTemplate {
            refs: "1".into(),
            template: "mover".into(),
        }),
    );
    run(
        &mut session,
        EditorAction::Fixture(FixtureAction::Address {
            refs: "1".into(),
            universe: "1".into(),
            address: "510".into(),
        }),
    );
    let doc = &session.document;
    let ids = doc.fixture(Ref::new(1)).unwrap().function_ids();
    let u1 = doc.registry(Ref::new(1)).unwrap();
    let u2 = doc.registry(Ref::new(2)).unwrap();
    assert_eq!(u1.table.get(&510), Some(&ids[0]));
    assert_eq!(u1.table.get(&512), Some(&ids[2]));
    assert_eq!(u2.table.get(&1), Some(&ids[3]));
    assert_eq!(u2.table.get(&2), Some(&ids[4]));
}

#[test]
fn test_removed_fixture_leaves_stale_patch_until_unaddressed() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = common::make_session(dir.path());
    run(
        &mut session,
        EditorAction::Fixture(FixtureAction::FromTemplate {
            refs: "1 2".into(),
            template: "generic".into(),
        }),
    );
    run(
        &mut session,
        EditorAction::Fixture(FixtureAction::Address {
            refs: "1 2".into(),
            universe: "1".into(),
            address: "auto".into(),
        }),
    );
    run(&mut session, EditorAction::Fixture(FixtureAction::Unaddress { refs: "2".into() }));
    run(&mut session, EditorAction::Fixture(FixtureAction::Remove { refs: "2".into() }));
    run(&mut session, EditorAction::Fixture(FixtureAction::Remove { refs: "1".into() }));

    // Fixture 1 was removed without unaddressing; its entry survives.
    let query = run(&mut session, EditorAction::Registry(RegistryAction::Query { refs: "1".into() }));
    assert_eq!(query.lines[1], "1 Used Addresses:");
    assert!(query.lines[2].starts_with("DMX001: unknown function"));
}
