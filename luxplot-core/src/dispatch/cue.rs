use luxplot_types::{Cue, CueAction, Record, RecordType, Ref, Value};

use super::{creation_refs, DispatchResult};
use crate::error::{Error, Result};
use crate::levels::{self, find_fixture_intensity};
use crate::printer::{function_string, generic_ref, generic_string, level_bar};
use crate::reference::{resolve_references, safe_resolve_references};
use crate::state::{refsort, Session};

pub(super) fn dispatch_cue(action: &CueAction, session: &mut Session) -> Result<DispatchResult> {
    match action {
        CueAction::New { refs, moves } => handle_new(session, refs, moves.as_deref()),
        CueAction::Remove { refs } => {
            let doc = &mut session.document;
            for reference in safe_resolve_references(doc, RecordType::Cue, refs)? {
                doc.remove_by_ref(RecordType::Cue, reference)?;
            }
            Ok(DispatchResult::none())
        }
        CueAction::List => Ok(DispatchResult::with_lines(
            refsort(session.document.get_by_type(RecordType::Cue))
                .into_iter()
                .map(generic_string)
                .collect(),
        )),
        CueAction::Set { refs, tag, value } => {
            let doc = &mut session.document;
            let mut result = DispatchResult::none();
            for reference in safe_resolve_references(doc, RecordType::Cue, refs)? {
                if let Some(record) = doc.get_by_ref_mut(RecordType::Cue, reference) {
                    if !record.set_tag(tag, Value::Text(value.clone())) {
                        result.warn(format!("{} is a reserved field and cannot be set", tag));
                        break;
                    }
                }
            }
            Ok(result)
        }
        CueAction::SetFixtureLevel {
            cues,
            fixtures,
            level,
        } => handle_set_fixture_level(session, cues, fixtures, level),
        CueAction::GetIntensity { refs } => handle_get_intensity(session, refs),
        CueAction::GetFixtureLevels { cues, fixtures } => handle_get_fixture_levels(session, cues, fixtures),
    }
}

/// Parse `fixtures@level` groups separated by `;`.
fn parse_moves(moves: &str) -> Result<Vec<(Vec<Ref>, u32)>> {
    moves
        .split(';')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            let (fixtures, level) = m
                .split_once('@')
                .ok_or_else(|| Error::MalformedLevel(m.to_string()))?;
            Ok((resolve_references(fixtures)?, levels::parse_level(level)?))
        })
        .collect()
}

fn handle_new(session: &mut Session, refs: &str, moves: Option<&str>) -> Result<DispatchResult> {
    let moves = match moves {
        Some(moves) => parse_moves(moves)?,
        None => Vec::new(),
    };
    let param = &session.settings.intensity_param;
    let doc = &mut session.document;
    let mut result = DispatchResult::none();
    for reference in creation_refs(doc, RecordType::Cue, refs)? {
        let mut cue = Cue::new(reference);
        for (fixtures, level) in &moves {
            for &fixture_ref in fixtures {
                if let Some(fixture) = result.skip_missing(doc.fixture(fixture_ref))? {
                    result.skip_missing(levels::set_fixture_level(&mut cue, fixture, *level, param))?;
                }
            }
        }
        doc.append(cue)?;
    }
    Ok(result)
}

fn handle_set_fixture_level(session: &mut Session, cues: &str, fixtures: &str, level: &str) -> Result<DispatchResult> {
    let level = levels::parse_level(level)?;
    let cues = resolve_references(cues)?;
    let fixtures = resolve_references(fixtures)?;
    let param = &session.settings.intensity_param;
    let doc = &mut session.document;
    let mut result = DispatchResult::none();
    for cue_ref in cues {
        if result.skip_missing(doc.cue(cue_ref))?.is_none() {
            continue;
        }
        for &fixture_ref in &fixtures {
            let Some(fixture) = result.skip_missing(doc.fixture(fixture_ref).cloned())? else {
                continue;
            };
            let cue = doc.cue_mut(cue_ref)?;
            result.skip_missing(levels::set_fixture_level(cue, &fixture, level, param))?;
        }
    }
    Ok(result)
}

fn handle_get_intensity(session: &Session, refs: &str) -> Result<DispatchResult> {
    let doc = &session.document;
    let mut result = DispatchResult::none();
    for reference in safe_resolve_references(doc, RecordType::Cue, refs)? {
        let cue = doc.cue(reference)?;
        result.push_line(generic_string(&Record::Cue(cue.clone())));
        for entry in levels::intensity_levels(doc, cue, &session.settings.intensity_param) {
            result.push_line(format!(
                "{} {}",
                generic_ref(RecordType::Fixture, entry.fixture.reference),
                level_bar(entry.level)
            ));
        }
    }
    Ok(result)
}

fn handle_get_fixture_levels(session: &Session, cues: &str, fixtures: &str) -> Result<DispatchResult> {
    let doc = &session.document;
    let param = &session.settings.intensity_param;
    let mut result = DispatchResult::none();
    let fixture_refs = safe_resolve_references(doc, RecordType::Fixture, fixtures)?;
    for cue_ref in safe_resolve_references(doc, RecordType::Cue, cues)? {
        let cue = doc.cue(cue_ref)?;
        result.push_line(generic_string(&Record::Cue(cue.clone())));
        for &fixture_ref in &fixture_refs {
            let fixture = doc.fixture(fixture_ref)?;
            let intensity = find_fixture_intensity(fixture, param).and_then(|f| f.uuid);
            for entry in levels::fixture_levels(doc, cue, fixture) {
                if entry.function.uuid.is_some() && entry.function.uuid == intensity {
                    result.push_line(format!(
                        "{} {}",
                        generic_ref(RecordType::Fixture, fixture_ref),
                        level_bar(entry.level)
                    ));
                }
                result.push_line(format!("    {} @ {}", function_string(entry.function), entry.level));
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::dispatch_action;
    use crate::dispatch::tests::session;
    use luxplot_types::{EditorAction, Fixture, Function, Ref};

    fn run(session: &mut Session, action: CueAction) -> Result<DispatchResult> {
        dispatch_action(&EditorAction::Cue(action), session)
    }

    fn lit_session() -> Session {
        let mut session = session();
        for r in 1..=2 {
            let mut fixture = Fixture::new(Ref::new(r));
            fixture.personality.push(Function::new("Intens", 1));
            fixture.personality.push(Function::new("Zoom", 2));
            session.document.append(fixture).unwrap();
        }
        session
    }

    #[test]
    fn test_set_and_get_intensity() {
        let mut session = lit_session();
        run(&mut session, CueAction::New { refs: "1".into(), moves: None }).unwrap();
        run(
            &mut session,
            CueAction::Set {
                refs: "1".into(),
                tag: "label".into(),
                value: "Preset".into(),
            },
        )
        .unwrap();
        let result = run(
            &mut session,
            CueAction::SetFixtureLevel {
                cues: "1".into(),
                fixtures: "1 2 3".into(),
                level: "H32".into(),
            },
        )
        .unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(session.document.cue(Ref::new(1)).unwrap().levels.len(), 2);

        let shown = run(&mut session, CueAction::GetIntensity { refs: "1".into() }).unwrap();
        assert_eq!(shown.lines.len(), 3);
        assert_eq!(shown.lines[0], "Cue 1: Preset");
        assert!(shown.lines[1].starts_with("Fixture 1 ["));
        assert!(shown.lines[2].ends_with("] 50"));
    }

    #[test]
    fn test_malformed_level_is_fatal() {
        let mut session = lit_session();
        run(&mut session, CueAction::New { refs: "1".into(), moves: None }).unwrap();
        let err = run(
            &mut session,
            CueAction::SetFixtureLevel {
                cues: "1".into(),
                fixtures: "1".into(),
                level: "full".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedLevel(_)));

        let err = run(
            &mut session,
            CueAction::SetFixtureLevel {
                cues: "1".into(),
                fixtures: "1".into(),
                level: "70000".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedLevel(_)));
        assert!(session.document.cue(Ref::new(1)).unwrap().levels.is_empty());
    }

    #[test]
    fn test_fixture_levels_listing() {
        let mut session = lit_session();
        run(&mut session, CueAction::New { refs: "auto".into(), moves: None }).unwrap();
        run(
            &mut session,
            CueAction::SetFixtureLevel {
                cues: "1".into(),
                fixtures: "2".into(),
                level: "75".into(),
            },
        )
        .unwrap();
        let shown = run(
            &mut session,
            CueAction::GetFixtureLevels {
                cues: "1".into(),
                fixtures: "1-2".into(),
            },
        )
        .unwrap();
        assert_eq!(shown.lines.len(), 3);
        assert!(shown.lines[1].starts_with("Fixture 2 ["));
        assert_eq!(shown.lines[2], "    1: Intens @ 75");
    }

    #[test]
    fn test_new_with_moves() {
        let mut session = lit_session();
        let result = run(
            &mut session,
            CueAction::New {
                refs: "3".into(),
                moves: Some("1-2@H80; 7@10".into()),
            },
        )
        .unwrap();
        assert_eq!(result.warnings.len(), 1);
        let cue = session.document.cue(Ref::new(3)).unwrap();
        let levels: Vec<u32> = cue.levels.iter().map(|l| l.level).collect();
        assert_eq!(levels, vec![128, 128]);

        let err = run(
            &mut session,
            CueAction::New {
                refs: "4".into(),
                moves: Some("1 50".into()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedLevel(_)));
        assert!(session.document.cue(Ref::new(4)).is_err());
    }

    #[test]
    fn test_remove_and_list() {
        let mut session = lit_session();
        run(&mut session, CueAction::New { refs: "1 1.5 2".into(), moves: None }).unwrap();
        run(&mut session, CueAction::Remove { refs: "2 7".into() }).unwrap();
        let listed = run(&mut session, CueAction::List).unwrap();
        assert_eq!(listed.lines, vec!["Cue 1", "Cue 1.5"]);
    }
}
