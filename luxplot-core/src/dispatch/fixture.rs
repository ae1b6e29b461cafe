use luxplot_types::{Fixture, FixtureAction, Record, RecordType, Value};

use super::{creation_refs, single_ref, DispatchResult};
use crate::addressing::{self, StartAddress};
use crate::error::{Error, Result};
use crate::printer::{function_string, generic_ref, generic_string, tag_lines};
use crate::reference::{resolve_references, safe_resolve_references};
use crate::state::{get_by_value, refsort, Session};
use crate::templates::{reidentify, FixtureTemplate};

pub(super) fn dispatch_fixture(action: &FixtureAction, session: &mut Session) -> Result<DispatchResult> {
    match action {
        FixtureAction::New { refs } => handle_new(session, refs),
        FixtureAction::FromTemplate { refs, template } => handle_from_template(session, refs, template),
        FixtureAction::Clone { src, dest } => handle_clone(session, src, dest),
        FixtureAction::List => Ok(DispatchResult::with_lines(
            refsort(session.document.get_by_type(RecordType::Fixture))
                .into_iter()
                .map(generic_string)
                .collect(),
        )),
        FixtureAction::Filter { tag, value } => {
            let fixtures = session.document.get_by_type(RecordType::Fixture);
            Ok(DispatchResult::with_lines(
                get_by_value(fixtures, tag, value)
                    .into_iter()
                    .map(generic_string)
                    .collect(),
            ))
        }
        FixtureAction::Remove { refs } => {
            let doc = &mut session.document;
            for reference in safe_resolve_references(doc, RecordType::Fixture, refs)? {
                doc.remove_by_ref(RecordType::Fixture, reference)?;
            }
            Ok(DispatchResult::none())
        }
        FixtureAction::Get { refs } => handle_get(session, refs, false),
        FixtureAction::GetAll { refs } => handle_get(session, refs, true),
        FixtureAction::Set { refs, tag, value } => handle_set(session, refs, tag, value),
        FixtureAction::Address {
            refs,
            universe,
            address,
        } => handle_address(session, refs, universe, address),
        FixtureAction::Unaddress { refs } => {
            let mut result = DispatchResult::none();
            for reference in resolve_references(refs)? {
                result.skip_missing(addressing::unassign(&mut session.document, reference))?;
            }
            Ok(result)
        }
        FixtureAction::CompleteFromTemplate { refs, template } => {
            handle_complete_from_template(session, refs, template)
        }
    }
}

fn handle_new(session: &mut Session, refs: &str) -> Result<DispatchResult> {
    let doc = &mut session.document;
    for reference in creation_refs(doc, RecordType::Fixture, refs)? {
        doc.append(Fixture::new(reference))?;
    }
    Ok(DispatchResult::none())
}

/// Load a template, falling back to the configured fallback template with a
/// warning when the named one does not exist.
fn load_with_fallback(session: &Session, name: &str, result: &mut DispatchResult) -> Result<FixtureTemplate> {
    match session.templates.load(name) {
        Err(e) if e.is_not_found() => {
            let fallback = &session.settings.fallback_template;
            result.warn(format!(
                "template {} does not exist, using fallback {}",
                name, fallback
            ));
            session.templates.load(fallback)
        }
        other => other,
    }
}

fn handle_from_template(session: &mut Session, refs: &str, template: &str) -> Result<DispatchResult> {
    let mut result = DispatchResult::none();
    let refs = creation_refs(&session.document, RecordType::Fixture, refs)?;
    let template = load_with_fallback(session, template, &mut result)?;
    for reference in refs {
        session.document.append(template.instantiate(reference))?;
    }
    Ok(result)
}

fn handle_clone(session: &mut Session, src: &str, dest: &str) -> Result<DispatchResult> {
    let doc = &mut session.document;
    let source = doc.fixture(single_ref(src)?)?.clone();
    for reference in creation_refs(doc, RecordType::Fixture, dest)? {
        doc.append(reidentify(source.clone(), reference))?;
    }
    Ok(DispatchResult::none())
}

fn handle_get(session: &Session, refs: &str, with_functions: bool) -> Result<DispatchResult> {
    let doc = &session.document;
    let mut result = DispatchResult::none();
    for reference in safe_resolve_references(doc, RecordType::Fixture, refs)? {
        let fixture = doc.fixture(reference)?;
        let record = Record::Fixture(fixture.clone());
        result.push_line(generic_string(&record));
        result.lines.extend(tag_lines(&record));
        if with_functions && !fixture.personality.is_empty() {
            result.push_line(format!("{} DMX Functions:", fixture.personality.len()));
            for function in &fixture.personality {
                result.push_line(format!("    {}", function_string(function)));
            }
        }
    }
    Ok(result)
}

fn handle_set(session: &mut Session, refs: &str, tag: &str, value: &str) -> Result<DispatchResult> {
    let doc = &mut session.document;
    let mut result = DispatchResult::none();
    for reference in safe_resolve_references(doc, RecordType::Fixture, refs)? {
        let record = doc
            .get_by_ref_mut(RecordType::Fixture, reference)
            .ok_or(Error::NotFound {
                kind: RecordType::Fixture,
                reference,
            })?;
        if !record.set_tag(tag, Value::Text(value.to_string())) {
            result.warn(format!("{} is a reserved field and cannot be set", tag));
            break;
        }
    }
    Ok(result)
}

fn handle_address(session: &mut Session, refs: &str, universe: &str, address: &str) -> Result<DispatchResult> {
    let fixtures = resolve_references(refs)?;
    let universe = single_ref(universe)?;
    let start: StartAddress = address.parse()?;
    let mut result = DispatchResult::none();
    for reference in fixtures {
        match addressing::assign(&mut session.document, reference, universe, start) {
            Ok(patched) => {
                if let Some(first) = patched.first() {
                    result.push_line(format!(
                        "{}: universe {} address {}",
                        generic_ref(RecordType::Fixture, reference),
                        first.universe,
                        first.address
                    ));
                }
            }
            // A full universe only stops this fixture.
            Err(e @ Error::UniverseFull { .. }) => {
                result.warn(format!("{}: {}", generic_ref(RecordType::Fixture, reference), e))
            }
            Err(e) => {
                result.skip_missing(Err::<(), _>(e))?;
            }
        }
    }
    Ok(result)
}

fn handle_complete_from_template(session: &mut Session, refs: &str, template: &str) -> Result<DispatchResult> {
    let mut result = DispatchResult::none();
    let refs = resolve_references(refs)?;
    let Some(template) = result.skip_missing(session.templates.load(template))? else {
        return Ok(result);
    };
    for reference in refs {
        if let Some(fixture) = result.skip_missing(session.document.fixture_mut(reference))? {
            let added = template.complete(fixture);
            log::debug!(target: "store", "fixture {}: {} items added from template", reference, added);
        }
    }
    Ok(result)
}
