use luxplot_types::{Record, RecordType, Registry, RegistryAction};

use super::{creation_refs, single_ref, DispatchResult};
use crate::addressing;
use crate::error::{Error, Result};
use crate::printer::{generic_string, registry_query_lines, registry_summary_lines};
use crate::reference::{resolve_references, safe_resolve_references};
use crate::state::{refsort, Session};

pub(super) fn dispatch_registry(action: &RegistryAction, session: &mut Session) -> Result<DispatchResult> {
    let mut result = DispatchResult::none();
    match action {
        RegistryAction::New { refs } => {
            let doc = &mut session.document;
            for reference in creation_refs(doc, RecordType::Registry, refs)? {
                doc.append(Registry::new(reference))?;
            }
        }
        RegistryAction::Remove { refs } => {
            for reference in resolve_references(refs)? {
                result.skip_missing(session.document.remove_by_ref(RecordType::Registry, reference))?;
            }
        }
        RegistryAction::List => {
            result.lines = refsort(session.document.get_by_type(RecordType::Registry))
                .into_iter()
                .map(generic_string)
                .collect();
        }
        RegistryAction::Query { refs } => {
            let doc = &session.document;
            for reference in safe_resolve_references(doc, RecordType::Registry, refs)? {
                let registry = doc.registry(reference)?;
                result.push_line(generic_string(&Record::Registry(registry.clone())));
                result.lines.extend(registry_query_lines(doc, registry));
            }
        }
        RegistryAction::Add {
            fixture,
            functions,
            universe,
            address,
        } => {
            let fixture = single_ref(fixture)?;
            let offsets = resolve_references(functions)?
                .into_iter()
                .map(|r| {
                    if r.is_integer() {
                        Ok(r.major())
                    } else {
                        Err(Error::MalformedReference(functions.clone()))
                    }
                })
                .collect::<Result<Vec<u32>>>()?;
            let universe = single_ref(universe)?;
            let address: u32 = address
                .trim()
                .parse()
                .map_err(|_| Error::MalformedAddress(address.clone()))?;
            let outcome = addressing::patch_functions(&mut session.document, fixture, &offsets, universe, address);
            result.skip_missing(outcome)?;
        }
        RegistryAction::Summarise { refs } => {
            let doc = &session.document;
            let width = session.settings.registry_summary_width;
            for reference in safe_resolve_references(doc, RecordType::Registry, refs)? {
                let registry = doc.registry(reference)?;
                result.push_line(generic_string(&Record::Registry(registry.clone())));
                result.lines.extend(registry_summary_lines(registry, width));
            }
        }
    }
    Ok(result)
}
