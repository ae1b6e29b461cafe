use luxplot_types::{Metadata, MetadataAction, RecordType};

use super::{creation_refs, DispatchResult};
use crate::error::Result;
use crate::printer::generic_string;
use crate::reference::resolve_references;
use crate::state::{get_by_value, refsort, Session};

pub(super) fn dispatch_metadata(action: &MetadataAction, session: &mut Session) -> Result<DispatchResult> {
    let doc = &mut session.document;
    let mut result = DispatchResult::none();
    match action {
        MetadataAction::New { refs, name } => {
            for reference in creation_refs(doc, RecordType::Metadata, refs)? {
                doc.append(Metadata::new(reference, name.clone()))?;
            }
        }
        MetadataAction::Set { refs, value } => {
            for reference in resolve_references(refs)? {
                let outcome = doc.metadata_mut(reference).map(|m| m.value = Some(value.clone()));
                result.skip_missing(outcome)?;
            }
        }
        MetadataAction::Remove { refs } => {
            for reference in resolve_references(refs)? {
                result.skip_missing(doc.remove_by_ref(RecordType::Metadata, reference))?;
            }
        }
        MetadataAction::Get { name } => {
            let matches = get_by_value(doc.get_by_type(RecordType::Metadata), "name", name);
            result.lines = matches.into_iter().map(generic_string).collect();
        }
        MetadataAction::List => {
            result.lines = refsort(doc.get_by_type(RecordType::Metadata))
                .into_iter()
                .map(generic_string)
                .collect();
        }
    }
    Ok(result)
}
