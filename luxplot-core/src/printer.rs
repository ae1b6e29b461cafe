//! Plain-text renderings of records for command output.

use luxplot_types::{Function, Record, RecordType, Ref, Registry, UNIVERSE_SIZE};

use crate::state::Document;

/// Tags tried, in order, when describing a fixture or cue in one line.
const DESCRIPTION_TAGS: &[&str] = &["label", "name", "fixture-type"];

const BAR_WIDTH: usize = 20;

fn kind_title(kind: RecordType) -> &'static str {
    match kind {
        RecordType::Metadata => "Metadata",
        RecordType::Fixture => "Fixture",
        RecordType::Registry => "Registry",
        RecordType::Cue => "Cue",
    }
}

/// `Fixture 12.3`
pub fn generic_ref(kind: RecordType, reference: Ref) -> String {
    format!("{} {}", kind_title(kind), reference)
}

/// One-line summary of a record.
pub fn generic_string(record: &Record) -> String {
    let head = generic_ref(record.kind(), record.reference());
    let detail = match record {
        Record::Metadata(m) => Some(format!("{} = {}", m.name, m.value.as_deref().unwrap_or(""))),
        Record::Registry(r) => Some(format!("{} used addresses", r.table.len())),
        Record::Fixture(_) | Record::Cue(_) => DESCRIPTION_TAGS
            .iter()
            .find_map(|tag| record.tags().get(*tag))
            .map(|v| v.to_string()),
    };
    match detail {
        Some(detail) => format!("{}: {}", head, detail),
        None => head,
    }
}

/// `3: Pan (16b)` style line for a function.
pub fn function_string(function: &Function) -> String {
    format!("{}: {}", function.offset, function.name())
}

/// Every tag of a record, sorted by key, as `    key: value` lines under a
/// count heading.
pub fn tag_lines(record: &Record) -> Vec<String> {
    let tags = record.tags();
    let mut lines = vec![format!("{} Data Tags:", tags.len())];
    lines.extend(tags.iter().map(|(k, v)| format!("    {}: {}", k, v)));
    lines
}

/// Used addresses of a registry with the function patched at each.
pub fn registry_query_lines(doc: &Document, registry: &Registry) -> Vec<String> {
    let mut lines = vec![format!("{} Used Addresses:", registry.table.len())];
    for (address, func) in &registry.table {
        let target = match doc.find_function(*func) {
            Some(found) => format!(
                "{} ({})",
                generic_ref(RecordType::Fixture, found.fixture.reference),
                found.function.name()
            ),
            None => format!("unknown function {}", func),
        };
        lines.push(format!("DMX{:03}: {}", address, target));
    }
    lines
}

/// Grid of the whole universe, `width` addresses per row: `#` used, `-` free.
pub fn registry_summary_lines(registry: &Registry, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut header = String::from("    ");
    for column in 0..width {
        header.push_str(&format!(" {:02}", column));
    }
    let mut lines = vec![header];

    let addresses: Vec<u16> = (1..=UNIVERSE_SIZE).collect();
    for row in addresses.chunks(width) {
        let mut line = format!("{:03} ", row[0]);
        for address in row {
            let mark = if registry.is_free(*address) { '-' } else { '#' };
            line.push_str(&format!("  {}", mark));
        }
        lines.push(line);
    }
    lines
}

/// Fixed-width bar for a level in percent, clamped to 0-100.
pub fn level_bar(level: u32) -> String {
    let clamped = level.min(100) as usize;
    let filled = clamped * BAR_WIDTH / 100;
    format!(
        "[{}{}] {}",
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        level
    )
}
