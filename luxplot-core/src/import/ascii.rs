//! USITT ASCII show files.
//!
//! The format is line oriented. Records of interest come either as single
//! keyword lines (`Patch`) or as blocks: a header line followed by detail
//! lines, ended by a blank line.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use luxplot_types::{CueAction, EditorAction, FixtureAction, Function, RecordType, Ref, Tags, Value};

use super::{ImportReport, ImportTarget};
use crate::dispatch::dispatch_action;
use crate::error::{Error, Result};
use crate::levels::{find_fixture_intensity, parse_level, remove_function_levels, set_function_level};
use crate::state::Session;
use crate::templates::FixtureTemplate;

/// Parameter ids declared by `$ParamType` lines, mapped to their names.
pub type ParameterTable = HashMap<String, String>;

struct Patterns {
    param_type: Regex,
    patch_line: Regex,
    patch_pair: Regex,
    personality: Regex,
    eos_patch: Regex,
    cue: Regex,
}

impl Patterns {
    fn compile() -> Result<Self> {
        Ok(Self {
            param_type: Regex::new(r"^\$ParamType +([0-9]*) ([0-9]*) (.*)")?,
            patch_line: Regex::new(r"^Patch\s")?,
            patch_pair: Regex::new(r"([0-9]+)<([0-9]+)")?,
            personality: Regex::new(r"^\$Personality\s")?,
            eos_patch: Regex::new(r"^\$Patch\s")?,
            cue: Regex::new(r"^Cue\s")?,
        })
    }
}

/// A header line and the detail lines that follow it.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<'a> {
    /// 1-based line number of the header.
    pub start: usize,
    pub lines: Vec<&'a str>,
}

impl<'a> Block<'a> {
    /// Whitespace-separated field `n` of the header line.
    fn header_field(&self, n: usize, what: &str) -> Result<&'a str> {
        self.lines[0]
            .split_whitespace()
            .nth(n)
            .ok_or_else(|| self.malformed(0, format!("missing {}", what)))
    }

    fn malformed(&self, idx: usize, reason: impl Into<String>) -> Error {
        malformed_line(self.start + idx, self.lines[idx], reason)
    }
}

fn malformed_line(line: usize, text: &str, reason: impl Into<String>) -> Error {
    Error::MalformedLine {
        line,
        text: text.trim().to_string(),
        reason: reason.into(),
    }
}

/// Collect the blocks whose header matches `start`.
///
/// A block runs until the next blank line; one still open at the end of the
/// input is kept. Header-like lines inside an open block are ordinary detail
/// lines.
pub fn extract_blocks<'a>(lines: &[&'a str], start: &Regex) -> Vec<Block<'a>> {
    let mut blocks = Vec::new();
    let mut current: Option<Block<'a>> = None;
    for (i, &line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            blocks.extend(current.take());
        } else if let Some(block) = current.as_mut() {
            block.lines.push(line);
        } else if start.is_match(line) {
            current = Some(Block {
                start: i + 1,
                lines: vec![line],
            });
        }
    }
    blocks.extend(current);
    blocks
}

/// Split a line into its keyword and the rest, both trimmed.
pub fn resolve_line(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(' ') {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    }
}

fn parameter_table(lines: &[&str], pattern: &Regex) -> ParameterTable {
    lines
        .iter()
        .filter_map(|line| pattern.captures(line))
        .map(|caps| (caps[1].to_string(), caps[3].trim().to_string()))
        .collect()
}

/// Import already-read file contents.
pub(crate) fn import_text(session: &mut Session, text: &str, target: ImportTarget) -> Result<ImportReport> {
    let patterns = Patterns::compile()?;
    let lines: Vec<&str> = text.lines().collect();
    let params = parameter_table(&lines, &patterns.param_type);
    log::debug!(target: "import", "{} parameter types declared", params.len());

    let mut report = ImportReport::default();
    match target {
        ImportTarget::ConventionalPatch => conventional_patch(session, &lines, &patterns, &mut report)?,
        ImportTarget::EosPatch => eos_patch(session, &lines, &patterns, &params, &mut report)?,
        ImportTarget::Cues => cues(session, &lines, &patterns, &params, &mut report)?,
    }
    Ok(report)
}

/// Run an editor command on behalf of the importer. Missing records and
/// occupied refs skip the item; returns whether the command ran.
fn run(session: &mut Session, report: &mut ImportReport, action: EditorAction) -> Result<bool> {
    match dispatch_action(&action, session) {
        Ok(result) => {
            report.absorb(result);
            Ok(true)
        }
        Err(e) if e.is_not_found() || matches!(e, Error::RefOccupied { .. }) => {
            report.warn(e.to_string());
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Console addresses are absolute; universe `address / 512`, offset
/// `address % 512`.
fn split_address(address: u32) -> (String, String) {
    ((address / 512).to_string(), (address % 512).to_string())
}

fn conventional_patch(
    session: &mut Session,
    lines: &[&str],
    patterns: &Patterns,
    report: &mut ImportReport,
) -> Result<()> {
    let template = session.settings.conventional_template.clone();
    let mut created_here: HashSet<Ref> = HashSet::new();
    for (i, &line) in lines.iter().enumerate() {
        if !patterns.patch_line.is_match(line) {
            continue;
        }
        for caps in patterns.patch_pair.captures_iter(line) {
            let channel = &caps[1];
            let address: u32 = caps[2]
                .parse()
                .map_err(|_| malformed_line(i + 1, line, "dimmer number out of range"))?;
            let reference: Ref = channel
                .parse()
                .map_err(|_| malformed_line(i + 1, line, "bad channel number"))?;

            // A channel listed against several dimmers gets every address,
            // but fixtures that predate this import are left alone.
            if !created_here.contains(&reference) {
                if session.document.contains(RecordType::Fixture, reference) {
                    report.warn(
                        Error::RefOccupied {
                            kind: RecordType::Fixture,
                            reference,
                        }
                        .to_string(),
                    );
                    continue;
                }
                let created = run(
                    session,
                    report,
                    EditorAction::Fixture(FixtureAction::FromTemplate {
                        refs: channel.to_string(),
                        template: template.clone(),
                    }),
                )?;
                if !created {
                    continue;
                }
                created_here.insert(reference);
            }

            let (universe, dmx) = split_address(address);
            if address % 512 == 0 {
                log::info!(target: "import", "channel {} at dimmer {} left unpatched", channel, address);
            }
            run(
                session,
                report,
                EditorAction::Fixture(FixtureAction::Address {
                    refs: channel.to_string(),
                    universe,
                    address: dmx,
                }),
            )?;
        }
    }
    Ok(())
}

/// `$$PersChan <param> <width> <offset> [<fine offset>]`
fn personality_channel(block: &Block, idx: usize, rest: &str, params: &ParameterTable) -> Result<Vec<Function>> {
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let &[param_id, width, offset, ..] = fields.as_slice() else {
        return Err(block.malformed(idx, "expected parameter, width and offset"));
    };
    let param = params
        .get(param_id)
        .ok_or_else(|| Error::UnknownParameter(param_id.to_string()))?;
    let number = |text: &str| -> Result<u32> {
        text.parse()
            .map_err(|_| block.malformed(idx, format!("bad number '{}'", text)))
    };

    let mut functions = vec![template_function(param.clone(), number(offset)?)];
    if number(width)? == 2 {
        let fine = fields
            .get(3)
            .ok_or_else(|| block.malformed(idx, "16-bit channel without fine offset"))?;
        functions.push(template_function(
            format!("{}{}", param, luxplot_types::FINE_SUFFIX),
            number(fine)?,
        ));
    }
    Ok(functions)
}

fn template_function(param: String, offset: u32) -> Function {
    Function {
        uuid: None,
        offset,
        param,
        tags: Tags::new(),
    }
}

fn eos_patch(
    session: &mut Session,
    lines: &[&str],
    patterns: &Patterns,
    params: &ParameterTable,
    report: &mut ImportReport,
) -> Result<()> {
    let mut templates: HashMap<&str, FixtureTemplate> = HashMap::new();
    for block in extract_blocks(lines, &patterns.personality) {
        let id = block.header_field(1, "personality id")?;
        let mut template = FixtureTemplate::default();
        for (idx, &line) in block.lines.iter().enumerate() {
            match resolve_line(line) {
                ("$$Manuf", rest) => {
                    template.tags.insert("manufacturer".into(), Value::from(rest));
                }
                ("$$Model", rest) => {
                    template.tags.insert("fixture-type".into(), Value::from(rest));
                }
                ("$$PersChan", rest) => {
                    template
                        .personality
                        .extend(personality_channel(&block, idx, rest, params)?);
                }
                _ => {}
            }
        }
        log::debug!(target: "import", "personality {}: {} functions", id, template.personality.len());
        templates.insert(id, template);
    }

    for block in extract_blocks(lines, &patterns.eos_patch) {
        let channel = block.header_field(1, "channel")?;
        let reference: Ref = channel
            .parse()
            .map_err(|_| block.malformed(0, "bad channel number"))?;
        let personality = block.header_field(2, "personality")?;
        let address: u32 = block
            .header_field(3, "address")?
            .parse()
            .map_err(|_| block.malformed(0, "bad address"))?;

        let Some(template) = templates.get(personality) else {
            report.warn(format!(
                "channel {}: personality {} is not defined in this file",
                channel, personality
            ));
            continue;
        };
        if let Err(e) = session.document.append(template.instantiate(reference)) {
            match e {
                Error::RefOccupied { .. } => {
                    report.warn(e.to_string());
                    continue;
                }
                e => return Err(e),
            }
        }

        let (universe, dmx) = split_address(address);
        run(
            session,
            report,
            EditorAction::Fixture(FixtureAction::Address {
                refs: channel.to_string(),
                universe,
                address: dmx,
            }),
        )?;

        for &line in &block.lines[1..] {
            let tag = match resolve_line(line) {
                ("$$TextGel", rest) => ("gel", rest),
                ("Text", rest) => ("label", rest),
                _ => continue,
            };
            run(
                session,
                report,
                EditorAction::Fixture(FixtureAction::Set {
                    refs: channel.to_string(),
                    tag: tag.0.to_string(),
                    value: tag.1.to_string(),
                }),
            )?;
        }
    }
    Ok(())
}

fn cues(
    session: &mut Session,
    lines: &[&str],
    patterns: &Patterns,
    params: &ParameterTable,
    report: &mut ImportReport,
) -> Result<()> {
    for block in extract_blocks(lines, &patterns.cue) {
        let number = block.header_field(1, "cue number")?;
        let cue_ref: Ref = number
            .parse()
            .map_err(|_| block.malformed(0, "bad cue number"))?;
        let created = run(
            session,
            report,
            EditorAction::Cue(CueAction::New {
                refs: number.to_string(),
                moves: None,
            }),
        )?;
        if !created {
            continue;
        }

        for (idx, &line) in block.lines.iter().enumerate().skip(1) {
            let (keyword, rest) = resolve_line(line);
            let tag = match keyword {
                "Text" => "label",
                "Up" => "fade-up",
                "Down" => "fade-down",
                "Chan" => {
                    for token in rest.split_whitespace() {
                        let (channel, level) = token
                            .split_once('@')
                            .ok_or_else(|| block.malformed(idx, "expected channel@level"))?;
                        run(
                            session,
                            report,
                            EditorAction::Cue(CueAction::SetFixtureLevel {
                                cues: number.to_string(),
                                fixtures: channel.to_string(),
                                level: level.to_string(),
                            }),
                        )?;
                    }
                    continue;
                }
                "$$Param" => {
                    parameter_levels(session, report, &block, idx, cue_ref, rest, params)?;
                    continue;
                }
                _ => continue,
            };
            run(
                session,
                report,
                EditorAction::Cue(CueAction::Set {
                    refs: number.to_string(),
                    tag: tag.to_string(),
                    value: rest.to_string(),
                }),
            )?;
        }
    }
    Ok(())
}

/// `$$Param <channel> <param>@<level> ...`
///
/// An intensity value here is the full-resolution one; it replaces any
/// level a `Chan` line already set for that fixture.
fn parameter_levels(
    session: &mut Session,
    report: &mut ImportReport,
    block: &Block,
    idx: usize,
    cue_ref: Ref,
    rest: &str,
    params: &ParameterTable,
) -> Result<()> {
    let mut fields = rest.split_whitespace();
    let channel = fields
        .next()
        .ok_or_else(|| block.malformed(idx, "missing channel"))?;
    let fixture_ref: Ref = channel
        .parse()
        .map_err(|_| block.malformed(idx, "bad channel number"))?;
    let fixture = match session.document.fixture(fixture_ref) {
        Ok(fixture) => fixture.clone(),
        Err(e) => {
            report.warn(format!("cue {}: {}", cue_ref, e));
            return Ok(());
        }
    };
    let intensity_param = &session.settings.intensity_param;

    for token in fields.filter(|t| t.contains('@')) {
        let (param_id, value) = token
            .split_once('@')
            .ok_or_else(|| block.malformed(idx, "expected param@level"))?;
        let param = params
            .get(param_id)
            .ok_or_else(|| Error::UnknownParameter(param_id.to_string()))?;
        let level = parse_level(value)?;
        let cue = session.document.cue_mut(cue_ref)?;

        if param == intensity_param {
            if let Some(id) = find_fixture_intensity(&fixture, intensity_param).and_then(|f| f.uuid) {
                remove_function_levels(cue, id);
            }
        }
        match fixture.function_by_param(param) {
            Some(function) => set_function_level(cue, &fixture, function, level)?,
            None => report.warn(format!(
                "cue {}: fixture {} has no {} function",
                cue_ref, fixture_ref, param
            )),
        }
    }
    Ok(())
}
