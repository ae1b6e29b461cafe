//! Command-line parsing: `luxplot [-v] [-f plot.json] <command> [args...]`.

use std::path::PathBuf;

use luxplot_types::{
    CueAction, EditorAction, FixtureAction, ImportAction, MetadataAction, RegistryAction,
};

pub const DEFAULT_PLOT: &str = "plot.json";

/// Name, argument names, description. Names in brackets are optional.
const COMMANDS: &[(&str, &[&str], &str)] = &[
    ("ml", &[], "list metadata"),
    ("mn", &["ref", "name"], "new metadata item"),
    ("ms", &["ref", "value"], "set metadata value"),
    ("mr", &["ref"], "remove metadata"),
    ("mg", &["name"], "print metadata by name"),
    ("xn", &["ref"], "new empty fixture"),
    ("xN", &["ref", "template"], "new fixture from template"),
    ("xc", &["src", "dest"], "clone a fixture"),
    ("xl", &[], "list fixtures"),
    ("xf", &["tag", "value"], "list fixtures with a tag value"),
    ("xr", &["ref"], "remove fixtures"),
    ("xg", &["ref"], "print fixture tags"),
    ("xG", &["ref"], "print fixture tags and functions"),
    ("xs", &["ref", "tag", "value"], "set a fixture tag"),
    ("xa", &["ref", "universe", "address"], "patch fixtures (address, auto or 0)"),
    ("xA", &["ref"], "unpatch fixtures"),
    ("xct", &["ref", "template"], "complete fixtures from a template"),
    ("rl", &[], "list registries"),
    ("rq", &["ref"], "list used addresses of registries"),
    ("rn", &["ref"], "new registry"),
    ("rr", &["ref"], "remove registries"),
    ("ra", &["fixture", "functions", "universe", "address"], "patch functions by offset"),
    ("rS", &["ref"], "summarise registry usage"),
    ("qn", &["ref", "[moves]"], "new cue, with optional fixture@level;... moves"),
    ("qr", &["ref"], "remove cues"),
    ("ql", &[], "list cues"),
    ("qs", &["ref", "tag", "value"], "set a cue tag"),
    ("qsx", &["cue", "fixture", "level"], "set fixture intensity in cues"),
    ("qg", &["ref"], "print intensities in cues"),
    ("qgx", &["cue", "fixture"], "print fixture levels in cues"),
    ("ia", &["file", "target"], "import USITT ASCII (conventional_patch, eos_patch, cues)"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub verbose: bool,
    pub file: PathBuf,
    pub action: EditorAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Help,
    Run(Invocation),
}

fn is_optional(arg: &str) -> bool {
    arg.starts_with('[')
}

fn arg_list(args: &[&str]) -> String {
    args.iter()
        .map(|a| if is_optional(a) { a.to_string() } else { format!("<{}>", a) })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn usage() -> String {
    let mut out = String::from("usage: luxplot [-v] [-f plot.json] <command> [args...]\n\ncommands:\n");
    for (name, args, help) in COMMANDS {
        out.push_str(&format!("  {:<4} {:<42} {}\n", name, arg_list(args), help));
    }
    out
}

pub fn parse_args(args: &[String]) -> Result<Parsed, String> {
    let mut verbose = false;
    let mut file = PathBuf::from(DEFAULT_PLOT);
    let mut rest = args.iter();
    let command = loop {
        match rest.next().map(String::as_str) {
            Some("-v") | Some("--verbose") => verbose = true,
            Some("-f") | Some("--file") => {
                file = rest
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| "-f needs a file name".to_string())?;
            }
            Some("-h") | Some("--help") | Some("help") | None => return Ok(Parsed::Help),
            Some(command) => break command,
        }
    };
    let operands: Vec<String> = rest.cloned().collect();
    let action = parse_command(command, &operands)?;
    Ok(Parsed::Run(Invocation {
        verbose,
        file,
        action,
    }))
}

/// Build the action for one command. Trailing operands beyond the expected
/// count are joined into the last one, so values may contain spaces.
pub fn parse_command(name: &str, operands: &[String]) -> Result<EditorAction, String> {
    let (_, expected, _) = COMMANDS
        .iter()
        .find(|(n, _, _)| *n == name)
        .ok_or_else(|| format!("unknown command '{}'", name))?;
    let required = expected.iter().filter(|a| !is_optional(a)).count();
    if operands.len() < required {
        return Err(format!("usage: {} {}", name, arg_list(expected)));
    }
    let taken = operands.len().min(expected.len());
    let mut a: Vec<String> = operands[..taken].to_vec();
    if let Some(last) = a.last_mut() {
        for extra in &operands[taken..] {
            last.push(' ');
            last.push_str(extra);
        }
    }
    let arg = |i: usize| a[i].clone();
    let optional = |i: usize| a.get(i).cloned();

    let action = match name {
        "ml" => EditorAction::Metadata(MetadataAction::List),
        "mn" => EditorAction::Metadata(MetadataAction::New { refs: arg(0), name: arg(1) }),
        "ms" => EditorAction::Metadata(MetadataAction::Set { refs: arg(0), value: arg(1) }),
        "mr" => EditorAction::Metadata(MetadataAction::Remove { refs: arg(0) }),
        "mg" => EditorAction::Metadata(MetadataAction::Get { name: arg(0) }),
        "xn" => EditorAction::Fixture(FixtureAction::New { refs: arg(0) }),
        "xN" => EditorAction::Fixture(FixtureAction::FromTemplate { refs: arg(0), template: arg(1) }),
        "xc" => EditorAction::Fixture(FixtureAction::Clone { src: arg(0), dest: arg(1) }),
        "xl" => EditorAction::Fixture(FixtureAction::List),
        "xf" => EditorAction::Fixture(FixtureAction::Filter { tag: arg(0), value: arg(1) }),
        "xr" => EditorAction::Fixture(FixtureAction::Remove { refs: arg(0) }),
        "xg" => EditorAction::Fixture(FixtureAction::Get { refs: arg(0) }),
        "xG" => EditorAction::Fixture(FixtureAction::GetAll { refs: arg(0) }),
        "xs" => EditorAction::Fixture(FixtureAction::Set { refs: arg(0), tag: arg(1), value: arg(2) }),
        "xa" => EditorAction::Fixture(FixtureAction::Address {
            refs: arg(0),
            universe: arg(1),
            address: arg(2),
        }),
        "xA" => EditorAction::Fixture(FixtureAction::Unaddress { refs: arg(0) }),
        "xct" => EditorAction::Fixture(FixtureAction::CompleteFromTemplate { refs: arg(0), template: arg(1) }),
        "rl" => EditorAction::Registry(RegistryAction::List),
        "rq" => EditorAction::Registry(RegistryAction::Query { refs: arg(0) }),
        "rn" => EditorAction::Registry(RegistryAction::New { refs: arg(0) }),
        "rr" => EditorAction::Registry(RegistryAction::Remove { refs: arg(0) }),
        "ra" => EditorAction::Registry(RegistryAction::Add {
            fixture: arg(0),
            functions: arg(1),
            universe: arg(2),
            address: arg(3),
        }),
        "rS" => EditorAction::Registry(RegistryAction::Summarise { refs: arg(0) }),
        "qn" => EditorAction::Cue(CueAction::New {
            refs: arg(0),
            moves: optional(1),
        }),
        "qr" => EditorAction::Cue(CueAction::Remove { refs: arg(0) }),
        "ql" => EditorAction::Cue(CueAction::List),
        "qs" => EditorAction::Cue(CueAction::Set { refs: arg(0), tag: arg(1), value: arg(2) }),
        "qsx" => EditorAction::Cue(CueAction::SetFixtureLevel {
            cues: arg(0),
            fixtures: arg(1),
            level: arg(2),
        }),
        "qg" => EditorAction::Cue(CueAction::GetIntensity { refs: arg(0) }),
        "qgx" => EditorAction::Cue(CueAction::GetFixtureLevels { cues: arg(0), fixtures: arg(1) }),
        "ia" => EditorAction::Import(ImportAction::Ascii {
            path: PathBuf::from(arg(0)),
            target: arg(1),
        }),
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(action)
}
