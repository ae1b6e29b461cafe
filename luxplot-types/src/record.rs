//! Plot records: the four record kinds held by a plot document.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FunctionId, RecordId, Ref, Tags, Value};

/// Suffix marking the fine half of a 16-bit function pair.
pub const FINE_SUFFIX: &str = " (16b)";

/// Highest address in a DMX universe.
pub const UNIVERSE_SIZE: u16 = 512;

/// Tag names that map onto typed record fields and cannot be set as tags.
pub const RESERVED_TAGS: &[&str] = &["type", "uuid", "ref", "personality", "table", "levels"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Metadata,
    Fixture,
    Registry,
    Cue,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Metadata => "metadata",
            RecordType::Fixture => "fixture",
            RecordType::Registry => "registry",
            RecordType::Cue => "cue",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One DMX-controlled parameter of a fixture.
///
/// `uuid` is `None` only for functions read straight out of a template that
/// have not been individuated yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<FunctionId>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub param: String,
    #[serde(flatten)]
    pub tags: Tags,
}

impl Function {
    pub fn new(param: impl Into<String>, offset: u32) -> Self {
        Self {
            uuid: Some(FunctionId::new()),
            offset,
            param: param.into(),
            tags: Tags::new(),
        }
    }

    /// Display name: the `name` tag if present, otherwise the parameter.
    pub fn name(&self) -> &str {
        self.tags
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&self.param)
    }

    pub fn is_fine(&self) -> bool {
        self.param.ends_with(FINE_SUFFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub uuid: RecordId,
    #[serde(rename = "ref")]
    pub reference: Ref,
    #[serde(default)]
    pub personality: Vec<Function>,
    #[serde(flatten)]
    pub tags: Tags,
}

impl Fixture {
    pub fn new(reference: Ref) -> Self {
        Self {
            uuid: RecordId::new(),
            reference,
            personality: Vec::new(),
            tags: Tags::new(),
        }
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.personality.iter().find(|f| f.uuid == Some(id))
    }

    pub fn function_ids(&self) -> Vec<FunctionId> {
        self.personality.iter().filter_map(|f| f.uuid).collect()
    }

    /// First function whose parameter name is exactly `param`.
    pub fn function_by_param(&self, param: &str) -> Option<&Function> {
        self.personality.iter().find(|f| f.param == param)
    }

    pub fn function_by_offset(&self, offset: u32) -> Option<&Function> {
        self.personality.iter().find(|f| f.offset == offset)
    }

    /// Fine-channel sibling of `function`, if the personality declares one.
    pub fn fine_sibling(&self, function: &Function) -> Option<&Function> {
        let fine = format!("{}{}", function.param, FINE_SUFFIX);
        self.function_by_param(&fine)
    }
}

/// One DMX universe's patch table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub uuid: RecordId,
    #[serde(rename = "ref")]
    pub reference: Ref,
    #[serde(default, with = "address_table")]
    pub table: BTreeMap<u16, FunctionId>,
    #[serde(flatten)]
    pub tags: Tags,
}

impl Registry {
    pub fn new(reference: Ref) -> Self {
        Self {
            uuid: RecordId::new(),
            reference,
            table: BTreeMap::new(),
            tags: Tags::new(),
        }
    }

    pub fn is_free(&self, address: u16) -> bool {
        !self.table.contains_key(&address)
    }
}

/// Tables go through serde's buffered content inside the tagged `Record`,
/// which cannot turn string map keys back into integers. Keys are written
/// and read as strings explicitly.
mod address_table {
    use std::collections::BTreeMap;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::FunctionId;

    pub fn serialize<S: Serializer>(
        table: &BTreeMap<u16, FunctionId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let keyed: BTreeMap<String, FunctionId> =
            table.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        keyed.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u16, FunctionId>, D::Error> {
        let keyed = BTreeMap::<String, FunctionId>::deserialize(deserializer)?;
        keyed
            .into_iter()
            .map(|(k, v)| {
                k.parse::<u16>()
                    .map(|addr| (addr, v))
                    .map_err(|_| D::Error::custom(format!("invalid DMX address '{}'", k)))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEntry {
    pub func: FunctionId,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub uuid: RecordId,
    #[serde(rename = "ref")]
    pub reference: Ref,
    #[serde(default)]
    pub levels: Vec<LevelEntry>,
    #[serde(flatten)]
    pub tags: Tags,
}

impl Cue {
    pub fn new(reference: Ref) -> Self {
        Self {
            uuid: RecordId::new(),
            reference,
            levels: Vec::new(),
            tags: Tags::new(),
        }
    }

    pub fn push_level(&mut self, func: FunctionId, level: u32) {
        self.levels.push(LevelEntry { func, level });
    }

    pub fn levels_for(&self, func: FunctionId) -> impl Iterator<Item = &LevelEntry> + '_ {
        self.levels.iter().filter(move |l| l.func == func)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub uuid: RecordId,
    #[serde(rename = "ref")]
    pub reference: Ref,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub tags: Tags,
}

impl Metadata {
    pub fn new(reference: Ref, name: impl Into<String>) -> Self {
        Self {
            uuid: RecordId::new(),
            reference,
            name: name.into(),
            value: None,
            tags: Tags::new(),
        }
    }
}

/// A plot record of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    Metadata(Metadata),
    Fixture(Fixture),
    Registry(Registry),
    Cue(Cue),
}

impl Record {
    pub fn kind(&self) -> RecordType {
        match self {
            Record::Metadata(_) => RecordType::Metadata,
            Record::Fixture(_) => RecordType::Fixture,
            Record::Registry(_) => RecordType::Registry,
            Record::Cue(_) => RecordType::Cue,
        }
    }

    pub fn uuid(&self) -> RecordId {
        match self {
            Record::Metadata(m) => m.uuid,
            Record::Fixture(f) => f.uuid,
            Record::Registry(r) => r.uuid,
            Record::Cue(q) => q.uuid,
        }
    }

    pub fn reference(&self) -> Ref {
        match self {
            Record::Metadata(m) => m.reference,
            Record::Fixture(f) => f.reference,
            Record::Registry(r) => r.reference,
            Record::Cue(q) => q.reference,
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            Record::Metadata(m) => &m.tags,
            Record::Fixture(f) => &f.tags,
            Record::Registry(r) => &r.tags,
            Record::Cue(q) => &q.tags,
        }
    }

    pub fn tags_mut(&mut self) -> &mut Tags {
        match self {
            Record::Metadata(m) => &mut m.tags,
            Record::Fixture(f) => &mut f.tags,
            Record::Registry(r) => &mut r.tags,
            Record::Cue(q) => &mut q.tags,
        }
    }

    /// Look up a field by name, covering both the typed core and the tags.
    pub fn field(&self, name: &str) -> Option<Value> {
        match (name, self) {
            ("type", _) => Some(Value::Text(self.kind().to_string())),
            ("uuid", _) => Some(Value::Text(self.uuid().to_string())),
            ("ref", _) => Some(Value::Text(self.reference().to_string())),
            ("name", Record::Metadata(m)) => Some(Value::Text(m.name.clone())),
            ("value", Record::Metadata(m)) => m.value.clone().map(Value::Text),
            _ => self.tags().get(name).cloned(),
        }
    }

    /// Set a free-form tag. Returns false for reserved field names.
    pub fn set_tag(&mut self, name: &str, value: Value) -> bool {
        if RESERVED_TAGS.contains(&name) {
            return false;
        }
        match (name, &mut *self) {
            ("name", Record::Metadata(m)) => m.name = value.to_string(),
            ("value", Record::Metadata(m)) => m.value = Some(value.to_string()),
            _ => {
                self.tags_mut().insert(name.to_string(), value);
            }
        }
        true
    }

    pub fn as_fixture(&self) -> Option<&Fixture> {
        match self {
            Record::Fixture(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_fixture_mut(&mut self) -> Option<&mut Fixture> {
        match self {
            Record::Fixture(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_registry(&self) -> Option<&Registry> {
        match self {
            Record::Registry(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_registry_mut(&mut self) -> Option<&mut Registry> {
        match self {
            Record::Registry(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_cue(&self) -> Option<&Cue> {
        match self {
            Record::Cue(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_cue_mut(&mut self) -> Option<&mut Cue> {
        match self {
            Record::Cue(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_metadata_mut(&mut self) -> Option<&mut Metadata> {
        match self {
            Record::Metadata(m) => Some(m),
            _ => None,
        }
    }
}

impl From<Fixture> for Record {
    fn from(f: Fixture) -> Self {
        Record::Fixture(f)
    }
}

impl From<Registry> for Record {
    fn from(r: Registry) -> Self {
        Record::Registry(r)
    }
}

impl From<Cue> for Record {
    fn from(q: Cue) -> Self {
        Record::Cue(q)
    }
}

impl From<Metadata> for Record {
    fn from(m: Metadata) -> Self {
        Record::Metadata(m)
    }
}
