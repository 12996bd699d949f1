use crate::error::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Built-in scalar kinds and the schema type names mapped onto them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bool,
    Int,
    Float,
    String,
    Binary,
    Any,
}

impl Builtin {
    pub fn of(type_name: &str) -> Option<Self> {
        match type_name {
            "bool" => Some(Self::Bool),
            "string" => Some(Self::String),
            "binary" => Some(Self::Binary),
            "piqi-any" => Some(Self::Any),
            "int" | "uint" | "int32" | "uint32" | "int64" | "uint64" | "int32-fixed"
            | "uint32-fixed" | "int64-fixed" | "uint64-fixed" | "protobuf-int32"
            | "protobuf-int64" => Some(Self::Int),
            "float" | "float32" | "float64" => Some(Self::Float),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Required,
    Optional,
    Repeated,
}

/// Replaces `-` with `_`, which is how names appear in JSON.
pub fn make_json_name(name: &str) -> String {
    name.replace('-', "_")
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Fields without a type are flags.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub mode: Mode,
    /// JSON literal materialized when an optional field is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piq_alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piq_positional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_omit_missing: Option<bool>,
}

impl FieldSpec {
    pub fn new(name: impl ToString, type_name: impl ToString) -> Self {
        Self {
            name: Some(name.to_string()),
            type_name: Some(type_name.to_string()),
            ..Default::default()
        }
    }

    /// Field named after its type.
    pub fn of_type(type_name: impl ToString) -> Self {
        Self {
            type_name: Some(type_name.to_string()),
            ..Default::default()
        }
    }

    pub fn flag(name: impl ToString) -> Self {
        Self {
            name: Some(name.to_string()),
            mode: Mode::Optional,
            ..Default::default()
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn optional(self) -> Self {
        self.mode(Mode::Optional)
    }

    pub fn repeated(self) -> Self {
        self.mode(Mode::Repeated)
    }

    pub fn alias(mut self, alias: impl ToString) -> Self {
        self.piq_alias = Some(alias.to_string());
        self
    }

    pub fn positional(mut self, value: bool) -> Self {
        self.piq_positional = Some(value);
        self
    }

    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn json_name(mut self, name: impl ToString) -> Self {
        self.json_name = Some(name.to_string());
        self
    }

    pub fn omit_missing(mut self, value: bool) -> Self {
        self.json_omit_missing = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.type_name.as_deref())
            .unwrap_or_default()
    }

    pub fn json_field_name(&self) -> String {
        self.json_name
            .clone()
            .unwrap_or_else(|| make_json_name(self.name()))
    }

    pub fn is_flag(&self) -> bool {
        self.type_name.is_none()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name() == name || self.piq_alias.as_deref() == Some(name)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Options without a type carry no payload.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piq_alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
}

impl OptionSpec {
    pub fn new(name: impl ToString, type_name: impl ToString) -> Self {
        Self {
            name: Some(name.to_string()),
            type_name: Some(type_name.to_string()),
            ..Default::default()
        }
    }

    pub fn tag(name: impl ToString) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// Anonymous option named after its type.
    pub fn of_type(type_name: impl ToString) -> Self {
        Self {
            type_name: Some(type_name.to_string()),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl ToString) -> Self {
        self.piq_alias = Some(alias.to_string());
        self
    }

    pub fn json_name(mut self, name: impl ToString) -> Self {
        self.json_name = Some(name.to_string());
        self
    }

    pub fn name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.type_name.as_deref())
            .unwrap_or_default()
    }

    pub fn json_option_name(&self) -> String {
        self.json_name
            .clone()
            .unwrap_or_else(|| make_json_name(self.name()))
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name() == name || self.piq_alias.as_deref() == Some(name)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDef {
    pub name: String,
    #[serde(default)]
    pub field: Vec<FieldSpec>,
    /// Lets a labeled field of this record type hold a single bare element
    /// instead of a list.
    #[serde(default)]
    pub piq_allow_unnesting: bool,
}

impl RecordDef {
    pub fn new(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.field.push(spec);
        self
    }

    pub fn allow_unnesting(mut self, value: bool) -> Self {
        self.piq_allow_unnesting = value;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl ListDef {
    pub fn new(name: impl ToString, type_name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

/// Option table shared by variants and enums.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDef {
    pub name: String,
    #[serde(default)]
    pub option: Vec<OptionSpec>,
}

impl VariantDef {
    pub fn new(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            option: vec![],
        }
    }

    pub fn option(mut self, spec: OptionSpec) -> Self {
        self.option.push(spec);
        self
    }

    pub fn find_option(&self, name: &str) -> Option<&OptionSpec> {
        self.option.iter().find(|spec| spec.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl AliasDef {
    pub fn new(name: impl ToString, type_name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Typedef {
    Record(RecordDef),
    List(ListDef),
    Variant(VariantDef),
    Enum(VariantDef),
    Alias(AliasDef),
}

impl Typedef {
    pub fn name(&self) -> &str {
        match self {
            Self::Record(def) => &def.name,
            Self::List(def) => &def.name,
            Self::Variant(def) | Self::Enum(def) => &def.name,
            Self::Alias(def) => &def.name,
        }
    }
}

impl From<RecordDef> for Typedef {
    fn from(def: RecordDef) -> Self {
        Self::Record(def)
    }
}

impl From<ListDef> for Typedef {
    fn from(def: ListDef) -> Self {
        Self::List(def)
    }
}

impl From<AliasDef> for Typedef {
    fn from(def: AliasDef) -> Self {
        Self::Alias(def)
    }
}

/// Resolved kind of a type name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kind<'a> {
    Builtin(Builtin),
    Record(&'a RecordDef),
    List(&'a ListDef),
    Variant(&'a VariantDef),
    Enum(&'a VariantDef),
    Alias(&'a AliasDef),
}

impl<'a> From<&'a Typedef> for Kind<'a> {
    fn from(typedef: &'a Typedef) -> Self {
        match typedef {
            Typedef::Record(def) => Self::Record(def),
            Typedef::List(def) => Self::List(def),
            Typedef::Variant(def) => Self::Variant(def),
            Typedef::Enum(def) => Self::Enum(def),
            Typedef::Alias(def) => Self::Alias(def),
        }
    }
}

/// Read-only index of resolved type definitions.
pub trait SchemaIndex {
    fn lookup(&self, type_name: &str) -> Option<&Typedef>;

    fn resolve<'a>(&'a self, type_name: &str) -> Result<Kind<'a>> {
        if let Some(builtin) = Builtin::of(type_name) {
            return Ok(Kind::Builtin(builtin));
        }
        self.lookup(type_name)
            .map(Kind::from)
            .ok_or_else(|| Error::UnknownType(type_name.to_owned()))
    }

    /// Follows alias chains until a non-alias kind is reached.
    fn unalias<'a>(&'a self, type_name: &str) -> Result<Kind<'a>> {
        let mut kind = self.resolve(type_name)?;
        let mut visited = Vec::<&str>::new();
        while let Kind::Alias(def) = kind {
            if visited.contains(&def.name.as_str()) {
                return Err(Error::Schema(format!("alias cycle through '{}'", def.name)));
            }
            visited.push(&def.name);
            kind = self.resolve(&def.type_name)?;
        }
        Ok(kind)
    }
}

/// In-memory schema index, loadable from a JSON list of typedefs.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(from = "Vec<Typedef>")]
pub struct Schema {
    typedefs: HashMap<String, Typedef>,
}

impl Schema {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            typedefs: HashMap::with_capacity(capacity),
        }
    }

    pub fn with(&mut self, typedef: impl Into<Typedef>) -> &mut Self {
        let typedef = typedef.into();
        self.typedefs.insert(typedef.name().to_owned(), typedef);
        self
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn len(&self) -> usize {
        self.typedefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.typedefs.is_empty()
    }
}

impl From<Vec<Typedef>> for Schema {
    fn from(typedefs: Vec<Typedef>) -> Self {
        typedefs.into_iter().collect()
    }
}

impl FromIterator<Typedef> for Schema {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Typedef>,
    {
        Self {
            typedefs: iter
                .into_iter()
                .map(|typedef| (typedef.name().to_owned(), typedef))
                .collect(),
        }
    }
}

impl SchemaIndex for Schema {
    fn lookup(&self, type_name: &str) -> Option<&Typedef> {
        self.typedefs.get(type_name)
    }
}
