use crate::{
    base64,
    de::json::{ANY_TYPE, TYPE_KEY},
    error::*,
    schema::*,
    value::object::*,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonConfig {
    /// Skip missing optional fields, empty repeated fields and unset flags.
    /// A field's own `json_omit_missing` takes precedence.
    pub omit_missing_fields: bool,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            omit_missing_fields: true,
        }
    }
}

impl JsonConfig {
    pub fn with_omit_missing_fields(mut self, mode: bool) -> Self {
        self.omit_missing_fields = mode;
        self
    }
}

pub fn to_json<S>(schema: &S, value: &Object) -> Result<Json>
where
    S: SchemaIndex + ?Sized,
{
    to_json_as(schema, value, JsonConfig::default())
}

/// Encodes a typed object, looking up field and option specs through the
/// type names the object carries.
pub fn to_json_as<S>(schema: &S, value: &Object, config: JsonConfig) -> Result<Json>
where
    S: SchemaIndex + ?Sized,
{
    debug!(type_name = value.type_name(), "encoding json");
    Encoder { schema, config }.gen_obj(value)
}

pub fn to_json_string<S>(schema: &S, value: &Object, config: JsonConfig) -> Result<String>
where
    S: SchemaIndex + ?Sized,
{
    Ok(serde_json::to_string_pretty(&to_json_as(schema, value, config)?)?)
}

struct Encoder<'a, S>
where
    S: ?Sized,
{
    schema: &'a S,
    config: JsonConfig,
}

impl<'a, S> Encoder<'a, S>
where
    S: SchemaIndex + ?Sized,
{
    fn gen_obj(&self, x: &Object) -> Result<Json> {
        match x {
            Object::Record(v) => self.gen_record(v),
            Object::List(v) => Ok(Json::Array(
                v.items
                    .iter()
                    .map(|item| self.gen_obj(item))
                    .collect::<Result<_>>()?,
            )),
            Object::Variant(v) => self.gen_variant(v),
            Object::Enum(v) => self.gen_enum(v),
            Object::Any(v) => Ok(gen_any(v)),
            Object::Scalar(v) => Ok(gen_scalar(&v.value)),
        }
    }

    fn options_of(&self, type_name: &str) -> Result<&'a VariantDef> {
        let schema = self.schema;
        match schema.unalias(type_name)? {
            Kind::Variant(def) | Kind::Enum(def) => Ok(def),
            _ => Err(Error::Schema(format!("'{}' is not a variant or enum", type_name))),
        }
    }

    fn gen_record(&self, record: &Record) -> Result<Json> {
        let schema = self.schema;
        let Kind::Record(def) = schema.unalias(&record.type_name)? else {
            return Err(Error::Schema(format!(
                "'{}' is not a record",
                record.type_name
            )));
        };
        let mut result = Map::with_capacity(def.field.len());
        for spec in &def.field {
            let value = record.get(spec.name()).unwrap_or(&FieldValue::Missing);
            if let Some(json) = self.gen_field(spec, value, record)? {
                result.insert(spec.json_field_name(), json);
            }
        }
        Ok(Json::Object(result))
    }

    /// `None` means the field is left out of the output object.
    fn gen_field(&self, spec: &FieldSpec, value: &FieldValue, record: &Record) -> Result<Option<Json>> {
        let omit = spec
            .json_omit_missing
            .unwrap_or(self.config.omit_missing_fields);
        if spec.is_flag() {
            return match value {
                FieldValue::Missing if omit => Ok(None),
                FieldValue::Missing => Ok(Some(Json::Bool(false))),
                FieldValue::Single(v) => match v.as_bool() {
                    Some(false) if omit => Ok(None),
                    Some(flag) => Ok(Some(Json::Bool(flag))),
                    None => Err(Error::scalar(
                        v.loc(),
                        format!("bool expected for flag '{}'", spec.name()),
                    )),
                },
                FieldValue::Repeated(_) => Err(Error::structural(
                    record.loc,
                    format!("invalid value for flag '{}'", spec.name()),
                )),
            };
        }
        match (spec.mode, value) {
            (Mode::Repeated, FieldValue::Repeated(items)) if omit && items.is_empty() => Ok(None),
            (Mode::Repeated, FieldValue::Repeated(items)) => Ok(Some(Json::Array(
                items
                    .iter()
                    .map(|item| self.gen_obj(item))
                    .collect::<Result<_>>()?,
            ))),
            (Mode::Repeated, FieldValue::Missing) if omit => Ok(None),
            (Mode::Repeated, FieldValue::Missing) => Ok(Some(Json::Array(vec![]))),
            (Mode::Required, FieldValue::Single(v)) => self.gen_obj(v).map(Some),
            (Mode::Required, _) => Err(Error::MissingField {
                loc: record.loc,
                name: spec.name().to_owned(),
            }),
            (Mode::Optional, FieldValue::Missing) if omit => Ok(None),
            (Mode::Optional, FieldValue::Missing) => Ok(Some(Json::Null)),
            (Mode::Optional, FieldValue::Single(v)) => self.gen_obj(v).map(Some),
            _ => Err(Error::structural(
                record.loc,
                format!("invalid value for field '{}'", spec.name()),
            )),
        }
    }

    fn gen_variant(&self, variant: &Variant) -> Result<Json> {
        let def = self.options_of(&variant.type_name)?;
        let Some(spec) = def.find_option(&variant.tag) else {
            return Err(Error::UnknownVariant {
                loc: variant.loc,
                message: format!("unknown option '{}'", variant.tag),
            });
        };
        let value = match (&variant.value, &spec.type_name) {
            (Some(value), _) => self.gen_obj(value)?,
            (None, Some(_)) => Json::Null,
            (None, None) => Json::Bool(true),
        };
        let mut result = Map::with_capacity(1);
        result.insert(spec.json_option_name(), value);
        Ok(Json::Object(result))
    }

    fn gen_enum(&self, value: &Enum) -> Result<Json> {
        let def = self.options_of(&value.type_name)?;
        def.find_option(&value.tag)
            .map(|spec| Json::String(spec.json_option_name()))
            .ok_or_else(|| Error::UnknownVariant {
                loc: value.loc,
                message: format!("unknown enum option '{}'", value.tag),
            })
    }
}

fn gen_any(value: &Any) -> Json {
    let mut result = Map::with_capacity(3);
    result.insert(TYPE_KEY.to_owned(), Json::String(ANY_TYPE.to_owned()));
    if let Some(typename) = &value.typename {
        result.insert("type".to_owned(), Json::String(typename.clone()));
    }
    if let Some(json) = &value.json {
        result.insert("json".to_owned(), json.clone());
    }
    Json::Object(result)
}

fn gen_scalar(value: &Value) -> Json {
    match value {
        Value::Bool(v) => Json::Bool(*v),
        Value::Int(v) => Json::Number((*v).into()),
        Value::Float(v) => match Number::from_f64(*v) {
            Some(v) => Json::Number(v),
            None if v.is_nan() => Json::String("NaN".to_owned()),
            None if v.is_sign_positive() => Json::String("Infinity".to_owned()),
            None => Json::String("-Infinity".to_owned()),
        },
        Value::String(v) => Json::String(v.clone()),
        Value::Binary(v) => Json::String(base64::encode(v)),
    }
}
