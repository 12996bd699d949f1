use crate::{
    base64,
    error::*,
    schema::*,
    value::object::*,
};
use serde_json::{Map, Value as Json};
use tracing::debug;

/// Key of the JSON envelope marking a `piqi-any` value, also stripped from
/// top-level objects.
pub const TYPE_KEY: &str = "piqi_type";
pub const ANY_TYPE: &str = "piqi-any";

/// Decodes a JSON tree as `type_name`. Fields and options are matched by
/// name only; any mismatch is fatal.
pub fn from_json<S>(schema: &S, type_name: &str, value: &Json) -> Result<Object>
where
    S: SchemaIndex + ?Sized,
{
    debug!(type_name, "decoding json");
    let decoder = Decoder { schema };
    match value {
        Json::Object(fields)
            if fields.contains_key(TYPE_KEY)
                && !matches!(schema.unalias(type_name)?, Kind::Builtin(Builtin::Any)) =>
        {
            let fields = fields
                .iter()
                .filter(|(key, _)| key.as_str() != TYPE_KEY)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Map<_, _>>();
            decoder.parse_obj(type_name, &Json::Object(fields))
        }
        value => decoder.parse_obj(type_name, value),
    }
}

pub fn from_json_str<S>(schema: &S, type_name: &str, content: &str) -> Result<Object>
where
    S: SchemaIndex + ?Sized,
{
    let value = serde_json::from_str::<Json>(content).map_err(|error| Error::Syntax {
        loc: Some((error.line(), error.column()).into()),
        message: error.to_string(),
    })?;
    from_json(schema, type_name, &value)
}

fn quote(name: &str) -> String {
    format!("'{}'", name)
}

struct Decoder<'a, S>
where
    S: ?Sized,
{
    schema: &'a S,
}

impl<'a, S> Decoder<'a, S>
where
    S: SchemaIndex + ?Sized,
{
    fn parse_obj(&self, type_name: &str, x: &Json) -> Result<Object> {
        let schema = self.schema;
        match schema.unalias(type_name)? {
            Kind::Builtin(builtin) => parse_builtin(builtin, x),
            Kind::Record(def) => self.parse_record(def, x),
            Kind::List(def) => self.parse_list(def, x),
            Kind::Variant(def) => self.parse_variant(def, x),
            Kind::Enum(def) => parse_enum(def, x),
            Kind::Alias(def) => {
                Err(Error::Schema(format!("unresolved alias '{}'", def.name)))
            }
        }
    }

    fn parse_list(&self, def: &ListDef, x: &Json) -> Result<Object> {
        let Json::Array(items) = x else {
            return Err(Error::structural(None, "array expected"));
        };
        let items = items
            .iter()
            .map(|item| self.parse_obj(&def.type_name, item))
            .collect::<Result<Vec<_>>>()?;
        Ok(Object::List(List {
            type_name: def.name.clone(),
            items,
            loc: None,
        }))
    }

    fn parse_record(&self, def: &RecordDef, x: &Json) -> Result<Object> {
        let Json::Object(entries) = x else {
            return Err(Error::structural(None, "object expected"));
        };
        let mut rest = entries.iter().collect::<Vec<_>>();
        let mut fields = Vec::with_capacity(def.field.len());
        for spec in &def.field {
            let value = self.parse_field(spec, &mut rest)?;
            fields.push((spec.name().to_owned(), value));
        }
        if let Some((key, _)) = rest.first() {
            return Err(Error::UnknownField {
                loc: None,
                field: quote(key),
            });
        }
        Ok(Object::Record(Record {
            type_name: def.name.clone(),
            fields,
            loc: None,
        }))
    }

    fn parse_field(&self, spec: &FieldSpec, rest: &mut Vec<(&String, &Json)>) -> Result<FieldValue> {
        let json_name = spec.json_field_name();
        let found = rest
            .iter()
            .position(|(key, _)| **key == json_name)
            .map(|index| rest.remove(index).1)
            // explicit null is an absent field
            .filter(|value| !value.is_null());
        let Some(type_name) = spec.type_name.as_deref() else {
            let present = match found {
                None => false,
                Some(Json::Bool(value)) => *value,
                Some(_) => {
                    return Err(Error::scalar(
                        None,
                        format!(
                            "only true and false can be used as values for flag {}",
                            quote(&json_name)
                        ),
                    ))
                }
            };
            return Ok(FieldValue::Single(Object::scalar(Value::Bool(present))));
        };
        match (spec.mode, found) {
            (Mode::Required, None) => Err(Error::MissingField {
                loc: None,
                name: json_name,
            }),
            (Mode::Optional, None) => match &spec.default {
                Some(default) => Ok(FieldValue::Single(self.parse_obj(type_name, default)?)),
                None => Ok(FieldValue::Missing),
            },
            (Mode::Repeated, None) => Ok(FieldValue::Repeated(vec![])),
            (Mode::Repeated, Some(Json::Array(items))) => Ok(FieldValue::Repeated(
                items
                    .iter()
                    .map(|item| self.parse_obj(type_name, item))
                    .collect::<Result<Vec<_>>>()?,
            )),
            (Mode::Repeated, Some(_)) => Err(Error::structural(
                None,
                format!("array expected for field {}", quote(&json_name)),
            )),
            (_, Some(value)) => Ok(FieldValue::Single(self.parse_obj(type_name, value)?)),
        }
    }

    fn parse_variant(&self, def: &VariantDef, x: &Json) -> Result<Object> {
        let Json::Object(entries) = x else {
            return Err(Error::structural(None, "object expected"));
        };
        let mut entries = entries.iter();
        let (Some((key, value)), None) = (entries.next(), entries.next()) else {
            return Err(Error::structural(None, "exactly one option field expected"));
        };
        let Some(spec) = def
            .option
            .iter()
            .find(|spec| spec.json_option_name() == *key)
        else {
            return Err(Error::UnknownVariant {
                loc: None,
                message: format!("unknown variant option {}", quote(key)),
            });
        };
        let value = match (spec.type_name.as_deref(), value) {
            (None, Json::Bool(true)) => None,
            (None, _) => return Err(Error::scalar(None, "true value expected")),
            (Some(type_name), value) => Some(self.parse_obj(type_name, value)?),
        };
        Ok(Object::Variant(Variant::new(&def.name, spec.name(), value)))
    }
}

fn parse_enum(def: &VariantDef, x: &Json) -> Result<Object> {
    let Json::String(name) = x else {
        return Err(Error::structural(None, "string enum value expected"));
    };
    def.option
        .iter()
        .find(|spec| spec.json_option_name() == *name)
        .map(|spec| Object::Enum(Enum::new(&def.name, spec.name())))
        .ok_or_else(|| Error::UnknownVariant {
            loc: None,
            message: format!("unknown enum option {}", quote(name)),
        })
}

fn parse_builtin(builtin: Builtin, x: &Json) -> Result<Object> {
    let value = match (builtin, x) {
        (Builtin::Bool, Json::Bool(v)) => Value::Bool(*v),
        (Builtin::Bool, _) => return Err(Error::scalar(None, "bool constant expected")),
        (Builtin::Int, Json::Number(v)) => match v.as_i64() {
            Some(v) => Value::Int(v),
            None if v.is_u64() => return Err(Error::scalar(None, "int constant out of range")),
            None => return Err(Error::scalar(None, "int constant expected")),
        },
        (Builtin::Int, _) => return Err(Error::scalar(None, "int constant expected")),
        (Builtin::Float, Json::Number(v)) => match v.as_f64() {
            Some(v) => Value::Float(v),
            None => return Err(Error::scalar(None, "float constant expected")),
        },
        (Builtin::Float, Json::String(v)) => match v.as_str() {
            "NaN" => Value::Float(f64::NAN),
            "Infinity" => Value::Float(f64::INFINITY),
            "-Infinity" => Value::Float(f64::NEG_INFINITY),
            _ => return Err(Error::scalar(None, "float constant expected")),
        },
        (Builtin::Float, _) => return Err(Error::scalar(None, "float constant expected")),
        (Builtin::String, Json::String(v)) => Value::String(v.clone()),
        (Builtin::String, _) => return Err(Error::scalar(None, "string constant expected")),
        (Builtin::Binary, Json::String(v)) => match base64::decode(v) {
            Some(v) => Value::Binary(v),
            None => return Err(Error::scalar(None, "invalid base64-encoded string")),
        },
        (Builtin::Binary, _) => return Err(Error::scalar(None, "string constant expected")),
        (Builtin::Any, x) => return parse_any(x).map(Object::Any),
    };
    Ok(Object::scalar(value))
}

/// Either the `piqi-any` envelope or a plain schema-erased JSON value.
fn parse_any(x: &Json) -> Result<Any> {
    match x {
        Json::Object(fields)
            if fields.get(TYPE_KEY).and_then(Json::as_str) == Some(ANY_TYPE) =>
        {
            let typename = match fields.get("type") {
                None => None,
                Some(Json::String(name)) => Some(name.clone()),
                Some(_) => {
                    return Err(Error::structural(
                        None,
                        "string type name expected in piqi-any",
                    ))
                }
            };
            Ok(Any {
                typename,
                piq: None,
                json: fields.get("json").cloned(),
            })
        }
        x => Ok(Any {
            json: Some(x.clone()),
            ..Default::default()
        }),
    }
}
