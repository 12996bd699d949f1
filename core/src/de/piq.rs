use crate::{
    error::*,
    schema::*,
    value::{object::*, piq::*},
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Enables bare words as payload-less options, bool/int/float to string
    /// coercion and int to float promotion.
    pub relaxed_parsing: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            relaxed_parsing: true,
        }
    }
}

impl ParseConfig {
    pub fn with_relaxed_parsing(mut self, mode: bool) -> Self {
        self.relaxed_parsing = mode;
        self
    }
}

pub fn from_piq<S>(schema: &S, type_name: &str, value: Piq) -> Result<Object>
where
    S: SchemaIndex + ?Sized,
{
    from_piq_as(schema, type_name, value, Default::default())
}

pub fn from_piq_as<S>(
    schema: &S,
    type_name: &str,
    value: Piq,
    config: ParseConfig,
) -> Result<Object>
where
    S: SchemaIndex + ?Sized,
{
    Parser::new(schema, config).parse(type_name, value)
}

/// Why a decode attempt produced no value.
#[derive(Debug)]
enum Fault {
    /// Real error, tagged with the nesting depth it was raised at.
    Fatal { error: Error, depth: usize },
    /// None of the options of a nested variant matched.
    NoVariant,
}

type Parsed<T> = std::result::Result<T, Fault>;

type Choice = (String, Option<Object>);

#[derive(Debug, Default, Clone, Copy)]
struct Hint {
    try_mode: bool,
    nested_variant: bool,
    labeled: bool,
}

impl Hint {
    fn labeled() -> Self {
        Self {
            labeled: true,
            ..Default::default()
        }
    }

    fn speculative() -> Self {
        Self {
            try_mode: true,
            ..Default::default()
        }
    }
}

/// Decoding context for Piq trees. Owns the nesting depth that scopes
/// positional backtracking.
#[derive(Debug)]
pub struct Parser<'a, S>
where
    S: ?Sized,
{
    schema: &'a S,
    config: ParseConfig,
    depth: usize,
}

impl<'a, S> Parser<'a, S>
where
    S: SchemaIndex + ?Sized,
{
    pub fn new(schema: &'a S, config: ParseConfig) -> Self {
        Self {
            schema,
            config,
            depth: 0,
        }
    }

    /// Normalizes `value` (splices, then label chains) and decodes it as
    /// `type_name`.
    pub fn parse(&mut self, type_name: &str, value: Piq) -> Result<Object> {
        debug!(type_name, "decoding piq");
        let value = value.normalize()?;
        let depth = self.depth;
        self.depth = 0;
        let result = self.parse_obj(type_name, &value, Hint::default());
        self.depth = depth;
        result.map_err(|fault| match fault {
            Fault::Fatal { error, .. } => error,
            Fault::NoVariant => Error::UnknownVariant {
                loc: value.loc(),
                message: format!("unknown variant: {}", value),
            },
        })
    }

    fn fault(&self, error: Error) -> Fault {
        Fault::Fatal {
            error,
            depth: self.depth,
        }
    }

    fn fail<T>(&self, error: Error) -> Parsed<T> {
        Err(self.fault(error))
    }

    fn unalias(&self, type_name: &str) -> Parsed<Kind<'a>> {
        let schema = self.schema;
        schema.unalias(type_name).map_err(|error| self.fault(error))
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Parsed<T>) -> Parsed<T> {
        let depth = self.depth;
        self.depth += 1;
        let result = f(self);
        self.depth = depth;
        result
    }

    fn parse_obj(&mut self, type_name: &str, x: &Piq, hint: Hint) -> Parsed<Object> {
        match self.unalias(type_name)? {
            Kind::Builtin(builtin) => self.parse_builtin(builtin, x),
            Kind::Record(def) => self.parse_record(def, x, hint.labeled),
            Kind::List(def) => self.parse_list(def, x),
            Kind::Variant(def) => {
                let (tag, value) = self.parse_options(def, x, hint)?;
                Ok(Object::Variant(Variant {
                    type_name: def.name.clone(),
                    tag,
                    value: value.map(Box::new),
                    loc: x.loc(),
                }))
            }
            Kind::Enum(def) => {
                let (tag, _) = self.parse_options(def, x, hint)?;
                Ok(Object::Enum(Enum {
                    type_name: def.name.clone(),
                    tag,
                    loc: x.loc(),
                }))
            }
            Kind::Alias(def) => {
                self.fail(Error::Schema(format!("unresolved alias '{}'", def.name)))
            }
        }
    }

    fn parse_list(&mut self, def: &'a ListDef, x: &Piq) -> Parsed<Object> {
        let Piq::Seq { items, loc } = x else {
            return self.fail(Error::structural(x.loc(), "list expected"));
        };
        let items = self.nested(|this| {
            items
                .iter()
                .map(|item| this.parse_obj(&def.type_name, item, Hint::default()))
                .collect::<Parsed<Vec<_>>>()
        })?;
        Ok(Object::List(List {
            type_name: def.name.clone(),
            items,
            loc: *loc,
        }))
    }

    fn parse_record(&mut self, def: &'a RecordDef, x: &Piq, labeled: bool) -> Parsed<Object> {
        let elements = match x {
            Piq::Seq { items, .. } => items.iter().collect::<Vec<_>>(),
            _ if labeled && def.piq_allow_unnesting => vec![x],
            _ => return self.fail(Error::structural(x.loc(), "list expected")),
        };
        self.nested(|this| this.parse_fields(def, elements, x.loc()))
    }

    fn parse_fields(
        &mut self,
        def: &'a RecordDef,
        mut rest: Vec<&Piq>,
        loc: Option<Loc>,
    ) -> Parsed<Object> {
        // required fields claim their elements before optional ones
        let (required, optional): (Vec<_>, Vec<_>) = def
            .field
            .iter()
            .partition(|spec| spec.mode == Mode::Required);
        let mut fields = Vec::with_capacity(def.field.len());
        for spec in required.into_iter().chain(optional) {
            let value = self.parse_field(spec, &mut rest, loc)?;
            fields.push((spec.name().to_owned(), value));
        }
        if let Some(x) = rest.first() {
            return self.fail(Error::UnknownField {
                loc: x.loc(),
                field: x.to_string(),
            });
        }
        Ok(Object::Record(Record {
            type_name: def.name.clone(),
            fields,
            loc,
        }))
    }

    fn parse_field(
        &mut self,
        spec: &'a FieldSpec,
        rest: &mut Vec<&Piq>,
        loc: Option<Loc>,
    ) -> Parsed<FieldValue> {
        let Some(type_name) = spec.type_name.as_deref() else {
            return self.parse_flag(spec, rest, loc);
        };
        let found = self.find_fields(spec, type_name, rest)?;
        if spec.mode == Mode::Repeated {
            let items = if found.is_empty() {
                self.find_all_parsed(spec, type_name, rest)?
            } else {
                found
                    .iter()
                    .map(|(_, x)| self.parse_obj(type_name, x, Hint::labeled()))
                    .collect::<Parsed<Vec<_>>>()?
            };
            return Ok(FieldValue::Repeated(items));
        }
        if let Some((duplicate, _)) = found.get(1) {
            return self.fail(Error::DuplicateField {
                loc: *duplicate,
                name: spec.name().to_owned(),
            });
        }
        if let Some((_, x)) = found.first() {
            let value = self.parse_obj(type_name, x, Hint::labeled())?;
            return Ok(FieldValue::Single(value));
        }
        if let Some(value) = self.find_first_parsed(spec, type_name, rest)? {
            return Ok(FieldValue::Single(value));
        }
        match spec.mode {
            Mode::Required => self.fail(Error::MissingField {
                loc,
                name: spec.name().to_owned(),
            }),
            _ => self.parse_default(type_name, spec.default.as_ref()),
        }
    }

    fn parse_flag(
        &mut self,
        spec: &'a FieldSpec,
        rest: &mut Vec<&Piq>,
        loc: Option<Loc>,
    ) -> Parsed<FieldValue> {
        let mut found = vec![];
        let mut remaining = Vec::with_capacity(rest.len());
        for x in rest.drain(..) {
            match x {
                Piq::Label { name, loc } if spec.matches(name) => found.push((*loc, true)),
                Piq::Labeled { name, loc, value } if spec.matches(name) => {
                    match value.as_literal() {
                        Some(Literal::Bool(value)) => found.push((*loc, *value)),
                        _ => {
                            return self.fail(Error::scalar(
                                *loc,
                                format!(
                                    "only true and false can be used as values for flag '{}'",
                                    name
                                ),
                            ))
                        }
                    }
                }
                _ => remaining.push(x),
            }
        }
        *rest = remaining;
        if let Some((duplicate, _)) = found.get(1) {
            return self.fail(Error::DuplicateField {
                loc: *duplicate,
                name: spec.name().to_owned(),
            });
        }
        let present = found.first().map(|(_, value)| *value).unwrap_or(false);
        Ok(FieldValue::Single(Object::Scalar(Scalar::new(
            Value::Bool(present),
            loc,
        ))))
    }

    /// Takes every element labeled with the field's name or alias out of
    /// `rest`, returning (element location, value) pairs.
    fn find_fields<'x>(
        &self,
        spec: &FieldSpec,
        type_name: &str,
        rest: &mut Vec<&'x Piq>,
    ) -> Parsed<Vec<(Option<Loc>, Cow<'x, Piq>)>> {
        let mut found = vec![];
        let mut remaining = Vec::with_capacity(rest.len());
        for x in rest.drain(..) {
            match x {
                Piq::Labeled { name, loc, value } if spec.matches(name) => {
                    found.push((*loc, Cow::Borrowed(&**value)))
                }
                Piq::Label { name, loc } if spec.matches(name) => {
                    if !matches!(self.unalias(type_name)?, Kind::Builtin(Builtin::Bool)) {
                        return self.fail(Error::structural(
                            *loc,
                            format!("value must be specified for field '{}'", name),
                        ));
                    }
                    let value = Piq::Scalar {
                        value: Literal::Bool(true),
                        loc: *loc,
                    };
                    found.push((*loc, Cow::Owned(value)));
                }
                _ => remaining.push(x),
            }
        }
        *rest = remaining;
        Ok(found)
    }

    fn find_first_parsed(
        &mut self,
        spec: &FieldSpec,
        type_name: &str,
        rest: &mut Vec<&Piq>,
    ) -> Parsed<Option<Object>> {
        let mut found = None;
        for (index, x) in rest.iter().enumerate() {
            if let Some(value) = self.try_parse_field(spec, type_name, x)? {
                found = Some((index, value));
                break;
            }
        }
        Ok(found.map(|(index, value)| {
            rest.remove(index);
            value
        }))
    }

    /// Unlike the name-matching pass, elements that fail to decode are left
    /// in place for the remaining fields.
    fn find_all_parsed(
        &mut self,
        spec: &FieldSpec,
        type_name: &str,
        rest: &mut Vec<&Piq>,
    ) -> Parsed<Vec<Object>> {
        let mut items = vec![];
        let mut remaining = Vec::with_capacity(rest.len());
        for x in rest.drain(..) {
            match self.try_parse_field(spec, type_name, x)? {
                Some(value) => items.push(value),
                None => remaining.push(x),
            }
        }
        *rest = remaining;
        Ok(items)
    }

    /// Positional match attempt. A failure counts as "no match" only when it
    /// was raised at the depth the attempt started from.
    fn try_parse_field(
        &mut self,
        spec: &FieldSpec,
        type_name: &str,
        x: &Piq,
    ) -> Parsed<Option<Object>> {
        match (spec.piq_positional, self.unalias(type_name)?) {
            (Some(false), _)
            | (None, Kind::Record(_) | Kind::List(_))
            | (_, Kind::Builtin(Builtin::Any)) => return Ok(None),
            _ => {}
        }
        let depth = self.depth;
        match self.parse_obj(type_name, x, Hint::speculative()) {
            Ok(value) => Ok(Some(value)),
            Err(Fault::Fatal { error, depth: raised }) if raised == depth => {
                trace!(field = spec.name(), %error, "positional candidate rejected");
                self.depth = depth;
                Ok(None)
            }
            Err(fault) => Err(fault),
        }
    }

    fn parse_default(
        &mut self,
        type_name: &str,
        default: Option<&serde_json::Value>,
    ) -> Parsed<FieldValue> {
        let Some(default) = default else {
            return Ok(FieldValue::Missing);
        };
        let value = default_to_piq(default).map_err(|error| self.fault(error))?;
        let depth = self.depth;
        let result = self.parse_obj(type_name, &value, Hint::default());
        self.depth = depth;
        result.map(FieldValue::Single)
    }

    fn parse_options(&mut self, def: &'a VariantDef, x: &Piq, hint: Hint) -> Parsed<Choice> {
        for spec in &def.option {
            if let Some(choice) = self.parse_option(spec, x, hint.try_mode)? {
                return Ok(choice);
            }
            if let Some(choice) = self.parse_nested_option(spec, x, hint.try_mode)? {
                return Ok(choice);
            }
        }
        if hint.nested_variant {
            trace!(variant = def.name.as_str(), "no nested option matched");
            return Err(Fault::NoVariant);
        }
        self.fail(Error::UnknownVariant {
            loc: x.loc(),
            message: format!("unknown variant: {}", x),
        })
    }

    fn parse_option(
        &mut self,
        spec: &'a OptionSpec,
        x: &Piq,
        try_mode: bool,
    ) -> Parsed<Option<Choice>> {
        match x {
            Piq::Label { name, loc } => {
                if !spec.matches(name) {
                    return Ok(None);
                }
                if spec.type_name.is_some() {
                    return self.fail(Error::structural(
                        *loc,
                        format!("value expected for option '{}'", name),
                    ));
                }
                Ok(Some((spec.name().to_owned(), None)))
            }
            Piq::Labeled { name, loc, value } => {
                if !spec.matches(name) {
                    return Ok(None);
                }
                let Some(type_name) = spec.type_name.as_deref() else {
                    return self.fail(Error::structural(
                        *loc,
                        format!("value can not be specified for option '{}'", name),
                    ));
                };
                let value = self.parse_obj(type_name, value, Hint::labeled())?;
                Ok(Some((spec.name().to_owned(), Some(value))))
            }
            _ => self.parse_option_by_type(spec, x, try_mode),
        }
    }

    fn parse_option_by_type(
        &mut self,
        spec: &'a OptionSpec,
        x: &Piq,
        try_mode: bool,
    ) -> Parsed<Option<Choice>> {
        let relaxed = self.config.relaxed_parsing;
        let Some(type_name) = spec.type_name.as_deref() else {
            // `foo` for `.foo`, never while matching speculatively
            return Ok(match x.as_literal() {
                Some(Literal::Text(word))
                    if spec.name.is_some() && spec.matches(word) && relaxed && !try_mode =>
                {
                    Some((spec.name().to_owned(), None))
                }
                _ => None,
            });
        };
        let accepted = match (self.unalias(type_name)?, x) {
            (Kind::Builtin(builtin), Piq::Scalar { value, .. }) => match (builtin, value) {
                (Builtin::Bool, Literal::Bool(_))
                | (Builtin::Int, Literal::Int(_))
                | (Builtin::Float, Literal::Float(_))
                | (Builtin::String, Literal::Text(_))
                | (Builtin::Binary, Literal::Text(_) | Literal::Bytes(_)) => true,
                (Builtin::Float, Literal::Int(_))
                | (Builtin::String, Literal::Int(_) | Literal::Float(_) | Literal::Bool(_)) => {
                    relaxed
                }
                _ => false,
            },
            (Kind::Record(_) | Kind::List(_), Piq::Seq { .. }) => true,
            _ => false,
        };
        if !accepted {
            return Ok(None);
        }
        let value = self.parse_obj(type_name, x, Hint::default())?;
        Ok(Some((spec.name().to_owned(), Some(value))))
    }

    /// Descends into an anonymous option whose type is itself a variant or
    /// an enum.
    fn parse_nested_option(
        &mut self,
        spec: &'a OptionSpec,
        x: &Piq,
        try_mode: bool,
    ) -> Parsed<Option<Choice>> {
        let (None, Some(type_name)) = (&spec.name, spec.type_name.as_deref()) else {
            return Ok(None);
        };
        if !matches!(self.unalias(type_name)?, Kind::Variant(_) | Kind::Enum(_)) {
            return Ok(None);
        }
        let hint = Hint {
            try_mode,
            nested_variant: true,
            labeled: false,
        };
        let depth = self.depth;
        match self.parse_obj(type_name, x, hint) {
            Ok(value) => Ok(Some((spec.name().to_owned(), Some(value)))),
            Err(Fault::NoVariant) => {
                self.depth = depth;
                Ok(None)
            }
            Err(fault) => Err(fault),
        }
    }

    fn parse_builtin(&self, builtin: Builtin, x: &Piq) -> Parsed<Object> {
        let loc = x.loc();
        let relaxed = self.config.relaxed_parsing;
        let value = match (builtin, x.as_literal()) {
            (Builtin::Bool, Some(Literal::Bool(v))) => Value::Bool(*v),
            (Builtin::Bool, _) => return self.fail(Error::scalar(loc, "bool constant expected")),
            (Builtin::Int, Some(Literal::Int(v))) => Value::Int(*v),
            (Builtin::Int, _) => return self.fail(Error::scalar(loc, "int constant expected")),
            (Builtin::Float, Some(Literal::Float(v))) => Value::Float(*v),
            (Builtin::Float, Some(Literal::Int(v))) if relaxed => Value::Float(*v as f64),
            (Builtin::Float, _) => {
                return self.fail(Error::scalar(loc, "float constant expected"))
            }
            (Builtin::String, Some(Literal::Text(v))) => Value::String(v.clone()),
            (Builtin::String, Some(Literal::Int(v))) if relaxed => Value::String(v.to_string()),
            (Builtin::String, Some(Literal::Float(v))) if relaxed => {
                Value::String(format!("{:?}", v))
            }
            (Builtin::String, Some(Literal::Bool(v))) if relaxed => Value::String(v.to_string()),
            (Builtin::String, _) => return self.fail(Error::scalar(loc, "string expected")),
            (Builtin::Binary, Some(Literal::Text(v))) => Value::Binary(v.as_bytes().to_vec()),
            (Builtin::Binary, Some(Literal::Bytes(v))) => Value::Binary(v.clone()),
            (Builtin::Binary, _) => return self.fail(Error::scalar(loc, "binary expected")),
            (Builtin::Any, _) => {
                return self.fail(Error::Unsupported {
                    loc,
                    message: "piqi-any values can not be read from piq".to_owned(),
                })
            }
        };
        Ok(Object::Scalar(Scalar::new(value, loc)))
    }
}

/// Converts a schema default, given as a JSON literal, into a Piq tree.
fn default_to_piq(value: &serde_json::Value) -> Result<Piq> {
    use serde_json::Value as Json;

    Ok(match value {
        Json::Bool(v) => Piq::scalar(*v),
        Json::Number(v) => match (v.as_i64(), v.as_f64()) {
            (Some(v), _) => Piq::scalar(v),
            (None, Some(v)) => Piq::scalar(v),
            _ => return Err(Error::Schema(format!("unsupported default value: {}", v))),
        },
        Json::String(v) => Piq::scalar(v.as_str()),
        Json::Array(items) => Piq::from(
            items
                .iter()
                .map(default_to_piq)
                .collect::<Result<Vec<_>>>()?,
        ),
        Json::Object(fields) => Piq::from(
            fields
                .iter()
                .map(|(name, value)| Ok(Piq::labeled(name, default_to_piq(value)?)))
                .collect::<Result<Vec<_>>>()?,
        ),
        Json::Null => return Err(Error::Schema("null is not a valid default value".to_owned())),
    })
}
