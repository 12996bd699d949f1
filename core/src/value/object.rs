use crate::value::piq::{Loc, Piq};

/// Built-in leaf value.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub value: Value,
    pub loc: Option<Loc>,
}

impl Scalar {
    pub fn new(value: Value, loc: Option<Loc>) -> Self {
        Self { value, loc }
    }
}

/// Value of one record field.
///
/// Optional fields without a value are `Missing`, repeated fields are always
/// `Repeated` (possibly empty) and everything else is `Single`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Missing,
    Single(Object),
    Repeated(Vec<Object>),
}

impl FieldValue {
    pub fn as_single(&self) -> Option<&Object> {
        match self {
            Self::Single(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_repeated(&self) -> Option<&[Object]> {
        match self {
            Self::Repeated(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl From<Option<Object>> for FieldValue {
    fn from(value: Option<Object>) -> Self {
        value.map(Self::Single).unwrap_or(Self::Missing)
    }
}

impl From<Object> for FieldValue {
    fn from(value: Object) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<Object>> for FieldValue {
    fn from(value: Vec<Object>) -> Self {
        Self::Repeated(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: String,
    /// (field name, value), in matching order.
    pub fields: Vec<(String, FieldValue)>,
    pub loc: Option<Loc>,
}

impl Record {
    pub fn new(type_name: impl ToString) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: vec![],
            loc: None,
        }
    }

    pub fn field(mut self, name: impl ToString, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn single(&self, name: &str) -> Option<&Object> {
        self.get(name).and_then(FieldValue::as_single)
    }

    pub fn repeated(&self, name: &str) -> &[Object] {
        self.get(name)
            .and_then(FieldValue::as_repeated)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub type_name: String,
    pub items: Vec<Object>,
    pub loc: Option<Loc>,
}

impl List {
    pub fn new(type_name: impl ToString) -> Self {
        Self {
            type_name: type_name.to_string(),
            items: vec![],
            loc: None,
        }
    }

    pub fn item(mut self, value: impl Into<Object>) -> Self {
        self.items.push(value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub type_name: String,
    pub tag: String,
    /// `None` iff the selected option carries no payload.
    pub value: Option<Box<Object>>,
    pub loc: Option<Loc>,
}

impl Variant {
    pub fn new(type_name: impl ToString, tag: impl ToString, value: Option<Object>) -> Self {
        Self {
            type_name: type_name.to_string(),
            tag: tag.to_string(),
            value: value.map(Box::new),
            loc: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub type_name: String,
    pub tag: String,
    pub loc: Option<Loc>,
}

impl Enum {
    pub fn new(type_name: impl ToString, tag: impl ToString) -> Self {
        Self {
            type_name: type_name.to_string(),
            tag: tag.to_string(),
            loc: None,
        }
    }
}

/// Schema-erased payload.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Any {
    pub typename: Option<String>,
    pub piq: Option<Piq>,
    pub json: Option<serde_json::Value>,
}

/// Typed object produced by the decoders and consumed by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Record(Record),
    List(List),
    Variant(Variant),
    Enum(Enum),
    Any(Any),
    Scalar(Scalar),
}

macro_rules! impl_as_ref_object {
    ($method:ident, $type:ty, $variant:ident) => {
        pub fn $method(&self) -> Option<&$type> {
            match self {
                Self::$variant(v) => Some(v),
                _ => None,
            }
        }
    };
}

macro_rules! impl_as_value {
    ($method:ident, $type:ty, $variant:ident) => {
        pub fn $method(&self) -> Option<$type> {
            match self {
                Self::Scalar(Scalar {
                    value: Value::$variant(v),
                    ..
                }) => Some(v.clone()),
                _ => None,
            }
        }
    };
}

impl Object {
    pub fn scalar(value: Value) -> Self {
        Self::Scalar(Scalar::new(value, None))
    }

    impl_as_ref_object! {as_record, Record, Record}
    impl_as_ref_object! {as_list, List, List}
    impl_as_ref_object! {as_variant, Variant, Variant}
    impl_as_ref_object! {as_enum, Enum, Enum}
    impl_as_ref_object! {as_any, Any, Any}
    impl_as_ref_object! {as_scalar, Scalar, Scalar}
    impl_as_value! {as_bool, bool, Bool}
    impl_as_value! {as_int, i64, Int}
    impl_as_value! {as_float, f64, Float}
    impl_as_value! {as_string, String, String}
    impl_as_value! {as_binary, Vec<u8>, Binary}

    /// Schema type name of a composite object.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Record(v) => Some(&v.type_name),
            Self::List(v) => Some(&v.type_name),
            Self::Variant(v) => Some(&v.type_name),
            Self::Enum(v) => Some(&v.type_name),
            Self::Any(v) => v.typename.as_deref(),
            Self::Scalar(_) => None,
        }
    }

    pub fn loc(&self) -> Option<Loc> {
        match self {
            Self::Record(v) => v.loc,
            Self::List(v) => v.loc,
            Self::Variant(v) => v.loc,
            Self::Enum(v) => v.loc,
            Self::Any(v) => v.piq.as_ref().and_then(Piq::loc),
            Self::Scalar(v) => v.loc,
        }
    }

    /// Drops source locations recursively, so that objects decoded from
    /// different formats can be compared.
    pub fn without_locs(self) -> Self {
        match self {
            Self::Record(mut v) => {
                v.loc = None;
                v.fields = v
                    .fields
                    .into_iter()
                    .map(|(name, value)| {
                        let value = match value {
                            FieldValue::Single(v) => FieldValue::Single(v.without_locs()),
                            FieldValue::Repeated(v) => FieldValue::Repeated(
                                v.into_iter().map(Self::without_locs).collect(),
                            ),
                            FieldValue::Missing => FieldValue::Missing,
                        };
                        (name, value)
                    })
                    .collect();
                Self::Record(v)
            }
            Self::List(mut v) => {
                v.loc = None;
                v.items = v.items.into_iter().map(Self::without_locs).collect();
                Self::List(v)
            }
            Self::Variant(mut v) => {
                v.loc = None;
                v.value = v.value.map(|value| Box::new(value.without_locs()));
                Self::Variant(v)
            }
            Self::Enum(mut v) => {
                v.loc = None;
                Self::Enum(v)
            }
            Self::Scalar(mut v) => {
                v.loc = None;
                Self::Scalar(v)
            }
            any @ Self::Any(_) => any,
        }
    }
}

impl From<Record> for Object {
    fn from(v: Record) -> Self {
        Self::Record(v)
    }
}

impl From<List> for Object {
    fn from(v: List) -> Self {
        Self::List(v)
    }
}

impl From<Variant> for Object {
    fn from(v: Variant) -> Self {
        Self::Variant(v)
    }
}

impl From<Enum> for Object {
    fn from(v: Enum) -> Self {
        Self::Enum(v)
    }
}

impl From<Any> for Object {
    fn from(v: Any) -> Self {
        Self::Any(v)
    }
}

macro_rules! impl_object_from_value {
    ($type:ty => $variant:ident) => {
        impl From<$type> for Object {
            fn from(v: $type) -> Self {
                Self::scalar(Value::$variant(v.into()))
            }
        }
    };
}

impl_object_from_value!(bool => Bool);
impl_object_from_value!(i32 => Int);
impl_object_from_value!(i64 => Int);
impl_object_from_value!(f64 => Float);
impl_object_from_value!(String => String);
impl_object_from_value!(&str => String);
impl_object_from_value!(Vec<u8> => Binary);
