use crate::error::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location of a Piq node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Loc {
    pub line: usize,
    pub column: usize,
}

impl Loc {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl From<(usize, usize)> for Loc {
    fn from((line, column): (usize, usize)) -> Self {
        Self::new(line, column)
    }
}

/// Primitive leaf value of the Piq tree.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

macro_rules! impl_literal_from {
    ($type:ty => $variant:ident) => {
        impl From<$type> for Literal {
            fn from(v: $type) -> Self {
                Self::$variant(v as _)
            }
        }
    };
}

impl_literal_from!(bool => Bool);
impl_literal_from!(i8 => Int);
impl_literal_from!(i16 => Int);
impl_literal_from!(i32 => Int);
impl_literal_from!(i64 => Int);
impl_literal_from!(u8 => Int);
impl_literal_from!(u16 => Int);
impl_literal_from!(u32 => Int);
impl_literal_from!(f32 => Float);
impl_literal_from!(f64 => Float);

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Vec<u8>> for Literal {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:?}", v),
            Self::Text(v) => write!(f, "{:?}", v),
            Self::Bytes(v) => write!(f, "b{:?}", String::from_utf8_lossy(v)),
        }
    }
}

/// Untyped, location-tagged intermediate tree decoded against a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Piq {
    Scalar {
        value: Literal,
        loc: Option<Loc>,
    },
    Seq {
        items: Vec<Self>,
        loc: Option<Loc>,
    },
    /// `.name`
    Label { name: String, loc: Option<Loc> },
    /// `.name value`
    Labeled {
        name: String,
        loc: Option<Loc>,
        value: Box<Self>,
    },
    /// `.name* [a b]`, shorthand for `.name a .name b` inside a list.
    Splice {
        name: String,
        loc: Option<Loc>,
        items: Vec<Self>,
    },
}

impl Piq {
    pub fn scalar(value: impl Into<Literal>) -> Self {
        Self::Scalar {
            value: value.into(),
            loc: None,
        }
    }

    pub fn seq() -> Self {
        Self::Seq {
            items: vec![],
            loc: None,
        }
    }

    pub fn label(name: impl ToString) -> Self {
        Self::Label {
            name: name.to_string(),
            loc: None,
        }
    }

    pub fn labeled(name: impl ToString, value: impl Into<Self>) -> Self {
        Self::Labeled {
            name: name.to_string(),
            loc: None,
            value: Box::new(value.into()),
        }
    }

    /// Fails unless `items` is a list.
    pub fn splice(name: impl ToString, items: impl Into<Self>) -> Result<Self> {
        let name = name.to_string();
        match items.into() {
            Self::Seq { items, .. } => Ok(Self::Splice {
                name,
                loc: None,
                items,
            }),
            other => Err(Error::Construction {
                loc: other.loc(),
                message: format!(
                    "{}* must be followed by a list, instead followed by: {}",
                    name, other
                ),
            }),
        }
    }

    pub fn item(mut self, value: impl Into<Self>) -> Self {
        match &mut self {
            Self::Seq { items, .. } | Self::Splice { items, .. } => items.push(value.into()),
            _ => {}
        }
        self
    }

    pub fn at(self, line: usize, column: usize) -> Self {
        self.with_loc(Some(Loc::new(line, column)))
    }

    pub fn with_loc(mut self, new_loc: Option<Loc>) -> Self {
        match &mut self {
            Self::Scalar { loc, .. }
            | Self::Seq { loc, .. }
            | Self::Label { loc, .. }
            | Self::Labeled { loc, .. }
            | Self::Splice { loc, .. } => *loc = new_loc,
        }
        self
    }

    pub fn loc(&self) -> Option<Loc> {
        match self {
            Self::Scalar { loc, .. }
            | Self::Seq { loc, .. }
            | Self::Label { loc, .. }
            | Self::Labeled { loc, .. }
            | Self::Splice { loc, .. } => *loc,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Label { name, .. } | Self::Labeled { name, .. } | Self::Splice { name, .. } => {
                Some(name)
            }
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Self]> {
        match self {
            Self::Seq { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Replaces every splice found directly inside a list by the labeled
    /// values it denotes. A splice anywhere else is an error.
    pub fn expand_splices(self) -> Result<Self> {
        match self {
            Self::Seq { items, loc } => {
                let mut result = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Self::Splice { name, loc, items } => {
                            for value in items {
                                result.push(Self::Labeled {
                                    name: name.clone(),
                                    loc,
                                    value: Box::new(value.expand_splices()?),
                                });
                            }
                        }
                        item => result.push(item.expand_splices()?),
                    }
                }
                Ok(Self::Seq { items: result, loc })
            }
            Self::Labeled { name, loc, value } => Ok(Self::Labeled {
                name,
                loc,
                value: Box::new(value.expand_splices()?),
            }),
            Self::Splice { loc, .. } => Err(Error::Construction {
                loc,
                message: "splices are only allowed in lists".to_owned(),
            }),
            node => Ok(node),
        }
    }

    /// Turns `.a.b.c value` into `.a (.b (.c value))` and `.a.b` into
    /// `.a (.b)`. Splices must be expanded first.
    pub fn expand_labels(self) -> Result<Self> {
        match self {
            Self::Seq { items, loc } => Ok(Self::Seq {
                items: items
                    .into_iter()
                    .map(Self::expand_labels)
                    .collect::<Result<Vec<_>>>()?,
                loc,
            }),
            Self::Labeled { name, loc, value } => {
                let value = value.expand_labels()?;
                Ok(Self::label_chain(name.split('.'), loc, value))
            }
            Self::Label { name, loc } => match name.rsplit_once('.') {
                Some((prefix, last)) => {
                    let value = Self::Label {
                        name: last.to_owned(),
                        loc,
                    };
                    Ok(Self::label_chain(prefix.split('.'), loc, value))
                }
                None => Ok(Self::Label { name, loc }),
            },
            Self::Splice { loc, .. } => Err(Error::Construction {
                loc,
                message: "splices must be expanded before label chains".to_owned(),
            }),
            node @ Self::Scalar { .. } => Ok(node),
        }
    }

    /// Both transforms, in the order the decoder expects them.
    pub fn normalize(self) -> Result<Self> {
        self.expand_splices()?.expand_labels()
    }

    fn label_chain<'a>(
        parts: impl DoubleEndedIterator<Item = &'a str>,
        loc: Option<Loc>,
        value: Self,
    ) -> Self {
        parts.rev().fold(value, |value, name| Self::Labeled {
            name: name.to_owned(),
            loc,
            value: Box::new(value),
        })
    }
}

impl From<Literal> for Piq {
    fn from(value: Literal) -> Self {
        Self::Scalar { value, loc: None }
    }
}

macro_rules! impl_piq_from_scalar {
    ($( $type:ty ),+) => {
        $(
            impl From<$type> for Piq {
                fn from(v: $type) -> Self {
                    Self::scalar(v)
                }
            }
        )+
    };
}

impl_piq_from_scalar!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, String, &str);

impl From<Vec<Piq>> for Piq {
    fn from(items: Vec<Self>) -> Self {
        Self::Seq { items, loc: None }
    }
}

impl<const N: usize> From<[Piq; N]> for Piq {
    fn from(items: [Self; N]) -> Self {
        Self::Seq {
            items: items.to_vec(),
            loc: None,
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Piq]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        fmt::Display::fmt(item, f)?;
    }
    write!(f, "]")
}

impl fmt::Display for Piq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { value, .. } => value.fmt(f),
            Self::Seq { items, .. } => write_items(f, items),
            Self::Label { name, .. } => write!(f, ".{}", name),
            Self::Labeled { name, value, .. } => match &**value {
                Self::Label { .. } | Self::Labeled { .. } => write!(f, ".{} ({})", name, value),
                _ => write!(f, ".{} {}", name, value),
            },
            Self::Splice { name, items, .. } => {
                write!(f, ".{}* ", name)?;
                write_items(f, items)
            }
        }
    }
}
