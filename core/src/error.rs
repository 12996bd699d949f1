use crate::value::piq::Loc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

fn at(loc: &Option<Loc>) -> String {
    match loc {
        Some(loc) => format!("{}: ", loc),
        None => String::new(),
    }
}

/// Errors raised while reading, decoding or encoding data.
///
/// Every error coming out of the Piq path carries the location of the
/// offending node when the node has one. The JSON path never has locations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Wrong tree shape for the expected kind (list vs scalar vs map).
    #[error("{}{message}", at(.loc))]
    StructuralMismatch { loc: Option<Loc>, message: String },
    #[error("{}missing field '{name}'", at(.loc))]
    MissingField { loc: Option<Loc>, name: String },
    #[error("{}duplicate field '{name}'", at(.loc))]
    DuplicateField { loc: Option<Loc>, name: String },
    /// Element left over after every field of a record was matched.
    #[error("{}unknown field: {field}", at(.loc))]
    UnknownField { loc: Option<Loc>, field: String },
    #[error("{}{message}", at(.loc))]
    UnknownVariant { loc: Option<Loc>, message: String },
    #[error("{}{message}", at(.loc))]
    ScalarTypeMismatch { loc: Option<Loc>, message: String },
    /// Malformed tree built by a front end, e.g. a splice of a non-list.
    #[error("{}{message}", at(.loc))]
    Construction { loc: Option<Loc>, message: String },
    #[error("{}{message}", at(.loc))]
    Unsupported { loc: Option<Loc>, message: String },
    #[error("{}{message}", at(.loc))]
    Syntax { loc: Option<Loc>, message: String },
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("invalid schema: {0}")]
    Schema(String),
}

impl Error {
    pub fn structural(loc: Option<Loc>, message: impl ToString) -> Self {
        Self::StructuralMismatch {
            loc,
            message: message.to_string(),
        }
    }

    pub fn scalar(loc: Option<Loc>, message: impl ToString) -> Self {
        Self::ScalarTypeMismatch {
            loc,
            message: message.to_string(),
        }
    }

    pub fn loc(&self) -> Option<Loc> {
        match self {
            Self::StructuralMismatch { loc, .. }
            | Self::MissingField { loc, .. }
            | Self::DuplicateField { loc, .. }
            | Self::UnknownField { loc, .. }
            | Self::UnknownVariant { loc, .. }
            | Self::ScalarTypeMismatch { loc, .. }
            | Self::Construction { loc, .. }
            | Self::Unsupported { loc, .. }
            | Self::Syntax { loc, .. } => *loc,
            Self::UnknownType(_) | Self::Schema(_) => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Schema(error.to_string())
    }
}
