pub mod base64;
pub mod de;
pub mod error;
pub mod schema;
pub mod ser;
pub mod value;

#[cfg(test)]
mod tests;

pub use crate::{
    de::json::{from_json, from_json_str},
    de::piq::{from_piq, from_piq_as, ParseConfig, Parser},
    de::text::{from_str, from_str_as, piq_from_str},
    error::{Error, Result},
    schema::{Schema, SchemaIndex},
    ser::json::{to_json, to_json_as, to_json_string, JsonConfig},
    value::{object::Object, piq::Piq},
};
