pub mod json;
pub mod piq;
pub mod text;
