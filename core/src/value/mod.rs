pub mod object;
pub mod piq;
