pub mod validate;

pub use validate::{check_schema, validate};
