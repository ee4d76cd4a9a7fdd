pub mod error;
pub mod types;
pub mod value;

pub use error::ReportError;
pub use types::*;
pub use value::*;
