pub mod cache;
pub mod eval;
pub mod parse;
pub mod path;

pub use cache::TemplateCache;
pub use eval::evaluate;
pub use parse::parse;
pub use path::{resolve, IterationFrame};
