pub mod query;
pub mod types;

pub use query::{quick_search, search};
