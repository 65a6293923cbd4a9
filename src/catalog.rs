//! Album catalog: the read-only table of albums the player can open.
//!
//! Albums are loaded once from a TOML file and then looked up by slug.

mod error;
mod load;
mod model;
mod probe;

pub use error::CatalogError;
pub use model::*;
pub use probe::probe_duration;
