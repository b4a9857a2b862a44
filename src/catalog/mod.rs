//! Script catalog: the entry model and filesystem discovery.
//!
//! - `ScriptCatalogEntry`: one discovered script and its derived metadata
//! - `ScriptGroup`: a named, ordered collection of catalog entries
//! - `ScriptDiscoverer`: directory walk producing catalog entries

mod discovery;
mod entry;

pub use discovery::ScriptDiscoverer;
pub(crate) use discovery::is_executable;
pub use entry::{ScriptCatalogEntry, ScriptGroup, CONTENT_UNAVAILABLE, NO_DESCRIPTION};
