//! Data loading for valstream.
//!
//! Reads catalogs, value streams, inventories, price feeds and run files from
//! RON, JSON or TOML, resolves name references and produces core types ready
//! to run. Also writes the run log and JSON output files.

pub mod loader;
pub mod runlog;
pub mod schema;

pub use loader::{DataLoadError, RunSetup, load_catalog, load_run};
pub use runlog::{RunLogError, append_record, write_json};
