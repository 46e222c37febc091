//! Reader, writer, and object model for compiled material databases: a
//! chunk-oriented binary container with a self-describing schema,
//! inheritance-based component composition, and a JSON exchange format
//! suitable for hand-editing and recompiling.
//!
//! [`reader::Reader`] turns a byte stream into a flat list of top-level
//! component values; [`manager::Manager`] indexes those against a file's
//! object/edge tables and implements parent-chain composition and
//! reference rewriting; [`writer::Writer`] re-emits a database, copying
//! unchanged components byte-for-byte and only re-encoding what changed;
//! [`glue`] ties the three together into the material export/recompile
//! entry points.

pub mod config;
pub mod error;
pub mod glue;
pub mod manager;
pub mod model;
pub mod primitives;
pub mod reader;
pub mod schema;
pub mod value;
pub mod writer;

pub use error::{CdbError, Result};
pub use manager::Manager;
pub use reader::Reader;
pub use writer::Writer;
