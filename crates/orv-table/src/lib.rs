//! # orv-table — Tabular Casting
//!
//! Reads tabular sources and casts every row against an explicit
//! [`SchemaDescriptor`](orv_core::SchemaDescriptor).
//!
//! ## Pipeline
//!
//! 1. [`TableSource::open`] turns inline rows, CSV bytes, a local file, a
//!    remote URL, or several multipart parts into a stream of raw rows.
//! 2. [`Table::load`] pairs that stream with a schema and compiles the
//!    per-field casters (patterns, enum values, bounds).
//! 3. [`Table::iter`] yields one `Result<CastRow, TableError>` per data row.
//!    In [`CastMode::Tolerant`] a row-level problem is yielded as
//!    `Err(TableError::Cast(..))` and iteration continues; source, CSV and
//!    I/O failures always end the stream.
//!
//! Header checks, unique/primary-key checks and the soft foreign-key check
//! against a [`Relations`] lookup happen during iteration.

pub mod cast;
pub mod error;
pub mod relations;
pub mod source;
pub mod table;

pub use cast::{Caster, Cell};
pub use error::{TableError, TableSchemaError};
pub use relations::Relations;
pub use source::{http_client, TableSource};
pub use table::{CastMode, CastRow, Table, TableIter, TableOptions};
