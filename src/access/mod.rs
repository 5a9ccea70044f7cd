//! Access table and matrix
//!
//! Pure reshaping of fetched projects and user lists:
//!
//! ```text
//! projects + users per project → AccessTable (one UserGrant per pair) → AccessMatrix
//! ```

pub mod matrix;
pub mod table;

pub use matrix::{AccessMatrix, MatrixCell, MatrixColumn, UNKNOWN_GLYPH};
pub use table::{AccessTable, CSV_COLUMNS, CSV_FILE_NAME, Role, UserGrant, build_table};
