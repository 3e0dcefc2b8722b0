//! Rollback statement builders.
//!
//! Every builder is a pure function of the captured state: row images for
//! DML, the pre-statement schema snapshot for DDL.

pub mod ddl;
pub mod diff;
pub mod dml;
pub mod predicate;
pub mod render;

pub use ddl::DdlContext;
pub use diff::{column_diffs, update_for_updated, ColumnDiff};
pub use dml::{delete_for_inserted, insert_for_deleted};
