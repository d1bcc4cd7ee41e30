//! Cell-related types
//!
//! This module contains [`CellValue`], the raw value stored for one
//! (row, column) pair. Conversions to numbers and display text live in
//! [`crate::coerce`].

mod value;

pub use value::CellValue;
