//! # notebase-rollup
//!
//! Rollup columns for notebase tables.
//!
//! A rollup follows a relation column of the current row into the related
//! table, reads one property of every linked row and aggregates the values:
//! - [`compute_rollup`] - Compute a rollup for one row
//! - [`RelatedTableFetcher`] - How related tables are loaded
//! - [`aggregate`] - The aggregation operators themselves
//!
//! Computation never fails. Anything missing along the way shows as the
//! "Configure rollup" sentinel ([`RollupOutcome::Unconfigured`]).

pub mod aggregate;
pub mod error;
pub mod fetcher;
pub mod rollup;

pub use aggregate::aggregate;
pub use error::{FetchError, UnconfiguredReason};
pub use fetcher::{from_fn, FromFn, RelatedTableFetcher};
pub use rollup::{check_rollup, compute_rollup, compute_rollup_column, RollupOutcome};
