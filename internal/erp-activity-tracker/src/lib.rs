#![warn(missing_docs)]
//! Activity tracker tooling:
//! - [TrackerLocator] finds the tracker workbook among its candidate locations,
//! - [ActivityTracker] reads its rows,
//! - [check_consistency] compares the tracker activity ids with the OpenAPI ones.

mod consistency;
mod locator;
mod tracker;

pub use consistency::*;
pub use locator::*;
pub use tracker::*;

/// Header of the column holding the activity ids
pub const UNIQUE_CODE_COLUMN: &str = "Unique Code";
