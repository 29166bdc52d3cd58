//! The entities used by, and exchanged between, the contract tooling components.

mod activity_id;
mod case_file;
mod http_method;
mod operation_key;
mod test_case;
mod tracker_row;

pub use activity_id::*;
pub use case_file::*;
pub use http_method::*;
pub use operation_key::*;
pub use test_case::*;
pub use tracker_row::*;
