//! Test utilities
//!
//! They contain:
//! * A [TempDir] builder to get a clean temporary directory per test.
//! * A [TestLogger] to build loggers writing to the test output or to a file.

mod temp_dir;
mod test_logger;

pub use temp_dir::*;
pub use test_logger::*;
