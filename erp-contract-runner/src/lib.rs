#![warn(missing_docs)]
//! Replay contract-test cases against a running School ERP server.
//!
//! Each case goes through `pending → executed → {passed, failed}`:
//! - [PendingCase::execute] sends the request through a [ReplayClient],
//! - [ExecutedCase::assess] checks the status and, when asked, the JSON body against the
//!   OpenAPI response schema.
//!
//! The [ContractTestRunner] replays a whole case list sequentially and gathers a [RunReport].

mod replay_client;
mod report;
mod runner;
mod token;

pub use replay_client::*;
pub use report::*;
pub use runner::*;
pub use token::*;
