//! One-shot mutation coordinators.
//!
//! Each coordinator performs a single remote call and layers its result
//! onto the `AppStore`, fenced by a `CallToken` so only the latest call
//! commits.

mod execute_request;
mod generate_match;

pub use execute_request::{ExecuteRequest, ExecuteRequestInput};
pub use generate_match::{GenerateMatch, GenerateMatchInput};
