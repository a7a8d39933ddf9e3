//! Command Module
//!
//! Turns argument vectors into child processes and their output into
//! tables. Argument construction, execution and parsing are kept apart so
//! each can be exercised on its own.

pub mod args;
pub mod executor;
pub mod invocation;
pub mod table;

pub use executor::Executor;
pub use invocation::{CommandOutput, Input, Invocation, Output, Tool};
