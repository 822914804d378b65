//! at-core: the async operations terminal.
//!
//! Command parsing, the interpreter and its scenarios, session state, the
//! gauge ticker, and the REPL and batch front-ends. Exposed as a library for
//! integration testing.

pub mod batch;
pub mod command;
pub mod config;
pub mod display;
pub mod interpreter;
pub mod logging;
pub mod metrics;
pub mod renderer;
pub mod repl;
pub mod scenarios;
pub mod session;
pub mod style;
