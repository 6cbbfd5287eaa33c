//! Playcheck – headless script protocol and execution engine for canvas games
//!
//! This crate verifies that generated game builds render and respond to input
//! correctly without a human operator. It implements:
//! - A strict grammar and validator for test scripts (ordered, bounded steps)
//! - Cumulative resource accounting at parse time (frame, input, and snapshot
//!   budgets) so every accepted script is boundedly cheap before any host
//!   interaction begins
//! - A sequential async interpreter that replays steps against an abstract
//!   [`Driver`] under a hard wall-clock budget
//! - Coordinate-space conversion from normalized or pixel input positions to
//!   absolute client pixels
//!
//! The engine is a pure function pair ([`parse`] and [`execute`]) plus the
//! [`Driver`] capability boundary. Browser plumbing, image persistence, and
//! argument parsing live outside the core as thin adapters.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Error taxonomy shared by the parser, executor, and drivers.
pub mod error;
/// Executor, driver contract, and the simulated driver.
pub mod exec;
/// Script grammar: data model, limits, and the validating parser.
pub mod script;
/// Viewport record and coordinate-space conversion.
pub mod viewport;

pub use error::{BudgetError, DriverError, EngineError, ExecError, ValidationError};
pub use exec::driver::{Driver, PointerEvent, Snapshot};
pub use exec::sim::{DriverCall, SimDriver, SimOp};
pub use exec::{Capture, Clock, ExecOptions, ExecutionResult, ManualClock, WallClock, execute};
pub use script::parser::{ScriptParser, parse};
pub use script::{
    CoordSpace, EmitMode, InputStep, Limits, MAX_INPUT_EVENTS, MAX_RUN_SECONDS, MAX_STEPS,
    PointerAction, Protocol, Step,
};
pub use viewport::{Viewport, to_client_position};

/// Current version of the playcheck engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the script wire protocol accepted by the parser
pub const PROTOCOL_VERSION: &str = "1.0.0";
