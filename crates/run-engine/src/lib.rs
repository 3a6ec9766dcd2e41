//! Run lifecycle orchestrator: the Run State Machine (§4.1), Round
//! Controller (§4.3), Trade Executor (§4.4), and Run Scheduler (§4.2).
//!
//! One `RunActor` task owns one run end-to-end; the `Scheduler` decides
//! when a new one may start and keeps every non-terminal run backed by a
//! live actor.

pub mod actor;
pub mod commands;
pub mod deps;
pub mod round_controller;
pub mod scheduler;
pub mod state_machine;
#[cfg(test)]
mod test_support;
pub mod trade_executor;

pub use actor::{RunActor, RunHandle};
pub use commands::RunCommand;
pub use deps::RunDeps;
pub use scheduler::Scheduler;
