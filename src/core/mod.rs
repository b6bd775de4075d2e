//! Core monitoring logic: the activity accumulator and the warning-level
//! state machines it drives.

pub mod accumulator;
pub mod inactivity;
pub mod warning;

pub use accumulator::{ActivityAccumulator, SampleOutcome};
pub use inactivity::{ActivityState, InactivityMonitor};
pub use warning::{AckOutcome, WarningEffect, WarningLevel, WarningMachine};
