// src/attempt/mod.rs

//! The timed attempt core: countdown, answer ledger, state machine and result shaping.

pub mod controller;
pub mod ledger;
pub mod presenter;
pub mod runner;
pub mod timer;

pub use controller::{AttemptController, SelectOutcome, SubmitTrigger};
pub use ledger::AnswerLedger;
pub use runner::AttemptRunner;
pub use timer::{Countdown, Tick, Timer};
