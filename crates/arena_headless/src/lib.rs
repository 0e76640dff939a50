//! Headless arena runner for scripted simulations, recordings and CI
//! verification.
//!
//! The binary front-end runs arena scenarios without a renderer:
//!
//! - **Paced runs** stream per-tick frames as JSON lines on stdout
//! - **Fast-forward simulation** steps a world as fast as it goes
//! - **Capture/replay** records live runs and verifies replays
//!   reproduce them bit for bit, optionally many times in parallel
//!
//! Scenarios come from built-in presets or RON files ([`scenario`]),
//! agents are driven by the demo policies in [`strategies`], and all
//! stdout output is the line protocol defined in [`protocol`]. Logs
//! always go to stderr.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod protocol;
pub mod runner;
pub mod scenario;
pub mod strategies;

pub use protocol::Report;
pub use runner::{record, run_paced, simulate, verify_recording, RunOutcome};
pub use scenario::{build, preset, ScenarioError, ScenarioFile, PRESET_NAMES};
pub use strategies::policy_named;
