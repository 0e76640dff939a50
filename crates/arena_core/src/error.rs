//! Error types for the arena simulation.

use thiserror::Error;

/// Result type alias using [`ArenaError`].
pub type Result<T> = std::result::Result<T, ArenaError>;

/// Top-level error type for all arena simulation errors.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// Scenario definition failed validation.
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// An agent spawn position overlaps an obstacle or leaves the field.
    #[error("Invalid spawn for agent {index}: ({x}, {y})")]
    InvalidSpawn {
        /// Index of the agent in the scenario.
        index: usize,
        /// Requested x coordinate.
        x: f64,
        /// Requested y coordinate.
        y: f64,
    },

    /// Scenario asks for more agents than the arena supports.
    #[error("Too many agents: requested {requested}, maximum {max}")]
    TooManyAgents {
        /// Number of agents requested.
        requested: usize,
        /// Maximum supported agent count.
        max: usize,
    },

    /// Invalid agent reference.
    #[error("Agent not found: {0}")]
    AgentNotFound(usize),

    /// Failed to start a controller worker thread.
    #[error("Failed to spawn controller for agent {agent}: {message}")]
    ControllerSpawn {
        /// Agent the controller belongs to.
        agent: usize,
        /// OS error message.
        message: String,
    },

    /// Recording serialization or deserialization error.
    #[error("Recording error: {0}")]
    Recording(String),

    /// Recording was produced by an incompatible format version.
    #[error("Recording version mismatch: expected {expected}, found {found}")]
    RecordingVersion {
        /// Version this build reads and writes.
        expected: u32,
        /// Version found in the recording.
        found: u32,
    },

    /// Replay of a recording diverged from the recorded outcome.
    #[error("Replay diverged at tick {tick}: expected hash {expected}, got {actual}")]
    ReplayDiverged {
        /// Tick where the divergence was detected.
        tick: u64,
        /// Hash stored in the recording.
        expected: u64,
        /// Hash produced by the replay.
        actual: u64,
    },
}
