//! Error types for the corridor pipeline.
//!
//! Every component returns its own enum; `PlanError` aggregates them for the
//! replanning cycle and maps each failure onto the three operator-facing kinds.

use thiserror::Error;

/// Operator-facing failure class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal to the current cycle; surfaced to the operator.
    PreconditionViolation,
    /// Recovered locally; the committed trajectory keeps flying.
    SolverFailure,
    /// Input the pipeline accommodates only partially (empty corridor, zero-length path).
    DegenerateInput,
}

/// Inflation solver failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InflateError {
    #[error("bounding box has no interior")]
    EmptyBox,
    #[error("obstacle at distance {distance:.3e} blocks the seed")]
    SeedBlocked { distance: f64 },
    #[error("degenerate inflation input: {0}")]
    Degenerate(String),
}

/// Corridor construction failure.
#[derive(Debug, Error)]
pub enum CorridorError {
    #[error("precondition violated: {0}")]
    Precondition(String),
    #[error("inflation failed at step {step}: {source}")]
    Inflation {
        step: usize,
        #[source]
        source: InflateError,
    },
}

impl CorridorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Precondition(_) => ErrorKind::PreconditionViolation,
            Self::Inflation { .. } => ErrorKind::SolverFailure,
        }
    }
}

/// Trajectory optimizer failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("optimizer setup failed: {0}")]
    Setup(String),
    #[error("optimizer returned non-finite cost {0}")]
    NonFiniteCost(f64),
}

/// Continuation (boundary handoff + splice) failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContinuationError {
    #[error("solver failure: {0}")]
    Solver(#[from] OptimizeError),
    #[error("corridor is empty")]
    EmptyCorridor,
    #[error("invalid continuation config: {0}")]
    Config(String),
}

impl ContinuationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Solver(_) => ErrorKind::SolverFailure,
            Self::EmptyCorridor => ErrorKind::DegenerateInput,
            Self::Config(_) => ErrorKind::PreconditionViolation,
        }
    }
}

/// Replanning cycle failure.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("inputs not ready: {0}")]
    NotReady(&'static str),
    #[error("path source found no path")]
    NoPath,
    #[error("precondition violated: {0}")]
    Precondition(String),
    #[error(transparent)]
    Corridor(#[from] CorridorError),
    #[error(transparent)]
    Continuation(#[from] ContinuationError),
}

impl PlanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotReady(_) | Self::Precondition(_) => ErrorKind::PreconditionViolation,
            Self::NoPath => ErrorKind::SolverFailure,
            Self::Corridor(e) => e.kind(),
            Self::Continuation(e) => e.kind(),
        }
    }
}

pub type Result<T, E = PlanError> = std::result::Result<T, E>;
