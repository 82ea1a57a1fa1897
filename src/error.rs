use thiserror::Error;

/// Errors classified by the simulation core.
///
/// Configuration problems are reported synchronously before a run starts;
/// numeric problems are caught at the epoch boundary and terminate the run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("numeric instability at t = {time}: {reason}")]
    Numeric { time: f64, reason: String },

    #[error("simulation context terminated unexpectedly")]
    ContextLost,
}
