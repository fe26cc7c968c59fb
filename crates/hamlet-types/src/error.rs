use thiserror::Error;

/// Errors surfaced by behavior subsystem lifecycle hooks.
///
/// The scheduler catches every variant per subsystem per agent; a failing
/// hook never interrupts sibling subsystems or the driving loop.
#[derive(Debug, Error)]
pub enum SubsystemError {
    #[error("attach failed: {0}")]
    Attach(String),

    #[error("update failed: {0}")]
    Update(String),

    #[error("detach failed: {0}")]
    Detach(String),

    #[error("maintenance failed: {0}")]
    Maintenance(String),

    #[error("shutdown failed: {0}")]
    Shutdown(String),

    #[error("analytics failed: {0}")]
    Analytics(String),
}

/// Errors from a per-actor messaging surface.
///
/// Delivery logs and swallows these; they never propagate.
#[derive(Debug, Error)]
pub enum MessengerError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Errors from interaction-history repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
