use thiserror::Error;

/// Typed failures a render job can surface. Cancellation is not an error —
/// it is a terminal [`JobEvent`](super::JobEvent) of its own.
#[derive(Debug, Error)]
pub enum JobError {
    /// Audio file unreadable or unsupported. Raised before any container is
    /// opened.
    #[error("audio input error: {0}")]
    Input(String),

    /// Output container or video stream could not be created or written.
    #[error("video output error: {0}")]
    Output(String),

    /// Audio mux pass failed. The video-only artifact is left on disk for
    /// the caller to decide about.
    #[error("audio mux error: {0}")]
    Mux(String),

    /// Invalid settings, caught at validation time before the job starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A render job is already running; only one runs at a time.
    #[error("a render job is already running")]
    Busy,
}
