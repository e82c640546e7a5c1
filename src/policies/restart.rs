use std::time::Duration;

/// Whether a background subsystem task is started again after it ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RestartPolicy {
    /// Run once.
    Never,
    /// Restart after errors only.
    #[default]
    OnFailure,
    /// Restart after errors and after successful completion, waiting
    /// `interval` (if any) between successful runs.
    Always { interval: Option<Duration> },
}
