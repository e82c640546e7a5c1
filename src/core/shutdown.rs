//! # OS termination signals.
//!
//! While the application runs, a signal requests a graceful shutdown. Once the
//! supervisor reached `Terminated`, a signal is the external termination that
//! releases its final wait.
//!
//! Unix listens for `SIGINT`, `SIGTERM` and `SIGQUIT`; other targets for Ctrl-C.

/// Completes when the process receives a termination signal.
///
/// Each call registers fresh listeners, so it can be awaited again after it fired.
#[cfg(unix)]
pub async fn wait_for_termination_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
pub async fn wait_for_termination_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Resolves on a signal when `enabled`; otherwise never.
///
/// Registration failures also never resolve: the process then only stops
/// through the supervisor handle.
pub(crate) async fn signal_or_pending(enabled: bool) {
    if enabled && wait_for_termination_signal().await.is_ok() {
        return;
    }
    std::future::pending::<()>().await
}
