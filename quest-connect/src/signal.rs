//! OS interrupt handling for CLI commands.
//!
//! [`Interrupt`] turns the first SIGTERM/SIGINT (Ctrl+C on Windows) into a
//! cancelled [`CancellationToken`]. Commands race their requests against it,
//! so an interrupted request is abandoned and reported like any other
//! classified failure instead of killing the process mid-output.

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Listens for an OS interrupt and cancels a shared token.
#[derive(Debug)]
pub struct Interrupt {
    tracker: TaskTracker,
    token: CancellationToken,
}

impl Interrupt {
    /// Registers the signal handlers and spawns the listener task.
    ///
    /// # Errors
    ///
    /// Returns an [`std::io::Error`] if signal registration fails.
    #[allow(clippy::unnecessary_wraps)]
    pub fn listen() -> Result<Self, std::io::Error> {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let tracker = TaskTracker::new();

        #[cfg(unix)]
        {
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;
            tracker.spawn(async move {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("SIGTERM received, abandoning request"),
                    _ = sigint.recv() => tracing::info!("SIGINT received, abandoning request"),
                    () = trigger.cancelled() => return,
                }
                trigger.cancel();
            });
        }

        #[cfg(windows)]
        {
            tracker.spawn(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Ctrl+C received, abandoning request");
                        trigger.cancel();
                    }
                    () = trigger.cancelled() => {}
                }
            });
        }

        tracker.close();
        Ok(Self { tracker, token })
    }

    /// Token cancelled on interrupt.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Stops listening and waits for the listener task to finish.
    pub async fn release(self) {
        self.token.cancel();
        self.tracker.wait().await;
    }
}
