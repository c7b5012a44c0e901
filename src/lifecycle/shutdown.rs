//! Process-wide stop signal for the sidecar itself.

use tokio_util::sync::CancellationToken;

/// Cancellation root shared by the server and every suspended request.
///
/// Triggering it releases in-flight drain sequences and waiters and
/// stops the HTTP server from accepting new requests.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new, untriggered stop signal.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token for one request; cancelled when the sidecar stops.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger the stop signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once the stop signal has been triggered.
    pub async fn triggered(&self) {
        self.token.cancelled().await;
    }
}
