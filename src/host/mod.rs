pub mod bridge;
pub mod dispatch;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::{Payload, Target};
use crate::navigation::ChannelToken;
use crate::permissions::{Permission, PermissionDecision, PermissionState};

pub use bridge::{CallbackBridge, HostEvent};
pub use dispatch::{DispatchRecord, LogDispatcher, RecordingDispatcher};

// ---------------------------------------------------------------------------
// Host-provided services
// ---------------------------------------------------------------------------

/// Fires capability requests at the host.
///
/// Best effort: a target nobody can handle is the host's concern and is only
/// logged, never surfaced to the invoking flow.
pub trait HostDispatcher: Send + Sync {
    fn dispatch(&self, target: &Target, parameters: &Payload);
}

/// The host's permission check and prompt.
#[async_trait]
pub trait PermissionHost: Send + Sync {
    /// Current host-side answer. Only `Granted`, `Denied` and `Unknown` are
    /// meaningful; anything else is treated as `Unknown`.
    fn check(&self, permission: &Permission) -> PermissionState;

    /// Show the host's prompt and wait for the user.
    ///
    /// Hosts that cannot present a prompt (permanently denied, "don't ask
    /// again") resolve to `Denied`.
    async fn request(&self, permission: &Permission) -> PermissionDecision;
}

/// What a secondary screen handed back when it closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "payload", rename_all = "snake_case")]
pub enum ScreenResult {
    Returned(Payload),
    Cancelled,
}

/// Presents the secondary screen for a result-returning request.
#[async_trait]
pub trait ScreenHost: Send + Sync {
    async fn present(
        &self,
        token: ChannelToken,
        target: &Target,
        outbound: &Payload,
    ) -> ScreenResult;
}
