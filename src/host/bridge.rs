use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use super::{PermissionHost, ScreenHost, ScreenResult};
use crate::catalog::{Payload, Target};
use crate::navigation::ChannelToken;
use crate::permissions::{Permission, PermissionDecision, PermissionState};

/// Event emitted to the presentation layer when the core needs the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    PermissionPrompt {
        request_id: String,
        permission: Permission,
        description: String,
    },
    ScreenPresented {
        token: ChannelToken,
        target: Target,
        outbound: Payload,
    },
}

/// Bridge between the dispatch core and a presentation layer.
///
/// A suspended flow registers a oneshot channel, emits a `HostEvent`, and
/// awaits the reply (with a timeout). The presentation layer answers through
/// `respond_permission` / `finish_screen`, which look up the pending channel
/// and deliver the decision.
pub struct CallbackBridge {
    pending_permissions: Mutex<HashMap<String, oneshot::Sender<PermissionDecision>>>,
    pending_screens: Mutex<HashMap<ChannelToken, oneshot::Sender<ScreenResult>>>,
    /// Host-side record of decisions, answered by `check`.
    decisions: Mutex<HashMap<Permission, PermissionState>>,
    events: mpsc::UnboundedSender<HostEvent>,
    permission_timeout: Duration,
    screen_timeout: Duration,
}

impl CallbackBridge {
    pub fn new(
        permission_timeout: Duration,
        screen_timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let bridge = Self {
            pending_permissions: Mutex::new(HashMap::new()),
            pending_screens: Mutex::new(HashMap::new()),
            decisions: Mutex::new(HashMap::new()),
            events,
            permission_timeout,
            screen_timeout,
        };
        (bridge, rx)
    }

    /// Called by the presentation layer when the user answers a prompt.
    ///
    /// Returns `true` if the request was found and the decision was delivered.
    pub fn respond_permission(&self, request_id: &str, decision: PermissionDecision) -> bool {
        let tx = {
            let mut pending = self
                .pending_permissions
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            pending.remove(request_id)
        };

        match tx {
            Some(sender) => sender.send(decision).is_ok(),
            None => false,
        }
    }

    /// Called by the presentation layer when the secondary screen closes.
    ///
    /// Returns `true` if the screen was still being waited on.
    pub fn finish_screen(&self, token: ChannelToken, result: ScreenResult) -> bool {
        let tx = {
            let mut pending = self.pending_screens.lock().unwrap_or_else(|e| e.into_inner());
            pending.remove(&token)
        };

        match tx {
            Some(sender) => sender.send(result).is_ok(),
            None => false,
        }
    }

    /// Out-of-band change made by the user in the host's own settings.
    pub fn set_permission_state(&self, permission: Permission, state: PermissionState) {
        self.decisions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(permission, state);
    }

    pub fn pending_count(&self) -> usize {
        let permissions = self
            .pending_permissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len();
        let screens = self.pending_screens.lock().unwrap_or_else(|e| e.into_inner()).len();
        permissions + screens
    }
}

/// Registration in a pending map, removed when the waiting flow finishes or
/// is dropped mid-wait.
struct Pending<'a, K: Eq + Hash, V> {
    map: &'a Mutex<HashMap<K, V>>,
    key: K,
}

impl<'a, K: Eq + Hash + Clone, V> Pending<'a, K, V> {
    fn insert(map: &'a Mutex<HashMap<K, V>>, key: K, value: V) -> Self {
        map.lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.clone(), value);
        Self { map, key }
    }
}

impl<K: Eq + Hash, V> Drop for Pending<'_, K, V> {
    fn drop(&mut self) {
        self.map
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

#[async_trait]
impl PermissionHost for CallbackBridge {
    fn check(&self, permission: &Permission) -> PermissionState {
        self.decisions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(permission)
            .copied()
            .unwrap_or_default()
    }

    async fn request(&self, permission: &Permission) -> PermissionDecision {
        let (tx, rx) = oneshot::channel();
        let request_id = uuid::Uuid::new_v4().to_string();

        let _pending = Pending::insert(&self.pending_permissions, request_id.clone(), tx);

        let event = HostEvent::PermissionPrompt {
            request_id: request_id.clone(),
            permission: permission.clone(),
            description: permission.description().to_string(),
        };

        // Nobody to show the prompt to: the host cannot ask, so deny.
        let decision = if self.events.send(event).is_err() {
            log::warn!("No presentation layer for {} prompt", permission);
            PermissionDecision::Denied
        } else {
            match tokio::time::timeout(self.permission_timeout, rx).await {
                Ok(Ok(d)) => d,
                _ => {
                    log::info!("Prompt for {} timed out; treating as denied", permission);
                    PermissionDecision::Denied
                }
            }
        };

        self.set_permission_state(permission.clone(), decision.into());
        decision
    }
}

#[async_trait]
impl ScreenHost for CallbackBridge {
    async fn present(
        &self,
        token: ChannelToken,
        target: &Target,
        outbound: &Payload,
    ) -> ScreenResult {
        let (tx, rx) = oneshot::channel();

        let _pending = Pending::insert(&self.pending_screens, token, tx);

        let event = HostEvent::ScreenPresented {
            token,
            target: target.clone(),
            outbound: outbound.clone(),
        };

        if self.events.send(event).is_err() {
            log::warn!("No presentation layer for secondary screen {}", token);
            return ScreenResult::Cancelled;
        }
        match tokio::time::timeout(self.screen_timeout, rx).await {
            Ok(Ok(result)) => result,
            _ => ScreenResult::Cancelled,
        }
    }
}
