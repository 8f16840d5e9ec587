use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

use super::types::{Permission, PermissionDecision, PermissionState};
use crate::host::PermissionHost;

#[derive(Default)]
struct GateState {
    states: HashMap<Permission, PermissionState>,
    /// Callers parked behind an in-flight host request, keyed by permission.
    /// Presence of the key means a request is in flight.
    waiters: HashMap<Permission, Vec<oneshot::Sender<PermissionDecision>>>,
}

/// Check-and-request gatekeeper in front of permission-gated dispatch.
///
/// Owns the process-wide permission table. Concurrent `request` calls for the
/// same permission share one host prompt; every caller sees the same decision.
/// Locks are held only for table updates, never across an await.
pub struct PermissionGate {
    host: Arc<dyn PermissionHost>,
    inner: Mutex<GateState>,
}

impl PermissionGate {
    pub fn new(host: Arc<dyn PermissionHost>) -> Self {
        Self {
            host,
            inner: Mutex::new(GateState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cached state. No host call, no side effects.
    pub fn status(&self, permission: &Permission) -> PermissionState {
        self.lock()
            .states
            .get(permission)
            .copied()
            .unwrap_or_default()
    }

    /// Set a starting state (settings, tests). Ignored while a request is pending.
    pub fn seed(&self, permission: Permission, state: PermissionState) {
        let mut gate = self.lock();
        if gate.waiters.contains_key(&permission) {
            return;
        }
        gate.states.insert(permission, state);
    }

    /// Seed each permission from the host's current answer.
    pub fn seed_from_host<'a>(&self, permissions: impl IntoIterator<Item = &'a Permission>) {
        for permission in permissions {
            self.refresh(permission);
        }
    }

    /// Re-query the host and fold its answer into the table.
    ///
    /// The host can revoke or grant out of band, so gated dispatch calls this
    /// instead of trusting the cache. A host `Unknown` keeps the cached value;
    /// a pending request is never overwritten.
    pub fn refresh(&self, permission: &Permission) -> PermissionState {
        let reported = self.host.check(permission);
        let mut gate = self.lock();
        if gate.waiters.contains_key(permission) {
            return PermissionState::PendingUserDecision;
        }
        match reported {
            PermissionState::Granted | PermissionState::Denied => {
                gate.states.insert(permission.clone(), reported);
                reported
            }
            _ => gate.states.get(permission).copied().unwrap_or_default(),
        }
    }

    /// Ask the host for `permission`, coalescing with any request already in flight.
    ///
    /// Denial is a normal outcome, never an error.
    pub async fn request(&self, permission: &Permission) -> PermissionDecision {
        // Ok(state before the prompt) for the leader, Err(receiver) for a follower.
        let role = {
            let mut gate = self.lock();
            match gate.waiters.get_mut(permission) {
                Some(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Err(rx)
                }
                None => {
                    gate.waiters.insert(permission.clone(), Vec::new());
                    Ok(gate
                        .states
                        .insert(permission.clone(), PermissionState::PendingUserDecision))
                }
            }
        };

        let prior = match role {
            Ok(prior) => prior,
            Err(rx) => {
                log::debug!("Joining pending request for {}", permission);
                return rx.await.unwrap_or(PermissionDecision::Denied);
            }
        };

        log::info!("Requesting {} from host", permission);
        let mut pending = PendingRequest {
            gate: self,
            permission,
            prior: prior.unwrap_or_default(),
            settled: false,
        };
        let decision = self.host.request(permission).await;
        pending.settle(decision);
        log::info!("Host answered {} for {}", decision_label(decision), permission);
        decision
    }

    /// Copy of the whole table, ordered by permission.
    pub fn snapshot(&self) -> BTreeMap<Permission, PermissionState> {
        self.lock()
            .states
            .iter()
            .map(|(p, s)| (p.clone(), *s))
            .collect()
    }

    fn finish(&self, permission: &Permission, state: PermissionState, decision: PermissionDecision) {
        let waiters = {
            let mut gate = self.lock();
            gate.states.insert(permission.clone(), state);
            gate.waiters.remove(permission).unwrap_or_default()
        };
        for tx in waiters {
            let _ = tx.send(decision);
        }
    }
}

fn decision_label(decision: PermissionDecision) -> &'static str {
    match decision {
        PermissionDecision::Granted => "granted",
        PermissionDecision::Denied => "denied",
    }
}

/// Releases coalesced waiters even if the leading request future is dropped
/// before the host answers. Waiters then observe `Denied` and the permission
/// goes back to what it was before the prompt (`Unknown` if never seen).
struct PendingRequest<'a> {
    gate: &'a PermissionGate,
    permission: &'a Permission,
    prior: PermissionState,
    settled: bool,
}

impl PendingRequest<'_> {
    fn settle(&mut self, decision: PermissionDecision) {
        self.settled = true;
        self.gate.finish(self.permission, decision.into(), decision);
    }
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        if !self.settled {
            log::warn!("Request for {} abandoned before the host answered", self.permission);
            self.gate
                .finish(self.permission, self.prior, PermissionDecision::Denied);
        }
    }
}

// ---------------------------------------------------------------------------
// MockPermissionHost, for tests
// ---------------------------------------------------------------------------
