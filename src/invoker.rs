use std::sync::Arc;

use crate::catalog::{Action, CapabilityCatalog, CapabilityDescriptor, Payload, Target};
use crate::error::CapdeckResult;
use crate::host::{HostDispatcher, ScreenHost};
use crate::navigation::{ChannelOutcome, ChannelToken, NavigationController};
use crate::permissions::{Permission, PermissionDecision, PermissionGate};

/// How one invocation ended.
///
/// `PermissionRefused` and `Cancelled` are ordinary outcomes the caller
/// shows to the user; errors (e.g. `NavigationBusy`) come back as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// The request reached the host. Says nothing about what the host did with it.
    Dispatched,
    PermissionRefused,
    Completed(Payload),
    Cancelled,
}

/// Executes a descriptor's action against the host.
///
/// One algorithm per action shape:
/// - fire-and-forget: dispatch, report `Dispatched`
/// - permission-gated: dispatch only once the gate reports granted
/// - result-returning: open a result channel, present the secondary screen,
///   resume when the channel resolves or is cancelled
pub struct CapabilityInvoker {
    gate: Arc<PermissionGate>,
    navigation: Arc<NavigationController>,
    dispatcher: Arc<dyn HostDispatcher>,
    screens: Arc<dyn ScreenHost>,
}

impl CapabilityInvoker {
    pub fn new(
        gate: Arc<PermissionGate>,
        navigation: Arc<NavigationController>,
        dispatcher: Arc<dyn HostDispatcher>,
        screens: Arc<dyn ScreenHost>,
    ) -> Self {
        Self {
            gate,
            navigation,
            dispatcher,
            screens,
        }
    }

    pub fn gate(&self) -> &Arc<PermissionGate> {
        &self.gate
    }

    pub fn navigation(&self) -> &Arc<NavigationController> {
        &self.navigation
    }

    /// Run `descriptor` and hand the outcome to `on_complete`, exactly once.
    ///
    /// Fire-and-forget descriptors never suspend: `on_complete` runs on the
    /// first poll, right after the dispatch call returns.
    pub async fn invoke<F>(&self, descriptor: &CapabilityDescriptor, on_complete: F)
    where
        F: FnOnce(CapdeckResult<InvocationOutcome>),
    {
        on_complete(self.run(descriptor).await);
    }

    /// Look `id` up in `catalog`, then `invoke` it. Unknown ids are reported
    /// through `on_complete`.
    pub async fn invoke_id<F>(&self, catalog: &CapabilityCatalog, id: &str, on_complete: F)
    where
        F: FnOnce(CapdeckResult<InvocationOutcome>),
    {
        match catalog.require(id) {
            Ok(descriptor) => self.invoke(descriptor, on_complete).await,
            Err(e) => on_complete(Err(e)),
        }
    }

    pub async fn run(&self, descriptor: &CapabilityDescriptor) -> CapdeckResult<InvocationOutcome> {
        match &descriptor.action {
            Action::FireAndForget { target, parameters } => {
                Ok(self.fire(&descriptor.id, target, parameters))
            }
            Action::PermissionGated {
                required_permission,
                target,
                parameters,
            } => Ok(self
                .gated(&descriptor.id, required_permission, target, parameters)
                .await),
            Action::ResultReturning {
                target,
                outbound_payload,
            } => self.for_result(&descriptor.id, target, outbound_payload).await,
        }
    }

    fn fire(&self, id: &str, target: &Target, parameters: &Payload) -> InvocationOutcome {
        log::info!("Dispatching '{}' -> {}", id, target);
        self.dispatcher.dispatch(target, parameters);
        InvocationOutcome::Dispatched
    }

    async fn gated(
        &self,
        id: &str,
        permission: &Permission,
        target: &Target,
        parameters: &Payload,
    ) -> InvocationOutcome {
        let state = self.gate.refresh(permission);
        if !state.is_granted() {
            log::debug!("'{}' needs {} (currently {:?})", id, permission, state);
            if self.gate.request(permission).await == PermissionDecision::Denied {
                log::info!("'{}' not dispatched: {} refused", id, permission);
                return InvocationOutcome::PermissionRefused;
            }
        }
        self.fire(id, target, parameters)
    }

    async fn for_result(
        &self,
        id: &str,
        target: &Target,
        outbound: &Payload,
    ) -> CapdeckResult<InvocationOutcome> {
        let (token, mut settled) = self.navigation.open(target.clone(), outbound.clone())?;
        log::info!("'{}' presenting {} on channel {}", id, target, token);
        let mut visit = ScreenVisit {
            navigation: &self.navigation,
            token,
            closed: false,
        };

        let presented = self.screens.present(token, target, outbound);
        let outcome = tokio::select! {
            biased;
            // Back navigation settled the channel before the screen answered.
            outcome = &mut settled => outcome,
            reported = presented => {
                if let Err(e) = self.navigation.settle(token, reported) {
                    log::warn!("Ignoring late screen result for '{}': {}", id, e);
                }
                (&mut settled).await
            }
        };
        visit.close();

        match outcome {
            Ok(ChannelOutcome::Resolved(inbound)) => {
                log::info!("'{}' completed on channel {}", id, token);
                Ok(InvocationOutcome::Completed(inbound))
            }
            Ok(ChannelOutcome::Cancelled) | Err(_) => {
                log::info!("'{}' cancelled on channel {}", id, token);
                Ok(InvocationOutcome::Cancelled)
            }
        }
    }
}

/// Cancels and discards the result channel if the invoking flow is dropped
/// while the secondary screen is up, so navigation returns Home.
struct ScreenVisit<'a> {
    navigation: &'a NavigationController,
    token: ChannelToken,
    closed: bool,
}

impl ScreenVisit<'_> {
    fn close(&mut self) {
        self.closed = true;
        self.navigation.consume(self.token);
    }
}

impl Drop for ScreenVisit<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        log::warn!("Channel {} abandoned before the screen answered", self.token);
        if let Err(e) = self.navigation.cancel(self.token) {
            log::debug!("Abandoned channel {} already settled: {}", self.token, e);
        }
        self.navigation.consume(self.token);
    }
}
