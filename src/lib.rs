pub mod catalog;
pub mod config;
mod error;
pub mod host;
pub mod invoker;
pub mod navigation;
pub mod permissions;

use std::sync::Arc;
use tokio::sync::mpsc;

pub use catalog::{Action, CapabilityCatalog, CapabilityDescriptor, Payload, Target};
pub use config::Settings;
pub use error::{CapdeckError, CapdeckResult};
pub use invoker::{CapabilityInvoker, InvocationOutcome};

use host::{CallbackBridge, HostDispatcher, HostEvent};
use navigation::NavigationController;
use permissions::PermissionGate;

/// Everything the presentation layer needs, wired from `Settings`.
pub struct App {
    pub catalog: Arc<CapabilityCatalog>,
    pub invoker: Arc<CapabilityInvoker>,
    pub bridge: Arc<CallbackBridge>,
}

impl App {
    /// Build the app around `dispatcher`. Returns the stream of events the
    /// presentation layer must answer through `bridge`.
    ///
    /// Fails only at startup: a configured catalog file that does not load
    /// is fatal.
    pub fn build(
        settings: &Settings,
        dispatcher: Arc<dyn HostDispatcher>,
    ) -> CapdeckResult<(Self, mpsc::UnboundedReceiver<HostEvent>)> {
        let catalog = match &settings.catalog_path {
            Some(path) => CapabilityCatalog::load(path)?,
            None => CapabilityCatalog::builtin(),
        };

        let (bridge, events) =
            CallbackBridge::new(settings.permission_timeout(), settings.screen_timeout());
        let bridge = Arc::new(bridge);

        let gate = Arc::new(PermissionGate::new(bridge.clone()));
        for (permission, state) in &settings.seed_permissions {
            bridge.set_permission_state(permission.clone(), *state);
            gate.seed(permission.clone(), *state);
        }

        let navigation = Arc::new(NavigationController::new());
        let invoker = Arc::new(CapabilityInvoker::new(
            gate,
            navigation,
            dispatcher,
            bridge.clone(),
        ));

        log::info!(
            "capdeck ready: {} capabilities, {} seeded permissions",
            catalog.len(),
            settings.seed_permissions.len()
        );

        Ok((
            Self {
                catalog: Arc::new(catalog),
                invoker,
                bridge,
            },
            events,
        ))
    }

    pub fn navigation(&self) -> &Arc<NavigationController> {
        self.invoker.navigation()
    }
}
