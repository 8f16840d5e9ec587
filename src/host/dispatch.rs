use std::sync::Mutex;

use super::HostDispatcher;
use crate::catalog::{Payload, Target};

/// Dispatcher for hosts without a capability provider: records the request in
/// the log and nothing else.
#[derive(Debug, Default)]
pub struct LogDispatcher;

impl HostDispatcher for LogDispatcher {
    fn dispatch(&self, target: &Target, parameters: &Payload) {
        if parameters.is_empty() {
            log::info!("Dispatch {}", target);
        } else {
            log::info!("Dispatch {} with {:?}", target, parameters);
        }
        if let Some(package) = &target.package {
            log::debug!("Dispatch pinned to package {}", package);
        }
    }
}

/// One request seen by a `RecordingDispatcher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub target: Target,
    pub parameters: Payload,
}

/// Keeps every dispatched request for later inspection.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    records: Mutex<Vec<DispatchRecord>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DispatchRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl HostDispatcher for RecordingDispatcher {
    fn dispatch(&self, target: &Target, parameters: &Payload) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(DispatchRecord {
                target: target.clone(),
                parameters: parameters.clone(),
            });
    }
}
