use serde::Serialize;

use crate::navigation::ChannelToken;

#[derive(Debug, thiserror::Error)]
pub enum CapdeckError {
    #[error("Navigation busy: a secondary screen is already open")]
    NavigationBusy,

    #[error("Navigation not ready: still on the splash screen")]
    NotReady,

    #[error("Result channel already resolved: {0}")]
    AlreadyResolved(ChannelToken),

    #[error("Result channel not found: {0}")]
    UnknownChannel(ChannelToken),

    #[error("Capability not found: {0}")]
    UnknownCapability(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Serialize for CapdeckError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type CapdeckResult<T> = Result<T, CapdeckError>;
