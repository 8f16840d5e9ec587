pub mod gate;
pub mod types;

pub use gate::PermissionGate;
pub use types::{Permission, PermissionDecision, PermissionState};
