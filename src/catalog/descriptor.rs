use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::permissions::Permission;

/// Opaque string key/value mapping carried with a request or a screen visit.
pub type Payload = BTreeMap<String, String>;

/// What the host is asked to open.
///
/// Mirrors the shape of a platform capability request: an action verb, an
/// optional data URI and MIME type, extra categories, and an optional
/// explicit package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl Target {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            uri: None,
            mime_type: None,
            categories: Vec::new(),
            package: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.action)?;
        if let Some(uri) = &self.uri {
            write!(f, " {}", uri)?;
        }
        if let Some(mime) = &self.mime_type {
            write!(f, " [{}]", mime)?;
        }
        Ok(())
    }
}

/// How a descriptor is invoked. The only input to dispatch behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Sent once; success means the request reached the host.
    FireAndForget {
        target: Target,
        #[serde(default)]
        parameters: Payload,
    },
    /// Dispatched only after `required_permission` is granted.
    PermissionGated {
        required_permission: Permission,
        target: Target,
        #[serde(default)]
        parameters: Payload,
    },
    /// Presents a secondary screen and waits for it to return or be dismissed.
    ResultReturning {
        target: Target,
        #[serde(default)]
        outbound_payload: Payload,
    },
}

impl Action {
    pub fn target(&self) -> &Target {
        match self {
            Action::FireAndForget { target, .. }
            | Action::PermissionGated { target, .. }
            | Action::ResultReturning { target, .. } => target,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::FireAndForget { .. } => "fire_and_forget",
            Action::PermissionGated { .. } => "permission_gated",
            Action::ResultReturning { .. } => "result_returning",
        }
    }
}

/// One invocable entry in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub id: String,
    pub label: String,
    /// Filled in from the enclosing category when loaded from a file.
    #[serde(default)]
    pub category: String,
    pub action: Action,
}

impl CapabilityDescriptor {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        category: impl Into<String>,
        action: Action,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category: category.into(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_is_tagged_by_kind() {
        let action = Action::PermissionGated {
            required_permission: Permission::CallPhone,
            target: Target::new("android.intent.action.CALL").with_uri("tel:+254723633522"),
            parameters: Payload::new(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["kind"], "permission_gated");
        assert_eq!(json["required_permission"], "android.permission.CALL_PHONE");
        assert_eq!(json["target"]["uri"], "tel:+254723633522");
        assert!(json["target"].get("mime_type").is_none());
    }

    #[test]
    fn missing_payloads_default_to_empty() {
        let action: Action = serde_json::from_value(serde_json::json!({
            "kind": "result_returning",
            "target": { "action": "capdeck.SECONDARY" }
        }))
        .unwrap();
        match action {
            Action::ResultReturning {
                target,
                outbound_payload,
            } => {
                assert_eq!(target.action, "capdeck.SECONDARY");
                assert!(outbound_payload.is_empty());
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn target_display_includes_uri_and_mime() {
        let target = Target::new("android.intent.action.VIEW")
            .with_uri("geo:0,0?q=Nairobi")
            .with_mime_type("text/plain");
        assert_eq!(
            target.to_string(),
            "android.intent.action.VIEW geo:0,0?q=Nairobi [text/plain]"
        );
    }
}
