use serde::Deserialize;
use std::path::Path;

use super::{CapabilityCatalog, CapabilityDescriptor};
use crate::error::{CapdeckError, CapdeckResult};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    categories: Vec<CategoryFile>,
}

#[derive(Debug, Deserialize)]
struct CategoryFile {
    name: String,
    #[serde(default)]
    capabilities: Vec<CapabilityDescriptor>,
}

impl CapabilityCatalog {
    /// Load a catalog from a YAML (`.yaml`/`.yml`) or JSON file.
    ///
    /// Meant for startup: any parse or validation problem is returned as an
    /// error so the caller can refuse to start.
    pub fn load(path: &Path) -> CapdeckResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let file: CatalogFile = if is_yaml {
            serde_yaml::from_str(&data)?
        } else {
            serde_json::from_str(&data)?
        };
        let catalog = Self::from_file(file)?;
        log::info!(
            "Loaded {} capabilities in {} categories from {}",
            catalog.len(),
            catalog.categories().len(),
            path.display()
        );
        Ok(catalog)
    }

    fn from_file(file: CatalogFile) -> CapdeckResult<Self> {
        let mut builder = Self::builder();
        for category in file.categories {
            builder = builder.category(category.name.clone());
            for mut descriptor in category.capabilities {
                if descriptor.category.is_empty() {
                    descriptor.category = category.name.clone();
                } else if descriptor.category != category.name {
                    return Err(CapdeckError::InvalidCatalog(format!(
                        "'{}' names category '{}' but is listed under '{}'",
                        descriptor.id, descriptor.category, category.name
                    )));
                }
                builder = builder.descriptor(descriptor);
            }
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Action;
    use crate::permissions::Permission;

    const YAML: &str = r#"
categories:
  - name: Phone
    capabilities:
      - id: dial
        label: Dial Number
        action:
          kind: fire_and_forget
          target:
            action: android.intent.action.DIAL
            uri: "tel:+254737467020"
      - id: call
        label: Make Call
        action:
          kind: permission_gated
          required_permission: android.permission.CALL_PHONE
          target:
            action: android.intent.action.CALL
            uri: "tel:+254723633522"
  - name: Navigation
    capabilities:
      - id: pass_data
        label: Pass Data
        action:
          kind: result_returning
          target:
            action: capdeck.intent.action.SECONDARY
          outbound_payload:
            data: X
"#;

    #[test]
    fn loads_yaml_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, YAML).unwrap();

        let catalog = CapabilityCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog["dial"].category, "Phone");
        assert!(matches!(
            &catalog["call"].action,
            Action::PermissionGated { required_permission: Permission::CallPhone, .. }
        ));
        match &catalog["pass_data"].action {
            Action::ResultReturning { outbound_payload, .. } => {
                assert_eq!(outbound_payload.get("data").map(String::as_str), Some("X"));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn loads_json_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let json = serde_json::json!({
            "categories": [{
                "name": "Web",
                "capabilities": [{
                    "id": "open_url",
                    "label": "Open URL",
                    "action": {
                        "kind": "fire_and_forget",
                        "target": { "action": "android.intent.action.VIEW", "uri": "https://www.google.com" }
                    }
                }]
            }]
        });
        std::fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();

        let catalog = CapabilityCatalog::load(&path).unwrap();
        assert_eq!(catalog["open_url"].action.target().uri.as_deref(), Some("https://www.google.com"));
    }

    #[test]
    fn unknown_action_kind_fails_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(
            &path,
            "categories:\n  - name: A\n    capabilities:\n      - id: x\n        label: X\n        action:\n          kind: teleport\n          target: { action: x.Y }\n",
        )
        .unwrap();

        assert!(matches!(
            CapabilityCatalog::load(&path),
            Err(CapdeckError::Yaml(_))
        ));
    }

    #[test]
    fn duplicate_ids_fail_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yml");
        std::fs::write(
            &path,
            "categories:\n  - name: A\n    capabilities:\n      - { id: x, label: X, action: { kind: fire_and_forget, target: { action: a.B } } }\n      - { id: x, label: Y, action: { kind: fire_and_forget, target: { action: a.C } } }\n",
        )
        .unwrap();

        assert!(matches!(
            CapabilityCatalog::load(&path),
            Err(CapdeckError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn mismatched_category_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(
            &path,
            "categories:\n  - name: A\n    capabilities:\n      - { id: x, label: X, category: B, action: { kind: fire_and_forget, target: { action: a.B } } }\n",
        )
        .unwrap();

        assert!(matches!(
            CapabilityCatalog::load(&path),
            Err(CapdeckError::InvalidCatalog(msg)) if msg.contains("listed under 'A'")
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CapabilityCatalog::load(&dir.path().join("nope.yaml")),
            Err(CapdeckError::Io(_))
        ));
    }
}
