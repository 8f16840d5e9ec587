use serde::{Deserialize, Serialize};

/// Lifecycle of one permission key as seen by the gate.
///
/// - **Unknown**: never asked, or the host has no answer yet.
/// - **PendingUserDecision**: a request is in flight; the host's prompt is showing.
/// - **Granted** / **Denied**: the host reported the user's decision. Sticky until
///   the host says otherwise (revocation happens out of band).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
    PendingUserDecision,
}

impl PermissionState {
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }
}

/// Terminal answer to a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionDecision {
    Granted,
    Denied,
}

impl From<PermissionDecision> for PermissionState {
    fn from(decision: PermissionDecision) -> Self {
        match decision {
            PermissionDecision::Granted => PermissionState::Granted,
            PermissionDecision::Denied => PermissionState::Denied,
        }
    }
}

/// Known permission keys plus host-specific ones.
///
/// Custom permissions carry the host's raw string (e.g.
/// "android.permission.BODY_SENSORS"). They are serialized with a custom impl
/// so the known variants keep their canonical names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    CallPhone,
    Camera,
    ReadContacts,
    WriteContacts,
    SendSms,
    RecordAudio,
    AccessFineLocation,
    ReadExternalStorage,
    /// Any other host permission string.
    Custom(String),
}

const HOST_PREFIX: &str = "android.permission.";

/// All known permission string values (excluding Custom).
const KNOWN_PERMISSIONS: &[&str] = &[
    "android.permission.CALL_PHONE",
    "android.permission.CAMERA",
    "android.permission.READ_CONTACTS",
    "android.permission.WRITE_CONTACTS",
    "android.permission.SEND_SMS",
    "android.permission.RECORD_AUDIO",
    "android.permission.ACCESS_FINE_LOCATION",
    "android.permission.READ_EXTERNAL_STORAGE",
];

impl Permission {
    /// The host's string form of this permission.
    pub fn as_str(&self) -> &str {
        match self {
            Permission::CallPhone => "android.permission.CALL_PHONE",
            Permission::Camera => "android.permission.CAMERA",
            Permission::ReadContacts => "android.permission.READ_CONTACTS",
            Permission::WriteContacts => "android.permission.WRITE_CONTACTS",
            Permission::SendSms => "android.permission.SEND_SMS",
            Permission::RecordAudio => "android.permission.RECORD_AUDIO",
            Permission::AccessFineLocation => "android.permission.ACCESS_FINE_LOCATION",
            Permission::ReadExternalStorage => "android.permission.READ_EXTERNAL_STORAGE",
            Permission::Custom(s) => s.as_str(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Permission::CallPhone => "Place phone calls without going through the dialer",
            Permission::Camera => "Take pictures and record video",
            Permission::ReadContacts => "Read your contacts",
            Permission::WriteContacts => "Modify your contacts",
            Permission::SendSms => "Send SMS messages",
            Permission::RecordAudio => "Record audio",
            Permission::AccessFineLocation => "Access precise location",
            Permission::ReadExternalStorage => "Read shared storage",
            Permission::Custom(s) => s.as_str(),
        }
    }

    /// Parse a host permission string. Unknown `android.permission.*` names and
    /// any dotted name become `Custom`; bare words are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let known = match s {
            "android.permission.CALL_PHONE" => Permission::CallPhone,
            "android.permission.CAMERA" => Permission::Camera,
            "android.permission.READ_CONTACTS" => Permission::ReadContacts,
            "android.permission.WRITE_CONTACTS" => Permission::WriteContacts,
            "android.permission.SEND_SMS" => Permission::SendSms,
            "android.permission.RECORD_AUDIO" => Permission::RecordAudio,
            "android.permission.ACCESS_FINE_LOCATION" => Permission::AccessFineLocation,
            "android.permission.READ_EXTERNAL_STORAGE" => Permission::ReadExternalStorage,
            _ if s.starts_with(HOST_PREFIX) || s.contains('.') => {
                Permission::Custom(s.to_string())
            }
            _ => return None,
        };
        Some(known)
    }
}

impl Serialize for Permission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Permission::parse(&s).ok_or_else(|| serde::de::Error::unknown_variant(&s, KNOWN_PERMISSIONS))
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_permissions_parse_to_their_variant() {
        for name in KNOWN_PERMISSIONS {
            let perm = Permission::parse(name).unwrap();
            assert!(!matches!(perm, Permission::Custom(_)), "{} parsed as custom", name);
            assert_eq!(perm.as_str(), *name);
        }
    }

    #[test]
    fn custom_permission_keeps_raw_string() {
        let perm: Permission =
            serde_json::from_value(serde_json::json!("android.permission.BODY_SENSORS")).unwrap();
        assert_eq!(perm, Permission::Custom("android.permission.BODY_SENSORS".into()));
        assert_eq!(
            serde_json::to_value(&perm).unwrap(),
            serde_json::json!("android.permission.BODY_SENSORS")
        );
    }

    #[test]
    fn bare_word_fails_deserialization() {
        let result = serde_json::from_value::<Permission>(serde_json::json!("camera"));
        assert!(result.is_err());
    }

    #[test]
    fn decision_maps_to_terminal_state() {
        assert_eq!(
            PermissionState::from(PermissionDecision::Granted),
            PermissionState::Granted
        );
        assert_eq!(
            PermissionState::from(PermissionDecision::Denied),
            PermissionState::Denied
        );
        assert!(!PermissionState::PendingUserDecision.is_granted());
    }

    #[test]
    fn display_matches_as_str() {
        let perm = Permission::CallPhone;
        assert_eq!(format!("{}", perm), perm.as_str());
    }
}
