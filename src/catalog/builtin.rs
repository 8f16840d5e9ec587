//! The catalog shipped with the application.

use super::{Action, CapabilityCatalog, Payload, Target};
use crate::permissions::Permission;

/// Package name the app reports to the host for per-app settings screens.
pub const APP_PACKAGE: &str = "com.capdeck.app";

/// Target handled by the app's own secondary screen.
pub const SECONDARY_SCREEN: &str = "capdeck.intent.action.SECONDARY";

const VIEW: &str = "android.intent.action.VIEW";
const EDIT: &str = "android.intent.action.EDIT";
const SENDTO: &str = "android.intent.action.SENDTO";
const CREATE_DOCUMENT: &str = "android.intent.action.CREATE_DOCUMENT";
const CATEGORY_OPENABLE: &str = "android.intent.category.OPENABLE";
const CATEGORY_LAUNCHER: &str = "android.intent.category.LAUNCHER";
const EXTRA_TEXT: &str = "android.intent.extra.TEXT";
const EXTRA_TITLE: &str = "android.intent.extra.TITLE";

fn payload(pairs: &[(&str, &str)]) -> Payload {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn fire(target: Target) -> Action {
    fire_with(target, &[])
}

fn fire_with(target: Target, parameters: &[(&str, &str)]) -> Action {
    Action::FireAndForget {
        target,
        parameters: payload(parameters),
    }
}

fn settings(action: &str) -> Action {
    fire(Target::new(action))
}

fn gated(permission: Permission, target: Target) -> Action {
    Action::PermissionGated {
        required_permission: permission,
        target,
        parameters: Payload::new(),
    }
}

fn for_result(target: Target, outbound: &[(&str, &str)]) -> Action {
    Action::ResultReturning {
        target,
        outbound_payload: payload(outbound),
    }
}

pub(crate) fn catalog() -> CapabilityCatalog {
    let app_package_uri = format!("package:{}", APP_PACKAGE);

    CapabilityCatalog::builder()
        .category("App Navigation")
        .item("open_screen", "Open Screen", for_result(Target::new(SECONDARY_SCREEN), &[]))
        .item(
            "pass_data",
            "Pass Data",
            for_result(
                Target::new(SECONDARY_SCREEN),
                &[("data", "This is data sent from the home screen")],
            ),
        )
        .item(
            "get_results",
            "Get Results",
            for_result(
                Target::new(SECONDARY_SCREEN),
                &[("data", "Send something back")],
            ),
        )
        .category("Phone & Communication")
        .item(
            "dial_number",
            "Dial Number",
            fire(Target::new("android.intent.action.DIAL").with_uri("tel:+254737467020")),
        )
        .item(
            "make_call",
            "Make Call",
            gated(
                Permission::CallPhone,
                Target::new("android.intent.action.CALL").with_uri("tel:+254723633522"),
            ),
        )
        .item(
            "send_sms",
            "Send SMS",
            fire_with(
                Target::new(SENDTO).with_uri("smsto:0737467020"),
                &[("sms_body", "How is todays weather")],
            ),
        )
        .item(
            "send_email",
            "Send Email",
            fire_with(
                Target::new(SENDTO).with_uri("mailto:abc@gmail.com"),
                &[("android.intent.extra.SUBJECT", "Subject"), (EXTRA_TEXT, "Body")],
            ),
        )
        .item(
            "share_content",
            "Share Content",
            fire_with(
                Target::new("android.intent.action.SEND").with_mime_type("text/plain"),
                &[(EXTRA_TEXT, "Hey, download this app!")],
            ),
        )
        .item(
            "view_contacts",
            "View Contacts",
            fire(Target::new(VIEW).with_mime_type("vnd.android.cursor.dir/contact")),
        )
        .item(
            "add_contact",
            "Add Contact",
            fire_with(
                Target::new("android.intent.action.INSERT_OR_EDIT")
                    .with_mime_type("vnd.android.cursor.item/contact"),
                &[
                    ("name", "John Doe"),
                    ("phone", "+254712345678"),
                    ("email", "john.doe@example.com"),
                ],
            ),
        )
        .category("Camera & Media")
        .item(
            "take_photo",
            "Take Photo",
            for_result(Target::new("android.media.action.IMAGE_CAPTURE"), &[]),
        )
        .item(
            "record_video",
            "Record Video",
            fire(Target::new("android.media.action.VIDEO_CAPTURE")),
        )
        .item(
            "pick_photo",
            "Pick Photo",
            fire(
                Target::new("android.intent.action.PICK")
                    .with_uri("content://media/external/images/media"),
            ),
        )
        .item(
            "open_file",
            "Open File",
            fire(Target::new("android.intent.action.GET_CONTENT").with_mime_type("*/*")),
        )
        .item(
            "create_file",
            "Create File",
            fire_with(
                Target::new(CREATE_DOCUMENT).with_mime_type("text/plain"),
                &[(EXTRA_TITLE, "newfile.txt")],
            ),
        )
        .item("edit_file", "Edit File", fire(Target::new(EDIT)))
        .category("Web & Browser")
        .item(
            "open_url",
            "Open URL",
            fire(Target::new(VIEW).with_uri("https://www.google.com")),
        )
        .item(
            "web_search",
            "Web Search",
            fire_with(
                Target::new("android.intent.action.WEB_SEARCH"),
                &[("query", "Android Intents example")],
            ),
        )
        .item(
            "system_search",
            "System Search",
            fire(Target::new("android.intent.action.SEARCH")),
        )
        .category("Maps & Navigation")
        .item(
            "open_location",
            "Open Location",
            fire(Target::new(VIEW).with_uri("geo:0,0?q=Nairobi")),
        )
        .item(
            "navigate_to",
            "Navigate To",
            fire(Target::new(VIEW).with_uri("google.navigation:q=Kenyatta+University")),
        )
        .item(
            "street_view",
            "Street View",
            fire(Target::new(VIEW).with_uri("google.streetview:cbll=-1.286389,36.817223")),
        )
        .category("Device Settings")
        .item("system_settings", "System Settings", settings("android.settings.SETTINGS"))
        .item("wifi_settings", "WiFi Settings", settings("android.settings.WIFI_SETTINGS"))
        .item("bluetooth_settings", "Bluetooth", settings("android.settings.BLUETOOTH_SETTINGS"))
        .item(
            "location_settings",
            "Location Settings",
            settings("android.settings.LOCATION_SOURCE_SETTINGS"),
        )
        .item("app_settings", "App Settings", settings("android.settings.APPLICATION_SETTINGS"))
        .item(
            "data_settings",
            "Data Settings",
            settings("android.settings.DATA_ROAMING_SETTINGS"),
        )
        .item(
            "storage_access",
            "Storage Access",
            fire(
                Target::new("android.settings.MANAGE_APP_ALL_FILES_ACCESS_PERMISSION")
                    .with_uri(app_package_uri),
            ),
        )
        .item(
            "battery_optimization",
            "Battery Optimization",
            settings("android.settings.IGNORE_BATTERY_OPTIMIZATION_SETTINGS"),
        )
        .category("Files & Documents")
        .item(
            "open_document",
            "Open Document",
            fire(
                Target::new("android.intent.action.OPEN_DOCUMENT")
                    .with_category(CATEGORY_OPENABLE)
                    .with_mime_type("*/*"),
            ),
        )
        .item(
            "create_document",
            "Create Document",
            fire_with(
                Target::new(CREATE_DOCUMENT)
                    .with_category(CATEGORY_OPENABLE)
                    .with_mime_type("text/plain"),
                &[(EXTRA_TITLE, "newfile.txt")],
            ),
        )
        .item("view_file", "View File", fire(Target::new(VIEW).with_mime_type("*/*")))
        .item("edit_document", "Edit File", fire(Target::new(EDIT).with_mime_type("*/*")))
        .category("App & System Controls")
        .item(
            "launch_app",
            "Launch App",
            fire(Target::new("android.intent.action.MAIN").with_category(CATEGORY_LAUNCHER)),
        )
        .item("run_service", "Run Service", fire(Target::new("android.intent.action.RUN")))
        .item(
            "install_apk",
            "Install APK",
            fire(Target::new(VIEW).with_mime_type("application/vnd.android.package-archive")),
        )
        .item(
            "uninstall_app",
            "Uninstall App",
            fire(Target::new("android.intent.action.DELETE").with_uri("package:com.example.yourapp")),
        )
        .item(
            "app_preferences",
            "App Preferences",
            settings("android.settings.APPLICATION_SETTINGS"),
        )
        .item(
            "notification_settings",
            "Notification Settings",
            fire_with(
                Target::new("android.settings.APP_NOTIFICATION_SETTINGS"),
                &[("android.provider.extra.APP_PACKAGE", APP_PACKAGE)],
            ),
        )
        .item(
            "battery_saver",
            "Battery Saver",
            settings("android.settings.BATTERY_SAVER_SETTINGS"),
        )
        .category("Media & Audio")
        .item("music_player", "Music Player", fire(Target::new(VIEW).with_mime_type("audio/*")))
        .item("video_player", "Video Player", fire(Target::new(VIEW).with_mime_type("video/*")))
        .item(
            "photo_gallery",
            "Photo Gallery",
            fire(Target::new(VIEW).with_uri("content://media/external/images/media")),
        )
        .category("System Utilities")
        .item(
            "battery_usage",
            "Battery Usage",
            settings("android.intent.action.POWER_USAGE_SUMMARY"),
        )
        .item("storage_info", "Storage Info", settings("android.settings.MEMORY_CARD_SETTINGS"))
        .item(
            "overlay_permission",
            "Overlay Permission",
            settings("android.settings.action.MANAGE_OVERLAY_PERMISSION"),
        )
        .item(
            "write_settings",
            "Write Settings",
            settings("android.settings.action.MANAGE_WRITE_SETTINGS"),
        )
        .item(
            "airplane_mode",
            "Airplane Mode",
            settings("android.settings.AIRPLANE_MODE_SETTINGS"),
        )
        .item(
            "stk_push",
            "STK Push",
            fire(
                Target::new("android.intent.action.MAIN")
                    .with_category(CATEGORY_LAUNCHER)
                    .with_package("com.android.stk"),
            ),
        )
        .build_static()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = CapabilityCatalog::builtin();
        let rebuilt = catalog
            .categories()
            .iter()
            .flat_map(|c| c.descriptors.iter().cloned())
            .fold(CatalogBuilder::default(), |b, d| b.descriptor(d))
            .build();
        assert!(rebuilt.is_ok(), "{:?}", rebuilt.err());
    }

    #[test]
    fn builtin_categories_in_display_order() {
        let catalog = CapabilityCatalog::builtin();
        let names: Vec<_> = catalog.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "App Navigation",
                "Phone & Communication",
                "Camera & Media",
                "Web & Browser",
                "Maps & Navigation",
                "Device Settings",
                "Files & Documents",
                "App & System Controls",
                "Media & Audio",
                "System Utilities",
            ]
        );
    }

    #[test]
    fn make_call_requires_call_phone() {
        let catalog = CapabilityCatalog::builtin();
        match &catalog["make_call"].action {
            Action::PermissionGated {
                required_permission,
                target,
                ..
            } => {
                assert_eq!(*required_permission, Permission::CallPhone);
                assert_eq!(target.uri.as_deref(), Some("tel:+254723633522"));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn navigation_items_return_results() {
        let catalog = CapabilityCatalog::builtin();
        for id in ["open_screen", "pass_data", "get_results"] {
            assert!(
                matches!(catalog[id].action, Action::ResultReturning { .. }),
                "{} should return a result",
                id
            );
        }
        match &catalog["pass_data"].action {
            Action::ResultReturning { outbound_payload, .. } => {
                assert!(outbound_payload.contains_key("data"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn only_take_photo_waits_for_the_camera() {
        let catalog = CapabilityCatalog::builtin();
        assert!(matches!(
            catalog["take_photo"].action,
            Action::ResultReturning { .. }
        ));
        assert!(matches!(
            catalog["record_video"].action,
            Action::FireAndForget { .. }
        ));
    }

    #[test]
    fn labels_may_repeat_across_categories() {
        let catalog = CapabilityCatalog::builtin();
        let edit_labels = catalog.iter().filter(|d| d.label == "Edit File").count();
        assert_eq!(edit_labels, 2);
    }
}
