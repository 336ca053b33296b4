//! Settings dialog schema for rdesktop connections.

use crate::args::keys;
use rdplug_core::plugin::{ProtocolSetting, SettingType, SettingValues};

pub const COLOR_DEPTHS: &[(&str, &str)] = &[
    ("8", "256 colors (8 bpp)"),
    ("15", "High color (15 bpp)"),
    ("16", "High color (16 bpp)"),
    ("24", "True color (24 bpp)"),
    ("32", "True color (32 bpp)"),
];

/// Experience presets; values are passed to `-x` untouched.
pub const EXPERIENCES: &[(&str, &str)] = &[
    ("", "Default"),
    ("m", "Modem (no wallpaper, full window drag, animations, theming)"),
    ("b", "Broadband (remove wallpaper)"),
    ("l", "LAN (show all details)"),
    ("0x8F", "Modem with font smoothing"),
    ("0x81", "Broadband with font smoothing"),
    ("0x80", "LAN with font smoothing"),
    ("0x01", "Disable wallpaper"),
    ("0x02", "Disable full window drag"),
    ("0x03", "Disable wallpaper, full window drag"),
    ("0x04", "Disable animations"),
    ("0x05", "Disable animations, wallpaper"),
    ("0x06", "Disable animations, full window drag"),
    ("0x07", "Disable animations, wallpaper, full window drag"),
    ("0x08", "Disable theming"),
    ("0x09", "Disable theming, wallpaper"),
    ("0x0a", "Disable theming, full window drag"),
    ("0x0b", "Disable theming, wallpaper, full window drag"),
    ("0x0c", "Disable theming, animations"),
    ("0x0d", "Disable theming, animations, wallpaper"),
    ("0x0e", "Disable theming, animations, full window drag"),
    ("0x0f", "Disable everything"),
];

pub const SOUND_MODES: &[(&str, &str)] = &[
    ("off", "Off"),
    ("local", "Local"),
    ("local,11025,1", "Local - low quality"),
    ("local,22050,2", "Local - medium quality"),
    ("local,44100,2", "Local - high quality"),
    ("remote", "Remote"),
];

pub const KEYMAPS: &[&str] = &[
    "ar", "cs", "da", "de", "de-ch", "en-dv", "en-gb", "en-us", "es", "et", "fi", "fo", "fr",
    "fr-be", "fr-ca", "fr-ch", "he", "hr", "hu", "is", "it", "ja", "ko", "lt", "lv", "mk", "nl",
    "nl-be", "no", "pl", "pt", "pt-br", "ru", "sl", "sv", "th", "tr",
];

const fn composite(kind: SettingType) -> ProtocolSetting {
    ProtocolSetting {
        kind,
        key: None,
        label: None,
        default: false,
        values: SettingValues::None,
    }
}

const fn text(kind: SettingType, key: &'static str, label: &'static str) -> ProtocolSetting {
    ProtocolSetting {
        kind,
        key: Some(key),
        label: Some(label),
        default: false,
        values: SettingValues::None,
    }
}

const fn select(
    key: &'static str,
    label: &'static str,
    values: &'static [(&'static str, &'static str)],
) -> ProtocolSetting {
    ProtocolSetting {
        kind: SettingType::Select,
        key: Some(key),
        label: Some(label),
        default: false,
        values: SettingValues::Select(values),
    }
}

const fn check(key: &'static str, label: &'static str, default: bool) -> ProtocolSetting {
    ProtocolSetting {
        kind: SettingType::Check,
        key: Some(key),
        label: Some(label),
        default,
        values: SettingValues::None,
    }
}

pub static BASIC_SETTINGS: &[ProtocolSetting] = &[
    composite(SettingType::Server),
    text(SettingType::Text, keys::USERNAME, "User name"),
    composite(SettingType::Password),
    text(SettingType::Text, keys::DOMAIN, "Domain"),
    composite(SettingType::Resolution),
    select(keys::COLOR_DEPTH, "Color depth", COLOR_DEPTHS),
    select(keys::EXPERIENCE, "Experience", EXPERIENCES),
    select(keys::SOUND, "Sound", SOUND_MODES),
    text(SettingType::Folder, keys::SHARE_FOLDER, "Share folder"),
];

pub static ADVANCED_SETTINGS: &[ProtocolSetting] = &[
    text(SettingType::Text, keys::TITLE, "Window title"),
    text(SettingType::Text, keys::CLIENT_NAME, "Client name"),
    text(SettingType::Text, keys::EXEC, "Startup program"),
    text(SettingType::Text, keys::EXEC_PATH, "Startup path"),
    ProtocolSetting {
        kind: SettingType::Combo,
        key: Some(keys::KEYMAP),
        label: Some("Keyboard map"),
        default: false,
        values: SettingValues::Combo(KEYMAPS),
    },
    check(keys::FULLSCREEN, "Fullscreen", true),
    check(keys::SEAMLESS, "Seamless RDP", false),
    check(keys::CONSOLE, "Attach to console (Windows 2003 / 2003 R2)", false),
    check(keys::COMPRESSION, "RDP datastream compression", true),
    check(keys::BITMAP_CACHING, "Bitmap caching", false),
    check(keys::NO_MOUSE_MOTION, "Don't send mouse motion events", true),
    check(keys::HIDE_DECORATIONS, "Hide WM decorations", false),
    check(keys::DETACHED, "Detached window", true),
    check(keys::NO_GRAB_KEYBOARD, "Don't grab keyboard", false),
    check(keys::RDP4, "Force RDP version 4", true),
    check(keys::RDP5, "Force RDP version 5", false),
    check(keys::SYNC_NUMLOCK, "Numlock synchronization", true),
    check(keys::NO_ENCRYPTION, "Disable encryption", false),
];
