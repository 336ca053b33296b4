//! Mapping from a connection profile to an rdesktop command line.

use rdplug_core::{ConnectionProfile, SocketId};

pub(crate) mod keys {
    pub const SERVER: &str = "server";
    pub const USERNAME: &str = "username";
    pub const DOMAIN: &str = "domain";
    pub const PASSWORD: &str = "password";
    pub const CLIENT_NAME: &str = "clientname";
    pub const EXEC: &str = "exec";
    pub const EXEC_PATH: &str = "execpath";
    pub const TITLE: &str = "title";
    pub const KEYMAP: &str = "keymap";
    pub const CONSOLE: &str = "console";
    pub const COMPRESSION: &str = "compression";
    pub const BITMAP_CACHING: &str = "bitmapcaching";
    pub const SHARE_FOLDER: &str = "sharefolder";
    pub const FULLSCREEN: &str = "fullscreen";
    pub const SEAMLESS: &str = "seamlessrdp";
    pub const RESOLUTION_WIDTH: &str = "resolution_width";
    pub const RESOLUTION_HEIGHT: &str = "resolution_height";
    pub const COLOR_DEPTH: &str = "colordepth";
    pub const EXPERIENCE: &str = "experience";
    pub const SOUND: &str = "sound";
    pub const HIDE_DECORATIONS: &str = "hidedecorations";
    pub const NO_GRAB_KEYBOARD: &str = "nograbkeyboard";
    pub const NO_ENCRYPTION: &str = "noencryption";
    pub const SYNC_NUMLOCK: &str = "syncnumlock";
    pub const RDP4: &str = "rdp4";
    pub const RDP5: &str = "rdp5";
    pub const NO_MOUSE_MOTION: &str = "nomousemotion";
    pub const DETACHED: &str = "detached";
}

pub const DEFAULT_WIDTH: i64 = 1024;
pub const DEFAULT_HEIGHT: i64 = 768;

/// Text options passed as `<flag> <value>` ahead of the password.
const IDENTITY_OPTIONS: &[(&str, &str)] = &[(keys::USERNAME, "-u"), (keys::DOMAIN, "-d")];

/// Text options passed as `<flag> <value>` after the password.
const SESSION_OPTIONS: &[(&str, &str)] = &[
    (keys::CLIENT_NAME, "-n"),
    (keys::EXEC, "-s"),
    (keys::EXEC_PATH, "-c"),
    (keys::TITLE, "-T"),
    (keys::KEYMAP, "-k"),
];

/// Toggles emitted before the display group.
const LEADING_SWITCHES: &[(&str, &str)] = &[
    (keys::CONSOLE, "-0"),
    (keys::COMPRESSION, "-z"),
    (keys::BITMAP_CACHING, "-P"),
];

/// Toggles emitted after sound.
const TRAILING_SWITCHES: &[(&str, &str)] = &[
    (keys::HIDE_DECORATIONS, "-D"),
    (keys::NO_GRAB_KEYBOARD, "-K"),
    (keys::NO_ENCRYPTION, "-E"),
    (keys::SYNC_NUMLOCK, "-N"),
    (keys::RDP4, "-4"),
    (keys::RDP5, "-5"),
    (keys::NO_MOUSE_MOTION, "-m"),
];

/// Builds the argument vector for one launch.
///
/// Absent or empty options contribute nothing; values are passed through
/// without validation.
#[derive(Debug, Clone)]
pub struct ArgumentBuilder<'a> {
    client: &'a str,
    profile: &'a ConnectionProfile,
    socket: Option<SocketId>,
}

impl<'a> ArgumentBuilder<'a> {
    pub fn new(client: &'a str, profile: &'a ConnectionProfile) -> Self {
        Self {
            client,
            profile,
            socket: None,
        }
    }

    /// Embed the client window into `socket` (`-X`).
    pub fn embed_into(mut self, socket: SocketId) -> Self {
        self.socket = Some(socket);
        self
    }

    pub fn build(&self) -> Vec<String> {
        let profile = self.profile;
        let mut argv = vec![self.client.to_string()];

        push_values(&mut argv, profile, IDENTITY_OPTIONS);
        if let Some(password) = profile.get_secret(keys::PASSWORD) {
            push_pair(&mut argv, "-p", password);
        }
        push_values(&mut argv, profile, SESSION_OPTIONS);
        push_switches(&mut argv, profile, LEADING_SWITCHES);

        if let Some(folder) = profile.get_string(keys::SHARE_FOLDER) {
            push_pair(&mut argv, "-r", &format!("disk:share={folder}"));
        }

        self.push_display(&mut argv);

        let depth = profile.get_int(keys::COLOR_DEPTH, 0);
        if depth != 0 {
            push_pair(&mut argv, "-a", &depth.to_string());
        }
        if let Some(experience) = profile.get_string(keys::EXPERIENCE) {
            push_pair(&mut argv, "-x", experience);
        }
        // the client accepts repeated -r, so sound does not replace the share
        if let Some(sound) = profile.get_string(keys::SOUND) {
            push_pair(&mut argv, "-r", &format!("sound:{sound}"));
        }

        push_switches(&mut argv, profile, TRAILING_SWITCHES);

        if let Some(socket) = self.socket {
            push_pair(&mut argv, "-X", &socket.to_string());
        }
        if let Some(server) = profile.get_string(keys::SERVER) {
            argv.push(server.to_string());
        }
        argv
    }

    /// Fullscreen beats seamless, seamless beats an explicit geometry.
    fn push_display(&self, argv: &mut Vec<String>) {
        let profile = self.profile;
        if profile.get_bool(keys::FULLSCREEN, false) {
            argv.push("-f".into());
        } else if profile.get_bool(keys::SEAMLESS, false) {
            argv.push("-A".into());
        } else {
            let width = profile.get_int(keys::RESOLUTION_WIDTH, DEFAULT_WIDTH);
            let height = profile.get_int(keys::RESOLUTION_HEIGHT, DEFAULT_HEIGHT);
            push_pair(argv, "-g", &format!("{width}x{height}"));
        }
    }
}

fn push_pair(argv: &mut Vec<String>, flag: &str, value: &str) {
    argv.push(flag.to_string());
    argv.push(value.to_string());
}

fn push_values(argv: &mut Vec<String>, profile: &ConnectionProfile, options: &[(&str, &str)]) {
    for (key, flag) in options {
        if let Some(value) = profile.get_string(key) {
            push_pair(argv, flag, value);
        }
    }
}

fn push_switches(argv: &mut Vec<String>, profile: &ConnectionProfile, switches: &[(&str, &str)]) {
    argv.extend(
        switches
            .iter()
            .filter(|(key, _)| profile.get_bool(key, false))
            .map(|(_, flag)| flag.to_string()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_only() -> ConnectionProfile {
        let mut profile = ConnectionProfile::new();
        profile.set(keys::SERVER, "rdp.example.com");
        profile
    }

    fn count(argv: &[String], token: &str) -> usize {
        argv.iter().filter(|arg| *arg == token).count()
    }

    #[test]
    fn server_only_profile_gets_default_geometry() {
        let profile = server_only();
        let argv = ArgumentBuilder::new("rdesktop", &profile)
            .embed_into(SocketId(42))
            .build();
        assert_eq!(
            argv,
            ["rdesktop", "-g", "1024x768", "-X", "42", "rdp.example.com"]
        );
    }

    #[test]
    fn no_socket_means_no_embedding_flag() {
        let profile = server_only();
        let argv = ArgumentBuilder::new("rdesktop", &profile).build();
        assert_eq!(argv, ["rdesktop", "-g", "1024x768", "rdp.example.com"]);
    }

    #[test]
    fn fullscreen_suppresses_seamless_and_geometry() {
        let mut profile = server_only();
        profile
            .set(keys::FULLSCREEN, true)
            .set(keys::SEAMLESS, true)
            .set(keys::RESOLUTION_WIDTH, 1920_i64)
            .set(keys::RESOLUTION_HEIGHT, 1080_i64);
        let argv = ArgumentBuilder::new("rdesktop", &profile).build();

        assert_eq!(count(&argv, "-f"), 1);
        assert_eq!(count(&argv, "-A"), 0);
        assert_eq!(count(&argv, "-g"), 0);
        assert!(!argv.iter().any(|arg| arg == "1920x1080"));
    }

    #[test]
    fn seamless_without_fullscreen_drops_geometry() {
        let mut profile = server_only();
        profile
            .set(keys::FULLSCREEN, false)
            .set(keys::SEAMLESS, true)
            .set(keys::RESOLUTION_WIDTH, 1280_i64);
        let argv = ArgumentBuilder::new("rdesktop", &profile).build();

        assert_eq!(count(&argv, "-A"), 1);
        assert_eq!(count(&argv, "-g"), 0);
        assert_eq!(count(&argv, "-f"), 0);
    }

    #[test]
    fn explicit_resolution_is_used() {
        let mut profile = server_only();
        profile
            .set(keys::RESOLUTION_WIDTH, 1280_i64)
            .set(keys::RESOLUTION_HEIGHT, "1024");
        let argv = ArgumentBuilder::new("rdesktop", &profile).build();
        assert_eq!(argv, ["rdesktop", "-g", "1280x1024", "rdp.example.com"]);
    }

    #[test]
    fn hand_written_profile_resolution_reaches_geometry() {
        let profile = ConnectionProfile::from_toml_str(
            r#"
            name = "office"

            [settings]
            server = "rdp.example.com:3389"
            username = "alice"
            resolution_width = 1280
            resolution_height = 800
            "#,
        )
        .expect("profile should parse");
        let argv = ArgumentBuilder::new("rdesktop", &profile).build();
        assert_eq!(
            argv,
            ["rdesktop", "-u", "alice", "-g", "1280x800", "rdp.example.com:3389"]
        );
    }

    #[test]
    fn share_folder_and_sound_both_emit_r() {
        let mut profile = server_only();
        profile
            .set(keys::SHARE_FOLDER, "media")
            .set(keys::SOUND, "remote");
        let argv = ArgumentBuilder::new("rdesktop", &profile).build();

        assert_eq!(count(&argv, "-r"), 2);
        let share = argv.iter().position(|a| a == "disk:share=media").unwrap();
        let sound = argv.iter().position(|a| a == "sound:remote").unwrap();
        assert_eq!(argv[share - 1], "-r");
        assert_eq!(argv[sound - 1], "-r");
        assert!(share < sound);
    }

    #[test]
    fn zero_color_depth_is_omitted() {
        let mut profile = server_only();
        profile.set(keys::COLOR_DEPTH, 0_i64);
        let argv = ArgumentBuilder::new("rdesktop", &profile).build();
        assert_eq!(count(&argv, "-a"), 0);

        profile.set(keys::COLOR_DEPTH, "16");
        let argv = ArgumentBuilder::new("rdesktop", &profile).build();
        let at = argv.iter().position(|a| a == "-a").unwrap();
        assert_eq!(argv[at + 1], "16");
    }

    #[test]
    fn full_profile_keeps_client_order() {
        let mut profile = server_only();
        profile
            .set(keys::USERNAME, "alice")
            .set(keys::DOMAIN, "CORP")
            .set(keys::CLIENT_NAME, "laptop")
            .set(keys::EXEC, "notepad.exe")
            .set(keys::EXEC_PATH, "C:\\Windows")
            .set(keys::TITLE, "Office")
            .set(keys::KEYMAP, "de-ch")
            .set(keys::CONSOLE, true)
            .set(keys::COMPRESSION, true)
            .set(keys::BITMAP_CACHING, true)
            .set(keys::COLOR_DEPTH, 24_i64)
            .set(keys::EXPERIENCE, "0x8F")
            .set(keys::HIDE_DECORATIONS, true)
            .set(keys::NO_GRAB_KEYBOARD, true)
            .set(keys::NO_ENCRYPTION, true)
            .set(keys::SYNC_NUMLOCK, true)
            .set(keys::RDP4, true)
            .set(keys::RDP5, true)
            .set(keys::NO_MOUSE_MOTION, true)
            .set_secret(keys::PASSWORD, "s3cret");

        let argv = ArgumentBuilder::new("rdesktop", &profile)
            .embed_into(SocketId(7))
            .build();

        let expected = [
            "rdesktop", "-u", "alice", "-d", "CORP", "-p", "s3cret", "-n", "laptop", "-s",
            "notepad.exe", "-c", "C:\\Windows", "-T", "Office", "-k", "de-ch", "-0", "-z", "-P",
            "-g", "1024x768", "-a", "24", "-x", "0x8F", "-D", "-K", "-E", "-N", "-4", "-5", "-m",
            "-X", "7", "rdp.example.com",
        ];
        assert_eq!(argv, expected);
    }

    #[test]
    fn empty_values_are_skipped() {
        let mut profile = server_only();
        profile
            .set(keys::USERNAME, "")
            .set(keys::SOUND, "")
            .set(keys::CONSOLE, false);
        let argv = ArgumentBuilder::new("rdesktop", &profile).build();
        assert_eq!(argv, ["rdesktop", "-g", "1024x768", "rdp.example.com"]);
    }

    #[test]
    fn configured_client_name_leads() {
        let profile = server_only();
        let argv = ArgumentBuilder::new("/opt/bin/rdesktop", &profile).build();
        assert_eq!(argv.first().map(String::as_str), Some("/opt/bin/rdesktop"));
        assert_eq!(argv.last().map(String::as_str), Some("rdp.example.com"));
    }
}
