mod host;

use anyhow::Result;
use clap::{Parser, Subcommand};
use host::ConsoleHost;
use rdplug_core::plugin::{
    ProtocolPlugin, ProtocolSession, ProtocolSetting, ProtocolWidget, SessionId, SocketId,
};
use rdplug_core::redact::display_argv;
use rdplug_core::secrets::CredentialStore;
use rdplug_core::{init_logging, AppDirs, Config, ConnectionProfile};
use rdplug_rdesktop::{ArgumentBuilder, PLUGIN_NAME};
use serde::Serialize;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "rdplug", version, about = "Launch RDP sessions through rdesktop")]
struct Cli {
    /// Config file override (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the rdesktop command line a profile would produce
    Args(ArgsCommand),
    /// Print the connection settings schema
    Settings {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Launch a profile through the rdesktop plugin
    Connect(ConnectCommand),
    /// Manage profile passwords in the OS keyring
    #[command(subcommand)]
    Password(PasswordCommand),
}

#[derive(Debug, Parser)]
struct ArgsCommand {
    /// Profile file, or a profile name under the profiles directory
    profile: String,
    /// Window id to embed into (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_window_id)]
    socket_id: Option<u64>,
    /// Print the password instead of redacting it
    #[arg(long)]
    show_password: bool,
}

#[derive(Debug, Parser)]
struct ConnectCommand {
    /// Profile file, or a profile name under the profiles directory
    profile: String,
    /// Existing X window id to embed the client into (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_window_id)]
    socket_id: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum PasswordCommand {
    /// Store a password read from stdin
    Set { profile: String },
    /// Remove a stored password
    Clear { profile: String },
}

/// X tools print window ids in hex (`0x3a00001`); accept that as well as decimal.
fn parse_window_id(value: &str) -> Result<u64, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|err| format!("not a window id: {err}"))
}

#[derive(Debug, Error)]
enum CliError {
    #[error("profile {0} requests an embedded window; pass --socket-id or set detached = true")]
    MissingSocket(String),
    #[error("no password given on stdin")]
    EmptyPassword,
    #[error("host did not accept the {0} plugin")]
    PluginUnavailable(&'static str),
    #[error("{0}")]
    Launch(String),
}

#[derive(Serialize)]
struct SettingsSchema<'a> {
    plugin: &'a rdplug_core::PluginInfo,
    basic: &'a [ProtocolSetting],
    advanced: &'a [ProtocolSetting],
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&dirs)?,
    };
    let _logging = init_logging(&config.logging, &dirs)?;

    match cli.command {
        Command::Args(cmd) => {
            let profile = load_profile(&dirs, &cmd.profile)?;
            let mut builder = ArgumentBuilder::new(&config.launcher.client, &profile);
            if let Some(socket) = cmd.socket_id {
                builder = builder.embed_into(SocketId(socket));
            }
            let argv = builder.build();
            if cmd.show_password {
                println!("{}", argv.join(" "));
            } else {
                println!("{}", display_argv(&argv));
            }
        }
        Command::Settings { json } => print_settings(json)?,
        Command::Connect(cmd) => connect(&config, &dirs, &cmd)?,
        Command::Password(PasswordCommand::Set { profile }) => {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            let password = line.trim_end_matches(['\r', '\n']);
            if password.is_empty() {
                return Err(CliError::EmptyPassword.into());
            }
            CredentialStore::new().store_password(&profile, password)?;
            println!("Password stored for profile '{profile}'");
        }
        Command::Password(PasswordCommand::Clear { profile }) => {
            CredentialStore::new().delete_password(&profile)?;
            println!("Password cleared for profile '{profile}'");
        }
    }

    Ok(())
}

/// Load a profile and attach its keyring password, if one is stored.
fn load_profile(dirs: &AppDirs, name_or_path: &str) -> Result<ConnectionProfile> {
    let path = dirs.profile_path(name_or_path);
    let mut profile = ConnectionProfile::load(&path)?;
    let key = profile.name.clone().unwrap_or_else(|| profile_stem(&path));

    match CredentialStore::new().find_password(&key) {
        Ok(Some(password)) => {
            profile.set_secret("password", password);
        }
        Ok(None) => {}
        Err(err) => tracing::warn!(profile = %key, error = %err, "keyring lookup failed"),
    }
    tracing::debug!(path = %path.display(), ?profile, "loaded profile");
    Ok(profile)
}

fn profile_stem(path: &std::path::Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn connect(config: &Config, dirs: &AppDirs, cmd: &ConnectCommand) -> Result<()> {
    let profile = load_profile(dirs, &cmd.profile)?;
    let detached = profile.get_bool("detached", false);
    if !detached && cmd.socket_id.is_none() {
        return Err(CliError::MissingSocket(cmd.profile.clone()).into());
    }

    let host = ConsoleHost::new(cmd.socket_id.map(SocketId));
    if !rdplug_rdesktop::plugin_entry(Arc::new(host.clone()), config.launcher.clone()) {
        return Err(CliError::PluginUnavailable(PLUGIN_NAME).into());
    }
    let plugin = host
        .plugin(PLUGIN_NAME)
        .ok_or(CliError::PluginUnavailable(PLUGIN_NAME))?;

    let widget = ProtocolWidget::new(SessionId(1), profile);
    let mut session = plugin.init(&widget);
    let attached = session.open_connection(&widget);
    if let Some(message) = host.take_error(widget.id()) {
        session.close_connection(&widget);
        return Err(CliError::Launch(message).into());
    }

    match cmd.socket_id {
        Some(socket) if attached => println!("rdesktop started, embedding into window {socket}"),
        _ => println!("rdesktop started in its own window"),
    }
    Ok(())
}

fn print_settings(json: bool) -> Result<()> {
    let host = ConsoleHost::new(None);
    rdplug_rdesktop::plugin_entry(Arc::new(host.clone()), Default::default());
    let plugin = host
        .plugin(PLUGIN_NAME)
        .ok_or(CliError::PluginUnavailable(PLUGIN_NAME))?;

    if json {
        let schema = SettingsSchema {
            plugin: plugin.info(),
            basic: plugin.basic_settings(),
            advanced: plugin.advanced_settings(),
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let info = plugin.info();
    println!("{} {} - {}", info.name, info.version, info.description);
    println!("\nBasic:");
    print_setting_rows(plugin.basic_settings());
    println!("\nAdvanced:");
    print_setting_rows(plugin.advanced_settings());
    Ok(())
}

fn print_setting_rows(list: &[ProtocolSetting]) {
    for setting in list {
        println!("  {}", describe_setting(setting));
    }
}

fn describe_setting(setting: &ProtocolSetting) -> String {
    use rdplug_core::plugin::{SettingType, SettingValues};

    let keys = setting.profile_keys();
    let key = if keys.is_empty() {
        "-".to_string()
    } else {
        keys.join(",")
    };
    let label = setting.label.unwrap_or("");
    let mut line = format!("{key:<20} {:<11} {label}", format!("{:?}", setting.kind));
    if setting.kind == SettingType::Check {
        line.push_str(if setting.default { " [on]" } else { " [off]" });
    }
    match setting.values {
        SettingValues::Select(values) => {
            let shown: Vec<_> = values
                .iter()
                .map(|(value, _)| if value.is_empty() { "\"\"" } else { *value })
                .collect();
            line.push_str(&format!(" ({})", shown.join(", ")));
        }
        SettingValues::Combo(values) => {
            line.push_str(&format!(" ({} choices)", values.len()));
        }
        SettingValues::None => {}
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rdplug_rdesktop::settings;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn args_command_parses_socket() {
        let cli = Cli::try_parse_from(["rdplug", "args", "office", "--socket-id", "42"])
            .expect("args should parse");
        match cli.command {
            Command::Args(cmd) => {
                assert_eq!(cmd.profile, "office");
                assert_eq!(cmd.socket_id, Some(42));
                assert!(!cmd.show_password);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn socket_id_accepts_hex_and_decimal() {
        for (raw, expected) in [("0x3a00001", 0x3a00001), ("60817409", 60817409)] {
            let cli = Cli::try_parse_from(["rdplug", "connect", "office", "--socket-id", raw])
                .expect("connect should parse");
            match cli.command {
                Command::Connect(cmd) => assert_eq!(cmd.socket_id, Some(expected), "{raw}"),
                other => panic!("unexpected command {other:?}"),
            }
        }

        let cli = Cli::try_parse_from(["rdplug", "args", "office", "--socket-id", "0x3a00001"])
            .expect("args should parse hex");
        assert!(matches!(cli.command, Command::Args(cmd) if cmd.socket_id == Some(0x3a00001)));

        assert!(Cli::try_parse_from(["rdplug", "args", "office", "--socket-id", "0xzz"]).is_err());
    }

    #[test]
    fn resolution_row_lists_both_keys() {
        let resolution = settings::BASIC_SETTINGS
            .iter()
            .find(|s| s.kind == rdplug_core::plugin::SettingType::Resolution)
            .unwrap();
        assert!(describe_setting(resolution).starts_with("resolution_width,resolution_height"));
    }

    #[test]
    fn check_rows_show_defaults() {
        let fullscreen = settings::ADVANCED_SETTINGS
            .iter()
            .find(|s| s.key == Some("fullscreen"))
            .unwrap();
        let row = describe_setting(fullscreen);
        assert!(row.starts_with("fullscreen"));
        assert!(row.ends_with("[on]"));
    }

    #[test]
    fn select_rows_list_values() {
        let sound = settings::BASIC_SETTINGS
            .iter()
            .find(|s| s.key == Some("sound"))
            .unwrap();
        let row = describe_setting(sound);
        assert!(row.contains("local,44100,2"));
        assert!(row.contains("remote"));
    }

    #[test]
    fn profile_stem_falls_back_to_file_name() {
        assert_eq!(profile_stem(std::path::Path::new("/tmp/office.toml")), "office");
    }
}
