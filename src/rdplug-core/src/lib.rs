pub mod config;
pub mod logging;
pub mod paths;
pub mod plugin;
pub mod plugin_contract;
pub mod profile;
pub mod redact;
pub mod secrets;

pub use config::{Config, ConfigError, LauncherConfig, LogLevel, LoggingConfig, ValidationError};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use paths::{AppDirs, DirsError};
pub use plugin::{
    EmbeddingSurface, PluginInfo, PluginService, ProtocolPlugin, ProtocolSession, ProtocolWidget,
    SessionId, Signal, SocketId, SurfaceEvent,
};
pub use profile::{ConnectionProfile, ProfileError, ProfileValue};

pub const APP_NAME: &str = "rdplug";
pub const APP_AUTHOR: &str = "rdplug";
pub const APP_QUALIFIER: &str = "org";
