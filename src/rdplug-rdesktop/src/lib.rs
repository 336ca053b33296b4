//! rdesktop protocol plugin.
//!
//! Translates a stored connection profile into an `rdesktop` command line,
//! launches the client and bridges its window lifecycle to the host:
//!
//! - [`ArgumentBuilder`] maps profile options to client flags
//! - [`ProcessLauncher`] spawns the client without waiting for it
//! - [`RdesktopSession`] turns plug-added / plug-removed / close into host
//!   signals
//!
//! # Usage
//!
//! ```rust,ignore
//! use rdplug_rdesktop::plugin_entry;
//!
//! // `service` is the host's Arc<dyn PluginService>
//! if !plugin_entry(service, config.launcher.clone()) {
//!     tracing::warn!("rdesktop plugin not available");
//! }
//! ```

mod args;
mod launcher;
mod plugin;
mod session;
pub mod settings;

pub use args::{ArgumentBuilder, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use launcher::{LaunchError, ProcessLauncher, SpawnedClient};
pub use plugin::{plugin_entry, RdesktopPlugin, PLUGIN_NAME};
pub use session::{LifecycleState, RdesktopSession};
