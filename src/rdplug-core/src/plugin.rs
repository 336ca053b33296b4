//! Host-facing protocol plugin contract.
//!
//! The host owns the connection widgets and the windowing layer; plugins only
//! see them through [`PluginService`] (injected at construction) and the
//! [`ProtocolWidget`] handed to each lifecycle call.

use crate::profile::ConnectionProfile;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Identifies one connection widget inside the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque window id of an embedding surface, assigned by the windowing layer
/// once the surface is realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SocketId(pub u64);

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events an embedding surface can deliver to its subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceEvent {
    /// A foreign window was reparented into the surface.
    PlugAdded,
    /// The embedded window went away.
    PlugRemoved,
}

impl SurfaceEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceEvent::PlugAdded => "plug-added",
            SurfaceEvent::PlugRemoved => "plug-removed",
        }
    }
}

/// Signals a plugin raises on the host's signal bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Connect,
    Disconnect,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Connect => "connect",
            Signal::Disconnect => "disconnect",
        }
    }
}

/// Window-embedding primitive provided by the host's toolkit.
pub trait EmbeddingSurface: Send {
    fn socket_id(&self) -> SocketId;

    fn show(&mut self);

    /// Ask the host to route `event` for this surface to the owning session.
    fn subscribe(&mut self, event: SurfaceEvent);
}

/// Services the host exposes to plugins.
pub trait PluginService: Send + Sync {
    /// Hand a plugin over to the host's registry.
    fn register_plugin(&self, plugin: Arc<dyn ProtocolPlugin>) -> bool;

    fn create_surface(&self, session: SessionId) -> Box<dyn EmbeddingSurface>;

    /// Make `surface` the target for host key handling of this session.
    fn register_hostkey(&self, session: SessionId, surface: &dyn EmbeddingSurface);

    fn set_size(&self, session: SessionId, width: u32, height: u32);

    fn emit_signal(&self, session: SessionId, signal: Signal);

    /// Ask the host to tear down the connection widget.
    fn request_close(&self, session: SessionId);

    /// Store a user-facing error message for this session.
    fn set_error(&self, session: SessionId, message: &str);
}

/// Host-owned connection widget as seen by a plugin.
#[derive(Debug, Clone)]
pub struct ProtocolWidget {
    id: SessionId,
    profile: ConnectionProfile,
}

impl ProtocolWidget {
    pub fn new(id: SessionId, profile: ConnectionProfile) -> Self {
        Self { id, profile }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Protocol,
}

/// Descriptive metadata shown by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub kind: PluginKind,
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SettingType {
    Server,
    Text,
    Password,
    Check,
    Select,
    Combo,
    Folder,
    Resolution,
}

/// Allowed values of a setting, if it has a fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingValues {
    None,
    /// `(stored value, label)` pairs.
    Select(&'static [(&'static str, &'static str)]),
    /// Suggested values; free text is also accepted.
    Combo(&'static [&'static str]),
}

/// One entry of a plugin's settings dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProtocolSetting {
    pub kind: SettingType,
    /// Profile key; `None` for composite host widgets (server, password,
    /// resolution) that use well-known keys.
    pub key: Option<&'static str>,
    pub label: Option<&'static str>,
    /// Initial state of check boxes; ignored for other kinds.
    pub default: bool,
    pub values: SettingValues,
}

impl ProtocolSetting {
    /// The profile keys this setting writes to. Resolution is stored as a
    /// width and height pair.
    pub fn profile_keys(&self) -> &[&'static str] {
        match (self.kind, &self.key) {
            (_, Some(key)) => std::slice::from_ref(key),
            (SettingType::Server, None) => &["server"],
            (SettingType::Password, None) => &["password"],
            (SettingType::Resolution, None) => &["resolution_width", "resolution_height"],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Pref,
    Tool,
    Unfocus,
    Scale,
}

/// A host-defined optional capability a plugin may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtocolFeature {
    pub kind: FeatureKind,
    pub id: u32,
}

/// Protocol plugin registered with the host.
pub trait ProtocolPlugin: Send + Sync {
    fn info(&self) -> &PluginInfo;

    fn basic_settings(&self) -> &'static [ProtocolSetting];

    fn advanced_settings(&self) -> &'static [ProtocolSetting];

    /// Prepare a new connection widget. The returned session is owned by the
    /// host for the widget's lifetime.
    fn init(&self, widget: &ProtocolWidget) -> Box<dyn ProtocolSession>;
}

/// Per-widget lifecycle driven by the host's event loop.
pub trait ProtocolSession: Send {
    /// Start connecting. `true` means the host should wait for further
    /// surface events; `false` means the connection runs on its own.
    fn open_connection(&mut self, widget: &ProtocolWidget) -> bool;

    /// Host teardown. The return value tells the host whether to propagate
    /// the close further.
    fn close_connection(&mut self, widget: &ProtocolWidget) -> bool;

    fn query_feature(&self, widget: &ProtocolWidget, feature: &ProtocolFeature) -> bool;

    fn call_feature(&mut self, widget: &ProtocolWidget, feature: &ProtocolFeature);

    /// Delivery point for events the session subscribed to on its surface.
    fn surface_event(&mut self, widget: &ProtocolWidget, event: SurfaceEvent);
}
