use crate::session::RdesktopSession;
use crate::settings::{ADVANCED_SETTINGS, BASIC_SETTINGS};
use rdplug_core::plugin::{
    PluginInfo, PluginKind, PluginService, ProtocolPlugin, ProtocolSession, ProtocolSetting,
    ProtocolWidget,
};
use rdplug_core::LauncherConfig;
use std::sync::Arc;

pub const PLUGIN_NAME: &str = "RDESKTOP";

static INFO: PluginInfo = PluginInfo {
    kind: PluginKind::Protocol,
    name: PLUGIN_NAME,
    description: "RDP - Remote Desktop Protocol (rdesktop)",
    version: env!("CARGO_PKG_VERSION"),
    icon: "remmina-rdp",
};

/// Protocol plugin that runs connections through the external `rdesktop`
/// client.
pub struct RdesktopPlugin {
    service: Arc<dyn PluginService>,
    launcher: LauncherConfig,
}

impl RdesktopPlugin {
    pub fn new(service: Arc<dyn PluginService>, launcher: LauncherConfig) -> Self {
        Self { service, launcher }
    }

    /// Start a session with the concrete session type, for hosts that want
    /// to inspect its state.
    pub fn init_session(&self, widget: &ProtocolWidget) -> RdesktopSession {
        RdesktopSession::init(self.service.clone(), self.launcher.clone(), widget)
    }
}

impl ProtocolPlugin for RdesktopPlugin {
    fn info(&self) -> &PluginInfo {
        &INFO
    }

    fn basic_settings(&self) -> &'static [ProtocolSetting] {
        BASIC_SETTINGS
    }

    fn advanced_settings(&self) -> &'static [ProtocolSetting] {
        ADVANCED_SETTINGS
    }

    fn init(&self, widget: &ProtocolWidget) -> Box<dyn ProtocolSession> {
        Box::new(self.init_session(widget))
    }
}

/// Register the rdesktop plugin with the host. Returns the host's verdict.
pub fn plugin_entry(service: Arc<dyn PluginService>, launcher: LauncherConfig) -> bool {
    let plugin = Arc::new(RdesktopPlugin::new(service.clone(), launcher));
    let registered = service.register_plugin(plugin);
    if registered {
        tracing::info!(plugin = PLUGIN_NAME, version = INFO.version, "plugin registered");
    } else {
        tracing::warn!(plugin = PLUGIN_NAME, "host refused plugin registration");
    }
    registered
}
