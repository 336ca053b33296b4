//! Headless host: just enough of a connection manager to drive a protocol
//! plugin from the command line.

use rdplug_core::plugin::{
    EmbeddingSurface, PluginService, ProtocolPlugin, SessionId, Signal, SocketId, SurfaceEvent,
};
use std::sync::{Arc, Mutex};

/// Stands in for a toolkit socket by reusing a window id obtained elsewhere
/// (for example from `xwininfo`).
struct ForeignWindow {
    socket: SocketId,
}

impl EmbeddingSurface for ForeignWindow {
    fn socket_id(&self) -> SocketId {
        self.socket
    }

    fn show(&mut self) {}

    fn subscribe(&mut self, event: SurfaceEvent) {
        // nothing reparents into a foreign window on our behalf
        tracing::debug!(socket = %self.socket, event = event.as_str(), "surface event not observable");
    }
}

#[derive(Default)]
struct HostState {
    plugins: Vec<Arc<dyn ProtocolPlugin>>,
    errors: Vec<(SessionId, String)>,
}

#[derive(Clone, Default)]
pub struct ConsoleHost {
    socket: Option<SocketId>,
    state: Arc<Mutex<HostState>>,
}

impl ConsoleHost {
    pub fn new(socket: Option<SocketId>) -> Self {
        Self {
            socket,
            state: Arc::default(),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut HostState) -> T) -> T {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    pub fn plugin(&self, name: &str) -> Option<Arc<dyn ProtocolPlugin>> {
        self.with_state(|state| {
            state
                .plugins
                .iter()
                .find(|plugin| plugin.info().name == name)
                .cloned()
        })
    }

    pub fn take_error(&self, session: SessionId) -> Option<String> {
        self.with_state(|state| {
            let index = state.errors.iter().position(|(id, _)| *id == session)?;
            Some(state.errors.remove(index).1)
        })
    }
}

impl PluginService for ConsoleHost {
    fn register_plugin(&self, plugin: Arc<dyn ProtocolPlugin>) -> bool {
        let name = plugin.info().name;
        self.with_state(|state| {
            if state.plugins.iter().any(|p| p.info().name == name) {
                tracing::warn!(plugin = name, "plugin already registered");
                return false;
            }
            state.plugins.push(plugin);
            true
        })
    }

    fn create_surface(&self, session: SessionId) -> Box<dyn EmbeddingSurface> {
        let socket = self.socket.unwrap_or(SocketId(0));
        tracing::debug!(session = %session, socket = %socket, "embedding into foreign window");
        Box::new(ForeignWindow { socket })
    }

    fn register_hostkey(&self, session: SessionId, surface: &dyn EmbeddingSurface) {
        tracing::trace!(session = %session, socket = %surface.socket_id(), "hostkey target");
    }

    fn set_size(&self, session: SessionId, width: u32, height: u32) {
        tracing::debug!(session = %session, width, height, "size request");
    }

    fn emit_signal(&self, session: SessionId, signal: Signal) {
        tracing::info!(session = %session, signal = signal.as_str(), "plugin signal");
    }

    fn request_close(&self, session: SessionId) {
        tracing::info!(session = %session, "plugin requested close");
    }

    fn set_error(&self, session: SessionId, message: &str) {
        self.with_state(|state| state.errors.push((session, message.to_string())));
    }
}
