//! Per-connection lifecycle: from widget init through the embedded client's
//! plug events to host teardown.

use crate::args::{keys, ArgumentBuilder};
use crate::launcher::{ProcessLauncher, SpawnedClient};
use rdplug_core::plugin::{
    EmbeddingSurface, PluginService, ProtocolFeature, ProtocolSession, ProtocolWidget, Signal,
    SocketId, SurfaceEvent,
};
use rdplug_core::LauncherConfig;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Initialized,
    Connecting,
    Connected,
    Closed,
}

/// Plugin data attached to one connection widget.
pub struct RdesktopSession {
    service: Arc<dyn PluginService>,
    launcher_config: LauncherConfig,
    launcher: ProcessLauncher,
    surface: Option<Box<dyn EmbeddingSurface>>,
    socket_id: Option<SocketId>,
    client: Option<SpawnedClient>,
    ready: bool,
    disconnected: bool,
    state: LifecycleState,
}

impl RdesktopSession {
    /// Create the session for `widget`. Embedded sessions get a surface that
    /// is registered for host keys and subscribed to plug events; detached
    /// sessions get none.
    pub(crate) fn init(
        service: Arc<dyn PluginService>,
        launcher_config: LauncherConfig,
        widget: &ProtocolWidget,
    ) -> Self {
        let mut session = Self {
            service,
            launcher_config,
            launcher: ProcessLauncher::new(),
            surface: None,
            socket_id: None,
            client: None,
            ready: false,
            disconnected: false,
            state: LifecycleState::Created,
        };

        let detached = widget.profile().get_bool(keys::DETACHED, false);
        tracing::debug!(session = %widget.id(), detached, "initializing session");

        if !detached {
            let mut surface = session.service.create_surface(widget.id());
            session.service.register_hostkey(widget.id(), &*surface);
            surface.show();
            surface.subscribe(SurfaceEvent::PlugAdded);
            surface.subscribe(SurfaceEvent::PlugRemoved);
            session.surface = Some(surface);
        }

        session.state = LifecycleState::Initialized;
        session
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether the client window has been plugged into the surface.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn socket_id(&self) -> Option<SocketId> {
        self.socket_id
    }

    pub fn client_pid(&self) -> Option<u32> {
        self.client.as_ref().map(SpawnedClient::id)
    }

    fn on_plug_added(&mut self, widget: &ProtocolWidget) {
        if self.state != LifecycleState::Connecting {
            tracing::debug!(session = %widget.id(), state = ?self.state, "ignoring plug-added");
            return;
        }
        tracing::info!(
            session = %widget.id(),
            socket = ?self.socket_id,
            "client window plugged in"
        );
        self.ready = true;
        self.state = LifecycleState::Connected;
        self.service.emit_signal(widget.id(), Signal::Connect);
    }

    fn on_plug_removed(&mut self, widget: &ProtocolWidget) {
        if matches!(
            self.state,
            LifecycleState::Closed | LifecycleState::Created | LifecycleState::Initialized
        ) {
            tracing::debug!(session = %widget.id(), state = ?self.state, "ignoring plug-removed");
            return;
        }
        tracing::info!(session = %widget.id(), "client window removed, requesting close");
        self.ready = false;
        self.state = LifecycleState::Closed;
        self.service.request_close(widget.id());
    }
}

impl ProtocolSession for RdesktopSession {
    fn open_connection(&mut self, widget: &ProtocolWidget) -> bool {
        let id = widget.id();
        let profile = widget.profile();
        let detached = profile.get_bool(keys::DETACHED, false);

        let mut builder = ArgumentBuilder::new(&self.launcher_config.client, profile);
        if !detached {
            let (width, height) = (
                self.launcher_config.initial_width,
                self.launcher_config.initial_height,
            );
            self.service.set_size(id, width, height);
            if let Some(surface) = &self.surface {
                let socket = surface.socket_id();
                self.socket_id = Some(socket);
                builder = builder.embed_into(socket);
            } else {
                tracing::warn!(session = %id, "embedded session has no surface");
            }
        }

        self.state = LifecycleState::Connecting;
        let argv = builder.build();
        match self.launcher.launch(&argv) {
            Ok(client) => {
                tracing::info!(session = %id, pid = client.id(), detached, "rdesktop started");
                self.client = Some(client);
            }
            Err(err) => {
                tracing::error!(session = %id, error = %err, "failed to start rdesktop");
                self.service.set_error(id, &err.to_string());
            }
        }

        if detached {
            return false;
        }
        tracing::debug!(session = %id, socket = ?self.socket_id, "waiting for client window");
        true
    }

    fn close_connection(&mut self, widget: &ProtocolWidget) -> bool {
        let id = widget.id();
        self.state = LifecycleState::Closed;
        self.ready = false;
        if self.disconnected {
            tracing::debug!(session = %id, "session already disconnected");
            return false;
        }
        self.disconnected = true;

        // the client is left to exit on its own once its window is gone
        if let Some(client) = self.client.as_mut() {
            tracing::debug!(
                session = %id,
                pid = client.id(),
                running = client.is_running(),
                "closing connection"
            );
        }
        self.service.emit_signal(id, Signal::Disconnect);
        false
    }

    fn query_feature(&self, widget: &ProtocolWidget, feature: &ProtocolFeature) -> bool {
        tracing::trace!(session = %widget.id(), feature = ?feature.kind, "query_feature");
        false
    }

    fn call_feature(&mut self, widget: &ProtocolWidget, feature: &ProtocolFeature) {
        tracing::trace!(session = %widget.id(), feature = ?feature.kind, "call_feature");
    }

    fn surface_event(&mut self, widget: &ProtocolWidget, event: SurfaceEvent) {
        match event {
            SurfaceEvent::PlugAdded => self.on_plug_added(widget),
            SurfaceEvent::PlugRemoved => self.on_plug_removed(widget),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdplug_core::plugin::{FeatureKind, SessionId};
    use rdplug_core::plugin_contract::{HostCall, RecordingService};
    use rdplug_core::ConnectionProfile;

    fn widget(detached: bool) -> ProtocolWidget {
        let mut profile = ConnectionProfile::named("test");
        profile
            .set(keys::SERVER, "rdp.example.com")
            .set(keys::DETACHED, detached);
        ProtocolWidget::new(SessionId(1), profile)
    }

    fn launcher_config(client: &str) -> LauncherConfig {
        LauncherConfig {
            client: client.to_string(),
            ..LauncherConfig::default()
        }
    }

    fn session_for(
        service: &RecordingService,
        client: &str,
        widget: &ProtocolWidget,
    ) -> RdesktopSession {
        RdesktopSession::init(Arc::new(service.clone()), launcher_config(client), widget)
    }

    #[test]
    fn init_wires_surface_for_embedded_sessions() {
        let service = RecordingService::with_socket_base(40);
        let widget = widget(false);
        let session = session_for(&service, "true", &widget);

        assert_eq!(session.state(), LifecycleState::Initialized);
        let socket = SocketId(41);
        assert_eq!(
            service.calls(),
            vec![
                HostCall::CreateSurface {
                    session: SessionId(1),
                    socket
                },
                HostCall::RegisterHostkey {
                    session: SessionId(1),
                    socket
                },
                HostCall::SurfaceShown { socket },
                HostCall::Subscribe {
                    socket,
                    event: SurfaceEvent::PlugAdded
                },
                HostCall::Subscribe {
                    socket,
                    event: SurfaceEvent::PlugRemoved
                },
            ]
        );
    }

    #[test]
    fn detached_session_creates_no_surface() {
        let service = RecordingService::new();
        let widget = widget(true);
        let session = session_for(&service, "true", &widget);

        assert_eq!(session.state(), LifecycleState::Initialized);
        assert!(service.surfaces_created(SessionId(1)).is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn detached_open_reports_not_attached() {
        let service = RecordingService::new();
        let widget = widget(true);
        let mut session = session_for(&service, "true", &widget);

        assert!(!session.open_connection(&widget));
        assert_eq!(session.state(), LifecycleState::Connecting);
        assert_eq!(session.socket_id(), None);
        assert!(session.client_pid().is_some());
        assert!(service.errors(SessionId(1)).is_empty());
        assert!(!service
            .calls()
            .iter()
            .any(|call| matches!(call, HostCall::SetSize { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn embedded_open_requests_initial_size_and_binds_socket() {
        let service = RecordingService::with_socket_base(9);
        let widget = widget(false);
        let mut session = session_for(&service, "true", &widget);

        assert!(session.open_connection(&widget));
        assert_eq!(session.socket_id(), Some(SocketId(10)));
        assert!(service.calls().contains(&HostCall::SetSize {
            session: SessionId(1),
            width: 640,
            height: 480
        }));
    }

    #[test]
    fn spawn_failure_reports_once_and_keeps_return_contract() {
        for detached in [false, true] {
            let service = RecordingService::new();
            let widget = widget(detached);
            let mut session = session_for(&service, "rdplug-missing-rdesktop", &widget);

            assert_eq!(session.open_connection(&widget), !detached);
            let errors = service.errors(SessionId(1));
            assert_eq!(errors.len(), 1, "detached={detached}");
            assert!(!errors[0].is_empty());
            assert_eq!(session.client_pid(), None);
        }
    }

    #[test]
    fn plug_events_signal_once() {
        let service = RecordingService::new();
        let widget = widget(false);
        let mut session = session_for(&service, "rdplug-missing-rdesktop", &widget);
        session.open_connection(&widget);

        session.surface_event(&widget, SurfaceEvent::PlugAdded);
        assert!(session.is_ready());
        assert_eq!(session.state(), LifecycleState::Connected);
        session.surface_event(&widget, SurfaceEvent::PlugAdded);
        assert_eq!(service.signals(SessionId(1)), vec![Signal::Connect]);

        session.surface_event(&widget, SurfaceEvent::PlugRemoved);
        session.surface_event(&widget, SurfaceEvent::PlugRemoved);
        assert_eq!(service.close_requests(SessionId(1)), 1);
        assert_eq!(session.state(), LifecycleState::Closed);
        assert!(!session.is_ready());
    }

    #[test]
    fn plug_events_before_open_are_ignored() {
        let service = RecordingService::new();
        let widget = widget(false);
        let mut session = session_for(&service, "true", &widget);

        session.surface_event(&widget, SurfaceEvent::PlugAdded);
        session.surface_event(&widget, SurfaceEvent::PlugRemoved);
        assert!(service.signals(SessionId(1)).is_empty());
        assert_eq!(service.close_requests(SessionId(1)), 0);
        assert_eq!(session.state(), LifecycleState::Initialized);
    }

    #[test]
    fn close_emits_disconnect_once_and_does_not_propagate() {
        let service = RecordingService::new();
        let widget = widget(false);
        let mut session = session_for(&service, "true", &widget);

        assert!(!session.close_connection(&widget));
        assert!(!session.close_connection(&widget));
        assert_eq!(service.signals(SessionId(1)), vec![Signal::Disconnect]);
        assert_eq!(session.state(), LifecycleState::Closed);

        session.surface_event(&widget, SurfaceEvent::PlugAdded);
        assert_eq!(service.signals(SessionId(1)), vec![Signal::Disconnect]);
    }

    #[test]
    fn features_are_unsupported() {
        let service = RecordingService::new();
        let widget = widget(false);
        let mut session = session_for(&service, "true", &widget);
        let feature = ProtocolFeature {
            kind: FeatureKind::Scale,
            id: 3,
        };

        assert!(!session.query_feature(&widget, &feature));
        let before = service.calls().len();
        session.call_feature(&widget, &feature);
        assert_eq!(service.calls().len(), before);
    }
}
