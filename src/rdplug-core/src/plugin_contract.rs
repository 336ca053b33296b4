//! Shared lifecycle contract for protocol plugins.
//!
//! [`RecordingService`] is an in-memory host that records every call a
//! plugin makes; [`run_protocol_contract`] drives a plugin through a full
//! embedded session against it and checks the host-visible effects.

use crate::plugin::{
    EmbeddingSurface, FeatureKind, PluginService, ProtocolFeature, ProtocolPlugin, ProtocolWidget,
    SessionId, Signal, SocketId, SurfaceEvent,
};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// One observable host call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    RegisterPlugin { name: String },
    CreateSurface { session: SessionId, socket: SocketId },
    RegisterHostkey { session: SessionId, socket: SocketId },
    SetSize { session: SessionId, width: u32, height: u32 },
    Signal { session: SessionId, signal: Signal },
    RequestClose { session: SessionId },
    SetError { session: SessionId, message: String },
    SurfaceShown { socket: SocketId },
    Subscribe { socket: SocketId, event: SurfaceEvent },
}

#[derive(Default)]
struct Recorded {
    calls: Vec<HostCall>,
    plugins: Vec<Arc<dyn ProtocolPlugin>>,
    next_socket: u64,
}

/// In-memory [`PluginService`] that hands out sequential socket ids.
#[derive(Clone, Default)]
pub struct RecordingService {
    inner: Arc<Mutex<Recorded>>,
}

impl std::fmt::Debug for Recorded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorded")
            .field("calls", &self.calls)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

impl std::fmt::Debug for RecordingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RecordingService").field(&self.inner).finish()
    }
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Socket ids start after `base`, so tests can tell them apart.
    pub fn with_socket_base(base: u64) -> Self {
        let service = Self::default();
        service.lock().next_socket = base;
        service
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: HostCall) {
        self.lock().calls.push(call);
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.lock().calls.clone()
    }

    pub fn registered_plugins(&self) -> Vec<Arc<dyn ProtocolPlugin>> {
        self.lock().plugins.clone()
    }

    pub fn signals(&self, session: SessionId) -> Vec<Signal> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Signal { session: s, signal } if *s == session => Some(*signal),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self, session: SessionId) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                HostCall::SetError { session: s, message } if *s == session => {
                    Some(message.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub fn close_requests(&self, session: SessionId) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, HostCall::RequestClose { session: s } if *s == session))
            .count()
    }

    pub fn surfaces_created(&self, session: SessionId) -> Vec<SocketId> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                HostCall::CreateSurface { session: s, socket } if *s == session => Some(*socket),
                _ => None,
            })
            .collect()
    }
}

struct RecordingSurface {
    socket: SocketId,
    service: RecordingService,
}

impl EmbeddingSurface for RecordingSurface {
    fn socket_id(&self) -> SocketId {
        self.socket
    }

    fn show(&mut self) {
        self.service.record(HostCall::SurfaceShown {
            socket: self.socket,
        });
    }

    fn subscribe(&mut self, event: SurfaceEvent) {
        self.service.record(HostCall::Subscribe {
            socket: self.socket,
            event,
        });
    }
}

impl PluginService for RecordingService {
    fn register_plugin(&self, plugin: Arc<dyn ProtocolPlugin>) -> bool {
        let name = plugin.info().name.to_string();
        let mut recorded = self.lock();
        recorded.calls.push(HostCall::RegisterPlugin { name });
        recorded.plugins.push(plugin);
        true
    }

    fn create_surface(&self, session: SessionId) -> Box<dyn EmbeddingSurface> {
        let socket = {
            let mut recorded = self.lock();
            recorded.next_socket += 1;
            SocketId(recorded.next_socket)
        };
        self.record(HostCall::CreateSurface { session, socket });
        Box::new(RecordingSurface {
            socket,
            service: self.clone(),
        })
    }

    fn register_hostkey(&self, session: SessionId, surface: &dyn EmbeddingSurface) {
        self.record(HostCall::RegisterHostkey {
            session,
            socket: surface.socket_id(),
        });
    }

    fn set_size(&self, session: SessionId, width: u32, height: u32) {
        self.record(HostCall::SetSize {
            session,
            width,
            height,
        });
    }

    fn emit_signal(&self, session: SessionId, signal: Signal) {
        self.record(HostCall::Signal { session, signal });
    }

    fn request_close(&self, session: SessionId) {
        self.record(HostCall::RequestClose { session });
    }

    fn set_error(&self, session: SessionId, message: &str) {
        self.record(HostCall::SetError {
            session,
            message: message.to_string(),
        });
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolContractError {
    #[error("plugin metadata is missing a {field}")]
    MissingMetadata { field: &'static str },
    #[error("init created {count} surfaces for an embedded session, expected 1")]
    SurfaceCount { count: usize },
    #[error("surface was not subscribed to {event}")]
    MissingSubscription { event: &'static str },
    #[error("open_connection reported a detached session for an embedded profile")]
    NotAttached,
    #[error("spawn reported errors: {0:?}")]
    UnexpectedErrors(Vec<String>),
    #[error("expected signals {expected:?} after {step}, got {actual:?}")]
    Signals {
        step: &'static str,
        expected: Vec<Signal>,
        actual: Vec<Signal>,
    },
    #[error("expected {expected} close requests after {step}, got {actual}")]
    CloseRequests {
        step: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("plugin claims support for feature {0:?}")]
    UnexpectedFeature(FeatureKind),
    #[error("close_connection asked the host to propagate the close")]
    ClosePropagated,
}

/// Drive `plugin` through init, open, plug-added, plug-removed (twice) and
/// close on `widget`, checking the host-visible effects of each step.
///
/// `widget` must describe an embedded (non-detached) session whose client
/// can be spawned.
pub fn run_protocol_contract(
    plugin: &dyn ProtocolPlugin,
    service: &RecordingService,
    widget: &ProtocolWidget,
) -> Result<(), ProtocolContractError> {
    verify_metadata(plugin)?;

    let id = widget.id();
    let mut session = plugin.init(widget);

    let surfaces = service.surfaces_created(id);
    if surfaces.len() != 1 {
        return Err(ProtocolContractError::SurfaceCount {
            count: surfaces.len(),
        });
    }
    for event in [SurfaceEvent::PlugAdded, SurfaceEvent::PlugRemoved] {
        let subscribed = service.calls().contains(&HostCall::Subscribe {
            socket: surfaces[0],
            event,
        });
        if !subscribed {
            return Err(ProtocolContractError::MissingSubscription {
                event: event.as_str(),
            });
        }
    }

    if !session.open_connection(widget) {
        return Err(ProtocolContractError::NotAttached);
    }
    let errors = service.errors(id);
    if !errors.is_empty() {
        return Err(ProtocolContractError::UnexpectedErrors(errors));
    }
    expect_signals(service, id, "open_connection", &[])?;

    for feature in [FeatureKind::Pref, FeatureKind::Tool, FeatureKind::Scale] {
        let feature = ProtocolFeature { kind: feature, id: 1 };
        if session.query_feature(widget, &feature) {
            return Err(ProtocolContractError::UnexpectedFeature(feature.kind));
        }
        session.call_feature(widget, &feature);
    }

    session.surface_event(widget, SurfaceEvent::PlugAdded);
    session.surface_event(widget, SurfaceEvent::PlugAdded);
    expect_signals(service, id, "plug-added", &[Signal::Connect])?;

    session.surface_event(widget, SurfaceEvent::PlugRemoved);
    session.surface_event(widget, SurfaceEvent::PlugRemoved);
    expect_close_requests(service, id, "plug-removed", 1)?;

    if session.close_connection(widget) {
        return Err(ProtocolContractError::ClosePropagated);
    }
    expect_signals(
        service,
        id,
        "close_connection",
        &[Signal::Connect, Signal::Disconnect],
    )?;
    expect_close_requests(service, id, "close_connection", 1)?;

    Ok(())
}

fn verify_metadata(plugin: &dyn ProtocolPlugin) -> Result<(), ProtocolContractError> {
    let info = plugin.info();
    for (field, value) in [
        ("name", info.name),
        ("description", info.description),
        ("version", info.version),
    ] {
        if value.is_empty() {
            return Err(ProtocolContractError::MissingMetadata { field });
        }
    }
    if plugin.basic_settings().is_empty() {
        return Err(ProtocolContractError::MissingMetadata {
            field: "basic settings list",
        });
    }
    Ok(())
}

fn expect_signals(
    service: &RecordingService,
    session: SessionId,
    step: &'static str,
    expected: &[Signal],
) -> Result<(), ProtocolContractError> {
    let actual = service.signals(session);
    if actual != expected {
        return Err(ProtocolContractError::Signals {
            step,
            expected: expected.to_vec(),
            actual,
        });
    }
    Ok(())
}

fn expect_close_requests(
    service: &RecordingService,
    session: SessionId,
    step: &'static str,
    expected: usize,
) -> Result<(), ProtocolContractError> {
    let actual = service.close_requests(session);
    if actual != expected {
        return Err(ProtocolContractError::CloseRequests {
            step,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_service_hands_out_distinct_sockets() {
        let service = RecordingService::with_socket_base(100);
        let first = service.create_surface(SessionId(1));
        let second = service.create_surface(SessionId(2));
        assert_eq!(first.socket_id(), SocketId(101));
        assert_eq!(second.socket_id(), SocketId(102));
        assert_eq!(service.surfaces_created(SessionId(1)), vec![SocketId(101)]);
    }

    #[test]
    fn recording_service_filters_by_session() {
        let service = RecordingService::new();
        service.emit_signal(SessionId(1), Signal::Connect);
        service.emit_signal(SessionId(2), Signal::Disconnect);
        service.set_error(SessionId(2), "boom");
        service.request_close(SessionId(1));

        assert_eq!(service.signals(SessionId(1)), vec![Signal::Connect]);
        assert_eq!(service.errors(SessionId(2)), vec!["boom".to_string()]);
        assert_eq!(service.close_requests(SessionId(1)), 1);
        assert_eq!(service.close_requests(SessionId(2)), 0);
    }
}
