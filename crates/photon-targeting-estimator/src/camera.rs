//! Client view of one coprocessor camera.
//!
//! The pub/sub transport itself lives elsewhere; [`TransportSubscriber`]
//! names the entries this side reads and writes. [`InMemoryTransport`] backs
//! tests and simulation.

use crate::context::ClientContext;
use photon_targeting_core::{PacketSerde, PhotonPipelineResult};
use std::collections::VecDeque;
use std::sync::Arc;

/// Version string this client reports and expects from coprocessors.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Window within which a changed heartbeat counts as connected.
pub const HEARTBEAT_DEBOUNCE_S: f64 = 0.5;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("coprocessor runs version {theirs}, client is {ours}")]
    VersionMismatch { ours: String, theirs: String },
    #[error("message schema mismatch: client {ours}, coprocessor {theirs}")]
    MessageVersionMismatch { ours: String, theirs: String },
    #[error("transport: {0}")]
    Transport(String),
}

/// One encoded frame as received, stamped in the client's time base.
#[derive(Clone, Debug, PartialEq)]
pub struct TimestampedBytes {
    pub data: Vec<u8>,
    pub received_s: f64,
}

/// Entries a camera exposes on the pub/sub bus.
pub trait TransportSubscriber {
    /// Drain the queue of encoded results received since the last call.
    fn raw_bytes(&mut self) -> Result<Vec<TimestampedBytes>, String>;
    fn driver_mode(&self) -> bool;
    fn set_driver_mode(&mut self, enabled: bool);
    /// Pipeline index the coprocessor reports as active.
    fn pipeline_index(&self) -> i64;
    fn request_pipeline_index(&mut self, index: i64);
    /// Monotonic counter bumped by the coprocessor; `None` if never seen.
    fn heartbeat(&self) -> Option<i64>;
    fn version(&self) -> Option<String>;
    fn message_type_version(&self) -> Option<String>;
}

/// Something that yields the newest pipeline result.
pub trait ResultSource {
    fn latest_result(&mut self) -> Result<Option<PhotonPipelineResult>, CameraError>;
}

/// Loopback transport: whatever is published is what the camera reads.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTransport {
    queue: VecDeque<TimestampedBytes>,
    driver_mode: bool,
    pipeline_index: i64,
    heartbeat: Option<i64>,
    version: Option<String>,
    message_version: Option<String>,
    closed: bool,
}

impl InMemoryTransport {
    /// A transport that advertises this client's own versions.
    pub fn new() -> Self {
        Self {
            heartbeat: Some(0),
            version: Some(CLIENT_VERSION.to_string()),
            message_version: Some(PhotonPipelineResult::MESSAGE_VERSION.to_string()),
            ..Self::default()
        }
    }

    pub fn publish(&mut self, result: &PhotonPipelineResult, received_s: f64) {
        self.queue.push_back(TimestampedBytes {
            data: result.to_bytes().to_vec(),
            received_s,
        });
        self.heartbeat = Some(self.heartbeat.unwrap_or(0) + 1);
    }

    pub fn publish_raw(&mut self, data: Vec<u8>, received_s: f64) {
        self.queue.push_back(TimestampedBytes { data, received_s });
    }

    pub fn set_version(&mut self, version: Option<String>) {
        self.version = version;
    }

    pub fn set_message_type_version(&mut self, version: Option<String>) {
        self.message_version = version;
    }

    pub fn set_heartbeat(&mut self, heartbeat: Option<i64>) {
        self.heartbeat = heartbeat;
    }

    pub fn set_pipeline_index(&mut self, index: i64) {
        self.pipeline_index = index;
    }

    /// Make every following read fail.
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl TransportSubscriber for InMemoryTransport {
    fn raw_bytes(&mut self) -> Result<Vec<TimestampedBytes>, String> {
        if self.closed {
            return Err("transport closed".to_string());
        }
        Ok(self.queue.drain(..).collect())
    }

    fn driver_mode(&self) -> bool {
        self.driver_mode
    }

    fn set_driver_mode(&mut self, enabled: bool) {
        self.driver_mode = enabled;
    }

    fn pipeline_index(&self) -> i64 {
        self.pipeline_index
    }

    fn request_pipeline_index(&mut self, index: i64) {
        self.pipeline_index = index;
    }

    fn heartbeat(&self) -> Option<i64> {
        self.heartbeat
    }

    fn version(&self) -> Option<String> {
        self.version.clone()
    }

    fn message_type_version(&self) -> Option<String> {
        self.message_version.clone()
    }
}

/// A named coprocessor camera read through a transport.
pub struct PhotonCamera<S: TransportSubscriber> {
    name: String,
    transport: S,
    context: Arc<ClientContext>,
    prev_heartbeat: Option<i64>,
    prev_heartbeat_change_s: f64,
}

impl<S: TransportSubscriber> PhotonCamera<S> {
    pub fn new(name: impl Into<String>, transport: S, context: Arc<ClientContext>) -> Self {
        Self {
            name: name.into(),
            transport,
            context,
            prev_heartbeat: None,
            prev_heartbeat_change_s: f64::NEG_INFINITY,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &Arc<ClientContext> {
        &self.context
    }

    pub fn transport(&self) -> &S {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut S {
        &mut self.transport
    }

    /// Decode every result received since the last call, oldest first.
    pub fn all_unread_results(&mut self) -> Result<Vec<PhotonPipelineResult>, CameraError> {
        self.verify_version()?;
        let entries = self
            .transport
            .raw_bytes()
            .map_err(CameraError::Transport)?;
        Ok(entries
            .into_iter()
            .map(|e| {
                PhotonPipelineResult::from_bytes(&e.data).with_received_timestamp(e.received_s)
            })
            .collect())
    }

    /// True while the heartbeat has changed within [`HEARTBEAT_DEBOUNCE_S`].
    pub fn is_connected(&mut self) -> bool {
        let now = self.context.now_seconds();
        let current = self.transport.heartbeat();
        if current != self.prev_heartbeat {
            self.prev_heartbeat = current;
            self.prev_heartbeat_change_s = now;
        }
        current.is_some() && now - self.prev_heartbeat_change_s < HEARTBEAT_DEBOUNCE_S
    }

    pub fn driver_mode(&self) -> bool {
        self.transport.driver_mode()
    }

    pub fn set_driver_mode(&mut self, enabled: bool) {
        self.transport.set_driver_mode(enabled);
    }

    pub fn pipeline_index(&self) -> i64 {
        self.transport.pipeline_index()
    }

    pub fn set_pipeline_index(&mut self, index: i64) {
        self.transport.request_pipeline_index(index);
    }

    /// Rate-limited compatibility check against the coprocessor.
    ///
    /// Missing entries only warn. A differing version string or message
    /// schema is an error.
    pub fn verify_version(&mut self) -> Result<(), CameraError> {
        if !self.context.begin_version_check() {
            return Ok(());
        }
        if self.transport.heartbeat().is_none() {
            log::error!(
                "camera '{}' not found on the bus; check that the coprocessor is running and the name matches",
                self.name
            );
            return Ok(());
        }
        if !self.is_connected() {
            log::warn!("camera '{}' is not sending new data", self.name);
        }

        match self.transport.version() {
            Some(theirs) if !versions_match(CLIENT_VERSION, &theirs) => {
                log::error!(
                    "camera '{}': coprocessor version {theirs} does not match client {CLIENT_VERSION}",
                    self.name
                );
                return Err(CameraError::VersionMismatch {
                    ours: CLIENT_VERSION.to_string(),
                    theirs,
                });
            }
            Some(_) => {}
            None => log::warn!("camera '{}' has not reported a version", self.name),
        }

        let ours = PhotonPipelineResult::MESSAGE_VERSION;
        match self.transport.message_type_version() {
            Some(theirs) if theirs.is_empty() => {
                log::warn!("camera '{}' reported an empty message version", self.name)
            }
            Some(theirs) if theirs != ours => {
                log::error!(
                    "camera '{}': message schema {theirs} does not match client {ours}",
                    self.name
                );
                return Err(CameraError::MessageVersionMismatch {
                    ours: ours.to_string(),
                    theirs,
                });
            }
            Some(_) => {}
            None => log::warn!(
                "camera '{}' has not reported a message version; is its pipeline running?",
                self.name
            ),
        }
        Ok(())
    }
}

impl<S: TransportSubscriber> ResultSource for PhotonCamera<S> {
    fn latest_result(&mut self) -> Result<Option<PhotonPipelineResult>, CameraError> {
        Ok(self.all_unread_results()?.pop())
    }
}

/// Compare two version strings, ignoring a leading `v` and surrounding
/// whitespace.
pub fn versions_match(a: &str, b: &str) -> bool {
    let norm = |s: &str| s.trim().trim_start_matches('v').to_string();
    norm(a) == norm(b)
}
