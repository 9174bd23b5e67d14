//! The multiplexed bridge session.
//!
//! One [`Session`] owns the call-id counter, the pending-call table and the
//! subscription table for a single channel. Requests go out through the
//! [`Channel`]; whoever reads the connection feeds every received frame to
//! [`Session::handle_frame`] (or hands a frame stream to
//! [`Session::dispatch`]).
//!
//! The state lock is held for table updates and for handing a response to
//! its resolver, so a pending entry is claimed and resolved in one step.
//! Channel sends, awaits and subscription callbacks all run without it.

use std::collections::HashMap;
use std::fmt;
use std::future::poll_fn;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures_core::Stream;
use roslink_frame::{Frame, FrameError};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::cancel::CancelSignal;
use crate::channel::Channel;
use crate::config::SessionConfig;
use crate::control::{CreateOp, CreateRequest, CreateResponse, DestroyRequest};
use crate::error::{Result, SessionError};
use crate::ids::{PublisherId, ServiceClientId, SubscriptionId};
use crate::qos::QosProfile;
use crate::wire::{self, DataFrame};

type Callback = Arc<dyn Fn(Bytes) + Send + Sync>;

enum Pending {
    Create {
        op: CreateOp,
        /// Installed as the subscription callback when the response lands.
        callback: Option<Callback>,
        tx: oneshot::Sender<u32>,
    },
    Call(oneshot::Sender<Bytes>),
}

#[derive(Default)]
struct SessionState {
    next_call_id: u32,
    pending: HashMap<u32, Pending>,
    subscriptions: HashMap<SubscriptionId, Callback>,
    closed: bool,
}

impl SessionState {
    /// Next counter value not currently pending. Wraps at `u32::MAX`.
    fn allocate_call_id(&mut self) -> u32 {
        loop {
            let call_id = self.next_call_id;
            self.next_call_id = call_id.wrapping_add(1);
            if !self.pending.contains_key(&call_id) {
                return call_id;
            }
        }
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a pending entry if the awaiting future goes away first.
struct PendingGuard<'a> {
    state: &'a Mutex<SessionState>,
    call_id: u32,
    armed: bool,
}

impl PendingGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }

    /// Remove the entry now. `false` if a response already claimed it.
    fn remove(&mut self) -> bool {
        self.armed = false;
        let entry = lock(self.state).pending.remove(&self.call_id);
        entry.is_some()
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let entry = lock(self.state).pending.remove(&self.call_id);
            if entry.is_some() {
                trace!(call_id = self.call_id, "pending call abandoned");
            }
        }
    }
}

/// Snapshot of a session's tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub pending_calls: usize,
    pub subscriptions: usize,
    pub next_call_id: u32,
}

/// A client session multiplexing endpoints and service calls over one channel.
pub struct Session<C> {
    channel: C,
    config: SessionConfig,
    state: Mutex<SessionState>,
}

impl<C> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Session")
            .field("label", &self.config.label)
            .field("pending_calls", &state.pending.len())
            .field("subscriptions", &state.subscriptions.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl<C: Channel> Session<C> {
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, SessionConfig::default())
    }

    pub fn with_config(channel: C, config: SessionConfig) -> Self {
        Self {
            channel,
            config,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Open a topic publisher.
    pub async fn create_publisher(
        &self,
        name: &str,
        type_name: &str,
        qos: Option<QosProfile>,
    ) -> Result<PublisherId> {
        self.create(CreateOp::CreatePublisher, name, type_name, qos, None, None)
            .await
            .map(PublisherId::new)
    }

    /// Open a topic subscription.
    ///
    /// `callback` receives the raw payload of every TOPIC frame for the new
    /// id. It is registered while the create response is being handled, so
    /// frames that follow the response are never missed.
    pub async fn create_subscription<F>(
        &self,
        name: &str,
        type_name: &str,
        qos: Option<QosProfile>,
        callback: F,
    ) -> Result<SubscriptionId>
    where
        F: Fn(Bytes) + Send + Sync + 'static,
    {
        self.create(
            CreateOp::CreateSubscription,
            name,
            type_name,
            qos,
            Some(Arc::new(callback)),
            None,
        )
        .await
        .map(SubscriptionId::new)
    }

    /// Open a service client.
    pub async fn create_service_client(
        &self,
        name: &str,
        type_name: &str,
        qos: Option<QosProfile>,
    ) -> Result<ServiceClientId> {
        self.create(CreateOp::CreateServiceClient, name, type_name, qos, None, None)
            .await
            .map(ServiceClientId::new)
    }

    /// Send one TOPIC frame.
    pub fn publish(&self, publisher: PublisherId, payload: &[u8]) -> Result<()> {
        self.ensure_open()?;
        self.send(Frame::Binary(wire::encode_topic(publisher.get(), payload)))?;
        trace!(
            label = %self.config.label,
            endpoint_id = publisher.get(),
            len = payload.len(),
            "published"
        );
        Ok(())
    }

    /// Call a service and wait for its response payload.
    pub async fn call(&self, client: ServiceClientId, payload: &[u8]) -> Result<Bytes> {
        self.call_inner(client, payload, None).await
    }

    pub fn destroy_publisher(&self, publisher: PublisherId) -> Result<()> {
        self.send_destroy(publisher.get())
    }

    /// Stop delivering to the callback, then ask the bridge to release the id.
    pub fn destroy_subscription(&self, subscription: SubscriptionId) -> Result<()> {
        let callback = lock(&self.state).subscriptions.remove(&subscription);
        drop(callback);
        self.send_destroy(subscription.get())
    }

    /// Release a service client. Calls already in flight stay pending.
    pub fn destroy_service_client(&self, client: ServiceClientId) -> Result<()> {
        self.send_destroy(client.get())
    }

    /// Operations that also fail with [`SessionError::Cancelled`] when
    /// `signal` fires first.
    pub fn cancellable<'a>(&'a self, signal: &'a CancelSignal) -> Cancellable<'a, C> {
        Cancellable {
            session: self,
            signal,
        }
    }

    /// Process one received frame. Malformed or unmatched frames are dropped.
    pub fn handle_frame(&self, frame: Frame) {
        match frame {
            Frame::Text(text) => self.handle_control(&text),
            Frame::Binary(bytes) => self.handle_data(bytes),
        }
    }

    /// Feed every frame of `stream` to [`handle_frame`](Self::handle_frame)
    /// in order. Returns when the stream ends or yields an error.
    ///
    /// [`FrameError::InvalidText`] only loses the offending frame and does
    /// not end the dispatch.
    pub async fn dispatch<S, E>(&self, stream: S) -> std::result::Result<(), FrameError>
    where
        S: Stream<Item = std::result::Result<Frame, E>>,
        E: Into<FrameError>,
    {
        let mut stream = pin!(stream);
        while let Some(item) = poll_fn(|cx| stream.as_mut().poll_next(cx)).await {
            match item.map_err(Into::into) {
                Ok(frame) => self.handle_frame(frame),
                Err(FrameError::InvalidText) => {
                    debug!(label = %self.config.label, "dropping text frame with invalid UTF-8");
                }
                Err(err) => return Err(err),
            }
        }
        debug!(label = %self.config.label, "frame stream ended");
        Ok(())
    }

    pub fn stats(&self) -> SessionStats {
        let state = lock(&self.state);
        SessionStats {
            pending_calls: state.pending.len(),
            subscriptions: state.subscriptions.len(),
            next_call_id: state.next_call_id,
        }
    }

    /// Fail every pending call with [`SessionError::Closed`], drop all
    /// subscription callbacks and refuse further operations.
    pub fn close(&self) {
        let (pending, subscriptions) = {
            let mut state = lock(&self.state);
            state.closed = true;
            (
                std::mem::take(&mut state.pending),
                std::mem::take(&mut state.subscriptions),
            )
        };
        debug!(
            label = %self.config.label,
            pending = pending.len(),
            subscriptions = subscriptions.len(),
            "session closed"
        );
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    fn ensure_open(&self) -> Result<()> {
        if lock(&self.state).closed {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    fn send(&self, frame: Frame) -> Result<()> {
        self.channel.send(frame).map_err(SessionError::from)
    }

    fn send_destroy(&self, id: u32) -> Result<()> {
        self.ensure_open()?;
        let text = serde_json::to_string(&DestroyRequest::new(id))?;
        self.send(Frame::Text(text))?;
        debug!(label = %self.config.label, endpoint_id = id, "destroy request sent");
        Ok(())
    }

    fn register(&self, entry: Pending) -> Result<u32> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(SessionError::Closed);
        }
        let call_id = state.allocate_call_id();
        state.pending.insert(call_id, entry);
        Ok(call_id)
    }

    fn forget(&self, call_id: u32) {
        let entry = lock(&self.state).pending.remove(&call_id);
        drop(entry);
    }

    async fn create(
        &self,
        op: CreateOp,
        name: &str,
        type_name: &str,
        qos: Option<QosProfile>,
        callback: Option<Callback>,
        signal: Option<&CancelSignal>,
    ) -> Result<u32> {
        if let Some(reason) = signal.and_then(CancelSignal::reason) {
            debug!(label = %self.config.label, op = op.as_str(), %reason, "create skipped, already cancelled");
            return Err(SessionError::Cancelled(reason));
        }

        let (tx, rx) = oneshot::channel();
        let call_id = self.register(Pending::Create { op, callback, tx })?;
        let request = CreateRequest {
            call_id,
            op,
            name: name.to_string(),
            type_name: type_name.to_string(),
            qos: qos.or_else(|| self.config.default_qos.clone()),
        };
        let sent = serde_json::to_string(&request)
            .map_err(SessionError::from)
            .and_then(|text| self.send(Frame::Text(text)));
        if let Err(err) = sent {
            self.forget(call_id);
            return Err(err);
        }
        debug!(
            label = %self.config.label,
            call_id,
            op = op.as_str(),
            topic = name,
            "create request sent"
        );

        self.wait(call_id, rx, signal).await
    }

    async fn call_inner(
        &self,
        client: ServiceClientId,
        payload: &[u8],
        signal: Option<&CancelSignal>,
    ) -> Result<Bytes> {
        if let Some(reason) = signal.and_then(CancelSignal::reason) {
            debug!(label = %self.config.label, endpoint_id = client.get(), %reason, "call skipped, already cancelled");
            return Err(SessionError::Cancelled(reason));
        }

        let (tx, rx) = oneshot::channel();
        let call_id = self.register(Pending::Call(tx))?;
        let frame = wire::encode_service_request(client.get(), call_id, payload);
        if let Err(err) = self.send(Frame::Binary(frame)) {
            self.forget(call_id);
            return Err(err);
        }
        trace!(
            label = %self.config.label,
            call_id,
            endpoint_id = client.get(),
            len = payload.len(),
            "service request sent"
        );

        self.wait(call_id, rx, signal).await
    }

    async fn wait<T>(
        &self,
        call_id: u32,
        mut rx: oneshot::Receiver<T>,
        signal: Option<&CancelSignal>,
    ) -> Result<T> {
        let mut guard = PendingGuard {
            state: &self.state,
            call_id,
            armed: true,
        };

        let outcome = match signal {
            None => Ok((&mut rx).await),
            Some(signal) => tokio::select! {
                biased;
                response = &mut rx => Ok(response),
                reason = signal.cancelled() => Err(reason),
            },
        };

        match outcome {
            Ok(response) => {
                guard.disarm();
                response.map_err(|_| SessionError::Closed)
            }
            Err(reason) => {
                // A missing entry means a response already claimed it and
                // resolved the receiver under the same lock.
                if !guard.remove() {
                    if let Ok(value) = rx.try_recv() {
                        return Ok(value);
                    }
                }
                debug!(label = %self.config.label, call_id, %reason, "cancelled");
                Err(SessionError::Cancelled(reason))
            }
        }
    }

    fn handle_control(&self, text: &str) {
        let CreateResponse { id, call_id } = match serde_json::from_str(text) {
            Ok(response) => response,
            Err(err) => {
                debug!(label = %self.config.label, error = %err, "dropping unrecognized control record");
                return;
            }
        };

        let (op, orphaned) = {
            let mut state = lock(&self.state);
            match state.pending.remove(&call_id) {
                Some(Pending::Create { op, callback, tx }) => {
                    if tx.send(id).is_ok() {
                        if let Some(callback) = callback {
                            state
                                .subscriptions
                                .insert(SubscriptionId::new(id), callback);
                        }
                        (op, None)
                    } else {
                        (op, Some(callback))
                    }
                }
                Some(other) => {
                    state.pending.insert(call_id, other);
                    debug!(
                        label = %self.config.label,
                        call_id,
                        endpoint_id = id,
                        "create response for a service call id, dropping"
                    );
                    return;
                }
                None => {
                    debug!(
                        label = %self.config.label,
                        call_id,
                        endpoint_id = id,
                        "create response for unknown call id, dropping"
                    );
                    return;
                }
            }
        };

        let Some(callback) = orphaned else {
            debug!(label = %self.config.label, call_id, endpoint_id = id, op = op.as_str(), "endpoint created");
            return;
        };

        // Nobody is waiting for this endpoint any more.
        drop(callback);
        debug!(
            label = %self.config.label,
            call_id,
            endpoint_id = id,
            op = op.as_str(),
            "creator gone, releasing endpoint"
        );
        if let Err(err) = self.send_destroy(id) {
            warn!(
                label = %self.config.label,
                endpoint_id = id,
                error = %err,
                "failed to release orphaned endpoint"
            );
        }
    }

    fn handle_data(&self, bytes: Bytes) {
        let frame = match DataFrame::parse(bytes) {
            Ok(frame) => frame,
            Err(err) => {
                trace!(label = %self.config.label, error = %err, "dropping data frame");
                return;
            }
        };

        match frame {
            DataFrame::Topic {
                endpoint_id,
                payload,
            } => {
                let callback = lock(&self.state)
                    .subscriptions
                    .get(&SubscriptionId::new(endpoint_id))
                    .cloned();
                match callback {
                    Some(callback) => callback(payload),
                    None => trace!(
                        label = %self.config.label,
                        endpoint_id,
                        "no subscription for topic frame"
                    ),
                }
            }
            DataFrame::ServiceResponse { call_id, payload } => {
                let delivered = {
                    let mut state = lock(&self.state);
                    match state.pending.remove(&call_id) {
                        Some(Pending::Call(tx)) => tx.send(payload).is_ok(),
                        Some(other) => {
                            state.pending.insert(call_id, other);
                            trace!(label = %self.config.label, call_id, "service response for a create id, dropping");
                            return;
                        }
                        None => {
                            trace!(label = %self.config.label, call_id, "service response for unknown call id, dropping");
                            return;
                        }
                    }
                };
                if !delivered {
                    trace!(label = %self.config.label, call_id, "caller gone, dropping service response");
                }
            }
            DataFrame::ServiceRequest { client_id, .. } => {
                trace!(
                    label = %self.config.label,
                    opcode = wire::SERVICE_REQUEST,
                    endpoint_id = client_id,
                    "ignoring inbound service request"
                );
            }
        }
    }
}

/// Session operations bound to a [`CancelSignal`].
///
/// A signal that has already fired rejects each operation before anything
/// is sent.
pub struct Cancellable<'a, C> {
    session: &'a Session<C>,
    signal: &'a CancelSignal,
}

impl<C: Channel> Cancellable<'_, C> {
    pub fn signal(&self) -> &CancelSignal {
        self.signal
    }

    pub async fn create_publisher(
        &self,
        name: &str,
        type_name: &str,
        qos: Option<QosProfile>,
    ) -> Result<PublisherId> {
        self.session
            .create(
                CreateOp::CreatePublisher,
                name,
                type_name,
                qos,
                None,
                Some(self.signal),
            )
            .await
            .map(PublisherId::new)
    }

    pub async fn create_subscription<F>(
        &self,
        name: &str,
        type_name: &str,
        qos: Option<QosProfile>,
        callback: F,
    ) -> Result<SubscriptionId>
    where
        F: Fn(Bytes) + Send + Sync + 'static,
    {
        self.session
            .create(
                CreateOp::CreateSubscription,
                name,
                type_name,
                qos,
                Some(Arc::new(callback)),
                Some(self.signal),
            )
            .await
            .map(SubscriptionId::new)
    }

    pub async fn create_service_client(
        &self,
        name: &str,
        type_name: &str,
        qos: Option<QosProfile>,
    ) -> Result<ServiceClientId> {
        self.session
            .create(
                CreateOp::CreateServiceClient,
                name,
                type_name,
                qos,
                None,
                Some(self.signal),
            )
            .await
            .map(ServiceClientId::new)
    }

    pub async fn call(&self, client: ServiceClientId, payload: &[u8]) -> Result<Bytes> {
        self.session
            .call_inner(client, payload, Some(self.signal))
            .await
    }
}
