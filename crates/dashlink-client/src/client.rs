//! Session client façade and read loop
//!
//! [`AppClient`] owns one connection: the frame sink for outgoing
//! commands, the monotonic id counter, the pending-request registry, and
//! the spawned read loop that feeds incoming frames to the dispatcher.
//! Issuing a command never blocks on the network; each operation settles
//! when its correlated response arrives, its timer expires, or the
//! transport closes.
//!
//! # Example
//!
//! ```ignore
//! use dashlink_client::{AppClient, ClientConfig, PinKind, PinOp};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AppClient::connect(ClientConfig::default(), "alice", "secret").await?;
//!
//!     client.activate(101).await?;
//!     let fields = client
//!         .hardware(101, PinKind::Digital, PinOp::Read, 4, None)
//!         .await?;
//!     println!("pin state: {:?}", fields);
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

use std::pin::Pin;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use dashlink_protocol::{
    Command, Completion, Frame, FrameCodec, MessageId, PinKind, PinOp, ProtocolError, Status,
    Widget,
};

use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::error::ClientError;
use crate::registry::{PendingRegistry, Reply};
use crate::transport;

/// Type-erased outgoing frame sink, so the client works over TLS in
/// production and over an in-memory duplex in tests
type FrameSink = Pin<Box<dyn Sink<Frame, Error = ProtocolError> + Send>>;

/// Client session for one app server connection.
///
/// One client = one transport instance. The session holds no state the
/// server does not; after [`AppClient::close`] the value is consumed and a
/// new connection requires a new login.
pub struct AppClient {
    /// Outgoing frame sink, serialized across concurrent senders
    writer: Mutex<FrameSink>,
    /// In-flight requests keyed by message id
    registry: Arc<PendingRegistry>,
    /// Monotonic id counter; wraps past u16::MAX, never issues 0
    next_id: AtomicU16,
    /// Per-request response timeout
    request_timeout: Duration,
    /// Read-loop task, aborted on close/drop
    reader: JoinHandle<()>,
}

impl AppClient {
    /// Connect to the configured app server and authenticate.
    ///
    /// Opens the TLS transport, then sends the login command as the first
    /// frame on the wire (id 1). A non-OK login status surfaces as
    /// [`ClientError::Rejected`].
    pub async fn connect(
        config: ClientConfig,
        username: &str,
        password: &str,
    ) -> Result<Self, ClientError> {
        let stream = transport::connect(&config).await?;
        Self::connect_with(stream, config, username, password).await
    }

    /// Run the session over an already-established stream.
    ///
    /// The stream must deliver the server's bytes as-is; framing is
    /// handled here. This is the seam for alternative transports and for
    /// tests driving the engine over `tokio::io::duplex`.
    pub async fn connect_with<S>(
        stream: S,
        config: ClientConfig,
        username: &str,
        password: &str,
    ) -> Result<Self, ClientError>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let framed = Framed::new(stream, FrameCodec::new());
        let (sink, frames) = framed.split();

        let registry = Arc::new(PendingRegistry::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        let reader = tokio::spawn(read_loop(frames, dispatcher, Arc::clone(&registry)));

        let writer: FrameSink = Box::pin(sink);
        let client = Self {
            writer: Mutex::new(writer),
            registry,
            next_id: AtomicU16::new(MessageId::FIRST.as_u16()),
            request_timeout: config.request_timeout,
            reader,
        };

        // Authentication is the first exchange on the wire, so login
        // always carries id 1
        match client.issue(Command::login(username, password)).await? {
            Reply::Status(_) => Ok(client),
            _ => Err(ClientError::UnexpectedReply("login status")),
        }
    }

    /// Keepalive ping
    pub async fn ping(&self) -> Result<Status, ClientError> {
        self.expect_status(Command::Ping).await
    }

    /// Create a dashboard with the given id, display name and type
    pub async fn create_dashboard(
        &self,
        id: u32,
        name: &str,
        kind: &str,
    ) -> Result<Status, ClientError> {
        self.expect_status(Command::CreateDashboard {
            id,
            name: name.to_string(),
            kind: kind.to_string(),
        })
        .await
    }

    /// Delete a dashboard
    pub async fn delete_dashboard(&self, id: u32) -> Result<Status, ClientError> {
        self.expect_status(Command::DeleteDashboard { id }).await
    }

    /// Create a widget on a dashboard
    pub async fn create_widget(
        &self,
        dashboard_id: u32,
        widget: Widget,
    ) -> Result<Status, ClientError> {
        self.expect_status(Command::CreateWidget {
            dashboard_id,
            widget,
        })
        .await
    }

    /// Activate a dashboard so its devices start reporting
    pub async fn activate(&self, dashboard_id: u32) -> Result<Status, ClientError> {
        self.expect_status(Command::Activate { dashboard_id }).await
    }

    /// Fetch the device token for a dashboard
    pub async fn get_token(&self, dashboard_id: u32) -> Result<String, ClientError> {
        match self.issue(Command::GetToken { dashboard_id }).await? {
            Reply::Text(token) => Ok(token),
            _ => Err(ClientError::UnexpectedReply("token text")),
        }
    }

    /// Read or write a pin.
    ///
    /// Reads settle with [`Reply::Fields`] when the device answers.
    /// Writes are fire-and-forget: the server sends no confirming reply,
    /// so the call settles with [`Reply::Done`] as soon as the frame is
    /// written, without waiting for any frame from the transport.
    pub async fn hardware(
        &self,
        dashboard_id: u32,
        pin_kind: PinKind,
        op: PinOp,
        pin: u32,
        value: Option<&str>,
    ) -> Result<Reply, ClientError> {
        self.issue(Command::Hardware {
            dashboard_id,
            pin_kind,
            op,
            pin,
            value: value.map(str::to_string),
        })
        .await
    }

    /// Fetch the gzipped profile snapshot, inflated to its JSON text.
    ///
    /// Pass `None` to fetch the whole profile.
    pub async fn load_profile(&self, dashboard_id: Option<u32>) -> Result<String, ClientError> {
        match self.issue(Command::LoadProfile { dashboard_id }).await? {
            Reply::Profile(profile) => Ok(profile),
            _ => Err(ClientError::UnexpectedReply("profile snapshot")),
        }
    }

    /// Number of requests currently awaiting a response
    pub fn pending_requests(&self) -> usize {
        self.registry.len()
    }

    /// Close the session.
    ///
    /// Stops the read loop, closes the transport, and fails every
    /// still-pending request with [`ClientError::TransportClosed`].
    pub async fn close(self) -> Result<(), ClientError> {
        self.reader.abort();

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.close().await {
            tracing::debug!("error closing transport: {e}");
        }
        drop(writer);

        self.registry.drain_all(|| ClientError::TransportClosed);
        Ok(())
    }

    /// Build, register and send one command, then await its settlement
    async fn issue(&self, command: Command) -> Result<Reply, ClientError> {
        let id = self.next_id();

        let call = match command.completion() {
            Completion::AwaitsResponse => Some(self.registry.register(
                id,
                command.response_kind(),
                self.request_timeout,
            )?),
            Completion::Immediate => None,
        };

        let frame = Frame::from_command(id, &command);
        tracing::debug!(%id, kind = ?command.command_type(), "sending command");

        let sent = {
            let mut writer = self.writer.lock().await;
            writer.send(frame).await
        };
        if let Err(e) = sent {
            // The call can never be answered now; drop its entry so the
            // timer doesn't fire into a dead handle
            if call.is_some() {
                self.registry.take(id);
            }
            return Err(e.into());
        }

        match call {
            Some(call) => call.await,
            // Fire-and-forget: settled successfully upon send
            None => Ok(Reply::Done),
        }
    }

    /// Issue a command whose only success value is a generic OK status
    async fn expect_status(&self, command: Command) -> Result<Status, ClientError> {
        match self.issue(command).await? {
            Reply::Status(status) => Ok(status),
            _ => Err(ClientError::UnexpectedReply("status")),
        }
    }

    /// Next message id: strictly increasing, wrapping past u16::MAX,
    /// skipping 0
    fn next_id(&self) -> MessageId {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return MessageId::new(id);
            }
        }
    }
}

impl Drop for AppClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Pump incoming frames into the dispatcher until the transport ends,
/// then fail everything still pending
async fn read_loop<St>(mut frames: St, dispatcher: Dispatcher, registry: Arc<PendingRegistry>)
where
    St: Stream<Item = Result<Frame, ProtocolError>> + Unpin,
{
    while let Some(next) = frames.next().await {
        match next {
            Ok(frame) => {
                tracing::trace!(
                    code = frame.code,
                    id = %frame.id,
                    body_len = frame.body.len(),
                    "frame received"
                );
                dispatcher.dispatch(frame);
            }
            Err(e) => {
                tracing::error!("transport read error: {e}");
                break;
            }
        }
    }

    tracing::debug!("transport closed");
    registry.drain_all(|| ClientError::TransportClosed);
}
