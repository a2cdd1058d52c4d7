//! Response classification and routing
//!
//! Each decoded frame is classified by its type code and routed into the
//! pending-request registry. Unsolicited notifications and unrecognized
//! codes are logged and dropped; they must never fail the session.

use std::io::Read;
use std::sync::Arc;

use flate2::read::GzDecoder;

use dashlink_protocol::{CommandType, Frame, ResponseKind, Status};

use crate::error::ClientError;
use crate::registry::{PendingRegistry, Reply};

/// Routes incoming frames to their pending requests
pub(crate) struct Dispatcher {
    registry: Arc<PendingRegistry>,
}

impl Dispatcher {
    pub(crate) fn new(registry: Arc<PendingRegistry>) -> Self {
        Self { registry }
    }

    /// Classify and route one frame
    pub(crate) fn dispatch(&self, frame: Frame) {
        match frame.command_type() {
            Some(CommandType::Response) => self.on_status(frame),
            Some(CommandType::Hardware) => self.on_fields(frame),
            Some(CommandType::GetToken) => self.on_text(frame),
            Some(CommandType::LoadProfileGzipped) => self.on_snapshot(frame),
            Some(other) => {
                tracing::debug!(
                    kind = ?other,
                    id = %frame.id,
                    "ignoring unsolicited notification frame"
                );
            }
            None => {
                tracing::warn!(
                    code = frame.code,
                    id = %frame.id,
                    body_len = frame.body.len(),
                    "ignoring frame with unrecognized command code"
                );
            }
        }
    }

    /// Generic status response: an OK code completes the call, any other
    /// code fails it carrying the raw code. A RESPONSE may answer any
    /// command kind (rejections are always status frames).
    fn on_status(&self, frame: Frame) {
        let code = match frame.body.len() {
            // No explicit code: the server confirmed without detail
            0 => Status::Ok.as_u16(),
            1 => {
                self.registry.fail(
                    frame.id,
                    ClientError::MalformedFrame {
                        reason: "status body shorter than 2 bytes",
                    },
                );
                return;
            }
            _ => u16::from_be_bytes([frame.body[0], frame.body[1]]),
        };

        match Status::from_u16(code) {
            Some(status) if status.is_ok() => {
                self.registry.complete(frame.id, Reply::Status(status));
            }
            _ => self.registry.fail(frame.id, ClientError::Rejected { code }),
        }
    }

    /// Hardware read reply: UTF-8 body split on NUL into the field list
    fn on_fields(&self, frame: Frame) {
        let Some(entry) = self.registry.take(frame.id) else {
            tracing::debug!(id = %frame.id, "hardware reply without a pending request discarded");
            return;
        };
        if entry.expects != ResponseKind::Fields {
            tracing::warn!(id = %frame.id, expects = ?entry.expects, "hardware reply for a request of another kind");
        }

        let text = String::from_utf8_lossy(&frame.body);
        let fields: Vec<String> = text.split('\0').map(str::to_string).collect();
        entry.settle(Ok(Reply::Fields(fields)));
    }

    /// Token fetch reply: the body is the token text, verbatim
    fn on_text(&self, frame: Frame) {
        let Some(entry) = self.registry.take(frame.id) else {
            tracing::debug!(id = %frame.id, "token reply without a pending request discarded");
            return;
        };
        if entry.expects != ResponseKind::Text {
            tracing::warn!(id = %frame.id, expects = ?entry.expects, "token reply for a request of another kind");
        }

        let text = String::from_utf8_lossy(&frame.body).into_owned();
        entry.settle(Ok(Reply::Text(text)));
    }

    /// Profile snapshot reply: the entry leaves the registry (and its
    /// expiry stops) as soon as the frame arrives; inflating runs on the
    /// blocking pool and settles the call when it finishes, so slow
    /// decompression cannot produce a false timeout.
    fn on_snapshot(&self, frame: Frame) {
        let Some(entry) = self.registry.take(frame.id) else {
            tracing::debug!(id = %frame.id, "snapshot reply without a pending request discarded");
            return;
        };
        if entry.expects != ResponseKind::Snapshot {
            tracing::warn!(id = %frame.id, expects = ?entry.expects, "snapshot reply for a request of another kind");
        }

        let id = frame.id;
        let body = frame.body;
        tokio::spawn(async move {
            let inflated = tokio::task::spawn_blocking(move || inflate(&body)).await;
            let result = match inflated {
                Ok(Ok(text)) => Ok(Reply::Profile(text)),
                Ok(Err(e)) => {
                    tracing::debug!(%id, "snapshot failed to inflate: {e}");
                    Err(ClientError::Decompression(e))
                }
                Err(e) => Err(ClientError::Decompression(std::io::Error::other(e))),
            };
            entry.settle(result);
        });
    }
}

/// Inflate a gzipped snapshot body to text
fn inflate(data: &[u8]) -> std::io::Result<String> {
    let mut decoder = GzDecoder::new(data);
    let mut inflated = Vec::new();
    decoder.read_to_end(&mut inflated)?;
    Ok(String::from_utf8_lossy(&inflated).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use dashlink_protocol::MessageId;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn setup() -> (Dispatcher, Arc<PendingRegistry>) {
        let registry = Arc::new(PendingRegistry::new());
        (Dispatcher::new(Arc::clone(&registry)), registry)
    }

    fn gzip(text: &str) -> Bytes {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        Bytes::from(encoder.finish().unwrap())
    }

    #[tokio::test]
    async fn test_ok_status_completes() {
        let (dispatcher, registry) = setup();
        let call = registry
            .register(MessageId::new(7), ResponseKind::Status, TIMEOUT)
            .unwrap();

        dispatcher.dispatch(Frame::new(
            0,
            MessageId::new(7),
            Bytes::copy_from_slice(&200u16.to_be_bytes()),
        ));

        assert_eq!(call.await.unwrap(), Reply::Status(Status::Ok));
    }

    #[tokio::test]
    async fn test_error_status_fails_with_code() {
        let (dispatcher, registry) = setup();
        let call = registry
            .register(MessageId::new(2), ResponseKind::Status, TIMEOUT)
            .unwrap();

        dispatcher.dispatch(Frame::new(
            0,
            MessageId::new(2),
            Bytes::copy_from_slice(&8u16.to_be_bytes()),
        ));

        assert!(matches!(call.await, Err(ClientError::Rejected { code: 8 })));
    }

    #[tokio::test]
    async fn test_empty_status_body_counts_as_ok() {
        let (dispatcher, registry) = setup();
        let call = registry
            .register(MessageId::new(3), ResponseKind::Status, TIMEOUT)
            .unwrap();

        dispatcher.dispatch(Frame::new(0, MessageId::new(3), Bytes::new()));

        assert_eq!(call.await.unwrap(), Reply::Status(Status::Ok));
    }

    #[tokio::test]
    async fn test_one_byte_status_body_is_malformed() {
        let (dispatcher, registry) = setup();
        let call = registry
            .register(MessageId::new(4), ResponseKind::Status, TIMEOUT)
            .unwrap();

        dispatcher.dispatch(Frame::new(0, MessageId::new(4), Bytes::from_static(&[0xC8])));

        assert!(matches!(call.await, Err(ClientError::MalformedFrame { .. })));
    }

    #[tokio::test]
    async fn test_hardware_fields_split_on_nul() {
        let (dispatcher, registry) = setup();
        let call = registry
            .register(MessageId::new(5), ResponseKind::Fields, TIMEOUT)
            .unwrap();

        dispatcher.dispatch(Frame::new(
            20,
            MessageId::new(5),
            Bytes::from_static(b"101\0dr\x004\x00128"),
        ));

        assert_eq!(
            call.await.unwrap(),
            Reply::Fields(vec![
                "101".to_string(),
                "dr".to_string(),
                "4".to_string(),
                "128".to_string()
            ])
        );
    }

    #[tokio::test]
    async fn test_token_text_delivered_verbatim() {
        let (dispatcher, registry) = setup();
        let call = registry
            .register(MessageId::new(6), ResponseKind::Text, TIMEOUT)
            .unwrap();

        dispatcher.dispatch(Frame::new(
            5,
            MessageId::new(6),
            Bytes::from_static(b"4ae3851817194e2596cf1b7103603ef8"),
        ));

        assert_eq!(
            call.await.unwrap(),
            Reply::Text("4ae3851817194e2596cf1b7103603ef8".to_string())
        );
    }

    #[tokio::test]
    async fn test_snapshot_inflates() {
        let (dispatcher, registry) = setup();
        let call = registry
            .register(MessageId::new(8), ResponseKind::Snapshot, TIMEOUT)
            .unwrap();

        dispatcher.dispatch(Frame::new(24, MessageId::new(8), gzip(r#"{"dashBoards":[]}"#)));

        assert_eq!(
            call.await.unwrap(),
            Reply::Profile(r#"{"dashBoards":[]}"#.to_string())
        );
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_fails_and_removes_entry() {
        let (dispatcher, registry) = setup();
        let call = registry
            .register(MessageId::new(9), ResponseKind::Snapshot, TIMEOUT)
            .unwrap();

        dispatcher.dispatch(Frame::new(
            24,
            MessageId::new(9),
            Bytes::from_static(b"definitely not gzip"),
        ));

        assert!(matches!(call.await, Err(ClientError::Decompression(_))));
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_unmatched_response_is_discarded() {
        let (dispatcher, registry) = setup();

        // No pending request for id 42; nothing must panic or register
        dispatcher.dispatch(Frame::new(
            0,
            MessageId::new(42),
            Bytes::copy_from_slice(&200u16.to_be_bytes()),
        ));
        dispatcher.dispatch(Frame::new(
            20,
            MessageId::new(42),
            Bytes::from_static(b"101\0dr\x004"),
        ));

        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_notification_and_unknown_codes_are_ignored() {
        let (dispatcher, registry) = setup();
        let call = registry
            .register(MessageId::new(1), ResponseKind::Status, TIMEOUT)
            .unwrap();

        // A sync notification and an unknown code, both with a live id:
        // neither may touch the pending entry
        dispatcher.dispatch(Frame::new(25, MessageId::new(1), Bytes::from_static(b"x")));
        dispatcher.dispatch(Frame::new(0xFE, MessageId::new(1), Bytes::from_static(b"y")));

        assert_eq!(registry.len(), 1);
        drop(call);
    }
}
