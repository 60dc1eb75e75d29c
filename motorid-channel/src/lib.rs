//! MotorID Channel - Command Conduit with Per-Call Correlation
//!
//! The gateway publishes [`CommandMessage`]s on a bounded mpsc channel and
//! suspends the calling task until the worker posts the correlated
//! [`ResponseMessage`] or the timeout window elapses. Correlation lives in a
//! concurrent map from call id to a oneshot waiter:
//!
//! ```text
//! issued ──► awaiting-response ──► fulfilled
//!                    │
//!                    └───────────► timed-out   (waiter removed; a late
//!                                               response finds no entry
//!                                               and is dropped)
//! ```
//!
//! Many callers may be awaiting concurrently; call ids keep unrelated
//! responses from cross-talking. The worker cannot know the gateway stopped
//! waiting, so completions for vanished waiters are discarded quietly.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use motorid_core::{PersonDraft, PersonId, ViewUpdate};

/// Correlation id for one gateway call.
pub type CallId = Uuid;

/// Mutation operations executed by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    CreatePerson { drafts: Vec<PersonDraft> },
    UpdateViews { updates: Vec<ViewUpdate> },
    SetVerified { identity_no: String, flag: bool },
    Refresh { id: Option<PersonId> },
}

impl Command {
    /// Operation name, for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreatePerson { .. } => "createPerson",
            Command::UpdateViews { .. } => "updateViews",
            Command::SetVerified { .. } => "setPersonVerified",
            Command::Refresh { .. } => "refresh",
        }
    }
}

/// One unit of work on the channel; correlates 1:1 with a pending wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub call_id: CallId,
    pub command: Command,
}

/// Result of executing a command: an HTTP-style status code plus either a
/// data payload or a plain message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResponseMessage {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            code: 200,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            code: 200,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Dispatch failures visible to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("command channel is closed")]
    Closed,

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

type PendingMap = Arc<DashMap<CallId, oneshot::Sender<ResponseMessage>>>;

/// Gateway-side handle: publish a command, await its correlated response.
#[derive(Clone)]
pub struct CommandBus {
    tx: mpsc::Sender<CommandMessage>,
    pending: PendingMap,
    timeout: Duration,
}

/// Worker-side handle: drain commands, post completions.
pub struct CommandMailbox {
    rx: mpsc::Receiver<CommandMessage>,
    completions: CompletionSender,
}

/// Cloneable completion handle resolving waiters by call id.
#[derive(Clone)]
pub struct CompletionSender {
    pending: PendingMap,
}

/// Build a connected bus/mailbox pair.
///
/// `capacity` bounds the command queue (publishers back-pressure when the
/// worker falls behind); `timeout` is the gateway's wait window per call.
pub fn command_channel(capacity: usize, timeout: Duration) -> (CommandBus, CommandMailbox) {
    let (tx, rx) = mpsc::channel(capacity);
    let pending: PendingMap = Arc::new(DashMap::new());
    let bus = CommandBus {
        tx,
        pending: Arc::clone(&pending),
        timeout,
    };
    let mailbox = CommandMailbox {
        rx,
        completions: CompletionSender { pending },
    };
    (bus, mailbox)
}

impl CommandBus {
    /// Publish `command` and block the calling task until the correlated
    /// response arrives or the window elapses.
    pub async fn dispatch(&self, command: Command) -> Result<ResponseMessage, DispatchError> {
        let call_id = Uuid::now_v7();
        let (waiter_tx, waiter_rx) = oneshot::channel();
        self.pending.insert(call_id, waiter_tx);

        let message = CommandMessage { call_id, command };
        if self.tx.send(message).await.is_err() {
            self.pending.remove(&call_id);
            return Err(DispatchError::Closed);
        }

        match tokio::time::timeout(self.timeout, waiter_rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => {
                // Completion side dropped the waiter without resolving it.
                self.pending.remove(&call_id);
                Err(DispatchError::Closed)
            }
            Err(_) => {
                self.pending.remove(&call_id);
                Err(DispatchError::Timeout(self.timeout))
            }
        }
    }

    /// Number of calls currently awaiting a response.
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }
}

impl CommandMailbox {
    /// Next command, or `None` once every bus handle is gone.
    pub async fn recv(&mut self) -> Option<CommandMessage> {
        self.rx.recv().await
    }

    /// Completion handle for posting responses.
    pub fn responder(&self) -> CompletionSender {
        self.completions.clone()
    }
}

impl CompletionSender {
    /// Resolve the waiter for `call_id`. Returns false when the waiter is
    /// gone (timed out or disconnected); the response is dropped.
    pub fn complete(&self, call_id: CallId, response: ResponseMessage) -> bool {
        match self.pending.remove(&call_id) {
            Some((_, waiter)) => waiter.send(response).is_ok(),
            None => {
                tracing::debug!(%call_id, "no waiter for response, dropping");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refresh_all() -> Command {
        Command::Refresh { id: None }
    }

    #[tokio::test]
    async fn dispatch_resolves_with_correlated_response() {
        let (bus, mut mailbox) = command_channel(8, Duration::from_secs(1));
        let responder = mailbox.responder();

        let worker = tokio::spawn(async move {
            let msg = mailbox.recv().await.expect("command");
            assert_eq!(msg.command.name(), "refresh");
            responder.complete(msg.call_id, ResponseMessage::ok_message("Success"));
        });

        let response = bus.dispatch(refresh_all()).await.expect("response");
        assert_eq!(response.code, 200);
        assert_eq!(response.message.as_deref(), Some("Success"));
        assert_eq!(bus.pending_calls(), 0);
        worker.await.expect("worker task");
    }

    #[tokio::test]
    async fn concurrent_dispatches_do_not_cross_talk() {
        let (bus, mut mailbox) = command_channel(8, Duration::from_secs(1));
        let responder = mailbox.responder();

        let worker = tokio::spawn(async move {
            // Answer the two calls in reverse arrival order.
            let first = mailbox.recv().await.expect("first");
            let second = mailbox.recv().await.expect("second");
            for msg in [second, first] {
                let echo = match &msg.command {
                    Command::SetVerified { identity_no, .. } => identity_no.clone(),
                    other => panic!("unexpected command {other:?}"),
                };
                responder.complete(msg.call_id, ResponseMessage::ok_message(echo));
            }
        });

        let call = |identity_no: &str| {
            let bus = bus.clone();
            let identity_no = identity_no.to_string();
            async move {
                bus.dispatch(Command::SetVerified {
                    identity_no: identity_no.clone(),
                    flag: true,
                })
                .await
                .map(|r| (identity_no, r))
            }
        };

        let (a, b) = tokio::join!(call("A-1"), call("B-2"));
        let (sent_a, got_a) = a.expect("first call");
        let (sent_b, got_b) = b.expect("second call");
        assert_eq!(got_a.message.as_deref(), Some(sent_a.as_str()));
        assert_eq!(got_b.message.as_deref(), Some(sent_b.as_str()));
        worker.await.expect("worker task");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_removes_waiter_and_late_response_is_dropped() {
        let (bus, mut mailbox) = command_channel(8, Duration::from_millis(50));

        let result = bus.dispatch(refresh_all()).await;
        assert_eq!(result, Err(DispatchError::Timeout(Duration::from_millis(50))));
        assert_eq!(bus.pending_calls(), 0);

        // The worker finishes later; its completion must be a quiet no-op.
        let msg = mailbox.recv().await.expect("command still delivered");
        let delivered = mailbox
            .responder()
            .complete(msg.call_id, ResponseMessage::ok_message("Success"));
        assert!(!delivered);
    }

    #[tokio::test]
    async fn dispatch_after_mailbox_drop_is_closed() {
        let (bus, mailbox) = command_channel(8, Duration::from_secs(1));
        drop(mailbox);

        let result = bus.dispatch(refresh_all()).await;
        assert_eq!(result, Err(DispatchError::Closed));
        assert_eq!(bus.pending_calls(), 0);
    }

    #[test]
    fn response_envelope_serializes_without_empty_fields() {
        let ok = ResponseMessage::ok(serde_json::json!([1, 2]));
        let text = serde_json::to_string(&ok).expect("serialize");
        assert!(text.contains("\"code\":200"));
        assert!(!text.contains("message"));

        let err = ResponseMessage::error(404, "Person not found");
        let text = serde_json::to_string(&err).expect("serialize");
        assert!(text.contains("\"code\":404"));
        assert!(!text.contains("data"));
    }
}
