//! # Progress Channel
//!
//! Message protocol between export jobs and the observers that drive them,
//! carried over `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! Every message is an [`Envelope`]: a job token, an optional message id and
//! an [`Action`]. Commands travel from an observer (a panel, a CLI, a test) to
//! the core; updates travel back. Both directions share one channel because
//! the sender never knows how many observers are listening.
//!
//! ```text
//! ┌───────────┐   convert / browse / cancel   ┌─────────────────┐
//! │ Observer  ├──────────────────────────────>│                 │
//! └───────────┘                               │ ProgressChannel │
//!       ^         update-progress / popup     │   (broadcast)   │
//!       └─────────────────────────────────────┤                 │
//!                                             └───────┬─────────┘
//!                                                     │ subscribe
//!                                             ┌───────v─────────┐
//!                                             │  ExportSession  │
//!                                             └─────────────────┘
//! ```
//!
//! ## Wire Format
//!
//! Envelopes serialize flat, with the action name in kebab-case and payload
//! fields in camelCase:
//!
//! ```json
//! {"jobToken": "panel-7", "action": "update-progress", "percent": 50, "phase": "Normalizing metadata"}
//! ```
//!
//! ## Delivery Semantics
//!
//! Delivery is best effort. Envelopes can be dropped (slow subscribers get
//! `RecvError::Lagged`), duplicated by a re-sending observer, and seen by
//! several listeners. Consumers must therefore be idempotent:
//!
//! - Command handlers use [`EnvelopeStream::deduplicate`] to drop repeated
//!   message ids.
//! - Observers fold updates through [`PanelState::apply`], which ignores stale
//!   progress and repeated button toggles.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{Action, JobToken, ProgressChannel};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let channel = ProgressChannel::new(32);
//! let token = JobToken::new("panel-1");
//! let mut updates = channel.stream().for_job(token.clone());
//!
//! channel.update_progress(&token, 30, "Fetching metadata");
//!
//! let envelope = updates.recv().await.unwrap();
//! assert_eq!(envelope.progress().unwrap().percent, 30);
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::RecvError;
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the progress channel.
///
/// An export job publishes fewer than a dozen envelopes, so this leaves room
/// for several concurrent jobs before subscribers start lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Number of message ids remembered by a deduplicating stream.
const DEDUP_WINDOW: usize = 256;

// ============================================================================
// Job Token
// ============================================================================

/// Identifies one export panel/job on the channel.
///
/// Tokens are chosen by the observer (usually a panel id), so any string is
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobToken(String);

impl JobToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Random token for callers that do not have a panel id.
    pub fn generate() -> Self {
        Self(format!("export-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for JobToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Everything that can travel on the channel.
///
/// The first group are commands issued by an observer; the second group are
/// updates published by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    /// Ask for a destination path from the host environment.
    Browse {
        /// Format the path is for; decides the dialog filter.
        #[serde(default)]
        format: Option<String>,
    },
    /// Tear down the control protocol for this token.
    Cancel,
    /// Start an export job.
    #[serde(rename_all = "camelCase")]
    Convert {
        /// Output format ("json" or "txt"); defaults to JSON.
        #[serde(default)]
        format: Option<String>,
        /// Destination path; defaults to the session's derived path.
        #[serde(default)]
        save_path: Option<String>,
        /// Canonical field names to export.
        #[serde(default)]
        selected_fields: Vec<String>,
    },
    /// Reveal the folder containing `save_path`.
    #[serde(rename_all = "camelCase")]
    OpenFolder { save_path: String },
    /// Tell the user that no metadata exists for this item.
    ShowNoMetadataNotification,

    /// Job progress checkpoint.
    UpdateProgress {
        /// Progress percentage (0-100).
        percent: u8,
        /// Current phase (e.g., "Fetching metadata").
        #[serde(default)]
        phase: String,
    },
    /// Job finished and the file was written.
    #[serde(rename_all = "camelCase")]
    ShowSuccessPopup { save_path: String, format: String },
    /// A destination path was chosen.
    UpdateSavePath { path: String },
    /// A job started; the observer should block further converts.
    DisableConvertButton,
    /// The job ended; converts may be issued again.
    EnableConvertButton,
}

impl Action {
    /// Returns true for observer-issued commands.
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Action::Browse { .. }
                | Action::Cancel
                | Action::Convert { .. }
                | Action::OpenFolder { .. }
                | Action::ShowNoMetadataNotification
        )
    }

    /// The wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Browse { .. } => "browse",
            Action::Cancel => "cancel",
            Action::Convert { .. } => "convert",
            Action::OpenFolder { .. } => "open-folder",
            Action::ShowNoMetadataNotification => "show-no-metadata-notification",
            Action::UpdateProgress { .. } => "update-progress",
            Action::ShowSuccessPopup { .. } => "show-success-popup",
            Action::UpdateSavePath { .. } => "update-save-path",
            Action::DisableConvertButton => "disable-convert-button",
            Action::EnableConvertButton => "enable-convert-button",
        }
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// A single message on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub job_token: JobToken,
    /// Set by observers that may re-send a command; receivers drop repeats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Uuid>,
    #[serde(flatten)]
    pub action: Action,
}

impl Envelope {
    pub fn new(job_token: JobToken, action: Action) -> Self {
        Self {
            job_token,
            message_id: None,
            action,
        }
    }

    /// Attach a fresh message id.
    pub fn with_message_id(mut self) -> Self {
        self.message_id = Some(Uuid::new_v4());
        self
    }

    /// Returns the progress event carried by an `update-progress` envelope.
    pub fn progress(&self) -> Option<ProgressEvent> {
        match &self.action {
            Action::UpdateProgress { percent, phase } => Some(ProgressEvent {
                job_token: self.job_token.clone(),
                percent: *percent,
                phase: phase.clone(),
            }),
            _ => None,
        }
    }
}

/// A progress checkpoint for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub job_token: JobToken,
    pub percent: u8,
    pub phase: String,
}

impl ProgressEvent {
    /// Builds an event, clamping `percent` into 0-100 and rounding.
    pub fn new(job_token: JobToken, percent: f64, phase: impl Into<String>) -> Self {
        Self {
            job_token,
            percent: clamp_percent(percent),
            phase: phase.into(),
        }
    }
}

impl From<ProgressEvent> for Envelope {
    fn from(event: ProgressEvent) -> Self {
        Envelope::new(
            event.job_token,
            Action::UpdateProgress {
                percent: event.percent.min(100),
                phase: event.phase,
            },
        )
    }
}

/// Clamp an arbitrary percentage into the 0-100 range.
pub fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

// ============================================================================
// Channel
// ============================================================================

/// Broadcast channel carrying [`Envelope`]s.
///
/// Cloning the channel clones the sender; every [`subscribe`](Self::subscribe)
/// creates an independent receiver that sees envelopes published after it was
/// created.
#[derive(Clone)]
pub struct ProgressChannel {
    sender: broadcast::Sender<Envelope>,
}

impl Default for ProgressChannel {
    /// Creates a channel with [`DEFAULT_CHANNEL_CAPACITY`].
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl ProgressChannel {
    /// Creates a channel buffering up to `capacity` envelopes per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an envelope to every current subscriber.
    ///
    /// Returns the number of subscribers reached. Publishing with nobody
    /// listening is not an error; the envelope is dropped.
    pub fn publish(&self, envelope: Envelope) -> usize {
        match self.sender.send(envelope) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(envelope)) => {
                trace!(
                    job = %envelope.job_token,
                    action = envelope.action.name(),
                    "No subscribers for envelope"
                );
                0
            }
        }
    }

    /// Publishes `action` for `job_token`.
    pub fn send(&self, job_token: &JobToken, action: Action) -> usize {
        self.publish(Envelope::new(job_token.clone(), action))
    }

    /// Publishes an `update-progress` envelope, clamping `percent` to 100.
    pub fn update_progress(&self, job_token: &JobToken, percent: u8, phase: &str) -> usize {
        self.send(
            job_token,
            Action::UpdateProgress {
                percent: percent.min(100),
                phase: phase.to_string(),
            },
        )
    }

    /// Creates a raw receiver.
    pub fn subscribe(&self) -> Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// Creates a filterable stream.
    pub fn stream(&self) -> EnvelopeStream {
        EnvelopeStream::new(self.subscribe())
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for ProgressChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressChannel")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Envelope Stream
// ============================================================================

type EnvelopeFilter = Box<dyn Fn(&Envelope) -> bool + Send + Sync>;

/// A receiver with optional filtering and message-id deduplication.
pub struct EnvelopeStream {
    receiver: Receiver<Envelope>,
    filters: Vec<EnvelopeFilter>,
    seen: Option<SeenIds>,
}

impl EnvelopeStream {
    pub fn new(receiver: Receiver<Envelope>) -> Self {
        Self {
            receiver,
            filters: Vec::new(),
            seen: None,
        }
    }

    /// Only yield envelopes matching `predicate`. Filters accumulate.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Envelope) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Box::new(predicate));
        self
    }

    /// Only yield envelopes addressed to `job_token`.
    pub fn for_job(self, job_token: JobToken) -> Self {
        self.filter(move |envelope| envelope.job_token == job_token)
    }

    /// Only yield observer commands.
    pub fn commands(self) -> Self {
        self.filter(|envelope| envelope.action.is_command())
    }

    /// Only yield core updates.
    pub fn updates(self) -> Self {
        self.filter(|envelope| !envelope.action.is_command())
    }

    /// Drop envelopes whose message id was already yielded.
    ///
    /// Envelopes without a message id always pass.
    pub fn deduplicate(mut self) -> Self {
        self.seen = Some(SeenIds::default());
        self
    }

    fn accept(&mut self, envelope: &Envelope) -> bool {
        if !self.filters.iter().all(|filter| filter(envelope)) {
            return false;
        }

        match (&mut self.seen, envelope.message_id) {
            (Some(seen), Some(id)) => seen.insert(id),
            _ => true,
        }
    }

    /// Receives the next envelope that passes the filters.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// envelopes, and `RecvError::Closed` once every sender is dropped.
    pub async fn recv(&mut self) -> Result<Envelope, RecvError> {
        loop {
            let envelope = self.receiver.recv().await?;
            if self.accept(&envelope) {
                return Ok(envelope);
            }
        }
    }

    /// Attempts to receive an envelope without blocking.
    ///
    /// Returns `None` if nothing matching is currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<Envelope, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => {
                    if self.accept(&envelope) {
                        return Some(Ok(envelope));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EnvelopeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvelopeStream")
            .field("filters", &self.filters.len())
            .field("deduplicate", &self.seen.is_some())
            .finish()
    }
}

/// Bounded set of recently seen message ids.
#[derive(Default)]
struct SeenIds {
    order: VecDeque<Uuid>,
    ids: HashSet<Uuid>,
}

impl SeenIds {
    /// Returns false if `id` was already seen.
    fn insert(&mut self, id: Uuid) -> bool {
        if !self.ids.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > DEDUP_WINDOW {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        true
    }
}

// ============================================================================
// Observer State
// ============================================================================

/// What an observer panel shows, folded from core updates.
///
/// [`apply`](Self::apply) is idempotent: replaying an update, or receiving an
/// older progress checkpoint after a newer one, leaves the state unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelState {
    pub percent: u8,
    pub phase: String,
    pub save_path: Option<String>,
    pub convert_enabled: bool,
    /// `(save_path, format)` of the last successful export.
    pub last_success: Option<(String, String)>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelState {
    pub fn new() -> Self {
        Self {
            percent: 0,
            phase: String::new(),
            save_path: None,
            convert_enabled: true,
            last_success: None,
        }
    }

    /// Folds one envelope into the state. Returns true if anything changed.
    ///
    /// Commands are ignored; they are not addressed to observers.
    pub fn apply(&mut self, envelope: &Envelope) -> bool {
        let before = self.clone();

        match &envelope.action {
            Action::UpdateProgress { percent, phase } => {
                let percent = (*percent).min(100);
                if percent > self.percent || (percent == self.percent && self.phase.is_empty()) {
                    self.percent = percent;
                    self.phase = phase.clone();
                }
            }
            Action::DisableConvertButton => {
                if self.convert_enabled {
                    // a new job starts from zero
                    self.convert_enabled = false;
                    self.percent = 0;
                    self.phase.clear();
                }
            }
            Action::EnableConvertButton => self.convert_enabled = true,
            Action::UpdateSavePath { path } => self.save_path = Some(path.clone()),
            Action::ShowSuccessPopup { save_path, format } => {
                self.save_path = Some(save_path.clone());
                self.last_success = Some((save_path.clone(), format.clone()));
            }
            _ => {}
        }

        *self != before
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> JobToken {
        JobToken::new("panel-1")
    }

    #[tokio::test]
    async fn test_channel_creation() {
        let channel = ProgressChannel::new(10);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_default_channel_buffers_default_capacity() {
        let channel = ProgressChannel::default();
        let mut receiver = channel.subscribe();

        for percent in 0..DEFAULT_CHANNEL_CAPACITY {
            channel.update_progress(&token(), (percent % 101) as u8, "Writing file");
        }

        let mut received = 0;
        while let Ok(_envelope) = receiver.try_recv() {
            received += 1;
        }
        assert_eq!(received, DEFAULT_CHANNEL_CAPACITY);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let channel = ProgressChannel::new(10);
        assert_eq!(channel.send(&token(), Action::Cancel), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_envelope() {
        let channel = ProgressChannel::new(10);
        let mut sub1 = channel.subscribe();
        let mut sub2 = channel.subscribe();

        let delivered = channel.update_progress(&token(), 50, "Normalizing metadata");
        assert_eq!(delivered, 2);

        let received1 = sub1.recv().await.unwrap();
        let received2 = sub2.recv().await.unwrap();
        assert_eq!(received1, received2);
        assert_eq!(received1.progress().unwrap().percent, 50);
    }

    #[tokio::test]
    async fn test_update_progress_clamps() {
        let channel = ProgressChannel::new(10);
        let mut sub = channel.subscribe();

        channel.update_progress(&token(), 250, "Done");

        let received = sub.recv().await.unwrap();
        assert_eq!(received.progress().unwrap().percent, 100);
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(-5.0), 0);
        assert_eq!(clamp_percent(42.6), 43);
        assert_eq!(clamp_percent(180.0), 100);
        assert_eq!(clamp_percent(f64::NAN), 0);
    }

    #[tokio::test]
    async fn test_stream_filters_by_job() {
        let channel = ProgressChannel::new(10);
        let mut stream = channel.stream().for_job(token());

        channel.update_progress(&JobToken::new("other"), 10, "Starting export");
        channel.update_progress(&token(), 30, "Fetching metadata");

        let received = stream.recv().await.unwrap();
        assert_eq!(received.job_token, token());
        assert_eq!(received.progress().unwrap().percent, 30);
    }

    #[tokio::test]
    async fn test_stream_splits_commands_and_updates() {
        let channel = ProgressChannel::new(10);
        let mut commands = channel.stream().commands();
        let mut updates = channel.stream().updates();

        channel.send(&token(), Action::DisableConvertButton);
        channel.send(&token(), Action::Cancel);

        assert_eq!(commands.recv().await.unwrap().action, Action::Cancel);
        assert_eq!(
            updates.recv().await.unwrap().action,
            Action::DisableConvertButton
        );
    }

    #[tokio::test]
    async fn test_deduplicate_drops_repeated_message_id() {
        let channel = ProgressChannel::new(10);
        let mut stream = channel.stream().deduplicate();

        let envelope = Envelope::new(token(), Action::Cancel).with_message_id();
        channel.publish(envelope.clone());
        channel.publish(envelope.clone());
        channel.publish(Envelope::new(token(), Action::ShowNoMetadataNotification));

        assert_eq!(stream.recv().await.unwrap(), envelope);
        assert_eq!(
            stream.recv().await.unwrap().action,
            Action::ShowNoMetadataNotification
        );
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let channel = ProgressChannel::new(2);
        let mut sub = channel.subscribe();

        for percent in [10, 30, 35, 50, 70] {
            channel.update_progress(&token(), percent, "Working");
        }

        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_envelope_wire_format() {
        let envelope = Envelope::new(
            token(),
            Action::ShowSuccessPopup {
                save_path: "/tmp/video.json".to_string(),
                format: "JSON".to_string(),
            },
        );

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "jobToken": "panel-1",
                "action": "show-success-popup",
                "savePath": "/tmp/video.json",
                "format": "JSON"
            })
        );
    }

    #[test]
    fn test_convert_command_parses_from_observer_json() {
        let json = r#"{
            "jobToken": "panel-9",
            "action": "convert",
            "format": "txt",
            "savePath": "C:\\out\\video.txt",
            "selectedFields": ["title", "views"]
        }"#;

        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.job_token, JobToken::new("panel-9"));
        assert_eq!(
            envelope.action,
            Action::Convert {
                format: Some("txt".to_string()),
                save_path: Some("C:\\out\\video.txt".to_string()),
                selected_fields: vec!["title".to_string(), "views".to_string()],
            }
        );
        assert!(envelope.action.is_command());
    }

    #[test]
    fn test_unit_action_parses_without_payload() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"jobToken": "p", "action": "cancel"}"#).unwrap();
        assert_eq!(envelope.action, Action::Cancel);
        assert_eq!(envelope.action.name(), "cancel");
    }

    #[test]
    fn test_progress_event_into_envelope() {
        let event = ProgressEvent::new(token(), 84.6, "Writing file");
        let envelope: Envelope = event.into();
        assert_eq!(
            envelope.action,
            Action::UpdateProgress {
                percent: 85,
                phase: "Writing file".to_string()
            }
        );
    }

    #[test]
    fn test_panel_state_ignores_stale_and_duplicate_updates() {
        let mut state = PanelState::new();
        let progress = |percent| {
            Envelope::new(
                token(),
                Action::UpdateProgress {
                    percent,
                    phase: format!("step {}", percent),
                },
            )
        };

        assert!(state.apply(&Envelope::new(token(), Action::DisableConvertButton)));
        assert!(state.apply(&progress(50)));
        assert!(!state.apply(&progress(50)));
        assert!(!state.apply(&progress(30)));
        assert!(!state.apply(&Envelope::new(token(), Action::DisableConvertButton)));
        assert_eq!(state.percent, 50);
        assert!(!state.convert_enabled);

        assert!(state.apply(&Envelope::new(token(), Action::EnableConvertButton)));
        assert!(state.convert_enabled);
    }

    #[test]
    fn test_panel_state_records_success() {
        let mut state = PanelState::new();
        let popup = Envelope::new(
            token(),
            Action::ShowSuccessPopup {
                save_path: "/tmp/a.txt".to_string(),
                format: "TXT".to_string(),
            },
        );

        assert!(state.apply(&popup));
        assert!(!state.apply(&popup));
        assert_eq!(
            state.last_success,
            Some(("/tmp/a.txt".to_string(), "TXT".to_string()))
        );
        assert_eq!(state.save_path.as_deref(), Some("/tmp/a.txt"));
    }

    #[test]
    fn test_panel_state_ignores_commands() {
        let mut state = PanelState::new();
        assert!(!state.apply(&Envelope::new(token(), Action::Cancel)));
    }
}
