//! Local notification dispatch for attendance reminders.

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::transition::Classification;

pub const DEFAULT_CHANNEL_ID: &str = "attendance-reminders";
pub const DEFAULT_SCREEN: &str = "Attendance";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    CheckIn,
    CheckOut,
}

impl ReminderKind {
    /// Reminder for a classified transition, if it warrants one.
    pub fn for_classification(classification: Classification) -> Option<Self> {
        match classification {
            Classification::Enter => Some(ReminderKind::CheckIn),
            Classification::Exit => Some(ReminderKind::CheckOut),
            Classification::Seed | Classification::NoOp => None,
        }
    }

    fn title(self) -> &'static str {
        match self {
            ReminderKind::CheckIn => "You're at the office",
            ReminderKind::CheckOut => "Leaving the office?",
        }
    }

    fn body(self) -> &'static str {
        match self {
            ReminderKind::CheckIn => "Don't forget to check in.",
            ReminderKind::CheckOut => "Don't forget to check out.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Default,
    High,
}

/// Declaration of the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
    pub importance: Importance,
}

impl Default for ChannelSpec {
    fn default() -> Self {
        Self {
            id: DEFAULT_CHANNEL_ID.to_string(),
            name: "Attendance reminders".to_string(),
            importance: Importance::High,
        }
    }
}

/// Deep-link payload read by the app's router when the user taps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub screen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceNotification {
    pub kind: ReminderKind,
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub data: NotificationData,
}

impl AttendanceNotification {
    pub fn new(kind: ReminderKind, channel_id: &str, screen: &str) -> Self {
        Self {
            kind,
            channel_id: channel_id.to_string(),
            title: kind.title().to_string(),
            body: kind.body().to_string(),
            data: NotificationData {
                screen: screen.to_string(),
            },
        }
    }
}

/// Platform notification subsystem.
#[allow(async_fn_in_trait)]
pub trait Notifier {
    /// Declare the channel; must succeed if it already exists.
    async fn ensure_channel(&self, channel: &ChannelSpec) -> Result<(), NotifyError>;
    async fn display(&self, notification: &AttendanceNotification) -> Result<(), NotifyError>;
}

impl<T: Notifier + ?Sized> Notifier for &T {
    async fn ensure_channel(&self, channel: &ChannelSpec) -> Result<(), NotifyError> {
        (**self).ensure_channel(channel).await
    }

    async fn display(&self, notification: &AttendanceNotification) -> Result<(), NotifyError> {
        (**self).display(notification).await
    }
}

/// What happened when a reminder was dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub kind: ReminderKind,
    pub displayed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct NotificationDispatcher<N> {
    notifier: N,
    channel: ChannelSpec,
    screen: String,
}

impl<N: Notifier> NotificationDispatcher<N> {
    pub fn new(notifier: N) -> Self {
        Self::with_channel(notifier, ChannelSpec::default(), DEFAULT_SCREEN)
    }

    pub fn with_channel(notifier: N, channel: ChannelSpec, screen: &str) -> Self {
        Self {
            notifier,
            channel,
            screen: screen.to_string(),
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Show one reminder. Failures are logged and reported, never raised,
    /// so the cycle always reaches its completion signal.
    pub async fn dispatch(&self, kind: ReminderKind) -> DispatchReport {
        if let Err(e) = self.notifier.ensure_channel(&self.channel).await {
            tracing::warn!(channel = %self.channel.id, error = %e, "channel declaration failed, displaying anyway");
        }

        let notification = AttendanceNotification::new(kind, &self.channel.id, &self.screen);
        match self.notifier.display(&notification).await {
            Ok(()) => {
                tracing::info!(?kind, screen = %self.screen, "attendance reminder shown");
                DispatchReport {
                    kind,
                    displayed: true,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(?kind, error = %e, "attendance reminder failed");
                DispatchReport {
                    kind,
                    displayed: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        fail_channel: bool,
        fail_display: bool,
        channels: Mutex<Vec<String>>,
        shown: Mutex<Vec<AttendanceNotification>>,
    }

    impl Notifier for Recorder {
        async fn ensure_channel(&self, channel: &ChannelSpec) -> Result<(), NotifyError> {
            self.channels.lock().unwrap().push(channel.id.clone());
            if self.fail_channel {
                return Err(NotifyError::ChannelFailed {
                    channel: channel.id.clone(),
                    message: "boom".into(),
                });
            }
            Ok(())
        }

        async fn display(&self, notification: &AttendanceNotification) -> Result<(), NotifyError> {
            if self.fail_display {
                return Err(NotifyError::DisplayFailed("no service".into()));
            }
            self.shown.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn declares_channel_before_every_display() {
        let recorder = Recorder::default();
        let dispatcher = NotificationDispatcher::new(&recorder);
        dispatcher.dispatch(ReminderKind::CheckIn).await;
        dispatcher.dispatch(ReminderKind::CheckOut).await;

        assert_eq!(recorder.channels.lock().unwrap().len(), 2);
        let shown = recorder.shown.lock().unwrap();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].kind, ReminderKind::CheckIn);
        assert_eq!(shown[0].data.screen, DEFAULT_SCREEN);
        assert_eq!(shown[1].title, "Leaving the office?");
    }

    #[tokio::test]
    async fn channel_failure_does_not_block_display() {
        let recorder = Recorder {
            fail_channel: true,
            ..Recorder::default()
        };
        let report = NotificationDispatcher::new(&recorder)
            .dispatch(ReminderKind::CheckIn)
            .await;
        assert!(report.displayed);
        assert_eq!(recorder.shown.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn display_failure_is_reported() {
        let recorder = Recorder {
            fail_display: true,
            ..Recorder::default()
        };
        let report = NotificationDispatcher::new(&recorder)
            .dispatch(ReminderKind::CheckOut)
            .await;
        assert!(!report.displayed);
        assert!(report.error.unwrap().contains("no service"));
    }

    #[test]
    fn only_edges_map_to_reminders() {
        assert_eq!(
            ReminderKind::for_classification(Classification::Enter),
            Some(ReminderKind::CheckIn)
        );
        assert_eq!(
            ReminderKind::for_classification(Classification::Exit),
            Some(ReminderKind::CheckOut)
        );
        assert_eq!(ReminderKind::for_classification(Classification::Seed), None);
        assert_eq!(ReminderKind::for_classification(Classification::NoOp), None);
    }

    #[test]
    fn payload_serializes_screen_field() {
        let n = AttendanceNotification::new(ReminderKind::CheckIn, DEFAULT_CHANNEL_ID, "Attendance");
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["data"]["screen"], "Attendance");
        assert_eq!(json["kind"], "check_in");
    }
}
