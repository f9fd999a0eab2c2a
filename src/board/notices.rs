//! Ephemeral user-visible notices.
//!
//! A notice replaces whatever was showing and disappears on its own once its
//! time-to-live elapses. Expiry is evaluated lazily against `tokio::time`, so
//! nothing has to be spawned to clear it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

/// Default lifetime of a notice.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    PermissionDenied,
    MoveFailed,
    IntegrityWarning,
    Busy,
    Info,
}

impl NoticeKind {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::MoveFailed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug)]
struct Slot {
    notice: Notice,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct Notices {
    ttl: Duration,
    slot: Arc<Mutex<Option<Slot>>>,
}

impl Default for Notices {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_TTL)
    }
}

impl Notices {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn push(&self, kind: NoticeKind, message: impl Into<String>) {
        let notice = Notice {
            kind,
            message: message.into(),
        };
        tracing::debug!(?kind, message = %notice.message, "notice shown");
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Slot {
            notice,
            expires_at: Instant::now() + self.ttl,
        });
    }

    /// The visible notice, if one was pushed and has not yet expired.
    pub fn current(&self) -> Option<Notice> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some(s) if Instant::now() < s.expires_at => Some(s.notice.clone()),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    pub fn dismiss(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}
