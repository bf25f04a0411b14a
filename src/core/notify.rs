//! User notifications
//!
//! Everything the user should see travels as a [`Notice`] over an unbounded
//! channel. Sending never blocks, and a closed receiver only drops messages.

use log::debug;
use tokio::sync::mpsc;

/// A message for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Warning(String),
    Error(String),
    /// A compute request went in flight
    Busy(String),
    /// The in-flight request settled
    Idle,
}

impl Notice {
    /// Message text, if the notice carries one
    pub fn message(&self) -> Option<&str> {
        match self {
            Notice::Info(m) | Notice::Warning(m) | Notice::Error(m) | Notice::Busy(m) => Some(m),
            Notice::Idle => None,
        }
    }
}

/// Sending half of the notice channel
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    /// Create a connected notifier and the receiver for the UI layer
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier that discards everything
    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn send(&self, notice: Notice) {
        if let Some(tx) = &self.tx {
            if tx.send(notice).is_err() {
                debug!("Notice receiver closed, dropping notice");
            }
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.send(Notice::Info(message.into()));
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.send(Notice::Warning(message.into()));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(Notice::Error(message.into()));
    }
}
