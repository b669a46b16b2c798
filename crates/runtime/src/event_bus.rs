use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A user-facing message, stamped with the number of frames presented when
/// it was raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub frame_index: u64,
    pub severity: Severity,
    pub message: String,
}

/// Notices kept before the oldest are dropped.
pub const MAX_NOTICES: usize = 64;

/// Bounded queue of notices; hosts drain it when they update the UI.
#[derive(Debug, Default)]
pub struct EventBus {
    notices: Vec<Notice>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            notices: Vec::new(),
        }
    }

    pub fn emit(&mut self, frame_index: u64, severity: Severity, message: impl Into<String>) {
        if self.notices.len() >= MAX_NOTICES {
            let excess = self.notices.len() + 1 - MAX_NOTICES;
            self.notices.drain(..excess);
        }
        self.notices.push(Notice {
            frame_index,
            severity,
            message: message.into(),
        });
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
