//! Status line and rolling message log for the progress UI.

use std::collections::VecDeque;

/// Messages kept in the rolling log.
pub const MAX_MESSAGES: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct StatusLog {
    status: String,
    messages: VecDeque<String>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Replace the status line and log it.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        let message = self.status.clone();
        self.push(message);
    }

    /// Replace the status line without logging; used for countdown updates.
    pub fn set_status_quiet(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Append a message unless it repeats the last one. Oldest entries fall off.
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.messages.back() == Some(&message) {
            return;
        }
        if self.messages.len() == MAX_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.status.clear();
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_immediate_repeats() {
        let mut log = StatusLog::new();
        log.push("a");
        log.push("a");
        log.push("b");
        log.push("a");
        assert_eq!(log.messages(), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_capped() {
        let mut log = StatusLog::new();
        for i in 0..20 {
            log.push(format!("m{i}"));
        }
        let messages = log.messages();
        assert_eq!(messages.len(), MAX_MESSAGES);
        assert_eq!(messages[0], "m12");
        assert_eq!(messages[MAX_MESSAGES - 1], "m19");
    }

    #[test]
    fn test_status_is_logged() {
        let mut log = StatusLog::new();
        log.set_status("Initializing...");
        log.set_status_quiet("Listening (Pre), 9s left");
        assert_eq!(log.status(), "Listening (Pre), 9s left");
        assert_eq!(log.messages(), vec!["Initializing..."]);
    }
}
