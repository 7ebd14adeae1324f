//! Single-slot user-visible notices

use std::sync::{Arc, Mutex};

use crate::unpoison;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// The notice currently shown to the user; a new notice replaces the old one
#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    slot: Arc<Mutex<Option<Notice>>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&self, notice: Notice) {
        *unpoison(self.slot.lock()) = Some(notice);
    }

    pub fn show_info(&self, message: impl Into<String>) {
        self.show(Notice::info(message));
    }

    pub fn show_error(&self, message: impl Into<String>) {
        self.show(Notice::error(message));
    }

    pub fn show_success(&self, message: impl Into<String>) {
        self.show(Notice::success(message));
    }

    pub fn current(&self) -> Option<Notice> {
        unpoison(self.slot.lock()).clone()
    }

    pub fn clear(&self) {
        *unpoison(self.slot.lock()) = None;
    }
}
