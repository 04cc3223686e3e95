//! Dismissible notifications raised by the pipelines.

use std::collections::VecDeque;

/// Notifications kept before the oldest is dropped.
const MAX_NOTIFICATIONS: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationTone {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationTone {
    /// Badge label and RGB colour.
    pub fn badge(self) -> (&'static str, (u8, u8, u8)) {
        match self {
            Self::Info => ("Info", (31, 139, 255)),
            Self::Success => ("Done", (64, 140, 112)),
            Self::Warning => ("Warning", (192, 138, 43)),
            Self::Error => ("Error", (192, 57, 43)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub tone: NotificationTone,
    pub title: String,
    pub detail: Option<String>,
}

#[derive(Debug)]
pub struct Notifications {
    items: VecDeque<Notification>,
    next_id: u64,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
            next_id: 1,
        }
    }
}

impl Notifications {
    pub fn push(
        &mut self,
        tone: NotificationTone,
        title: impl Into<String>,
        detail: Option<String>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.items.push_back(Notification {
            id,
            tone,
            title: title.into(),
            detail,
        });
        while self.items.len() > MAX_NOTIFICATIONS {
            self.items.pop_front();
        }
        id
    }

    /// Remove a notification; returns false when it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&Notification> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
