use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use crate::{
    error::SessionError,
    window::{ChatWindow, WindowTarget},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowSlot {
    Diagnostic,
    Feed,
    Log,
    BackendLog,
    Chat(usize),
}

impl WindowSlot {
    pub const MIN_INDEX: i64 = -4;

    pub fn index(self) -> i64 {
        match self {
            WindowSlot::Diagnostic => -1,
            WindowSlot::Feed => -2,
            WindowSlot::Log => -3,
            WindowSlot::BackendLog => -4,
            WindowSlot::Chat(i) => i as i64,
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            -1 => Some(WindowSlot::Diagnostic),
            -2 => Some(WindowSlot::Feed),
            -3 => Some(WindowSlot::Log),
            -4 => Some(WindowSlot::BackendLog),
            i if i >= 0 => Some(WindowSlot::Chat(i as usize)),
            _ => None,
        }
    }

    pub fn is_special(self) -> bool {
        !matches!(self, WindowSlot::Chat(_))
    }

    pub fn updated_label(self) -> String {
        match self {
            WindowSlot::Feed => "feed".to_string(),
            slot => (slot.index() + 1).to_string(),
        }
    }
}

impl Ord for WindowSlot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index().cmp(&other.index())
    }
}

impl PartialOrd for WindowSlot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowLabel {
    pub active: String,
    pub updated: Vec<String>,
    pub mentioned: BTreeSet<String>,
}

pub struct WindowRegistry {
    windows: Vec<Arc<ChatWindow>>,
    active: WindowSlot,
    prev_active: WindowSlot,
    updated: BTreeMap<WindowSlot, bool>,
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self {
            windows: Vec::new(),
            active: WindowSlot::Diagnostic,
            prev_active: WindowSlot::Diagnostic,
            updated: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Arc<ChatWindow>> {
        self.windows.get(index).cloned()
    }

    pub fn windows(&self) -> Vec<Arc<ChatWindow>> {
        self.windows.clone()
    }

    pub fn find(&self, target: &WindowTarget) -> Option<Arc<ChatWindow>> {
        self.windows.iter().find(|w| w.target() == *target).cloned()
    }

    pub fn position(&self, window: &Arc<ChatWindow>) -> Option<usize> {
        self.windows.iter().position(|w| Arc::ptr_eq(w, window))
    }

    pub fn insert(&mut self, window: Arc<ChatWindow>) -> usize {
        self.windows.push(window);
        let index = self.windows.len() - 1;
        self.updated.insert(WindowSlot::Chat(index), false);
        index
    }

    pub fn active(&self) -> WindowSlot {
        self.active
    }

    pub fn prev_active(&self) -> WindowSlot {
        self.prev_active
    }

    pub fn active_window(&self) -> Option<Arc<ChatWindow>> {
        match self.active {
            WindowSlot::Chat(i) => self.windows.get(i).cloned(),
            _ => None,
        }
    }

    pub fn is_active(&self, window: &Arc<ChatWindow>) -> bool {
        self.active_window()
            .is_some_and(|active| Arc::ptr_eq(&active, window))
    }

    fn is_valid(&self, slot: WindowSlot) -> bool {
        match slot {
            WindowSlot::Chat(i) => i < self.windows.len(),
            _ => true,
        }
    }

    pub fn set_active(&mut self, slot: WindowSlot) -> Result<bool, SessionError> {
        if !self.is_valid(slot) {
            return Err(SessionError::InvalidWindow(slot));
        }
        let changed = slot != self.active;
        if changed {
            self.prev_active = self.active;
        }
        self.updated.remove(&slot);
        self.active = slot;
        Ok(changed)
    }

    pub fn set_active_index(&mut self, index: i64) -> Result<(WindowSlot, bool), SessionError> {
        let slot = WindowSlot::from_index(index).ok_or(SessionError::InvalidWindowIndex(index))?;
        Ok((slot, self.set_active(slot)?))
    }

    pub fn relative_slot(&self, delta: i64) -> Option<WindowSlot> {
        let index = self.active.index() + delta;
        if index < WindowSlot::MIN_INDEX {
            return None;
        }
        WindowSlot::from_index(index).filter(|slot| self.is_valid(*slot))
    }

    /// Removes the window at `index`, shifting the updated flags of every
    /// later window down by one.
    pub fn close(&mut self, index: usize) -> Option<Arc<ChatWindow>> {
        if index >= self.windows.len() {
            return None;
        }
        let removed = self.windows.remove(index);
        self.updated.remove(&WindowSlot::Chat(index));

        // Ascending order so a shifted key never overwrites one not yet moved.
        let later: Vec<usize> = self
            .updated
            .keys()
            .filter_map(|slot| match slot {
                WindowSlot::Chat(i) if *i > index => Some(*i),
                _ => None,
            })
            .collect();
        for i in later {
            if let Some(mentioned) = self.updated.remove(&WindowSlot::Chat(i)) {
                self.updated.insert(WindowSlot::Chat(i - 1), mentioned);
            }
        }

        match self.active {
            WindowSlot::Chat(i) if i > index => self.active = WindowSlot::Chat(i - 1),
            _ => {}
        }
        match self.prev_active {
            WindowSlot::Chat(i) if i == index => self.prev_active = WindowSlot::Diagnostic,
            WindowSlot::Chat(i) if i > index => self.prev_active = WindowSlot::Chat(i - 1),
            _ => {}
        }
        Some(removed)
    }

    pub fn close_active(&mut self) -> Result<usize, SessionError> {
        match self.active {
            WindowSlot::Chat(index) if index < self.windows.len() => {
                self.close(index);
                Ok(index)
            }
            slot => Err(SessionError::InvalidWindow(slot)),
        }
    }

    /// Flags an inactive window as updated. The mention flag only ever goes
    /// from false to true. Returns whether the window is the active one.
    pub fn mark_updated(&mut self, window: &Arc<ChatWindow>, mentioned: bool) -> bool {
        let Some(index) = self.position(window) else {
            return false;
        };
        let slot = WindowSlot::Chat(index);
        if slot == self.active {
            return true;
        }
        let entry = self.updated.entry(slot).or_insert(mentioned);
        *entry |= mentioned;
        false
    }

    pub fn mark_special_updated(&mut self, slot: WindowSlot) {
        if matches!(slot, WindowSlot::Diagnostic | WindowSlot::Feed) && slot != self.active {
            self.updated.entry(slot).or_insert(false);
        }
    }

    pub fn mark_seen(&mut self, slot: WindowSlot) {
        self.updated.remove(&slot);
    }

    pub fn updated(&self, slot: WindowSlot) -> Option<bool> {
        self.updated.get(&slot).copied()
    }

    pub fn label(&self) -> WindowLabel {
        let active = match self.active {
            WindowSlot::Diagnostic => "0:console".to_string(),
            WindowSlot::Log => "log".to_string(),
            WindowSlot::BackendLog => "lnlog".to_string(),
            WindowSlot::Feed => "feed".to_string(),
            WindowSlot::Chat(i) => self
                .windows
                .get(i)
                .map(|w| format!("{}:{}", i + 1, w.alias()))
                .unwrap_or_default(),
        };

        let mut label = WindowLabel {
            active,
            ..WindowLabel::default()
        };
        for (slot, mentioned) in &self.updated {
            let name = slot.updated_label();
            if *mentioned {
                label.mentioned.insert(name.clone());
            }
            label.updated.push(name);
        }
        label
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
