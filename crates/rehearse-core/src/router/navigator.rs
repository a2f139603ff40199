use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

/// Stream of paths, one per navigation.
pub type PathChanges = mpsc::UnboundedReceiver<String>;

/// Navigation capability provided by the host.
///
/// `set_path` only changes the addressable path; the resulting change event
/// is what triggers routing.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;

    /// Moves to `path`. Emits one change unless `path` is already current.
    fn set_path(&self, path: &str);

    /// Subscribes to subsequent path changes.
    fn subscribe(&self) -> PathChanges;
}

#[derive(Debug)]
struct History {
    entries: Vec<String>,
    index: usize,
    subscribers: Vec<mpsc::UnboundedSender<String>>,
}

impl History {
    fn current(&self) -> &str {
        &self.entries[self.index]
    }

    fn emit(&mut self) {
        let path = self.current().to_string();
        self.subscribers
            .retain(|subscriber| subscriber.send(path.clone()).is_ok());
    }
}

/// In-memory navigator with back/forward history.
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<History>,
}

impl HistoryNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(History {
                entries: vec![initial.into()],
                index: 0,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Steps back one entry. Returns false at the start of history.
    pub fn back(&self) -> bool {
        let mut history = self.lock();
        if history.index == 0 {
            return false;
        }
        history.index -= 1;
        history.emit();
        true
    }

    /// Steps forward one entry. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        let mut history = self.lock();
        if history.index + 1 >= history.entries.len() {
            return false;
        }
        history.index += 1;
        history.emit();
        true
    }

    pub fn history(&self) -> Vec<String> {
        self.lock().entries.clone()
    }

    fn lock(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for HistoryNavigator {
    fn current_path(&self) -> String {
        self.lock().current().to_string()
    }

    fn set_path(&self, path: &str) {
        let mut history = self.lock();
        if history.current() == path {
            return;
        }
        let next = history.index + 1;
        history.entries.truncate(next);
        history.entries.push(path.to_string());
        history.index = next;
        history.emit();
    }

    fn subscribe(&self) -> PathChanges {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }
}
