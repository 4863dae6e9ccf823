//! History backends.

use std::sync::Mutex;

/// Session history the router commits to.
///
/// `back`/`forward` move the cursor and return the URL now current, or
/// `None` at either end.
pub trait HistoryBackend: Send + Sync {
    fn push(&self, url: &str);
    fn replace(&self, url: &str);
    fn current(&self) -> Option<String>;
    fn back(&self) -> Option<String>;
    fn forward(&self) -> Option<String>;
}

#[derive(Debug, Default)]
struct Entries {
    urls: Vec<String>,
    cursor: usize,
}

/// In-process history stack.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: Mutex<Entries>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(url: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                urls: vec![url.into()],
                cursor: 0,
            }),
        }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("history mutex poisoned")
            .urls
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("history mutex poisoned").urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryBackend for MemoryHistory {
    fn push(&self, url: &str) {
        let mut entries = self.entries.lock().expect("history mutex poisoned");
        if !entries.urls.is_empty() {
            let keep = entries.cursor + 1;
            entries.urls.truncate(keep);
        }
        entries.urls.push(url.to_string());
        entries.cursor = entries.urls.len() - 1;
    }

    fn replace(&self, url: &str) {
        let mut entries = self.entries.lock().expect("history mutex poisoned");
        let cursor = entries.cursor;
        match entries.urls.get_mut(cursor) {
            Some(slot) => *slot = url.to_string(),
            None => entries.urls.push(url.to_string()),
        }
    }

    fn current(&self) -> Option<String> {
        let entries = self.entries.lock().expect("history mutex poisoned");
        entries.urls.get(entries.cursor).cloned()
    }

    fn back(&self) -> Option<String> {
        let mut entries = self.entries.lock().expect("history mutex poisoned");
        if entries.cursor == 0 {
            return None;
        }
        entries.cursor -= 1;
        entries.urls.get(entries.cursor).cloned()
    }

    fn forward(&self) -> Option<String> {
        let mut entries = self.entries.lock().expect("history mutex poisoned");
        if entries.cursor + 1 >= entries.urls.len() {
            return None;
        }
        entries.cursor += 1;
        entries.urls.get(entries.cursor).cloned()
    }
}
