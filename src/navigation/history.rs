use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Browser-style session history as seen by the orchestrator
pub trait HistoryHost {
    /// Query string of the current entry, without the leading `?`
    fn current_query(&self) -> String;
    /// New entry for user navigation
    fn push_state(&mut self, query: &str);
    /// Rewrite the current entry for passive sync
    fn replace_state(&mut self, query: &str);
}

/// Write recorded by [`MemoryHistory`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryOp {
    Push(String),
    Replace(String),
}

#[derive(Debug)]
struct Entries {
    /// Oldest first
    entries: VecDeque<String>,
    /// Index of the current entry
    position: usize,
    max_size: usize,
    ops: Vec<HistoryOp>,
}

/// In-memory history with back/forward, bounded like a jump list.
///
/// Cloned handles share the same entries, so a test can keep one and hand the
/// other to the orchestrator.
#[derive(Clone, Debug)]
pub struct MemoryHistory {
    inner: Rc<RefCell<Entries>>,
}

impl MemoryHistory {
    pub const DEFAULT_MAX_SIZE: usize = 100;

    pub fn new(initial_query: &str) -> Self {
        Self::with_max_size(initial_query, Self::DEFAULT_MAX_SIZE)
    }

    pub fn with_max_size(initial_query: &str, max_size: usize) -> Self {
        let max_size = max_size.max(1);
        let mut entries = VecDeque::with_capacity(max_size);
        entries.push_back(strip(initial_query).to_string());
        Self {
            inner: Rc::new(RefCell::new(Entries {
                entries,
                position: 0,
                max_size,
                ops: Vec::new(),
            })),
        }
    }

    /// Step back; returns the query to hand to `on_history_pop`
    pub fn back(&self) -> Option<String> {
        let mut inner = self.inner.borrow_mut();
        if inner.position == 0 {
            return None;
        }
        inner.position -= 1;
        inner.entries.get(inner.position).cloned()
    }

    pub fn forward(&self) -> Option<String> {
        let mut inner = self.inner.borrow_mut();
        if inner.position + 1 >= inner.entries.len() {
            return None;
        }
        inner.position += 1;
        inner.entries.get(inner.position).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    pub fn entries(&self) -> Vec<String> {
        self.inner.borrow().entries.iter().cloned().collect()
    }

    pub fn ops(&self) -> Vec<HistoryOp> {
        self.inner.borrow().ops.clone()
    }

    pub fn push_count(&self) -> usize {
        self.inner
            .borrow()
            .ops
            .iter()
            .filter(|op| matches!(op, HistoryOp::Push(_)))
            .count()
    }
}

fn strip(query: &str) -> &str {
    query.trim_start_matches('?')
}

impl HistoryHost for MemoryHistory {
    fn current_query(&self) -> String {
        let inner = self.inner.borrow();
        inner.entries.get(inner.position).cloned().unwrap_or_default()
    }

    fn push_state(&mut self, query: &str) {
        let mut inner = self.inner.borrow_mut();
        let query = strip(query).to_string();
        inner.ops.push(HistoryOp::Push(query.clone()));

        // Pushing drops anything forward of the current entry
        let keep = inner.position + 1;
        inner.entries.truncate(keep);
        inner.entries.push_back(query);
        while inner.entries.len() > inner.max_size {
            inner.entries.pop_front();
        }
        inner.position = inner.entries.len() - 1;
    }

    fn replace_state(&mut self, query: &str) {
        let mut inner = self.inner.borrow_mut();
        let query = strip(query).to_string();
        inner.ops.push(HistoryOp::Replace(query.clone()));
        let position = inner.position;
        if let Some(entry) = inner.entries.get_mut(position) {
            *entry = query;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_and_forward() {
        let mut history = MemoryHistory::new("?page=1");
        history.push_state("page=2");
        history.push_state("page=3");

        assert_eq!(history.back().as_deref(), Some("page=2"));
        assert_eq!(history.back().as_deref(), Some("page=1"));
        assert_eq!(history.back(), None);
        assert_eq!(history.forward().as_deref(), Some("page=2"));
        assert_eq!(history.current_query(), "page=2");
    }

    #[test]
    fn push_after_back_drops_forward_entries() {
        let mut history = MemoryHistory::new("page=1");
        history.push_state("page=2");
        history.push_state("page=3");
        history.back();
        history.push_state("page=9");

        assert_eq!(history.entries(), vec!["page=1", "page=2", "page=9"]);
        assert_eq!(history.forward(), None);
    }

    #[test]
    fn replace_rewrites_current_entry_only() {
        let mut history = MemoryHistory::new("page=1");
        history.push_state("page=2");
        history.replace_state("page=2&chunk=a");

        assert_eq!(history.entries(), vec!["page=1", "page=2&chunk=a"]);
        assert_eq!(history.push_count(), 1);
    }

    #[test]
    fn bounded_like_a_ring() {
        let mut history = MemoryHistory::with_max_size("page=0", 3);
        for i in 1..5 {
            history.push_state(&format!("page={i}"));
        }
        assert_eq!(history.entries(), vec!["page=2", "page=3", "page=4"]);
        assert_eq!(history.current_query(), "page=4");
    }
}
