// ── Modeless-dialog registry ──────────────────────────────────────────────────
//
// The owner window's set of live modeless dialogs.  The message loop walks
// this set to give dialog keyboard navigation (`IsDialogMessageW`) first
// claim on every retrieved message, so membership must exactly track the
// RUNNING_MODELESS lifetime: inserted when the dialog is created, removed
// when it closes.  Handles travel as plain integers; the set itself is pure
// and owned by the main window, never a process-wide global.

/// Live modeless dialog handles, in creation order.
#[derive(Debug, Default)]
pub(crate) struct DialogSet {
    handles: Vec<isize>,
}

impl DialogSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Track a newly created dialog.  Re-inserting a live handle is a no-op.
    pub(crate) fn insert(&mut self, hwnd: isize) {
        if !self.handles.contains(&hwnd) {
            self.handles.push(hwnd);
        }
    }

    /// Stop tracking a closed dialog.  Unknown handles are a no-op.
    pub(crate) fn remove(&mut self, hwnd: isize) {
        self.handles.retain(|&h| h != hwnd);
    }

    /// Snapshot for the message loop: the loop must not hold a borrow while
    /// routing, because `IsDialogMessageW` can re-enter and close a dialog.
    pub(crate) fn snapshot(&self) -> Vec<isize> {
        self.handles.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_dialog_leaves_the_set() {
        let mut set = DialogSet::new();
        set.insert(0x10);
        set.insert(0x20);
        assert_eq!(set.snapshot(), vec![0x10, 0x20]);

        set.remove(0x10);
        assert_eq!(
            set.snapshot(),
            vec![0x20],
            "closed dialog must not be routed to"
        );
    }

    #[test]
    fn double_insert_and_unknown_remove_are_noops() {
        let mut set = DialogSet::new();
        set.insert(0x10);
        set.insert(0x10);
        assert_eq!(set.snapshot().len(), 1);
        set.remove(0x99);
        assert_eq!(set.snapshot().len(), 1);
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let mut set = DialogSet::new();
        set.insert(0x10);
        let snap = set.snapshot();
        set.remove(0x10);
        assert_eq!(snap, vec![0x10]);
        assert!(set.snapshot().is_empty());
    }
}
