use crate::error::{LayoutError, LayoutErrorKind};
use crate::source_location::SourcePos;

/// Tracks the pack directives seen so far, in source order.
///
/// Each pack-on directive pushes a cap (or `None` for an explicit return to
/// natural alignment inside an outer region); pack-off pops. The cap in
/// effect when an aggregate declaration closes is the one used for that
/// aggregate, and later directives never touch layouts already computed.
pub struct PackingState {
    stack: Vec<Entry>,
}

struct Entry {
    cap: Option<u32>,
    pos: Option<SourcePos>,
}

impl Default for PackingState {
    fn default() -> Self {
        Self::new()
    }
}

impl PackingState {
    pub fn new() -> PackingState {
        PackingState { stack: Vec::new() }
    }

    pub fn push(&mut self, cap: Option<u32>, pos: Option<SourcePos>) {
        self.stack.push(Entry { cap, pos });
    }

    pub fn pop(&mut self, pos: Option<SourcePos>) -> Result<(), LayoutError> {
        if self.stack.pop().is_none() {
            let mut err = LayoutError::new(LayoutErrorKind::UnbalancedPackingDirective);
            if let Some(pos) = pos {
                err = err.at(pos);
            }
            return Err(err);
        }

        Ok(())
    }

    /// The cap active right now: top of the stack, or no cap when empty.
    pub fn effective_cap(&self) -> Option<u32> {
        self.stack.last().and_then(|entry| entry.cap)
    }

    pub fn is_balanced(&self) -> bool {
        self.stack.is_empty()
    }

    /// Position of the innermost push that was never popped, for the
    /// end-of-header diagnostic.
    pub fn dangling_push(&self) -> Option<SourcePos> {
        self.stack.last().and_then(|entry| entry.pos)
    }

    /// Drop all pending directives. Used for error recovery after an
    /// unbalanced pop so the rest of the header is laid out unpacked.
    pub fn reset(&mut self) {
        self.stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutErrorKind;
    use crate::source_location::SourcePos;

    #[test]
    fn cap_follows_the_top_of_the_stack() {
        let mut pack = PackingState::new();
        assert_eq!(pack.effective_cap(), None);

        pack.push(Some(4), None);
        assert_eq!(pack.effective_cap(), Some(4));

        pack.push(Some(1), None);
        assert_eq!(pack.effective_cap(), Some(1));

        pack.push(None, None);
        assert_eq!(pack.effective_cap(), None);

        pack.pop(None).unwrap();
        pack.pop(None).unwrap();
        assert_eq!(pack.effective_cap(), Some(4));

        pack.pop(None).unwrap();
        assert!(pack.is_balanced());
    }

    #[test]
    fn pop_on_empty_stack_is_an_error() {
        let mut pack = PackingState::new();
        let err = pack.pop(Some(SourcePos::new(12, 1))).unwrap_err();

        assert_eq!(err.kind, LayoutErrorKind::UnbalancedPackingDirective);
        assert_eq!(err.pos, Some(SourcePos::new(12, 1)));
    }

    #[test]
    fn reset_clears_pending_directives() {
        let mut pack = PackingState::new();
        pack.push(Some(2), Some(SourcePos::new(3, 1)));
        assert_eq!(pack.dangling_push(), Some(SourcePos::new(3, 1)));

        pack.reset();
        assert!(pack.is_balanced());
        assert_eq!(pack.effective_cap(), None);
    }
}
