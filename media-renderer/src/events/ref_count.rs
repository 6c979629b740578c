/// Listener reference count shared by every event kind
///
/// Both operations return the resulting count so callers can act on the
/// 0 -> 1 and 1 -> 0 edges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefCount(usize);

impl RefCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self) -> usize {
        self.0 += 1;
        self.0
    }

    /// Never goes below zero
    pub fn release(&mut self) -> usize {
        self.0 = self.0.saturating_sub(1);
        self.0
    }

    pub fn get(&self) -> usize {
        self.0
    }
}
