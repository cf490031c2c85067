/// Hands out command sequence ids.
///
/// Ids start at 1, increase by one per command, and wrap from `u16::MAX`
/// back to 1. Zero is never produced, so a reply carrying sequence 0 can
/// always be discarded.
#[derive(Debug, Clone)]
pub struct SequenceAllocator {
    next: u16,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Start from `first`; 0 is bumped to 1.
    pub fn starting_at(first: u16) -> Self {
        Self {
            next: first.max(1),
        }
    }

    /// Take the next id.
    pub fn next_id(&mut self) -> u16 {
        let id = self.next;
        self.next = match id.checked_add(1) {
            Some(next) => next,
            None => 1,
        };
        id
    }

    /// The id the next call to [`next_id`](Self::next_id) returns.
    pub fn peek(&self) -> u16 {
        self.next
    }
}

impl Default for SequenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}
