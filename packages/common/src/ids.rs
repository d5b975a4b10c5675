/// Source of fresh entity ids for an editing session
pub trait IdGenerator: Send {
    /// Allocate a new id, never returned before by this generator
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs, used for real editing sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Predictable ids (`item-0`, `item-1`, ...) for tests
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_ids_are_predictable() {
        let mut ids = SequentialIdGenerator::new("item");
        assert_eq!(ids.next_id(), "item-0");
        assert_eq!(ids.next_id(), "item-1");
    }

    #[test]
    fn test_uuid_ids_do_not_repeat() {
        let mut ids = UuidGenerator;
        let seen: HashSet<String> = (0..64).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 64);
    }
}
