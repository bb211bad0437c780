//! Session-wide id allocation.
//!
//! Four independent counters, never reused. The portgroup counter starts at
//! 1 because 0 means "ungrouped" on the canvas side.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Group,
    Port,
    Portgroup,
    Connection,
}

#[derive(Debug, Clone)]
pub struct IdAllocator {
    next_group: u64,
    next_port: u64,
    next_portgroup: u64,
    next_connection: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            next_group: 0,
            next_port: 0,
            next_portgroup: 1,
            next_connection: 0,
        }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a fresh id for `kind`.
    pub fn next(&mut self, kind: IdKind) -> u64 {
        let counter = match kind {
            IdKind::Group => &mut self.next_group,
            IdKind::Port => &mut self.next_port,
            IdKind::Portgroup => &mut self.next_portgroup,
            IdKind::Connection => &mut self.next_connection,
        };
        let id = *counter;
        *counter += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_independent() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next(IdKind::Group), 0);
        assert_eq!(ids.next(IdKind::Group), 1);
        assert_eq!(ids.next(IdKind::Port), 0);
        assert_eq!(ids.next(IdKind::Portgroup), 1);
        assert_eq!(ids.next(IdKind::Portgroup), 2);
        assert_eq!(ids.next(IdKind::Connection), 0);
        assert_eq!(ids.next(IdKind::Group), 2);
    }
}
