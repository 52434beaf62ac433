use std::collections::BTreeMap;

/// Identifies a load request in a deterministic, stable way.
///
/// Generations increase monotonically across all slots of a tracker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Request(pub u64);

/// Handed out when a load starts and given back when its payload arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket<K> {
    pub slot: K,
    pub request: Request,
    pub resource: String,
}

/// Result of handing a completed load back to its tracker.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Latest request for its slot; the caller should apply it.
    Current,
    /// A newer request for the same slot was issued; drop the payload.
    Superseded,
}

/// Latest-wins bookkeeping for in-flight loads, one lane per slot.
#[derive(Debug)]
pub struct RequestTracker<K> {
    next: u64,
    pending: BTreeMap<K, Request>,
}

impl<K: Ord + Copy> Default for RequestTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Copy> RequestTracker<K> {
    pub fn new() -> Self {
        Self {
            next: 1,
            pending: BTreeMap::new(),
        }
    }

    /// Starts a load for `slot`, superseding whatever was in flight there.
    pub fn begin(&mut self, slot: K, resource: impl Into<String>) -> LoadTicket<K> {
        let request = Request(self.next);
        self.next += 1;
        self.pending.insert(slot, request);
        LoadTicket {
            slot,
            request,
            resource: resource.into(),
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket<K>) -> bool {
        self.pending.get(&ticket.slot) == Some(&ticket.request)
    }

    /// Retires the ticket if it is still the latest for its slot.
    pub fn complete(&mut self, ticket: &LoadTicket<K>) -> Completion {
        if self.is_current(ticket) {
            self.pending.remove(&ticket.slot);
            Completion::Current
        } else {
            Completion::Superseded
        }
    }

    /// Returns `true` if a request was still pending for `slot`.
    pub fn cancel(&mut self, slot: K) -> bool {
        self.pending.remove(&slot).is_some()
    }

    pub fn is_pending(&self, slot: K) -> bool {
        self.pending.contains_key(&slot)
    }

    pub fn any_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Completion, RequestTracker};

    #[test]
    fn latest_request_wins_per_slot() {
        let mut t: RequestTracker<u8> = RequestTracker::new();
        let first = t.begin(0, "a.json");
        let second = t.begin(0, "b.json");
        let other = t.begin(1, "c.json");
        assert!(second.request > first.request);

        assert_eq!(t.complete(&first), Completion::Superseded);
        assert!(t.is_pending(0));
        assert_eq!(t.complete(&second), Completion::Current);
        assert!(!t.is_pending(0));
        assert!(t.any_pending());

        assert!(t.cancel(1));
        assert_eq!(t.complete(&other), Completion::Superseded);
        assert!(!t.any_pending());
    }

    #[test]
    fn completing_twice_is_superseded() {
        let mut t: RequestTracker<u8> = RequestTracker::new();
        let ticket = t.begin(0, "a.json");
        assert_eq!(t.complete(&ticket), Completion::Current);
        assert_eq!(t.complete(&ticket), Completion::Superseded);
    }
}
