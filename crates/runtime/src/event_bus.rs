use layers::ViewKind;

use crate::state::Slot;

/// Monotonic counter of committed state changes.
///
/// Every logical change the coordinator applies bumps the revision once, so
/// a trace can be replayed and compared without wall-clock time.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub u64);

impl Revision {
    pub fn next(self) -> Self {
        Revision(self.0 + 1)
    }
}

/// One coordinator change: which slot it concerned and which views it refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub revision: Revision,
    pub kind: &'static str,
    /// `None` for changes that are not about one dataset (highlight, styling, resize).
    pub slot: Option<Slot>,
    /// Views handed to the presenter, in presentation order. Empty for discarded loads.
    pub views: Vec<ViewKind>,
    pub message: String,
}

impl Event {
    pub fn new(revision: Revision, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            revision,
            kind,
            slot: None,
            views: Vec::new(),
            message: message.into(),
        }
    }

    pub fn for_slot(mut self, slot: Slot) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn refreshing(mut self, views: &[ViewKind]) -> Self {
        self.views = views.to_vec();
        self
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.kind).collect()
    }

    /// Most recent change that concerned `slot`.
    pub fn last_for(&self, slot: Slot) -> Option<&Event> {
        self.events.iter().rev().find(|e| e.slot == Some(slot))
    }

    /// How many changes refreshed `view`.
    pub fn refresh_count(&self, view: ViewKind) -> usize {
        self.events.iter().filter(|e| e.views.contains(&view)).count()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_slot_and_views_per_change() {
        let mut bus = EventBus::new();
        bus.emit(
            Event::new(Revision(1), "dataset_loaded", "A <- x")
                .for_slot(Slot::Primary)
                .refreshing(&[ViewKind::Map, ViewKind::Ranking]),
        );
        bus.emit(Event::new(Revision(2), "resize", "10x10").refreshing(&[ViewKind::Map]));
        bus.emit(Event::new(Revision(2), "load_superseded", "y").for_slot(Slot::Secondary));

        assert_eq!(bus.events()[0].revision, Revision(1));
        assert_eq!(bus.refresh_count(ViewKind::Map), 2);
        assert_eq!(bus.refresh_count(ViewKind::Correlation), 0);
        assert_eq!(bus.last_for(Slot::Primary).map(|e| e.kind), Some("dataset_loaded"));
        assert!(bus.last_for(Slot::Secondary).is_some_and(|e| e.views.is_empty()));
        assert_eq!(Revision(2).next(), Revision(3));
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(Event::new(Revision::default(), "k", "m"));
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
    }
}
