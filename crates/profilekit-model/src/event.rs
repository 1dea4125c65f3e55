//! Timestamped events inside a session.

use serde_json::{Map, Value};

use profilekit_types::{EventData, generate_default, now_millis};

/// A single named, timestamped fact with change tracking.
///
/// Identity inside a session is `id`. `data` shallow-merges on update:
/// keys absent from an incoming partial are preserved.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    id: String,
    definition_id: String,
    created_at: u64,
    data: Map<String, Value>,
    dirty: bool,
}

/// An event argument: either a typed instance or a raw wire config.
///
/// The explicit coercion boundary — `Session::add_event` normalizes either
/// variant to a typed `Event` before validating it.
pub enum EventInit {
    Event(Event),
    Data(EventData),
}

impl From<Event> for EventInit {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

impl From<EventData> for EventInit {
    fn from(data: EventData) -> Self {
        Self::Data(data)
    }
}

impl EventInit {
    /// Normalize to a typed event, filling defaults for a raw config.
    pub(crate) fn into_event(self) -> Event {
        match self {
            Self::Event(event) => event,
            Self::Data(data) => Event::from_data(data),
        }
    }
}

impl Event {
    /// Create an event with a generated id and `created_at = now`.
    pub fn new(definition_id: impl Into<String>) -> Self {
        Self {
            id: generate_default(),
            definition_id: definition_id.into(),
            created_at: now_millis(),
            data: Map::new(),
            dirty: false,
        }
    }

    /// Build from a wire config, filling the same defaults as [`Event::new`].
    pub fn from_data(data: EventData) -> Self {
        Self {
            id: data.id.unwrap_or_else(generate_default),
            definition_id: data.definition_id.unwrap_or_default(),
            created_at: data.created_at.unwrap_or_else(now_millis),
            data: data.data.unwrap_or_default(),
            dirty: false,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get_data_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    // ── Mutators (dirty only on actual change) ──────────────────────────

    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        if self.id != id {
            self.id = id;
            self.dirty = true;
        }
    }

    pub fn set_definition_id(&mut self, definition_id: impl Into<String>) {
        let definition_id = definition_id.into();
        if self.definition_id != definition_id {
            self.definition_id = definition_id;
            self.dirty = true;
        }
    }

    pub fn set_created_at(&mut self, created_at: u64) {
        if self.created_at != created_at {
            self.created_at = created_at;
            self.dirty = true;
        }
    }

    /// Shallow-merge a partial into `data`: incoming keys overwrite,
    /// existing keys absent from the partial are preserved.
    pub fn set_data(&mut self, partial: Map<String, Value>) {
        for (key, value) in partial {
            self.set_data_value(key, value);
        }
    }

    pub fn set_data_value(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if self.data.get(&key) != Some(&value) {
            self.data.insert(key, value);
            self.dirty = true;
        }
    }

    // ── Validity / change tracking ──────────────────────────────────────

    /// True iff id, definition id, and creation time are all present.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.definition_id.is_empty() && self.created_at > 0
    }

    pub fn has_changes(&self) -> bool {
        self.dirty
    }

    pub fn reset_dirty(&mut self) {
        self.dirty = false;
    }

    /// Force the dirty flag. Used by the merge engine for events inserted
    /// wholesale into a foreign-seeded session.
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Overwrite this event's fields with another's, through the setters
    /// so change detection holds. The stored entity keeps its identity —
    /// the replace-in-place contract of `Session::add_event`.
    pub(crate) fn overwrite_with(&mut self, other: Event) {
        self.set_definition_id(other.definition_id);
        self.set_created_at(other.created_at);
        self.set_data(other.data);
    }

    // ── Serialization ───────────────────────────────────────────────────

    /// Wire form, always full — events are leaves and have no partial form.
    pub fn serialize(&self) -> EventData {
        EventData {
            id: Some(self.id.clone()),
            definition_id: Some(self.definition_id.clone()),
            created_at: Some(self.created_at),
            data: Some(self.data.clone()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_fills_defaults() {
        let e = Event::new("click");
        assert_eq!(e.id().len(), 32);
        assert!(e.created_at() > 0);
        assert!(e.data().is_empty());
        assert!(!e.has_changes());
        assert!(e.is_valid());
    }

    #[test]
    fn test_from_data_fills_missing_fields() {
        let e = Event::from_data(EventData {
            definition_id: Some("click".into()),
            ..Default::default()
        });
        assert_eq!(e.id().len(), 32);
        assert!(e.created_at() > 0);
        assert!(e.is_valid());
    }

    #[test]
    fn test_missing_definition_id_is_invalid() {
        let e = Event::from_data(EventData::default());
        assert!(!e.is_valid());
    }

    #[test]
    fn test_set_data_shallow_merges() {
        let mut e = Event::new("click");
        e.set_data_value("x", json!(1));
        e.set_data_value("y", json!(2));
        e.reset_dirty();

        let mut partial = Map::new();
        partial.insert("y".into(), json!(20));
        partial.insert("z".into(), json!(30));
        e.set_data(partial);

        assert_eq!(e.get_data_value("x"), Some(&json!(1))); // preserved
        assert_eq!(e.get_data_value("y"), Some(&json!(20)));
        assert_eq!(e.get_data_value("z"), Some(&json!(30)));
        assert!(e.has_changes());
    }

    #[test]
    fn test_set_data_same_values_stays_clean() {
        let mut e = Event::new("click");
        e.set_data_value("x", json!(1));
        e.reset_dirty();

        let mut partial = Map::new();
        partial.insert("x".into(), json!(1));
        e.set_data(partial);
        assert!(!e.has_changes());
    }

    #[test]
    fn test_setters_mark_dirty_on_change_only() {
        let mut e = Event::new("click");
        let definition = e.definition_id().to_string();
        e.set_definition_id(definition);
        assert!(!e.has_changes());
        e.set_definition_id("scroll");
        assert!(e.has_changes());
    }

    #[test]
    fn test_serialize_is_full() {
        let mut e = Event::new("click");
        e.set_data_value("x", json!(1));
        let wire = e.serialize();
        assert_eq!(wire.id.as_deref(), Some(e.id()));
        assert_eq!(wire.definition_id.as_deref(), Some("click"));
        assert_eq!(wire.created_at, Some(e.created_at()));
        assert_eq!(wire.data.unwrap().get("x"), Some(&json!(1)));
    }

    #[test]
    fn test_overwrite_with_keeps_id() {
        let mut stored = Event::new("click");
        stored.set_data_value("x", json!(1));
        stored.reset_dirty();
        let id = stored.id().to_string();

        let mut incoming = Event::new("scroll");
        incoming.set_id(id.clone());
        incoming.set_data_value("y", json!(2));

        stored.overwrite_with(incoming);
        assert_eq!(stored.id(), id);
        assert_eq!(stored.definition_id(), "scroll");
        assert_eq!(stored.get_data_value("x"), Some(&json!(1)));
        assert_eq!(stored.get_data_value("y"), Some(&json!(2)));
        assert!(stored.has_changes());
    }
}
