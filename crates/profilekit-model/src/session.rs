//! Sessions — ordered containers of events, scoped by app and section.

use serde_json::{Map, Value};

use profilekit_types::{SessionData, generate_default, now_millis};

use crate::event::{Event, EventInit};
use crate::{ProfileError, Result};

/// Default collect app for sessions created without one.
pub const DEFAULT_COLLECT_APP: &str = "web";

/// A scoped container of time-ordered events plus free-form data.
///
/// Identity inside a profile is `id`. Events are stored in insertion
/// order; adding an event whose id already exists overwrites the stored
/// event in place instead of appending a duplicate.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    id: String,
    collect_app: String,
    section: String,
    created_at: u64,
    modified_at: Option<u64>,
    data: Map<String, Value>,
    events: Vec<Event>,
    dirty: bool,
}

/// A session argument: either a typed instance or a raw wire config.
pub enum SessionInit {
    Session(Session),
    Data(SessionData),
}

impl From<Session> for SessionInit {
    fn from(session: Session) -> Self {
        Self::Session(session)
    }
}

impl From<SessionData> for SessionInit {
    fn from(data: SessionData) -> Self {
        Self::Data(data)
    }
}

impl SessionInit {
    /// Normalize to a typed session, filling defaults for a raw config.
    pub(crate) fn into_session(self) -> Session {
        match self {
            Self::Session(session) => session,
            Self::Data(data) => Session::from_data(data),
        }
    }
}

impl Session {
    /// Create a session with a generated id, the default collect app,
    /// empty data and events, and `created_at = now`.
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            id: generate_default(),
            collect_app: DEFAULT_COLLECT_APP.to_string(),
            section: section.into(),
            created_at: now_millis(),
            modified_at: None,
            data: Map::new(),
            events: Vec::new(),
            dirty: false,
        }
    }

    /// Build from a wire config, filling the same defaults as [`Session::new`].
    pub fn from_data(data: SessionData) -> Self {
        Self {
            id: data.id.unwrap_or_else(generate_default),
            collect_app: data
                .collect_app
                .unwrap_or_else(|| DEFAULT_COLLECT_APP.to_string()),
            section: data.section.unwrap_or_default(),
            created_at: data.created_at.unwrap_or_else(now_millis),
            modified_at: data.modified_at,
            data: data.data.unwrap_or_default(),
            events: data
                .events
                .unwrap_or_default()
                .into_iter()
                .map(Event::from_data)
                .collect(),
            dirty: false,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn collect_app(&self) -> &str {
        &self.collect_app
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn modified_at(&self) -> Option<u64> {
        self.modified_at
    }

    /// Effective modification time: `modified_at`, falling back to the
    /// creation time for sessions never touched.
    pub fn last_touched(&self) -> u64 {
        self.modified_at.unwrap_or(self.created_at)
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get_data_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    // ── Mutators (dirty only on actual change) ──────────────────────────

    pub fn set_collect_app(&mut self, collect_app: impl Into<String>) {
        let collect_app = collect_app.into();
        if self.collect_app != collect_app {
            self.collect_app = collect_app;
            self.touch();
        }
    }

    pub fn set_section(&mut self, section: impl Into<String>) {
        let section = section.into();
        if self.section != section {
            self.section = section;
            self.touch();
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
            self.touch();
        }
    }

    /// Mark the session's own state changed and bump `modified_at`.
    fn touch(&mut self) {
        self.dirty = true;
        self.modified_at = Some(now_millis());
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Add an event, or overwrite the stored one in place when an event
    /// with the same id already exists. Returns the stored event.
    ///
    /// Fails with [`ProfileError::InvalidEvent`] if the normalized event
    /// is invalid; the session is left unchanged in that case.
    pub fn add_event(&mut self, init: impl Into<EventInit>) -> Result<&mut Event> {
        let event = init.into().into_event();
        if !event.is_valid() {
            return Err(ProfileError::InvalidEvent(format!(
                "event {:?} (definition {:?}) is missing required fields",
                event.id(),
                event.definition_id()
            )));
        }

        self.modified_at = Some(now_millis());
        match self.events.iter().position(|e| e.id() == event.id()) {
            Some(pos) => {
                // Replace in place: same entity, new field values.
                self.events[pos].overwrite_with(event);
                Ok(&mut self.events[pos])
            }
            None => {
                self.dirty = true;
                self.events.push(event);
                let last = self.events.len() - 1;
                Ok(&mut self.events[last])
            }
        }
    }

    pub fn get_event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id() == id)
    }

    pub fn get_event_mut(&mut self, id: &str) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.id() == id)
    }

    /// All events, or only those matching a definition id. Returns a new
    /// sequence of references, not a live view.
    pub fn get_events(&self, definition_id: Option<&str>) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| definition_id.is_none_or(|d| e.definition_id() == d))
            .collect()
    }

    /// The most recently created event, insertion order breaking ties.
    pub fn get_last_event(&self) -> Option<&Event> {
        let mut last: Option<&Event> = None;
        for event in &self.events {
            if last.is_none_or(|l| event.created_at() >= l.created_at()) {
                last = Some(event);
            }
        }
        last
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    // ── Validity / change tracking ──────────────────────────────────────

    /// True iff id, collect app, section, and creation time are present.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
            && !self.collect_app.is_empty()
            && !self.section.is_empty()
            && self.created_at > 0
    }

    /// True if the session's own fields changed or any event is dirty.
    /// Recomputed on read by walking the events.
    pub fn has_changes(&self) -> bool {
        self.dirty || self.events.iter().any(Event::has_changes)
    }

    pub fn reset_dirty(&mut self) {
        self.dirty = false;
        for event in &mut self.events {
            event.reset_dirty();
        }
    }

    /// Force the session-level dirty flag. Used by the merge engine for
    /// sessions inserted wholesale.
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Overwrite this session's state with another's, through the setters
    /// so change detection holds. Events apply via [`Session::add_event`]
    /// (replace-in-place by id). The stored entity keeps its identity.
    pub(crate) fn overwrite_with(&mut self, other: Session) -> Result<()> {
        self.set_collect_app(other.collect_app);
        self.set_section(other.section);
        self.set_data(other.data);
        for event in other.events {
            self.add_event(event)?;
        }
        Ok(())
    }

    // ── Merge ───────────────────────────────────────────────────────────

    /// Fold another session's state into this one, with `other` winning:
    /// its `data` keys overwrite, its events merge by id (shallow data
    /// overwrite on match) or append. The merge engine calls this with
    /// `self` seeded from the foreign copy and `other` the local overlay.
    pub(crate) fn merge(&mut self, other: &Session) {
        self.set_data(other.data.clone());
        for event in &other.events {
            match self.get_event_mut(event.id()) {
                Some(existing) => existing.set_data(event.data().clone()),
                None => {
                    let mut inserted = event.clone();
                    inserted.mark_dirty();
                    self.events.push(inserted);
                    self.dirty = true;
                }
            }
        }
    }

    // ── Serialization ───────────────────────────────────────────────────

    /// Wire form. Full mode emits every field and all events in insertion
    /// order; changed-only mode emits `data` only when the session's own
    /// fields changed, and only the events that are themselves dirty.
    pub fn serialize(&self, only_changed: bool) -> SessionData {
        let data = if only_changed && !self.dirty {
            None
        } else {
            Some(self.data.clone())
        };
        let events: Vec<_> = self
            .events
            .iter()
            .filter(|e| !only_changed || e.has_changes())
            .map(Event::serialize)
            .collect();
        let events = if only_changed && events.is_empty() {
            None
        } else {
            Some(events)
        };

        SessionData {
            id: Some(self.id.clone()),
            collect_app: Some(self.collect_app.clone()),
            section: Some(self.section.clone()),
            created_at: Some(self.created_at),
            modified_at: self.modified_at,
            data,
            events,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
