//! The profile aggregate root and its merge engine.
//!
//! A `Profile` owns insertion-ordered, key-unique collections of
//! attributes (unique per `(collect_app, section, name)` triple) and
//! sessions (unique per id). Inserting a duplicate key updates the stored
//! entity in place — the entity keeps its identity and any subsequent
//! lookup observes the new state.

use indexmap::IndexMap;
use serde_json::Value;

use profilekit_types::{AttributeData, ProfileData, generate_default, now_millis};

use crate::attribute::{Attribute, AttributeKey};
use crate::session::{Session, SessionInit};
use crate::{ProfileError, Result};

/// Aggregate root: attributes and sessions for one tracked entity.
#[derive(Debug)]
pub struct Profile {
    id: String,
    created_at: u64,
    version: Option<String>,
    merged_profiles: Vec<String>,
    attributes: IndexMap<AttributeKey, Attribute>,
    sessions: IndexMap<String, Session>,
    /// Set by every mutating call (attribute set, session set, merge),
    /// cleared only by `reset_dirty()`. Child dirtiness is walked on read.
    dirty: bool,
}

impl Profile {
    /// Create an empty profile with a generated id.
    pub fn new() -> Self {
        Self::with_id(generate_default())
    }

    /// Create an empty profile with a known id.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: now_millis(),
            version: None,
            merged_profiles: Vec::new(),
            attributes: IndexMap::new(),
            sessions: IndexMap::new(),
            dirty: false,
        }
    }

    /// Build from a decoded wire object. Entities are validated at
    /// insertion; the resulting profile is clean (no dirty flags), so a
    /// freshly fetched copy serializes changed-only to an empty delta.
    pub fn from_data(data: ProfileData) -> Result<Self> {
        let mut profile = Self {
            id: data.id.unwrap_or_else(generate_default),
            created_at: data.created_at.unwrap_or_else(now_millis),
            version: data.version,
            merged_profiles: data.merged_profiles,
            attributes: IndexMap::new(),
            sessions: IndexMap::new(),
            dirty: false,
        };

        for block in data.attributes {
            let collect_app = block.collect_app.unwrap_or_default();
            let section = block.section.unwrap_or_default();
            for (name, value) in block.data {
                let attribute = Attribute::new(&collect_app, &section, name, value);
                profile.admit_attribute(attribute)?;
            }
        }
        for session_data in data.sessions {
            profile.admit_session(Session::from_data(session_data))?;
        }
        Ok(profile)
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Ids of profiles previously merged into this one.
    pub fn merged_profiles(&self) -> &[String] {
        &self.merged_profiles
    }

    // ── Attributes ──────────────────────────────────────────────────────

    /// Expand a `{name: value}` map into one unattached attribute per key.
    ///
    /// Fails with [`ProfileError::InvalidArgument`] when the scope or the
    /// map is empty.
    pub fn create_attributes(
        collect_app: &str,
        section: &str,
        values: serde_json::Map<String, Value>,
    ) -> Result<Vec<Attribute>> {
        if collect_app.is_empty() || section.is_empty() {
            return Err(ProfileError::InvalidArgument(
                "collect_app and section are required to create attributes".into(),
            ));
        }
        if values.is_empty() {
            return Err(ProfileError::InvalidArgument(
                "attribute map must not be empty".into(),
            ));
        }
        Ok(values
            .into_iter()
            .map(|(name, value)| Attribute::new(collect_app, section, name, value))
            .collect())
    }

    /// Insert or update one attribute by its identity triple.
    pub fn set_attribute(&mut self, attribute: Attribute) -> Result<()> {
        self.set_attributes(vec![attribute])
    }

    /// Insert or update attributes by triple. Validation happens up front:
    /// one invalid entry rejects the whole call with nothing applied.
    pub fn set_attributes(&mut self, attributes: Vec<Attribute>) -> Result<()> {
        for attribute in &attributes {
            if !attribute.is_valid() {
                return Err(ProfileError::InvalidAttribute(format!(
                    "attribute {:?} in scope ({:?}, {:?}) is missing required fields",
                    attribute.name(),
                    attribute.collect_app(),
                    attribute.section()
                )));
            }
        }
        for attribute in attributes {
            self.upsert_attribute(attribute);
        }
        self.dirty = true;
        Ok(())
    }

    pub fn get_attribute(
        &self,
        name: &str,
        collect_app: &str,
        section: &str,
    ) -> Option<&Attribute> {
        self.attributes.get(&AttributeKey {
            collect_app: collect_app.to_string(),
            section: section.to_string(),
            name: name.to_string(),
        })
    }

    pub fn get_attribute_mut(
        &mut self,
        name: &str,
        collect_app: &str,
        section: &str,
    ) -> Option<&mut Attribute> {
        self.attributes.get_mut(&AttributeKey {
            collect_app: collect_app.to_string(),
            section: section.to_string(),
            name: name.to_string(),
        })
    }

    /// All attributes in insertion order.
    pub fn get_attributes(&self) -> Vec<&Attribute> {
        self.attributes.values().collect()
    }

    /// Upsert preserving entity identity: an existing attribute is updated
    /// through its setter (dirty only on value change); a new one is
    /// admitted dirty, since setting it is itself a change.
    fn upsert_attribute(&mut self, attribute: Attribute) {
        match self.attributes.get_mut(&attribute.key()) {
            Some(existing) => existing.set_value(attribute.value().clone()),
            None => {
                let mut attribute = attribute;
                attribute.mark_dirty();
                self.attributes.insert(attribute.key(), attribute);
            }
        }
    }

    /// Insertion path for wire construction: validate, store as-is (clean).
    fn admit_attribute(&mut self, attribute: Attribute) -> Result<()> {
        if !attribute.is_valid() {
            return Err(ProfileError::InvalidAttribute(format!(
                "attribute {:?} in scope ({:?}, {:?}) is missing required fields",
                attribute.name(),
                attribute.collect_app(),
                attribute.section()
            )));
        }
        self.attributes.insert(attribute.key(), attribute);
        Ok(())
    }

    // ── Sessions ────────────────────────────────────────────────────────

    /// Insert a session, or update the stored one in place when the id
    /// already exists. Returns the stored session.
    ///
    /// Fails with [`ProfileError::InvalidSession`] /
    /// [`ProfileError::InvalidEvent`] when the normalized session or any
    /// of its events is invalid; the profile is unchanged in that case.
    pub fn set_session(&mut self, init: impl Into<SessionInit>) -> Result<&mut Session> {
        let session = init.into().into_session();
        Self::check_session(&session)?;
        self.dirty = true;

        let id = session.id().to_string();
        if let Some(existing) = self.sessions.get_mut(&id) {
            existing.overwrite_with(session)?;
        } else {
            // Setting a session is itself a change: admit it dirty so the
            // next partial update carries it.
            let mut session = session;
            session.mark_dirty();
            self.sessions.insert(id.clone(), session);
        }
        // Present: inserted or updated just above.
        self.sessions
            .get_mut(&id)
            .ok_or_else(|| ProfileError::InvalidSession("stored session disappeared".into()))
    }

    pub fn get_session(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_session_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// All sessions in insertion order.
    pub fn get_sessions(&self) -> Vec<&Session> {
        self.sessions.values().collect()
    }

    /// The session with the greatest effective modification time
    /// (`modified_at`, falling back to creation time). Later insertion
    /// wins ties.
    pub fn get_last_session(&self) -> Option<&Session> {
        let mut last: Option<&Session> = None;
        for session in self.sessions.values() {
            if last.is_none_or(|l| session.last_touched() >= l.last_touched()) {
                last = Some(session);
            }
        }
        last
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn check_session(session: &Session) -> Result<()> {
        if !session.is_valid() {
            return Err(ProfileError::InvalidSession(format!(
                "session {:?} (section {:?}) is missing required fields",
                session.id(),
                session.section()
            )));
        }
        for event in session.get_events(None) {
            if !event.is_valid() {
                return Err(ProfileError::InvalidEvent(format!(
                    "event {:?} in session {:?} is missing required fields",
                    event.id(),
                    session.id()
                )));
            }
        }
        Ok(())
    }

    /// Insertion path for wire construction: validate, store as-is (clean).
    fn admit_session(&mut self, session: Session) -> Result<()> {
        Self::check_session(&session)?;
        self.sessions.insert(session.id().to_string(), session);
        Ok(())
    }

    // ── Merge engine ────────────────────────────────────────────────────

    /// Reconcile this (local) profile with a foreign copy, in place.
    ///
    /// Fails fast with [`ProfileError::IdMismatch`] before any mutation
    /// when the ids differ. Resolution is structural and deterministic:
    ///
    /// 1. Scalar metadata: foreign overwrites local where present.
    /// 2. Attributes: foreign baseline, then every local attribute
    ///    re-applied on top — local wins per identity triple, attributes
    ///    unique to either side survive.
    /// 3. Sessions: foreign baseline by id. A local session matching a
    ///    foreign id shallow-merges its data (local keys overwrite) and
    ///    its events (by id, same rule); a local session unknown to the
    ///    foreign side is inserted wholesale and marked dirty.
    ///
    /// Dirty flags of the discarded intermediate state are not carried
    /// over; the merge itself marks the profile dirty.
    pub fn merge(&mut self, other: &Profile) -> Result<&mut Self> {
        if self.id != other.id {
            return Err(ProfileError::IdMismatch {
                expected: self.id.clone(),
                got: other.id.clone(),
            });
        }
        tracing::debug!(
            profile = %self.id,
            local_attributes = self.attributes.len(),
            local_sessions = self.sessions.len(),
            foreign_attributes = other.attributes.len(),
            foreign_sessions = other.sessions.len(),
            "merging foreign profile copy"
        );

        // 1. Scalars: last-writer-wins from the foreign side, where present.
        if let Some(version) = &other.version {
            self.version = Some(version.clone());
        }
        if other.created_at > 0 {
            self.created_at = other.created_at;
        }
        if !other.merged_profiles.is_empty() {
            self.merged_profiles = other.merged_profiles.clone();
        }

        // 2. Attributes: foreign baseline (clean), local overlay on top.
        let local_attributes = std::mem::take(&mut self.attributes);
        for (key, attribute) in &other.attributes {
            let mut attribute = attribute.clone();
            attribute.reset_dirty();
            self.attributes.insert(key.clone(), attribute);
        }
        for (_, attribute) in local_attributes {
            self.upsert_attribute(attribute);
        }

        // 3. Sessions: foreign baseline (clean), local sessions folded in.
        let local_sessions = std::mem::take(&mut self.sessions);
        for (id, session) in &other.sessions {
            let mut session = session.clone();
            session.reset_dirty();
            self.sessions.insert(id.clone(), session);
        }
        for (id, local_session) in local_sessions {
            match self.sessions.get_mut(&id) {
                Some(existing) => existing.merge(&local_session),
                None => {
                    let mut session = local_session;
                    session.mark_dirty();
                    self.sessions.insert(id, session);
                }
            }
        }

        self.dirty = true;
        Ok(self)
    }

    // ── Change tracking ─────────────────────────────────────────────────

    /// True if the profile's own flag is set, any attribute is dirty, or
    /// any session has changes. Recomputed on read.
    pub fn has_changes(&self) -> bool {
        self.dirty
            || self.attributes.values().any(Attribute::has_changes)
            || self.sessions.values().any(Session::has_changes)
    }

    /// Clear the profile's flag and recursively reset every attribute,
    /// session, and event.
    pub fn reset_dirty(&mut self) {
        self.dirty = false;
        for attribute in self.attributes.values_mut() {
            attribute.reset_dirty();
        }
        for session in self.sessions.values_mut() {
            session.reset_dirty();
        }
    }

    // ── Serialization ───────────────────────────────────────────────────

    /// Wire form. Full mode materializes everything; changed-only mode
    /// omits clean attributes and sessions and recurses changed-only into
    /// the sessions it keeps.
    pub fn serialize(&self, only_changed: bool) -> ProfileData {
        // Regroup flat attributes into (collect_app, section) blocks,
        // preserving first-seen scope order.
        let mut groups: IndexMap<(String, String), AttributeData> = IndexMap::new();
        for attribute in self.attributes.values() {
            if only_changed && !attribute.has_changes() {
                continue;
            }
            let key = (
                attribute.collect_app().to_string(),
                attribute.section().to_string(),
            );
            let block = groups.entry(key).or_insert_with(|| AttributeData {
                collect_app: Some(attribute.collect_app().to_string()),
                section: Some(attribute.section().to_string()),
                data: serde_json::Map::new(),
            });
            block
                .data
                .insert(attribute.name().to_string(), attribute.value().clone());
        }

        let sessions = self
            .sessions
            .values()
            .filter(|s| !only_changed || s.has_changes())
            .map(|s| s.serialize(only_changed))
            .collect();

        ProfileData {
            id: Some(self.id.clone()),
            version: self.version.clone(),
            created_at: Some(self.created_at),
            attributes: groups.into_values().collect(),
            sessions,
            merged_profiles: self.merged_profiles.clone(),
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
