//! Scoped attribute facts.
//!
//! An `Attribute` is one named fact about a profile, scoped by
//! `(collect_app, section)`. Identity inside a profile is the full
//! `(collect_app, section, name)` triple; the profile enforces
//! triple-uniqueness on insert. An attribute knows only its own dirty
//! state — it has no back-pointer to the owning profile.

use serde_json::Value;

use profilekit_types::AttributeData;

/// Uniqueness key for an attribute inside a profile.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct AttributeKey {
    pub collect_app: String,
    pub section: String,
    pub name: String,
}

/// A single named, scoped fact with change tracking.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    collect_app: String,
    section: String,
    name: String,
    value: Value,
    dirty: bool,
}

impl Attribute {
    /// Create an attribute. Not dirty until a setter changes it.
    pub fn new(
        collect_app: impl Into<String>,
        section: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            collect_app: collect_app.into(),
            section: section.into(),
            name: name.into(),
            value,
            dirty: false,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn collect_app(&self) -> &str {
        &self.collect_app
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The `(collect_app, section, name)` identity triple.
    pub fn key(&self) -> AttributeKey {
        AttributeKey {
            collect_app: self.collect_app.clone(),
            section: self.section.clone(),
            name: self.name.clone(),
        }
    }

    // ── Mutators (dirty only on actual change) ──────────────────────────

    pub fn set_collect_app(&mut self, collect_app: impl Into<String>) {
        let collect_app = collect_app.into();
        if self.collect_app != collect_app {
            self.collect_app = collect_app;
            self.dirty = true;
        }
    }

    pub fn set_section(&mut self, section: impl Into<String>) {
        let section = section.into();
        if self.section != section {
            self.section = section;
            self.dirty = true;
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name != name {
            self.name = name;
            self.dirty = true;
        }
    }

    /// Set the value, comparing by value equality.
    pub fn set_value(&mut self, value: Value) {
        if self.value != value {
            self.value = value;
            self.dirty = true;
        }
    }

    // ── Validity / change tracking ──────────────────────────────────────

    /// True iff scope, name, and value are all present (value non-null).
    pub fn is_valid(&self) -> bool {
        !self.collect_app.is_empty()
            && !self.section.is_empty()
            && !self.name.is_empty()
            && !self.value.is_null()
    }

    pub fn has_changes(&self) -> bool {
        self.dirty
    }

    pub fn reset_dirty(&mut self) {
        self.dirty = false;
    }

    /// Force the dirty flag. Used by the merge engine for entities
    /// inserted wholesale (they differ from the foreign baseline).
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // ── Serialization ───────────────────────────────────────────────────

    /// Wire form: a single-entry grouped block.
    pub fn serialize(&self) -> AttributeData {
        let mut data = serde_json::Map::new();
        data.insert(self.name.clone(), self.value.clone());
        AttributeData {
            collect_app: Some(self.collect_app.clone()),
            section: Some(self.section.clone()),
            data,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
