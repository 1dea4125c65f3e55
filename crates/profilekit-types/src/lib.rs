//! Identifier generation and wire DTOs for profilekit.
//!
//! This crate is the leaf foundation: opaque identifier strings and the
//! JSON wire shapes exchanged with the remote profile store. It has **no
//! internal profilekit dependencies** — the domain model builds on it.
//!
//! # Wire shape overview
//!
//! ```text
//! ProfileData
//!     ├── attributes: [AttributeData]   ← grouped by (collectApp, section)
//!     └── sessions:   [SessionData]
//!             └── events: [EventData]
//! ```
//!
//! Attributes travel grouped: one `AttributeData` block carries every
//! attribute of a `(collectApp, section)` scope as a `{name: value}` map.
//! The domain model flattens these into per-name entities on construction
//! and regroups them on serialization.

pub mod id;
pub mod wire;

// Re-export primary items at crate root for convenience.
pub use id::{DEFAULT_LENGTH, IdError, generate, generate_default};
pub use wire::{AttributeData, EventData, ProfileData, SessionData};

/// Current time as Unix milliseconds. Used by entity constructors.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
