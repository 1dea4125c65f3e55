//! Profile aggregate model for profilekit.
//!
//! A [`Profile`] is the aggregate root: scoped [`Attribute`] facts plus
//! [`Session`] containers of timestamped [`Event`]s. Profiles are built
//! locally or from a fetched wire object, mutated in place, reconciled
//! against a freshly fetched copy with [`Profile::merge`], and serialized
//! back — fully, or trimmed to the changed subset for a network update.
//!
//! # Change tracking
//!
//! Every entity carries a dirty flag set by its mutators (only when the
//! new value actually differs) and cleared by `reset_dirty()`. Aggregate
//! dirtiness (`has_changes()`) is recomputed on read by walking the owned
//! collections, never cached, so it cannot drift from child state.
//!
//! # Merge semantics
//!
//! `local.merge(&foreign)` keeps local offline work while adopting foreign
//! additions: scalars are last-writer-wins from the foreign side,
//! attributes are foreign-baseline-plus-local-overlay (local wins per
//! triple), sessions and events found on both sides shallow-merge their
//! data maps with local keys overwriting. Deterministic and structural —
//! no timestamps, no vector clocks.
//!
//! # Concurrency
//!
//! Single-writer: nothing here locks. Callers sequence merges and
//! serializations on one `Profile` themselves.

mod attribute;
mod error;
mod event;
mod profile;
mod session;

pub use attribute::{Attribute, AttributeKey};
pub use error::ProfileError;
pub use event::{Event, EventInit};
pub use profile::Profile;
pub use session::{DEFAULT_COLLECT_APP, Session, SessionInit};

/// Result type for profile model operations.
pub type Result<T> = std::result::Result<T, ProfileError>;
