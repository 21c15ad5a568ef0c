//! # Context Graph Model
//!
//! Plain DTOs for the attributed context graph and its ledgers.
//! These types cross every boundary: syntax ↔ gestures ↔ dispatcher ↔ export.
//!
//! Design rule: no I/O, no locks, no async in this module.

pub mod value;
pub mod property_map;
pub mod entity;
pub mod relation;
pub mod tension;
pub mod event;
pub mod dialogue;

pub use value::Value;
pub use property_map::PropertyMap;
pub use entity::{Analysis, Entity, EntityKind, LimitType, Weight};
pub use relation::{RelId, Relation, RelationType};
pub use tension::{Tension, TensionKind};
pub use event::{Event, GestureKind, NameSet, ResultRef};
pub use dialogue::{DialogueOutcome, DialogueRecord, GenerativityScore, Offering};
