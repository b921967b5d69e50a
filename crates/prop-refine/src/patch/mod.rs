//! Patch planning, consolidation and application.
//!
//! Patches are leaf-only by contract: `set` overwrites the value of an
//! existing slot, `delete` removes a keyed-container slot (or clears an
//! ordered-container slot to a hole). No patch ever inserts structure.

pub mod apply;
pub mod consolidate;
pub mod plan;
pub mod types;

pub use apply::{apply_patches, ApplyOutcome, NoPreserved, PreservedResolver};
pub use consolidate::{consolidate, Consolidated};
pub use plan::{plan_patches, PatchGroups, PlanOutcome};
pub use types::{PatchOp, Phase};
