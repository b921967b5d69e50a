//! prop-refine — static refinement of component call-site data.
//!
//! The pipeline extracts plain data from a call-site argument expression,
//! lets external schema/derivation logic reshape it, and writes the
//! reshaped data back into the tree without disturbing anything it cannot
//! safely represent: dynamic expressions, spread markers, sparse holes, and
//! whatever formatting hangs off untouched nodes.
//!
//! Data flows one direction:
//!
//! ```text
//! extract -> (validate) -> overlay/diff -> plan -> consolidate -> apply -> (report)
//! ```
//!
//! Mutation is leaf-only: an existing slot's value may be overwritten, an
//! existing slot may be cleared or removed, and nothing is ever inserted.

pub mod data;
pub mod diff;
pub mod error;
pub mod extract;
pub mod options;
pub mod overlay;
pub mod patch;
pub mod pipeline;
pub mod report;
pub mod rules;

pub use data::{same_value, Data, Entries, Items, Pattern, PreservedSlot};
pub use diff::{diff, ArrayEquality, ArrayPolicy, DiffEvent, DiffOptions};
pub use error::{EncodeError, RefineError};
pub use extract::{extract_root, Extraction, SideChannel};
pub use options::{PreservedKeys, RefineOptions, DEFAULT_PRESERVED_KEY};
pub use overlay::apply_overlay;
pub use patch::{
    apply_patches, consolidate, plan_patches, ApplyOutcome, Consolidated, NoPreserved,
    PatchGroups, PatchOp, Phase, PlanOutcome, PreservedResolver,
};
pub use pipeline::{dry_run_plan, peek_extracted, refine_call_site, SiteOutcome};
pub use report::{phase_hint, render_text, Reporter, SiteSummary, TextReporter};
pub use rules::{ComponentMatcher, DeriveHook, Issue, Rule, RuleSet, Validation, Validator};
