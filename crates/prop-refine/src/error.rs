//! Error taxonomy.
//!
//! Four classes, all terminal for the current call site: configuration
//! errors fail before any extraction, validation errors abort with the
//! first issue's path and message, unapplied patches are zero-tolerance
//! build failures, and encoding failures mean a value the re-encoder cannot
//! represent. None are retried, none are downgraded.

use thiserror::Error;

use crate::patch::types::Phase;

/// A value the re-encoder could not turn back into tree form.
#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    /// A placeholder with no captured subtree behind it - there is nothing
    /// to inline.
    #[error("no captured subtree for preserved slot {key}")]
    UnresolvedPlaceholder { key: String },
    /// A value kind with no tree representation.
    #[error("cannot encode {kind} value at {path}")]
    Unrepresentable { kind: &'static str, path: String },
}

/// Terminal failure of one call site.
#[derive(Debug, Error)]
pub enum RefineError {
    /// Malformed rule descriptor. Fails before any extraction.
    #[error("invalid rule for `{component}`: {reason}")]
    InvalidRule { component: String, reason: String },

    /// The schema rejected the extracted data.
    #[error("validation failed at {path}: {message}")]
    Validation { path: String, message: String },

    /// A patch was left unapplied: configured intent silently diverged
    /// from the emitted output.
    #[error("{phase} patch left unapplied at {path} ({sets} set, {deletes} delete remaining)")]
    Unapplied {
        path: String,
        phase: Phase,
        sets: usize,
        deletes: usize,
    },

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl RefineError {
    /// The originating phase, where one applies. Diagnostics only - every
    /// variant receives identical fatal treatment.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            RefineError::Unapplied { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
