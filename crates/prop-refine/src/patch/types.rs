//! Core patch types.

use std::fmt;

use prop_refine_path::{display_path, format_key, Path};

use crate::data::Data;

/// A single patch instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    /// Overwrite the value at an existing slot.
    Set { path: Path, value: Data },
    /// Remove a keyed-container slot, or clear an ordered-container slot to
    /// a hole.
    Delete { path: Path },
}

impl PatchOp {
    pub fn set(path: Path, value: Data) -> Self {
        PatchOp::Set { path, value }
    }

    pub fn delete(path: Path) -> Self {
        PatchOp::Delete { path }
    }

    pub fn path(&self) -> &Path {
        match self {
            PatchOp::Set { path, .. } | PatchOp::Delete { path } => path,
        }
    }

    /// Canonical key of the target slot.
    pub fn key(&self) -> String {
        format_key(self.path())
    }

    pub fn op_name(&self) -> &'static str {
        match self {
            PatchOp::Set { .. } => "set",
            PatchOp::Delete { .. } => "delete",
        }
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOp::Set { path, value } => {
                write!(f, "set {} = {}", display_path(path), value.kind())
            }
            PatchOp::Delete { path } => write!(f, "delete {}", display_path(path)),
        }
    }
}

/// The phase a patch originated from. Retained for diagnostics only; it
/// never changes how a patch applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Diff,
    Derive,
    Prune,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Diff => "diff",
            Phase::Derive => "derive",
            Phase::Prune => "prune",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prop_refine_path::Step;

    #[test]
    fn op_accessors() {
        let op = PatchOp::set(vec![Step::key("a"), Step::index(0)], Data::Num(1.0));
        assert_eq!(op.op_name(), "set");
        assert_eq!(op.key(), "\"a\"/0");
        assert_eq!(op.to_string(), "set .a[0] = number");
    }

    #[test]
    fn phase_names() {
        assert_eq!(Phase::Diff.as_str(), "diff");
        assert_eq!(Phase::Prune.to_string(), "prune");
    }
}
