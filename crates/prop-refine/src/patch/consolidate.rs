//! Patch consolidator: one op per canonical path, later phases win.

use indexmap::IndexMap;

use super::plan::PatchGroups;
use super::types::{PatchOp, Phase};

/// The consolidated patch set: at most one op per canonical path, plus the
/// winning phase per path for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Consolidated {
    ops: IndexMap<String, PatchOp>,
    phases: IndexMap<String, Phase>,
}

impl Consolidated {
    pub fn ops(&self) -> impl Iterator<Item = (&str, &PatchOp)> {
        self.ops.iter().map(|(k, op)| (k.as_str(), op))
    }

    pub fn get(&self, key: &str) -> Option<&PatchOp> {
        self.ops.get(key)
    }

    /// The phase that won the slot at `key`.
    pub fn phase_of(&self, key: &str) -> Option<Phase> {
        self.phases.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Merge the groups in presentation order - diff, then derive, then prune.
/// A later group's op overwrites an earlier one targeting the same
/// canonical path; the phase map records the winner.
pub fn consolidate(groups: PatchGroups) -> Consolidated {
    let mut consolidated = Consolidated::default();
    let phased = [
        (Phase::Diff, groups.diff),
        (Phase::Derive, groups.derive),
        (Phase::Prune, groups.prune),
    ];
    for (phase, ops) in phased {
        for op in ops {
            let key = op.key();
            consolidated.ops.insert(key.clone(), op);
            consolidated.phases.insert(key, phase);
        }
    }
    consolidated
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Data;
    use prop_refine_path::Step;

    fn set(key: &str, value: f64) -> PatchOp {
        PatchOp::set(vec![Step::key(key)], Data::Num(value))
    }

    #[test]
    fn later_phases_win() {
        let groups = PatchGroups {
            diff: vec![set("a", 1.0), set("b", 2.0)],
            derive: vec![set("a", 10.0)],
            prune: vec![PatchOp::delete(vec![Step::key("b")])],
        };
        let consolidated = consolidate(groups);
        assert_eq!(consolidated.len(), 2);
        assert_eq!(
            consolidated.get("\"a\""),
            Some(&set("a", 10.0))
        );
        assert_eq!(consolidated.phase_of("\"a\""), Some(Phase::Derive));
        assert_eq!(
            consolidated.get("\"b\"").map(PatchOp::op_name),
            Some("delete")
        );
        assert_eq!(consolidated.phase_of("\"b\""), Some(Phase::Prune));
    }

    #[test]
    fn distinct_paths_accumulate() {
        let groups = PatchGroups {
            diff: vec![set("a", 1.0)],
            derive: vec![set("b", 2.0)],
            prune: vec![],
        };
        let consolidated = consolidate(groups);
        assert_eq!(consolidated.len(), 2);
        assert_eq!(consolidated.phase_of("\"b\""), Some(Phase::Derive));
    }
}
