//! Patch planner: turn differ output, derived values and prune keys into
//! flat patch groups.

use prop_refine_path::Step;

use crate::data::{Data, Entries};
use crate::diff::{diff, DiffEvent, DiffOptions};
use crate::options::PreservedKeys;
use crate::overlay::apply_overlay;

use super::types::{PatchOp, Phase};

/// The three patch groups, in presentation order.
#[derive(Debug, Clone, Default)]
pub struct PatchGroups {
    pub diff: Vec<PatchOp>,
    pub derive: Vec<PatchOp>,
    pub prune: Vec<PatchOp>,
}

impl PatchGroups {
    pub fn len(&self) -> usize {
        self.diff.len() + self.derive.len() + self.prune.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Planner result: the groups, plus any patch rejected for traversing a
/// preserved key. Rejected patches never reach the patcher; they are kept
/// for diagnostics.
#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    pub groups: PatchGroups,
    pub rejected: Vec<(Phase, PatchOp)>,
}

/// Plan the patches for one call site.
///
/// - The *coercion* group comes from diffing the extracted data against the
///   overlay of validated data on top of it. Only CHANGE events become
///   patches: a CREATE has no slot to target, and a REMOVE would discard
///   passthrough data the validator never saw.
/// - The *derivation* group turns each emitted record entry into a
///   root-level `set`.
/// - The *prune* group turns each configured prune key that is an own,
///   non-preserved key of the extracted data into a root-level `delete`;
///   absent keys are silently skipped.
///
/// A non-keyed extraction root degrades the coercion group to empty rather
/// than erroring.
pub fn plan_patches(
    extracted: &Data,
    validated: &Data,
    derived: &[Entries],
    prune_keys: &[String],
    preserved: &PreservedKeys,
    diff_options: &DiffOptions,
) -> PlanOutcome {
    let mut outcome = PlanOutcome::default();

    push_coercion(&mut outcome, extracted, validated, preserved, diff_options);
    push_derivation(&mut outcome, derived, preserved);
    push_prune(&mut outcome, extracted, prune_keys, preserved);

    outcome
}

fn push_coercion(
    outcome: &mut PlanOutcome,
    extracted: &Data,
    validated: &Data,
    preserved: &PreservedKeys,
    diff_options: &DiffOptions,
) {
    if !extracted.is_obj() || !validated.is_obj() {
        return;
    }
    let target = apply_overlay(extracted, validated, preserved);
    for event in diff(extracted, &target, diff_options) {
        let DiffEvent::Change { path, next, .. } = event else {
            continue;
        };
        push(outcome, Phase::Diff, PatchOp::set(path, next), preserved);
    }
}

fn push_derivation(outcome: &mut PlanOutcome, derived: &[Entries], preserved: &PreservedKeys) {
    for record in derived {
        for (key, value) in record {
            push(
                outcome,
                Phase::Derive,
                PatchOp::set(vec![Step::key(key.clone())], value.clone()),
                preserved,
            );
        }
    }
}

fn push_prune(
    outcome: &mut PlanOutcome,
    extracted: &Data,
    prune_keys: &[String],
    preserved: &PreservedKeys,
) {
    let Some(entries) = extracted.as_obj() else {
        return;
    };
    for key in prune_keys {
        if !entries.contains_key(key) || preserved.contains(key) {
            continue;
        }
        push(
            outcome,
            Phase::Prune,
            PatchOp::delete(vec![Step::key(key.clone())]),
            preserved,
        );
    }
}

/// Route an op into its group, or into the rejected list if its path
/// traverses a preserved key anywhere.
fn push(outcome: &mut PlanOutcome, phase: Phase, op: PatchOp, preserved: &PreservedKeys) {
    let traverses_preserved = op
        .path()
        .iter()
        .any(|step| step.as_key().is_some_and(|k| preserved.contains(k)));
    if traverses_preserved {
        outcome.rejected.push((phase, op));
        return;
    }
    match phase {
        Phase::Diff => outcome.groups.diff.push(op),
        Phase::Derive => outcome.groups.derive.push(op),
        Phase::Prune => outcome.groups.prune.push(op),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(pairs: Vec<(&str, Data)>) -> Data {
        Data::obj(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect::<Entries>(),
        )
    }

    fn entries(pairs: Vec<(&str, Data)>) -> Entries {
        pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    fn plan(extracted: &Data, validated: &Data) -> PlanOutcome {
        plan_patches(
            extracted,
            validated,
            &[],
            &[],
            &PreservedKeys::default(),
            &DiffOptions::default(),
        )
    }

    #[test]
    fn only_changes_become_coercion_patches() {
        let extracted = obj(vec![("a", Data::str("1")), ("b", Data::str("x"))]);
        // The validator coerced `a` to a number and invented `c`; the
        // overlay drops the invention, the diff sees one change.
        let validated = obj(vec![
            ("a", Data::Num(1.0)),
            ("b", Data::str("x")),
            ("c", Data::Num(3.0)),
        ]);
        let outcome = plan(&extracted, &validated);
        assert_eq!(outcome.groups.diff.len(), 1);
        assert_eq!(outcome.groups.diff[0].key(), "\"a\"");
        assert_eq!(outcome.groups.diff[0].op_name(), "set");
    }

    #[test]
    fn removals_never_become_patches() {
        let extracted = obj(vec![("a", Data::Num(1.0)), ("extra", Data::str("y"))]);
        let validated = obj(vec![("a", Data::Num(1.0))]);
        let outcome = plan(&extracted, &validated);
        assert!(outcome.groups.diff.is_empty());
    }

    #[test]
    fn non_object_roots_degrade_softly() {
        let outcome = plan(&Data::Num(1.0), &obj(vec![]));
        assert!(outcome.groups.is_empty());
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn derivation_becomes_root_sets() {
        let extracted = obj(vec![("a", Data::Num(1.0))]);
        let records = vec![
            entries(vec![("hash", Data::str("h1"))]),
            entries(vec![("hash", Data::str("h2")), ("size", Data::Num(2.0))]),
        ];
        let outcome = plan_patches(
            &extracted,
            &extracted,
            &records,
            &[],
            &PreservedKeys::default(),
            &DiffOptions::default(),
        );
        assert_eq!(outcome.groups.derive.len(), 3);
        assert!(outcome
            .groups
            .derive
            .iter()
            .all(|op| op.op_name() == "set" && op.path().len() == 1));
    }

    #[test]
    fn prune_deletes_present_keys_only() {
        let extracted = obj(vec![("drop", Data::Num(1.0)), ("keep", Data::Num(2.0))]);
        let outcome = plan_patches(
            &extracted,
            &extracted,
            &[],
            &["drop".to_owned(), "missing".to_owned()],
            &PreservedKeys::default(),
            &DiffOptions::default(),
        );
        assert_eq!(outcome.groups.prune.len(), 1);
        assert_eq!(outcome.groups.prune[0].key(), "\"drop\"");
    }

    #[test]
    fn prune_skips_preserved_keys() {
        let extracted = obj(vec![("children", Data::Num(1.0))]);
        let outcome = plan_patches(
            &extracted,
            &extracted,
            &[],
            &["children".to_owned()],
            &PreservedKeys::default(),
            &DiffOptions::default(),
        );
        assert!(outcome.groups.prune.is_empty());
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn derived_preserved_keys_are_rejected_before_the_patcher() {
        let extracted = obj(vec![("a", Data::Num(1.0))]);
        let records = vec![entries(vec![("children", Data::str("nope"))])];
        let outcome = plan_patches(
            &extracted,
            &extracted,
            &records,
            &[],
            &PreservedKeys::default(),
            &DiffOptions::default(),
        );
        assert!(outcome.groups.derive.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].0, Phase::Derive);
    }
}
