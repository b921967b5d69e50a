//! One-call-site orchestration.
//!
//! The pipeline is synchronous and single-pass: extract, validate, plan
//! against the overlay target, consolidate, apply. Each call site gets
//! fresh accumulators (side channel, patch indices); nothing is shared
//! across invocations. Any failure is terminal for the current call site.

use tracing::{debug, trace};

use prop_refine_expr::Expr;
use prop_refine_path::display_path;

use crate::data::Data;
use crate::diff::DiffOptions;
use crate::error::RefineError;
use crate::extract::extract_root;
use crate::options::RefineOptions;
use crate::patch::{apply_patches, consolidate, plan_patches, ApplyOutcome, Consolidated, Phase};
use crate::rules::{Issue, Rule, Validation};

/// What happened to one call site.
#[derive(Debug)]
pub enum SiteOutcome {
    /// The argument was not statically extractable at the root; nothing to
    /// do.
    Skipped,
    /// Dry run: the consolidated plan, with the tree left untouched.
    Planned(Consolidated),
    /// Patches were applied in full.
    Applied {
        consolidated: Consolidated,
        outcome: ApplyOutcome,
    },
}

impl SiteOutcome {
    /// Number of patch targets this site ended up with.
    pub fn patch_count(&self) -> usize {
        match self {
            SiteOutcome::Skipped => 0,
            SiteOutcome::Planned(consolidated) => consolidated.len(),
            SiteOutcome::Applied { consolidated, .. } => consolidated.len(),
        }
    }
}

/// Refine one matched call site's data argument in place.
///
/// `arg` is the node locating the data argument, as supplied by the
/// call-site resolver; `rule` is the resolver's validated descriptor for
/// the component.
pub fn refine_call_site(
    arg: &mut Expr,
    rule: &Rule,
    options: &RefineOptions,
) -> Result<SiteOutcome, RefineError> {
    rule.ensure_valid()?;

    let Some(extraction) = extract_root(arg, &options.preserved) else {
        trace!(component = rule.component.describe(), "no static data");
        return Ok(SiteOutcome::Skipped);
    };

    let validated = match &rule.schema {
        None => extraction.data.clone(),
        Some(schema) => match schema.validate(&extraction.data) {
            Validation::Value(value) => value,
            Validation::Issues(issues) => {
                let first = issues
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| Issue::new(Vec::new(), "schema rejected the data"));
                return Err(RefineError::Validation {
                    path: display_path(&first.path),
                    message: first.message,
                });
            }
        },
    };

    let mut records = Vec::new();
    if let Some(hook) = &rule.derive {
        hook.derive(&validated, &mut |record| records.push(record));
    }

    // The differ/overlay pairing travels as one default; see DiffOptions.
    let plan = plan_patches(
        &extraction.data,
        &validated,
        &records,
        &rule.prune,
        &options.preserved,
        &DiffOptions::default(),
    );
    if !plan.rejected.is_empty() {
        debug!(
            component = rule.component.describe(),
            rejected = plan.rejected.len(),
            "patches rejected for traversing preserved keys"
        );
    }

    let consolidated = consolidate(plan.groups);
    debug!(
        component = rule.component.describe(),
        patches = consolidated.len(),
        captured = extraction.side_channel.len(),
        dry_run = options.dry_run,
        "planned"
    );

    if options.dry_run {
        return Ok(SiteOutcome::Planned(consolidated));
    }

    let outcome = apply_patches(arg, &consolidated, &options.preserved, &extraction.side_channel)?;
    if !outcome.fully_applied() {
        let path = outcome
            .first_unapplied()
            .unwrap_or_default()
            .to_owned();
        let phase = consolidated.phase_of(&path).unwrap_or(Phase::Diff);
        return Err(RefineError::Unapplied {
            path,
            phase,
            sets: outcome.unapplied_sets().len(),
            deletes: outcome.unapplied_deletes().len(),
        });
    }
    trace!(applied = outcome.applied(), "patched");

    Ok(SiteOutcome::Applied {
        consolidated,
        outcome,
    })
}

/// Convenience wrapper: refine only if the data survives extraction and the
/// rule says anything at all, reporting the new data view afterwards.
pub fn dry_run_plan(
    arg: &Expr,
    rule: &Rule,
    options: &RefineOptions,
) -> Result<Option<Consolidated>, RefineError> {
    let mut scratch = arg.clone();
    let dry = RefineOptions {
        preserved: options.preserved.clone(),
        dry_run: true,
    };
    match refine_call_site(&mut scratch, rule, &dry)? {
        SiteOutcome::Planned(consolidated) => Ok(Some(consolidated)),
        SiteOutcome::Skipped => Ok(None),
        SiteOutcome::Applied { .. } => unreachable!("dry run never applies"),
    }
}

/// Expose the validated data a rule would see for a call-site argument,
/// without planning or patching. Diagnostic helper.
pub fn peek_extracted(arg: &Expr, options: &RefineOptions) -> Option<Data> {
    extract_root(arg, &options.preserved).map(|e| e.data)
}

// ── Tests ─────────────────────────────────────────────────────────────────
