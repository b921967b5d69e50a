//! Reporter-facing presentation.
//!
//! Pure rendering over the pipeline's outcome snapshots; nothing here
//! affects semantics. The phase classification follows the failure
//! taxonomy: a `derive` failure is user-fixable (add a placeholder slot for
//! the derived key), while `diff` and `prune` failures are architectural
//! (dynamic keys or preserved subtrees block leaf-only editing). Both are
//! equally fatal.

use std::fmt::Write as _;

use prop_refine_path::{display_path, parse_key};

use crate::patch::{ApplyOutcome, Consolidated, Phase};

/// Consumes per-site summaries. Implementations render however they like;
/// the default one renders plain text.
pub trait Reporter {
    fn report(&mut self, summary: &SiteSummary<'_>);
}

/// One call site's summary for reporting.
#[derive(Debug)]
pub struct SiteSummary<'a> {
    pub component: &'a str,
    pub consolidated: &'a Consolidated,
    pub outcome: &'a ApplyOutcome,
}

impl SiteSummary<'_> {
    pub fn first_unapplied(&self) -> Option<&str> {
        self.outcome.first_unapplied()
    }

    pub fn phase_of(&self, key: &str) -> Option<Phase> {
        self.consolidated.phase_of(key)
    }
}

/// Hint text for an unapplied patch, keyed by its originating phase.
pub fn phase_hint(phase: Phase) -> &'static str {
    match phase {
        Phase::Derive => "add a placeholder slot for the derived key at the call site",
        Phase::Diff | Phase::Prune => {
            "dynamic keys or preserved subtrees block leaf-only editing here"
        }
    }
}

/// Render one site summary as plain text.
pub fn render_text(summary: &SiteSummary<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} patch target(s), {} applied",
        summary.component,
        summary.consolidated.len(),
        summary.outcome.applied(),
    );
    let Some(first) = summary.first_unapplied() else {
        return out;
    };
    let located = parse_key(first)
        .map(|path| display_path(&path))
        .unwrap_or_else(|_| first.to_owned());
    let phase = summary.phase_of(first);
    let _ = writeln!(
        out,
        "  FAILED: {} patch unapplied at {}",
        phase.map(|p| p.as_str()).unwrap_or("unknown"),
        located,
    );
    if let Some(phase) = phase {
        let _ = writeln!(out, "  hint: {}", phase_hint(phase));
    }
    let remaining = summary.outcome.unapplied_count();
    if remaining > 1 {
        let _ = writeln!(out, "  ({} unapplied in total)", remaining);
    }
    out
}

/// A [`Reporter`] that collects rendered text, for build drivers that batch
/// their output.
#[derive(Debug, Default)]
pub struct TextReporter {
    lines: Vec<String>,
}

impl TextReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_text(self) -> String {
        self.lines.concat()
    }
}

impl Reporter for TextReporter {
    fn report(&mut self, summary: &SiteSummary<'_>) {
        self.lines.push(render_text(summary));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Data;
    use crate::options::PreservedKeys;
    use crate::patch::apply::{apply_patches, NoPreserved};
    use crate::patch::plan::PatchGroups;
    use crate::patch::{consolidate, PatchOp};
    use prop_refine_expr::{Expr, Prop};
    use prop_refine_path::Step;

    #[test]
    fn clean_sites_render_one_line() {
        let consolidated = consolidate(PatchGroups {
            diff: vec![PatchOp::set(vec![Step::key("a")], Data::Num(1.0))],
            derive: vec![],
            prune: vec![],
        });
        let mut tree = Expr::object(vec![Prop::entry("a", Expr::num(0.0))]);
        let outcome =
            apply_patches(&mut tree, &consolidated, &PreservedKeys::default(), &NoPreserved)
                .unwrap();
        let summary = SiteSummary {
            component: "Button",
            consolidated: &consolidated,
            outcome: &outcome,
        };
        let text = render_text(&summary);
        assert_eq!(text, "Button: 1 patch target(s), 1 applied\n");
    }

    #[test]
    fn failures_render_phase_and_hint() {
        let consolidated = consolidate(PatchGroups {
            diff: vec![],
            derive: vec![PatchOp::set(vec![Step::key("hash")], Data::str("h"))],
            prune: vec![],
        });
        let mut tree = Expr::object(vec![]);
        let outcome =
            apply_patches(&mut tree, &consolidated, &PreservedKeys::default(), &NoPreserved)
                .unwrap();
        let summary = SiteSummary {
            component: "Button",
            consolidated: &consolidated,
            outcome: &outcome,
        };
        let text = render_text(&summary);
        assert!(text.contains("derive patch unapplied at .hash"));
        assert!(text.contains("placeholder slot"));
    }
}
