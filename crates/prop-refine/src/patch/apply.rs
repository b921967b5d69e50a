//! Tree patcher: apply a consolidated patch set to the physical tree.
//!
//! The patcher walks the expression tree in place and applies patches
//! leaf-by-leaf. It reconciles two views that do not quite agree: the
//! logical view the patches were planned against (plain keyed/ordered
//! containers) and the physical view being edited (containers that also
//! hold spread markers and holes the logical view cannot see).
//!
//! Rules of engagement:
//!
//! - Only slots with statically known labels are addressable. A computed
//!   key makes the whole subtree beneath it unaddressable; patches
//!   targeting it stay pending and surface as unapplied.
//! - A preserved slot is never descended into, so a runtime-owned subtree
//!   cannot be edited even by a nested patch.
//! - A keyed-slot `delete` removes the slot; sibling slots, spread markers
//!   included, stay untouched. An ordered-slot `delete` clears the slot to
//!   a hole - shifting would silently renumber every later element's path.
//! - A `set` replaces only the slot's value expression, or fills a hole.
//! - Anything still pending when the walk finishes is reported unapplied;
//!   nothing is ever inserted to make a patch fit.
//!
//! Logical paths are reconstructed during descent with an explicit segment
//! stack; the tree itself carries no parent links.

use indexmap::{IndexMap, IndexSet};

use prop_refine_expr::{ArrayElem, Expr, Key, Prop};
use prop_refine_path::{display_path, format_key, Path, Step};

use crate::data::Data;
use crate::error::EncodeError;
use crate::options::PreservedKeys;

use super::consolidate::Consolidated;
use super::types::PatchOp;

// ── Resolver ──────────────────────────────────────────────────────────────

/// Resolves preserved placeholders back to their captured expressions.
pub trait PreservedResolver {
    fn resolve(&self, key: &str) -> Option<&Expr>;
}

impl PreservedResolver for crate::extract::SideChannel {
    fn resolve(&self, key: &str) -> Option<&Expr> {
        self.get(key)
    }
}

/// A resolver with nothing captured. For patch sets that cannot contain
/// placeholders.
pub struct NoPreserved;

impl PreservedResolver for NoPreserved {
    fn resolve(&self, _key: &str) -> Option<&Expr> {
        None
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────

/// Snapshot of what the patcher did and what it could not do.
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    applied: usize,
    unapplied_sets: Vec<String>,
    unapplied_deletes: Vec<String>,
}

impl ApplyOutcome {
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn fully_applied(&self) -> bool {
        self.unapplied_sets.is_empty() && self.unapplied_deletes.is_empty()
    }

    /// The canonical "first unapplied" key. Set-phase patches take
    /// priority over delete-phase ones.
    pub fn first_unapplied(&self) -> Option<&str> {
        self.unapplied_sets
            .first()
            .or_else(|| self.unapplied_deletes.first())
            .map(String::as_str)
    }

    pub fn unapplied_sets(&self) -> &[String] {
        &self.unapplied_sets
    }

    pub fn unapplied_deletes(&self) -> &[String] {
        &self.unapplied_deletes
    }

    pub fn unapplied_count(&self) -> usize {
        self.unapplied_sets.len() + self.unapplied_deletes.len()
    }
}

// ── Entry point ───────────────────────────────────────────────────────────

/// Apply `patches` to the tree rooted at `root`, mutating it in place.
///
/// A root that is not a keyed-container expression is structurally
/// un-editable: the patcher refuses to run and reports every patch
/// unapplied. Encoding failures are fatal and abort the whole application.
pub fn apply_patches(
    root: &mut Expr,
    patches: &Consolidated,
    preserved: &PreservedKeys,
    resolver: &dyn PreservedResolver,
) -> Result<ApplyOutcome, EncodeError> {
    let mut sets: IndexMap<String, Data> = IndexMap::new();
    let mut deletes: IndexSet<String> = IndexSet::new();
    for (key, op) in patches.ops() {
        match op {
            PatchOp::Set { value, .. } => {
                sets.insert(key.to_owned(), value.clone());
            }
            PatchOp::Delete { .. } => {
                deletes.insert(key.to_owned());
            }
        }
    }

    let Expr::Object(props) = root else {
        return Ok(ApplyOutcome {
            applied: 0,
            unapplied_sets: sets.into_keys().collect(),
            unapplied_deletes: deletes.into_iter().collect(),
        });
    };

    let mut patcher = Patcher {
        sets,
        deletes,
        applied: 0,
        preserved,
        resolver,
    };
    let mut path = Path::new();
    patcher.walk_props(props, &mut path)?;

    Ok(ApplyOutcome {
        applied: patcher.applied,
        unapplied_sets: patcher.sets.into_keys().collect(),
        unapplied_deletes: patcher.deletes.into_iter().collect(),
    })
}

// ── Walker ────────────────────────────────────────────────────────────────

struct Patcher<'a> {
    sets: IndexMap<String, Data>,
    deletes: IndexSet<String>,
    applied: usize,
    preserved: &'a PreservedKeys,
    resolver: &'a dyn PreservedResolver,
}

impl Patcher<'_> {
    fn walk_props(&mut self, props: &mut Vec<Prop>, path: &mut Path) -> Result<(), EncodeError> {
        let mut i = 0;
        while i < props.len() {
            let label = match &props[i] {
                Prop::Entry { key, .. } => key.static_label(),
                // Spread slots have no addressable label; leave them be.
                Prop::Spread(_) => None,
            };
            let Some(label) = label else {
                i += 1;
                continue;
            };
            if self.preserved.contains(&label) {
                // Runtime-owned subtree: no descent, not even for nested
                // patch attempts.
                i += 1;
                continue;
            }
            path.push(Step::Key(label));
            let key = format_key(path);
            if self.deletes.shift_remove(&key) {
                path.pop();
                props.remove(i);
                self.applied += 1;
                continue;
            }
            if let Some(value) = self.sets.shift_remove(&key) {
                let encoded = self.encode(&value, path)?;
                if let Prop::Entry { value: slot, .. } = &mut props[i] {
                    *slot = encoded;
                }
                self.applied += 1;
            } else if let Prop::Entry { value: slot, .. } = &mut props[i] {
                self.walk_value(slot, path)?;
            }
            path.pop();
            i += 1;
        }
        Ok(())
    }

    fn walk_elems(
        &mut self,
        elems: &mut [ArrayElem],
        path: &mut Path,
    ) -> Result<(), EncodeError> {
        for (i, elem) in elems.iter_mut().enumerate() {
            path.push(Step::index(i));
            let key = format_key(path);
            if self.deletes.shift_remove(&key) {
                // Clear, don't shift: shifting would renumber every later
                // element's logical path.
                *elem = ArrayElem::Hole;
                self.applied += 1;
            } else if let Some(value) = self.sets.shift_remove(&key) {
                *elem = ArrayElem::Item(self.encode(&value, path)?);
                self.applied += 1;
            } else if let ArrayElem::Item(expr) = elem {
                self.walk_value(expr, path)?;
            }
            path.pop();
        }
        Ok(())
    }

    fn walk_value(&mut self, expr: &mut Expr, path: &mut Path) -> Result<(), EncodeError> {
        match expr {
            Expr::Object(props) => self.walk_props(props, path),
            Expr::Array(elems) => self.walk_elems(elems, path),
            _ => Ok(()),
        }
    }

    // ── Re-encoding ───────────────────────────────────────────────────────

    /// Encode a plain-data value back into tree form at `path`.
    fn encode(&self, value: &Data, path: &mut Path) -> Result<Expr, EncodeError> {
        match value {
            Data::Undefined => Ok(Expr::ident("undefined")),
            Data::Null => Ok(Expr::null()),
            Data::Bool(b) => Ok(Expr::bool(*b)),
            Data::Num(n) => Ok(encode_num(*n)),
            Data::Str(s) => Ok(Expr::str(s.clone())),
            Data::Pattern(p) => Ok(Expr::regex(p.source.clone(), p.flags.clone())),
            Data::Instant(_) => Err(EncodeError::Unrepresentable {
                kind: "instant",
                path: display_path(path),
            }),
            Data::Hole => Err(EncodeError::Unrepresentable {
                kind: "hole",
                path: display_path(path),
            }),
            Data::Preserved(slot) => self
                .resolver
                .resolve(slot.key())
                .cloned()
                .ok_or_else(|| EncodeError::UnresolvedPlaceholder {
                    key: slot.key().to_owned(),
                }),
            Data::Arr(items) => {
                let mut elems = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    if item.is_hole() {
                        // Sparse gaps stay gaps, not explicit empties.
                        elems.push(ArrayElem::Hole);
                        continue;
                    }
                    path.push(Step::index(i));
                    let encoded = self.encode(item, path);
                    path.pop();
                    elems.push(ArrayElem::Item(encoded?));
                }
                Ok(Expr::Array(elems))
            }
            Data::Obj(entries) => {
                let mut props = Vec::with_capacity(entries.len());
                for (key, entry) in entries.iter() {
                    path.push(Step::key(key.clone()));
                    let encoded = self.encode(entry, path);
                    path.pop();
                    props.push(Prop::Entry {
                        key: Key::from(key.clone()),
                        value: encoded?,
                    });
                }
                Ok(Expr::Object(props))
            }
        }
    }
}

fn encode_num(n: f64) -> Expr {
    if n.is_nan() {
        Expr::ident("NaN")
    } else if n == f64::INFINITY {
        Expr::ident("Infinity")
    } else if n == f64::NEG_INFINITY {
        Expr::neg(Expr::ident("Infinity"))
    } else {
        Expr::num(n)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
