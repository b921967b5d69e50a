//! Structural differ: minimal CREATE/CHANGE/REMOVE events between two
//! plain-data trees.
//!
//! Traversal is depth-first. At each keyed level the previous tree's own
//! slots are walked first (removals and changes), then the current tree's
//! slots absent from the previous one (creations). That ordering is part of
//! the output contract, not an accident of iteration.
//!
//! Two values recurse only when both are containers of the same kind;
//! anything else is a leaf comparison under SameValue identity. Ordered
//! containers follow a configurable policy, and the default -
//! [`ArrayPolicy::Atomic`] with [`ArrayEquality::Reference`] - is chosen to
//! pair with the overlay merger's wholesale array replacement. Changing one
//! side of that pairing silently misaligns diff targets.
//!
//! Paths accumulate bottom-up: a child result carries only local segments
//! and the caller prepends its own segment when propagating a non-empty
//! result, so unchanged subtrees allocate nothing.

use std::rc::Rc;

use indexmap::IndexSet;
use prop_refine_path::{Path, Step};

use crate::data::{same_value, Data, Entries, Items};

// ── Configuration ─────────────────────────────────────────────────────────

/// How ordered containers are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayPolicy {
    /// Recurse index-by-index, exactly like keyed containers.
    Diff,
    /// Never recurse; emit at most one CHANGE for the whole container.
    #[default]
    Atomic,
    /// Never recurse, never emit.
    Ignore,
}

/// Equality comparator for [`ArrayPolicy::Atomic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayEquality {
    /// Reference identity of the container payloads.
    #[default]
    Reference,
    /// Same length and element-wise SameValue identity.
    Shallow,
}

/// Differ configuration.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    pub arrays: ArrayPolicy,
    pub array_equality: ArrayEquality,
    /// Guard against self- and mutually-referential container pairs.
    pub cycle_guard: bool,
    /// Keyed-container slot names skipped entirely: no events, no
    /// recursion. Never applies to ordered-container indices.
    pub exclude_keys: IndexSet<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        DiffOptions {
            arrays: ArrayPolicy::default(),
            array_equality: ArrayEquality::default(),
            cycle_guard: true,
            exclude_keys: IndexSet::new(),
        }
    }
}

impl DiffOptions {
    pub fn exclude(mut self, key: impl Into<String>) -> Self {
        self.exclude_keys.insert(key.into());
        self
    }
}

// ── Events ────────────────────────────────────────────────────────────────

/// One structural difference, with its full logical path.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffEvent {
    Create { path: Path, value: Data },
    Change { path: Path, prev: Data, next: Data },
    Remove { path: Path, prev: Data },
}

impl DiffEvent {
    pub fn path(&self) -> &Path {
        match self {
            DiffEvent::Create { path, .. }
            | DiffEvent::Change { path, .. }
            | DiffEvent::Remove { path, .. } => path,
        }
    }

    fn path_mut(&mut self) -> &mut Path {
        match self {
            DiffEvent::Create { path, .. }
            | DiffEvent::Change { path, .. }
            | DiffEvent::Remove { path, .. } => path,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            DiffEvent::Create { .. } => "create",
            DiffEvent::Change { .. } => "change",
            DiffEvent::Remove { .. } => "remove",
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────

/// Compare two plain-data trees.
pub fn diff(prev: &Data, next: &Data, options: &DiffOptions) -> Vec<DiffEvent> {
    let mut differ = Differ {
        options,
        visiting: Vec::new(),
    };
    differ.diff_value(prev, next)
}

// ── Core recursion ────────────────────────────────────────────────────────

struct Differ<'a> {
    options: &'a DiffOptions,
    /// Same-kind container pairs currently being compared on this branch.
    /// Pointer pairs, so sibling branches sharing references pay nothing.
    visiting: Vec<(usize, usize)>,
}

impl Differ<'_> {
    fn diff_value(&mut self, prev: &Data, next: &Data) -> Vec<DiffEvent> {
        match (prev, next) {
            (Data::Obj(p), Data::Obj(n)) => {
                if Rc::ptr_eq(p, n) {
                    return Vec::new();
                }
                let pair = (Rc::as_ptr(p) as usize, Rc::as_ptr(n) as usize);
                if self.enter(pair) {
                    return Vec::new();
                }
                let events = self.diff_entries(p, n);
                self.leave();
                events
            }
            (Data::Arr(p), Data::Arr(n)) => self.diff_arrays(p, n),
            _ => self.diff_leaf(prev, next),
        }
    }

    fn diff_leaf(&mut self, prev: &Data, next: &Data) -> Vec<DiffEvent> {
        if same_value(prev, next) {
            return Vec::new();
        }
        vec![DiffEvent::Change {
            path: Path::new(),
            prev: prev.clone(),
            next: next.clone(),
        }]
    }

    fn diff_entries(&mut self, prev: &Entries, next: &Entries) -> Vec<DiffEvent> {
        let mut events = Vec::new();
        // Previous tree first: removals and changes.
        for (key, prev_value) in prev {
            if self.options.exclude_keys.contains(key) {
                continue;
            }
            match next.get(key) {
                None => events.push(DiffEvent::Remove {
                    path: vec![Step::key(key.clone())],
                    prev: prev_value.clone(),
                }),
                Some(next_value) => {
                    let child = self.diff_value(prev_value, next_value);
                    prepend(child, Step::key(key.clone()), &mut events);
                }
            }
        }
        // Then the current tree: creations.
        for (key, next_value) in next {
            if self.options.exclude_keys.contains(key) {
                continue;
            }
            if !prev.contains_key(key) {
                events.push(DiffEvent::Create {
                    path: vec![Step::key(key.clone())],
                    value: next_value.clone(),
                });
            }
        }
        events
    }

    fn diff_arrays(&mut self, prev: &Rc<Items>, next: &Rc<Items>) -> Vec<DiffEvent> {
        match self.options.arrays {
            ArrayPolicy::Ignore => Vec::new(),
            ArrayPolicy::Atomic => {
                if self.arrays_equal(prev, next) {
                    Vec::new()
                } else {
                    vec![DiffEvent::Change {
                        path: Path::new(),
                        prev: Data::Arr(prev.clone()),
                        next: Data::Arr(next.clone()),
                    }]
                }
            }
            ArrayPolicy::Diff => {
                if Rc::ptr_eq(prev, next) {
                    return Vec::new();
                }
                let pair = (Rc::as_ptr(prev) as usize, Rc::as_ptr(next) as usize);
                if self.enter(pair) {
                    return Vec::new();
                }
                let events = self.diff_items(prev, next);
                self.leave();
                events
            }
        }
    }

    /// Index-by-index recursion. Holes are not own slots: a hole on one
    /// side against a value on the other is a creation or removal, and
    /// holes on both sides are no event at all.
    fn diff_items(&mut self, prev: &Items, next: &Items) -> Vec<DiffEvent> {
        let mut events = Vec::new();
        for (i, prev_value) in prev.iter().enumerate() {
            if prev_value.is_hole() {
                continue;
            }
            match next.get(i).filter(|v| !v.is_hole()) {
                None => events.push(DiffEvent::Remove {
                    path: vec![Step::index(i)],
                    prev: prev_value.clone(),
                }),
                Some(next_value) => {
                    let child = self.diff_value(prev_value, next_value);
                    prepend(child, Step::index(i), &mut events);
                }
            }
        }
        for (i, next_value) in next.iter().enumerate() {
            if next_value.is_hole() {
                continue;
            }
            let absent = prev.get(i).map(Data::is_hole).unwrap_or(true);
            if absent {
                events.push(DiffEvent::Create {
                    path: vec![Step::index(i)],
                    value: next_value.clone(),
                });
            }
        }
        events
    }

    fn arrays_equal(&self, prev: &Rc<Items>, next: &Rc<Items>) -> bool {
        if Rc::ptr_eq(prev, next) {
            return true;
        }
        match self.options.array_equality {
            ArrayEquality::Reference => false,
            ArrayEquality::Shallow => {
                prev.len() == next.len()
                    && prev.iter().zip(next.iter()).all(|(a, b)| same_value(a, b))
            }
        }
    }

    /// Returns true when the pair is already being compared on this branch.
    fn enter(&mut self, pair: (usize, usize)) -> bool {
        if !self.options.cycle_guard {
            return false;
        }
        if self.visiting.contains(&pair) {
            return true;
        }
        self.visiting.push(pair);
        false
    }

    fn leave(&mut self) {
        if self.options.cycle_guard {
            self.visiting.pop();
        }
    }
}

/// Propagate child events upward, prepending the caller's segment. Called
/// only with non-empty results, so unchanged subtrees never touch paths.
fn prepend(child: Vec<DiffEvent>, step: Step, into: &mut Vec<DiffEvent>) {
    for mut event in child {
        event.path_mut().insert(0, step.clone());
        into.push(event);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
