//! Plain-data model: the *logical* view of an extracted call-site argument.
//!
//! `Data` is what the extractor produces, the validator reshapes, and the
//! differ/overlay compare. It is deliberately richer than JSON: it carries
//! `undefined`, non-finite numbers, pattern matchers, time instants, sparse
//! holes and preserved-slot placeholders, because all of those occur in the
//! compiled trees this pipeline edits.
//!
//! Containers share their payloads behind `Rc`. Cloning is cheap, and
//! pointer identity (`Rc::ptr_eq`) carries the reference-equality semantics
//! the differ's `reference` array policy and the overlay's lazy
//! materialization depend on.

pub mod json;

use std::rc::Rc;

use indexmap::IndexMap;
use prop_refine_path::{format_key, num_token};

/// Keyed-container payload. Insertion-ordered: diff output determinism
/// depends on slot order surviving extraction and validation.
pub type Entries = IndexMap<String, Data>;

/// Ordered-container payload. Sparse slots are explicit [`Data::Hole`]s.
pub type Items = Vec<Data>;

// ── Rich scalar-likes ─────────────────────────────────────────────────────

/// A pattern-matcher value. Compared by source and flags, never traversed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub source: String,
    pub flags: String,
}

impl Pattern {
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Pattern {
            source: source.into(),
            flags: flags.into(),
        }
    }
}

// ── Preserved placeholder ─────────────────────────────────────────────────

/// Placeholder substituted into extracted data wherever a preserved key was
/// intercepted. Carries only the logical path of the slot it replaced (as a
/// canonical key); the real expression lives in the side channel and is
/// inlined back only during patch application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreservedSlot {
    key: String,
}

impl PreservedSlot {
    /// Placeholder for the slot at `path`.
    pub fn at(path: &[prop_refine_path::Step]) -> Self {
        PreservedSlot {
            key: format_key(path),
        }
    }

    /// The canonical key of the slot this placeholder stands for.
    pub fn key(&self) -> &str {
        &self.key
    }
}

// ── Data ──────────────────────────────────────────────────────────────────

/// A plain-data value.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    /// Rich scalar-like: pattern matcher, compared by content.
    Pattern(Pattern),
    /// Rich scalar-like: time instant as epoch milliseconds, compared by
    /// value. Not re-encodable into tree form.
    Instant(i64),
    /// A sparse ordered-container slot. Not an own key of its container.
    Hole,
    /// Preserved-subtree placeholder. Round-trips through validation as
    /// ordinary data; resolved back to the captured expression only by the
    /// patcher.
    Preserved(PreservedSlot),
    Arr(Rc<Items>),
    Obj(Rc<Entries>),
}

impl Data {
    pub fn str(s: impl Into<String>) -> Self {
        Data::Str(s.into())
    }

    pub fn num(n: f64) -> Self {
        Data::Num(n)
    }

    pub fn arr(items: Items) -> Self {
        Data::Arr(Rc::new(items))
    }

    pub fn obj(entries: Entries) -> Self {
        Data::Obj(Rc::new(entries))
    }

    pub fn is_obj(&self) -> bool {
        matches!(self, Data::Obj(_))
    }

    pub fn is_arr(&self) -> bool {
        matches!(self, Data::Arr(_))
    }

    pub fn is_hole(&self) -> bool {
        matches!(self, Data::Hole)
    }

    pub fn as_obj(&self) -> Option<&Entries> {
        match self {
            Data::Obj(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_arr(&self) -> Option<&Items> {
        match self {
            Data::Arr(items) => Some(items),
            _ => None,
        }
    }

    /// Kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Data::Undefined => "undefined",
            Data::Null => "null",
            Data::Bool(_) => "boolean",
            Data::Num(_) => "number",
            Data::Str(_) => "string",
            Data::Pattern(_) => "pattern",
            Data::Instant(_) => "instant",
            Data::Hole => "hole",
            Data::Preserved(_) => "preserved",
            Data::Arr(_) => "array",
            Data::Obj(_) => "object",
        }
    }
}

// ── Identity ──────────────────────────────────────────────────────────────

/// SameValue-style identity.
///
/// Scalars compare by value (`NaN` equals `NaN`, `-0` is distinct from `0`),
/// rich scalar-likes by content, placeholders by slot key, containers by
/// reference. This is the leaf comparator of the differ and the
/// short-circuit test of the overlay; deep structural equality is what the
/// derived `PartialEq` is for.
pub fn same_value(a: &Data, b: &Data) -> bool {
    match (a, b) {
        (Data::Undefined, Data::Undefined) => true,
        (Data::Null, Data::Null) => true,
        (Data::Hole, Data::Hole) => true,
        (Data::Bool(x), Data::Bool(y)) => x == y,
        (Data::Num(x), Data::Num(y)) => {
            x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan())
        }
        (Data::Str(x), Data::Str(y)) => x == y,
        (Data::Pattern(x), Data::Pattern(y)) => x == y,
        (Data::Instant(x), Data::Instant(y)) => x == y,
        (Data::Preserved(x), Data::Preserved(y)) => x.key() == y.key(),
        (Data::Arr(x), Data::Arr(y)) => Rc::ptr_eq(x, y),
        (Data::Obj(x), Data::Obj(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

// ── String coercion ───────────────────────────────────────────────────────

/// Host-language string coercion, as template interpolation applies it.
pub fn coerce_str(data: &Data) -> String {
    match data {
        Data::Undefined => "undefined".to_owned(),
        Data::Null => "null".to_owned(),
        Data::Bool(b) => b.to_string(),
        Data::Num(n) => num_token(*n),
        Data::Str(s) => s.clone(),
        Data::Pattern(p) => format!("/{}/{}", p.source, p.flags),
        Data::Instant(ms) => ms.to_string(),
        Data::Hole => String::new(),
        Data::Preserved(_) => String::new(),
        Data::Arr(items) => {
            let parts: Vec<String> = items.iter().map(coerce_str).collect();
            parts.join(",")
        }
        Data::Obj(_) => "[object Object]".to_owned(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
