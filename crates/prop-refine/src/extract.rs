//! Static extractor: decode an expression subtree into plain data.
//!
//! The extractor never evaluates anything. A node either *resolves* to a
//! concrete [`Data`] value or it does not, and the two container kinds react
//! differently to a non-resolving child:
//!
//! - **Ordered containers are strict.** A spread marker or a single
//!   non-resolving element collapses the whole container - a partial array
//!   would corrupt positional meaning. Holes survive as true gaps so index
//!   alignment is kept.
//! - **Keyed containers are partial.** A slot with a spread marker, an
//!   unresolvable key or an unresolvable value is silently dropped; the
//!   container itself always yields. This is what stops one dynamic leaf
//!   from poisoning everything above it.
//!
//! Slots whose static label is a preserved key are intercepted before value
//! resolution: the real expression is captured into the [`SideChannel`]
//! under the slot's logical path and a placeholder takes its place in the
//! result.

use indexmap::IndexMap;

use prop_refine_expr::{ArrayElem, Expr, Key, Lit, Prop};
use prop_refine_path::{format_key, num_token, Path, Step};

use crate::data::{coerce_str, Data, Entries, Items, Pattern, PreservedSlot};
use crate::options::PreservedKeys;

// ── Side channel ──────────────────────────────────────────────────────────

/// Captured preserved subtrees, keyed by canonical path.
///
/// Populated exactly when a placeholder is created; consumed by the patcher
/// to inline the original expression wherever that placeholder appears
/// inside a replacement value.
#[derive(Debug, Clone, Default)]
pub struct SideChannel {
    entries: IndexMap<String, Expr>,
}

impl SideChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, key: String, expr: Expr) {
        self.entries.insert(key, expr);
    }

    pub fn get(&self, key: &str) -> Option<&Expr> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Root adapter ──────────────────────────────────────────────────────────

/// Result of extracting a call-site argument.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Always a keyed container.
    pub data: Data,
    pub side_channel: SideChannel,
}

/// Extract plain data from a call-site argument expression.
///
/// The top-level result must be a keyed container; anything else - a
/// non-static root, an array, a primitive - yields `None` at this boundary.
pub fn extract_root(expr: &Expr, preserved: &PreservedKeys) -> Option<Extraction> {
    let mut side_channel = SideChannel::new();
    let mut path = Path::new();
    let data = resolve(expr, &mut path, preserved, &mut side_channel)?;
    data.is_obj().then_some(Extraction { data, side_channel })
}

// ── Value resolution ──────────────────────────────────────────────────────

/// Resolve an expression at `path`. `None` is the non-static signal.
fn resolve(
    expr: &Expr,
    path: &mut Path,
    preserved: &PreservedKeys,
    side_channel: &mut SideChannel,
) -> Option<Data> {
    match expr {
        Expr::Lit(lit) => Some(resolve_lit(lit)),
        Expr::Ident(name) => resolve_name(name),
        Expr::Neg(inner) => match resolve_detached(inner)? {
            Data::Num(n) => Some(Data::Num(-n)),
            _ => None,
        },
        Expr::Template { quasis, exprs } => resolve_template(quasis, exprs),
        Expr::Array(elems) => resolve_array(elems, path, preserved, side_channel),
        Expr::Object(props) => Some(resolve_object(props, path, preserved, side_channel)),
        Expr::Call { .. } | Expr::Member { .. } => None,
    }
}

fn resolve_lit(lit: &Lit) -> Data {
    match lit {
        Lit::Null => Data::Null,
        Lit::Bool(b) => Data::Bool(*b),
        Lit::Num(n) => Data::Num(*n),
        Lit::Str(s) => Data::Str(s.clone()),
        Lit::Regex { source, flags } => Data::Pattern(Pattern::new(source.clone(), flags.clone())),
    }
}

/// Constant name references. Everything else is a dynamic reference.
fn resolve_name(name: &str) -> Option<Data> {
    match name {
        "undefined" => Some(Data::Undefined),
        "NaN" => Some(Data::Num(f64::NAN)),
        "Infinity" => Some(Data::Num(f64::INFINITY)),
        _ => None,
    }
}

/// A template resolves only if every interpolated part resolves; parts are
/// then joined under host-language string coercion.
fn resolve_template(quasis: &[String], exprs: &[Expr]) -> Option<Data> {
    let mut out = String::new();
    for (i, quasi) in quasis.iter().enumerate() {
        out.push_str(quasi);
        if let Some(expr) = exprs.get(i) {
            let part = resolve_detached(expr)?;
            out.push_str(&coerce_str(&part));
        }
    }
    Some(Data::Str(out))
}

/// Resolution outside the interception scope: computed keys and template
/// parts. Runs against a throwaway side channel so no preserved capture can
/// leak from positions that are not keyed-container value slots.
fn resolve_detached(expr: &Expr) -> Option<Data> {
    let mut scratch_channel = SideChannel::new();
    let mut scratch_path = Path::new();
    resolve(expr, &mut scratch_path, &PreservedKeys::none(), &mut scratch_channel)
}

// ── Ordered containers: strict ────────────────────────────────────────────

fn resolve_array(
    elems: &[ArrayElem],
    path: &mut Path,
    preserved: &PreservedKeys,
    side_channel: &mut SideChannel,
) -> Option<Data> {
    let mut items = Items::with_capacity(elems.len());
    for (i, elem) in elems.iter().enumerate() {
        match elem {
            // A hole stays a gap, keeping index alignment.
            ArrayElem::Hole => items.push(Data::Hole),
            // Inline expansion makes every later index unknowable.
            ArrayElem::Spread(_) => return None,
            ArrayElem::Item(expr) => {
                path.push(Step::index(i));
                let resolved = resolve(expr, path, preserved, side_channel);
                path.pop();
                items.push(resolved?);
            }
        }
    }
    Some(Data::arr(items))
}

// ── Keyed containers: partial ─────────────────────────────────────────────

fn resolve_object(
    props: &[Prop],
    path: &mut Path,
    preserved: &PreservedKeys,
    side_channel: &mut SideChannel,
) -> Data {
    let mut entries = Entries::new();
    for prop in props {
        let Prop::Entry { key, value } = prop else {
            // Spread slot: invisible to the logical view.
            continue;
        };
        let is_static = !matches!(key, Key::Computed(_));
        let Some(label) = resolve_prop_key(key) else {
            continue;
        };
        // Interception applies to static labels only; a computed key that
        // happens to resolve to a preserved name resolves normally.
        if is_static && preserved.contains(&label) {
            path.push(Step::Key(label.clone()));
            side_channel.record(format_key(path), value.clone());
            entries.insert(label, Data::Preserved(PreservedSlot::at(path)));
            path.pop();
            continue;
        }
        path.push(Step::Key(label.clone()));
        let resolved = resolve(value, path, preserved, side_channel);
        path.pop();
        if let Some(resolved) = resolved {
            entries.insert(label, resolved);
        }
    }
    Data::obj(entries)
}

/// Resolve a slot key to a label.
///
/// Non-computed keys are read as literal labels. Computed keys resolve
/// through ordinary leaf resolution, and only string or number results are
/// accepted - a boolean, null or undefined key marks a logic error upstream
/// and drops the slot rather than coining a coerced label.
fn resolve_prop_key(key: &Key) -> Option<String> {
    match key {
        Key::Ident(name) | Key::Str(name) => Some(name.clone()),
        Key::Num(n) => Some(num_token(*n)),
        Key::Computed(expr) => match resolve_detached(expr)? {
            Data::Str(s) => Some(s),
            Data::Num(n) => Some(num_token(n)),
            _ => None,
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
