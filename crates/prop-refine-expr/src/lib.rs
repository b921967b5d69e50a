//! Compiled expression tree IR.
//!
//! This is the *physical* view of a call-site argument: the expression
//! subtree as it sits in the compiled source. Keyed containers hold an
//! ordered slot list that may include inline-expansion (spread) markers;
//! ordered containers hold elements that may be real expressions, holes
//! (elisions) or spread markers. That slot list is the authoritative order
//! and membership record - the plain-data view derived from it is lossy.
//!
//! The tree is mutated in place by the patcher, so every node type is plain
//! owned data with no back-references; traversals carry their own cursors.

use std::fmt;

use prop_refine_path::num_token;

// ── Literals ──────────────────────────────────────────────────────────────

/// A literal leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    /// A pattern-matcher literal, e.g. `/ab+c/i`.
    Regex { source: String, flags: String },
}

// ── Object slots ──────────────────────────────────────────────────────────

/// A keyed-container slot key.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    /// Bare name-style key: `{ label: .. }`.
    Ident(String),
    /// String-literal key: `{ "label x": .. }`.
    Str(String),
    /// Numeric-literal key: `{ 0: .. }`.
    Num(f64),
    /// Computed key: `{ [expr]: .. }`.
    Computed(Box<Expr>),
}

impl Key {
    /// The statically known slot name, if this key is not computed.
    ///
    /// Numeric keys render through the same canonical number formatting as
    /// path segments, so `{ 1: x }` and a computed key resolving to `1`
    /// address the same slot.
    pub fn static_label(&self) -> Option<String> {
        match self {
            Key::Ident(name) => Some(name.clone()),
            Key::Str(name) => Some(name.clone()),
            Key::Num(n) => Some(num_token(*n)),
            Key::Computed(_) => None,
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        if is_identifier(s) {
            Key::Ident(s.to_owned())
        } else {
            Key::Str(s.to_owned())
        }
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        if is_identifier(&s) {
            Key::Ident(s)
        } else {
            Key::Str(s)
        }
    }
}

/// A keyed-container slot: a literal entry or an inline-expansion marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
    Entry { key: Key, value: Expr },
    Spread(Expr),
}

impl Prop {
    pub fn entry(key: impl Into<Key>, value: Expr) -> Self {
        Prop::Entry {
            key: key.into(),
            value,
        }
    }

    pub fn spread(expr: Expr) -> Self {
        Prop::Spread(expr)
    }
}

// ── Array elements ────────────────────────────────────────────────────────

/// An ordered-container element: a real expression, a structural hole
/// (elision), or an inline-expansion marker.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElem {
    Hole,
    Item(Expr),
    Spread(Expr),
}

// ── Expressions ───────────────────────────────────────────────────────────

/// A compiled expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Lit),
    /// A bare name reference (`undefined`, `NaN`, `props`, ..).
    Ident(String),
    /// A string-interpolation expression. `quasis` always has exactly one
    /// more element than `exprs`.
    Template { quasis: Vec<String>, exprs: Vec<Expr> },
    /// Unary negation, as compiled negative number literals appear.
    Neg(Box<Expr>),
    Array(Vec<ArrayElem>),
    Object(Vec<Prop>),
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// Static member access (`theme.spacing`). Always dynamic from the
    /// extractor's point of view; carried so call sites look like call sites.
    Member { object: Box<Expr>, property: String },
}

impl Expr {
    pub fn null() -> Self {
        Expr::Lit(Lit::Null)
    }

    pub fn bool(b: bool) -> Self {
        Expr::Lit(Lit::Bool(b))
    }

    pub fn num(n: f64) -> Self {
        Expr::Lit(Lit::Num(n))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Expr::Lit(Lit::Str(s.into()))
    }

    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Expr::Lit(Lit::Regex {
            source: source.into(),
            flags: flags.into(),
        })
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn template(quasis: Vec<&str>, exprs: Vec<Expr>) -> Self {
        debug_assert_eq!(quasis.len(), exprs.len() + 1);
        Expr::Template {
            quasis: quasis.into_iter().map(str::to_owned).collect(),
            exprs,
        }
    }

    pub fn neg(expr: Expr) -> Self {
        Expr::Neg(Box::new(expr))
    }

    pub fn array(elems: Vec<ArrayElem>) -> Self {
        Expr::Array(elems)
    }

    /// Array of plain items, no holes or spreads.
    pub fn items(items: Vec<Expr>) -> Self {
        Expr::Array(items.into_iter().map(ArrayElem::Item).collect())
    }

    pub fn object(props: Vec<Prop>) -> Self {
        Expr::Object(props)
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn member(object: Expr, property: impl Into<String>) -> Self {
        Expr::Member {
            object: Box::new(object),
            property: property.into(),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Expr::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Expr::Array(_))
    }
}

/// Returns true if `s` is a bare name-style key.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

// ── Display ───────────────────────────────────────────────────────────────

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lit::Null => f.write_str("null"),
            Lit::Bool(b) => write!(f, "{b}"),
            Lit::Num(n) => f.write_str(&num_token(*n)),
            Lit::Str(s) => write!(f, "\"{}\"", s.escape_default()),
            Lit::Regex { source, flags } => write!(f, "/{source}/{flags}"),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Ident(name) => f.write_str(name),
            Key::Str(name) => write!(f, "\"{}\"", name.escape_default()),
            Key::Num(n) => f.write_str(&num_token(*n)),
            Key::Computed(expr) => write!(f, "[{expr}]"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Lit(lit) => lit.fmt(f),
            Expr::Ident(name) => f.write_str(name),
            Expr::Template { quasis, exprs } => {
                f.write_str("`")?;
                for (i, quasi) in quasis.iter().enumerate() {
                    f.write_str(quasi)?;
                    if let Some(expr) = exprs.get(i) {
                        write!(f, "${{{expr}}}")?;
                    }
                }
                f.write_str("`")
            }
            Expr::Neg(expr) => write!(f, "-{expr}"),
            Expr::Array(elems) => {
                f.write_str("[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match elem {
                        ArrayElem::Hole => {}
                        ArrayElem::Item(expr) => expr.fmt(f)?,
                        ArrayElem::Spread(expr) => write!(f, "...{expr}")?,
                    }
                }
                f.write_str("]")
            }
            Expr::Object(props) => {
                if props.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, prop) in props.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match prop {
                        Prop::Entry { key, value } => write!(f, "{key}: {value}")?,
                        Prop::Spread(expr) => write!(f, "...{expr}")?,
                    }
                }
                f.write_str(" }")
            }
            Expr::Call { callee, args } => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    arg.fmt(f)?;
                }
                f.write_str(")")
            }
            Expr::Member { object, property } => write!(f, "{object}.{property}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_shapes() {
        assert!(is_identifier("label"));
        assert!(is_identifier("_x$1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn key_from_str_picks_shape() {
        assert_eq!(Key::from("label"), Key::Ident("label".to_owned()));
        assert_eq!(Key::from("label x"), Key::Str("label x".to_owned()));
    }

    #[test]
    fn static_labels() {
        assert_eq!(Key::Ident("a".into()).static_label(), Some("a".into()));
        assert_eq!(Key::Num(1.0).static_label(), Some("1".into()));
        assert_eq!(
            Key::Computed(Box::new(Expr::str("a"))).static_label(),
            None
        );
    }

    #[test]
    fn display_roundtrippable_shapes() {
        let expr = Expr::object(vec![
            Prop::entry("label", Expr::str("hi")),
            Prop::entry("size", Expr::num(2.0)),
            Prop::spread(Expr::ident("rest")),
        ]);
        assert_eq!(expr.to_string(), r#"{ label: "hi", size: 2, ...rest }"#);
    }

    #[test]
    fn display_array_with_hole() {
        let expr = Expr::array(vec![
            ArrayElem::Item(Expr::num(1.0)),
            ArrayElem::Hole,
            ArrayElem::Spread(Expr::ident("xs")),
        ]);
        assert_eq!(expr.to_string(), "[1, , ...xs]");
    }

    #[test]
    fn display_template() {
        let expr = Expr::template(vec!["w-", ""], vec![Expr::ident("size")]);
        assert_eq!(expr.to_string(), "`w-${size}`");
    }

    #[test]
    fn display_call_and_member() {
        let expr = Expr::call(
            Expr::member(Expr::ident("theme"), "spacing"),
            vec![Expr::num(4.0)],
        );
        assert_eq!(expr.to_string(), "theme.spacing(4)");
    }
}
