//! Rule descriptors: what the call-site resolver hands the pipeline.
//!
//! A rule names the component it covers and at least one thing to do with
//! the data found there: validate it against a schema, derive extra values,
//! or prune keys. A rule that defines none of the three is a configuration
//! error and fails before any extraction happens.

use std::fmt;

use regex::{Regex, RegexBuilder};

use prop_refine_path::{display_path, Path};

use crate::data::{Data, Entries};
use crate::error::RefineError;

// ── Component matching ────────────────────────────────────────────────────

/// Matches component names at call sites.
#[derive(Debug, Clone)]
pub enum ComponentMatcher {
    Exact(String),
    Pattern(Regex),
}

impl ComponentMatcher {
    pub fn exact(name: impl Into<String>) -> Self {
        ComponentMatcher::Exact(name.into())
    }

    /// Compile a pattern matcher. The pattern is anchored to the whole
    /// component name.
    pub fn pattern(source: &str) -> Result<Self, RefineError> {
        let anchored = format!("^(?:{source})$");
        let regex = RegexBuilder::new(&anchored)
            .build()
            .map_err(|e| RefineError::InvalidRule {
                component: source.to_owned(),
                reason: format!("bad component pattern: {e}"),
            })?;
        Ok(ComponentMatcher::Pattern(regex))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            ComponentMatcher::Exact(exact) => exact == name,
            ComponentMatcher::Pattern(regex) => regex.is_match(name),
        }
    }

    /// The name or pattern text, for diagnostics.
    pub fn describe(&self) -> &str {
        match self {
            ComponentMatcher::Exact(name) => name,
            ComponentMatcher::Pattern(regex) => regex.as_str(),
        }
    }
}

// ── Validator collaborator ────────────────────────────────────────────────

/// One validation issue. The first issue aborts the call site.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub path: Path,
    pub message: String,
}

impl Issue {
    pub fn new(path: Path, message: impl Into<String>) -> Self {
        Issue {
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", display_path(&self.path), self.message)
    }
}

/// Validation result: a (possibly transformed) value, or issues.
#[derive(Debug, Clone)]
pub enum Validation {
    Value(Data),
    Issues(Vec<Issue>),
}

impl Validation {
    pub fn value(data: Data) -> Self {
        Validation::Value(data)
    }

    pub fn issue(path: Path, message: impl Into<String>) -> Self {
        Validation::Issues(vec![Issue::new(path, message)])
    }
}

/// Schema validation and transformation. Synchronous and infallible at the
/// call boundary: a schema reports problems through [`Validation::Issues`],
/// it does not throw and it cannot suspend.
///
/// Schemas must tolerate [`Data::Preserved`] placeholders anywhere a
/// preserved slot can occur; placeholders round-trip through validation as
/// ordinary values.
pub trait Validator {
    fn validate(&self, data: &Data) -> Validation;
}

impl<F> Validator for F
where
    F: Fn(&Data) -> Validation,
{
    fn validate(&self, data: &Data) -> Validation {
        self(data)
    }
}

// ── Derivation collaborator ───────────────────────────────────────────────

/// User-supplied derivation hook. `emit` enqueues root-level record
/// entries; it may be called zero or more times and has no access to
/// anything below the root.
pub trait DeriveHook {
    fn derive(&self, validated: &Data, emit: &mut dyn FnMut(Entries));
}

impl<F> DeriveHook for F
where
    F: Fn(&Data, &mut dyn FnMut(Entries)),
{
    fn derive(&self, validated: &Data, emit: &mut dyn FnMut(Entries)) {
        self(validated, emit)
    }
}

// ── Rules ─────────────────────────────────────────────────────────────────

/// A validated rule descriptor for one component.
pub struct Rule {
    pub component: ComponentMatcher,
    pub schema: Option<Box<dyn Validator>>,
    pub derive: Option<Box<dyn DeriveHook>>,
    pub prune: Vec<String>,
}

impl Rule {
    pub fn new(component: ComponentMatcher) -> Self {
        Rule {
            component,
            schema: None,
            derive: None,
            prune: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: impl Validator + 'static) -> Self {
        self.schema = Some(Box::new(schema));
        self
    }

    pub fn with_derive(mut self, derive: impl DeriveHook + 'static) -> Self {
        self.derive = Some(Box::new(derive));
        self
    }

    pub fn with_prune<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prune = keys.into_iter().map(Into::into).collect();
        self
    }

    /// A rule must define at least one of schema, derive or prune.
    pub fn ensure_valid(&self) -> Result<(), RefineError> {
        if self.schema.is_none() && self.derive.is_none() && self.prune.is_empty() {
            return Err(RefineError::InvalidRule {
                component: self.component.describe().to_owned(),
                reason: "rule defines none of schema, derive or prune".to_owned(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("component", &self.component)
            .field("schema", &self.schema.is_some())
            .field("derive", &self.derive.is_some())
            .field("prune", &self.prune)
            .finish()
    }
}

/// A rule registry with first-match resolution.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        RuleSet { rules }
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// The first rule matching `component`, if any.
    pub fn resolve(&self, component: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.component.matches(component))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
