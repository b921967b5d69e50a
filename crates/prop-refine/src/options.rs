//! Configuration surface consumed by the pipeline.

use indexmap::IndexSet;

/// Default preserved key: the runtime-owned subtree slot of a component
/// instantiation.
pub const DEFAULT_PRESERVED_KEY: &str = "children";

/// The set of keyed-container slot names whose values are treated as opaque
/// runtime subtrees: intercepted during extraction, skipped by the overlay,
/// never descended into by the patcher.
#[derive(Debug, Clone)]
pub struct PreservedKeys {
    names: IndexSet<String>,
}

impl PreservedKeys {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PreservedKeys {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// No preserved keys at all.
    pub fn none() -> Self {
        PreservedKeys {
            names: IndexSet::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for PreservedKeys {
    fn default() -> Self {
        PreservedKeys::new([DEFAULT_PRESERVED_KEY])
    }
}

/// Options for one refinement run.
///
/// The differ/overlay array-policy pairing is intentionally not exposed
/// here: the two sides must stay aligned (atomic array replacement in the
/// overlay paired with `atomic`/`reference` array diffing), so the pipeline
/// always passes the shared default to both.
#[derive(Debug, Clone, Default)]
pub struct RefineOptions {
    pub preserved: PreservedKeys,
    /// Plan and consolidate, but do not mutate the tree.
    pub dry_run: bool,
}
