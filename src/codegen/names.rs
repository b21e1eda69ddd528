//! Name Resolution
//!
//! Unique-name allocation for generated entities, handling:
//! - CamelCase conversion of schema identifiers
//! - Name collision detection and `_` suffix disambiguation
//! - Deterministic clash resolution across sets of colliding keys
//!
//! A `NameRegistry` belongs to exactly one generation run. It is threaded
//! by `&mut` through the passes that allocate names, so concurrent runs
//! never see each other's names.
//!
//! Name resolution is language-AGNOSTIC: it decides canonical names, not
//! how a target language renders them.

use std::collections::{BTreeMap, BTreeSet, HashSet};

// =============================================================================
// Name Registry
// =============================================================================

/// The set of names already handed out in one run
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    defined: HashSet<String>,

    /// How many names needed a `_` suffix
    disambiguated: usize,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    /// Register a name; false if it was already taken
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.defined.insert(name.into())
    }

    /// Register `base`, appending `_` until it is unused
    pub fn make_unique(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        while self.defined.contains(&name) {
            name.push('_');
        }
        if name != base {
            self.disambiguated += 1;
        }
        self.defined.insert(name.clone());
        name
    }

    /// Resolve a set of colliding candidates.
    ///
    /// `clashes` maps each candidate name to every distinct key that produced
    /// it. Keys are taken in sorted order: the first gets the candidate if
    /// it is still free, each following key gets the candidate with `_`
    /// appended until unused. Returns key -> assigned name.
    pub fn resolve_name_clash_set(
        &mut self,
        clashes: &BTreeMap<String, BTreeSet<String>>,
    ) -> BTreeMap<String, String> {
        let mut assigned = BTreeMap::new();
        for (candidate, keys) in clashes {
            for key in keys {
                let name = self.make_unique(candidate);
                if keys.len() > 1 {
                    tracing::debug!(%candidate, %key, %name, "resolved name clash");
                }
                assigned.insert(key.clone(), name);
            }
        }
        assigned
    }

    pub fn len(&self) -> usize {
        self.defined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defined.is_empty()
    }

    pub fn stats(&self) -> NameRegistryStats {
        NameRegistryStats {
            defined: self.defined.len(),
            disambiguated: self.disambiguated,
        }
    }
}

/// Statistics from name allocation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NameRegistryStats {
    pub defined: usize,
    pub disambiguated: usize,
}

// =============================================================================
// Naming Utilities
// =============================================================================

/// CamelCase a schema identifier.
///
/// `-` and `.` are word separators and are removed; the first letter and
/// every letter after a separator are uppercased. Underscores are kept
/// (and also start a new word), since generated names use `_` to join path
/// elements.
pub fn camel_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;

    for c in s.chars() {
        if c == '-' || c == '.' {
            capitalize_next = true;
        } else if c == '_' {
            result.push(c);
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// CamelCase every segment and join them with `_`
pub fn join_camel<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| camel_case(s.as_ref()))
        .collect::<Vec<_>>()
        .join("_")
}

/// `<Module>_<Seg>_<Seg>...`
pub fn module_qualified<S: AsRef<str>>(module: &str, segments: &[S]) -> String {
    if segments.is_empty() {
        return camel_case(module);
    }
    format!("{}_{}", camel_case(module), join_camel(segments))
}
