//! Catalog: session-lived index of every class-like page on the site.

use std::collections::HashSet;

use crate::store::name_key;

/// One catalog entry: a fetchable page and the name the site declares for it.
///
/// Declared names for nested classes are dot-qualified relative to their
/// enclosing class (e.g. `Map.Entry`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Opaque, stable identifier of a fetchable page
    pub location: String,
    /// The dot-qualified name declared by the source site
    pub declared_name: String,
}

impl CatalogEntry {
    /// Create a catalog entry.
    pub fn new(location: impl Into<String>, declared_name: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            declared_name: declared_name.into(),
        }
    }
}

/// The full class index, built once per session and read-only thereafter.
///
/// Entries keep the order they were discovered in; no entry is ever removed.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    locations: HashSet<String>,
}

impl Catalog {
    /// Build a catalog from the entries the fetch collaborator discovered.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let locations = entries.iter().map(|e| e.location.clone()).collect();
        Self { entries, locations }
    }

    /// Iterate entries in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Number of catalog entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the catalog holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a page location is known to the catalog.
    ///
    /// Locations are opaque, so the comparison is case-sensitive.
    pub fn contains_location(&self, location: &str) -> bool {
        self.locations.contains(location)
    }

    /// Every entry whose declared name equals `name`, ignoring case, in
    /// catalog order. Genuinely ambiguous sites can declare two classes with
    /// the same bare name; all of them are returned.
    pub fn find_exact(&self, name: &str) -> Vec<&CatalogEntry> {
        let wanted = name_key(name);
        self.entries
            .iter()
            .filter(|e| name_key(&e.declared_name) == wanted)
            .collect()
    }

    /// Every entry that is a plausible anchor for the given query segments,
    /// in catalog order, deduplicated by location.
    ///
    /// Per entry at each segment index `i`, with `d` = number of dots in the
    /// entry's declared name:
    /// - `d > i`: the entry is deeper than the query has progressed; compare
    ///   only `segments[i]` against the entry's path element `i` and defer
    ///   the full match to the descent inside the class.
    /// - otherwise: the query's prefix must reproduce the entry's full
    ///   qualified name, i.e. the declared name must equal
    ///   `segments[0..=d]` joined with `.`.
    ///
    /// Sites expose inherited nested classes as dot-qualified names in the
    /// "all classes" index, so a query like `A.B.C` is resolvable whether `B`
    /// is a direct nested member of `A` or `C` is inherited from an ancestor,
    /// without a second special-cased traversal.
    pub fn match_segments(&self, segments: &[String]) -> Vec<&CatalogEntry> {
        let mut found = Vec::new();

        for entry in &self.entries {
            let declared = name_key(&entry.declared_name);
            let parts: Vec<&str> = declared.split('.').collect();
            let dots = parts.len() - 1;

            for (i, segment) in segments.iter().enumerate() {
                let matched = if dots > i {
                    parts[i] == *segment
                } else {
                    declared == segments[..=dots].join(".")
                };

                if matched {
                    found.push(entry);
                    break;
                }
            }
        }

        found
    }
}
