//! Class records: one parsed class-like page with own and inherited tables.

use tracing::debug;

use crate::catalog::Catalog;
use crate::entity::member::bare_member_name;
use crate::entity::{DetailTag, MemberKind};
use crate::error::Error;
use crate::fetch::RawClassPage;
use crate::store::names_eq;

/// The kind of a class-like entity, from the page title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// A plain class
    Class,
    /// An interface
    Interface,
    /// An enum type
    Enum,
    /// An annotation type
    Annotation,
}

impl ClassKind {
    fn parse(token: &str) -> Self {
        match token.to_lowercase().as_str() {
            "interface" => ClassKind::Interface,
            "enum" => ClassKind::Enum,
            "annotation" => ClassKind::Annotation,
            _ => ClassKind::Class,
        }
    }
}

/// Parsed representation of one class-like page.
///
/// Own tables map member name → location fragment on this page; method keys
/// keep the parameter text, so overloads stay distinguishable while lookups
/// go by bare name. Inherited tables map member name → the location of the
/// defining ancestor class, not the member itself.
///
/// Immutable once constructed; identical locations yield the identical
/// `Arc<ClassRecord>` for the session, enforced by the resolver's store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    /// Page location
    pub location: String,
    /// Declared name, dot-qualified for nested types, generics included
    pub name: String,
    /// Entity kind from the page title
    pub kind: ClassKind,
    /// Plain description text
    pub description: String,
    /// Raw description markup
    pub raw_description: String,
    /// Labeled detail blocks ("Since:", "See Also:", ...)
    pub extra_info: Vec<DetailTag>,

    nested_classes: Vec<(String, String)>,
    methods: Vec<(String, String)>,
    enum_constants: Vec<(String, String)>,
    fields: Vec<(String, String)>,

    inherited_nested_classes: Vec<(String, String)>,
    inherited_methods: Vec<(String, String)>,
    inherited_enum_constants: Vec<(String, String)>,
    inherited_fields: Vec<(String, String)>,
}

impl ClassRecord {
    /// Build a class record from a fetched page.
    ///
    /// Fails with [`Error::MalformedPage`] when the page title cannot be
    /// parsed into at least a type and a name. Inherited references to
    /// ancestors the catalog does not know are dropped, not fatal.
    pub(crate) fn from_raw(
        location: impl Into<String>,
        raw: RawClassPage,
        catalog: &Catalog,
    ) -> Result<Self, Error> {
        let location = location.into();
        let (kind, name) = parse_title(&raw.title)
            .ok_or_else(|| Error::malformed(&location, "page title has no type and name"))?;

        let keep = |table: Vec<(String, String)>, region: &str| {
            drop_unknown_ancestors(table, catalog, &location, region)
        };

        Ok(Self {
            kind,
            name,
            description: raw.description,
            raw_description: raw.raw_description,
            extra_info: raw.extra_info,
            nested_classes: raw.nested_classes,
            methods: raw.methods,
            enum_constants: raw.enum_constants,
            fields: raw.fields,
            inherited_nested_classes: keep(raw.inherited_nested_classes, "nested classes"),
            inherited_methods: keep(raw.inherited_methods, "methods"),
            inherited_enum_constants: keep(raw.inherited_enum_constants, "enum constants"),
            inherited_fields: keep(raw.inherited_fields, "fields"),
            location,
        })
    }

    /// The declared name with any generic-parameter suffix removed:
    /// `HashMap<K,V>` → `HashMap`.
    pub fn bare_name(&self) -> &str {
        match self.name.split_once('<') {
            Some((name, _)) => name.trim(),
            None => self.name.trim(),
        }
    }

    /// Own nested classes as `(name, location)`, in page order.
    pub fn nested_classes(&self) -> &[(String, String)] {
        &self.nested_classes
    }

    /// Inherited nested classes as `(name, ancestor_location)`.
    pub fn inherited_nested_classes(&self) -> &[(String, String)] {
        &self.inherited_nested_classes
    }

    fn own_table(&self, kind: MemberKind) -> &[(String, String)] {
        match kind {
            MemberKind::Method => &self.methods,
            MemberKind::EnumConstant => &self.enum_constants,
            MemberKind::Field => &self.fields,
        }
    }

    fn inherited_table(&self, kind: MemberKind) -> &[(String, String)] {
        match kind {
            MemberKind::Method => &self.inherited_methods,
            MemberKind::EnumConstant => &self.inherited_enum_constants,
            MemberKind::Field => &self.inherited_fields,
        }
    }

    /// Own members of `kind`, in page order, as `(key, fragment)`.
    pub fn own_members(&self, kind: MemberKind) -> &[(String, String)] {
        self.own_table(kind)
    }

    /// Inherited members of `kind`, in page order, as
    /// `(name, ancestor_location)`.
    pub fn inherited_members(&self, kind: MemberKind) -> &[(String, String)] {
        self.inherited_table(kind)
    }

    /// Own members of `kind` whose bare name equals `name`, ignoring case.
    ///
    /// Overloaded methods collapse to one lookup name; every overload is
    /// returned.
    pub(crate) fn own_matches(&self, kind: MemberKind, name: &str) -> Vec<(&str, &str)> {
        self.own_table(kind)
            .iter()
            .filter(|(key, _)| names_eq(bare_member_name(key), name))
            .map(|(key, fragment)| (key.as_str(), fragment.as_str()))
            .collect()
    }

    /// Inherited members of `kind` whose name equals `name`, ignoring case,
    /// as `(name, ancestor_location)`.
    pub(crate) fn inherited_matches(&self, kind: MemberKind, name: &str) -> Vec<(&str, &str)> {
        self.inherited_table(kind)
            .iter()
            .filter(|(key, _)| names_eq(bare_member_name(key), name))
            .map(|(key, ancestor)| (key.as_str(), ancestor.as_str()))
            .collect()
    }

    /// Location of the own nested class named `name`, ignoring case.
    ///
    /// Nested-class keys can themselves be dotted; both the full key and its
    /// last path element are accepted.
    pub(crate) fn nested_location(&self, name: &str) -> Option<&str> {
        self.nested_classes
            .iter()
            .find(|(key, _)| nested_name_matches(key, name))
            .map(|(_, location)| location.as_str())
    }

    /// Inherited nested class named `name`, ignoring case, as
    /// `(name, ancestor_location)`.
    pub(crate) fn inherited_nested(&self, name: &str) -> Option<(&str, &str)> {
        self.inherited_nested_classes
            .iter()
            .find(|(key, _)| nested_name_matches(key, name))
            .map(|(key, ancestor)| (key.as_str(), ancestor.as_str()))
    }
}

/// A nested-class key matches on its full dotted form or its last element.
fn nested_name_matches(key: &str, name: &str) -> bool {
    if names_eq(key, name) {
        return true;
    }
    key.rsplit('.')
        .next()
        .is_some_and(|last| names_eq(last, name))
}

/// Split a page title into kind and declared name.
///
/// Titles read `Class String`, `Interface List<E>`, `Enum Thread.State`, or
/// `Annotation Type Deprecated`. A bare one-word title is taken as a class
/// name with no kind.
fn parse_title(title: &str) -> Option<(ClassKind, String)> {
    let words: Vec<&str> = title.split_whitespace().collect();
    match words.as_slice() {
        [] => None,
        [name] => Some((ClassKind::Class, name.to_string())),
        [kind, second, rest @ ..] => {
            let kind = ClassKind::parse(kind);
            let name = if kind == ClassKind::Annotation && names_eq(second, "type") {
                rest.first().copied().unwrap_or(second)
            } else {
                second
            };
            Some((kind, name.to_string()))
        }
    }
}

/// Drop inherited references whose ancestor the catalog cannot locate.
///
/// One bad reference degrades that entry only, never the whole record.
fn drop_unknown_ancestors(
    table: Vec<(String, String)>,
    catalog: &Catalog,
    location: &str,
    region: &str,
) -> Vec<(String, String)> {
    table
        .into_iter()
        .filter(|(name, ancestor)| {
            let known = catalog.contains_location(ancestor);
            if !known {
                debug!(
                    "dropping inherited {} `{}` on `{}`: ancestor `{}` not in catalog",
                    region, name, location, ancestor
                );
            }
            known
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            CatalogEntry::new("Object.html", "Object"),
            CatalogEntry::new("AbstractList.html", "AbstractList"),
        ])
    }

    fn raw_page() -> RawClassPage {
        RawClassPage {
            title: "Class ArrayList<E>".to_string(),
            description: "Resizable-array implementation.".to_string(),
            raw_description: "Resizable-array implementation.".to_string(),
            extra_info: vec![DetailTag::new("Since:", "1.2", "1.2")],
            nested_classes: vec![("Itr".to_string(), "ArrayList.Itr.html".to_string())],
            methods: vec![
                ("indexOf(Object o)".to_string(), "indexOf-java.lang.Object-".to_string()),
                ("indexOf(Object o, int start)".to_string(), "indexOf-java.lang.Object-int-".to_string()),
                ("size()".to_string(), "size--".to_string()),
            ],
            enum_constants: vec![],
            fields: vec![("elementData".to_string(), "elementData".to_string())],
            inherited_methods: vec![
                ("toString".to_string(), "Object.html".to_string()),
                ("lost".to_string(), "Missing.html".to_string()),
            ],
            inherited_nested_classes: vec![],
            inherited_enum_constants: vec![],
            inherited_fields: vec![("modCount".to_string(), "AbstractList.html".to_string())],
        }
    }

    #[test]
    fn test_from_raw_parses_title() {
        let record = ClassRecord::from_raw("ArrayList.html", raw_page(), &catalog()).unwrap();
        assert_eq!(record.kind, ClassKind::Class);
        assert_eq!(record.name, "ArrayList<E>");
        assert_eq!(record.bare_name(), "ArrayList");
    }

    #[test]
    fn test_from_raw_rejects_empty_title() {
        let mut raw = raw_page();
        raw.title = "  ".to_string();
        let err = ClassRecord::from_raw("ArrayList.html", raw, &catalog()).unwrap_err();
        assert!(matches!(err, Error::MalformedPage { .. }));
    }

    #[test]
    fn test_annotation_type_title() {
        let (kind, name) = parse_title("Annotation Type Deprecated").unwrap();
        assert_eq!(kind, ClassKind::Annotation);
        assert_eq!(name, "Deprecated");
    }

    #[test]
    fn test_one_word_title_defaults_to_class() {
        let (kind, name) = parse_title("Thread.State").unwrap();
        assert_eq!(kind, ClassKind::Class);
        assert_eq!(name, "Thread.State");
    }

    #[test]
    fn test_overloads_collapse_to_one_lookup_name() {
        let record = ClassRecord::from_raw("ArrayList.html", raw_page(), &catalog()).unwrap();
        let found = record.own_matches(MemberKind::Method, "indexof");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, "indexOf(Object o)");
        assert_eq!(found[1].0, "indexOf(Object o, int start)");
    }

    #[test]
    fn test_unknown_ancestor_dropped() {
        let record = ClassRecord::from_raw("ArrayList.html", raw_page(), &catalog()).unwrap();
        let names: Vec<_> = record
            .inherited_members(MemberKind::Method)
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, vec!["toString"]);
        // The known ancestor in another table survives
        assert_eq!(record.inherited_matches(MemberKind::Field, "modCount").len(), 1);
    }

    #[test]
    fn test_nested_name_matches_dotted_keys() {
        assert!(nested_name_matches("Entry.Inner", "inner"));
        assert!(nested_name_matches("Entry.Inner", "entry.inner"));
        assert!(!nested_name_matches("Entry.Inner", "entry"));
    }
}
