//! The query resolver: dotted queries in, class and member records out.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tracing::debug;

use crate::catalog::{Catalog, CatalogEntry};
use crate::entity::{bare_member_name, ClassRecord, MemberKind, MemberRecord};
use crate::error::Error;
use crate::fetch::{DocFetcher, HttpFetcher};
use crate::query::{after_first, Query};
use crate::store::{name_key, MemoStore};

/// One search result: a class-like record or a member record.
#[derive(Debug, Clone)]
pub enum Entry {
    /// A class, interface, enum, or annotation page
    Class(Arc<ClassRecord>),
    /// A method, enum constant, or field fragment
    Member(Arc<MemberRecord>),
}

impl Entry {
    /// Declared name of the underlying record.
    pub fn name(&self) -> &str {
        match self {
            Entry::Class(class) => &class.name,
            Entry::Member(member) => &member.name,
        }
    }

    /// Location of the underlying record.
    pub fn location(&self) -> &str {
        match self {
            Entry::Class(class) => &class.location,
            Entry::Member(member) => &member.location,
        }
    }

    /// The class record, when this entry is one.
    pub fn as_class(&self) -> Option<&Arc<ClassRecord>> {
        match self {
            Entry::Class(class) => Some(class),
            Entry::Member(_) => None,
        }
    }

    /// The member record, when this entry is one.
    pub fn as_member(&self) -> Option<&Arc<MemberRecord>> {
        match self {
            Entry::Class(_) => None,
            Entry::Member(member) => Some(member),
        }
    }
}

/// A session against one documentation site.
///
/// The catalog is built lazily on first use and lives for the session; class
/// and member records are materialized on first reference and memoized by
/// location, so repeated queries trigger no repeat fetches. Single logical
/// thread of control; the type is deliberately not `Sync`.
pub struct Javadoc {
    fetcher: Box<dyn DocFetcher>,
    root: String,
    catalog: OnceCell<Catalog>,
    classes: MemoStore<Arc<ClassRecord>>,
    members: MemoStore<Arc<MemberRecord>>,
}

impl Javadoc {
    /// Create a session over HTTP for the site rooted at `root` (an
    /// "all classes" index or tree page).
    pub fn new(root: &str) -> Result<Self, Error> {
        Ok(Self::with_fetcher(Box::new(HttpFetcher::new()?), root))
    }

    /// Create a session with an explicit fetch collaborator.
    pub fn with_fetcher(fetcher: Box<dyn DocFetcher>, root: &str) -> Self {
        Self {
            fetcher,
            root: root.trim_end_matches('/').to_string(),
            catalog: OnceCell::new(),
            classes: MemoStore::new(),
            members: MemoStore::new(),
        }
    }

    /// The session catalog, built on first call.
    pub fn catalog(&self) -> Result<&Catalog, Error> {
        self.catalog.get_or_try_init(|| {
            debug!("building catalog from `{}`", self.root);
            self.fetcher.build_catalog(&self.root).map(Catalog::new)
        })
    }

    /// Drop all memoized class and member records.
    ///
    /// The catalog itself is session-lived and stays.
    pub fn clear_caches(&self) {
        self.classes.clear();
        self.members.clear();
    }

    /// Resolve a dotted query to every matching class and member record.
    ///
    /// The query is normalized (`#` folds to `.`, hidden control characters
    /// and a single trailing `.` are stripped, comparison is
    /// case-insensitive), then matched against the catalog; every plausible
    /// anchor class contributes its own results in catalog order. Member
    /// results merge own and inherited matches kind-major (methods, enum
    /// constants, fields), own before inherited within each kind. Class
    /// results are deduplicated by location; member results are not, so
    /// overload sets and inherited shadowing stay visible.
    ///
    /// Candidates whose pages are malformed are excluded, not fatal. Returns
    /// [`Error::NotFound`] when nothing matched.
    pub fn search(&self, query: &str) -> Result<Vec<Entry>, Error> {
        let parsed = Query::parse(query);
        let anchors = self.catalog()?.match_segments(&parsed.segments);
        if anchors.is_empty() {
            return Err(Error::not_found(query));
        }

        let mut results: Vec<Entry> = Vec::new();
        let mut seen_classes: HashSet<String> = HashSet::new();
        for anchor in anchors {
            let found = match self.resolve_anchor(anchor, &parsed) {
                Ok(found) => found,
                Err(Error::MalformedPage { location, reason }) => {
                    debug!(
                        "excluding candidate `{}`: malformed page at `{}`: {}",
                        anchor.declared_name, location, reason
                    );
                    continue;
                }
                Err(other) => return Err(other),
            };

            for entry in found {
                if let Entry::Class(class) = &entry {
                    if !seen_classes.insert(class.location.clone()) {
                        continue;
                    }
                }
                results.push(entry);
            }
        }

        if results.is_empty() {
            return Err(Error::not_found(query));
        }
        Ok(results)
    }

    /// Every class whose declared name equals `name`, ignoring case, in
    /// catalog order. Candidates with malformed pages are excluded.
    pub fn search_classes(&self, name: &str) -> Result<Vec<Arc<ClassRecord>>, Error> {
        let mut found = Vec::new();
        for entry in self.catalog()?.find_exact(name) {
            match self.class_at(&entry.location) {
                Ok(class) => found.push(class),
                Err(Error::MalformedPage { location, reason }) => {
                    debug!(
                        "excluding `{}`: malformed page at `{}`: {}",
                        entry.declared_name, location, reason
                    );
                }
                Err(other) => return Err(other),
            }
        }
        Ok(found)
    }

    /// The first class whose declared name equals `name`, ignoring case.
    pub fn retrieve_class(&self, name: &str) -> Result<Arc<ClassRecord>, Error> {
        for entry in self.catalog()?.find_exact(name) {
            match self.class_at(&entry.location) {
                Ok(class) => return Ok(class),
                Err(Error::MalformedPage { location, reason }) => {
                    debug!(
                        "skipping `{}`: malformed page at `{}`: {}",
                        entry.declared_name, location, reason
                    );
                }
                Err(other) => return Err(other),
            }
        }
        Err(Error::not_found(name))
    }

    /// Every method named `method` on `class`, own before inherited.
    pub fn search_methods(
        &self,
        class: &str,
        method: &str,
    ) -> Result<Vec<Arc<MemberRecord>>, Error> {
        let class = self.retrieve_class(class)?;
        let mut found = self.own_members_named(&class, MemberKind::Method, method)?;
        found.extend(self.inherited_members_named(&class, MemberKind::Method, method)?);
        Ok(found)
    }

    /// The first method named `method` on `class`, own before inherited.
    pub fn retrieve_method(&self, class: &str, method: &str) -> Result<Arc<MemberRecord>, Error> {
        self.retrieve_member(class, method, MemberKind::Method)
    }

    /// The first enum constant named `constant` on `class`, own before
    /// inherited.
    pub fn retrieve_enum(&self, class: &str, constant: &str) -> Result<Arc<MemberRecord>, Error> {
        self.retrieve_member(class, constant, MemberKind::EnumConstant)
    }

    /// The first field named `field` on `class`, own before inherited.
    pub fn retrieve_field(&self, class: &str, field: &str) -> Result<Arc<MemberRecord>, Error> {
        self.retrieve_member(class, field, MemberKind::Field)
    }

    fn retrieve_member(
        &self,
        class_name: &str,
        name: &str,
        kind: MemberKind,
    ) -> Result<Arc<MemberRecord>, Error> {
        let class = self.retrieve_class(class_name)?;
        let mut found = self.own_members_named(&class, kind, name)?;
        if found.is_empty() {
            found = self.inherited_members_named(&class, kind, name)?;
        }
        found
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("{class_name}.{name}")))
    }

    /// The memoized record for a page, materializing it on first reference.
    fn class_at(&self, location: &str) -> Result<Arc<ClassRecord>, Error> {
        if let Some(found) = self.classes.get(location) {
            return Ok(found);
        }

        debug!("materializing class record for `{}`", location);
        let raw = self.fetcher.fetch_class_page(location)?;
        let record = Arc::new(ClassRecord::from_raw(location, raw, self.catalog()?)?);
        self.classes.put(location, record.clone());
        // First writer wins; hand out whatever the store settled on
        Ok(self.classes.get(location).unwrap_or(record))
    }

    /// Resolve one catalog anchor against the query.
    fn resolve_anchor(&self, anchor: &CatalogEntry, query: &Query) -> Result<Vec<Entry>, Error> {
        let class = self.class_at(&anchor.location)?;
        let class = self.descend_nested(class, &query.segments[1..])?;

        let bare = name_key(class.bare_name());
        let remainder = after_first(&query.text, &bare)
            .map(|tail| tail.trim_start_matches('.').trim().to_string())
            .unwrap_or_else(|| query.text.clone());

        let mut found = Vec::new();
        if remainder.is_empty() {
            if query.text == bare {
                found.push(Entry::Class(class.clone()));
            }
        } else {
            found.extend(self.search_members(&class, &remainder)?);
        }

        if found.is_empty() {
            found = self.reinterpret_tail(&class, query);
        }
        Ok(found)
    }

    /// Walk query segments into (inherited) nested classes.
    ///
    /// Each segment naming an own or inherited nested class replaces the
    /// current class; the first segment matching neither stops the walk.
    /// When no segment advanced at all, nested names embedding dots that do
    /// not line up with segment boundaries are tried: first the whole
    /// remaining path as one name, then the path without its last element.
    fn descend_nested(
        &self,
        start: Arc<ClassRecord>,
        path: &[String],
    ) -> Result<Arc<ClassRecord>, Error> {
        let mut current = start.clone();
        for segment in path {
            match self.nested_class(&current, segment)? {
                Some(next) => current = next,
                None => break,
            }
        }

        if path.is_empty() || !Arc::ptr_eq(&current, &start) {
            return Ok(current);
        }

        let full = path.join(".");
        if let Some(found) = self.nested_class(&current, &full)? {
            return Ok(found);
        }
        if let Some((partial, _)) = full.rsplit_once('.') {
            if let Some(found) = self.nested_class(&current, partial)? {
                return Ok(found);
            }
        }
        Ok(current)
    }

    /// The own or inherited nested class of `class` named `name`, if any.
    ///
    /// Inherited nested classes follow the stored ancestor location and are
    /// looked up in the ancestor's own nested table. Malformed pages along
    /// the way degrade to "not found"; fetch failures stay fatal.
    fn nested_class(
        &self,
        class: &ClassRecord,
        name: &str,
    ) -> Result<Option<Arc<ClassRecord>>, Error> {
        if let Some(location) = class.nested_location(name) {
            return self.class_if_wellformed(location);
        }

        if let Some((nested_name, ancestor_location)) = class.inherited_nested(name) {
            let Some(ancestor) = self.class_if_wellformed(ancestor_location)? else {
                return Ok(None);
            };
            let simple = nested_name.rsplit('.').next().unwrap_or(nested_name);
            if let Some(location) = ancestor.nested_location(simple) {
                return self.class_if_wellformed(location);
            }
        }

        Ok(None)
    }

    fn class_if_wellformed(&self, location: &str) -> Result<Option<Arc<ClassRecord>>, Error> {
        match self.class_at(location) {
            Ok(class) => Ok(Some(class)),
            Err(Error::MalformedPage { location, reason }) => {
                debug!("ignoring malformed page at `{}`: {}", location, reason);
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    /// Combined member search: own and inherited methods, enum constants,
    /// and fields named `name`, kind-major, own before inherited.
    fn search_members(&self, class: &Arc<ClassRecord>, name: &str) -> Result<Vec<Entry>, Error> {
        let mut found = Vec::new();
        for kind in [MemberKind::Method, MemberKind::EnumConstant, MemberKind::Field] {
            found.extend(self.own_members_named(class, kind, name)?);
            found.extend(self.inherited_members_named(class, kind, name)?);
        }
        Ok(found.into_iter().map(Entry::Member).collect())
    }

    fn own_members_named(
        &self,
        class: &Arc<ClassRecord>,
        kind: MemberKind,
        name: &str,
    ) -> Result<Vec<Arc<MemberRecord>>, Error> {
        let mut records = Vec::new();
        for (key, fragment) in class.own_matches(kind, name) {
            records.push(self.member_at(class, kind, key, fragment)?);
        }
        Ok(records)
    }

    /// Inherited matches resolve through the defining ancestor's own table.
    fn inherited_members_named(
        &self,
        class: &Arc<ClassRecord>,
        kind: MemberKind,
        name: &str,
    ) -> Result<Vec<Arc<MemberRecord>>, Error> {
        let mut records = Vec::new();
        for (member_name, ancestor_location) in class.inherited_matches(kind, name) {
            let Some(ancestor) = self.class_if_wellformed(ancestor_location)? else {
                continue;
            };
            records.extend(self.own_members_named(
                &ancestor,
                kind,
                bare_member_name(member_name),
            )?);
        }
        Ok(records)
    }

    /// The memoized record for a member fragment.
    fn member_at(
        &self,
        class: &ClassRecord,
        kind: MemberKind,
        key: &str,
        fragment: &str,
    ) -> Result<Arc<MemberRecord>, Error> {
        let location = format!("{}#{}", class.location, fragment);
        if let Some(found) = self.members.get(&location) {
            return Ok(found);
        }

        let raw = self.fetcher.fetch_member_fragment(&location)?;
        let name = bare_member_name(key).to_string();
        let signature = (kind == MemberKind::Method).then(|| key.to_string());
        let record = Arc::new(MemberRecord::from_raw(&location, name, kind, signature, raw));
        self.members.put(&location, record.clone());
        Ok(self.members.get(&location).unwrap_or(record))
    }

    /// One opportunistic reinterpretation of the query tail as
    /// `<intermediate-nested-class>.<member>`, for patterns like
    /// `Outer.Inner.field` where `Inner` was not visible as a catalog
    /// anchor. Failures are swallowed; this only ever adds results.
    fn reinterpret_tail(&self, class: &Arc<ClassRecord>, query: &Query) -> Vec<Entry> {
        let Some(member) = query.segments.last() else {
            return Vec::new();
        };
        let bare = name_key(class.bare_name());
        let Some(tail) = after_first(&query.text, &bare) else {
            return Vec::new();
        };
        let Some((intermediate, rest)) = tail.trim_start_matches('.').split_once('.') else {
            return Vec::new();
        };
        if intermediate.is_empty() || rest.is_empty() {
            return Vec::new();
        }

        let Some(nested) = self.nested_class(class, intermediate).ok().flatten() else {
            return Vec::new();
        };
        self.search_members(&nested, member).unwrap_or_default()
    }
}
