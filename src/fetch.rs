//! The page-fetch/parse collaborator boundary.
//!
//! The resolver depends only on this narrow contract: a catalog of
//! `(location, declared_name)` pairs, class pages pre-split into named
//! regions, and member fragments. How those regions are located in markup is
//! collaborator-private.

mod http;

pub use http::{FetchConfig, HttpFetcher};

use crate::catalog::CatalogEntry;
use crate::entity::DetailTag;
use crate::error::Error;

/// A class-like page, parsed into the regions the resolver consumes.
///
/// Own regions map member name → location fragment on the page itself
/// (nested classes map to the nested page's full location). Inherited
/// regions map member name → the defining ancestor's location. All regions
/// preserve page order.
#[derive(Debug, Clone, Default)]
pub struct RawClassPage {
    /// Page title text, e.g. `Class String`
    pub title: String,
    /// Plain description text
    pub description: String,
    /// Raw description markup
    pub raw_description: String,
    /// Labeled detail blocks under the description
    pub extra_info: Vec<DetailTag>,

    /// Own nested classes: name → location
    pub nested_classes: Vec<(String, String)>,
    /// Own methods: signature key → fragment anchor
    pub methods: Vec<(String, String)>,
    /// Own enum constants: name → fragment anchor
    pub enum_constants: Vec<(String, String)>,
    /// Own fields: name → fragment anchor
    pub fields: Vec<(String, String)>,

    /// Inherited nested classes: name → ancestor location
    pub inherited_nested_classes: Vec<(String, String)>,
    /// Inherited methods: name → ancestor location
    pub inherited_methods: Vec<(String, String)>,
    /// Inherited enum constants: name → ancestor location
    pub inherited_enum_constants: Vec<(String, String)>,
    /// Inherited fields: name → ancestor location
    pub inherited_fields: Vec<(String, String)>,
}

/// One member's detail fragment: description and labeled tag blocks.
#[derive(Debug, Clone, Default)]
pub struct RawMemberFragment {
    /// Plain description text
    pub description: String,
    /// Raw description markup
    pub raw_description: String,
    /// Labeled detail blocks ("Parameters:", "Returns:", ...)
    pub extra_info: Vec<DetailTag>,
}

/// The fetch/parse collaborator the resolver is built on.
///
/// Implementations retry transient failures themselves and surface
/// [`Error::Fetch`] only after exhausting their budget. The crate ships
/// [`HttpFetcher`]; tests supply in-memory fakes.
pub trait DocFetcher {
    /// Discover every class-like page reachable from the root location.
    ///
    /// Declared names for nested classes are dot-qualified relative to
    /// their enclosing class.
    fn build_catalog(&self, root: &str) -> Result<Vec<CatalogEntry>, Error>;

    /// Fetch and parse one class page.
    fn fetch_class_page(&self, location: &str) -> Result<RawClassPage, Error>;

    /// Fetch and parse one member fragment (`page#anchor` location).
    fn fetch_member_fragment(&self, location: &str) -> Result<RawMemberFragment, Error>;
}
