//! HTTP implementation of the fetch collaborator.
//!
//! Markup knowledge lives here and nowhere else: catalog anchors on
//! "all classes" index pages, the detail and inherited-summary regions of
//! class pages, and member fragments. The resolver only ever sees the parsed
//! region lists.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::catalog::CatalogEntry;
use crate::entity::DetailTag;
use crate::error::Error;
use crate::fetch::{DocFetcher, RawClassPage, RawMemberFragment};
use crate::store::MemoStore;

static HIDDEN_CHAR_RE: OnceLock<Regex> = OnceLock::new();
static ANNOTATION_RE: OnceLock<Regex> = OnceLock::new();
static METHOD_NAME_RE: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

fn hidden_char_re() -> &'static Regex {
    HIDDEN_CHAR_RE.get_or_init(|| Regex::new(r"\p{C}").unwrap())
}

fn annotation_re() -> &'static Regex {
    ANNOTATION_RE.get_or_init(|| Regex::new(r"@\w+\s+").unwrap())
}

fn method_name_re() -> &'static Regex {
    METHOD_NAME_RE.get_or_init(|| Regex::new(r"\w+\s?\(.*\)").unwrap())
}

fn whitespace_re() -> &'static Regex {
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn sel(selector: &str) -> Selector {
    Selector::parse(selector).unwrap()
}

/// Selector for an `a` element with the given `id` or `name` attribute.
///
/// Anchor values come from page content, so an unparsable selector maps to
/// "no such anchor" instead of a panic.
fn anchor_sel(id: &str) -> Option<Selector> {
    Selector::parse(&format!("a[id=\"{id}\"], a[name=\"{id}\"]")).ok()
}

/// Transport knobs for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Attempts per page before giving up
    pub max_retries: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(250),
            timeout: Duration::from_secs(10),
            user_agent: format!("javadoc-parser/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Blocking HTTP fetcher with per-page retries and page-level memoization.
///
/// Each page is fetched at most once per session; member fragments reuse the
/// cached page text of the class they live on.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    config: FetchConfig,
    pages: MemoStore<String>,
}

impl HttpFetcher {
    /// Create a fetcher with default configuration.
    pub fn new() -> Result<Self, Error> {
        Self::with_config(FetchConfig::default())
    }

    /// Create a fetcher with explicit configuration.
    pub fn with_config(config: FetchConfig) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(Error::ClientInit)?;

        Ok(Self {
            client,
            config,
            pages: MemoStore::new(),
        })
    }

    fn document(&self, location: &str) -> Result<String, Error> {
        if let Some(html) = self.pages.get(location) {
            debug!("page cache hit for `{}`", location);
            return Ok(html);
        }

        let mut last_err: Option<anyhow::Error> = None;
        for attempt in 1..=self.config.max_retries {
            match self.try_fetch(location) {
                Ok(body) => {
                    self.pages.put(location, body.clone());
                    return Ok(body);
                }
                Err(err) => {
                    warn!(
                        "fetch attempt {}/{} for `{}` failed: {}",
                        attempt, self.config.max_retries, location, err
                    );
                    last_err = Some(err);
                    if attempt < self.config.max_retries {
                        std::thread::sleep(self.config.retry_delay);
                    }
                }
            }
        }

        Err(Error::Fetch {
            location: location.to_string(),
            attempts: self.config.max_retries,
            source: last_err.unwrap_or_else(|| anyhow::anyhow!("retry budget is zero")),
        })
    }

    fn try_fetch(&self, location: &str) -> Result<String, anyhow::Error> {
        let response = self.client.get(location).send()?.error_for_status()?;
        Ok(response.text()?)
    }
}

impl DocFetcher for HttpFetcher {
    fn build_catalog(&self, root: &str) -> Result<Vec<CatalogEntry>, Error> {
        let html = self.document(root)?;
        let entries = parse_catalog(&html, root)?;
        debug!("catalog built: {} entries from `{}`", entries.len(), root);
        Ok(entries)
    }

    fn fetch_class_page(&self, location: &str) -> Result<RawClassPage, Error> {
        let html = self.document(location)?;
        parse_class_page(&html, location)
    }

    fn fetch_member_fragment(&self, location: &str) -> Result<RawMemberFragment, Error> {
        let (page, anchor) = location
            .split_once('#')
            .ok_or_else(|| Error::malformed(location, "member location has no fragment anchor"))?;
        let html = self.document(page)?;
        parse_member_fragment(&html, page, anchor)
    }
}

/// Extract catalog entries from an "all classes" index page.
///
/// Frame-style indexes list plain anchors; tree pages use `li.circle` items.
/// The declared name comes from the anchor text, falling back to the target
/// filename, so nested classes keep their dot-qualified names. Anchors whose
/// hrefs cannot be resolved are skipped, not fatal.
pub(crate) fn parse_catalog(html: &str, root: &str) -> Result<Vec<CatalogEntry>, Error> {
    let doc = Html::parse_document(html);
    let mut entries = Vec::new();

    let anchors: Vec<ElementRef> = if root.contains("allclasses") {
        doc.select(&sel("a")).collect()
    } else {
        doc.select(&sel("li.circle"))
            .filter_map(|li| li.select(&sel("a")).next())
            .collect()
    };

    for anchor in anchors {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.ends_with(".html") {
            continue;
        }

        let location = match resolve_href(root, href) {
            Ok(location) => location,
            Err(err) => {
                debug!("skipping catalog anchor `{}`: {}", href, err);
                continue;
            }
        };
        let text = clean_text(anchor);
        let declared_name = if text.is_empty() {
            filename_stem(&location)
        } else {
            text
        };

        entries.push(CatalogEntry::new(location, declared_name));
    }

    Ok(entries)
}

/// Parse one class page into the regions the resolver consumes.
pub(crate) fn parse_class_page(html: &str, location: &str) -> Result<RawClassPage, Error> {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&sel("h2"))
        .next()
        .or_else(|| doc.select(&sel("h1")).next())
        .map(clean_text)
        .unwrap_or_default();

    let bare_name = title
        .split_whitespace()
        .last()
        .map(|name| name.split('<').next().unwrap_or(name).to_string())
        .unwrap_or_default();

    let description_block = doc.select(&sel("div.description div.block")).next();
    let description = description_block.map(clean_text).unwrap_or_default();
    let raw_description = description_block
        .map(|el| el.inner_html().trim().to_string())
        .unwrap_or_default();

    let extra_info = doc
        .select(&sel("div.description"))
        .next()
        .map(parse_detail_tags)
        .unwrap_or_default();

    Ok(RawClassPage {
        nested_classes: parse_nested_table(&doc, location, &bare_name)?,
        methods: parse_detail_region(&doc, location, "method.detail", true)?,
        enum_constants: parse_detail_region(&doc, location, "enum.constant.detail", false)?,
        fields: parse_detail_region(&doc, location, "field.detail", false)?,
        inherited_nested_classes: parse_inherited_region(&doc, location, "nested.class.summary")?,
        inherited_methods: parse_inherited_region(&doc, location, "method.summary")?,
        inherited_enum_constants: parse_inherited_region(
            &doc,
            location,
            "enum.constant.summary",
        )?,
        inherited_fields: parse_inherited_region(&doc, location, "field.summary")?,
        title,
        description,
        raw_description,
        extra_info,
    })
}

/// Parse the fragment a member anchor points at.
pub(crate) fn parse_member_fragment(
    html: &str,
    page: &str,
    anchor: &str,
) -> Result<RawMemberFragment, Error> {
    let doc = Html::parse_document(html);

    let selector = anchor_sel(anchor)
        .ok_or_else(|| Error::malformed(page, format!("unusable member anchor `{anchor}`")))?;
    let anchor_el = doc.select(&selector).next().ok_or_else(|| {
        Error::malformed(page, format!("member anchor `{anchor}` not found"))
    })?;

    let block = next_element_sibling(anchor_el)
        .ok_or_else(|| Error::malformed(page, format!("member anchor `{anchor}` has no body")))?;
    let block = if block.value().name() == "ul" {
        block.select(&sel("li")).next().unwrap_or(block)
    } else {
        block
    };

    let description_block = block.select(&sel("div.block")).next();

    Ok(RawMemberFragment {
        description: description_block.map(clean_text).unwrap_or_default(),
        raw_description: description_block
            .map(|el| el.inner_html().trim().to_string())
            .unwrap_or_default(),
        extra_info: parse_detail_tags(block),
    })
}

/// The region element an `a[id=...]` summary/detail anchor belongs to.
fn section<'a>(doc: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    let selector = anchor_sel(id)?;
    doc.select(&selector).next().and_then(parent_element)
}

/// Own nested classes from the link table: name → nested page location.
fn parse_nested_table(
    doc: &Html,
    location: &str,
    bare_name: &str,
) -> Result<Vec<(String, String)>, Error> {
    let Some(region) = section(doc, "nested.class.summary") else {
        return Ok(Vec::new());
    };

    let mut found = Vec::new();
    for cell in region.select(&sel("tbody th.colSecond")) {
        if !cell
            .value()
            .attr("scope")
            .is_some_and(|scope| scope.eq_ignore_ascii_case("row"))
        {
            continue;
        }
        let Some(link) = cell.select(&sel("a")).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        let text = clean_text(cell);
        let prefix = format!("{bare_name}.");
        let name = text.strip_prefix(&prefix).unwrap_or(&text).to_string();

        found.push((name, resolve_href(location, href)?));
    }

    Ok(found)
}

/// One own detail region: member key → fragment anchor on this page.
///
/// Method keys keep their parameter text; enum constants and fields use the
/// last word of the signature.
fn parse_detail_region(
    doc: &Html,
    location: &str,
    id: &str,
    methods: bool,
) -> Result<Vec<(String, String)>, Error> {
    let Some(region) = section(doc, id) else {
        return Ok(Vec::new());
    };

    let mut found = Vec::new();
    for item in region.select(&sel("li.blockList")) {
        let Some(pre) = item.select(&sel("pre")).next() else {
            continue;
        };

        let signature = clean_text(pre);
        let key = if methods {
            method_key(&signature, location)?
        } else {
            signature
                .rsplit(' ')
                .next()
                .unwrap_or(signature.as_str())
                .to_string()
        };

        let Some(fragment) = fragment_anchor(item) else {
            debug!("no fragment anchor for `{}` on `{}`", key, location);
            continue;
        };

        found.push((key, fragment));
    }

    Ok(found)
}

/// One inherited summary region: member name → defining ancestor location.
fn parse_inherited_region(
    doc: &Html,
    location: &str,
    id: &str,
) -> Result<Vec<(String, String)>, Error> {
    let Some(region) = section(doc, id) else {
        return Ok(Vec::new());
    };

    let inherited_anchors: Vec<ElementRef> = region
        .select(&sel("a"))
        .filter(|a| {
            let attr = a.value().attr("id").or_else(|| a.value().attr("name"));
            attr.is_some_and(|v| v.to_lowercase().contains("inherited"))
        })
        .collect();

    let mut found = Vec::new();
    for anchor in inherited_anchors {
        let Some(block) = parent_element(anchor) else {
            continue;
        };
        let Some(ancestor_link) = block.select(&sel("h3 a")).next() else {
            continue;
        };
        let Some(href) = ancestor_link.value().attr("href") else {
            continue;
        };

        let ancestor = resolve_href(location, href)?;
        for member in block.select(&sel("code a")) {
            let name = clean_text(member);
            if !name.is_empty() {
                found.push((name, ancestor.clone()));
            }
        }
    }

    Ok(found)
}

/// Recover `name(params)` from a method signature.
fn method_key(signature: &str, location: &str) -> Result<String, Error> {
    let cleaned = hidden_char_re().replace_all(signature, " ");
    let cleaned = annotation_re().replace_all(&cleaned, "");
    let cleaned = whitespace_re().replace_all(&cleaned, " ");
    let cleaned = match cleaned.split_once("public") {
        Some((_, tail)) => tail.trim().to_string(),
        None => cleaned.trim().to_string(),
    };

    method_name_re()
        .find(&cleaned)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            Error::malformed(
                location,
                format!("failed to match method signature `{}`", signature.trim()),
            )
        })
}

/// The `<a id=...>` anchor immediately before a member's block list.
fn fragment_anchor(item: ElementRef) -> Option<String> {
    let list = parent_element(item)?;
    let anchor = prev_element_sibling(list)?;
    if anchor.value().name() != "a" {
        return None;
    }
    anchor
        .value()
        .attr("id")
        .or_else(|| anchor.value().attr("name"))
        .map(str::to_string)
}

/// Labeled `dl`/`dt`/`dd` blocks under `scope`, in page order.
fn parse_detail_tags(scope: ElementRef) -> Vec<DetailTag> {
    let mut tags = Vec::new();

    for dl in scope.select(&sel("dl")) {
        let mut label: Option<String> = None;
        let mut text = String::new();
        let mut html = String::new();

        let mut flush = |label: &mut Option<String>, text: &mut String, html: &mut String| {
            if let Some(label) = label.take() {
                tags.push(DetailTag::new(label, text.trim(), html.trim()));
            }
            text.clear();
            html.clear();
        };

        for child in dl.children().filter_map(ElementRef::wrap) {
            match child.value().name() {
                "dt" => {
                    flush(&mut label, &mut text, &mut html);
                    label = Some(clean_text(child));
                }
                "dd" => {
                    text.push_str(&clean_text(child));
                    text.push('\n');
                    html.push_str(child.inner_html().trim());
                    html.push('\n');
                }
                _ => {}
            }
        }
        flush(&mut label, &mut text, &mut html);
    }

    tags
}

fn parent_element(el: ElementRef) -> Option<ElementRef> {
    el.parent().and_then(ElementRef::wrap)
}

fn next_element_sibling(el: ElementRef) -> Option<ElementRef> {
    el.next_siblings().find_map(ElementRef::wrap)
}

fn prev_element_sibling(el: ElementRef) -> Option<ElementRef> {
    el.prev_siblings().find_map(ElementRef::wrap)
}

/// Element text with whitespace (including non-breaking spaces) collapsed.
fn clean_text(el: ElementRef) -> String {
    let text: String = el.text().collect();
    let text = text.replace('\u{a0}', " ");
    whitespace_re().replace_all(&text, " ").trim().to_string()
}

fn resolve_href(base: &str, href: &str) -> Result<String, Error> {
    let base = Url::parse(base)
        .map_err(|e| Error::malformed(base, format!("unparsable page location: {e}")))?;
    let resolved = base
        .join(href)
        .map_err(|e| Error::malformed(base.as_str(), format!("unresolvable href `{href}`: {e}")))?;
    Ok(resolved.to_string())
}

fn filename_stem(location: &str) -> String {
    location
        .rsplit('/')
        .next()
        .unwrap_or(location)
        .trim_end_matches(".html")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "https://docs.example.com/api/allclasses-noframe.html";
    const PAGE: &str = "https://docs.example.com/api/ArrayList.html";

    const CATALOG_HTML: &str = r#"
        <html><body><main>
        <ul>
        <li><a href="ArrayList.html" title="class in java.util">ArrayList</a></li>
        <li><a href="Map.Entry.html" title="interface in java.util">Map.Entry</a></li>
        <li><a href="../java/lang/String.html">String</a></li>
        <li><a href="https://elsewhere.example.com/外部">elsewhere</a></li>
        </ul>
        </main></body></html>
    "#;

    const CLASS_HTML: &str = r#"
        <html><body>
        <h2 title="Class ArrayList" class="title">Class ArrayList&lt;E&gt;</h2>
        <div class="description">
        <div class="block">Resizable-array implementation of the List interface.</div>
        <dl><dt>Since:</dt><dd>1.2</dd></dl>
        </div>
        <div class="summary">
        <ul class="blockList">
        <li class="blockList">
        <a id="nested.class.summary"></a>
        <h3>Nested Class Summary</h3>
        <table>
        <tbody>
        <tr>
        <th class="colSecond" scope="row"><a href="ArrayList.Itr.html">ArrayList.Itr</a></th>
        </tr>
        </tbody>
        </table>
        <ul class="blockList">
        <li class="blockList">
        <a id="nested.classes.inherited.from.class.java.util.AbstractList"></a>
        <h3>Nested classes inherited from class <a href="AbstractList.html">AbstractList</a></h3>
        <code><a href="AbstractList.html#nested">AbstractList.SubList</a></code>
        </li>
        </ul>
        </li>
        <li class="blockList">
        <a id="method.summary"></a>
        <h3>Method Summary</h3>
        <ul class="blockList">
        <li class="blockList">
        <a id="methods.inherited.from.class.java.lang.Object"></a>
        <h3>Methods inherited from class java.lang.<a href="Object.html">Object</a></h3>
        <code><a href="Object.html#toString--">toString</a>, <a href="Object.html#wait--">wait</a></code>
        </li>
        </ul>
        </li>
        <li class="blockList">
        <a id="field.summary"></a>
        <h3>Field Summary</h3>
        <ul class="blockList">
        <li class="blockList">
        <a id="fields.inherited.from.class.java.util.AbstractList"></a>
        <h3>Fields inherited from class <a href="AbstractList.html">AbstractList</a></h3>
        <code><a href="AbstractList.html#modCount">modCount</a></code>
        </li>
        </ul>
        </li>
        </ul>
        </div>
        <div class="details">
        <ul class="blockList">
        <li class="blockList">
        <a id="method.detail"></a>
        <h3>Method Detail</h3>
        <a id="indexOf-java.lang.Object-"></a>
        <ul class="blockList">
        <li class="blockList">
        <h4>indexOf</h4>
        <pre>public&nbsp;int&nbsp;indexOf(Object&nbsp;o)</pre>
        <div class="block">Returns the index of the first occurrence.</div>
        </li>
        </ul>
        <a id="indexOf-java.lang.Object-int-"></a>
        <ul class="blockList">
        <li class="blockList">
        <h4>indexOf</h4>
        <pre>public&nbsp;int&nbsp;indexOf(Object&nbsp;o, int&nbsp;fromIndex)</pre>
        </li>
        </ul>
        </li>
        <li class="blockList">
        <a id="field.detail"></a>
        <h3>Field Detail</h3>
        <a id="size"></a>
        <ul class="blockList">
        <li class="blockList">
        <h4>size</h4>
        <pre>protected&nbsp;int&nbsp;size</pre>
        <div class="block">The number of elements.</div>
        <dl><dt>Since:</dt><dd>1.2</dd><dd>replaces elementCount</dd></dl>
        </li>
        </ul>
        </li>
        </ul>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_catalog_allclasses_page() {
        let entries = parse_catalog(CATALOG_HTML, ROOT).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].declared_name, "ArrayList");
        assert_eq!(
            entries[0].location,
            "https://docs.example.com/api/ArrayList.html"
        );
        // Nested classes keep their dot-qualified declared name
        assert_eq!(entries[1].declared_name, "Map.Entry");
        // Relative traversal resolves against the index location
        assert_eq!(
            entries[2].location,
            "https://docs.example.com/java/lang/String.html"
        );
    }

    #[test]
    fn test_parse_catalog_circle_tree_page() {
        let html = r#"
            <ul>
            <li class="circle">java.lang.<a href="String.html"><span>String</span></a></li>
            <li>not a class entry</li>
            </ul>
        "#;
        let entries =
            parse_catalog(html, "https://docs.example.com/api/overview-tree.html").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].declared_name, "String");
    }

    #[test]
    fn test_parse_catalog_skips_unresolvable_href() {
        let html = r#"
            <ul>
            <li><a href="http://[bad/Thing.html">Thing</a></li>
            <li><a href="Good.html">Good</a></li>
            </ul>
        "#;
        let entries = parse_catalog(html, ROOT).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].declared_name, "Good");
    }

    #[test]
    fn test_parse_class_page_title_and_description() {
        let page = parse_class_page(CLASS_HTML, PAGE).unwrap();
        assert_eq!(page.title, "Class ArrayList<E>");
        assert_eq!(
            page.description,
            "Resizable-array implementation of the List interface."
        );
        assert_eq!(page.extra_info.len(), 1);
        assert_eq!(page.extra_info[0].label, "Since:");
        assert_eq!(page.extra_info[0].text, "1.2");
    }

    #[test]
    fn test_parse_class_page_own_regions() {
        let page = parse_class_page(CLASS_HTML, PAGE).unwrap();

        assert_eq!(
            page.nested_classes,
            vec![(
                "Itr".to_string(),
                "https://docs.example.com/api/ArrayList.Itr.html".to_string()
            )]
        );

        let methods: Vec<&str> = page.methods.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            methods,
            vec!["indexOf(Object o)", "indexOf(Object o, int fromIndex)"]
        );
        assert_eq!(page.methods[0].1, "indexOf-java.lang.Object-");

        assert_eq!(page.fields, vec![("size".to_string(), "size".to_string())]);
        assert!(page.enum_constants.is_empty());
    }

    #[test]
    fn test_parse_class_page_inherited_regions() {
        let page = parse_class_page(CLASS_HTML, PAGE).unwrap();

        let methods: Vec<(&str, &str)> = page
            .inherited_methods
            .iter()
            .map(|(n, a)| (n.as_str(), a.as_str()))
            .collect();
        assert_eq!(
            methods,
            vec![
                ("toString", "https://docs.example.com/api/Object.html"),
                ("wait", "https://docs.example.com/api/Object.html"),
            ]
        );

        assert_eq!(
            page.inherited_fields,
            vec![(
                "modCount".to_string(),
                "https://docs.example.com/api/AbstractList.html".to_string()
            )]
        );

        assert_eq!(
            page.inherited_nested_classes,
            vec![(
                "AbstractList.SubList".to_string(),
                "https://docs.example.com/api/AbstractList.html".to_string()
            )]
        );
    }

    #[test]
    fn test_parse_member_fragment() {
        let fragment = parse_member_fragment(CLASS_HTML, PAGE, "size").unwrap();
        assert_eq!(fragment.description, "The number of elements.");
        assert_eq!(fragment.extra_info.len(), 1);
        assert_eq!(fragment.extra_info[0].label, "Since:");
        // Consecutive dd blocks merge under one label
        assert_eq!(fragment.extra_info[0].text, "1.2\nreplaces elementCount");
    }

    #[test]
    fn test_parse_member_fragment_unknown_anchor() {
        let err = parse_member_fragment(CLASS_HTML, PAGE, "missing--").unwrap_err();
        assert!(matches!(err, Error::MalformedPage { .. }));
    }

    #[test]
    fn test_method_key_strips_annotations_and_qualifiers() {
        assert_eq!(
            method_key("@Override public final int indexOf(Object o)", PAGE).unwrap(),
            "indexOf(Object o)"
        );
        assert_eq!(
            method_key("protected Object clone()", PAGE).unwrap(),
            "clone()"
        );
    }

    #[test]
    fn test_method_key_rejects_garbage() {
        let err = method_key("not a signature", PAGE).unwrap_err();
        assert!(matches!(err, Error::MalformedPage { .. }));
    }
}
