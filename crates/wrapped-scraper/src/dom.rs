//! Capability layer between extraction logic and a concrete DOM.
//!
//! Extraction only needs three things from a card: its text, the first
//! descendant matching a selector, and whether any descendant matches. That
//! is [`CardLike`]. The `scraper`-backed implementation lives here; tests
//! implement the trait directly to exercise failure paths.
//!
//! Text approximates `innerText`: text nodes under different block-level
//! elements (or split by `<br>`) are separated by a space, inline runs are
//! joined as-is, and whitespace runs collapse to a single space. When an element renders no text at all, the contents of its
//! HTML comments are used instead: some dashboards hydrate numbers into
//! comment placeholders (`<p><!---->1,234<!----></p>` or `<p><!-- 1,234 --></p>`).

use scraper::node::Node;
use scraper::{ElementRef, Selector};

use crate::error::DomError;

/// Owned snapshot of one matched element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementView {
    pub text: String,
    pub attrs: Vec<(String, String)>,
    /// The element or one of its ancestors is hidden from rendering.
    pub hidden: bool,
}

impl ElementView {
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A card-like DOM subtree.
pub trait CardLike {
    /// Whitespace-collapsed text of the whole subtree.
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] when the subtree cannot be read.
    fn text(&self) -> Result<String, DomError>;

    /// First descendant matching `selector`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Selector`] for an unparseable selector.
    fn first_match(&self, selector: &str) -> Result<Option<ElementView>, DomError>;

    /// Whether any descendant matches `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::Selector`] for an unparseable selector.
    fn has_match(&self, selector: &str) -> Result<bool, DomError> {
        Ok(self.first_match(selector)?.is_some())
    }
}

impl CardLike for ElementRef<'_> {
    fn text(&self) -> Result<String, DomError> {
        Ok(rendered_text(*self))
    }

    fn first_match(&self, selector: &str) -> Result<Option<ElementView>, DomError> {
        let selector = compile(selector)?;
        Ok(self.select(&selector).next().map(view_of))
    }

    fn has_match(&self, selector: &str) -> Result<bool, DomError> {
        let selector = compile(selector)?;
        Ok(self.select(&selector).next().is_some())
    }
}

/// Parses a CSS selector.
///
/// # Errors
///
/// Returns [`DomError::Selector`] when `selector` is not valid CSS.
pub fn compile(selector: &str) -> Result<Selector, DomError> {
    Selector::parse(selector).map_err(|e| DomError::Selector {
        selector: selector.to_owned(),
        reason: e.to_string(),
    })
}

/// Builds the owned view of `el`.
#[must_use]
pub fn view_of(el: ElementRef<'_>) -> ElementView {
    let mut text = rendered_text(el);
    if text.is_empty() {
        text = comment_text(el);
    }
    ElementView {
        text,
        attrs: el
            .value()
            .attrs()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect(),
        hidden: is_hidden(el),
    }
}

/// Rendered text of `el` with whitespace collapsed and trimmed.
///
/// `<p>2025</p><span>1,234 impressions</span>` reads as
/// `"2025 1,234 impressions"`, while `1,<b>234</b>` stays `"1,234"`.
#[must_use]
pub fn rendered_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    let mut current_block = None;
    let mut pending_break = false;
    for node in el.descendants() {
        match node.value() {
            Node::Element(element) if element.name() == "br" => pending_break = true,
            Node::Text(text) => {
                let block = node
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|ancestor| ancestor.id() == el.id() || is_block(ancestor.value().name()))
                    .map(|ancestor| ancestor.id());
                if !out.is_empty() && (pending_break || block != current_block) {
                    out.push(' ');
                }
                let inner: &str = text;
                out.push_str(inner);
                current_block = block;
                pending_break = false;
            }
            _ => {}
        }
    }
    collapse_whitespace(&out)
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "dd"
            | "div"
            | "dl"
            | "dt"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "td"
            | "th"
            | "tr"
            | "ul"
    )
}

/// Nearest element at or above `el` matching `selector`.
#[must_use]
pub fn closest<'a>(el: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    if selector.matches(&el) {
        return Some(el);
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| selector.matches(ancestor))
}

fn comment_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        if let Node::Comment(comment) = node.value() {
            let inner: &str = comment;
            out.push_str(inner);
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Approximates "not rendered": a `hidden` attribute, `aria-hidden="true"`,
/// or an inline `display:none` / `visibility:hidden` on the element or any
/// ancestor.
fn is_hidden(el: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .any(|node| {
            let value = node.value();
            if value.attr("hidden").is_some() {
                return true;
            }
            if value
                .attr("aria-hidden")
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
            {
                return true;
            }
            value.attr("style").is_some_and(|style| {
                let compact: String = style
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_lowercase();
                compact.contains("display:none") || compact.contains("visibility:hidden")
            })
        })
}
