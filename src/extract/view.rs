use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Attribute the live snapshot stamps on every `div` with its rendered height in px.
pub const RENDER_HEIGHT_ATTR: &str = "data-render-height";

const BLOCK_TAGS: &[&str] = &[
    "div", "p", "li", "ul", "ol", "tr", "table", "section", "article", "header", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "dl", "dt", "dd", "form",
];

const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// A parsed snapshot of the rendered results page. Strategies only read it.
pub struct ResultsView {
    html: Html,
}

impl ResultsView {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> scraper::html::Select<'a, 'b> {
        self.html.select(selector)
    }

    /// Every visible-content element in document order.
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| !is_skipped(*el))
    }

    /// Smallest elements whose collapsed text satisfies `matches`: an element
    /// qualifies when it matches and none of its child elements does.
    pub fn smallest_matching<F>(&self, matches: F) -> Vec<ElementRef<'_>>
    where
        F: Fn(&str) -> bool,
    {
        self.elements()
            .filter(|el| matches(&collapsed_text(*el)))
            .filter(|el| {
                !el.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| !is_skipped(*c))
                    .any(|c| matches(&collapsed_text(c)))
            })
            .collect()
    }
}

pub fn is_skipped(el: ElementRef<'_>) -> bool {
    SKIPPED_TAGS.contains(&el.value().name())
        || el.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED_TAGS.contains(&e.name()))
        })
}

/// Rendered-ish text: block elements on their own lines, inline runs joined
/// without separators (so `<span>¥</span><em>720</em>` reads "¥720").
pub fn inner_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_text(el, &mut raw);
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                let name = element.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_text(child_el, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Text with every whitespace run collapsed to one space.
pub fn collapsed_text(el: ElementRef<'_>) -> String {
    inner_text(el).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Own text nodes only (not descendants'), collapsed.
pub fn own_text(el: ElementRef<'_>) -> String {
    el.children()
        .filter_map(|c| c.value().as_text().map(|t| t.to_string()))
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_height(el: ElementRef<'_>) -> Option<f64> {
    el.value().attr(RENDER_HEIGHT_ATTR)?.trim().parse().ok()
}

pub fn is_div(el: ElementRef<'_>) -> bool {
    el.value().name() == "div"
}

/// Nearest `div` that is the element itself or one of its ancestors.
pub fn enclosing_block(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if is_div(el) {
        return Some(el);
    }
    ancestor_block(el)
}

/// Nearest `div` strictly above the element.
pub fn ancestor_block(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.ancestors().filter_map(ElementRef::wrap).find(|a| is_div(*a))
}

pub fn depth(el: ElementRef<'_>) -> usize {
    el.ancestors().count()
}
