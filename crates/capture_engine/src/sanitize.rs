use ego_tree::NodeRef;
use scraper::node::{Element, Node};
use scraper::Html;

/// Appended when a snapshot is cut at the size ceiling.
pub const TRUNCATION_MARKER: &str = "<!--snapshot truncated-->";

/// Tags removed wholesale, subtree included: scripting, styling, metadata,
/// embedded media, form inputs, and images carry no extractable text.
const DROPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "link", "meta", "base", "title", "iframe",
    "frame", "frameset", "object", "embed", "applet", "param", "svg", "canvas", "video", "audio",
    "source", "track", "picture", "map", "area", "img", "input", "select", "textarea", "option",
    "optgroup", "datalist",
];

/// Void tags kept as structural separators.
const VOID_TAGS: &[&str] = &["br", "hr", "wbr"];

/// Attribute allow-list. Broader than the surviving tag set on purpose; the
/// tag policy and the attribute policy stay independent.
const ALLOWED_ATTRS: &[&str] = &[
    "id",
    "class",
    "href",
    "src",
    "alt",
    "title",
    "role",
    "aria-label",
    "name",
    "value",
    "type",
    "placeholder",
];

#[derive(Debug, Clone)]
pub struct SanitizeSettings {
    /// Ceiling for the sanitized output, in bytes.
    pub max_bytes: usize,
    /// Class lists longer than this are collapsed to meaningful names only.
    pub max_classes: usize,
    /// Direct text up to this many chars counts as negligible for wrapper
    /// collapsing.
    pub wrapper_text_threshold: usize,
}

impl Default for SanitizeSettings {
    fn default() -> Self {
        Self {
            max_bytes: 50_000,
            max_classes: 4,
            wrapper_text_threshold: 3,
        }
    }
}

/// Reduces a serialized document to its content skeleton: drops non-content
/// nodes, strips attributes to the allow-list, collapses generated class
/// names, empty leaves, wrapper chains, and whitespace, then enforces the
/// size ceiling at a tag boundary.
pub fn sanitize_html(html: &str, settings: &SanitizeSettings) -> String {
    let doc = Html::parse_document(html);
    let mut out = String::new();
    for child in doc.tree.root().children() {
        if matches!(child.value(), Node::Element(_)) {
            if let Some(rendered) = render_element(child, settings) {
                out.push_str(&rendered);
            }
        }
    }
    truncate_at_tag_boundary(out, settings.max_bytes)
}

fn render_element(node: NodeRef<'_, Node>, settings: &SanitizeSettings) -> Option<String> {
    let element = match node.value() {
        Node::Element(element) => element,
        _ => return None,
    };
    let tag = element.name();
    if DROPPED_TAGS.contains(&tag) {
        return None;
    }
    if VOID_TAGS.contains(&tag) {
        return Some(format!("<{tag}>"));
    }

    let attrs = filter_attrs(element, settings);

    let mut children_html = String::new();
    let mut own_text_len = 0usize;
    let mut element_children = 0usize;
    let mut only_child: Option<String> = None;

    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                let collapsed = collapse_whitespace(text);
                let trimmed = collapsed.trim();
                if !trimmed.is_empty() {
                    own_text_len += trimmed.len();
                    if !children_html.is_empty() && !children_html.ends_with(' ') {
                        children_html.push(' ');
                    }
                    children_html.push_str(&escape_text(trimmed));
                }
            }
            Node::Element(_) => {
                if let Some(rendered) = render_element(child, settings) {
                    element_children += 1;
                    only_child = Some(rendered.clone());
                    children_html.push_str(&rendered);
                }
            }
            // Comments, doctypes, and processing instructions are dropped.
            _ => {}
        }
    }

    // Wrapper collapse: a container contributing nothing of its own folds
    // into its single child.
    if element_children == 1
        && own_text_len <= settings.wrapper_text_threshold
        && attrs.is_empty()
    {
        return only_child;
    }

    // Empty leaf with nothing identifying it: drop.
    if children_html.trim().is_empty() && attrs.is_empty() {
        return None;
    }

    let mut out = String::new();
    out.push('<');
    out.push_str(tag);
    for (name, value) in &attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    out.push('>');
    out.push_str(&children_html);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
    Some(out)
}

fn filter_attrs(element: &Element, settings: &SanitizeSettings) -> Vec<(String, String)> {
    let mut kept = Vec::new();
    for (name, value) in element.attrs() {
        let lowered = name.to_ascii_lowercase();
        if lowered == "class" {
            if let Some(collapsed) = collapse_class_list(value, settings.max_classes) {
                kept.push(("class".to_string(), collapsed));
            }
        } else if ALLOWED_ATTRS.contains(&lowered.as_str()) || lowered.starts_with("data-test") {
            kept.push((lowered, value.to_string()));
        }
    }
    kept.sort_by(|a, b| a.0.cmp(&b.0));
    kept
}

/// Class lists longer than the threshold keep only a bounded set of
/// meaningful names; short lists pass through untouched.
fn collapse_class_list(value: &str, max_classes: usize) -> Option<String> {
    let classes: Vec<&str> = value.split_whitespace().collect();
    if classes.is_empty() {
        return None;
    }
    if classes.len() <= max_classes {
        return Some(classes.join(" "));
    }
    let meaningful: Vec<&str> = classes
        .iter()
        .copied()
        .filter(|class| !is_generated_class(class))
        .take(max_classes)
        .collect();
    if meaningful.is_empty() {
        None
    } else {
        Some(meaningful.join(" "))
    }
}

/// Heuristic for hash-like or build-tool-generated class names.
fn is_generated_class(class: &str) -> bool {
    const GENERATED_PREFIXES: &[&str] =
        &["css-", "sc-", "jsx-", "svelte-", "chakra-", "emotion-"];
    let lowered = class.to_ascii_lowercase();
    if lowered.starts_with('_') || GENERATED_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return true;
    }
    let digits = lowered.chars().filter(char::is_ascii_digit).count();
    if digits >= 3 && class.len() >= 8 {
        return true;
    }
    digits >= 1 && class.len() >= 6 && lowered.chars().all(|c| c.is_ascii_hexdigit())
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn truncate_at_tag_boundary(html: String, max_bytes: usize) -> String {
    if html.len() <= max_bytes {
        return html;
    }
    // '>' is ASCII, so the cut lands on a char boundary.
    let boundary = html[..max_bytes].rfind('>').map(|idx| idx + 1).unwrap_or(0);
    let mut out = html[..boundary].to_string();
    out.push_str(TRUNCATION_MARKER);
    out
}
