use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Node};

lazy_static! {
    static ref IMG_SRC: Option<Regex> = Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).ok();
}

/// Plain text of an HTML fragment with `script` and `style` bodies removed,
/// entities decoded and the result trimmed.
pub fn sanitize(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    for node in fragment.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| matches!(el.name(), "script" | "style"))
        });
        if !hidden {
            out.push_str(text);
        }
    }
    out.trim().to_string()
}

/// First `<img src>` found in raw HTML.
pub fn first_image(html: &str) -> Option<String> {
    IMG_SRC
        .as_ref()?
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
