//! Small DOM helpers shared by the page extractors.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never reaches the rendered page.
const HIDDEN_TEXT_PARENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Trimmed, non-empty value of `attr` on the first element matching `selector`.
pub(crate) fn first_attr(doc: &Html, selector: &Selector, attr: &str) -> Option<String> {
    doc.select(selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Text of the first element matching `selector` that has any.
pub(crate) fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty())
}

/// All text nodes under `el`, trimmed and joined by single spaces.
pub(crate) fn element_text(el: &ElementRef<'_>) -> String {
    text_lines(el).join(" ")
}

/// Trimmed, non-empty text nodes under `el`, in document order.
pub(crate) fn text_lines<'a>(el: &ElementRef<'a>) -> Vec<&'a str> {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect()
}

/// Rendered text nodes of the whole document, skipping script/style content.
pub(crate) fn visible_text(doc: &Html) -> Vec<&str> {
    doc.root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|e| e.name()))
                .is_some_and(|name| HIDDEN_TEXT_PARENTS.contains(&name));
            if hidden { None } else { Some(&**text) }
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Every `a[href]` resolved against `base`, in document order.
///
/// Hrefs that cannot be resolved are skipped.
pub(crate) fn absolute_links(doc: &Html, base: &Url) -> Vec<String> {
    static ANCHOR: std::sync::LazyLock<Selector> =
        std::sync::LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));

    doc.select(&ANCHOR)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(String::from)
        .collect()
}

/// Hosts that serve app listings rather than company sites.
pub(crate) fn is_app_store_host(host: &str) -> bool {
    host.contains("apps.apple.com") || host == "play.google.com"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_text_skips_scripts() {
        let doc = Html::parse_document(
            "<html><head><script>var hidden = 1;</script><style>p{}</style></head>\
             <body><p> Hello </p><p>World</p></body></html>",
        );
        assert_eq!(visible_text(&doc), vec!["Hello", "World"]);
    }

    #[test]
    fn absolute_links_resolves_relative_hrefs() {
        let doc = Html::parse_document(
            r#"<a href="/about">About</a><a href="https://other.com/x">X</a><a>none</a>"#,
        );
        let base = Url::parse("https://example.com/home").unwrap();
        assert_eq!(
            absolute_links(&doc, &base),
            vec![
                "https://example.com/about".to_string(),
                "https://other.com/x".to_string()
            ]
        );
    }

    #[test]
    fn first_attr_skips_blank_values() {
        let doc = Html::parse_document(
            r#"<meta name="a" content="  "><meta name="a" content=" value ">"#,
        );
        let sel = Selector::parse(r#"meta[name="a"]"#).unwrap();
        assert_eq!(first_attr(&doc, &sel, "content").as_deref(), Some("value"));
    }

    #[test]
    fn app_store_hosts() {
        assert!(is_app_store_host("apps.apple.com"));
        assert!(is_app_store_host("play.google.com"));
        assert!(!is_app_store_host("example.com"));
        assert!(!is_app_store_host("google.com"));
    }
}
