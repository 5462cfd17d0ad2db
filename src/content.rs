//! Content sources
//!
//! The estimator never looks up the page itself. The host injects a
//! [`ContentSource`] that yields the text of its designated content region,
//! which keeps the engine testable without a live document.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Default content region of a documentation page
pub const DEFAULT_REGION: &str = "article";

/// Capability that yields the rendered text of the host's content region.
///
/// Returning `None` means the region does not exist; this is not an error and
/// resolves to a zero estimate.
pub trait ContentSource {
    fn region_text(&self) -> Option<Cow<'_, str>>;
}

/// Plain text that is the content region in its entirety
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticText(pub String);

impl StaticText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl ContentSource for StaticText {
    fn region_text(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(&self.0))
    }
}

/// A host closure supplying the region text on demand
pub struct ContentFn<F>(pub F);

impl<F> ContentSource for ContentFn<F>
where
    F: Fn() -> Option<String>,
{
    fn region_text(&self) -> Option<Cow<'_, str>> {
        (self.0)().map(Cow::Owned)
    }
}

/// An HTML page whose content region is the first element with the given tag
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    html: String,
    region: String,
}

impl HtmlDocument {
    /// Use the first `<article>` element as the content region
    pub fn new(html: impl Into<String>) -> Self {
        Self::with_region(html, DEFAULT_REGION)
    }

    pub fn with_region(html: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

impl ContentSource for HtmlDocument {
    fn region_text(&self) -> Option<Cow<'_, str>> {
        extract_region_text(&self.html, &self.region).map(Cow::Owned)
    }
}

/// Extract the visible text of the first `<tag>...</tag>` element in `html`.
///
/// Nested elements with the same tag are balanced, so the region ends at its
/// own closing tag. Script, style and comment bodies are dropped, block-level
/// tags become word breaks while inline tags vanish, and the common named
/// entities are decoded. Returns `None` when the element is missing or never
/// closed.
pub fn extract_region_text(html: &str, tag: &str) -> Option<String> {
    let pattern = format!(r"(?i)<(/?){tag}\b[^>]*>", tag = regex::escape(tag));
    let re = Regex::new(&pattern).ok()?;

    let mut start = None;
    let mut depth = 0usize;
    for caps in re.captures_iter(html) {
        let whole = caps.get(0)?;
        let closing = caps.get(1).is_some_and(|slash| slash.as_str() == "/");

        match (start, closing) {
            // Stray closing tag before the region opens
            (None, true) => {}
            (None, false) => {
                start = Some(whole.end());
                depth = 1;
            }
            (Some(_), false) => depth += 1,
            (Some(begin), true) => {
                depth -= 1;
                if depth == 0 {
                    return Some(html_to_text(&html[begin..whole.start()]));
                }
            }
        }
    }

    None
}

fn hidden_blocks() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<noscript\b[^>]*>.*?</noscript\s*>",
        )
        .ok()
    })
    .as_ref()
}

fn block_tags() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)</?(?:address|article|aside|blockquote|br|caption|dd|details|div|dl|dt|figcaption|figure|footer|h[1-6]|header|hr|li|main|nav|ol|p|pre|section|summary|table|tbody|td|tfoot|th|thead|tr|ul)\b[^>]*>",
        )
        .ok()
    })
    .as_ref()
}

fn any_tag() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").ok()).as_ref()
}

fn html_to_text(fragment: &str) -> String {
    let mut text = Cow::Borrowed(fragment);
    if let Some(re) = hidden_blocks() {
        text = Cow::Owned(re.replace_all(&text, " ").into_owned());
    }
    if let Some(re) = block_tags() {
        text = Cow::Owned(re.replace_all(&text, " ").into_owned());
    }
    if let Some(re) = any_tag() {
        text = Cow::Owned(re.replace_all(&text, "").into_owned());
    }
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    // &amp; last so "&amp;lt;" decodes to "&lt;" rather than "<"
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::count_words;

    const PAGE: &str = r#"<!doctype html>
        <html>
          <head><title>Ignored title words</title></head>
          <body>
            <nav>Home Docs Blog</nav>
            <article class="markdown">
              <h1>Install&nbsp;guide</h1>
              <p>Run the <code>setup</code> script.</p>
              <script>var hidden = "not counted at all";</script>
              <!-- a comment with words -->
              <p>Tom &amp; Jerry</p>
            </article>
            <footer>Copyright words here</footer>
          </body>
        </html>"#;

    #[test]
    fn test_extracts_only_article_text() {
        let text = extract_region_text(PAGE, "article").unwrap();
        assert!(text.contains("Install guide"));
        assert!(text.contains("Tom & Jerry"));
        assert!(!text.contains("Home"));
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("comment"));
    }

    #[test]
    fn test_word_count_of_article_region() {
        let doc = HtmlDocument::new(PAGE);
        let text = doc.region_text().unwrap();
        // Install guide Run the setup script. Tom & Jerry
        assert_eq!(count_words(&text), 9);
    }

    #[test]
    fn test_missing_region_is_none() {
        let doc = HtmlDocument::new("<html><body><main>Some words</main></body></html>");
        assert!(doc.region_text().is_none());

        let main = HtmlDocument::with_region("<main>Some words</main>", "main");
        assert_eq!(main.region(), "main");
        assert_eq!(count_words(&main.region_text().unwrap()), 2);
    }

    #[test]
    fn test_region_tag_is_case_insensitive() {
        let text = extract_region_text("<ARTICLE id=x>One two</Article>", "article").unwrap();
        assert_eq!(count_words(&text), 2);
    }

    #[test]
    fn test_unclosed_region_is_none() {
        assert!(extract_region_text("<article>never closed", "article").is_none());
    }

    #[test]
    fn test_does_not_match_longer_tag_names() {
        assert!(extract_region_text("<articles>nope</articles>", "article").is_none());
    }

    #[test]
    fn test_nested_region_is_balanced() {
        let html = "<article>outer <article>inner words</article> tail end</article><p>after</p>";
        let text = extract_region_text(html, "article").unwrap();
        assert!(text.contains("tail end"));
        assert!(!text.contains("after"));
        assert_eq!(count_words(&text), 6);
    }

    #[test]
    fn test_inline_tags_do_not_split_words() {
        let html = "<article><p>un<em>believ</em>able</p><p>next</p></article>";
        let text = extract_region_text(html, "article").unwrap();
        assert_eq!(count_words(&text), 2);
        assert!(text.contains("unbelievable"));

        let html = "<article>line<br>break<li>item</li></article>";
        let breaks = extract_region_text(html, "article").unwrap();
        assert_eq!(count_words(&breaks), 3);
    }

    #[test]
    fn test_double_escaped_entity_decodes_once() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_static_and_fn_sources() {
        let text = StaticText::new("three little words");
        assert_eq!(text.region_text().as_deref(), Some("three little words"));

        let absent = ContentFn(|| -> Option<String> { None });
        assert!(absent.region_text().is_none());

        let present = ContentFn(|| Some("from the host".to_string()));
        assert_eq!(present.region_text().as_deref(), Some("from the host"));
    }
}
