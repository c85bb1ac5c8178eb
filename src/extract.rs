//! Problem metadata extraction from fetched page HTML.
//!
//! Each [`ProblemSource`] maps to one extraction function with the uniform
//! signature [`ExtractFn`]. The mapping lives in an [`ExtractorRegistry`];
//! adding a site means registering one more `(source, fn)` pair.
//!
//! # LeetCode
//!
//! LeetCode pages are Next.js apps. The problem lives in the
//! `<script id="__NEXT_DATA__">` JSON island at
//!
//! ```text
//! props.pageProps.dehydratedState.queries[*].state.data.question
//! ```
//!
//! The first query (in page order) whose path resolves wins. `questionId`,
//! `title` and `content` are read from it; `content` is HTML and is flattened
//! to plain text.
//!
//! Extraction never fails loudly. Anything unexpected yields
//! [`Extraction::NotFound`], which callers may turn into empty metadata with
//! [`Extraction::into_info`].

use scraper::{Html, Node, Selector};
use serde_json::Value;

use crate::models::{ProblemInfo, ProblemSource};

/// Fields pulled out of a page by a source-specific extractor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedFields {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// Source-specific extractor: raw HTML in, fields out (`None` = not found).
pub type ExtractFn = fn(&str) -> Option<ExtractedFields>;

/// Outcome of running extraction on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Extracted(ProblemInfo),
    NotFound(ProblemSource),
}

impl Extraction {
    pub fn source(&self) -> ProblemSource {
        match self {
            Extraction::Extracted(info) => info.source,
            Extraction::NotFound(source) => *source,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Extracted(_))
    }

    /// Collapse to a [`ProblemInfo`]; `NotFound` becomes all-empty fields.
    pub fn into_info(self) -> ProblemInfo {
        match self {
            Extraction::Extracted(info) => info,
            Extraction::NotFound(source) => ProblemInfo::empty(source),
        }
    }
}

/// Dispatch table from source tag to extraction function.
pub struct ExtractorRegistry {
    extractors: Vec<(ProblemSource, ExtractFn)>,
}

impl ExtractorRegistry {
    /// An empty registry; every source extracts as `NotFound`.
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Registry with the built-in extractors for every known source.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ProblemSource::LeetCode, extract_leetcode);
        registry.register(ProblemSource::Codeforces, extract_unsupported);
        registry.register(ProblemSource::HackerRank, extract_unsupported);
        registry.register(ProblemSource::Unknown, extract_unsupported);
        registry
    }

    /// Register an extractor, replacing any previous one for the same source.
    pub fn register(&mut self, source: ProblemSource, extractor: ExtractFn) {
        if let Some(slot) = self.extractors.iter_mut().find(|(s, _)| *s == source) {
            slot.1 = extractor;
        } else {
            self.extractors.push((source, extractor));
        }
    }

    pub fn get(&self, source: ProblemSource) -> Option<ExtractFn> {
        self.extractors
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, f)| *f)
    }

    /// Detect the source from `url` and run its extractor over `html`.
    pub fn extract(&self, url: &str, html: &str) -> Extraction {
        let source = ProblemSource::detect(url);
        match self.get(source).and_then(|extractor| extractor(html)) {
            Some(fields) => Extraction::Extracted(ProblemInfo {
                source,
                id: fields.id,
                title: fields.title,
                description: fields.description,
            }),
            None => Extraction::NotFound(source),
        }
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Placeholder for sites without an extractor yet.
pub fn extract_unsupported(_html: &str) -> Option<ExtractedFields> {
    None
}

/// Extract a LeetCode problem from its `__NEXT_DATA__` island.
pub fn extract_leetcode(html: &str) -> Option<ExtractedFields> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script#__NEXT_DATA__").ok()?;
    let script = document.select(&selector).next()?;
    let json_text: String = script.text().collect();

    let root: Value = serde_json::from_str(&json_text).ok()?;
    let queries = root
        .pointer("/props/pageProps/dehydratedState/queries")?
        .as_array()?;

    let question = queries
        .iter()
        .find_map(|query| query.pointer("/state/data/question")?.as_object())?;

    let field = |key: &str| {
        question
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Some(ExtractedFields {
        id: field("questionId"),
        title: field("title"),
        description: html_to_text(&field("content")),
    })
}

const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "pre", "h1", "h2", "h3", "h4", "h5", "h6", "table",
    "tr", "blockquote",
];

/// Flatten an HTML fragment to text. Block elements start a new line;
/// whitespace inside a line is collapsed and blank lines are dropped.
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let mut raw = String::with_capacity(html.len());
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(element) if BLOCK_ELEMENTS.contains(&element.name()) => raw.push('\n'),
            _ => {}
        }
    }

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_data_page(json: &str) -> String {
        format!(
            r#"<!DOCTYPE html><html><head><title>x</title></head><body>
<div id="__next"></div>
<script id="__NEXT_DATA__" type="application/json">{}</script>
</body></html>"#,
            json
        )
    }

    fn two_sum_page() -> String {
        next_data_page(
            r#"{"props":{"pageProps":{"dehydratedState":{"queries":[
                {"state":{"data":{"user":{"name":"anon"}}}},
                {"state":{"data":{"question":{
                    "questionId":"1",
                    "title":"Two Sum",
                    "content":"<p>Given an array of integers <code>nums</code>&nbsp;and an integer <code>target</code>.</p>\n<p>Return <em>indices</em>.</p>"
                }}}},
                {"state":{"data":{"question":{"questionId":"999","title":"Later"}}}}
            ]}}}}"#,
        )
    }

    #[test]
    fn leetcode_first_resolving_query_wins() {
        let fields = extract_leetcode(&two_sum_page()).unwrap();
        assert_eq!(fields.id, "1");
        assert_eq!(fields.title, "Two Sum");
        assert!(fields.description.starts_with("Given an array of integers nums"));
        assert!(fields.description.contains("\nReturn indices."));
        assert!(!fields.description.contains('<'));
    }

    #[test]
    fn missing_island_is_not_found() {
        let html = "<html><body><script>var x = 1;</script></body></html>";
        assert_eq!(extract_leetcode(html), None);
    }

    #[test]
    fn invalid_json_is_not_found() {
        assert_eq!(extract_leetcode(&next_data_page("{not json")), None);
    }

    #[test]
    fn wrong_types_along_path_are_not_found() {
        let html = next_data_page(r#"{"props":{"pageProps":{"dehydratedState":{"queries":{}}}}}"#);
        assert_eq!(extract_leetcode(&html), None);

        let html = next_data_page(
            r#"{"props":{"pageProps":{"dehydratedState":{"queries":[{"state":{"data":{"question":"str"}}}]}}}}"#,
        );
        assert_eq!(extract_leetcode(&html), None);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let html = next_data_page(
            r#"{"props":{"pageProps":{"dehydratedState":{"queries":[{"state":{"data":{"question":{"questionId":7}}}}]}}}}"#,
        );
        let fields = extract_leetcode(&html).unwrap();
        assert_eq!(fields, ExtractedFields::default());
    }

    #[test]
    fn registry_tags_source_even_when_not_found() {
        let registry = ExtractorRegistry::with_builtins();
        let outcome = registry.extract("https://leetcode.com/problems/two-sum/", "<html></html>");
        assert_eq!(outcome, Extraction::NotFound(ProblemSource::LeetCode));

        let info = outcome.into_info();
        assert_eq!(info.source, ProblemSource::LeetCode);
        assert!(info.id.is_empty() && info.title.is_empty() && info.description.is_empty());
    }

    #[test]
    fn placeholder_sources_never_extract() {
        let registry = ExtractorRegistry::with_builtins();
        let page = two_sum_page();
        for url in [
            "https://codeforces.com/problemset/problem/1/A",
            "https://www.hackerrank.com/challenges/solve-me-first",
            "https://example.com/problems/two-sum",
        ] {
            let outcome = registry.extract(url, &page);
            assert!(!outcome.is_found(), "{} should not extract", url);
        }
    }

    #[test]
    fn extraction_is_idempotent() {
        let registry = ExtractorRegistry::with_builtins();
        let page = two_sum_page();
        let url = "https://leetcode.com/problems/two-sum/";
        assert_eq!(registry.extract(url, &page), registry.extract(url, &page));
    }

    #[test]
    fn register_replaces_builtin() {
        fn fixed(_html: &str) -> Option<ExtractedFields> {
            Some(ExtractedFields {
                id: "A".to_string(),
                title: "Theatre Square".to_string(),
                description: String::new(),
            })
        }

        let mut registry = ExtractorRegistry::with_builtins();
        registry.register(ProblemSource::Codeforces, fixed);
        let info = registry
            .extract("https://codeforces.com/problemset/problem/1/A", "")
            .into_info();
        assert_eq!(info.source, ProblemSource::Codeforces);
        assert_eq!(info.title, "Theatre Square");
    }

    #[test]
    fn html_to_text_decodes_entities_and_collapses_space() {
        let text = html_to_text("<p>a &lt; b&nbsp;&amp;&amp;   c</p><ul><li>x</li><li>y</li></ul>");
        assert_eq!(text, "a < b && c\nx\ny");
        assert_eq!(html_to_text("   "), "");
    }
}
