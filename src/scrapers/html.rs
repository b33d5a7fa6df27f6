//! Headline scraping for sources that publish no feed.
//!
//! Candidates come from three selectors, each capped independently and
//! concatenated in this order:
//!
//! 1. `h2` headings
//! 2. `h3` headings
//! 3. `a` elements whose `class` contains `article` (case-insensitive)
//!
//! A heading's title is the text of its first inner link, falling back to the
//! heading's own text; its link is that inner link's `href`.

use crate::models::Candidate;
use crate::scrapers::ExtractLimits;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static H3: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static CLASSED_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[class]").unwrap());

/// Whitespace-trimmed text fragments of an element, joined by single spaces.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_article_link(element: &ElementRef<'_>) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| class.to_lowercase().contains("article"))
}

/// Make `link` absolute against `base` unless it already starts with `http`.
fn absolutize(link: &str, base: &Url) -> String {
    if link.is_empty() || link.starts_with("http") {
        return link.to_string();
    }
    match base.join(link) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => format!("{}{}", base.as_str().trim_end_matches('/'), link),
    }
}

/// Title and raw link for one candidate element.
fn title_and_link(element: ElementRef<'_>) -> (String, String) {
    let is_heading = matches!(element.value().name(), "h2" | "h3");
    if !is_heading {
        let href = element.value().attr("href").unwrap_or_default();
        return (element_text(element), href.to_string());
    }
    match element.select(&LINK).next() {
        Some(inner) => {
            let mut title = element_text(inner);
            if title.is_empty() {
                title = element_text(element);
            }
            let href = inner.value().attr("href").unwrap_or_default();
            (title, href.to_string())
        }
        None => (element_text(element), String::new()),
    }
}

/// Extract headline candidates from an HTML page.
///
/// Titles shorter than `limits.min_title_len` characters are dropped. Relative
/// links are resolved against `base_url`. No keyword filtering happens here.
#[instrument(level = "debug", skip_all, fields(base_url = %base_url))]
pub fn extract(markup: &str, base_url: &Url, limits: ExtractLimits) -> Vec<Candidate> {
    let document = Html::parse_document(markup);

    let elements = document
        .select(&H2)
        .take(limits.max_items)
        .chain(document.select(&H3).take(limits.max_items))
        .chain(
            document
                .select(&CLASSED_LINK)
                .filter(is_article_link)
                .take(limits.max_items),
        );

    let mut candidates = Vec::new();
    for element in elements {
        let (title, link) = title_and_link(element);
        if title.chars().count() < limits.min_title_len {
            continue;
        }
        candidates.push(Candidate {
            link: absolutize(link.trim(), base_url),
            match_text: title.clone(),
            title,
        });
    }

    debug!(count = candidates.len(), "Extracted HTML candidates");
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.newslaundry.com").unwrap()
    }

    #[test]
    fn test_heading_with_inner_link() {
        let page = r#"<h2 class="headline"><a href="/2024/01/01/budget">Budget and the <b>Indian</b> economy</a></h2>"#;
        let items = extract(page, &base(), ExtractLimits::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Budget and the Indian economy");
        assert_eq!(items[0].link, "https://www.newslaundry.com/2024/01/01/budget");
        assert_eq!(items[0].match_text, items[0].title);
    }

    #[test]
    fn test_heading_without_link() {
        let page = "<h3>  Election coverage continues  </h3>";
        let items = extract(page, &base(), ExtractLimits::default());
        assert_eq!(items[0].title, "Election coverage continues");
        assert_eq!(items[0].link, "");
    }

    #[test]
    fn test_heading_with_empty_link_uses_heading_text() {
        let page = r#"<h2>Opinion: the finance bill <a href="/op/1"><img src="x.png"></a></h2>"#;
        let items = extract(page, &base(), ExtractLimits::default());
        assert_eq!(items[0].title, "Opinion: the finance bill");
        assert_eq!(items[0].link, "https://www.newslaundry.com/op/1");
    }

    #[test]
    fn test_short_titles_discarded() {
        let page = "<h2>Short</h2><h2>  123456789  </h2><h2>1234567890</h2>";
        let items = extract(page, &base(), ExtractLimits::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "1234567890");
    }

    #[test]
    fn test_article_class_links() {
        let page = r#"
            <a class="card ArticleLink" href="https://other.example/x">Congress wins bypoll in state</a>
            <a class="nav" href="/about">About the newsroom team</a>
            <a href="/plain">Plain link without class</a>
        "#;
        let items = extract(page, &base(), ExtractLimits::default());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "https://other.example/x");
    }

    #[test]
    fn test_selector_order_and_caps() {
        let mut page = String::new();
        for i in 0..25 {
            page.push_str(&format!(r#"<a class="article" href="/a{i}">Article link number {i}</a>"#));
        }
        for i in 0..25 {
            page.push_str(&format!("<h3>Subheading number {i}</h3>"));
        }
        for i in 0..25 {
            page.push_str(&format!("<h2>Main heading number {i}</h2>"));
        }

        let items = extract(&page, &base(), ExtractLimits::default());
        assert_eq!(items.len(), 20 * 3);
        assert_eq!(items[0].title, "Main heading number 0");
        assert_eq!(items[19].title, "Main heading number 19");
        assert_eq!(items[20].title, "Subheading number 0");
        assert_eq!(items[39].title, "Subheading number 19");
        assert_eq!(items[40].title, "Article link number 0");
        assert_eq!(items[59].title, "Article link number 19");
        assert_eq!(items[59].link, "https://www.newslaundry.com/a19");
    }

    #[test]
    fn test_cap_applies_before_short_titles_are_dropped() {
        let mut page = String::from("<h2>Short</h2>");
        for i in 0..20 {
            page.push_str(&format!("<h2>Main heading number {i}</h2>"));
        }
        let items = extract(&page, &base(), ExtractLimits::default());
        assert_eq!(items.len(), 19);
        assert_eq!(items[18].title, "Main heading number 18");
    }

    #[test]
    fn test_absolutize() {
        let base = base();
        assert_eq!(absolutize("", &base), "");
        assert_eq!(absolutize("https://x.example/a", &base), "https://x.example/a");
        assert_eq!(absolutize("/story", &base), "https://www.newslaundry.com/story");
        assert_eq!(absolutize("story", &base), "https://www.newslaundry.com/story");
    }
}
