// src/ingest/extract.rs
//! Article body extraction from raw page markup.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Per-site rule for locating body paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStrategy {
    /// `<p>` elements inside the first `<article>` container.
    ArticleParagraphs,
    /// Components tagged `data-component-name="paragraph"`; every `<p>` if none match.
    ComponentParagraphs,
}

static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static COMPONENT_PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[data-component-name="paragraph"]"#).unwrap());

/// Extract body text. Missing structure yields an empty string, never an error.
pub fn extract(html: &str, strategy: SiteStrategy) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let doc = Html::parse_document(html);

    let paragraphs: Vec<ElementRef<'_>> = match strategy {
        SiteStrategy::ArticleParagraphs => match doc.select(&ARTICLE).next() {
            Some(article) => article.select(&PARAGRAPH).collect(),
            None => return String::new(),
        },
        SiteStrategy::ComponentParagraphs => {
            let tagged: Vec<_> = doc.select(&COMPONENT_PARAGRAPH).collect();
            if tagged.is_empty() {
                doc.select(&PARAGRAPH).collect()
            } else {
                tagged
            }
        }
    };

    paragraphs
        .into_iter()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn element_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
