//! Prothom Alo education scraper.
//!
//! [Prothom Alo](https://www.prothomalo.com) does not render stories into
//! markup; the page state is embedded as JSON inside
//! `<script type="application/json">` tags, with stories nested in a tree of
//! collections. Both phases of this variant walk that tree rather than
//! selecting elements.
//!
//! Media files live on a separate CDN and are addressed by s3 key, so image
//! URLs are composed from `https://media.prothomalo.com/` plus the key.

use async_trait::async_trait;
use chrono::Utc;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::Scraper;
use crate::error::ScrapeError;
use crate::models::{AssetRef, StoryDetail, StoryStub};
use crate::transport::Transport;

pub const SOURCE_NAME: &str = "prothom_alo";

const BASE_URL: &str = "https://www.prothomalo.com";
const MEDIA_BASE_URL: &str = "https://media.prothomalo.com/";

static JSON_SCRIPT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/json"]"#).unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new("<[^<]+?>").unwrap());

/// Structured-data variant of the [`Scraper`] contract.
pub struct ProthomAloScraper {
    listing_url: String,
}

impl ProthomAloScraper {
    pub fn new() -> Self {
        Self {
            listing_url: format!("{BASE_URL}/education"),
        }
    }
}

impl Default for ProthomAloScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scraper for ProthomAloScraper {
    fn source_name(&self) -> &str {
        SOURCE_NAME
    }

    #[instrument(level = "info", skip(self, transport))]
    async fn list_stories(
        &self,
        transport: &Transport,
        max_stories: usize,
    ) -> Result<Vec<StoryStub>, ScrapeError> {
        let html = transport.get_text(&self.listing_url).await?;
        let stubs = parse_listing(&html, max_stories)?;
        info!(
            count = stubs.len(),
            source = %self.listing_url,
            "indexed Prothom Alo stories"
        );
        Ok(stubs)
    }

    #[instrument(level = "info", skip(self, transport, stub), fields(url = %stub.canonical_url))]
    async fn fetch_detail(
        &self,
        transport: &Transport,
        stub: &StoryStub,
    ) -> Result<StoryDetail, ScrapeError> {
        let html = transport.get_text(&stub.canonical_url).await?;
        let detail = parse_detail(&html, stub)?;
        debug!(
            assets = detail.assets.len(),
            body_bytes = detail.body_text.as_deref().map(str::len).unwrap_or(0),
            "parsed Prothom Alo story"
        );
        Ok(detail)
    }
}

/// Pull every parseable JSON payload out of the page's script tags.
fn script_payloads(html: &str) -> Vec<Value> {
    let document = Html::parse_document(html);
    document
        .select(&JSON_SCRIPT)
        .filter_map(|script| serde_json::from_str(&script.text().collect::<String>()).ok())
        .collect()
}

/// Extract story stubs from the education section page.
fn parse_listing(html: &str, max_stories: usize) -> Result<Vec<StoryStub>, ScrapeError> {
    let payloads = script_payloads(html);
    if payloads.is_empty() {
        return Err(ScrapeError::Parse(
            "no structured-data payloads in listing page".to_string(),
        ));
    }

    let mut stubs = Vec::new();
    for payload in &payloads {
        if let Some(data) = payload.pointer("/qt/data") {
            collect_stories(data, &mut stubs);
        }
    }

    Ok(stubs
        .into_iter()
        .unique_by(|stub| stub.canonical_url.clone())
        .take(max_stories)
        .collect())
}

/// Recursively walk the collection tree, gathering every story node.
fn collect_stories(data: &Value, out: &mut Vec<StoryStub>) {
    match data {
        Value::Object(map) => match map.get("type").and_then(Value::as_str) {
            Some("collection") => {
                if let Some(items) = map.get("items").and_then(Value::as_array) {
                    for item in items {
                        collect_stories(item, out);
                    }
                }
            }
            Some("story") => {
                let story = map.get("story").unwrap_or(data);
                if let Some(stub) = story_stub(story) {
                    out.push(stub);
                }
            }
            _ => {
                for value in map.values() {
                    if value.is_object() || value.is_array() {
                        collect_stories(value, out);
                    }
                }
            }
        },
        Value::Array(items) => {
            for item in items {
                collect_stories(item, out);
            }
        }
        _ => {}
    }
}

/// A story node → a stub. Nodes without a headline and slug are not stories.
fn story_stub(story: &Value) -> Option<StoryStub> {
    let headline = story.get("headline").and_then(Value::as_str)?;
    let slug = story.get("slug").and_then(Value::as_str)?;

    Some(StoryStub {
        source_name: SOURCE_NAME.to_string(),
        canonical_url: format!("{BASE_URL}/{slug}"),
        title: headline.to_string(),
        discovered_at: Utc::now(),
        hero_image_url: story
            .get("hero-image-s3-key")
            .and_then(Value::as_str)
            .map(media_url),
    })
}

/// Parse a story page into a detail record.
fn parse_detail(html: &str, stub: &StoryStub) -> Result<StoryDetail, ScrapeError> {
    for payload in script_payloads(html) {
        if let Some(story) = payload.pointer("/qt/data/story") {
            return Ok(story_detail(story, stub));
        }
    }
    Err(ScrapeError::Parse(format!(
        "no story payload in {}",
        stub.canonical_url
    )))
}

fn story_detail(story: &Value, stub: &StoryStub) -> StoryDetail {
    let mut detail = StoryDetail::from_stub(stub.clone());

    if let Some(headline) = story.get("headline").and_then(Value::as_str) {
        detail.title = headline.to_string();
    }
    // `last-published-at` is an epoch-millis number on this source; other
    // payload versions have carried strings. Keep whatever it says.
    detail.published_at = story.get("last-published-at").map(|value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    detail.author = story
        .get("author-name")
        .and_then(Value::as_str)
        .map(str::to_string);

    let (body, images) = card_content(story.get("cards").and_then(Value::as_array));
    detail.body_text = (!body.is_empty()).then_some(body);

    let hero = story
        .get("hero-image-s3-key")
        .and_then(Value::as_str)
        .map(media_url)
        .or_else(|| stub.hero_image_url.clone());

    let asset_urls = hero.into_iter().chain(images).unique();
    detail.assets = asset_urls.map(AssetRef::pending).collect();

    detail
}

/// Concatenate the text elements and collect the image keys of the story's
/// cards. Only elements with a null subtype carry prose; the rest are
/// embeds (tweets, related stories) the archive does not keep.
fn card_content(cards: Option<&Vec<Value>>) -> (String, Vec<String>) {
    let mut body = String::new();
    let mut images = Vec::new();

    for card in cards.into_iter().flatten() {
        let Some(elements) = card.get("story-elements").and_then(Value::as_array) else {
            continue;
        };
        for element in elements {
            if !element.get("subtype").is_none_or(Value::is_null) {
                continue;
            }
            match element.get("type").and_then(Value::as_str) {
                Some("text") | Some("title") => {
                    if let Some(text) = element.get("text").and_then(Value::as_str) {
                        let text = HTML_TAG.replace_all(text, "");
                        let text = text.trim();
                        if !text.is_empty() {
                            body.push_str(text);
                            body.push_str("\n\n");
                        }
                    }
                }
                Some("image") => {
                    if let Some(key) = element.get("image-s3-key").and_then(Value::as_str) {
                        images.push(media_url(key));
                    }
                }
                _ => {}
            }
        }
    }

    (body.trim_end().to_string(), images)
}

fn media_url(key: &str) -> String {
    format!("{MEDIA_BASE_URL}{key}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetStatus;

    fn page_with(payload: &str) -> String {
        format!(
            r#"<html><body>
                 <script type="application/json">{{"irrelevant": true}}</script>
                 <script type="application/json">{payload}</script>
               </body></html>"#
        )
    }

    fn listing_payload() -> String {
        r#"{
            "qt": {"data": {"collection": {
                "type": "collection",
                "items": [
                    {"type": "story", "story": {
                        "headline": "ভর্তি পরীক্ষার তারিখ ঘোষণা",
                        "slug": "education/admission-dates",
                        "hero-image-s3-key": "prothomalo/2026-08/hero.jpg"
                    }},
                    {"type": "collection", "items": [
                        {"type": "story", "story": {
                            "headline": "বৃত্তির ফল প্রকাশ",
                            "slug": "education/scholarship-results"
                        }},
                        {"type": "story", "story": {
                            "headline": "ভর্তি পরীক্ষার তারিখ ঘোষণা (repeat)",
                            "slug": "education/admission-dates"
                        }}
                    ]},
                    {"type": "story", "story": {"slug": "education/broken-no-headline"}}
                ]
            }}}
        }"#
        .to_string()
    }

    fn story_payload() -> String {
        r#"{
            "qt": {"data": {"story": {
                "headline": "ভর্তি পরীক্ষার তারিখ ঘোষণা",
                "slug": "education/admission-dates",
                "last-published-at": 1754380800000,
                "author-name": "নিজস্ব প্রতিবেদক",
                "hero-image-s3-key": "prothomalo/2026-08/hero.jpg",
                "cards": [
                    {"story-elements": [
                        {"type": "title", "subtype": null, "text": "পরীক্ষা শুরু সেপ্টেম্বরে"},
                        {"type": "text", "subtype": null, "text": "<p>শিক্ষা মন্ত্রণালয় <b>জানিয়েছে</b>।</p>"},
                        {"type": "text", "subtype": "also-read", "text": "আরও পড়ুন: পুরোনো খবর"},
                        {"type": "image", "subtype": null, "image-s3-key": "prothomalo/2026-08/chart.png"}
                    ]},
                    {"story-elements": [
                        {"type": "text", "text": "আবেদন চলবে আগস্ট পর্যন্ত।"}
                    ]}
                ]
            }}}
        }"#
        .to_string()
    }

    fn stub() -> StoryStub {
        StoryStub {
            source_name: SOURCE_NAME.to_string(),
            canonical_url: format!("{BASE_URL}/education/admission-dates"),
            title: "ভর্তি পরীক্ষার তারিখ ঘোষণা".to_string(),
            discovered_at: Utc::now(),
            hero_image_url: None,
        }
    }

    #[test]
    fn test_parse_listing_walks_nested_collections_and_dedupes() {
        let stubs = parse_listing(&page_with(&listing_payload()), 10).unwrap();
        assert_eq!(stubs.len(), 2);

        assert_eq!(
            stubs[0].canonical_url,
            "https://www.prothomalo.com/education/admission-dates"
        );
        assert_eq!(stubs[0].title, "ভর্তি পরীক্ষার তারিখ ঘোষণা");
        assert_eq!(
            stubs[0].hero_image_url.as_deref(),
            Some("https://media.prothomalo.com/prothomalo/2026-08/hero.jpg")
        );

        assert_eq!(
            stubs[1].canonical_url,
            "https://www.prothomalo.com/education/scholarship-results"
        );
    }

    #[test]
    fn test_parse_listing_respects_max_stories() {
        let stubs = parse_listing(&page_with(&listing_payload()), 1).unwrap();
        assert_eq!(stubs.len(), 1);
    }

    #[test]
    fn test_parse_listing_without_payloads_is_a_parse_failure() {
        let err = parse_listing("<html><body>plain page</body></html>", 10).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse(_)));
    }

    #[test]
    fn test_parse_detail_builds_body_and_assets() {
        let detail = parse_detail(&page_with(&story_payload()), &stub()).unwrap();

        assert_eq!(detail.published_at.as_deref(), Some("1754380800000"));
        assert_eq!(detail.author.as_deref(), Some("নিজস্ব প্রতিবেদক"));
        // Tags stripped, non-null subtypes skipped, missing subtype kept.
        assert_eq!(
            detail.body_text.as_deref(),
            Some("পরীক্ষা শুরু সেপ্টেম্বরে\n\nশিক্ষা মন্ত্রণালয় জানিয়েছে।\n\nআবেদন চলবে আগস্ট পর্যন্ত।")
        );

        let urls: Vec<&str> = detail.assets.iter().map(|a| a.remote_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://media.prothomalo.com/prothomalo/2026-08/hero.jpg",
                "https://media.prothomalo.com/prothomalo/2026-08/chart.png",
            ]
        );
        assert!(detail.assets.iter().all(|a| a.status == AssetStatus::Pending));
    }

    #[test]
    fn test_parse_detail_without_story_payload_fails() {
        let html = page_with(r#"{"qt": {"data": {}}}"#);
        let err = parse_detail(&html, &stub()).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse(_)));
    }

    #[test]
    fn test_story_detail_tolerates_bare_story() {
        // A story with nothing but identity still produces a record.
        let story = serde_json::json!({"headline": "শিরোনাম", "slug": "education/x"});
        let detail = story_detail(&story, &stub());
        assert_eq!(detail.title, "শিরোনাম");
        assert!(detail.published_at.is_none());
        assert!(detail.author.is_none());
        assert!(detail.body_text.is_none());
        assert!(detail.assets.is_empty());
    }
}
