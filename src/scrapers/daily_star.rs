//! The Daily Star education scraper.
//!
//! Scrapes [The Daily Star](https://www.thedailystar.net)'s education tag
//! page, which lists stories as `div.card` elements. Article pages carry
//! their content inside `article.article-section`.
//!
//! # URL Pattern
//!
//! Cards link with relative URLs that are resolved to absolute URLs like
//! `https://www.thedailystar.net/news/bangladesh/education/<slug>`.

use async_trait::async_trait;
use chrono::Utc;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use super::Scraper;
use crate::error::ScrapeError;
use crate::models::{AssetRef, StoryDetail, StoryStub};
use crate::transport::Transport;

pub const SOURCE_NAME: &str = "daily_star";

const BASE_URL: &str = "https://www.thedailystar.net";

static BASE: Lazy<Url> = Lazy::new(|| Url::parse(BASE_URL).unwrap());
static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("div.card").unwrap());
static CARD_TITLE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("h3.title a[href]").unwrap());
static CARD_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.card-image a picture img").unwrap());
static TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article.article-section").unwrap());
static ARTICLE_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1.article-title").unwrap());
static GALLERY_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.section-media span.lg-gallery picture img").unwrap());
static BODY_PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("div.clearfix p").unwrap());

/// Card-based HTML variant of the [`Scraper`] contract.
pub struct DailyStarScraper {
    listing_url: String,
}

impl DailyStarScraper {
    pub fn new() -> Self {
        Self {
            listing_url: format!("{BASE_URL}/tags/education"),
        }
    }
}

impl Default for DailyStarScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scraper for DailyStarScraper {
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
        let stubs = parse_listing(&html, max_stories);
        info!(
            count = stubs.len(),
            source = %self.listing_url,
            "indexed Daily Star stories"
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
            "parsed Daily Star article"
        );
        Ok(detail)
    }
}

/// Extract story stubs from the education tag page.
fn parse_listing(html: &str, max_stories: usize) -> Vec<StoryStub> {
    let document = Html::parse_document(html);
    document
        .select(&CARD)
        .filter_map(extract_card)
        .unique_by(|stub| stub.canonical_url.clone())
        .take(max_stories)
        .collect()
}

/// One listing card → one stub. Cards without a titled link are skipped.
fn extract_card(card: ElementRef<'_>) -> Option<StoryStub> {
    let link = card.select(&CARD_TITLE_LINK).next()?;
    let href = link.value().attr("href")?;
    let title = element_text(link);
    if title.is_empty() {
        return None;
    }
    let canonical_url = BASE.join(href).ok()?.to_string();

    let hero_image_url = card
        .select(&CARD_IMAGE)
        .next()
        .and_then(|img| img.value().attr("data-srcset"))
        .map(str::to_string);

    Some(StoryStub {
        source_name: SOURCE_NAME.to_string(),
        canonical_url,
        title,
        discovered_at: Utc::now(),
        hero_image_url,
    })
}

/// Parse an article page into a detail record.
///
/// The headline and body live under `article.article-section`; a page
/// without that section does not carry a story.
fn parse_detail(html: &str, stub: &StoryStub) -> Result<StoryDetail, ScrapeError> {
    let document = Html::parse_document(html);
    let article = document.select(&ARTICLE).next().ok_or_else(|| {
        ScrapeError::Parse(format!("no article section in {}", stub.canonical_url))
    })?;

    let mut detail = StoryDetail::from_stub(stub.clone());

    if let Some(headline) = article.select(&ARTICLE_TITLE).next() {
        let headline = element_text(headline);
        if !headline.is_empty() {
            detail.title = headline;
        }
    }

    detail.published_at = article
        .select(&TIME)
        .next()
        .and_then(|t| t.value().attr("datetime"))
        .map(str::to_string);

    // Unclassed paragraphs are the story text; classed ones are chrome
    // (related-story boxes, ad slots).
    let body = article
        .select(&BODY_PARAGRAPH)
        .filter(|p| p.value().attr("class").is_none())
        .map(element_text)
        .filter(|text| !text.is_empty())
        .join("\n\n");
    detail.body_text = (!body.is_empty()).then_some(body);

    let gallery = article
        .select(&GALLERY_IMAGE)
        .filter_map(|img| img.value().attr("data-srcset"))
        .map(str::to_string);
    let known: Vec<String> = detail.assets.iter().map(|a| a.remote_url.clone()).collect();
    detail.assets.extend(
        gallery
            .unique()
            .filter(|url| !known.contains(url))
            .map(AssetRef::pending),
    );

    Ok(detail)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
