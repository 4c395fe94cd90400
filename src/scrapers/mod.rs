//! News search sources.
//!
//! Only the Google News RSS search feed is supported ([`google_news`]). Keywords
//! are searched one at a time, in configured order; a keyword whose fetch
//! fails contributes no articles and the run carries on.

pub mod google_news;

use crate::config::Keyword;
use crate::models::Article;
use futures::stream::{self, StreamExt};
use google_news::GoogleNewsClient;
use tracing::{info, instrument};

/// Fetch every keyword sequentially and concatenate the results.
#[instrument(level = "info", skip_all, fields(keywords = keywords.len()))]
pub async fn fetch_all(client: &GoogleNewsClient, keywords: &[Keyword]) -> Vec<Article> {
    let articles: Vec<Article> = stream::iter(keywords)
        .then(|keyword| client.fetch_keyword(keyword))
        .concat()
        .await;

    info!(count = articles.len(), "Fetched articles for all keywords");
    articles
}
