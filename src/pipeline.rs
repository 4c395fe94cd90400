//! One complete run: load, fetch, merge, save, render.
//!
//! The page is written only after the store has been saved.

use crate::config::Config;
use crate::models::RunSummary;
use crate::outputs::{html::HtmlRenderer, write_page};
use crate::scrapers::{self, google_news::GoogleNewsClient};
use crate::store::{self, Store};
use crate::utils::{ensure_writable_dir, parent_dir};
use chrono::{DateTime, Utc};
use std::error::Error;
use tracing::{error, info, instrument};

#[instrument(level = "info", skip_all, fields(keywords = config.keywords.len()))]
pub async fn run(config: &Config, now: DateTime<Utc>) -> Result<RunSummary, Box<dyn Error>> {
    for file in [&config.paths.data_file, &config.paths.output_html] {
        let dir = parent_dir(file);
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let store = Store::new(&config.paths.data_file);
    let existing = store.load().await?;
    let existing_count = existing.len();

    let client = GoogleNewsClient::new(&config.feed, config.description_max_chars)?;
    let incoming = scrapers::fetch_all(&client, &config.keywords).await;
    let fetched = incoming.len();

    let merged = store::merge(existing, incoming, config.lookback(), now);
    info!(
        existing = existing_count,
        fetched,
        total = merged.len(),
        "Total after merge & dedup"
    );

    store.save(&merged).await?;

    let page = HtmlRenderer::new(config).render(&merged, now)?;
    write_page(&config.paths.output_html, &page).await?;

    Ok(RunSummary {
        existing: existing_count,
        fetched,
        total: merged.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeedConfig, Keyword, PathsConfig};
    use crate::models::Article;
    use chrono::{Duration, TimeZone};
    use mockito::Matcher;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap()
    }

    fn config(dir: &TempDir, endpoint: String) -> Config {
        Config {
            keywords: vec![
                Keyword::new("Alpha", "alpha", "#d1fae5", "#065f46"),
                Keyword::new("Beta", "beta", "#dbeafe", "#1e3a8a"),
            ],
            feed: FeedConfig {
                endpoint,
                timeout_secs: 5,
                ..FeedConfig::default()
            },
            paths: PathsConfig {
                data_file: dir.path().join("data").join("news_data.json"),
                output_html: dir.path().join("site").join("index.html"),
            },
            ..Config::default()
        }
    }

    fn feed(items: &[(&str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(link, date)| {
                format!("<item><title>{link}</title><link>{link}</link><pubDate>{date}</pubDate></item>")
            })
            .collect();
        format!("<rss version=\"2.0\"><channel>{items}</channel></rss>")
    }

    #[tokio::test]
    async fn test_run_merges_with_existing_store() {
        let dir = TempDir::new().unwrap();
        let mut server = mockito::Server::new_async().await;
        let _alpha = server
            .mock("GET", "/rss")
            .match_query(Matcher::UrlEncoded("q".into(), "alpha".into()))
            .with_body(feed(&[
                ("https://x/a", "Sat, 10 May 2025 11:00:00 GMT"),
                ("https://x/b", "Sat, 10 May 2025 10:00:00 GMT"),
                ("https://x/bad", "not a date"),
            ]))
            .create_async()
            .await;
        let _beta = server
            .mock("GET", "/rss")
            .match_query(Matcher::UrlEncoded("q".into(), "beta".into()))
            .with_status(500)
            .create_async()
            .await;

        let config = config(&dir, format!("{}/rss", server.url()));
        let original_a = Article {
            title: "Original a".to_string(),
            link: "https://x/a".to_string(),
            description: String::new(),
            published: now() - Duration::days(10),
            source: "Reuters".to_string(),
            keyword: Some("Beta".to_string()),
        };
        Store::new(&config.paths.data_file)
            .save(&[original_a.clone()])
            .await
            .unwrap();

        let summary = run(&config, now()).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                existing: 1,
                fetched: 2,
                total: 2
            }
        );

        let stored = Store::new(&config.paths.data_file).load().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], original_a);
        assert_eq!(stored[1].link, "https://x/b");
        assert!(stored.iter().all(|a| a.link != "https://x/bad"));

        let page = std::fs::read_to_string(&config.paths.output_html).unwrap();
        assert!(page.contains(r#"<span id="total-count">2</span> articles"#));
        assert!(page.contains("Original a"));
        assert!(!page.contains("https://x/bad"));
    }

    #[tokio::test]
    async fn test_run_with_nothing_renders_empty_state() {
        let dir = TempDir::new().unwrap();
        let mut server = mockito::Server::new_async().await;
        let _empty = server
            .mock("GET", "/rss")
            .match_query(Matcher::Any)
            .with_body(feed(&[]))
            .expect(2)
            .create_async()
            .await;

        let config = config(&dir, format!("{}/rss", server.url()));
        let summary = run(&config, now()).await.unwrap();

        assert_eq!(summary.total, 0);
        let page = std::fs::read_to_string(&config.paths.output_html).unwrap();
        assert!(page.contains("empty-state"));
        assert!(page.contains(r#"<span id="total-count">0</span> articles"#));
        assert_eq!(
            std::fs::read_to_string(&config.paths.data_file).unwrap(),
            "[]"
        );
    }

    #[tokio::test]
    async fn test_run_aborts_on_corrupt_store_without_writing_page() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, "http://127.0.0.1:1/rss".to_string());
        std::fs::create_dir_all(config.paths.data_file.parent().unwrap()).unwrap();
        std::fs::write(&config.paths.data_file, "{ not json").unwrap();

        assert!(run(&config, now()).await.is_err());
        assert!(!config.paths.output_html.exists());
    }
}
