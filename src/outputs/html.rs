//! Static HTML page generation.
//!
//! The page is one self-contained document: inline CSS, one card per article
//! (newest first), and a small inline script that filters cards by keyword
//! without any network access.
//!
//! Every piece of feed or config text goes through `html_escape` before it is
//! written: `encode_text` for element content and
//! `encode_double_quoted_attribute` for attribute values.

use crate::config::{Config, Keyword, ALL_FILTER};
use crate::models::Article;
use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::collections::HashMap;
use std::fmt::{self, Write};
use tracing::{debug, instrument};

const EMPTY_STATE: &str = "No news found yet. The feed will populate on the next scheduled run.";

const STYLE: &str = r#"
    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }

    :root {
      --bg:       #f9fafb;
      --surface:  #ffffff;
      --border:   #e5e7eb;
      --text:     #111827;
      --muted:    #6b7280;
      --accent:   #059669;
      --radius:   10px;
      --shadow:   0 1px 3px rgba(0,0,0,.08), 0 1px 2px rgba(0,0,0,.06);
    }

    body {
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
      background: var(--bg);
      color: var(--text);
      min-height: 100vh;
      padding: 0 0 60px;
    }

    .site-header {
      background: var(--surface);
      border-bottom: 1px solid var(--border);
      padding: 24px 20px 18px;
      position: sticky;
      top: 0;
      z-index: 10;
    }
    .header-inner { max-width: 860px; margin: 0 auto; }
    .site-header h1 {
      font-size: 1.35rem;
      font-weight: 700;
      color: var(--accent);
      letter-spacing: -0.3px;
    }
    .header-meta { font-size: .78rem; color: var(--muted); margin-top: 4px; }

    .filters {
      max-width: 860px;
      margin: 20px auto 0;
      padding: 0 20px;
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }
    .filter-btn {
      border: 1.5px solid var(--border);
      background: var(--surface);
      color: var(--text);
      padding: 5px 13px;
      border-radius: 20px;
      font-size: .8rem;
      font-weight: 500;
      cursor: pointer;
      transition: all .15s;
      display: inline-flex;
      align-items: center;
      gap: 5px;
    }
    .filter-btn:hover { border-color: var(--accent); color: var(--accent); }
    .filter-btn.active {
      background: var(--kw-bg, var(--accent));
      color: var(--kw-fg, #fff);
      border-color: transparent;
    }
    .filter-btn .count {
      background: rgba(0,0,0,.08);
      border-radius: 10px;
      padding: 1px 6px;
      font-size: .72rem;
    }

    .articles-container {
      max-width: 860px;
      margin: 22px auto 0;
      padding: 0 20px;
      display: grid;
      grid-template-columns: 1fr;
      gap: 14px;
    }

    .article-card {
      background: var(--surface);
      border: 1px solid var(--border);
      border-radius: var(--radius);
      padding: 16px 18px;
      box-shadow: var(--shadow);
      transition: box-shadow .15s;
    }
    .article-card:hover { box-shadow: 0 4px 12px rgba(0,0,0,.1); }
    .article-card.hidden { display: none; }

    .card-header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      margin-bottom: 8px;
    }
    .badge {
      font-size: .7rem;
      font-weight: 600;
      padding: 2px 9px;
      border-radius: 12px;
      letter-spacing: .3px;
      text-transform: uppercase;
    }
    .pub-date { font-size: .75rem; color: var(--muted); }

    .article-title { font-size: .95rem; font-weight: 600; line-height: 1.4; margin-bottom: 7px; }
    .article-title a { color: var(--text); text-decoration: none; }
    .article-title a:hover { color: var(--accent); text-decoration: underline; }

    .article-desc {
      font-size: .83rem;
      color: var(--muted);
      line-height: 1.55;
      margin-bottom: 10px;
      display: -webkit-box;
      -webkit-line-clamp: 2;
      -webkit-box-orient: vertical;
      overflow: hidden;
    }

    .card-footer { font-size: .75rem; color: var(--muted); }
    .source-name { font-weight: 500; }

    .empty-state { text-align: center; padding: 60px 20px; color: var(--muted); }

    @media (min-width: 600px) {
      .articles-container { grid-template-columns: 1fr 1fr; }
    }
"#;

const SCRIPT: &str = r#"
  function filterBy(keyword, btn) {
    document.querySelectorAll('.filter-btn').forEach(b => b.classList.remove('active'));
    if (btn) btn.classList.add('active');

    document.querySelectorAll('.article-card').forEach(card => {
      const show = keyword === 'all' || card.dataset.keyword === keyword;
      card.classList.toggle('hidden', !show);
    });
  }

  document.querySelectorAll('.filter-btn').forEach(btn => {
    btn.addEventListener('click', () => filterBy(btn.dataset.filter, btn));
  });
"#;

/// Group articles by their stored keyword, in configured keyword order.
///
/// Articles whose keyword is unset or no longer configured belong to no group.
pub fn group_by_keyword<'a>(
    config: &'a Config,
    articles: &'a [Article],
) -> Vec<(&'a Keyword, Vec<&'a Article>)> {
    config
        .keywords
        .iter()
        .map(|keyword| {
            let members = articles
                .iter()
                .filter(|a| a.keyword.as_deref() == Some(keyword.label.as_str()))
                .collect();
            (keyword, members)
        })
        .collect()
}

/// Map each link to the first keyword group containing it.
fn badge_lookup<'a>(groups: &[(&'a Keyword, Vec<&'a Article>)]) -> HashMap<&'a str, &'a Keyword> {
    let mut lookup = HashMap::new();
    for (keyword, members) in groups {
        for &article in members {
            lookup.entry(article.link.as_str()).or_insert(*keyword);
        }
    }
    lookup
}

/// Renders the article page for one configuration.
#[derive(Debug)]
pub struct HtmlRenderer<'a> {
    config: &'a Config,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Render the full page for `articles`, stamped with `generated_at`.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub fn render(&self, articles: &[Article], generated_at: DateTime<Utc>) -> Result<String, fmt::Error> {
        let groups = group_by_keyword(self.config, articles);
        let badges = badge_lookup(&groups);

        let mut sorted: Vec<&Article> = articles.iter().collect();
        sorted.sort_by(|a, b| b.published.cmp(&a.published));

        let mut html = String::new();
        self.write_head(&mut html)?;
        self.write_header(&mut html, articles.len(), generated_at)?;
        self.write_filters(&mut html, articles.len(), &groups)?;

        writeln!(html, r#"<div class="articles-container" id="articles-container">"#)?;
        if sorted.is_empty() {
            writeln!(
                html,
                r#"  <div class="empty-state"><p>{}</p></div>"#,
                EMPTY_STATE
            )?;
        }
        let default_keyword = self.config.keywords.first();
        for article in &sorted {
            let keyword = badges.get(article.link.as_str()).copied().or(default_keyword);
            write_card(&mut html, article, keyword)?;
        }
        writeln!(html, "</div>\n")?;

        writeln!(html, "<script>{SCRIPT}</script>\n")?;
        writeln!(html, "</body>\n</html>")?;

        debug!(bytes = html.len(), "Rendered HTML page");
        Ok(html)
    }

    fn write_head(&self, html: &mut String) -> fmt::Result {
        writeln!(html, "<!DOCTYPE html>")?;
        writeln!(html, r#"<html lang="en">"#)?;
        writeln!(html, "<head>")?;
        writeln!(html, r#"  <meta charset="UTF-8" />"#)?;
        writeln!(
            html,
            r#"  <meta name="viewport" content="width=device-width, initial-scale=1.0" />"#
        )?;
        writeln!(html, "  <title>{}</title>", encode_text(&self.config.title))?;
        writeln!(html, "  <style>{STYLE}  </style>")?;
        writeln!(html, "</head>")?;
        writeln!(html, "<body>\n")
    }

    fn write_header(&self, html: &mut String, total: usize, generated_at: DateTime<Utc>) -> fmt::Result {
        let plural = if total == 1 { "" } else { "s" };
        writeln!(html, r#"<header class="site-header">"#)?;
        writeln!(html, r#"  <div class="header-inner">"#)?;
        writeln!(html, "    <h1>{}</h1>", encode_text(&self.config.title))?;
        writeln!(html, r#"    <p class="header-meta">"#)?;
        writeln!(
            html,
            r#"      <span id="total-count">{total}</span> article{plural} from the last {} days"#,
            self.config.lookback_days
        )?;
        writeln!(
            html,
            "      &nbsp;·&nbsp; Updated {}",
            generated_at.format("%B %-d, %Y at %H:%M UTC")
        )?;
        writeln!(html, "    </p>")?;
        writeln!(html, "  </div>")?;
        writeln!(html, "</header>\n")
    }

    fn write_filters(
        &self,
        html: &mut String,
        total: usize,
        groups: &[(&Keyword, Vec<&Article>)],
    ) -> fmt::Result {
        writeln!(html, r#"<div class="filters">"#)?;
        writeln!(
            html,
            r#"  <button class="filter-btn active" data-filter="{ALL_FILTER}">All <span class="count">{total}</span></button>"#
        )?;
        for (keyword, members) in groups {
            let (bg, fg) = keyword.badge_colors();
            writeln!(
                html,
                r#"  <button class="filter-btn" data-filter="{}" style="--kw-bg:{};--kw-fg:{}">{} <span class="count">{}</span></button>"#,
                encode_double_quoted_attribute(&keyword.label),
                encode_double_quoted_attribute(bg),
                encode_double_quoted_attribute(fg),
                encode_text(&keyword.label),
                members.len()
            )?;
        }
        writeln!(html, "</div>\n")
    }
}

fn write_card(html: &mut String, article: &Article, keyword: Option<&Keyword>) -> fmt::Result {
    let label = keyword.map(|k| k.label.as_str()).unwrap_or_default();

    writeln!(
        html,
        r#"  <div class="article-card" data-keyword="{}">"#,
        encode_double_quoted_attribute(label)
    )?;
    writeln!(html, r#"    <div class="card-header">"#)?;
    if let Some(keyword) = keyword {
        let (bg, fg) = keyword.badge_colors();
        writeln!(
            html,
            r#"      <span class="badge" style="background:{};color:{}">{}</span>"#,
            encode_double_quoted_attribute(bg),
            encode_double_quoted_attribute(fg),
            encode_text(label)
        )?;
    }
    writeln!(
        html,
        r#"      <span class="pub-date">{}</span>"#,
        article.published.format("%b %-d, %Y")
    )?;
    writeln!(html, "    </div>")?;
    writeln!(html, r#"    <h3 class="article-title">"#)?;
    writeln!(
        html,
        r#"      <a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
        encode_double_quoted_attribute(&article.link),
        encode_text(&article.title)
    )?;
    writeln!(html, "    </h3>")?;
    if !article.description.is_empty() {
        writeln!(
            html,
            r#"    <p class="article-desc">{}</p>"#,
            encode_text(&article.description)
        )?;
    }
    writeln!(html, r#"    <div class="card-footer">"#)?;
    writeln!(
        html,
        r#"      <span class="source-name">📰 {}</span>"#,
        encode_text(article.source_name())
    )?;
    writeln!(html, "    </div>")?;
    writeln!(html, "  </div>")
}
