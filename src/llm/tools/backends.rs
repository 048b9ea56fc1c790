//! 工具后端 - 可替换的搜索与地理编码数据源
//!
//! 管线通过这两个trait与第三方服务隔离，测试时注入fake实现。

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

use crate::config::GeocodeConfig;

const USER_AGENT: &str = concat!("tripforge-rs/", env!("CARGO_PKG_VERSION"));
const SEARCH_TIMEOUT_SECONDS: u64 = 20;

/// 单条搜索结果
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// 网页搜索后端
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// 地理编码后端，成功时返回(纬度, 经度)
#[async_trait]
pub trait GeocodeBackend: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Option<(f64, f64)>>;
}

static RESULT_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).unwrap()
});
static RESULT_SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="result__snippet"[^>]*>(.*?)</a>"#).unwrap()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// 去掉HTML标签并还原常见实体
fn strip_html(fragment: &str) -> String {
    let text = TAG_RE.replace_all(fragment, "");
    text.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .trim()
        .to_string()
}

/// DuckDuckGo HTML端点搜索后端
pub struct DuckDuckGoBackend {
    http: reqwest::Client,
}

impl DuckDuckGoBackend {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECONDS))
            .build()
            .context("Failed to build search http client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoBackend {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .http
            .get("https://html.duckduckgo.com/html/")
            .query(&[("q", query)])
            .send()
            .await
            .context("Search request failed")?
            .error_for_status()
            .context("Search request rejected")?;

        let body = response.text().await.context("Search response unreadable")?;

        let snippets: Vec<String> = RESULT_SNIPPET_RE
            .captures_iter(&body)
            .map(|cap| strip_html(&cap[1]))
            .collect();

        let mut hits = Vec::new();
        for (index, cap) in RESULT_LINK_RE.captures_iter(&body).enumerate() {
            if hits.len() >= max_results {
                break;
            }
            let url = strip_html(&cap[1]);
            let title = strip_html(&cap[2]);
            if title.is_empty() {
                continue;
            }
            let snippet = snippets.get(index).cloned().unwrap_or_default();
            hits.push(SearchHit {
                title,
                snippet,
                url,
            });
        }

        Ok(hits)
    }
}

/// Nominatim返回的地点条目，只取坐标字段
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// OpenStreetMap Nominatim地理编码后端
pub struct NominatimBackend {
    http: reqwest::Client,
    endpoint: String,
}

impl NominatimBackend {
    pub fn new(config: &GeocodeConfig) -> Result<Self> {
        // Nominatim使用条款要求带可识别的User-Agent
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build geocode http client")?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GeocodeBackend for NominatimBackend {
    async fn lookup(&self, query: &str) -> Result<Option<(f64, f64)>> {
        let url = format!("{}/search", self.endpoint);
        let places: Vec<NominatimPlace> = self
            .http
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .context("Geocode request failed")?
            .error_for_status()
            .context("Geocode request rejected")?
            .json()
            .await
            .context("Geocode response unreadable")?;

        let Some(place) = places.first() else {
            return Ok(None);
        };

        let latitude: f64 = place.lat.trim().parse().context("Invalid latitude")?;
        let longitude: f64 = place.lon.trim().parse().context("Invalid longitude")?;
        Ok(Some((latitude, longitude)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_removes_tags_and_entities() {
        let fragment = r#"<b>Eiffel</b> Tower &amp; the <i>Champ de Mars</i>&nbsp;"#;
        assert_eq!(strip_html(fragment), "Eiffel Tower & the Champ de Mars");
    }

    #[test]
    fn test_result_regexes_extract_pairs() {
        let body = r##"
            <a rel="nofollow" class="result__a" href="https://example.com/a">First <b>Place</b></a>
            <a class="result__snippet" href="#">Snippet one</a>
            <a rel="nofollow" class="result__a" href="https://example.com/b">Second</a>
            <a class="result__snippet" href="#">Snippet two</a>
        "##;

        let titles: Vec<String> = RESULT_LINK_RE
            .captures_iter(body)
            .map(|cap| strip_html(&cap[2]))
            .collect();
        let snippets: Vec<String> = RESULT_SNIPPET_RE
            .captures_iter(body)
            .map(|cap| strip_html(&cap[1]))
            .collect();

        assert_eq!(titles, vec!["First Place", "Second"]);
        assert_eq!(snippets, vec!["Snippet one", "Snippet two"]);
    }
}
