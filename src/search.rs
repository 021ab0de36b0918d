// Copyright 2026 Pracsite Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Video search collaborators.
//!
//! [`FunctionClient`] posts `{query, subject}` to a hosted search function.
//! [`YouTubeSearch`] performs the same work against the YouTube Data API:
//! keyword search ordered by view count, a details lookup for duration and
//! statistics, then one video per duration bucket.

use std::time::Duration;

use log::debug;
use log::info;
use log::warn;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::model::DurationCategory;
use crate::model::VideoSearchResult;
use crate::model::YouTubeVideo;

/// Videos shorter than this are `short`.
pub const SHORT_MAX_SECS: u64 = 240;
/// Videos up to and including this length are `medium`; longer are `long`.
pub const MEDIUM_MAX_SECS: u64 = 1200;

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("couldn't load videos: {0}")]
    Unreachable(String),
    #[error("video search failed: {error}{}", details_suffix(.details))]
    Collaborator {
        error: String,
        details: Option<String>,
    },
    #[error("malformed video search response: {0}")]
    Malformed(String),
    #[error("invalid video search request: {0}")]
    InvalidRequest(String),
}

fn details_suffix(details: &Option<String>) -> String {
    details
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

pub trait VideoSearch {
    fn search(&self, query: &str, subject: Option<&str>) -> Result<VideoSearchResult, SearchError>;
}

pub fn categorize_duration(seconds: u64) -> DurationCategory {
    if seconds < SHORT_MAX_SECS {
        DurationCategory::Short
    } else if seconds <= MEDIUM_MAX_SECS {
        DurationCategory::Medium
    } else {
        DurationCategory::Long
    }
}

/// Seconds in an ISO-8601 `PT#H#M#S` duration. Anything unparseable is 0.
pub fn parse_iso_duration(text: &str) -> u64 {
    let Some(start) = text.find("PT") else {
        return 0;
    };
    let mut total = 0u64;
    let mut digits = String::new();
    // Units must appear in H, M, S order.
    let mut allowed: &[char] = &['H', 'M', 'S'];
    for ch in text[start + 2..].chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let Some(pos) = allowed.iter().position(|u| *u == ch) else {
            break;
        };
        if digits.is_empty() {
            break;
        }
        let value: u64 = digits.parse().unwrap_or(0);
        let seconds = match ch {
            'H' => value.saturating_mul(3600),
            'M' => value.saturating_mul(60),
            _ => value,
        };
        total = total.saturating_add(seconds);
        digits.clear();
        allowed = &allowed[pos + 1..];
    }
    total
}

pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

pub fn format_view_count(count: &str) -> String {
    let num: u64 = count.trim().parse().unwrap_or(0);
    if num >= 1_000_000 {
        format!("{:.1}M views", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K views", num as f64 / 1_000.0)
    } else {
        format!("{num} views")
    }
}

/// Decode a collaborator body. Slots that are missing or do not decode are
/// treated as absent; an `error` field is surfaced as a failure.
pub fn decode_function_body(body: &Value) -> Result<VideoSearchResult, SearchError> {
    let Some(obj) = body.as_object() else {
        return Ok(VideoSearchResult::default());
    };
    if let Some(error) = obj.get("error").filter(|v| !v.is_null()) {
        let error = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        let details = obj
            .get("details")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Err(SearchError::Collaborator { error, details });
    }
    let slot = |name: &str| {
        obj.get(name)
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::from_value::<YouTubeVideo>(v.clone()).ok())
    };
    Ok(VideoSearchResult {
        short: slot("short"),
        medium: slot("medium"),
        long: slot("long"),
    })
}

#[derive(Debug, Serialize)]
struct FunctionRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<&'a str>,
}

pub struct FunctionClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl FunctionClient {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }
}

impl VideoSearch for FunctionClient {
    fn search(&self, query: &str, subject: Option<&str>) -> Result<VideoSearchResult, SearchError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&FunctionRequest { query, subject });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .map_err(|err| SearchError::Unreachable(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|err| SearchError::Unreachable(err.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("search function returned {status}"));
            warn!("video search function returned {status}: {message}");
            return Err(SearchError::Unreachable(message));
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|err| SearchError::Malformed(err.to_string()))?;
        decode_function_body(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchList {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoList {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    content_details: ContentDetails,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
}

impl VideoItem {
    fn into_video(self) -> YouTubeVideo {
        let seconds = parse_iso_duration(&self.content_details.duration);
        let thumbnail_url = self
            .snippet
            .thumbnails
            .medium
            .or(self.snippet.thumbnails.default)
            .map(|t| t.url)
            .unwrap_or_default();
        YouTubeVideo {
            url: format!("https://www.youtube.com/watch?v={}", self.id),
            id: self.id,
            title: self.snippet.title,
            thumbnail_url,
            channel_title: self.snippet.channel_title,
            view_count_display: format_view_count(
                self.statistics.view_count.as_deref().unwrap_or("0"),
            ),
            duration_display: format_duration(seconds),
            duration_category: categorize_duration(seconds),
        }
    }
}

/// First video of each bucket, in the order given.
pub fn pick_by_category(videos: Vec<YouTubeVideo>) -> VideoSearchResult {
    let mut result = VideoSearchResult::default();
    for video in videos {
        let slot = match video.duration_category {
            DurationCategory::Short => &mut result.short,
            DurationCategory::Medium => &mut result.medium,
            DurationCategory::Long => &mut result.long,
        };
        if slot.is_none() {
            *slot = Some(video);
        }
    }
    result
}

pub struct YouTubeSearch {
    client: Client,
    base_url: String,
    api_key: String,
    max_results: usize,
}

impl YouTubeSearch {
    pub fn new(
        base_url: &str,
        api_key: String,
        max_results: usize,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_results,
        })
    }

    fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, SearchError> {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .map_err(|err| SearchError::Unreachable(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|err| SearchError::Unreachable(err.to_string()))?;
        if !status.is_success() {
            let details = serde_json::from_str::<ApiError>(&text)
                .ok()
                .and_then(|e| e.error)
                .and_then(|e| e.message);
            warn!("youtube {path} returned {status}: {details:?}");
            // Only a Google error object counts as a refusal; anything else is an outage.
            return Err(match details {
                Some(details) => SearchError::Collaborator {
                    error: "YouTube API error".to_string(),
                    details: Some(details),
                },
                None => SearchError::Unreachable(format!("youtube {path} returned {status}")),
            });
        }
        serde_json::from_str(&text).map_err(|err| SearchError::Malformed(err.to_string()))
    }
}

impl VideoSearch for YouTubeSearch {
    fn search(&self, query: &str, subject: Option<&str>) -> Result<VideoSearchResult, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidRequest("Query is required".to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(SearchError::InvalidRequest(
                "YouTube API key not configured".to_string(),
            ));
        }

        let search_query = format!("{query} {} tutorial explanation", subject.unwrap_or(""))
            .trim()
            .to_string();
        info!("searching youtube for: {search_query}");

        let max_results = self.max_results.to_string();
        let body = self.get_json(
            "search",
            &[
                ("part", "snippet"),
                ("q", &search_query),
                ("type", "video"),
                ("maxResults", &max_results),
                ("order", "viewCount"),
                ("relevanceLanguage", "en"),
            ],
        )?;
        let list: SearchList =
            serde_json::from_value(body).map_err(|err| SearchError::Malformed(err.to_string()))?;
        let ids: Vec<String> = list
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();
        if ids.is_empty() {
            debug!("no videos found for: {search_query}");
            return Ok(VideoSearchResult::default());
        }

        let joined = ids.join(",");
        let body = self.get_json(
            "videos",
            &[("part", "contentDetails,statistics,snippet"), ("id", &joined)],
        )?;
        let details: VideoList =
            serde_json::from_value(body).map_err(|err| SearchError::Malformed(err.to_string()))?;
        let videos = details
            .items
            .into_iter()
            .map(VideoItem::into_video)
            .collect();
        Ok(pick_by_category(videos))
    }
}
