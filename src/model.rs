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

//! Shared domain types used across the catalog, the practice session, and
//! the video recommendation cache.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Theory,
    Numerical,
    Mcq,
}

impl QuestionType {
    pub fn as_label(self) -> &'static str {
        match self {
            QuestionType::Theory => "theory",
            QuestionType::Numerical => "numerical",
            QuestionType::Mcq => "mcq",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl FromStr for QuestionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "theory" => Ok(QuestionType::Theory),
            "numerical" => Ok(QuestionType::Numerical),
            "mcq" => Ok(QuestionType::Mcq),
            other => anyhow::bail!("unknown question type '{other}' (expected theory, numerical or mcq)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: String,
    #[serde(alias = "paperId")]
    pub set_id: String,
    pub number: u32,
    pub text: String,
    pub answer: String,
    pub chapter: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub is_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSet {
    pub id: String,
    pub title: String,
    /// Derived from the catalog on load; any stored value is replaced.
    #[serde(default)]
    pub question_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationCategory {
    Short,
    Medium,
    Long,
}

impl DurationCategory {
    pub fn as_label(self) -> &'static str {
        match self {
            DurationCategory::Short => "short",
            DurationCategory::Medium => "medium",
            DurationCategory::Long => "long",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeVideo {
    pub id: String,
    pub title: String,
    #[serde(rename = "thumbnail", alias = "thumbnailUrl")]
    pub thumbnail_url: String,
    pub channel_title: String,
    #[serde(rename = "viewCount", alias = "viewCountDisplay")]
    pub view_count_display: String,
    #[serde(rename = "duration", alias = "durationDisplay")]
    pub duration_display: String,
    pub duration_category: DurationCategory,
    pub url: String,
}

/// Up to one video per duration bucket. Absent slots serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSearchResult {
    #[serde(default)]
    pub short: Option<YouTubeVideo>,
    #[serde(default)]
    pub medium: Option<YouTubeVideo>,
    #[serde(default)]
    pub long: Option<YouTubeVideo>,
}

impl VideoSearchResult {
    pub fn is_empty(&self) -> bool {
        self.short.is_none() && self.medium.is_none() && self.long.is_none()
    }

    pub fn slot(&self, category: DurationCategory) -> Option<&YouTubeVideo> {
        match category {
            DurationCategory::Short => self.short.as_ref(),
            DurationCategory::Medium => self.medium.as_ref(),
            DurationCategory::Long => self.long.as_ref(),
        }
    }

    pub fn videos(&self) -> impl Iterator<Item = &YouTubeVideo> {
        [&self.short, &self.medium, &self.long]
            .into_iter()
            .filter_map(|slot| slot.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: VideoSearchResult,
    /// Epoch milliseconds at which `data` was stored.
    pub timestamp: i64,
}
