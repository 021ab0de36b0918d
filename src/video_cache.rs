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

//! Durable, expiring cache in front of a [`VideoSearch`] collaborator.
//!
//! Entries live in a [`KeyValueStore`] under [`CACHE_KEY_PREFIX`] as JSON
//! `{data, timestamp}`. Expiry is checked on read; the store itself never
//! expires anything. Failed searches are never cached.

use anyhow::Result;
use log::debug;
use log::info;
use log::warn;
use time::OffsetDateTime;

use crate::model::CacheEntry;
use crate::model::VideoSearchResult;
use crate::search::SearchError;
use crate::search::VideoSearch;
use crate::store::KeyValueStore;

pub const CACHE_KEY_PREFIX: &str = "youtube_videos_";
pub const DEFAULT_TTL_MS: i64 = 24 * 60 * 60 * 1000;

pub trait Clock {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

/// `youtube_videos_` followed by `"{query}_{subject}"` lower-cased with every
/// whitespace run collapsed to `_`.
pub fn cache_key(query: &str, subject: Option<&str>) -> String {
    let raw = format!("{query}_{}", subject.unwrap_or("")).to_lowercase();
    let mut normalized = String::with_capacity(raw.len());
    let mut in_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !in_space {
                normalized.push('_');
            }
            in_space = true;
        } else {
            normalized.push(ch);
            in_space = false;
        }
    }
    format!("{CACHE_KEY_PREFIX}{normalized}")
}

pub struct VideoCache<'a, S: ?Sized, C> {
    store: &'a S,
    search: &'a dyn VideoSearch,
    clock: C,
    ttl_ms: i64,
}

impl<'a, S> VideoCache<'a, S, SystemClock>
where
    S: KeyValueStore + ?Sized,
{
    pub fn new(store: &'a S, search: &'a dyn VideoSearch) -> Self {
        Self::with_clock(store, search, SystemClock)
    }
}

impl<'a, S, C> VideoCache<'a, S, C>
where
    S: KeyValueStore + ?Sized,
    C: Clock,
{
    pub fn with_clock(store: &'a S, search: &'a dyn VideoSearch, clock: C) -> Self {
        Self {
            store,
            search,
            clock,
            ttl_ms: DEFAULT_TTL_MS,
        }
    }

    pub fn ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    pub fn search_videos(
        &self,
        query: &str,
        subject: Option<&str>,
    ) -> Result<VideoSearchResult, SearchError> {
        let key = cache_key(query, subject);
        if let Some(hit) = self.cached(&key) {
            debug!("using cached video results for: {query}");
            return Ok(hit);
        }

        info!("fetching videos for: {query}");
        let result = self.search.search(query, subject)?;
        self.store_result(&key, &result);
        Ok(result)
    }

    /// Remove every cache entry and report how many were removed.
    pub fn clear_video_cache(&self) -> Result<usize> {
        clear_video_cache(self.store)
    }

    fn cached(&self, key: &str) -> Option<VideoSearchResult> {
        let raw = match self.store.get(key) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("failed to read video cache entry {key}: {err:#}");
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                debug!("ignoring unreadable video cache entry {key}: {err}");
                return None;
            }
        };
        if self.clock.now_ms() - entry.timestamp > self.ttl_ms {
            debug!("video cache entry {key} expired");
            if let Err(err) = self.store.remove(key) {
                warn!("failed to remove expired video cache entry {key}: {err:#}");
            }
            return None;
        }
        Some(entry.data)
    }

    fn store_result(&self, key: &str, data: &VideoSearchResult) {
        let entry = CacheEntry {
            data: data.clone(),
            timestamp: self.clock.now_ms(),
        };
        let stored = serde_json::to_string(&entry)
            .map_err(anyhow::Error::from)
            .and_then(|text| self.store.set(key, &text));
        if let Err(err) = stored {
            warn!("failed to cache video results: {err:#}");
        }
    }
}

pub fn clear_video_cache<S: KeyValueStore + ?Sized>(store: &S) -> Result<usize> {
    let keys = store.keys_with_prefix(CACHE_KEY_PREFIX)?;
    let mut removed = 0usize;
    for key in &keys {
        if store.remove(key)? {
            removed += 1;
        }
    }
    info!("cleared video cache: {removed} entries");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::model::DurationCategory;
    use crate::model::YouTubeVideo;
    use crate::store::MemoryStore;

    struct ManualClock<'a>(&'a Cell<i64>);

    impl Clock for ManualClock<'_> {
        fn now_ms(&self) -> i64 {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct CountingSearch {
        calls: Cell<usize>,
        fail: bool,
    }

    impl VideoSearch for CountingSearch {
        fn search(
            &self,
            query: &str,
            _subject: Option<&str>,
        ) -> Result<VideoSearchResult, SearchError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(SearchError::Unreachable("connection refused".to_string()));
            }
            Ok(VideoSearchResult {
                short: Some(YouTubeVideo {
                    id: format!("{query}-1"),
                    title: query.to_string(),
                    thumbnail_url: String::new(),
                    channel_title: "Channel".to_string(),
                    view_count_display: "10 views".to_string(),
                    duration_display: "1:00".to_string(),
                    duration_category: DurationCategory::Short,
                    url: String::new(),
                }),
                medium: None,
                long: None,
            })
        }
    }

    #[test]
    fn cache_key_normalizes_case_and_whitespace() {
        assert_eq!(
            cache_key("Momentum", Some("Laws  of\tMotion")),
            "youtube_videos_momentum_laws_of_motion"
        );
        assert_eq!(cache_key("Ohm's Law", None), "youtube_videos_ohm's_law_");
    }

    #[test]
    fn second_call_within_ttl_hits_cache_and_expiry_refetches() {
        let now = Cell::new(1_700_000_000_000);
        let store = MemoryStore::default();
        let search = CountingSearch::default();
        let cache = VideoCache::with_clock(&store, &search, ManualClock(&now));

        let first = cache
            .search_videos("momentum", Some("Laws of Motion"))
            .expect("first");
        assert_eq!(search.calls.get(), 1);

        now.set(now.get() + DEFAULT_TTL_MS);
        let second = cache
            .search_videos("momentum", Some("Laws of Motion"))
            .expect("second");
        assert_eq!(search.calls.get(), 1);
        assert_eq!(first, second);

        now.set(now.get() + 1_000);
        cache
            .search_videos("momentum", Some("Laws of Motion"))
            .expect("third");
        assert_eq!(search.calls.get(), 2);
    }

    #[test]
    fn expired_entry_is_deleted_before_refetch() {
        let now = Cell::new(0);
        let store = MemoryStore::default();
        let failing = CountingSearch {
            fail: true,
            ..Default::default()
        };
        let key = cache_key("momentum", None);
        let stale = CacheEntry {
            data: VideoSearchResult::default(),
            timestamp: -DEFAULT_TTL_MS - 1,
        };
        store
            .set(&key, &serde_json::to_string(&stale).expect("encode"))
            .expect("seed");

        let cache = VideoCache::with_clock(&store, &failing, ManualClock(&now));
        assert!(cache.search_videos("momentum", None).is_err());
        assert_eq!(store.get(&key).expect("get"), None);
    }

    #[test]
    fn failures_are_not_cached() {
        let now = Cell::new(0);
        let store = MemoryStore::default();
        let search = CountingSearch {
            fail: true,
            ..Default::default()
        };
        let cache = VideoCache::with_clock(&store, &search, ManualClock(&now));

        let err = cache.search_videos("momentum", None).unwrap_err();
        assert!(err.to_string().contains("couldn't load videos"));
        assert!(cache.search_videos("momentum", None).is_err());
        assert_eq!(search.calls.get(), 2);
        assert!(store.entries.borrow().is_empty());
    }

    #[test]
    fn storage_write_failure_still_returns_result() {
        let now = Cell::new(0);
        let store = MemoryStore {
            fail_writes: true,
            ..Default::default()
        };
        let search = CountingSearch::default();
        let cache = VideoCache::with_clock(&store, &search, ManualClock(&now));

        let result = cache.search_videos("momentum", None).expect("result");
        assert!(result.short.is_some());
        assert!(store.entries.borrow().is_empty());
    }

    #[test]
    fn unreadable_entry_counts_as_miss() {
        let now = Cell::new(0);
        let store = MemoryStore::default();
        store
            .set(&cache_key("momentum", None), "not json")
            .expect("seed");
        let search = CountingSearch::default();
        let cache = VideoCache::with_clock(&store, &search, ManualClock(&now));

        cache.search_videos("momentum", None).expect("result");
        assert_eq!(search.calls.get(), 1);
    }

    #[test]
    fn clear_removes_only_cache_namespace() -> Result<()> {
        let store = MemoryStore::default();
        store.set("youtube_videos_a_", "{}")?;
        store.set("youtube_videos_b_physics", "{}")?;
        store.set("practiceLinksHistory", "[]")?;
        store.set("theme", "dark")?;

        assert_eq!(clear_video_cache(&store)?, 2);
        assert_eq!(clear_video_cache(&store)?, 0);
        let keys: Vec<String> = store.entries.borrow().keys().cloned().collect();
        assert_eq!(keys, vec!["practiceLinksHistory".to_string(), "theme".to_string()]);
        Ok(())
    }
}
