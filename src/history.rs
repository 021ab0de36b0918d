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

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::catalog::PracticeSite;
use crate::store::KeyValueStore;

pub const HISTORY_KEY: &str = "practiceLinksHistory";
/// Oldest entries beyond this are dropped.
pub const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub link: String,
    pub last_visited: String,
}

pub fn share_link(base_url: &str, site_id: &str) -> String {
    format!("{}/practice/{site_id}", base_url.trim_end_matches('/'))
}

pub fn today() -> String {
    let date = OffsetDateTime::now_utc().date();
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn list<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<HistoryEntry>> {
    match store.get(HISTORY_KEY)? {
        Some(raw) => serde_json::from_str(&raw).context("parse visit history"),
        None => Ok(Vec::new()),
    }
}

/// Refresh the site's entry where it already sits, or put a new one first.
pub fn record_visit<S: KeyValueStore + ?Sized>(
    store: &S,
    site: &PracticeSite,
    base_url: &str,
    visited_on: &str,
) -> Result<Vec<HistoryEntry>> {
    let mut entries = list(store).unwrap_or_else(|err| {
        log::warn!("discarding unreadable visit history: {err:#}");
        Vec::new()
    });
    let entry = HistoryEntry {
        id: site.id.clone(),
        title: site.title.clone(),
        link: share_link(base_url, &site.id),
        last_visited: visited_on.to_string(),
    };
    match entries.iter_mut().find(|e| e.id == site.id) {
        Some(existing) => *existing = entry,
        None => entries.insert(0, entry),
    }
    entries.truncate(HISTORY_LIMIT);
    let text = serde_json::to_string(&entries).context("encode visit history")?;
    store.set(HISTORY_KEY, &text)?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::model::SiteStatus;
    use crate::store::MemoryStore;

    fn site(id: &str, title: &str) -> PracticeSite {
        PracticeSite {
            id: id.to_string(),
            title: title.to_string(),
            subject: "Physics".to_string(),
            status: SiteStatus::Published,
            catalog: Catalog::default(),
        }
    }

    #[test]
    fn revisit_updates_entry_in_place() -> Result<()> {
        let store = MemoryStore::default();
        record_visit(&store, &site("a", "A"), "http://localhost:8080/", "2024-01-15")?;
        record_visit(&store, &site("b", "B"), "http://localhost:8080", "2024-01-16")?;
        let entries = record_visit(&store, &site("a", "A2"), "http://localhost:8080", "2024-01-17")?;

        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(entries[1].title, "A2");
        assert_eq!(entries[1].last_visited, "2024-01-17");
        assert_eq!(entries[0].link, "http://localhost:8080/practice/b");
        assert_eq!(list(&store)?, entries);
        Ok(())
    }

    #[test]
    fn history_keeps_the_newest_twenty() -> Result<()> {
        let store = MemoryStore::default();
        for i in 0..30 {
            record_visit(&store, &site(&format!("s{i}"), "Site"), "http://x", "2024-02-01")?;
        }
        let entries = list(&store)?;
        assert_eq!(entries.len(), HISTORY_LIMIT);
        assert_eq!(entries[0].id, "s29");
        assert_eq!(entries[HISTORY_LIMIT - 1].id, "s10");
        assert!(entries.iter().all(|e| e.id != "s9"));

        // An entry that fell off comes back at the front.
        let entries = record_visit(&store, &site("s0", "Back"), "http://x", "2024-02-02")?;
        assert_eq!(entries.len(), HISTORY_LIMIT);
        assert_eq!(entries[0].id, "s0");
        assert_eq!(entries[HISTORY_LIMIT - 1].id, "s11");
        Ok(())
    }

    #[test]
    fn today_is_iso_date() {
        let day = today();
        assert_eq!(day.len(), 10);
        assert_eq!(&day[4..5], "-");
    }
}
