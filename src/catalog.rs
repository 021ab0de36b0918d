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

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::model::QuestionRecord;
use crate::model::QuestionSet;
use crate::model::SiteStatus;

/// A validated question catalog: set ids are unique, question ids are unique,
/// every question belongs to a known set and set counts match the questions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    sets: Vec<QuestionSet>,
    questions: Vec<QuestionRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    sets: Vec<QuestionSet>,
    #[serde(default)]
    questions: Vec<QuestionRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PracticeSite {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub status: SiteStatus,
    pub catalog: Catalog,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSite {
    id: String,
    title: String,
    subject: String,
    #[serde(default = "default_status")]
    status: SiteStatus,
    #[serde(flatten)]
    catalog: RawCatalog,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSites {
    sites: Vec<RawSite>,
}

/// Keys that mark a file as describing a site rather than a bare catalog.
const SITE_KEYS: [&str; 4] = ["id", "title", "subject", "status"];

fn default_status() -> SiteStatus {
    SiteStatus::Draft
}

/// What a catalog file contained: a bare catalog or one or more sites.
#[derive(Debug, Clone)]
pub enum Loaded {
    Catalog(Catalog),
    Sites(Vec<PracticeSite>),
}

impl Catalog {
    pub fn new(mut sets: Vec<QuestionSet>, questions: Vec<QuestionRecord>) -> Result<Self> {
        let mut set_ids = HashSet::new();
        for set in &sets {
            if !set_ids.insert(set.id.as_str()) {
                anyhow::bail!("duplicate question set id '{}'", set.id);
            }
        }

        let mut question_ids = HashSet::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for question in &questions {
            if !question_ids.insert(question.id.as_str()) {
                anyhow::bail!("duplicate question id '{}'", question.id);
            }
            if !set_ids.contains(question.set_id.as_str()) {
                anyhow::bail!(
                    "question '{}' references unknown set '{}'",
                    question.id,
                    question.set_id
                );
            }
            *counts.entry(question.set_id.as_str()).or_default() += 1;
        }

        for set in &mut sets {
            set.question_count = counts.get(set.id.as_str()).copied().unwrap_or(0);
        }

        Ok(Self { sets, questions })
    }

    pub fn sets(&self) -> &[QuestionSet] {
        &self.sets
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    pub fn set(&self, id: &str) -> Option<&QuestionSet> {
        self.sets.iter().find(|set| set.id == id)
    }

    pub fn question(&self, id: &str) -> Option<&QuestionRecord> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Distinct chapter labels in first-seen order, for building filter menus.
    pub fn chapters(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.questions
            .iter()
            .map(|q| q.chapter.as_str())
            .filter(|chapter| seen.insert(*chapter))
            .collect()
    }
}

impl TryFrom<RawCatalog> for Catalog {
    type Error = anyhow::Error;

    fn try_from(raw: RawCatalog) -> Result<Self> {
        Catalog::new(raw.sets, raw.questions)
    }
}

impl TryFrom<RawSite> for PracticeSite {
    type Error = anyhow::Error;

    fn try_from(raw: RawSite) -> Result<Self> {
        let catalog = Catalog::try_from(raw.catalog)
            .with_context(|| format!("validate site '{}'", raw.id))?;
        Ok(Self {
            id: raw.id,
            title: raw.title,
            subject: raw.subject,
            status: raw.status,
            catalog,
        })
    }
}

impl Loaded {
    /// Resolve to a single catalog; a multi-site file needs `site` to pick one.
    pub fn select(self, site: Option<&str>) -> Result<(Option<PracticeSite>, Catalog)> {
        match (self, site) {
            (Loaded::Catalog(catalog), None) => Ok((None, catalog)),
            (Loaded::Catalog(_), Some(id)) => {
                anyhow::bail!("catalog file has no sites; cannot select '{id}'")
            }
            (Loaded::Sites(sites), Some(id)) => {
                let site = sites
                    .into_iter()
                    .find(|s| s.id == id)
                    .ok_or_else(|| anyhow::anyhow!("site '{id}' not found in catalog"))?;
                let catalog = site.catalog.clone();
                Ok((Some(site), catalog))
            }
            (Loaded::Sites(mut sites), None) => {
                if sites.len() != 1 {
                    anyhow::bail!(
                        "catalog holds {} sites; pick one with --site",
                        sites.len()
                    );
                }
                let site = sites.remove(0);
                let catalog = site.catalog.clone();
                Ok((Some(site), catalog))
            }
        }
    }
}

/// The file shape is picked by its top-level keys, so a broken site is
/// reported as such instead of being read as a bare catalog.
pub fn parse_catalog(text: &str) -> Result<Loaded> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse catalog json")?;
    let Some(object) = value.as_object() else {
        anyhow::bail!("catalog must be a JSON object");
    };
    if object.contains_key("sites") {
        let raw: RawSites = serde_json::from_value(value).context("parse site list")?;
        let sites = raw
            .sites
            .into_iter()
            .map(PracticeSite::try_from)
            .collect::<Result<Vec<_>>>()?;
        return Ok(Loaded::Sites(sites));
    }
    if SITE_KEYS.iter().any(|key| object.contains_key(*key)) {
        let raw: RawSite =
            serde_json::from_value(value).context("catalog describes a site but it is invalid")?;
        return Ok(Loaded::Sites(vec![PracticeSite::try_from(raw)?]));
    }
    let raw: RawCatalog = serde_json::from_value(value).context("parse catalog")?;
    Ok(Loaded::Catalog(Catalog::try_from(raw)?))
}

pub fn load_catalog(path: &Path) -> Result<Loaded> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_catalog(&text).with_context(|| format!("load catalog {}", path.display()))
}
