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

//! Compound question filters and the derived display view.
//!
//! Filtering is pure: it never reorders the catalog and every category of
//! filter narrows the result (categories are ANDed together).

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::model::QuestionRecord;
use crate::model::QuestionType;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "set_id", rename_all = "lowercase")]
pub enum SetScope {
    #[default]
    All,
    Set(String),
}

impl SetScope {
    pub fn from_arg(value: Option<&str>) -> Self {
        match value {
            None | Some("all") => SetScope::All,
            Some(id) => SetScope::Set(id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub active_set: SetScope,
    pub selected_chapters: BTreeSet<String>,
    pub selected_types: BTreeSet<QuestionType>,
    pub only_verified: bool,
}

impl FilterState {
    pub fn matches(&self, question: &QuestionRecord) -> bool {
        if let SetScope::Set(id) = &self.active_set
            && question.set_id != *id
        {
            return false;
        }
        if !self.selected_chapters.is_empty() && !self.selected_chapters.contains(&question.chapter)
        {
            return false;
        }
        if !self.selected_types.is_empty() && !self.selected_types.contains(&question.kind) {
            return false;
        }
        !self.only_verified || question.is_verified
    }

    /// Number shown on the filter badge. The active set is not a filter.
    pub fn active_filter_count(&self) -> usize {
        self.selected_chapters.len() + self.selected_types.len() + usize::from(self.only_verified)
    }

    pub fn clear_filters(&self) -> Self {
        Self {
            active_set: self.active_set.clone(),
            ..Self::default()
        }
    }

    pub fn toggle_chapter(&self, chapter: &str) -> Self {
        let mut next = self.clone();
        if !next.selected_chapters.remove(chapter) {
            next.selected_chapters.insert(chapter.to_string());
        }
        next
    }

    pub fn toggle_type(&self, kind: QuestionType) -> Self {
        let mut next = self.clone();
        if !next.selected_types.remove(&kind) {
            next.selected_types.insert(kind);
        }
        next
    }

    pub fn toggle_verified(&self) -> Self {
        Self {
            only_verified: !self.only_verified,
            ..self.clone()
        }
    }

    pub fn select_set(&self, scope: SetScope) -> Self {
        Self {
            active_set: scope,
            ..self.clone()
        }
    }
}

pub fn compute_visible_questions<'a>(
    questions: &'a [QuestionRecord],
    filter: &FilterState,
) -> Vec<&'a QuestionRecord> {
    questions.iter().filter(|q| filter.matches(q)).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SetGroup<'a> {
    pub set_id: &'a str,
    pub title: Option<&'a str>,
    pub count: usize,
    pub questions: Vec<&'a QuestionRecord>,
}

/// Partition into per-set groups in first-seen set order.
pub fn group_by_set<'a>(filtered: &[&'a QuestionRecord]) -> Vec<SetGroup<'a>> {
    let mut groups: Vec<SetGroup<'a>> = Vec::new();
    for &question in filtered {
        match groups.iter_mut().find(|g| g.set_id == question.set_id) {
            Some(group) => {
                group.questions.push(question);
                group.count += 1;
            }
            None => groups.push(SetGroup {
                set_id: &question.set_id,
                title: None,
                count: 1,
                questions: vec![question],
            }),
        }
    }
    groups
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "layout", content = "items", rename_all = "lowercase")]
pub enum View<'a> {
    Grouped(Vec<SetGroup<'a>>),
    Flat(Vec<&'a QuestionRecord>),
}

impl<'a> View<'a> {
    pub fn len(&self) -> usize {
        match self {
            View::Grouped(groups) => groups.iter().map(|g| g.count).sum(),
            View::Flat(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn questions(&self) -> Vec<&'a QuestionRecord> {
        match self {
            View::Grouped(groups) => groups
                .iter()
                .flat_map(|g| g.questions.iter().copied())
                .collect(),
            View::Flat(items) => items.clone(),
        }
    }
}

/// Grouped by set when every set is in scope, flat otherwise.
pub fn view<'a>(catalog: &'a Catalog, filter: &FilterState) -> View<'a> {
    let visible = compute_visible_questions(catalog.questions(), filter);
    match filter.active_set {
        SetScope::All => {
            let mut groups = group_by_set(&visible);
            for group in &mut groups {
                group.title = catalog.set(group.set_id).map(|s| s.title.as_str());
            }
            View::Grouped(groups)
        }
        SetScope::Set(_) => View::Flat(visible),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::catalog::Catalog;
    use crate::model::QuestionRecord;
    use crate::model::QuestionSet;
    use crate::model::QuestionType;

    const CHAPTERS: [&str; 4] = ["Laws of Motion", "Electrostatics", "Wave Optics", "Optics"];

    /// 24 records over three sets, cycling chapter, type and verification with
    /// different periods so every combination shows up.
    pub fn mixed_catalog() -> Catalog {
        let sets = ["1", "2", "3"]
            .iter()
            .map(|id| QuestionSet {
                id: id.to_string(),
                title: format!("Paper {id}"),
                question_count: 0,
            })
            .collect();
        let kinds = [QuestionType::Theory, QuestionType::Numerical, QuestionType::Mcq];
        let questions = (0..24)
            .map(|i| QuestionRecord {
                id: format!("q{i}"),
                set_id: ["1", "2", "3"][i % 3].to_string(),
                number: (i / 3 + 1) as u32,
                text: format!("Question {i}"),
                answer: format!("Answer {i}"),
                chapter: CHAPTERS[i % 4].to_string(),
                kind: kinds[(i / 2) % 3],
                is_verified: i % 5 != 0,
            })
            .collect();
        Catalog::new(sets, questions).expect("fixture catalog")
    }
}
