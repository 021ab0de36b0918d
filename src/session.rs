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

//! A practice session: filter and reveal state advanced by user actions.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::filter::FilterState;
use crate::filter::SetScope;
use crate::filter::View;
use crate::filter::compute_visible_questions;
use crate::model::QuestionType;
use crate::reveal::RevealState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectSet(SetScope),
    ToggleChapter(String),
    ToggleType(QuestionType),
    ToggleVerified,
    ClearFilters,
    ToggleReveal(String),
    SetShowAll(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub filter: FilterState,
    pub reveal: RevealState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next state; `self` is left untouched.
    pub fn apply(&self, catalog: &Catalog, action: Action) -> Self {
        match action {
            Action::SelectSet(scope) => self.with_filter(self.filter.select_set(scope)),
            Action::ToggleChapter(chapter) => self.with_filter(self.filter.toggle_chapter(&chapter)),
            Action::ToggleType(kind) => self.with_filter(self.filter.toggle_type(kind)),
            Action::ToggleVerified => self.with_filter(self.filter.toggle_verified()),
            Action::ClearFilters => self.with_filter(self.filter.clear_filters()),
            Action::ToggleReveal(id) => self.with_reveal(self.reveal.toggle_reveal(&id)),
            Action::SetShowAll(show_all) => {
                let visible = compute_visible_questions(catalog.questions(), &self.filter);
                let reveal = self
                    .reveal
                    .set_show_all(show_all, visible.iter().map(|q| q.id.as_str()));
                self.with_reveal(reveal)
            }
        }
    }

    pub fn apply_all<I>(&self, catalog: &Catalog, actions: I) -> Self
    where
        I: IntoIterator<Item = Action>,
    {
        actions
            .into_iter()
            .fold(self.clone(), |state, action| state.apply(catalog, action))
    }

    pub fn view<'a>(&self, catalog: &'a Catalog) -> View<'a> {
        crate::filter::view(catalog, &self.filter)
    }

    fn with_filter(&self, filter: FilterState) -> Self {
        Self {
            filter,
            reveal: self.reveal.clone(),
        }
    }

    fn with_reveal(&self, reveal: RevealState) -> Self {
        Self {
            filter: self.filter.clone(),
            reveal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::fixtures::mixed_catalog;

    #[test]
    fn show_all_is_scoped_to_visible_questions() {
        let catalog = mixed_catalog();
        let session = Session::new().apply_all(
            &catalog,
            [
                Action::SelectSet(SetScope::Set("1".into())),
                Action::SetShowAll(true),
            ],
        );
        assert!(session.reveal.show_all);
        assert_eq!(session.reveal.revealed_ids.len(), 8);
        assert!(
            session
                .reveal
                .revealed_ids
                .iter()
                .all(|id| catalog.question(id).is_some_and(|q| q.set_id == "1"))
        );
    }

    #[test]
    fn filter_change_after_show_all_keeps_snapshot() {
        let catalog = mixed_catalog();
        let session = Session::new().apply_all(
            &catalog,
            [
                Action::ToggleType(QuestionType::Mcq),
                Action::SetShowAll(true),
            ],
        );
        let snapshot = session.reveal.revealed_ids.clone();
        let widened = session.apply(&catalog, Action::ClearFilters);
        assert_eq!(widened.reveal.revealed_ids, snapshot);
        // Questions outside the snapshot still show while show-all is on.
        let newly_visible = widened.view(&catalog).questions();
        assert!(newly_visible.len() > snapshot.len());
        assert!(newly_visible.iter().all(|q| widened.reveal.is_revealed(&q.id)));

        let resynced = widened.apply(&catalog, Action::SetShowAll(true));
        assert_eq!(resynced.reveal.revealed_ids.len(), 24);
    }

    #[test]
    fn show_all_on_then_off_round_trips() {
        let catalog = mixed_catalog();
        let session = Session::new().apply_all(
            &catalog,
            [
                Action::ToggleReveal("q3".into()),
                Action::SetShowAll(true),
                Action::SetShowAll(false),
            ],
        );
        assert!(!session.reveal.show_all);
        assert!(session.reveal.revealed_ids.is_empty());
    }

    #[test]
    fn apply_leaves_previous_state_untouched() {
        let catalog = mixed_catalog();
        let before = Session::new();
        let after = before.apply(&catalog, Action::ToggleVerified);
        assert!(!before.filter.only_verified);
        assert!(after.filter.only_verified);
    }
}
