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

use std::collections::BTreeSet;

use serde::Serialize;

/// Which answers are expanded. `show_all` overrides the per-id set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevealState {
    pub revealed_ids: BTreeSet<String>,
    pub show_all: bool,
}

impl RevealState {
    /// Flip one id. Leaves `show_all` alone.
    pub fn toggle_reveal(&self, id: &str) -> Self {
        let mut next = self.clone();
        if !next.revealed_ids.remove(id) {
            next.revealed_ids.insert(id.to_string());
        }
        next
    }

    /// Enabling snapshots the ids visible right now; disabling clears them.
    ///
    /// The snapshot is not refreshed when filters change afterwards, only by
    /// another call to this function.
    pub fn set_show_all<'a, I>(&self, show_all: bool, visible_ids: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let revealed_ids = if show_all {
            visible_ids.into_iter().map(str::to_string).collect()
        } else {
            BTreeSet::new()
        };
        Self {
            revealed_ids,
            show_all,
        }
    }

    pub fn is_revealed(&self, id: &str) -> bool {
        self.show_all || self.revealed_ids.contains(id)
    }
}
