// Copyright 2025 Fernando Borretti
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

use crate::types::item_id::ItemId;
use crate::types::memory_state::MemoryState;
use crate::types::timestamp::Timestamp;

/// A study item together with its scheduling record.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningItem {
    pub id: ItemId,
    /// The name of the deck this item belongs to.
    pub deck: String,
    pub front: String,
    pub back: String,
    pub tags: BTreeSet<String>,
    /// True when the answer side still has to be written.
    pub needs_filling: bool,
    pub memory: MemoryState,
    pub created: Timestamp,
    pub updated: Timestamp,
}

impl LearningItem {
    /// A new, never-reviewed item created at `now`.
    pub fn new(
        deck: impl Into<String>,
        front: impl Into<String>,
        back: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        let front = front.into().trim().to_string();
        let back = back.into().trim().to_string();
        Self {
            id: ItemId::for_content(&front, &back),
            deck: deck.into(),
            needs_filling: back.is_empty(),
            front,
            back,
            tags: BTreeSet::new(),
            memory: MemoryState::new_item(now),
            created: now,
            updated: now,
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_memory(mut self, memory: MemoryState) -> Self {
        self.memory = memory;
        self
    }

    /// Does this item belong to one of the given (lower-cased) decks?
    pub fn in_decks(&self, decks: &BTreeSet<String>) -> bool {
        decks.contains(&self.deck.to_lowercase())
    }
}
