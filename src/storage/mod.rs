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

pub mod memory;
pub mod sqlite;

use std::collections::BTreeSet;

use crate::error::Fallible;
use crate::scheduler::ReviewOutcome;
use crate::types::item::LearningItem;
use crate::types::item_id::ItemId;
use crate::types::memory_state::MemoryState;
use crate::types::timestamp::Timestamp;

/// The item collection the scheduling core reads from and writes to.
pub trait Storage {
    /// Look up one item.
    fn get_item(&self, id: &ItemId) -> Fallible<Option<LearningItem>>;

    /// Every item in the collection, in no particular order.
    fn all_items(&self) -> Fallible<Vec<LearningItem>>;

    /// Merge `update` into the item with the given ID and set its `updated`
    /// timestamp. Fails with `NotFound` if there is no such item.
    fn update_item(&mut self, id: &ItemId, update: ItemUpdate) -> Fallible<()>;

    /// Append an applied review to the collection's history, if it keeps one.
    fn record_review(&mut self, _outcome: &ReviewOutcome) -> Fallible<()> {
        Ok(())
    }

    /// Store a rating's new memory state and its history entry together.
    /// Backends with transactions write both or neither; the default runs
    /// `update_item` then `record_review`.
    fn apply_review(
        &mut self,
        id: &ItemId,
        update: ItemUpdate,
        outcome: &ReviewOutcome,
    ) -> Fallible<()> {
        self.update_item(id, update)?;
        self.record_review(outcome)
    }

    /// Flush pending writes to durable storage.
    fn save(&mut self) -> Fallible<()>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn get_item(&self, id: &ItemId) -> Fallible<Option<LearningItem>> {
        (**self).get_item(id)
    }

    fn all_items(&self) -> Fallible<Vec<LearningItem>> {
        (**self).all_items()
    }

    fn update_item(&mut self, id: &ItemId, update: ItemUpdate) -> Fallible<()> {
        (**self).update_item(id, update)
    }

    fn record_review(&mut self, outcome: &ReviewOutcome) -> Fallible<()> {
        (**self).record_review(outcome)
    }

    fn apply_review(
        &mut self,
        id: &ItemId,
        update: ItemUpdate,
        outcome: &ReviewOutcome,
    ) -> Fallible<()> {
        (**self).apply_review(id, update, outcome)
    }

    fn save(&mut self) -> Fallible<()> {
        (**self).save()
    }
}

/// A partial update: fields left as `None` are kept.
#[derive(Clone, Debug)]
pub struct ItemUpdate {
    pub memory: Option<MemoryState>,
    pub tags: Option<BTreeSet<String>>,
    pub needs_filling: Option<bool>,
    pub updated_at: Timestamp,
}

impl ItemUpdate {
    pub fn memory(memory: MemoryState, updated_at: Timestamp) -> Self {
        Self {
            memory: Some(memory),
            tags: None,
            needs_filling: None,
            updated_at,
        }
    }

    /// Apply this update to an in-memory item.
    pub fn merge_into(self, item: &mut LearningItem) {
        if let Some(memory) = self.memory {
            item.memory = memory;
        }
        if let Some(tags) = self.tags {
            item.tags = tags;
        }
        if let Some(needs_filling) = self.needs_filling {
            item.needs_filling = needs_filling;
        }
        item.updated = self.updated_at;
    }
}
