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

use std::collections::BTreeMap;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::storage::ItemUpdate;
use crate::storage::Storage;
use crate::types::item::LearningItem;
use crate::types::item_id::ItemId;

/// An item collection held entirely in memory.
#[derive(Default)]
pub struct MemoryStorage {
    items: BTreeMap<ItemId, LearningItem>,
    /// The number of times `save` has been called.
    saves: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item. If an item with the same ID exists, returns an error.
    pub fn insert(&mut self, item: LearningItem) -> Fallible<()> {
        if self.items.contains_key(&item.id) {
            return Err(ErrorReport::invalid_argument(&format!(
                "duplicate item: {}",
                item.id
            )));
        }
        self.items.insert(item.id, item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl FromIterator<LearningItem> for MemoryStorage {
    fn from_iter<T: IntoIterator<Item = LearningItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().map(|item| (item.id, item)).collect(),
            saves: 0,
        }
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, id: &ItemId) -> Fallible<Option<LearningItem>> {
        Ok(self.items.get(id).cloned())
    }

    fn all_items(&self) -> Fallible<Vec<LearningItem>> {
        Ok(self.items.values().cloned().collect())
    }

    fn update_item(&mut self, id: &ItemId, update: ItemUpdate) -> Fallible<()> {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| ErrorReport::not_found(&format!("no item with ID {id}")))?;
        update.merge_into(item);
        Ok(())
    }

    fn save(&mut self) -> Fallible<()> {
        self.saves += 1;
        Ok(())
    }
}
