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

use std::path::Path;

use recallq::error::Fallible;
use recallq::error::fail;
use recallq::types::item::LearningItem;
use recallq::types::timestamp::Timestamp;

use crate::cmd::open_storage;

pub fn add_item(
    db_path: &Path,
    deck: &str,
    front: &str,
    back: &str,
    tags: Vec<String>,
) -> Fallible<()> {
    if front.trim().is_empty() {
        return fail("the front of an item cannot be empty.");
    }
    let mut storage = open_storage(db_path)?;
    let item = LearningItem::new(deck, front, back, Timestamp::now()).with_tags(tags);
    storage.insert_item(&item)?;
    if item.needs_filling {
        eprintln!("Item has no answer yet; it will not be queued until one is added.");
    }
    println!("{}", item.id);
    Ok(())
}
