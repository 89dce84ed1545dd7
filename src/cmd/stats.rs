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
use std::path::Path;

use serde::Serialize;

use recallq::error::Fallible;
use recallq::types::timestamp::Timestamp;

use crate::cmd::open_storage;

pub fn print_stats(db_path: &Path) -> Fallible<()> {
    let storage = open_storage(db_path)?;
    let day_ago = Timestamp::now().plus_days(-1.0);
    let stats = Stats {
        item_count: storage.item_count()?,
        items_by_state: storage.state_counts()?,
        recent_review_count: storage.reviews_since(day_ago)?,
    };
    let stats_json = serde_json::to_string_pretty(&stats)?;
    println!("{}", stats_json);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    item_count: usize,
    items_by_state: BTreeMap<String, usize>,
    /// Reviews in the last 24 hours.
    recent_review_count: usize,
}
