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

use crate::clock::Clock;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::storage::Storage;
use crate::types::item::LearningItem;
use crate::types::memory_state::CardState;
use crate::types::timestamp::Timestamp;

pub const DEFAULT_LIMIT_DUE: i64 = 100;
pub const DEFAULT_LIMIT_NEW: i64 = 20;

/// Which items to select, and how many.
#[derive(Clone, Debug)]
pub struct QueueOptions {
    /// Restrict to these decks, compared case-insensitively.
    pub decks: Option<BTreeSet<String>>,
    pub limit_due: i64,
    pub limit_new: i64,
    /// Whether items in the `Learning` state may be selected.
    pub include_learning: bool,
    /// Overrides the clock.
    pub now: Option<Timestamp>,
    /// Skip items whose answer has not been written yet.
    pub exclude_empty_answers: bool,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            decks: None,
            limit_due: DEFAULT_LIMIT_DUE,
            limit_new: DEFAULT_LIMIT_NEW,
            include_learning: true,
            now: None,
            exclude_empty_answers: true,
        }
    }
}

/// A point-in-time selection of due and new items.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    due: Vec<LearningItem>,
    new: Vec<LearningItem>,
    remaining_due: usize,
    remaining_new: usize,
    total_due: usize,
    total_new: usize,
    generated_at: Timestamp,
}

impl QueueSnapshot {
    /// Select from `items` as of `now`.
    pub fn select(
        items: Vec<LearningItem>,
        options: &QueueOptions,
        now: Timestamp,
    ) -> Fallible<Self> {
        let (limit_due, limit_new) = check_limits(options)?;
        let decks: Option<BTreeSet<String>> = options
            .decks
            .as_ref()
            .map(|decks| decks.iter().map(|d| d.to_lowercase()).collect());

        let mut due: Vec<LearningItem> = Vec::new();
        let mut new: Vec<LearningItem> = Vec::new();
        for item in items {
            if options.exclude_empty_answers && item.needs_filling {
                continue;
            }
            if let Some(decks) = &decks {
                if !item.in_decks(decks) {
                    continue;
                }
            }
            if !options.include_learning && item.memory.state == CardState::Learning {
                continue;
            }
            if item.memory.state == CardState::New {
                new.push(item);
            } else if item.memory.due <= now {
                due.push(item);
            }
        }

        // Most overdue first; ties go to the least recently touched.
        due.sort_by(|a, b| {
            a.memory
                .due
                .cmp(&b.memory.due)
                .then_with(|| a.updated.cmp(&b.updated))
        });
        // Oldest first, so the items waiting longest are introduced first.
        new.sort_by(|a, b| a.created.cmp(&b.created));

        let total_due = due.len();
        let total_new = new.len();
        due.truncate(limit_due);
        new.truncate(limit_new);
        Ok(Self {
            remaining_due: total_due.saturating_sub(due.len()),
            remaining_new: total_new.saturating_sub(new.len()),
            total_due,
            total_new,
            due,
            new,
            generated_at: now,
        })
    }

    pub fn due(&self) -> &[LearningItem] {
        &self.due
    }

    pub fn new_items(&self) -> &[LearningItem] {
        &self.new
    }

    pub fn remaining_due(&self) -> usize {
        self.remaining_due
    }

    pub fn remaining_new(&self) -> usize {
        self.remaining_new
    }

    pub fn total_due(&self) -> usize {
        self.total_due
    }

    pub fn total_new(&self) -> usize {
        self.total_new
    }

    pub fn generated_at(&self) -> Timestamp {
        self.generated_at
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_empty() && self.new.is_empty()
    }

    pub(crate) fn into_lists(self) -> (Vec<LearningItem>, Vec<LearningItem>) {
        (self.due, self.new)
    }
}

fn check_limits(options: &QueueOptions) -> Fallible<(usize, usize)> {
    let err = || ErrorReport::invalid_argument("Queue limits must be non-negative.");
    let limit_due = usize::try_from(options.limit_due).map_err(|_| err())?;
    let limit_new = usize::try_from(options.limit_new).map_err(|_| err())?;
    Ok((limit_due, limit_new))
}

/// Build a queue snapshot from the storage's current contents. Performs no
/// writes.
pub fn build_queue<S: Storage + ?Sized>(
    storage: &S,
    options: &QueueOptions,
    clock: &dyn Clock,
) -> Fallible<QueueSnapshot> {
    check_limits(options)?;
    let now = options.now.unwrap_or_else(|| clock.now());
    let items = storage.all_items()?;
    let snapshot = QueueSnapshot::select(items, options, now)?;
    log::debug!(
        "Queue built: {} of {} due, {} of {} new",
        snapshot.due.len(),
        snapshot.total_due,
        snapshot.new.len(),
        snapshot.total_new
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::ErrorKind;
    use crate::storage::memory::MemoryStorage;
    use crate::types::memory_state::MemoryState;

    fn start() -> Fallible<Timestamp> {
        Timestamp::parse("2025-06-01T12:00:00Z")
    }

    /// An item in the review state, due `offset` days from `now`.
    fn reviewed(front: &str, now: Timestamp, offset: f64) -> LearningItem {
        let item = LearningItem::new("Math", front, "answer", now.plus_days(-30.0));
        let memory = MemoryState {
            state: CardState::Review,
            due: now.plus_days(offset),
            scheduled_days: 3.0,
            reps: 2,
            ..item.memory.clone()
        };
        item.with_memory(memory)
    }

    fn fresh(front: &str, created: Timestamp) -> LearningItem {
        LearningItem::new("Math", front, "answer", created)
    }

    #[test]
    fn test_limit_due_takes_most_overdue() -> Fallible<()> {
        let now = start()?;
        let storage: MemoryStorage = [
            reviewed("c", now, -1.0),
            reviewed("a", now, -3.0),
            reviewed("b", now, -2.0),
        ]
        .into_iter()
        .collect();
        let options = QueueOptions {
            limit_due: 2,
            now: Some(now),
            ..Default::default()
        };
        let snapshot = build_queue(&storage, &options, &FixedClock::new(now))?;
        let fronts: Vec<&str> = snapshot.due().iter().map(|i| i.front.as_str()).collect();
        assert_eq!(fronts, vec!["a", "b"]);
        assert_eq!(snapshot.remaining_due(), 1);
        assert_eq!(snapshot.total_due(), 3);
        Ok(())
    }

    #[test]
    fn test_negative_limits_rejected() -> Fallible<()> {
        let now = start()?;
        let storage = MemoryStorage::new();
        let clock = FixedClock::new(now);
        for (limit_due, limit_new) in [(-1, 20), (100, -1)] {
            let options = QueueOptions {
                limit_due,
                limit_new,
                ..Default::default()
            };
            let err = build_queue(&storage, &options, &clock).err();
            let err = err.ok_or_else(|| ErrorReport::new("expected an error"))?;
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            assert_eq!(err.message(), "Queue limits must be non-negative.");
        }
        Ok(())
    }

    #[test]
    fn test_due_ties_broken_by_updated() -> Fallible<()> {
        let now = start()?;
        let mut late = reviewed("late", now, -1.0);
        late.updated = now.plus_days(-1.0);
        let mut early = reviewed("early", now, -1.0);
        early.updated = now.plus_days(-2.0);
        let snapshot = QueueSnapshot::select(vec![late, early], &QueueOptions::default(), now)?;
        let fronts: Vec<&str> = snapshot.due().iter().map(|i| i.front.as_str()).collect();
        assert_eq!(fronts, vec!["early", "late"]);
        Ok(())
    }

    #[test]
    fn test_future_items_are_not_due() -> Fallible<()> {
        let now = start()?;
        let items = vec![reviewed("future", now, 1.0), reviewed("now", now, 0.0)];
        let snapshot = QueueSnapshot::select(items, &QueueOptions::default(), now)?;
        assert_eq!(snapshot.total_due(), 1);
        assert_eq!(snapshot.due()[0].front, "now");
        Ok(())
    }

    #[test]
    fn test_new_items_oldest_first_and_limited() -> Fallible<()> {
        let now = start()?;
        let items = vec![
            fresh("second", now.plus_days(-2.0)),
            fresh("third", now.plus_days(-1.0)),
            fresh("first", now.plus_days(-3.0)),
        ];
        let options = QueueOptions {
            limit_new: 2,
            ..Default::default()
        };
        let snapshot = QueueSnapshot::select(items, &options, now)?;
        let fronts: Vec<&str> = snapshot.new_items().iter().map(|i| i.front.as_str()).collect();
        assert_eq!(fronts, vec!["first", "second"]);
        assert_eq!(snapshot.remaining_new(), 1);
        assert_eq!(snapshot.total_new(), 3);
        assert!(snapshot.due().is_empty());
        Ok(())
    }

    #[test]
    fn test_deck_filter_is_case_insensitive() -> Fallible<()> {
        let now = start()?;
        let math = fresh("math", now);
        let physics = LearningItem::new("Physics", "physics", "answer", now);
        let options = QueueOptions {
            decks: Some(["MATH".to_string()].into_iter().collect()),
            ..Default::default()
        };
        let snapshot = QueueSnapshot::select(vec![math, physics], &options, now)?;
        assert_eq!(snapshot.total_new(), 1);
        assert_eq!(snapshot.new_items()[0].deck, "Math");
        Ok(())
    }

    #[test]
    fn test_excludes_items_needing_filling() -> Fallible<()> {
        let now = start()?;
        let blank = LearningItem::new("Math", "blank", "", now);
        let items = vec![blank.clone(), fresh("filled", now)];
        let snapshot = QueueSnapshot::select(items, &QueueOptions::default(), now)?;
        assert_eq!(snapshot.total_new(), 1);

        let options = QueueOptions {
            exclude_empty_answers: false,
            ..Default::default()
        };
        let snapshot = QueueSnapshot::select(vec![blank], &options, now)?;
        assert_eq!(snapshot.total_new(), 1);
        Ok(())
    }

    #[test]
    fn test_learning_items_can_be_excluded() -> Fallible<()> {
        let now = start()?;
        let mut learning = reviewed("learning", now, -0.01);
        learning.memory.state = CardState::Learning;
        let items = vec![learning.clone(), reviewed("review", now, -1.0)];
        let snapshot = QueueSnapshot::select(items.clone(), &QueueOptions::default(), now)?;
        assert_eq!(snapshot.total_due(), 2);

        let options = QueueOptions {
            include_learning: false,
            ..Default::default()
        };
        let snapshot = QueueSnapshot::select(items, &options, now)?;
        assert_eq!(snapshot.total_due(), 1);
        assert_eq!(snapshot.due()[0].front, "review");
        Ok(())
    }

    #[test]
    fn test_builder_uses_clock_when_now_unset() -> Fallible<()> {
        let now = start()?;
        let storage: MemoryStorage = [reviewed("x", now, 1.0)].into_iter().collect();
        let clock = FixedClock::new(now);
        let snapshot = build_queue(&storage, &QueueOptions::default(), &clock)?;
        assert_eq!(snapshot.total_due(), 0);
        assert_eq!(snapshot.generated_at(), now);

        clock.advance_days(2.0);
        let snapshot = build_queue(&storage, &QueueOptions::default(), &clock)?;
        assert_eq!(snapshot.total_due(), 1);
        Ok(())
    }

    #[test]
    fn test_sorted_invariants() -> Fallible<()> {
        let now = start()?;
        let mut items = Vec::new();
        for i in 0..20 {
            let offset = -((i * 7 % 5) as f64);
            let mut item = reviewed(&format!("due{i}"), now, offset);
            item.updated = now.plus_days(-((i * 3 % 4) as f64));
            items.push(item);
            items.push(fresh(&format!("new{i}"), now.plus_days(-((i * 11 % 6) as f64))));
        }
        let snapshot = QueueSnapshot::select(items, &QueueOptions::default(), now)?;
        for pair in snapshot.due().windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let ordered = a.memory.due < b.memory.due
                || (a.memory.due == b.memory.due && a.updated <= b.updated);
            assert!(ordered);
        }
        for pair in snapshot.new_items().windows(2) {
            assert!(pair[0].created <= pair[1].created);
        }
        Ok(())
    }
}
