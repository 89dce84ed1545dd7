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

//! The classical SuperMemo-2 interval rules, using the item's difficulty
//! field as the ease factor.

use crate::scheduler::ReviewLog;
use crate::scheduler::ReviewOutcome;
use crate::scheduler::SchedulerPreview;
use crate::scheduler::Strategy;
use crate::types::grade::Grade;
use crate::types::item::LearningItem;
use crate::types::memory_state::CardState;
use crate::types::memory_state::MemoryState;
use crate::types::timestamp::Timestamp;

/// The ease factor never drops below this.
const MIN_EASE: f64 = 1.3;

/// Relearning step after a lapse: ten minutes, in days.
const AGAIN_INTERVAL: f64 = 10.0 / 1440.0;

const AGAIN_EASE_PENALTY: f64 = 0.2;
const HARD_EASE_PENALTY: f64 = 0.15;
const EASY_EASE_BONUS: f64 = 0.15;

const HARD_INTERVAL_FACTOR: f64 = 0.5;
const EASY_INTERVAL_BONUS: f64 = 1.3;

/// The shortest interval for any passing grade, in days.
const MIN_INTERVAL: f64 = 1.0;

pub struct Sm2Scheduler;

/// Compute the memory state that follows `memory` after `grade` at `now`.
pub fn next_state(memory: &MemoryState, grade: Grade, now: Timestamp) -> MemoryState {
    let ease = memory.ease();
    let prev_interval = memory.scheduled_days.max(MIN_INTERVAL);
    let (ease, interval, reps, lapses, state) = match grade {
        Grade::Again => (
            (ease - AGAIN_EASE_PENALTY).max(MIN_EASE),
            AGAIN_INTERVAL,
            0,
            memory.lapses + 1,
            CardState::Relearning,
        ),
        Grade::Hard => (
            (ease - HARD_EASE_PENALTY).max(MIN_EASE),
            (prev_interval * HARD_INTERVAL_FACTOR).max(MIN_INTERVAL),
            memory.reps + 1,
            memory.lapses,
            CardState::Relearning,
        ),
        Grade::Good => (
            ease,
            graduated_interval(memory.reps, prev_interval * ease),
            memory.reps + 1,
            memory.lapses,
            CardState::Review,
        ),
        Grade::Easy => (
            ease + EASY_EASE_BONUS,
            graduated_interval(memory.reps, prev_interval * ease * EASY_INTERVAL_BONUS),
            memory.reps + 1,
            memory.lapses,
            CardState::Review,
        ),
    };
    let stability = if memory.stability.is_finite() && memory.stability > 0.0 {
        interval.max(memory.stability)
    } else {
        interval
    };
    MemoryState {
        state,
        due: now.plus_days(interval),
        stability,
        difficulty: ease,
        scheduled_days: interval,
        reps,
        lapses,
        last_review: Some(now),
    }
}

/// First pass: one day. Second pass: six days. After that, the grown interval.
fn graduated_interval(reps: u32, grown: f64) -> f64 {
    match reps {
        0 => 1.0,
        1 => 6.0,
        _ => grown.max(MIN_INTERVAL),
    }
}

impl Strategy for Sm2Scheduler {
    fn preview(&self, item: &LearningItem, now: Timestamp) -> SchedulerPreview {
        SchedulerPreview::from_fn(|grade| self.apply_rating(item, grade, now).preview_entry())
    }

    fn apply_rating(&self, item: &LearningItem, grade: Grade, now: Timestamp) -> ReviewOutcome {
        let memory = next_state(&item.memory, grade, now);
        let elapsed_days = item
            .memory
            .last_review
            .map(|last| last.days_until(now).max(0.0))
            .unwrap_or(0.0);
        let log = ReviewLog {
            grade,
            state: item.memory.state,
            elapsed_days,
            scheduled_days: memory.scheduled_days,
            reviewed_at: now,
        };
        ReviewOutcome {
            next_review: memory.due,
            interval_days: memory.scheduled_days,
            grade,
            log: Some(log),
            item: item.clone().with_memory(memory),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fallible;

    fn fresh(now: Timestamp) -> LearningItem {
        LearningItem::new("Math", "2 + 2", "4", now)
    }

    fn start() -> Fallible<Timestamp> {
        Timestamp::parse("2025-01-01T00:00:00Z")
    }

    #[test]
    fn test_good_progression() -> Fallible<()> {
        let now = start()?;
        let item = fresh(now);

        let first = Sm2Scheduler.apply_rating(&item, Grade::Good, now);
        assert_eq!(first.interval_days, 1.0);
        assert_eq!(first.item.memory.reps, 1);
        assert_eq!(first.item.memory.state, CardState::Review);

        let now = now.plus_days(1.0);
        let second = Sm2Scheduler.apply_rating(&first.item, Grade::Good, now);
        assert_eq!(second.interval_days, 6.0);
        assert_eq!(second.item.memory.reps, 2);

        let now = now.plus_days(6.0);
        let third = Sm2Scheduler.apply_rating(&second.item, Grade::Good, now);
        assert_eq!(third.interval_days, 6.0 * 2.5);
        assert_eq!(third.next_review, now.plus_days(15.0));
        assert_eq!(third.item.memory.difficulty, 2.5);
        Ok(())
    }

    #[test]
    fn test_again_resets_reps_and_counts_lapse() -> Fallible<()> {
        let now = start()?;
        let memory = MemoryState {
            state: CardState::Review,
            scheduled_days: 15.0,
            stability: 15.0,
            difficulty: 2.5,
            reps: 3,
            lapses: 1,
            ..MemoryState::new_item(now)
        };
        let next = next_state(&memory, Grade::Again, now);
        assert_eq!(next.reps, 0);
        assert_eq!(next.lapses, 2);
        assert_eq!(next.state, CardState::Relearning);
        assert!((next.difficulty - 2.3).abs() < 1e-9);
        assert_eq!(next.due.as_millis() - now.as_millis(), 600_000);
        // Stability never shrinks.
        assert_eq!(next.stability, 15.0);
        Ok(())
    }

    #[test]
    fn test_hard_halves_interval() -> Fallible<()> {
        let now = start()?;
        let memory = MemoryState {
            state: CardState::Review,
            scheduled_days: 10.0,
            difficulty: 2.0,
            reps: 4,
            ..MemoryState::new_item(now)
        };
        let next = next_state(&memory, Grade::Hard, now);
        assert_eq!(next.scheduled_days, 5.0);
        assert_eq!(next.state, CardState::Relearning);
        assert_eq!(next.reps, 5);
        assert!((next.difficulty - 1.85).abs() < 1e-9);
        assert_eq!(next.stability, 5.0);
        Ok(())
    }

    #[test]
    fn test_hard_interval_floor() -> Fallible<()> {
        let now = start()?;
        let next = next_state(&MemoryState::new_item(now), Grade::Hard, now);
        // Previous interval floors at 1, halved is 0.5, floored again at 1.
        assert_eq!(next.scheduled_days, 1.0);
        Ok(())
    }

    #[test]
    fn test_easy_uses_bonus() -> Fallible<()> {
        let now = start()?;
        let memory = MemoryState {
            state: CardState::Review,
            scheduled_days: 10.0,
            difficulty: 2.0,
            reps: 2,
            ..MemoryState::new_item(now)
        };
        let next = next_state(&memory, Grade::Easy, now);
        assert!((next.scheduled_days - 26.0).abs() < 1e-9);
        assert!((next.difficulty - 2.15).abs() < 1e-9);
        assert_eq!(next.state, CardState::Review);
        Ok(())
    }

    #[test]
    fn test_ease_floor() -> Fallible<()> {
        let now = start()?;
        let memory = MemoryState {
            difficulty: 1.35,
            ..MemoryState::new_item(now)
        };
        assert_eq!(next_state(&memory, Grade::Again, now).difficulty, MIN_EASE);
        assert_eq!(next_state(&memory, Grade::Hard, now).difficulty, MIN_EASE);
        Ok(())
    }

    #[test]
    fn test_input_is_not_mutated() -> Fallible<()> {
        let now = start()?;
        let item = fresh(now);
        let before = item.clone();
        let _ = Sm2Scheduler.preview(&item, now);
        let _ = Sm2Scheduler.apply_rating(&item, Grade::Easy, now);
        assert_eq!(item, before);
        Ok(())
    }

    #[test]
    fn test_log_records_elapsed_days() -> Fallible<()> {
        let now = start()?;
        let first = Sm2Scheduler.apply_rating(&fresh(now), Grade::Good, now);
        let later = now.plus_days(2.0);
        let second = Sm2Scheduler.apply_rating(&first.item, Grade::Good, later);
        let log = second.log.ok_or_else(|| crate::error::ErrorReport::new("no log"))?;
        assert_eq!(log.elapsed_days, 2.0);
        assert_eq!(log.state, CardState::Review);
        assert_eq!(log.reviewed_at, later);
        Ok(())
    }
}
