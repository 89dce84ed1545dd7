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

//! Adapter over the `rs-fsrs` implementation of the Free Spaced Repetition
//! Scheduler. All of the memory-model arithmetic happens in that crate; this
//! module only translates between its card shape and ours.

use rs_fsrs::Card;
use rs_fsrs::FSRS;
use rs_fsrs::Parameters;
use rs_fsrs::Rating;
use rs_fsrs::State;
use serde::Deserialize;

use crate::scheduler::PreviewEntry;
use crate::scheduler::ReviewLog;
use crate::scheduler::ReviewOutcome;
use crate::scheduler::SchedulerPreview;
use crate::scheduler::Strategy;
use crate::types::grade::Grade;
use crate::types::item::LearningItem;
use crate::types::memory_state::CardState;
use crate::types::memory_state::MemoryState;
use crate::types::timestamp::Timestamp;

/// FSRS settings. Randomisation and short-term steps are explicit here
/// rather than left to the library's defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FsrsConfig {
    /// The desired recall probability at the due date.
    pub request_retention: f64,
    /// The longest interval, in days.
    pub maximum_interval: i32,
    /// Randomise intervals slightly so that cards learned together drift
    /// apart.
    pub enable_fuzz: bool,
    /// Use minute-scale learning steps for new and lapsed cards.
    pub enable_short_term: bool,
}

impl Default for FsrsConfig {
    fn default() -> Self {
        Self {
            request_retention: 0.9,
            maximum_interval: 36500,
            enable_fuzz: false,
            enable_short_term: true,
        }
    }
}

pub struct FsrsScheduler {
    fsrs: FSRS,
}

impl FsrsScheduler {
    pub fn new(config: FsrsConfig) -> Self {
        log::debug!(
            "FSRS: retention={} max_interval={} fuzz={} short_term={}",
            config.request_retention,
            config.maximum_interval,
            config.enable_fuzz,
            config.enable_short_term
        );
        let parameters = Parameters {
            request_retention: config.request_retention,
            maximum_interval: config.maximum_interval,
            enable_fuzz: config.enable_fuzz,
            enable_short_term: config.enable_short_term,
            ..Default::default()
        };
        Self {
            fsrs: FSRS::new(parameters),
        }
    }

    fn outcome(
        &self,
        item: &LearningItem,
        grade: Grade,
        card: &Card,
        now: Timestamp,
    ) -> ReviewOutcome {
        let memory = from_card(card, now);
        let elapsed_days = match item.memory.state {
            CardState::New => 0.0,
            _ => item
                .memory
                .last_review
                .map(|last| last.days_until(now).max(0.0))
                .unwrap_or(0.0),
        };
        let log = ReviewLog {
            grade,
            state: item.memory.state,
            elapsed_days,
            scheduled_days: memory.scheduled_days,
            reviewed_at: now,
        };
        ReviewOutcome {
            next_review: memory.due,
            interval_days: now.days_until(memory.due),
            grade,
            log: Some(log),
            item: item.clone().with_memory(memory),
        }
    }
}

impl Strategy for FsrsScheduler {
    fn preview(&self, item: &LearningItem, now: Timestamp) -> SchedulerPreview {
        let record_log = self.fsrs.repeat(to_card(&item.memory), now.into_inner());
        SchedulerPreview::from_fn(|grade| {
            let info = &record_log[&to_rating(grade)];
            let outcome = self.outcome(item, grade, &info.card, now);
            PreviewEntry {
                label: grade.as_str().to_string(),
                next_review: outcome.next_review,
                interval_days: outcome.interval_days,
            }
        })
    }

    fn apply_rating(&self, item: &LearningItem, grade: Grade, now: Timestamp) -> ReviewOutcome {
        let record_log = self.fsrs.repeat(to_card(&item.memory), now.into_inner());
        let info = &record_log[&to_rating(grade)];
        self.outcome(item, grade, &info.card, now)
    }
}

fn to_rating(grade: Grade) -> Rating {
    match grade {
        Grade::Again => Rating::Again,
        Grade::Hard => Rating::Hard,
        Grade::Good => Rating::Good,
        Grade::Easy => Rating::Easy,
    }
}

fn to_state(state: CardState) -> State {
    match state {
        CardState::New => State::New,
        CardState::Learning => State::Learning,
        CardState::Review => State::Review,
        CardState::Relearning => State::Relearning,
    }
}

fn from_state(state: &State) -> CardState {
    match state {
        State::New => CardState::New,
        State::Learning => CardState::Learning,
        State::Review => CardState::Review,
        State::Relearning => CardState::Relearning,
    }
}

fn to_card(memory: &MemoryState) -> Card {
    let mut card = Card::new();
    card.state = to_state(memory.state);
    card.due = memory.due.into_inner();
    card.stability = memory.stability.max(0.0);
    card.difficulty = memory.difficulty.max(0.0);
    card.scheduled_days = memory.scheduled_days.round() as i64;
    card.reps = i32::try_from(memory.reps).unwrap_or(i32::MAX);
    card.lapses = i32::try_from(memory.lapses).unwrap_or(i32::MAX);
    // The library derives elapsed time from `last_review`; a card that has
    // never been reviewed has no meaningful value, so use its due date.
    card.last_review = memory.last_review.unwrap_or(memory.due).into_inner();
    card
}

fn from_card(card: &Card, now: Timestamp) -> MemoryState {
    MemoryState {
        state: from_state(&card.state),
        due: Timestamp::new(card.due),
        stability: card.stability,
        difficulty: card.difficulty,
        scheduled_days: card.scheduled_days as f64,
        reps: u32::try_from(card.reps).unwrap_or(0),
        lapses: u32::try_from(card.lapses).unwrap_or(0),
        last_review: Some(now),
    }
}
