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

//! Interval scheduling. Two algorithms sit behind one closed variant:
//! an adapter over the FSRS memory model, and the classical SM-2 rules.

pub mod fsrs;
pub mod sm2;

use std::fmt::Display;
use std::fmt::Formatter;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::clock::Clock;
use crate::error::ErrorKind;
use crate::error::ErrorReport;
use crate::scheduler::fsrs::FsrsConfig;
use crate::scheduler::fsrs::FsrsScheduler;
use crate::scheduler::sm2::Sm2Scheduler;
use crate::types::grade::Grade;
use crate::types::item::LearningItem;
use crate::types::memory_state::CardState;
use crate::types::timestamp::Timestamp;

/// The contract both algorithms satisfy. Neither method mutates its input.
pub trait Strategy {
    /// The outcome of every grade, without applying any of them.
    fn preview(&self, item: &LearningItem, now: Timestamp) -> SchedulerPreview;

    /// The outcome of one grade, as a new item value.
    fn apply_rating(&self, item: &LearningItem, grade: Grade, now: Timestamp) -> ReviewOutcome;
}

/// What one grade would do to an item.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEntry {
    pub label: String,
    pub next_review: Timestamp,
    pub interval_days: f64,
}

impl PreviewEntry {
    /// A compact rendering of the interval, e.g. "10m" or "3w".
    pub fn interval_label(&self) -> String {
        format_interval(self.interval_days)
    }
}

/// The outcome of each of the four grades.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerPreview {
    pub again: PreviewEntry,
    pub hard: PreviewEntry,
    pub good: PreviewEntry,
    pub easy: PreviewEntry,
}

impl SchedulerPreview {
    pub fn from_fn(mut f: impl FnMut(Grade) -> PreviewEntry) -> Self {
        Self {
            again: f(Grade::Again),
            hard: f(Grade::Hard),
            good: f(Grade::Good),
            easy: f(Grade::Easy),
        }
    }

    pub fn get(&self, grade: Grade) -> &PreviewEntry {
        match grade {
            Grade::Again => &self.again,
            Grade::Hard => &self.hard,
            Grade::Good => &self.good,
            Grade::Easy => &self.easy,
        }
    }
}

/// Bookkeeping for one applied review.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLog {
    pub grade: Grade,
    /// The item's state before the review.
    pub state: CardState,
    /// Days since the previous review, zero for a first review.
    pub elapsed_days: f64,
    pub scheduled_days: f64,
    pub reviewed_at: Timestamp,
}

/// The result of grading an item.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    /// A copy of the input item carrying its new memory state.
    pub item: LearningItem,
    pub grade: Grade,
    pub next_review: Timestamp,
    pub interval_days: f64,
    pub log: Option<ReviewLog>,
}

impl ReviewOutcome {
    pub fn preview_entry(&self) -> PreviewEntry {
        PreviewEntry {
            label: self.grade.as_str().to_string(),
            next_review: self.next_review,
            interval_days: self.interval_days,
        }
    }
}

/// Which algorithm to schedule with.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    #[default]
    Fsrs,
    Sm2,
}

impl FromStr for SchedulerKind {
    type Err = ErrorReport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fsrs" => Ok(SchedulerKind::Fsrs),
            "sm2" => Ok(SchedulerKind::Sm2),
            _ => Err(ErrorReport::with_kind(
                ErrorKind::Config,
                &format!("unknown scheduler: {s}"),
            )),
        }
    }
}

impl Display for SchedulerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerKind::Fsrs => write!(f, "fsrs"),
            SchedulerKind::Sm2 => write!(f, "sm2"),
        }
    }
}

enum Algorithm {
    Fsrs(FsrsScheduler),
    Sm2(Sm2Scheduler),
}

/// A scheduling algorithm, chosen once, plus the clock it reads when the
/// caller does not supply a time.
pub struct Scheduler {
    algorithm: Algorithm,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn fsrs(config: FsrsConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            algorithm: Algorithm::Fsrs(FsrsScheduler::new(config)),
            clock,
        }
    }

    pub fn sm2(clock: Arc<dyn Clock>) -> Self {
        Self {
            algorithm: Algorithm::Sm2(Sm2Scheduler),
            clock,
        }
    }

    pub fn new(kind: SchedulerKind, fsrs: FsrsConfig, clock: Arc<dyn Clock>) -> Self {
        match kind {
            SchedulerKind::Fsrs => Self::fsrs(fsrs, clock),
            SchedulerKind::Sm2 => Self::sm2(clock),
        }
    }

    pub fn kind(&self) -> SchedulerKind {
        match self.algorithm {
            Algorithm::Fsrs(_) => SchedulerKind::Fsrs,
            Algorithm::Sm2(_) => SchedulerKind::Sm2,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn strategy(&self) -> &dyn Strategy {
        match &self.algorithm {
            Algorithm::Fsrs(s) => s as &dyn Strategy,
            Algorithm::Sm2(s) => s as &dyn Strategy,
        }
    }

    pub fn preview(&self, item: &LearningItem, now: Timestamp) -> SchedulerPreview {
        self.strategy().preview(item, now)
    }

    pub fn apply_rating(&self, item: &LearningItem, grade: Grade, now: Timestamp) -> ReviewOutcome {
        self.strategy().apply_rating(item, grade, now)
    }

    pub fn preview_now(&self, item: &LearningItem) -> SchedulerPreview {
        self.preview(item, self.now())
    }

    pub fn apply_rating_now(&self, item: &LearningItem, grade: Grade) -> ReviewOutcome {
        self.apply_rating(item, grade, self.now())
    }
}

/// Render an interval in days compactly.
pub fn format_interval(days: f64) -> String {
    let minutes = (days * 1440.0).round() as i64;
    if minutes < 60 {
        format!("{}m", minutes.max(1))
    } else if days < 1.0 {
        format!("{}h", (days * 24.0).round() as i64)
    } else if days < 7.0 {
        format!("{}d", days.round() as i64)
    } else if days < 30.0 {
        format!("{}w", (days / 7.0).floor() as i64)
    } else if days < 365.0 {
        format!("{}mo", (days / 30.0).floor() as i64)
    } else {
        format!("{}y", (days / 365.0).floor() as i64)
    }
}
