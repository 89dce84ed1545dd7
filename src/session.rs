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

//! A single pass over a queue snapshot.
//!
//! Each rating is written to storage before the session's own queue is
//! touched, so abandoning a session at any point loses nothing that was
//! already rated. Calls into one session must be serialized by the caller.

use serde::Serialize;

use crate::error::Fallible;
use crate::queue::QueueSnapshot;
use crate::scheduler::ReviewOutcome;
use crate::scheduler::Scheduler;
use crate::scheduler::SchedulerPreview;
use crate::storage::ItemUpdate;
use crate::storage::Storage;
use crate::types::grade::Grade;
use crate::types::item::LearningItem;
use crate::types::item_id::ItemId;
use crate::types::timestamp::Timestamp;

/// Which list of the snapshot an entry came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Due,
    New,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    InProgress,
    Complete,
}

#[derive(Clone, Debug)]
pub struct QueueEntry {
    pub item: LearningItem,
    pub origin: Origin,
}

/// One rating applied during the session.
#[derive(Clone, Debug)]
pub struct CompletedReview {
    pub item_id: ItemId,
    pub origin: Origin,
    pub grade: Grade,
    pub outcome: ReviewOutcome,
    pub completed_at: Timestamp,
}

/// What `rate_card` reports back.
#[derive(Clone, Debug)]
pub struct RateResult {
    pub outcome: ReviewOutcome,
    /// Entries still in the queue.
    pub remaining: usize,
    /// Ratings applied so far, including this one.
    pub completed: usize,
    pub next: Option<QueueEntry>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current_index: usize,
    pub total_cards: usize,
    pub completed: usize,
    pub showing_answer: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total_reviewed: usize,
    pub reviewed_due: usize,
    pub reviewed_new: usize,
    pub started_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
}

pub struct ReviewSession<S: Storage> {
    scheduler: Scheduler,
    storage: S,
    status: SessionStatus,
    started_at: Option<Timestamp>,
    finished_at: Option<Timestamp>,
    queue: Vec<QueueEntry>,
    index: usize,
    showing_answer: bool,
    completed: Vec<CompletedReview>,
}

impl<S: Storage> ReviewSession<S> {
    /// Start a session, reading the time from the scheduler's clock.
    pub fn new(snapshot: QueueSnapshot, scheduler: Scheduler, storage: S) -> Self {
        let now = scheduler.now();
        Self::new_at(snapshot, scheduler, storage, now)
    }

    /// Start a session at the given time. Due items come first, then new
    /// ones. An empty snapshot yields a session that is already complete.
    pub fn new_at(
        snapshot: QueueSnapshot,
        scheduler: Scheduler,
        storage: S,
        now: Timestamp,
    ) -> Self {
        let (due, new) = snapshot.into_lists();
        let queue: Vec<QueueEntry> = due
            .into_iter()
            .map(|item| QueueEntry {
                item,
                origin: Origin::Due,
            })
            .chain(new.into_iter().map(|item| QueueEntry {
                item,
                origin: Origin::New,
            }))
            .collect();
        let (status, started_at, finished_at) = if queue.is_empty() {
            log::debug!("Session started with an empty queue");
            (SessionStatus::Complete, None, Some(now))
        } else {
            log::debug!("Session started with {} items", queue.len());
            (SessionStatus::InProgress, Some(now), None)
        };
        Self {
            scheduler,
            storage,
            status,
            started_at,
            finished_at,
            queue,
            index: 0,
            showing_answer: false,
            completed: Vec::new(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }

    pub fn showing_answer(&self) -> bool {
        self.showing_answer
    }

    /// Flip answer visibility and return the new value. Does nothing once
    /// the session is complete.
    pub fn toggle_answer(&mut self) -> bool {
        if self.status == SessionStatus::InProgress {
            self.showing_answer = !self.showing_answer;
        }
        self.showing_answer
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        if self.is_complete() {
            return None;
        }
        self.queue.get(self.index)
    }

    /// What each grade would do to the current item.
    pub fn preview_current(&self, now: Timestamp) -> Option<SchedulerPreview> {
        self.current()
            .map(|entry| self.scheduler.preview(&entry.item, now))
    }

    /// Rate the current item at the scheduler clock's current time.
    pub fn rate_card(&mut self, grade: Grade) -> Fallible<Option<RateResult>> {
        let now = self.scheduler.now();
        self.rate_card_at(grade, now)
    }

    /// Rate the current item. Returns `None` if there is nothing to rate.
    ///
    /// If writing to storage fails, the error is returned and the session is
    /// left exactly as it was.
    pub fn rate_card_at(
        &mut self,
        grade: Grade,
        now: Timestamp,
    ) -> Fallible<Option<RateResult>> {
        if self.status != SessionStatus::InProgress {
            return Ok(None);
        }
        let Some(current) = self.queue.get(self.index) else {
            return Ok(None);
        };
        let outcome = self.scheduler.apply_rating(&current.item, grade, now);
        let id = current.item.id;
        let origin = current.origin;

        // Persist before touching the queue.
        let update = ItemUpdate::memory(outcome.item.memory.clone(), now);
        self.storage.apply_review(&id, update, &outcome)?;
        self.storage.save()?;

        let memory = &outcome.item.memory;
        log::debug!(
            "{} {} S={:.2} D={:.2} due={}",
            id.short(),
            grade,
            memory.stability,
            memory.difficulty,
            memory.due
        );

        self.completed.push(CompletedReview {
            item_id: id,
            origin,
            grade,
            outcome: outcome.clone(),
            completed_at: now,
        });
        self.queue.remove(self.index);
        if self.queue.is_empty() {
            log::debug!("Session completed");
            self.status = SessionStatus::Complete;
            self.finished_at = Some(now);
            self.index = 0;
        } else {
            self.index = self.index.min(self.queue.len() - 1);
        }
        self.showing_answer = false;

        Ok(Some(RateResult {
            outcome,
            remaining: self.queue.len(),
            completed: self.completed.len(),
            next: self.current().cloned(),
        }))
    }

    pub fn progress(&self) -> Progress {
        let current_index = if self.queue.is_empty() {
            0
        } else {
            self.index.min(self.queue.len() - 1)
        };
        Progress {
            current_index,
            total_cards: self.queue.len() + self.completed.len(),
            completed: self.completed.len(),
            showing_answer: self.showing_answer,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let reviewed_due = self
            .completed
            .iter()
            .filter(|review| review.origin == Origin::Due)
            .count();
        let reviewed_new = self
            .completed
            .iter()
            .filter(|review| review.origin == Origin::New)
            .count();
        SessionSummary {
            total_reviewed: self.completed.len(),
            reviewed_due,
            reviewed_new,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }

    pub fn completed(&self) -> &[CompletedReview] {
        &self.completed
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<Timestamp> {
        self.finished_at
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::FixedClock;
    use crate::error::ErrorReport;
    use crate::queue::QueueOptions;
    use crate::storage::memory::MemoryStorage;
    use crate::types::memory_state::CardState;
    use crate::types::memory_state::MemoryState;

    fn start() -> Fallible<Timestamp> {
        Timestamp::parse("2025-06-01T12:00:00Z")
    }

    fn due_item(front: &str, now: Timestamp, offset: f64) -> LearningItem {
        let item = LearningItem::new("Math", front, "answer", now.plus_days(-30.0));
        let memory = MemoryState {
            state: CardState::Review,
            due: now.plus_days(offset),
            scheduled_days: 4.0,
            difficulty: 2.5,
            reps: 3,
            ..item.memory.clone()
        };
        item.with_memory(memory)
    }

    fn setup(
        items: Vec<LearningItem>,
        now: Timestamp,
    ) -> Fallible<(MemoryStorage, QueueSnapshot)> {
        let storage: MemoryStorage = items.into_iter().collect();
        let options = QueueOptions {
            now: Some(now),
            ..Default::default()
        };
        let snapshot = crate::queue::build_queue(&storage, &options, &FixedClock::new(now))?;
        Ok((storage, snapshot))
    }

    fn sm2(now: Timestamp) -> Scheduler {
        Scheduler::sm2(Arc::new(FixedClock::new(now)))
    }

    #[test]
    fn test_empty_snapshot_is_complete() -> Fallible<()> {
        let now = start()?;
        let (mut storage, snapshot) = setup(vec![], now)?;
        let mut session = ReviewSession::new(snapshot, sm2(now), &mut storage);
        assert_eq!(session.status(), SessionStatus::Complete);
        assert_eq!(session.started_at(), None);
        assert_eq!(session.finished_at(), Some(now));
        assert_eq!(session.summary().total_reviewed, 0);
        assert!(session.current().is_none());
        assert!(!session.toggle_answer());
        assert!(session.rate_card(Grade::Good)?.is_none());
        Ok(())
    }

    #[test]
    fn test_due_before_new() -> Fallible<()> {
        let now = start()?;
        let items = vec![
            LearningItem::new("Math", "new", "answer", now.plus_days(-1.0)),
            due_item("due", now, -1.0),
        ];
        let (mut storage, snapshot) = setup(items, now)?;
        let session = ReviewSession::new(snapshot, sm2(now), &mut storage);
        let current = session.current().ok_or_else(|| ErrorReport::new("empty"))?;
        assert_eq!(current.item.front, "due");
        assert_eq!(current.origin, Origin::Due);
        assert_eq!(session.progress().total_cards, 2);
        Ok(())
    }

    #[test]
    fn test_toggle_twice_restores() -> Fallible<()> {
        let now = start()?;
        let (mut storage, snapshot) = setup(vec![due_item("a", now, -1.0)], now)?;
        let mut session = ReviewSession::new(snapshot, sm2(now), &mut storage);
        assert!(!session.showing_answer());
        assert!(session.toggle_answer());
        assert!(!session.toggle_answer());
        Ok(())
    }

    #[test]
    fn test_full_pass() -> Fallible<()> {
        let now = start()?;
        let items = vec![
            due_item("a", now, -2.0),
            due_item("b", now, -1.0),
            LearningItem::new("Math", "c", "answer", now.plus_days(-1.0)),
        ];
        let (mut storage, snapshot) = setup(items, now)?;
        let mut session = ReviewSession::new(snapshot, sm2(now), &mut storage);

        session.toggle_answer();
        let result = session
            .rate_card_at(Grade::Good, now)?
            .ok_or_else(|| ErrorReport::new("expected a result"))?;
        assert_eq!(result.remaining, 2);
        assert_eq!(result.completed, 1);
        assert_eq!(result.outcome.interval_days, 10.0);
        assert!(!session.showing_answer());
        let next = result.next.ok_or_else(|| ErrorReport::new("expected next"))?;
        assert_eq!(next.item.front, "b");

        session.rate_card_at(Grade::Again, now)?;
        let progress = session.progress();
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.total_cards, 3);
        assert_eq!(progress.current_index, 0);

        let later = now.plus_days(0.01);
        let result = session
            .rate_card_at(Grade::Easy, later)?
            .ok_or_else(|| ErrorReport::new("expected a result"))?;
        assert_eq!(result.remaining, 0);
        assert!(result.next.is_none());
        assert!(session.is_complete());
        assert!(session.current().is_none());
        assert_eq!(session.finished_at(), Some(later));
        assert!(session.rate_card(Grade::Good)?.is_none());

        let summary = session.summary();
        assert_eq!(summary.total_reviewed, 3);
        assert_eq!(summary.reviewed_due, 2);
        assert_eq!(summary.reviewed_new, 1);
        assert_eq!(summary.total_reviewed, summary.reviewed_due + summary.reviewed_new);
        assert_eq!(summary.started_at, Some(now));

        // Every rating reached storage.
        let saves = session.storage().save_count();
        assert_eq!(saves, 3);
        drop(session);
        let stored = storage.all_items()?;
        assert!(stored.iter().all(|item| item.memory.last_review.is_some()));
        Ok(())
    }

    #[test]
    fn test_rating_persists_before_session_ends() -> Fallible<()> {
        let now = start()?;
        let items = vec![due_item("a", now, -2.0), due_item("b", now, -1.0)];
        let (mut storage, snapshot) = setup(items, now)?;
        let id = {
            let mut session = ReviewSession::new(snapshot, sm2(now), &mut storage);
            let result = session
                .rate_card_at(Grade::Good, now)?
                .ok_or_else(|| ErrorReport::new("expected a result"))?;
            assert_eq!(result.outcome.item.front, "a");
            // Abandon the session with one item left.
            result.outcome.item.id
        };
        let stored = storage
            .get_item(&id)?
            .ok_or_else(|| ErrorReport::new("missing"))?;
        assert_eq!(stored.memory.reps, 4);
        assert_eq!(stored.updated, now);
        Ok(())
    }

    /// A store whose writes always fail.
    struct BrokenStorage(MemoryStorage);

    impl Storage for BrokenStorage {
        fn get_item(&self, id: &ItemId) -> Fallible<Option<LearningItem>> {
            self.0.get_item(id)
        }

        fn all_items(&self) -> Fallible<Vec<LearningItem>> {
            self.0.all_items()
        }

        fn update_item(&mut self, _id: &ItemId, _update: ItemUpdate) -> Fallible<()> {
            Err(ErrorReport::new("disk full"))
        }

        fn save(&mut self) -> Fallible<()> {
            Ok(())
        }
    }

    #[test]
    fn test_storage_failure_leaves_session_untouched() -> Fallible<()> {
        let now = start()?;
        let (storage, snapshot) = setup(vec![due_item("a", now, -1.0)], now)?;
        let mut session = ReviewSession::new(snapshot, sm2(now), BrokenStorage(storage));
        session.toggle_answer();
        let result = session.rate_card_at(Grade::Good, now);
        assert!(result.is_err());
        assert_eq!(session.status(), SessionStatus::InProgress);
        assert!(session.showing_answer());
        assert_eq!(session.progress().completed, 0);
        assert_eq!(session.progress().total_cards, 1);
        assert!(session.current().is_some());
        Ok(())
    }

    #[test]
    fn test_preview_current() -> Fallible<()> {
        let now = start()?;
        let (mut storage, snapshot) = setup(vec![due_item("a", now, -1.0)], now)?;
        let session = ReviewSession::new(snapshot, sm2(now), &mut storage);
        let preview = session
            .preview_current(now)
            .ok_or_else(|| ErrorReport::new("no preview"))?;
        assert_eq!(preview.good.interval_days, 10.0);
        assert_eq!(preview.again.interval_label(), "10m");
        Ok(())
    }
}
