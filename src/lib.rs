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

//! Scheduling core for a spaced repetition system.
//!
//! A [`Scheduler`] decides when an item should next be reviewed, using
//! either FSRS or SM-2. [`build_queue`] selects the items to review right
//! now, and a [`ReviewSession`] walks through that selection, writing each
//! rating to a [`Storage`] as it goes.

pub mod clock;
pub mod config;
pub mod error;
pub mod queue;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod types;

pub use clock::Clock;
pub use clock::FixedClock;
pub use clock::SystemClock;
pub use config::Config;
pub use error::ErrorKind;
pub use error::ErrorReport;
pub use error::Fallible;
pub use queue::QueueOptions;
pub use queue::QueueSnapshot;
pub use queue::build_queue;
pub use scheduler::ReviewOutcome;
pub use scheduler::Scheduler;
pub use scheduler::SchedulerKind;
pub use scheduler::SchedulerPreview;
pub use session::ReviewSession;
pub use session::SessionStatus;
pub use storage::ItemUpdate;
pub use storage::Storage;
pub use types::grade::Grade;
pub use types::item::LearningItem;
pub use types::item_id::ItemId;
pub use types::memory_state::CardState;
pub use types::memory_state::MemoryState;
pub use types::timestamp::Timestamp;
