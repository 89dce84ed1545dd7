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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::types::timestamp::Timestamp;

/// The ease factor assumed when an item has no usable difficulty.
pub const DEFAULT_EASE: f64 = 2.5;

/// Where an item is in its learning lifecycle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum CardState {
    New,
    Learning,
    Review,
    Relearning,
}

impl CardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }
}

impl TryFrom<&str> for CardState {
    type Error = ErrorReport;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "new" => Ok(CardState::New),
            "learning" => Ok(CardState::Learning),
            "review" => Ok(CardState::Review),
            "relearning" => Ok(CardState::Relearning),
            _ => Err(ErrorReport::new(&format!("Invalid card state: {value}"))),
        }
    }
}

impl ToSql for CardState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CardState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        CardState::try_from(string.as_str()).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// An item's scheduling record. Values of this type are never mutated in
/// place by the schedulers: each review yields a fresh `MemoryState`.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    pub state: CardState,
    /// When the item is next due.
    pub due: Timestamp,
    /// Algorithm-specific. Non-positive means "unset".
    pub stability: f64,
    /// FSRS difficulty, or the SM-2 ease factor. Non-positive means "unset".
    pub difficulty: f64,
    pub scheduled_days: f64,
    pub reps: u32,
    pub lapses: u32,
    pub last_review: Option<Timestamp>,
}

impl MemoryState {
    /// The state of an item that has never been reviewed, due at `now`.
    pub fn new_item(now: Timestamp) -> Self {
        Self {
            state: CardState::New,
            due: now,
            stability: 0.0,
            difficulty: 0.0,
            scheduled_days: 0.0,
            reps: 0,
            lapses: 0,
            last_review: None,
        }
    }

    /// The ease factor, falling back to the default when unset.
    pub fn ease(&self) -> f64 {
        if self.difficulty.is_finite() && self.difficulty > 0.0 {
            self.difficulty
        } else {
            DEFAULT_EASE
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.state != CardState::New && self.due <= now
    }
}
