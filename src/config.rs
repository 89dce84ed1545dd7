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
use std::fs::read_to_string;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::clock::Clock;
use crate::error::Fallible;
use crate::queue::DEFAULT_LIMIT_DUE;
use crate::queue::DEFAULT_LIMIT_NEW;
use crate::queue::QueueOptions;
use crate::scheduler::Scheduler;
use crate::scheduler::SchedulerKind;
use crate::scheduler::fsrs::FsrsConfig;

/// Settings read from a TOML file. Every field is optional.
///
/// ```toml
/// scheduler = "sm2"
///
/// [fsrs]
/// request_retention = 0.85
/// enable_fuzz = true
///
/// [queue]
/// decks = ["Math"]
/// limit_new = 10
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub scheduler: SchedulerKind,
    pub fsrs: FsrsConfig,
    pub queue: QueueConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    pub decks: Option<Vec<String>>,
    pub limit_due: i64,
    pub limit_new: i64,
    pub include_learning: bool,
    pub exclude_empty_answers: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            decks: None,
            limit_due: DEFAULT_LIMIT_DUE,
            limit_new: DEFAULT_LIMIT_NEW,
            include_learning: true,
            exclude_empty_answers: true,
        }
    }
}

impl Config {
    pub fn parse(text: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(text)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Fallible<Self> {
        log::debug!("Loading configuration from {}", path.display());
        let text = read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn scheduler(&self, clock: Arc<dyn Clock>) -> Scheduler {
        Scheduler::new(self.scheduler, self.fsrs.clone(), clock)
    }

    pub fn queue_options(&self) -> QueueOptions {
        let q = &self.queue;
        QueueOptions {
            decks: q
                .decks
                .as_ref()
                .map(|decks| decks.iter().cloned().collect::<BTreeSet<String>>()),
            limit_due: q.limit_due,
            limit_new: q.limit_new,
            include_learning: q.include_learning,
            now: None,
            exclude_empty_answers: q.exclude_empty_answers,
        }
    }
}
