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

use recallq::clock::SystemClock;
use recallq::error::Fallible;
use recallq::queue::QueueOptions;
use recallq::queue::build_queue;

use crate::cmd::open_storage;

pub fn print_queue(db_path: &Path, options: &QueueOptions) -> Fallible<()> {
    let storage = open_storage(db_path)?;
    let snapshot = build_queue(&storage, options, &SystemClock)?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    println!("{json}");
    Ok(())
}
