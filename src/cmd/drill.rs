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

use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use recallq::clock::system_clock;
use recallq::config::Config;
use recallq::error::Fallible;
use recallq::queue::build_queue;
use recallq::session::ReviewSession;
use recallq::storage::Storage;
use recallq::types::grade::Grade;

use crate::cmd::open_storage;

enum Input {
    Line(String),
    Quit,
}

pub fn drill(db_path: &Path, config: &Config) -> Fallible<()> {
    let clock = system_clock();
    let scheduler = config.scheduler(clock.clone());
    let storage = open_storage(db_path)?;
    let snapshot = build_queue(&storage, &config.queue_options(), clock.as_ref())?;
    println!(
        "Reviewing {} due and {} new items with {}.",
        snapshot.due().len(),
        snapshot.new_items().len(),
        scheduler.kind()
    );

    let mut session = ReviewSession::new(snapshot, scheduler, storage);
    let stdin = std::io::stdin();
    let mut stdin = stdin.lock();
    'outer: while let Some(entry) = session.current().cloned() {
        println!();
        println!("[{}] Q: {}", entry.item.deck, entry.item.front);
        print!("[press enter to reveal, q to quit] ");
        std::io::stdout().flush()?;
        match read_input(&mut stdin)? {
            Input::Quit => break,
            Input::Line(_) => {}
        }
        session.toggle_answer();
        println!("A: {}", entry.item.back);

        if let Some(preview) = session.preview_current(session.scheduler().now()) {
            let choices: Vec<String> = Grade::ALL
                .iter()
                .map(|grade| {
                    let entry = preview.get(*grade);
                    format!("{} = {} ({})", grade.as_u8(), entry.label, entry.interval_label())
                })
                .collect();
            println!("{}", choices.join(", "));
        }
        let grade = loop {
            print!("Grade: ");
            std::io::stdout().flush()?;
            match read_input(&mut stdin)? {
                Input::Quit => break 'outer,
                Input::Line(line) => match Grade::from_str(&line) {
                    Ok(grade) => break grade,
                    Err(e) => println!("{}", e.message()),
                },
            }
        };
        session.rate_card(grade)?;
    }

    let summary = session.summary();
    session.into_storage().save()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn read_input(stdin: &mut impl BufRead) -> Fallible<Input> {
    let mut line = String::new();
    if stdin.read_line(&mut line)? == 0 {
        return Ok(Input::Quit);
    }
    let line = line.trim();
    if line.eq_ignore_ascii_case("q") {
        return Ok(Input::Quit);
    }
    Ok(Input::Line(line.to_string()))
}
