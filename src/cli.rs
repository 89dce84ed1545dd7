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

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::add::add_item;
use crate::cmd::drill::drill;
use crate::cmd::queue::print_queue;
use crate::cmd::stats::print_stats;
use recallq::config::Config;
use recallq::error::Fallible;

const DEFAULT_DB: &str = "recallq.sqlite3";

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the item database.
    #[arg(long, global = true, default_value = DEFAULT_DB)]
    db: PathBuf,
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Add an item to the collection.
    Add {
        /// The prompt side.
        front: String,
        /// The answer side. May be empty.
        #[arg(default_value = "")]
        back: String,
        /// The deck to add the item to.
        #[arg(long)]
        deck: String,
        /// A tag. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Print the current review queue as JSON.
    Queue {
        /// Only include items from this deck. May be repeated.
        #[arg(long = "deck")]
        decks: Vec<String>,
        /// Maximum number of due items.
        #[arg(long, allow_negative_numbers = true)]
        limit_due: Option<i64>,
        /// Maximum number of new items.
        #[arg(long, allow_negative_numbers = true)]
        limit_new: Option<i64>,
    },
    /// Review the current queue in the terminal.
    Drill,
    /// Print collection statistics as JSON.
    Stats,
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    match cli.command {
        Command::Add {
            front,
            back,
            deck,
            tags,
        } => add_item(&cli.db, &deck, &front, &back, tags),
        Command::Queue {
            decks,
            limit_due,
            limit_new,
        } => {
            let mut options = config.queue_options();
            if !decks.is_empty() {
                options.decks = Some(decks.into_iter().collect());
            }
            if let Some(limit) = limit_due {
                options.limit_due = limit;
            }
            if let Some(limit) = limit_new {
                options.limit_new = limit;
            }
            print_queue(&cli.db, &options)
        }
        Command::Drill => drill(&cli.db, &config),
        Command::Stats => print_stats(&cli.db),
    }
}
