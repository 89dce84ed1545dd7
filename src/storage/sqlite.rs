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

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use rusqlite::Connection;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::scheduler::ReviewOutcome;
use crate::storage::ItemUpdate;
use crate::storage::Storage;
use crate::types::item::LearningItem;
use crate::types::item_id::ItemId;
use crate::types::memory_state::CardState;
use crate::types::memory_state::MemoryState;
use crate::types::timestamp::Timestamp;

const ITEM_COLUMNS: &str = "item_id, deck, front, back, tags, needs_filling, created_at, updated_at, state, due_at, stability, difficulty, scheduled_days, reps, lapses, last_review_at";

/// An item collection stored in a SQLite database.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(database_path: &str) -> Fallible<Self> {
        log::debug!("Opening database at {database_path}");
        Self::init(Connection::open(database_path)?)
    }

    pub fn open_in_memory() -> Fallible<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Fallible<Self> {
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating database schema");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self { conn })
    }

    /// Insert a new item.
    ///
    /// If an item with the same ID exists, returns an error.
    pub fn insert_item(&mut self, item: &LearningItem) -> Fallible<()> {
        log::debug!("Adding new item: {}", item.id);
        let tx = self.conn.transaction()?;
        if select_item(&tx, &item.id)?.is_some() {
            return Err(ErrorReport::invalid_argument(&format!(
                "duplicate item: {}",
                item.id
            )));
        }
        let tags = serde_json::to_string(&item.tags)?;
        let sql = format!(
            "insert into items ({ITEM_COLUMNS}) values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);"
        );
        let m = &item.memory;
        tx.execute(
            &sql,
            rusqlite::params![
                item.id,
                item.deck,
                item.front,
                item.back,
                tags,
                item.needs_filling,
                item.created,
                item.updated,
                m.state,
                m.due,
                m.stability,
                m.difficulty,
                m.scheduled_days,
                m.reps,
                m.lapses,
                m.last_review,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn item_count(&self) -> Fallible<usize> {
        let count: i64 = self
            .conn
            .query_row("select count(*) from items;", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Count items by state.
    pub fn state_counts(&self) -> Fallible<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        let mut stmt = self
            .conn
            .prepare("select state, count(*) from items group by state;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let state: CardState = row.get(0)?;
            let count: i64 = row.get(1)?;
            counts.insert(state.as_str().to_string(), count as usize);
        }
        Ok(counts)
    }

    /// The number of reviews recorded at or after `since`.
    pub fn reviews_since(&self, since: Timestamp) -> Fallible<usize> {
        let count: i64 = self.conn.query_row(
            "select count(*) from reviews where reviewed_at >= ?;",
            [since],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, id: &ItemId) -> Fallible<Option<LearningItem>> {
        select_item(&self.conn, id)
    }

    fn all_items(&self) -> Fallible<Vec<LearningItem>> {
        let sql = format!("select {ITEM_COLUMNS} from items;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(read_item(row)?);
        }
        Ok(items)
    }

    fn update_item(&mut self, id: &ItemId, update: ItemUpdate) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        write_update(&tx, id, update)?;
        tx.commit()?;
        Ok(())
    }

    fn record_review(&mut self, outcome: &ReviewOutcome) -> Fallible<()> {
        write_review(&self.conn, outcome)
    }

    fn apply_review(
        &mut self,
        id: &ItemId,
        update: ItemUpdate,
        outcome: &ReviewOutcome,
    ) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        write_update(&tx, id, update)?;
        write_review(&tx, outcome)?;
        tx.commit()?;
        Ok(())
    }

    fn save(&mut self) -> Fallible<()> {
        // Every write above commits its own transaction.
        Ok(())
    }
}

fn write_update(conn: &Connection, id: &ItemId, update: ItemUpdate) -> Fallible<()> {
    let mut item = select_item(conn, id)?
        .ok_or_else(|| ErrorReport::not_found(&format!("no item with ID {id}")))?;
    update.merge_into(&mut item);
    let tags = serde_json::to_string(&item.tags)?;
    let m = &item.memory;
    let sql = "update items set tags = ?, needs_filling = ?, updated_at = ?, state = ?, due_at = ?, stability = ?, difficulty = ?, scheduled_days = ?, reps = ?, lapses = ?, last_review_at = ? where item_id = ?;";
    conn.execute(
        sql,
        rusqlite::params![
            tags,
            item.needs_filling,
            item.updated,
            m.state,
            m.due,
            m.stability,
            m.difficulty,
            m.scheduled_days,
            m.reps,
            m.lapses,
            m.last_review,
            id,
        ],
    )?;
    Ok(())
}

fn write_review(conn: &Connection, outcome: &ReviewOutcome) -> Fallible<()> {
    let reviewed_at = outcome
        .log
        .as_ref()
        .map(|log| log.reviewed_at)
        .unwrap_or(outcome.item.updated);
    let state_before = outcome
        .log
        .as_ref()
        .map(|log| log.state)
        .unwrap_or(outcome.item.memory.state);
    let sql = "insert into reviews (item_id, reviewed_at, grade, state_before, interval_days, due_at) values (?, ?, ?, ?, ?, ?);";
    conn.execute(
        sql,
        rusqlite::params![
            outcome.item.id,
            reviewed_at,
            outcome.grade,
            state_before,
            outcome.interval_days,
            outcome.next_review,
        ],
    )?;
    Ok(())
}

fn select_item(conn: &Connection, id: &ItemId) -> Fallible<Option<LearningItem>> {
    let sql = format!("select {ITEM_COLUMNS} from items where item_id = ?;");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(read_item(row)?)),
        None => Ok(None),
    }
}

fn read_item(row: &Row) -> Fallible<LearningItem> {
    let tags: String = row.get(4)?;
    let tags: BTreeSet<String> = serde_json::from_str(&tags)?;
    Ok(LearningItem {
        id: row.get(0)?,
        deck: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        tags,
        needs_filling: row.get(5)?,
        created: row.get(6)?,
        updated: row.get(7)?,
        memory: MemoryState {
            state: row.get(8)?,
            due: row.get(9)?,
            stability: row.get(10)?,
            difficulty: row.get(11)?,
            scheduled_days: row.get(12)?,
            reps: row.get(13)?,
            lapses: row.get(14)?,
            last_review: row.get(15)?,
        },
    })
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["items"], |row| row.get(0))?;
    Ok(count > 0)
}
