// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use lobbygrid_app::{LobbyFaker, LobbyList, Row, RowChange};
use lobbygrid_tui::{InternalEvent, LobbyFeed};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

const BATTLE_PLAYERS_COLUMN: usize = 3;
const MAX_PLAYERS: usize = 16;
const SUMMARY_EVERY: u64 = 25;

/// Simulated lobby: a fixed cast of users and battles that join, leave and
/// change over time.
#[derive(Debug, Clone)]
pub struct LobbySimulator {
    faker: LobbyFaker,
    users: Vec<Row>,
    battles: Vec<Row>,
    steps: u64,
}

impl LobbySimulator {
    pub fn new(seed: u64, users: usize, battles: usize) -> Self {
        let mut faker = LobbyFaker::new(seed);
        let users = faker.users(users);
        let battles = faker.battles(battles);
        Self {
            faker,
            users,
            battles,
            steps: 0,
        }
    }

    pub fn rows(&self, list: LobbyList) -> &[Row] {
        match list {
            LobbyList::Users => &self.users,
            LobbyList::Battles => &self.battles,
        }
    }

    pub fn step(&mut self) -> InternalEvent {
        self.steps += 1;
        if self.steps % SUMMARY_EVERY == 0 {
            return InternalEvent::FeedStatus(format!(
                "{} users online, {} open battles",
                self.users.len(),
                self.battles.len()
            ));
        }

        match self.faker.int_n(10) {
            0..=3 if !self.users.is_empty() => {
                let index = self.faker.int_n(self.users.len());
                let updated = self.faker.user_update(&self.users[index]);
                self.users[index] = updated.clone();
                change(LobbyList::Users, RowChange::Upsert(updated))
            }
            5 if self.users.len() > 1 => {
                let index = self.faker.int_n(self.users.len());
                let gone = self.users.swap_remove(index);
                change(LobbyList::Users, RowChange::Remove(gone.id))
            }
            6 | 7 if !self.battles.is_empty() => {
                let index = self.faker.int_n(self.battles.len());
                let players = (self.faker.int_n(MAX_PLAYERS) + 1).to_string();
                let battle = &mut self.battles[index];
                if let Some(cell) = battle.cells.get_mut(BATTLE_PLAYERS_COLUMN) {
                    *cell = players;
                }
                change(LobbyList::Battles, RowChange::Upsert(battle.clone()))
            }
            8 => {
                let battle = self.faker.battle();
                self.battles.push(battle.clone());
                change(LobbyList::Battles, RowChange::Upsert(battle))
            }
            9 if self.battles.len() > 1 => {
                let index = self.faker.int_n(self.battles.len());
                let closed = self.battles.swap_remove(index);
                change(LobbyList::Battles, RowChange::Remove(closed.id))
            }
            _ => {
                let user = self.faker.user();
                self.users.push(user.clone());
                change(LobbyList::Users, RowChange::Upsert(user))
            }
        }
    }
}

fn change(list: LobbyList, change: RowChange) -> InternalEvent {
    InternalEvent::Change { list, change }
}

/// Feeds the TUI from a `LobbySimulator` on a background thread.
#[derive(Debug)]
pub struct SimulatedFeed {
    simulator: Option<LobbySimulator>,
    interval: Duration,
}

impl SimulatedFeed {
    pub fn new(simulator: LobbySimulator, interval: Duration) -> Self {
        Self {
            simulator: Some(simulator),
            interval,
        }
    }
}

impl LobbyFeed for SimulatedFeed {
    fn snapshot(&mut self, list: LobbyList) -> Result<Vec<Row>> {
        let simulator = self
            .simulator
            .as_ref()
            .ok_or_else(|| anyhow!("lobby feed already started; snapshots are taken first"))?;
        Ok(simulator.rows(list).to_vec())
    }

    fn spawn_updates(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let mut simulator = self
            .simulator
            .take()
            .ok_or_else(|| anyhow!("lobby feed already started"))?;
        let interval = self.interval;
        thread::Builder::new()
            .name("lobby-feed".to_owned())
            .spawn(move || {
                loop {
                    thread::sleep(interval);
                    if tx.send(simulator.step()).is_err() {
                        log::debug!("lobby feed stopped after {} steps", simulator.steps);
                        break;
                    }
                }
            })
            .context("spawn lobby feed thread")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LobbySimulator, SimulatedFeed};
    use anyhow::Result;
    use lobbygrid_app::{LobbyList, MemoryPrefs, RowChange};
    use lobbygrid_tui::{InternalEvent, LobbyFeed, LobbyTables, TableLayout};
    use std::collections::BTreeSet;
    use std::sync::mpsc;
    use std::time::Duration;

    fn layout() -> TableLayout {
        TableLayout {
            width: 100,
            height: 30,
            save_prefs: false,
        }
    }

    #[test]
    fn simulator_changes_always_apply_cleanly() -> Result<()> {
        let mut simulator = LobbySimulator::new(99, 10, 4);
        let mut tables = LobbyTables::new(MemoryPrefs::shared(), layout());
        for list in LobbyList::ALL {
            for row in simulator.rows(list).to_vec() {
                tables.apply(list, RowChange::Upsert(row))?;
            }
        }

        let mut summaries = 0;
        for _ in 0..500 {
            match simulator.step() {
                InternalEvent::Change { list, change } => tables.apply(list, change)?,
                InternalEvent::FeedStatus(_) => summaries += 1,
                InternalEvent::ClearStatus { .. } => unreachable!("feed never clears status"),
            }
        }

        assert_eq!(summaries, 20);
        for list in LobbyList::ALL {
            let table_ids = tables
                .get(list)
                .rows()
                .iter()
                .map(|row| row.id.clone())
                .collect::<BTreeSet<_>>();
            let simulated_ids = simulator
                .rows(list)
                .iter()
                .map(|row| row.id.clone())
                .collect::<BTreeSet<_>>();
            assert_eq!(table_ids, simulated_ids, "{}", list.label());
        }
        Ok(())
    }

    #[test]
    fn feed_snapshots_then_streams_updates() -> Result<()> {
        let mut feed = SimulatedFeed::new(LobbySimulator::new(3, 5, 2), Duration::from_millis(1));
        assert_eq!(feed.snapshot(LobbyList::Users)?.len(), 5);
        assert_eq!(feed.snapshot(LobbyList::Battles)?.len(), 2);

        let (tx, rx) = mpsc::channel();
        feed.spawn_updates(tx.clone())?;
        let first = rx.recv_timeout(Duration::from_secs(5))?;
        assert!(matches!(first, InternalEvent::Change { .. }));

        assert!(feed.snapshot(LobbyList::Users).is_err());
        assert!(feed.spawn_updates(tx).is_err());
        Ok(())
    }
}
