// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{Rgb, Row};

const NICK_PREFIXES: [&str; 16] = [
    "Zero", "Flak", "Gator", "Nova", "Pixel", "Quill", "Rook", "Sable", "Tango", "Umber", "Vex",
    "Warden", "Xeno", "Yarrow", "Zephyr", "Basalt",
];
const NICK_SUFFIXES: [&str; 10] = [
    "", "_", "42", "Bot", "er", "ix", "King", "jr", "_NL", "2000",
];
const COUNTRIES: [&str; 12] = [
    "DE", "US", "FR", "SE", "PL", "NL", "GB", "FI", "CZ", "BR", "RU", "CA",
];
const STATUSES: [&str; 4] = ["idle", "ingame", "away", "bot"];
const MAPS: [&str; 10] = [
    "Comet Catcher Redux",
    "DeltaSiegeDry",
    "Altair Crossing",
    "Red Comet",
    "Folsom Dam",
    "Tabula",
    "Quicksilver",
    "Throne",
    "Eye of Horus",
    "Supreme Isthmus",
];
const GAMES: [&str; 4] = ["BA", "Zero-K", "EvoRTS", "TechA"];
const BATTLE_TITLES: [&str; 8] = [
    "1v1 ranked",
    "team noobs welcome",
    "FFA",
    "4v4 no rush",
    "chickens hard",
    "coop vs AI",
    "tourney practice",
    "casual",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic user and battle rows shaped like a live lobby. Drives the
/// simulated feed and the test fixtures.
#[derive(Debug, Clone)]
pub struct LobbyFaker {
    rng: DeterministicRng,
    next_user: usize,
    next_battle: usize,
}

impl LobbyFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_user: 0,
            next_battle: 0,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    /// Cells: name, country, rank, status, color.
    pub fn user(&mut self) -> Row {
        let index = self.next_user;
        self.next_user += 1;

        let name = format!(
            "{}{}{}",
            self.pick(&NICK_PREFIXES),
            self.pick(&NICK_SUFFIXES),
            index
        );
        let color = self.color().to_packed_bgr();
        Row::new(
            format!("user:{index}"),
            [
                name,
                self.pick(&COUNTRIES).to_owned(),
                self.int_n(8).to_string(),
                self.pick(&STATUSES).to_owned(),
                color.to_string(),
            ],
        )
    }

    pub fn users(&mut self, count: usize) -> Vec<Row> {
        (0..count).map(|_| self.user()).collect()
    }

    /// Cells: title, host, map, players, game.
    pub fn battle(&mut self) -> Row {
        let index = self.next_battle;
        self.next_battle += 1;

        let host = format!("{}{}", self.pick(&NICK_PREFIXES), self.pick(&NICK_SUFFIXES));
        Row::new(
            format!("battle:{index}"),
            [
                self.pick(&BATTLE_TITLES).to_owned(),
                host,
                self.pick(&MAPS).to_owned(),
                (self.int_n(16) + 1).to_string(),
                self.pick(&GAMES).to_owned(),
            ],
        )
    }

    pub fn battles(&mut self, count: usize) -> Vec<Row> {
        (0..count).map(|_| self.battle()).collect()
    }

    /// Same identity and name, new status and rank.
    pub fn user_update(&mut self, row: &Row) -> Row {
        let mut next = row.clone();
        if let Some(rank) = next.cells.get_mut(2) {
            *rank = self.int_n(8).to_string();
        }
        if let Some(status) = next.cells.get_mut(3) {
            *status = self.pick(&STATUSES).to_owned();
        }
        next
    }

    pub fn color(&mut self) -> Rgb {
        Rgb::new(
            self.int_n(256) as u8,
            self.int_n(256) as u8,
            self.int_n(256) as u8,
        )
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }
}
