//! Falling digital rain with a few rabbit easter eggs.
//!
//! Every grid cell is two terminal columns wide so that emoji and
//! space-padded ASCII share one layout. Each character set splits its glyphs
//! into four disjoint pools (trail, body, head, white) so the editor can
//! colour them by pattern alone; see [`Matrix::match_patterns`].

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::Game;

struct CharSet {
    name: &'static str,
    key: &'static str,
    trail: &'static [&'static str],
    body: &'static [&'static str],
    head: &'static [&'static str],
    white: &'static [&'static str],
}

const CHAR_SETS: [CharSet; 3] = [
    CharSet {
        name: "Numbers",
        key: "n",
        trail: &["0 ", "1 ", "2 "],
        body: &["3 ", "4 ", "5 "],
        head: &["6 ", "7 ", "8 "],
        white: &["9 "],
    },
    CharSet {
        name: "Symbol",
        key: "s",
        trail: &["\u{1f539}", "\u{1f538}", "\u{1f4a0}", "\u{1f53b}", "\u{1f53a}"],
        body: &["\u{1f48e}", "\u{1f52e}", "\u{1f3b2}", "\u{1f511}", "\u{1f4a3}"],
        head: &["\u{1f525}", "\u{1f4ab}", "\u{1f300}", "\u{1f30a}"],
        white: &["\u{1f4a5}", "\u{1f4a2}"],
    },
    CharSet {
        name: "Rabbit",
        key: "r",
        trail: &["\u{1f331}", "\u{1f343}", "\u{1f33f}", "\u{1f340}", "\u{1f96c}"],
        body: &["\u{1f407}", "\u{1f955}", "\u{1f95a}", "\u{1f41b}", "\u{1f966}"],
        head: &["\u{1f430}", "\u{1f43e}", "\u{1f33e}", "\u{1f41d}"],
        white: &["\u{1f31f}", "\u{2728}"],
    },
];

const RABBIT_SET: usize = 2;

const WHITE_CHANCE: f64 = 0.05;
const RABBIT_CHANCE: f64 = 0.08;
const RABBIT_WORDS: [&str; 5] = ["RABBIT", "CARROT", "BURROW", "WARREN", "HOPPER"];

/// Letter, its padded ASCII cell, and its emoji under the rabbit set.
const RABBIT_LETTERS: [(char, &str, &str); 13] = [
    ('R', "R ", "\u{1f430}"),
    ('A', "A ", "\u{1f955}"),
    ('B', "B ", "\u{1f407}"),
    ('I', "I ", "\u{1f331}"),
    ('T', "T ", "\u{1f33f}"),
    ('C', "C ", "\u{1f340}"),
    ('O', "O ", "\u{1f95a}"),
    ('U', "U ", "\u{1f43e}"),
    ('W', "W ", "\u{1f33e}"),
    ('E', "E ", "\u{1f41b}"),
    ('N', "N ", "\u{1f41d}"),
    ('H', "H ", "\u{1f343}"),
    ('P', "P ", "\u{1f31f}"),
];

/// Rabbits that disappear for one tick out of every four, as if eating.
const BLINK_CELLS: [&str; 2] = ["\u{1f430}", "\u{1f407}"];
const BLINK_PERIOD: u64 = 4;
const BLINK_OFF: u64 = 1;

const EMPTY_CELL: &str = "  ";
const MIN_WIDTH: usize = 20;
const MIN_HEIGHT: usize = 10;
const RESERVED_LINES: usize = 2;

struct Column {
    speed: u64,
    head: i64,
    trail_len: usize,
    /// Glyph seeds, head first.
    seeds: Vec<u8>,
    rabbit: Option<(&'static str, usize)>,
    white_head: bool,
}

impl Column {
    fn new(height: usize, max_delay: usize, rng: &mut StdRng) -> Self {
        let delay = rng.gen_range(0..=max_delay) as i64;
        let trail_len = rng.gen_range(8..=height.max(10));
        let rabbit = if rng.gen_bool(RABBIT_CHANCE) {
            RABBIT_WORDS.choose(rng).map(|word| {
                let offset = rng.gen_range(0..=trail_len.saturating_sub(word.len()));
                (*word, offset)
            })
        } else {
            None
        };

        Self {
            speed: rng.gen_range(1..=3),
            head: -delay,
            trail_len,
            seeds: (0..trail_len).map(|_| rng.r#gen()).collect(),
            rabbit,
            white_head: false,
        }
    }

    fn rabbit_letter(&self, i: usize) -> Option<char> {
        let (word, offset) = self.rabbit?;
        let pos = i.checked_sub(offset)?;
        word.chars().nth(pos)
    }
}

/// Matrix rain. `n`, `s` and `r` switch character sets.
pub struct Matrix {
    width: usize,
    height: usize,
    tick_count: u64,
    char_set: usize,
    columns: Vec<Column>,
    rng: StdRng,
}

impl Matrix {
    pub fn new(width: usize, height: usize, mut rng: StdRng) -> Self {
        let width = width.max(MIN_WIDTH);
        let height = height.saturating_sub(RESERVED_LINES).max(MIN_HEIGHT);
        let columns = (0..width / 2)
            .map(|_| Column::new(height, height, &mut rng))
            .collect();

        Self {
            width,
            height,
            tick_count: 0,
            char_set: 0,
            columns,
            rng,
        }
    }

    fn trail_cell(&self, col: &Column, i: usize) -> &'static str {
        let seed = col.seeds[i % col.seeds.len()] as usize;
        let set = &CHAR_SETS[self.char_set];
        let third = (col.trail_len / 3).max(1);

        let pool = if i == 0 && col.white_head {
            set.white
        } else if i < third {
            set.head
        } else if i < 2 * third {
            set.body
        } else {
            set.trail
        };
        pool[seed % pool.len()]
    }

    fn letter_cell(&self, letter: char) -> &'static str {
        match RABBIT_LETTERS.iter().find(|(l, _, _)| *l == letter) {
            Some((_, _, emoji)) if self.char_set == RABBIT_SET => emoji,
            Some((_, ascii, _)) => ascii,
            None => EMPTY_CELL,
        }
    }
}

impl Game for Matrix {
    fn tick(&mut self) {
        self.tick_count += 1;
        let height = self.height as i64;
        let rng = &mut self.rng;

        for col in &mut self.columns {
            if self.tick_count % col.speed != 0 {
                continue;
            }
            col.head += 1;
            let idx = rng.gen_range(0..col.seeds.len());
            col.seeds[idx] = rng.r#gen();
            col.white_head = rng.gen_bool(WHITE_CHANCE);

            if col.head - col.trail_len as i64 >= height {
                *col = Column::new(self.height, self.height / 2, rng);
            }
        }
    }

    fn handle_input(&mut self, key: &str) {
        if let Some(idx) = CHAR_SETS.iter().position(|s| s.key == key) {
            self.char_set = idx;
        }
    }

    fn frame(&self) -> Vec<String> {
        let mut grid = vec![vec![EMPTY_CELL; self.columns.len()]; self.height];

        for (x, col) in self.columns.iter().enumerate() {
            for i in 0..col.trail_len {
                let row = col.head - i as i64;
                if row < 0 || row >= self.height as i64 {
                    continue;
                }
                grid[row as usize][x] = match col.rabbit_letter(i) {
                    Some(letter) => self.letter_cell(letter),
                    None => self.trail_cell(col, i),
                };
            }
        }

        if self.tick_count % BLINK_PERIOD < BLINK_OFF {
            for cell in grid.iter_mut().flatten() {
                if BLINK_CELLS.contains(cell) {
                    *cell = EMPTY_CELL;
                }
            }
        }

        let odd_pad = if self.width % 2 == 1 { " " } else { "" };
        let mut lines: Vec<String> = grid
            .iter()
            .map(|row| format!("{}{odd_pad}", row.concat()))
            .collect();

        let labels: Vec<String> = CHAR_SETS
            .iter()
            .enumerate()
            .map(|(idx, set)| {
                let marker = if idx == self.char_set { '*' } else { ' ' };
                let rest: String = set.name.to_lowercase().chars().skip(1).collect();
                format!("{marker}[{}]{rest}", set.key)
            })
            .collect();

        lines.push(String::new());
        lines.push(format!("{}   [c]ancel", labels.join("  ")));
        lines
    }

    /// Highlight patterns for the active set: `[chars]` classes for ASCII
    /// cells, `\%(a\|b\)` alternations for emoji.
    fn match_patterns(&self) -> Vec<(String, String)> {
        let set = &CHAR_SETS[self.char_set];
        let is_emoji = set.trail[0].chars().count() == 1;

        [
            ("MatrixTrail", set.trail),
            ("MatrixBody", set.body),
            ("MatrixHead", set.head),
            ("MatrixWhite", set.white),
        ]
        .into_iter()
        .map(|(group, pool)| {
            let pattern = if is_emoji {
                format!("\\%({}\\)", pool.join("\\|"))
            } else {
                let chars: String = pool.iter().filter_map(|c| c.chars().next()).collect();
                format!("[{chars}]")
            };
            (group.to_string(), pattern)
        })
        .collect()
    }
}
