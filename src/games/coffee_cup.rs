use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::Game;

const FILL_CHARS: [char; 4] = ['~', '=', '#', '@'];
const CUP_WIDTH: usize = 20;
const INTERIOR_ROWS: usize = 8;
const STEAM_TICKS: u32 = 6;

const STEAM: [&str; 3] = ["       ~~  ~~  ~~", "      ~~  ~~  ~~", "       ~~  ~~  ~~"];

/// A cup that fills a row per tick, steams for a while, then empties.
pub struct CoffeeCup {
    fill_level: usize,
    steam_ticks: u32,
    /// Coffee rows, bottom first.
    fill_rows: Vec<String>,
    rng: StdRng,
}

impl CoffeeCup {
    pub fn new(_width: usize, _height: usize, rng: StdRng) -> Self {
        Self {
            fill_level: 0,
            steam_ticks: 0,
            fill_rows: Vec::new(),
            rng,
        }
    }

    fn stir(&mut self) {
        let mut rows = Vec::with_capacity(self.fill_level);
        for _ in 0..self.fill_level {
            let row: String = (0..CUP_WIDTH)
                .map(|_| *FILL_CHARS.choose(&mut self.rng).unwrap_or(&'~'))
                .collect();
            rows.push(row);
        }
        self.fill_rows = rows;
    }
}

impl Game for CoffeeCup {
    fn tick(&mut self) {
        if self.steam_ticks > 0 {
            self.steam_ticks += 1;
            if self.steam_ticks > STEAM_TICKS {
                self.fill_level = 0;
                self.steam_ticks = 0;
            }
        } else if self.fill_level < INTERIOR_ROWS {
            self.fill_level += 1;
        } else {
            self.steam_ticks = 1;
        }
        self.stir();
    }

    fn handle_input(&mut self, _key: &str) {}

    fn frame(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if self.steam_ticks > 0 {
            let offset = (self.steam_ticks % 2) as usize;
            for (i, s) in STEAM.iter().enumerate() {
                if (i + offset) % 2 == 0 {
                    lines.push(s.to_string());
                } else {
                    lines.push(s.replace("~~", " ~"));
                }
            }
            lines.push(String::new());
            lines.push("        Yummm!!!".to_string());
            lines.push(String::new());
        } else {
            lines.extend(std::iter::repeat_n(String::new(), 6));
        }

        let rule = "-".repeat(CUP_WIDTH);
        lines.push(format!("    .---{rule}---."));
        let empty_rows = INTERIOR_ROWS - self.fill_level;
        for row in 0..INTERIOR_ROWS {
            let interior = if row < empty_rows {
                " ".repeat(CUP_WIDTH)
            } else {
                let from_bottom = INTERIOR_ROWS - 1 - row;
                self.fill_rows
                    .get(from_bottom)
                    .cloned()
                    .unwrap_or_else(|| "~".repeat(CUP_WIDTH))
            };
            lines.push(format!("    |{interior}|"));
        }
        lines.push(format!("    '---{rule}---'"));
        lines.push(format!("       \\{}/", "_".repeat(CUP_WIDTH - 2)));

        lines.push(String::new());
        lines.push("  Coffee Cup  |  [c] back to loading".to_string());
        lines
    }
}
