//! Tick-driven mini-games shown while a review runs.
//!
//! The editor owns the timer: it starts a game, calls `tick` every
//! `tick_ms` and forwards single keypresses to `input`. Every call returns
//! the full frame to draw.

pub mod coffee_cup;
pub mod matrix;
pub mod pong;
pub mod rabbit;
pub mod snake;
pub mod wargames;
pub mod zen_spiral;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

pub use coffee_cup::CoffeeCup;
pub use matrix::Matrix;
pub use pong::Pong;
pub use rabbit::RabbitVsSnake;
pub use snake::Snake;
pub use wargames::WarGames;
pub use zen_spiral::ZenSpiral;

/// Tick interval for keys not in the registry.
pub const DEFAULT_TICK_MS: u64 = 500;

pub trait Game {
    fn tick(&mut self);

    fn handle_input(&mut self, key: &str);

    fn frame(&self) -> Vec<String>;

    fn is_game_over(&self) -> bool {
        false
    }

    fn game_over_frame(&self) -> Vec<String> {
        self.frame()
    }

    /// `[highlight group, vim regex]` pairs for the editor to apply.
    fn match_patterns(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameEntry {
    pub key: &'static str,
    pub name: &'static str,
    pub tick_ms: u64,
}

pub const REGISTRY: &[GameEntry] = &[
    GameEntry {
        key: "b",
        name: "Coffee Break!",
        tick_ms: 1040,
    },
    GameEntry {
        key: "z",
        name: "Zen Spiral",
        tick_ms: 500,
    },
    GameEntry {
        key: "s",
        name: "Snake",
        tick_ms: 200,
    },
    GameEntry {
        key: "p",
        name: "Pong",
        tick_ms: 100,
    },
    GameEntry {
        key: "w",
        name: "Global Thermonuclear War",
        tick_ms: 200,
    },
    GameEntry {
        key: "m",
        name: "Matrix",
        tick_ms: 80,
    },
    GameEntry {
        key: "r",
        name: "Rabbit vs Snake",
        tick_ms: 200,
    },
];

pub fn lookup(key: &str) -> Option<&'static GameEntry> {
    REGISTRY.iter().find(|e| e.key == key)
}

pub fn tick_rate(key: &str) -> u64 {
    lookup(key).map(|e| e.tick_ms).unwrap_or(DEFAULT_TICK_MS)
}

/// Enum dispatching to one of the concrete games.
pub enum AnyGame {
    CoffeeCup(CoffeeCup),
    ZenSpiral(ZenSpiral),
    Snake(Snake),
    Pong(Pong),
    WarGames(WarGames),
    Matrix(Matrix),
    Rabbit(RabbitVsSnake),
}

impl AnyGame {
    pub fn new(key: &str, width: usize, height: usize, rng: StdRng) -> Option<Self> {
        let game = match key {
            "b" => AnyGame::CoffeeCup(CoffeeCup::new(width, height, rng)),
            "z" => AnyGame::ZenSpiral(ZenSpiral::new(width, height)),
            "s" => AnyGame::Snake(Snake::new(width, height, rng)),
            "p" => AnyGame::Pong(Pong::new(width, height, rng)),
            "w" => AnyGame::WarGames(WarGames::new(width, height, rng)),
            "m" => AnyGame::Matrix(Matrix::new(width, height, rng)),
            "r" => AnyGame::Rabbit(RabbitVsSnake::new(width, height, rng)),
            _ => return None,
        };
        Some(game)
    }
}

macro_rules! dispatch {
    ($self:ident, $g:ident => $body:expr) => {
        match $self {
            AnyGame::CoffeeCup($g) => $body,
            AnyGame::ZenSpiral($g) => $body,
            AnyGame::Snake($g) => $body,
            AnyGame::Pong($g) => $body,
            AnyGame::WarGames($g) => $body,
            AnyGame::Matrix($g) => $body,
            AnyGame::Rabbit($g) => $body,
        }
    };
}

impl Game for AnyGame {
    fn tick(&mut self) {
        dispatch!(self, g => g.tick())
    }

    fn handle_input(&mut self, key: &str) {
        dispatch!(self, g => g.handle_input(key))
    }

    fn frame(&self) -> Vec<String> {
        dispatch!(self, g => g.frame())
    }

    fn is_game_over(&self) -> bool {
        dispatch!(self, g => g.is_game_over())
    }

    fn game_over_frame(&self) -> Vec<String> {
        dispatch!(self, g => g.game_over_frame())
    }

    fn match_patterns(&self) -> Vec<(String, String)> {
        dispatch!(self, g => g.match_patterns())
    }
}

const MENU_INNER: usize = 44;

/// Game selection box centred in a `width` x `height` window.
pub fn menu(width: usize, height: usize) -> Vec<String> {
    let rule = "═".repeat(MENU_INNER);
    let row = |text: &str| format!("║{text:<width$}║", width = MENU_INNER);

    let mut body = vec![
        format!("╔{rule}╗"),
        // Emoji are two cells wide, so this row is laid out by hand.
        "║           🎮  Mini-Games  🎮               ║".to_string(),
        format!("╠{rule}╣"),
        row(""),
    ];
    for entry in REGISTRY {
        body.push(row(&format!("   [{}]  {}", entry.key, entry.name)));
    }
    body.push(row(""));
    body.push(row("   Press key to start game"));
    body.push(row("   [c] to go back"));
    body.push(row(""));
    body.push(format!("╚{rule}╝"));

    let left = " ".repeat(width.saturating_sub(MENU_INNER + 2) / 2);
    let top = height.saturating_sub(body.len()) / 2;

    let mut lines = vec![String::new(); top];
    lines.extend(body.into_iter().map(|l| format!("{left}{l}")));
    lines
}

/// Holds the game currently being played, if any.
#[derive(Default)]
pub struct GameManager {
    active: Option<AnyGame>,
}

impl GameManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the game bound to `key`, replacing any running game.
    /// Returns its tick interval, or `None` for an unknown key.
    pub fn start(&mut self, key: &str, width: usize, height: usize) -> Option<u64> {
        self.start_with_rng(key, width, height, StdRng::from_entropy())
    }

    pub fn start_seeded(&mut self, key: &str, width: usize, height: usize, seed: u64) -> Option<u64> {
        self.start_with_rng(key, width, height, StdRng::seed_from_u64(seed))
    }

    fn start_with_rng(&mut self, key: &str, width: usize, height: usize, rng: StdRng) -> Option<u64> {
        let Some(game) = AnyGame::new(key, width, height, rng) else {
            debug!(key, "no game bound to key");
            return None;
        };
        debug!(key, width, height, "starting game");
        self.active = Some(game);
        Some(tick_rate(key))
    }

    pub fn stop(&mut self) {
        self.active = None;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn tick(&mut self) -> Vec<String> {
        match self.active {
            Some(ref mut game) => {
                game.tick();
                current_frame(game)
            }
            None => Vec::new(),
        }
    }

    pub fn input(&mut self, key: &str) -> Vec<String> {
        match self.active {
            Some(ref mut game) => {
                game.handle_input(key);
                current_frame(game)
            }
            None => Vec::new(),
        }
    }

    pub fn match_patterns(&self) -> Vec<(String, String)> {
        self.active
            .as_ref()
            .map(|g| g.match_patterns())
            .unwrap_or_default()
    }
}

fn current_frame(game: &AnyGame) -> Vec<String> {
    if game.is_game_over() {
        game.game_over_frame()
    } else {
        game.frame()
    }
}

/// Blank `width` x `height` character grid.
pub(crate) fn blank_grid(width: usize, height: usize) -> Vec<Vec<char>> {
    vec![vec![' '; width]; height]
}

pub(crate) fn grid_lines(grid: &[Vec<char>]) -> Vec<String> {
    grid.iter().map(|row| row.iter().collect()).collect()
}
