use std::collections::{HashSet, VecDeque};

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::Game;
use super::snake::{Cell, Direction};

const INITIAL_PELLETS: usize = 20;
const PELLETS_ON_EAT: usize = 2;
const GROW_ON_EAT: usize = 2;
const ENEMY_LENGTH: usize = 13;
/// Chance per tick that the enemy snake turns.
const ENEMY_TURN_CHANCE: f64 = 0.2;

// Every cell is two terminal columns wide.
const CELL_EMPTY: &str = "  ";
const CELL_HEAD: &str = "\u{1F430}";
const CELL_TAIL: &str = "\u{26AA}";
const CELL_ENEMY_HEAD: &str = "\u{1F40D}";
const CELL_ENEMY_TAIL: &str = "\u{1F7E2}";
const CELL_SKULL: &str = "\u{1F480}";
const PELLET_EMOJIS: [&str; 3] = ["\u{1F955}", "\u{1F96C}", "\u{1F966}"];

const HIT_ITSELF: &str = "Rabbit hit itself!";
const HIT_SNAKE: &str = "Rabbit hit the snake!";
const ATE_SKULL: &str = "Rabbit ate a poisoned pellet!";
const CAUGHT: &str = "The snake caught the rabbit!";

/// Box interior width of the game-over screen.
const OVER_INNER: usize = 29;

/// Rabbit vs Snake: steer the rabbit after vegetables while an enemy snake
/// wanders the board. Vegetables the snake eats turn into skulls.
///
/// `h/j/k/l` or `w/a/s/d` steer; `p` starts over once the game has ended.
pub struct RabbitVsSnake {
    width: usize,
    height: usize,
    direction: Direction,
    /// Head first.
    rabbit: VecDeque<Cell>,
    enemy: VecDeque<Cell>,
    enemy_direction: Direction,
    pellets: Vec<(Cell, &'static str)>,
    skulls: HashSet<Cell>,
    grow_pending: usize,
    score: u32,
    game_over: Option<&'static str>,
    turn_chance: f64,
    rng: StdRng,
}

fn wasd(key: &str) -> &str {
    match key {
        "a" => "h",
        "d" => "l",
        "w" => "k",
        "s" => "j",
        other => other,
    }
}

impl RabbitVsSnake {
    pub fn new(width: usize, height: usize, rng: StdRng) -> Self {
        let mut game = Self {
            width: (width / 2).max(10),
            height: height.saturating_sub(2).max(10),
            direction: Direction::Right,
            rabbit: VecDeque::new(),
            enemy: VecDeque::new(),
            enemy_direction: Direction::Left,
            pellets: Vec::new(),
            skulls: HashSet::new(),
            grow_pending: 0,
            score: 0,
            game_over: None,
            turn_chance: ENEMY_TURN_CHANCE,
            rng,
        };
        game.reset();
        game
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn game_over_reason(&self) -> Option<&'static str> {
        self.game_over
    }

    fn reset(&mut self) {
        let (cx, cy) = (self.width / 2, self.height / 2);
        self.direction = Direction::Right;
        self.rabbit = VecDeque::from([(cx, cy), (cx - 1, cy), (cx - 2, cy)]);

        // Upper-left quarter, heading left with the body trailing right.
        let (ex, ey) = (self.width / 4, self.height / 4);
        self.enemy = (0..ENEMY_LENGTH)
            .map(|i| ((ex + i) % self.width, ey))
            .collect();
        self.enemy_direction = Direction::Left;

        self.skulls.clear();
        self.pellets.clear();
        self.grow_pending = 0;
        self.score = 0;
        self.game_over = None;
        self.spawn_pellets(INITIAL_PELLETS);
    }

    fn spawn_pellets(&mut self, count: usize) {
        let occupied: HashSet<Cell> = self
            .rabbit
            .iter()
            .chain(&self.enemy)
            .chain(&self.skulls)
            .chain(self.pellets.iter().map(|(c, _)| c))
            .copied()
            .collect();
        let free: Vec<Cell> = (0..self.width)
            .flat_map(|x| (0..self.height).map(move |y| (x, y)))
            .filter(|c| !occupied.contains(c))
            .collect();

        let picked: Vec<Cell> = free
            .choose_multiple(&mut self.rng, count)
            .copied()
            .collect();
        for cell in picked {
            let emoji = PELLET_EMOJIS
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(PELLET_EMOJIS[0]);
            self.pellets.push((cell, emoji));
        }
    }

    fn take_pellet(&mut self, cell: Cell) -> bool {
        match self.pellets.iter().position(|&(c, _)| c == cell) {
            Some(pos) => {
                self.pellets.remove(pos);
                true
            }
            None => false,
        }
    }

    /// The enemy has a fixed length, may cross its own body and turns at
    /// random. Whatever it eats becomes a skull.
    fn tick_enemy(&mut self) {
        if self.rng.gen_bool(self.turn_chance)
            && let Some(&turn) = self.enemy_direction.turns().choose(&mut self.rng)
        {
            self.enemy_direction = turn;
        }

        let Some(&head) = self.enemy.front() else {
            return;
        };
        let head = self.enemy_direction.step(head, self.width, self.height);
        self.enemy.push_front(head);
        self.enemy.pop_back();

        if self.take_pellet(head) {
            self.skulls.insert(head);
            self.spawn_pellets(1);
        }
        if self.rabbit.contains(&head) {
            self.game_over = Some(CAUGHT);
        }
    }

    fn tick_rabbit(&mut self) {
        let head = self
            .direction
            .step(self.rabbit[0], self.width, self.height);

        // The tail moves out of the way unless the rabbit is growing.
        let check_len = if self.grow_pending == 0 {
            self.rabbit.len() - 1
        } else {
            self.rabbit.len()
        };
        let reason = if self.rabbit.iter().take(check_len).any(|&c| c == head) {
            Some(HIT_ITSELF)
        } else if self.enemy.contains(&head) {
            Some(HIT_SNAKE)
        } else if self.skulls.contains(&head) {
            Some(ATE_SKULL)
        } else {
            None
        };
        if reason.is_some() {
            self.game_over = reason;
            return;
        }

        self.rabbit.push_front(head);

        if self.take_pellet(head) {
            self.score += 1;
            self.grow_pending += GROW_ON_EAT;
            self.spawn_pellets(PELLETS_ON_EAT);
        }

        if self.grow_pending > 0 {
            self.grow_pending -= 1;
        } else {
            self.rabbit.pop_back();
        }
    }
}

impl Game for RabbitVsSnake {
    fn tick(&mut self) {
        if self.game_over.is_some() {
            return;
        }
        self.tick_enemy();
        if self.game_over.is_none() {
            self.tick_rabbit();
        }
    }

    fn handle_input(&mut self, key: &str) {
        if self.game_over.is_some() {
            if key == "p" {
                self.reset();
            }
            return;
        }
        if let Some(dir) = Direction::from_key(wasd(key))
            && dir != self.direction.opposite()
        {
            self.direction = dir;
        }
    }

    fn frame(&self) -> Vec<String> {
        let mut grid = vec![vec![CELL_EMPTY; self.width]; self.height];
        for &((x, y), emoji) in &self.pellets {
            grid[y][x] = emoji;
        }
        for &(x, y) in &self.skulls {
            grid[y][x] = CELL_SKULL;
        }
        for &(x, y) in self.enemy.iter().skip(1) {
            grid[y][x] = CELL_ENEMY_TAIL;
        }
        if let Some(&(x, y)) = self.enemy.front() {
            grid[y][x] = CELL_ENEMY_HEAD;
        }
        for &(x, y) in self.rabbit.iter().skip(1) {
            grid[y][x] = CELL_TAIL;
        }
        let (hx, hy) = self.rabbit[0];
        grid[hy][hx] = CELL_HEAD;

        let mut lines: Vec<String> = grid.iter().map(|row| row.concat()).collect();
        lines.push(String::new());
        lines.push(format!(
            "  Rabbit vs Snake  |  Score: {}  |  h/j/k/l or w/a/s/d to move  |  [c] cancel",
            self.score
        ));
        lines
    }

    fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    fn game_over_frame(&self) -> Vec<String> {
        let rule = "═".repeat(OVER_INNER + 2);
        let row = |text: &str| format!("        ║ {text:^width$} ║", width = OVER_INNER);

        let mut lines = vec![String::new(); 3 + (self.height / 2).saturating_sub(3)];
        lines.push(format!("        ╔{rule}╗"));
        lines.push(row("GAME OVER!"));
        lines.push(row(self.game_over.unwrap_or("")));
        lines.push(row(&format!("Score: {}", self.score)));
        lines.push(format!("        ╚{rule}╝"));
        lines.push(String::new());
        lines.push("  Rabbit vs Snake  |  [p] play again?  |  [c] cancel".to_string());
        lines
    }
}
