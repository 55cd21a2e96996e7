use std::collections::{HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::{Game, blank_grid, grid_lines};

const INITIAL_PELLETS: usize = 5;
const PELLETS_ON_EAT: usize = 2;
const GROW_ON_EAT: usize = 2;

pub(crate) type Cell = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub(crate) fn from_key(key: &str) -> Option<Self> {
        match key {
            "h" => Some(Direction::Left),
            "l" => Some(Direction::Right),
            "k" => Some(Direction::Up),
            "j" => Some(Direction::Down),
            _ => None,
        }
    }

    pub(crate) fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// The two directions at right angles to this one.
    pub(crate) fn turns(self) -> [Self; 2] {
        match self {
            Direction::Left | Direction::Right => [Direction::Up, Direction::Down],
            Direction::Up | Direction::Down => [Direction::Left, Direction::Right],
        }
    }

    /// One step from `(x, y)` on a board that wraps at both edges.
    pub(crate) fn step(self, (x, y): Cell, width: usize, height: usize) -> Cell {
        match self {
            Direction::Left => ((x + width - 1) % width, y),
            Direction::Right => ((x + 1) % width, y),
            Direction::Up => (x, (y + height - 1) % height),
            Direction::Down => (x, (y + 1) % height),
        }
    }
}

/// Classic snake on a wrapping board. `h/j/k/l` steer.
pub struct Snake {
    width: usize,
    height: usize,
    direction: Direction,
    /// Head first.
    body: VecDeque<Cell>,
    pellets: Vec<Cell>,
    grow_pending: usize,
    score: u32,
    game_over: bool,
    rng: StdRng,
}

impl Snake {
    pub fn new(width: usize, height: usize, rng: StdRng) -> Self {
        let width = width.max(15);
        let height = height.saturating_sub(2).max(10);
        let (cx, cy) = (width / 2, height / 2);

        let mut snake = Self {
            width,
            height,
            direction: Direction::Right,
            body: VecDeque::from([(cx, cy), (cx - 1, cy), (cx - 2, cy)]),
            pellets: Vec::new(),
            grow_pending: 0,
            score: 0,
            game_over: false,
            rng,
        };
        snake.spawn_pellets(INITIAL_PELLETS);
        snake
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    fn spawn_pellets(&mut self, count: usize) {
        let occupied: HashSet<Cell> = self.body.iter().chain(&self.pellets).copied().collect();
        let free: Vec<Cell> = (0..self.width)
            .flat_map(|x| (0..self.height).map(move |y| (x, y)))
            .filter(|c| !occupied.contains(c))
            .collect();
        let picked: Vec<Cell> = free
            .choose_multiple(&mut self.rng, count)
            .copied()
            .collect();
        self.pellets.extend(picked);
    }

    fn next_head(&self) -> Cell {
        self.direction.step(self.body[0], self.width, self.height)
    }
}

impl Game for Snake {
    fn tick(&mut self) {
        if self.game_over {
            return;
        }

        let head = self.next_head();

        // The tail moves out of the way unless the snake is growing.
        let check_len = if self.grow_pending == 0 {
            self.body.len() - 1
        } else {
            self.body.len()
        };
        if self.body.iter().take(check_len).any(|&c| c == head) {
            self.game_over = true;
            return;
        }

        self.body.push_front(head);

        if let Some(pos) = self.pellets.iter().position(|&p| p == head) {
            self.pellets.remove(pos);
            self.score += 1;
            self.grow_pending += GROW_ON_EAT;
            self.spawn_pellets(PELLETS_ON_EAT);
        }

        if self.grow_pending > 0 {
            self.grow_pending -= 1;
        } else {
            self.body.pop_back();
        }
    }

    fn handle_input(&mut self, key: &str) {
        if let Some(dir) = Direction::from_key(key)
            && dir != self.direction.opposite()
        {
            self.direction = dir;
        }
    }

    fn frame(&self) -> Vec<String> {
        let mut grid = blank_grid(self.width, self.height);
        for &(x, y) in &self.pellets {
            grid[y][x] = '*';
        }
        for &(x, y) in self.body.iter().skip(1) {
            grid[y][x] = '#';
        }
        let (hx, hy) = self.body[0];
        grid[hy][hx] = '@';

        let mut lines = grid_lines(&grid);
        lines.push(String::new());
        lines.push(format!(
            "  Snake  |  Score: {}  |  h/j/k/l to move  |  [c] back",
            self.score
        ));
        lines
    }

    fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn game_over_frame(&self) -> Vec<String> {
        let mut lines = vec![String::new(); 3 + (self.height / 2).saturating_sub(3)];
        lines.push("        ╔═══════════════════════╗".to_string());
        lines.push("        ║      GAME OVER!       ║".to_string());
        lines.push(format!("        ║     Score: {:<10} ║", self.score));
        lines.push("        ║                       ║".to_string());
        lines.push("        ║   [c] back to loading ║".to_string());
        lines.push("        ╚═══════════════════════╝".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn snake(width: usize, height: usize) -> Snake {
        Snake::new(width, height, StdRng::seed_from_u64(11))
    }

    #[test]
    fn test_initial_state() {
        let s = snake(40, 22);
        assert_eq!((s.width, s.height), (40, 20));
        assert_eq!(s.body.len(), 3);
        assert_eq!(s.body[0], (20, 10));
        assert_eq!(s.pellets.len(), INITIAL_PELLETS);
        assert!(s.pellets.iter().all(|p| !s.body.contains(p)));
    }

    #[test]
    fn test_minimum_board_size() {
        let s = snake(3, 3);
        assert_eq!((s.width, s.height), (15, 10));
    }

    #[test]
    fn test_single_tick_moves_right() {
        let mut s = snake(40, 22);
        s.pellets.clear();
        let (hx, hy) = s.body[0];
        s.tick();
        assert_eq!(s.body.len(), 3);
        assert_eq!(s.body[0], ((hx + 1) % s.width, hy));
        assert!(!s.is_game_over());
    }

    #[test]
    fn test_wraps_around_edges() {
        let mut s = snake(15, 12);
        s.pellets.clear();
        for _ in 0..s.width {
            s.tick();
        }
        assert_eq!(s.body[0], (7, 5));
        assert!(!s.is_game_over());
    }

    #[test]
    fn test_cannot_reverse() {
        let mut s = snake(40, 22);
        s.handle_input("h");
        assert_eq!(s.direction, Direction::Right);
        s.handle_input("k");
        assert_eq!(s.direction, Direction::Up);
        s.handle_input("j");
        assert_eq!(s.direction, Direction::Up);
        s.handle_input("q");
        assert_eq!(s.direction, Direction::Up);
    }

    #[test]
    fn test_eating_grows_and_spawns() {
        let mut s = snake(40, 22);
        let (hx, hy) = s.body[0];
        s.pellets = vec![(hx + 1, hy)];
        s.tick();
        assert_eq!(s.score(), 1);
        assert_eq!(s.body.len(), 4);
        assert_eq!(s.pellets.len(), PELLETS_ON_EAT);
        s.pellets.clear();
        s.tick();
        assert_eq!(s.body.len(), 5);
        s.tick();
        assert_eq!(s.body.len(), 5);
    }

    #[test]
    fn test_self_collision_ends_game() {
        let mut s = snake(40, 22);
        s.pellets.clear();
        s.body = VecDeque::from([(10, 10), (11, 10), (11, 11), (10, 11), (9, 11), (9, 10)]);
        s.direction = Direction::Down;
        s.tick();
        assert!(s.is_game_over());
        let text = s.game_over_frame().join("\n");
        assert!(text.contains("GAME OVER"));
        assert!(text.contains("Score: 0"));
    }

    #[test]
    fn test_moving_into_vacating_tail_is_allowed() {
        let mut s = snake(40, 22);
        s.pellets.clear();
        s.body = VecDeque::from([(10, 10), (11, 10), (11, 11), (10, 11)]);
        s.direction = Direction::Down;
        s.tick();
        assert!(!s.is_game_over());
        assert_eq!(s.body[0], (10, 11));
    }

    #[test]
    fn test_frame_draws_head_body_pellets() {
        let mut s = snake(20, 12);
        s.pellets = vec![(0, 0)];
        let frame = s.frame();
        assert_eq!(frame.len(), s.height + 2);
        assert_eq!(frame[0].chars().next(), Some('*'));
        let row = &frame[s.height / 2];
        assert!(row.contains("##@"));
        assert!(frame.last().unwrap().contains("Score: 0"));
    }
}
