use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::{Game, blank_grid, grid_lines};

const WINNING_SCORE: u32 = 5;
const PADDLE_HEIGHT: i32 = 5;
const AI_SPEED: i32 = 1;
const SERVE_DELAY: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Human,
    Ai,
}

/// Human on the left (`j`/`k`) against an AI paddle on the right.
pub struct Pong {
    width: i32,
    height: i32,
    paddle_h: i32,
    left_x: i32,
    right_x: i32,
    left_y: i32,
    right_y: i32,
    ball_x: i32,
    ball_y: i32,
    ball_dx: i32,
    ball_dy: i32,
    serve_delay: u32,
    left_score: u32,
    right_score: u32,
    winner: Option<Side>,
    rng: StdRng,
}

impl Pong {
    pub fn new(width: usize, height: usize, mut rng: StdRng) -> Self {
        let width = width.max(30) as i32;
        let height = (height.saturating_sub(6) as i32).max(12);
        let paddle_h = PADDLE_HEIGHT.min(height / 3);
        let ball_dx = if rng.gen_bool(0.5) { 1 } else { -1 };
        let ball_dy = random_dy(&mut rng);

        Self {
            width,
            height,
            paddle_h,
            left_x: 1,
            right_x: width - 2,
            left_y: (height - paddle_h) / 2,
            right_y: (height - paddle_h) / 2,
            ball_x: width / 2,
            ball_y: height / 2,
            ball_dx,
            ball_dy,
            serve_delay: SERVE_DELAY,
            left_score: 0,
            right_score: 0,
            winner: None,
            rng,
        }
    }

    fn reset_ball(&mut self, dx: i32) {
        self.ball_x = self.width / 2;
        self.ball_y = self.height / 2;
        self.ball_dx = dx;
        self.ball_dy = random_dy(&mut self.rng);
        self.serve_delay = SERVE_DELAY;
    }

    fn move_ai(&mut self) {
        let center = self.right_y + self.paddle_h / 2;
        let target = if self.ball_dy == 0 && self.ball_dx < 0 {
            self.height / 2
        } else {
            self.ball_y
        };

        if center < target {
            self.right_y = (self.right_y + AI_SPEED).min(self.height - self.paddle_h);
        } else if center > target {
            self.right_y = (self.right_y - AI_SPEED).max(0);
        }
    }

    /// Vertical direction after a paddle hit, by where on the paddle it landed.
    fn deflect(&self, hit_pos: i32) -> i32 {
        let mid = self.paddle_h / 2;
        (hit_pos - mid).signum()
    }

    /// Award a point. Returns true when the game has been won.
    fn score(&mut self, side: Side) -> bool {
        let (score, serve_dx) = match side {
            Side::Human => (&mut self.left_score, -1),
            Side::Ai => (&mut self.right_score, 1),
        };
        *score += 1;
        if *score >= WINNING_SCORE {
            self.winner = Some(side);
            return true;
        }
        self.reset_ball(serve_dx);
        self.move_ai();
        false
    }

    fn score_line(&self) -> String {
        let half = (self.width / 2 - 2).max(0) as usize;
        let left = format!("YOU: {}", self.left_score);
        let right = format!("AI: {}", self.right_score);
        format!("{left:>half$}    {right:<half$}")
    }

    fn score_bar(&self) -> String {
        let dots = |n: u32| {
            format!(
                "[{}{}]",
                "*".repeat(n as usize),
                ".".repeat((WINNING_SCORE - n.min(WINNING_SCORE)) as usize)
            )
        };
        let half = (self.width / 2) as usize;
        format!(
            "{:<half$}{}",
            format!("  {}", dots(self.left_score)),
            dots(self.right_score)
        )
    }
}

fn random_dy(rng: &mut StdRng) -> i32 {
    *[-1, 0, 1].choose(rng).unwrap_or(&0)
}

impl Game for Pong {
    fn tick(&mut self) {
        if self.winner.is_some() {
            return;
        }

        if self.serve_delay > 0 {
            self.serve_delay -= 1;
            self.move_ai();
            return;
        }

        let mut new_x = self.ball_x + self.ball_dx;
        let mut new_y = self.ball_y + self.ball_dy;

        if new_y < 0 {
            new_y = -new_y;
            self.ball_dy = -self.ball_dy;
        } else if new_y >= self.height {
            new_y = 2 * (self.height - 1) - new_y;
            self.ball_dy = -self.ball_dy;
        }

        if new_x <= self.left_x {
            if (self.left_y..self.left_y + self.paddle_h).contains(&new_y) {
                new_x = self.left_x + 1;
                self.ball_dx = 1;
                self.ball_dy = self.deflect(new_y - self.left_y);
            } else {
                self.score(Side::Ai);
                return;
            }
        }

        if new_x >= self.right_x {
            if (self.right_y..self.right_y + self.paddle_h).contains(&new_y) {
                new_x = self.right_x - 1;
                self.ball_dx = -1;
                self.ball_dy = self.deflect(new_y - self.right_y);
            } else {
                self.score(Side::Human);
                return;
            }
        }

        self.ball_x = new_x;
        self.ball_y = new_y.clamp(0, self.height - 1);
        self.move_ai();
    }

    fn handle_input(&mut self, key: &str) {
        match key {
            "j" => self.left_y = (self.left_y + 1).min(self.height - self.paddle_h),
            "k" => self.left_y = (self.left_y - 1).max(0),
            _ => {}
        }
    }

    fn frame(&self) -> Vec<String> {
        let mut grid = blank_grid(self.width as usize, self.height as usize);

        let center_x = (self.width / 2) as usize;
        for (y, row) in grid.iter_mut().enumerate() {
            if y % 2 == 0 {
                row[center_x] = ':';
            }
        }

        for (x, top) in [(self.left_x, self.left_y), (self.right_x, self.right_y)] {
            for y in top..top + self.paddle_h {
                if (0..self.height).contains(&y) {
                    grid[y as usize][x as usize] = '|';
                }
            }
        }

        if (0..self.height).contains(&self.ball_y) && (0..self.width).contains(&self.ball_x) {
            grid[self.ball_y as usize][self.ball_x as usize] = '*';
        }

        let mut lines = grid_lines(&grid);
        lines.push(String::new());
        lines.push(self.score_line());
        lines.push(self.score_bar());
        lines.push(format!(
            "  Pong  |  j/k to move  |  First to {WINNING_SCORE}  |  [c] cancel"
        ));
        lines
    }

    fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    fn game_over_frame(&self) -> Vec<String> {
        let (title, tagline) = match self.winner {
            Some(Side::Human) => ("YOU WIN!", "Great game, champion!"),
            _ => ("AI WINS!", "Better luck next time!"),
        };
        let score = format!("Score: {} - {}", self.left_score, self.right_score);

        let mut lines = vec![String::new(); 2 + (self.height / 2 - 5).max(0) as usize];
        lines.push("        ╔═══════════════════════════════╗".to_string());
        lines.push("        ║                               ║".to_string());
        lines.push(format!("        ║     {title:<26}║"));
        lines.push(format!("        ║     {score:<26}║"));
        lines.push("        ║                               ║".to_string());
        lines.push(format!("        ║     {tagline:<26}║"));
        lines.push("        ╚═══════════════════════════════╝".to_string());
        lines.push(String::new());
        lines.push("  Pong  |  [c] cancel".to_string());
        lines
    }
}
