use super::{Game, blank_grid, grid_lines};

const SPIRAL_CHARS: [char; 5] = ['.', 'o', '*', '~', '+'];
const GROWTH: f64 = 0.5;
const STEP: f64 = 0.3;

/// Archimedean spiral `r = 0.5θ` drawn one point per tick. Starts over once
/// it leaves the window.
pub struct ZenSpiral {
    width: usize,
    height: usize,
    theta: f64,
    points: Vec<(usize, usize)>,
}

impl ZenSpiral {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(10),
            height: height.saturating_sub(2).max(10),
            theta: 0.0,
            points: Vec::new(),
        }
    }

    fn next_point(&self) -> Option<(usize, usize)> {
        let r = GROWTH * self.theta;
        let cx = (self.width / 2) as f64;
        let cy = (self.height / 2) as f64;
        // Cells are about twice as tall as wide.
        let x = (cx + r * self.theta.cos() * 2.0).trunc();
        let y = (cy + r * self.theta.sin()).trunc();

        let in_bounds =
            x >= 0.0 && y >= 0.0 && (x as usize) < self.width && (y as usize) < self.height;
        in_bounds.then_some((x as usize, y as usize))
    }
}

impl Game for ZenSpiral {
    fn tick(&mut self) {
        match self.next_point() {
            Some(point) => {
                self.points.push(point);
                self.theta += STEP;
            }
            None => {
                self.points.clear();
                self.theta = 0.0;
            }
        }
    }

    fn handle_input(&mut self, _key: &str) {}

    fn frame(&self) -> Vec<String> {
        let mut grid = blank_grid(self.width, self.height);
        for (i, &(x, y)) in self.points.iter().enumerate() {
            grid[y][x] = SPIRAL_CHARS[i % SPIRAL_CHARS.len()];
        }

        let mut lines = grid_lines(&grid);
        lines.push(String::new());
        lines.push("  Zen Spiral  |  [c] cancel".to_string());
        lines
    }
}
