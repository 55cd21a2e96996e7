use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::Game;

const PASSWORD: &str = "joshua";
const MAX_LAUNCHES: usize = 3;
const MISSILE_TICKS: u32 = 5;

const COUNTRIES: [&str; 15] = [
    "UNITED STATES",
    "SOVIET UNION",
    "UNITED KINGDOM",
    "FRANCE",
    "CHINA",
    "INDIA",
    "JAPAN",
    "WEST GERMANY",
    "AUSTRALIA",
    "BRAZIL",
    "CANADA",
    "IRAN",
    "NORTH KOREA",
    "EGYPT",
    "ISRAEL",
];

const GLOBE: [&str; 9] = [
    r#"               _.--"""--.._"#,
    r"            .'  N. AMERICA  '.",
    r"           /    .---. EUROPE  \",
    r"          |    |     |  ASIA   |",
    r"          |     '---'          |",
    r"          |    AFRICA     .--. |",
    r"           \  S. AMERICA |AU| /",
    r"            '.           '--'.'",
    r"              ''--.....--''",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Password,
    Globe,
    Missile,
    GreatChoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shooter {
    Human,
    Wopr,
}

/// Global Thermonuclear War. Log in as `joshua`, press `x` to launch.
pub struct WarGames {
    height: usize,
    phase: Phase,
    typed: String,
    password_rejected: bool,
    human_targets: Vec<&'static str>,
    wopr_targets: Vec<&'static str>,
    pool: Vec<&'static str>,
    anim_ticks: u32,
    shooter: Shooter,
    game_over: bool,
    rng: StdRng,
}

impl WarGames {
    pub fn new(_width: usize, height: usize, mut rng: StdRng) -> Self {
        let mut pool = COUNTRIES.to_vec();
        pool.shuffle(&mut rng);
        Self {
            height: height.saturating_sub(4).max(16),
            phase: Phase::Password,
            typed: String::new(),
            password_rejected: false,
            human_targets: Vec::new(),
            wopr_targets: Vec::new(),
            pool,
            anim_ticks: 0,
            shooter: Shooter::Human,
            game_over: false,
            rng,
        }
    }

    fn launches(&self) -> usize {
        self.human_targets.len()
    }

    fn defcon(&self) -> usize {
        5usize.saturating_sub(self.launches()).max(1)
    }

    fn wopr_fire(&mut self) {
        let target = match self.pool.pop() {
            Some(t) => t,
            None => COUNTRIES.choose(&mut self.rng).copied().unwrap_or(COUNTRIES[0]),
        };
        self.wopr_targets.push(target);
    }

    fn type_password(&mut self, key: &str) {
        let mut chars = key.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return;
        };
        if !ch.is_ascii_alphabetic() {
            return;
        }
        self.typed.push(ch.to_ascii_lowercase());
        self.password_rejected = false;
        if self.typed.len() >= PASSWORD.len() {
            if self.typed == PASSWORD {
                self.phase = Phase::Globe;
            } else {
                self.password_rejected = true;
                self.typed.clear();
            }
        }
    }

    fn war_room_header(&self) -> Vec<String> {
        vec![
            String::new(),
            "   ══════════ W.O.P.R. ══════════".to_string(),
            "   GLOBAL THERMONUCLEAR WAR".to_string(),
            format!("   DEFCON: {}", self.defcon()),
            String::new(),
        ]
    }

    fn launch_log(&self) -> Vec<String> {
        let human = self
            .human_targets
            .iter()
            .enumerate()
            .map(|(i, t)| format!("   YOU  >> MISSILE #{} -> {t}", i + 1));
        let wopr = self
            .wopr_targets
            .iter()
            .enumerate()
            .map(|(i, t)| format!("   WOPR >> MISSILE #{} -> {t}", i + 1));
        human.chain(wopr).collect()
    }

    fn globe_lines() -> impl Iterator<Item = String> {
        GLOBE.iter().map(|row| format!("   {row}"))
    }

    fn password_frame(&self) -> Vec<String> {
        let mut prompt = self.typed.clone();
        prompt.push_str(&"_".repeat(PASSWORD.len() - self.typed.len()));
        let msg = if self.password_rejected {
            "IDENTIFICATION NOT RECOGNIZED."
        } else {
            "ENTER PASSWORD TO CONTINUE..."
        };

        let mut lines = vec![String::new(); self.height.saturating_sub(14) / 2];
        lines.extend([
            "   ╔═════════════════════════════════════════╗".to_string(),
            "   ║                                         ║".to_string(),
            "   ║   GREETINGS PROFESSOR FALKEN.           ║".to_string(),
            "   ║                                         ║".to_string(),
            "   ║   SHALL WE PLAY A GAME?                 ║".to_string(),
            "   ║                                         ║".to_string(),
            format!("   ║   PASSWORD: [ {prompt:<6} ]                  ║"),
            "   ║                                         ║".to_string(),
            format!("   ║   {msg:<37}  ║"),
            "   ║                                         ║".to_string(),
            "   ║                                         ║".to_string(),
            "   ╚═════════════════════════════════════════╝".to_string(),
            String::new(),
            "  WarGames  |  Type password  |  [c] cancel".to_string(),
        ]);
        lines
    }

    fn globe_frame(&self) -> Vec<String> {
        let mut lines = self.war_room_header();
        lines.extend(Self::globe_lines());
        lines.push(String::new());

        let log = self.launch_log();
        if !log.is_empty() {
            lines.extend(log);
            lines.push(String::new());
        }

        lines.push(format!(
            "   [x] LAUNCH ({} remaining)",
            MAX_LAUNCHES - self.launches()
        ));
        lines.push(String::new());
        lines.push("  WarGames  |  [c] cancel".to_string());
        lines
    }

    fn missile_frame(&self) -> Vec<String> {
        let (label, target) = match self.shooter {
            Shooter::Human => ("YOU", self.human_targets.last()),
            Shooter::Wopr => ("WOPR", self.wopr_targets.last()),
        };
        let trail = "=".repeat((self.anim_ticks as usize * 4).min(20));
        let warhead = if self.anim_ticks < 4 { '>' } else { '*' };

        let mut lines = self.war_room_header();
        lines.push(format!(
            "   {label} LAUNCHING AT: {}",
            target.copied().unwrap_or("")
        ));
        lines.push(String::new());
        lines.push(format!("   [{trail}{warhead}]"));
        lines.push(String::new());
        lines.extend(Self::globe_lines());
        lines.push(String::new());
        lines.extend(self.launch_log());
        lines.push(String::new());
        lines.push("  WarGames  |  [c] cancel".to_string());
        lines
    }

    fn great_choice_frame(&self) -> Vec<String> {
        let mut lines = vec![String::new(); self.height.saturating_sub(12) / 2];
        lines.extend(
            [
                "    ╔══════════════════════════════════════════════════╗",
                "    ║                                                  ║",
                "    ║    ██████ ██████ ██████  █████ ████████ ██       ║",
                "    ║   ██      ██   █ ██     ██   ██   ██   ██       ║",
                "    ║   ██  ██  █████  ████   ███████   ██   ██       ║",
                "    ║   ██   █  ██  █  ██     ██   ██   ██            ║",
                "    ║    █████  ██  ██ ██████ ██   ██   ██   ██       ║",
                "    ║                                                  ║",
                "    ║    █████ ██  ██  █████  ██  █████ ██████ ██     ║",
                "    ║   ██     ██  ██ ██   ██ ██ ██     ██     ██     ║",
                "    ║   ██     ██████ ██   ██ ██ ██     ████          ║",
                "    ║   ██     ██  ██ ██   ██ ██ ██     ██            ║",
                "    ║    █████ ██  ██  █████  ██  █████ ██████ ██     ║",
                "    ║                                                  ║",
                "    ║                                                  ║",
                "    ╚══════════════════════════════════════════════════╝",
                "",
                "  WarGames  |  [c] cancel",
            ]
            .map(String::from),
        );
        lines
    }
}

impl Game for WarGames {
    fn tick(&mut self) {
        if self.game_over || self.phase != Phase::Missile {
            return;
        }

        self.anim_ticks += 1;
        if self.anim_ticks < MISSILE_TICKS {
            return;
        }

        match self.shooter {
            Shooter::Human => {
                self.wopr_fire();
                self.shooter = Shooter::Wopr;
                self.anim_ticks = 0;
            }
            Shooter::Wopr => {
                if self.launches() >= MAX_LAUNCHES {
                    self.game_over = true;
                } else {
                    self.phase = Phase::Globe;
                }
            }
        }
    }

    fn handle_input(&mut self, key: &str) {
        if self.game_over {
            if key == "o" {
                self.phase = Phase::GreatChoice;
            }
            return;
        }

        match self.phase {
            Phase::Password => self.type_password(key),
            Phase::Globe if key == "x" && self.launches() < MAX_LAUNCHES => {
                if let Some(target) = self.pool.pop() {
                    self.human_targets.push(target);
                    self.phase = Phase::Missile;
                    self.anim_ticks = 0;
                    self.shooter = Shooter::Human;
                }
            }
            _ => {}
        }
    }

    fn frame(&self) -> Vec<String> {
        match self.phase {
            Phase::Password => self.password_frame(),
            Phase::Missile => self.missile_frame(),
            Phase::Globe | Phase::GreatChoice => self.globe_frame(),
        }
    }

    fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn game_over_frame(&self) -> Vec<String> {
        if self.phase == Phase::GreatChoice {
            return self.great_choice_frame();
        }

        let mut lines = vec![String::new(); 2 + self.height.saturating_sub(16) / 2];
        lines.extend(
            [
                "        ╔═══════════════════════════════════════╗",
                "        ║                                       ║",
                "        ║        * * * GAME OVER * * *          ║",
                "        ║                                       ║",
                "        ║            WINNER: NONE               ║",
                "        ║                                       ║",
                "        ║          A STRANGE GAME.              ║",
                "        ║       THE ONLY WINNING MOVE IS        ║",
                "        ║            NOT TO PLAY.               ║",
                "        ║                                       ║",
                "        ║    HOW ABOUT A NICE GAME OF CHESS?    ║",
                "        ║                                       ║",
                "        ║        [o] OK. Good decision.         ║",
                "        ║                                       ║",
                "        ╚═══════════════════════════════════════╝",
                "",
                "  WarGames  |  [o] OK  |  [c] cancel",
            ]
            .map(String::from),
        );
        lines
    }
}
