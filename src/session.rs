use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::content;
use crate::error::{Error, Result};
use crate::games::{GameManager, menu};
use crate::orchestrator::Orchestrator;
use crate::parser::parse_review_issues;
use crate::prompts::build_fix_prompt;
use crate::runner::ReviewCli;
use crate::selection::{Selection, find_issue_at_line};
use crate::types::{ReviewIssue, ReviewResult, TokenUsage};

/// One call from the editor: a method name and its named parameters.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Issues come back from the editor either as full records or as the bare
/// line lists `run_review` hands out.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IssueInput {
    Lines(Vec<String>),
    Full(ReviewIssue),
}

impl From<IssueInput> for ReviewIssue {
    fn from(input: IssueInput) -> Self {
        match input {
            IssueInput::Lines(lines) => ReviewIssue::from_lines(lines),
            IssueInput::Full(issue) => issue,
        }
    }
}

fn into_issues(inputs: Vec<IssueInput>) -> Vec<ReviewIssue> {
    inputs.into_iter().map(ReviewIssue::from).collect()
}

#[derive(Deserialize)]
struct OutputParams {
    output: String,
}

#[derive(Deserialize)]
struct FormatParams {
    success: bool,
    #[serde(default)]
    issues: Vec<IssueInput>,
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    elapsed_secs: u64,
}

#[derive(Deserialize)]
struct WidthParams {
    #[serde(default = "default_width")]
    width: usize,
}

#[derive(Deserialize)]
struct FrameParams {
    #[serde(default)]
    frame: usize,
    #[serde(default)]
    elapsed_secs: u64,
}

#[derive(Deserialize)]
struct MessageParams {
    message: String,
}

#[derive(Deserialize)]
struct FixPromptParams {
    /// Defaults to the session's current selection.
    selected: Option<Vec<usize>>,
    issues: Vec<IssueInput>,
}

#[derive(Deserialize)]
struct CountParams {
    count: usize,
}

#[derive(Deserialize)]
struct IssueParams {
    issue: usize,
}

#[derive(Deserialize)]
struct CursorParams {
    lines: Vec<String>,
    /// The editor may send a negative index.
    cursor: i64,
}

#[derive(Deserialize)]
struct WindowParams {
    #[serde(default = "default_width")]
    width: usize,
    #[serde(default = "default_height")]
    height: usize,
}

#[derive(Deserialize)]
struct StartGameParams {
    key: String,
    #[serde(default = "default_width")]
    width: usize,
    #[serde(default = "default_height")]
    height: usize,
}

#[derive(Deserialize)]
struct KeyParams {
    key: String,
}

fn default_width() -> usize {
    80
}

fn default_height() -> usize {
    24
}

fn params<T: DeserializeOwned>(method: &str, value: Value) -> Result<T> {
    let value = if value.is_null() { json!({}) } else { value };
    serde_json::from_value(value)
        .map_err(|e| Error::Protocol(format!("invalid params for {method}: {e}")))
}

/// Per-editor state: last known usage, the issue selection and the running
/// game. Owned by the serve loop and driven one request at a time.
pub struct Session<C: ReviewCli> {
    orchestrator: Orchestrator<C>,
    usage: Option<TokenUsage>,
    selection: Selection,
    games: GameManager,
}

impl<C: ReviewCli> Session<C> {
    pub fn new(orchestrator: Orchestrator<C>) -> Self {
        Self {
            orchestrator,
            usage: None,
            selection: Selection::new(),
            games: GameManager::new(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn usage(&self) -> Option<&TokenUsage> {
        self.usage.as_ref()
    }

    pub async fn dispatch(&mut self, request: Request) -> Result<Value> {
        let Request { method, params: p } = request;
        debug!(%method, "dispatch");

        let value = match method.as_str() {
            "run_review" => {
                let result = self.orchestrator.run_review().await;
                self.selection.init(result.issues.len());
                result.to_host()
            }
            "parse_review_output" => {
                let OutputParams { output } = params(&method, p)?;
                let issues = parse_review_issues(&output);
                ReviewResult::succeeded(issues, output).to_host()
            }
            "format_review" => {
                let f: FormatParams = params(&method, p)?;
                let issues = into_issues(f.issues);
                let result = if f.success {
                    ReviewResult::succeeded(issues, String::new())
                } else {
                    ReviewResult::failed(f.error_message, String::new())
                };
                let lines = content::format_review_output(
                    &result,
                    f.elapsed_secs,
                    &self.selection.selected(),
                );
                json!({ "lines": lines, "issue_count": result.issues.len() })
            }
            "render_help" => {
                let WidthParams { width } = params(&method, p)?;
                json!(content::render_help(width))
            }
            "loading_content" => json!(content::format_loading_message()),
            "cancelled_content" => json!(content::format_cancelled_message()),
            "animation_frame" => {
                let f: FrameParams = params(&method, p)?;
                json!(content::get_animation_frame(f.frame, f.elapsed_secs))
            }
            "animation_frame_count" => json!(content::animation_frame_count()),
            "no_work_frame" => {
                let f: FrameParams = params(&method, p)?;
                json!(content::get_no_work_animation_frame(f.frame))
            }
            "no_work_frame_count" => json!(content::no_work_frame_count()),
            "is_no_files_error" => {
                let MessageParams { message } = params(&method, p)?;
                json!(content::is_no_files_error(&message))
            }
            "build_fix_prompt" => {
                let f: FixPromptParams = params(&method, p)?;
                let selected = f.selected.unwrap_or_else(|| self.selection.selected());
                json!(build_fix_prompt(&selected, &into_issues(f.issues))?)
            }
            "init_selections" => {
                let CountParams { count } = params(&method, p)?;
                self.selection.init(count);
                Value::Null
            }
            "reset_selections" => {
                self.selection.reset();
                Value::Null
            }
            "toggle_selection" => {
                let IssueParams { issue } = params(&method, p)?;
                json!(self.selection.toggle(issue))
            }
            "select_all" => json!(self.selection.select_all()),
            "deselect_all" => json!(self.selection.deselect_all()),
            "get_selected" => json!(self.selection.selected()),
            "get_issue_count" => json!(self.selection.issue_count()),
            "find_issue_at_line" => {
                let CursorParams { lines, cursor } = params(&method, p)?;
                let issue = usize::try_from(cursor).map_or(0, |c| find_issue_at_line(&lines, c));
                json!(issue)
            }
            "fetch_usage" => {
                let usage = self.orchestrator.fetch_usage().await;
                self.remember_usage(usage)
            }
            "load_cached_usage" => {
                let usage = self.orchestrator.load_cached_usage();
                self.remember_usage(usage)
            }
            "get_usage" => self.usage.clone().unwrap_or_default().to_host(),
            "game_menu" => {
                let WindowParams { width, height } = params(&method, p)?;
                json!(menu(width, height))
            }
            "start_game" => {
                let g: StartGameParams = params(&method, p)?;
                json!(self.games.start(&g.key, g.width, g.height).unwrap_or(0))
            }
            "stop_game" => {
                self.games.stop();
                Value::Null
            }
            "is_game_active" => json!(self.games.is_active()),
            "tick_game" => json!(self.games.tick()),
            "input_game" => {
                let KeyParams { key } = params(&method, p)?;
                json!(self.games.input(&key))
            }
            "game_match_patterns" => {
                let patterns: Vec<[String; 2]> = self
                    .games
                    .match_patterns()
                    .into_iter()
                    .map(|(group, pattern)| [group, pattern])
                    .collect();
                json!(patterns)
            }
            other => return Err(Error::Protocol(format!("unknown method: {other}"))),
        };

        Ok(value)
    }

    /// Keep a fresh lookup as the session's current usage. A miss leaves the
    /// previous value in place.
    fn remember_usage(&mut self, usage: Option<TokenUsage>) -> Value {
        match usage {
            Some(usage) => {
                let host = usage.to_host();
                self.usage = Some(usage);
                host
            }
            None => Value::Null,
        }
    }
}
