use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A `path[:line]` reference pulled out of an issue body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLocation {
    pub filepath: String,
    #[serde(default)]
    pub line: Option<u32>,
}

impl FileLocation {
    pub fn new(filepath: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            filepath: filepath.into(),
            line,
        }
    }
}

/// One finding from the review CLI, split out on a `=====` delimiter.
///
/// Optional text fields travel to the editor as `""` when absent, and an
/// empty string coming back from the editor reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewIssue {
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default, with = "blank_as_none")]
    pub file_path: Option<String>,
    #[serde(default, with = "blank_as_none")]
    pub line_range: Option<String>,
    #[serde(default, with = "blank_as_none")]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, with = "blank_as_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub location: Option<FileLocation>,
}

impl ReviewIssue {
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            ..Default::default()
        }
    }
}

/// Outcome of one review invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewResult {
    pub success: bool,
    pub issues: Vec<ReviewIssue>,
    pub error_message: String,
    pub raw_output: String,
}

impl ReviewResult {
    pub fn succeeded(issues: Vec<ReviewIssue>, raw_output: String) -> Self {
        Self {
            success: true,
            issues,
            error_message: String::new(),
            raw_output,
        }
    }

    pub fn failed(error_message: String, raw_output: String) -> Self {
        Self {
            success: false,
            issues: Vec::new(),
            error_message,
            raw_output,
        }
    }

    /// Shape handed to the editor. `raw_output` stays on this side.
    pub fn to_host(&self) -> Value {
        json!({
            "success": self.success,
            "issues": self.issues.iter().map(|i| &i.lines).collect::<Vec<_>>(),
            "issues_data": self.issues,
            "error_message": self.error_message,
        })
    }
}

fn default_provider() -> String {
    "coderabbit".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub used: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default = "default_provider")]
    pub provider: String,
}

impl Default for TokenUsage {
    fn default() -> Self {
        Self {
            used: 0,
            limit: 0,
            provider: default_provider(),
        }
    }
}

impl TokenUsage {
    pub fn new(used: u64, limit: u64, provider: impl Into<String>) -> Self {
        Self {
            used,
            limit,
            provider: provider.into(),
        }
    }

    /// Whole percent of the limit consumed, rounded down. Zero when there is no limit.
    pub fn percentage(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.used.saturating_mul(100) / self.limit
    }

    pub fn to_host(&self) -> Value {
        json!({
            "used": self.used,
            "limit": self.limit,
            "provider": self.provider,
            "percentage": self.percentage(),
        })
    }
}

mod blank_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.filter(|s| !s.is_empty()))
    }
}
