use std::fmt;
use std::time::Duration;

use crate::process::{CommandOutput, ProcessConfig, run_command};

/// What a CLI invocation is for; used to tag its log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    Review,
    UsageJson,
    UsagePlain,
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Review => write!(f, "review"),
            Invocation::UsageJson => write!(f, "usage-json"),
            Invocation::UsagePlain => write!(f, "usage"),
        }
    }
}

pub trait ReviewCli {
    /// Run the review CLI with `args`, giving up after `timeout`.
    ///
    /// Never fails: spawn errors and timeouts come back as non-zero output.
    fn run(
        &self,
        invocation: Invocation,
        args: &[String],
        timeout: Duration,
    ) -> impl std::future::Future<Output = CommandOutput> + Send;
}

/// The `coderabbit` executable.
pub struct CodeRabbitCli {
    binary: String,
}

impl CodeRabbitCli {
    pub fn new(binary: String) -> Self {
        Self { binary }
    }

    pub fn build_command(&self, args: &[String]) -> (String, Vec<String>) {
        (self.binary.clone(), args.to_vec())
    }
}

impl ReviewCli for CodeRabbitCli {
    async fn run(
        &self,
        invocation: Invocation,
        args: &[String],
        timeout: Duration,
    ) -> CommandOutput {
        let (command, args) = self.build_command(args);

        let mut config = ProcessConfig::new(command, args).with_timeout(timeout);
        config.log_prefix = format!("coderabbit:{invocation}");

        run_command(config).await
    }
}
