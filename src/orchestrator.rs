use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::UsageCache;
use crate::config::Config;
use crate::parser::{parse_review_issues, parse_usage_json, parse_usage_plain};
use crate::process::CommandOutput;
use crate::runner::{Invocation, ReviewCli};
use crate::types::{ReviewResult, TokenUsage};

/// Runs reviews and usage lookups against the review CLI.
pub struct Orchestrator<C: ReviewCli> {
    cli: C,
    cache: UsageCache,
    config: Config,
}

impl<C: ReviewCli> Orchestrator<C> {
    pub fn new(cli: C, config: Config) -> Self {
        let cache = UsageCache::new(config.cache_dir.clone());
        Self { cli, cache, config }
    }

    pub fn cache(&self) -> &UsageCache {
        &self.cache
    }

    /// Run one review. Exit 0 means success, even with unparseable output;
    /// anything else becomes a failed result carrying the output verbatim.
    pub async fn run_review(&self) -> ReviewResult {
        let timeout = Duration::from_secs(self.config.review_timeout);
        info!(args = ?self.config.review_args, "running review");

        let out = self
            .cli
            .run(Invocation::Review, &self.config.review_args, timeout)
            .await;

        if out.success() {
            let issues = parse_review_issues(&out.output);
            info!(issues = issues.len(), "review complete");
            ReviewResult::succeeded(issues, out.output)
        } else {
            warn!(exit_code = out.exit_code, "review failed");
            ReviewResult::failed(out.output.clone(), out.output)
        }
    }

    /// Look up token usage, trying in order: `usage --json`, plain `usage`,
    /// the vendor usage file, then the local cache. Fresh results are written
    /// back to the cache.
    pub async fn fetch_usage(&self) -> Option<TokenUsage> {
        if let Some(usage) = self
            .usage_from_cli(Invocation::UsageJson, parse_usage_json)
            .await
        {
            return Some(self.remember(usage));
        }

        if let Some(usage) = self
            .usage_from_cli(Invocation::UsagePlain, parse_usage_plain)
            .await
        {
            return Some(self.remember(usage));
        }

        if let Some(usage) = self.usage_from_vendor_file() {
            return Some(self.remember(usage));
        }

        match self.cache.load() {
            Some(usage) if usage.limit > 0 => {
                info!("usage served from cache");
                Some(usage)
            }
            _ => {
                info!("no usage information available");
                None
            }
        }
    }

    /// Cached usage only, without calling the CLI.
    pub fn load_cached_usage(&self) -> Option<TokenUsage> {
        self.cache.load()
    }

    async fn usage_from_cli(
        &self,
        invocation: Invocation,
        parse: fn(&str) -> Option<TokenUsage>,
    ) -> Option<TokenUsage> {
        let args: Vec<String> = match invocation {
            Invocation::UsageJson => vec!["usage".into(), "--json".into()],
            _ => vec!["usage".into()],
        };
        let timeout = Duration::from_secs(self.config.usage_timeout);
        let out: CommandOutput = self.cli.run(invocation, &args, timeout).await;

        if !out.success() || out.output.trim().is_empty() {
            debug!(%invocation, exit_code = out.exit_code, "usage method unavailable");
            return None;
        }
        let usage = parse(&out.output);
        if usage.is_none() {
            debug!(%invocation, "usage output not understood");
        }
        usage
    }

    fn usage_from_vendor_file(&self) -> Option<TokenUsage> {
        let path = &self.config.vendor_usage_file;
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => parse_usage_json(&content),
            Err(e) => {
                warn!("failed to read {}: {e}", path.display());
                None
            }
        }
    }

    fn remember(&self, usage: TokenUsage) -> TokenUsage {
        info!(used = usage.used, limit = usage.limit, "usage fetched");
        self.cache.try_save(&usage);
        usage
    }
}
