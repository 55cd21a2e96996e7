use clap::Parser;
use serde_json::Value;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vim4rabbit::cli::{Cli, CliCommand};
use vim4rabbit::config::Config;
use vim4rabbit::content::render_help;
use vim4rabbit::orchestrator::Orchestrator;
use vim4rabbit::runner::CodeRabbitCli;
use vim4rabbit::serve::serve;
use vim4rabbit::session::Session;
use vim4rabbit::types::TokenUsage;

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("VIM4RABBIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &Value) {
    println!("{value}");
}

fn usage_json(usage: Option<TokenUsage>) -> Value {
    usage.map(|u| u.to_host()).unwrap_or(Value::Null)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    info!(?config, "config loaded");

    let runner = CodeRabbitCli::new(config.cli_binary.clone());
    let orchestrator = Orchestrator::new(runner, config);

    match cli.command {
        CliCommand::Review => {
            let result = orchestrator.run_review().await;
            print_json(&result.to_host());
        }
        CliCommand::Usage { cached: true } => {
            print_json(&usage_json(orchestrator.load_cached_usage()));
        }
        CliCommand::Usage { cached: false } => {
            print_json(&usage_json(orchestrator.fetch_usage().await));
        }
        CliCommand::Help { width } => {
            print_json(&Value::from(render_help(width)));
        }
        CliCommand::Serve => {
            let mut session = Session::new(orchestrator);
            let stdin = BufReader::new(tokio::io::stdin());
            if let Err(e) = serve(&mut session, stdin, tokio::io::stdout()).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }
}
