//! Slot Agent Entry Point
//!
//! Reads one utterance per line from stdin and prints the agent's reply.
//! Logs go to stderr so the conversation on stdout stays readable.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use slot_agent_agent::{AgentSession, TurnOutcome};
use slot_agent_config::{load_settings_from, FunctionsConfig, Settings};
use slot_agent_core::Parameters;

const RULE: &str = "------------------------------------------------------------";

#[derive(Debug, Parser)]
#[command(
    name = "slot-agent",
    version,
    about = "Talk to the slot-filling agent",
    after_help = "Examples:\n  slot-agent\n  slot-agent --functions config/functions.yaml --debug"
)]
struct Args {
    /// Directory holding `default` and per-environment settings files
    #[arg(long, default_value = "config")]
    config: PathBuf,

    /// Settings environment layered over the defaults (e.g. `dev`)
    #[arg(long, env = "SLOT_AGENT_ENV")]
    env: Option<String>,

    /// Function schema file (JSON or YAML); overrides `functions_path`
    #[arg(long)]
    functions: Option<String>,

    /// Print detected intent and gathered parameters after every reply
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = load_settings_from(&args.config, args.env.as_deref())
        .with_context(|| format!("Failed to load settings from {}", args.config.display()))?;
    if args.debug {
        settings.agent.debug = true;
    }

    init_tracing(&settings);
    tracing::info!("Starting slot agent v{}", env!("CARGO_PKG_VERSION"));

    let functions_path = args.functions.as_deref().or(settings.functions_path.as_deref());
    let functions = FunctionsConfig::load_or_builtin(functions_path)
        .context("Failed to load function schemas")?;
    tracing::info!(
        source = functions_path.unwrap_or("builtin"),
        count = functions.functions.len(),
        "Function schemas loaded"
    );

    let session = AgentSession::from_settings(&functions, &settings)?;
    run_interactive(session, &settings, &functions).await
}

/// Initialize tracing (stderr, optional JSON)
fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("slot_agent={}", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    subscriber.with(fmt_layer).init();
}

async fn run_interactive(
    mut session: AgentSession,
    settings: &Settings,
    functions: &FunctionsConfig,
) -> anyhow::Result<()> {
    let profile = &settings.agent;

    println!("\n{}", profile.name);
    println!("{}", "=".repeat(RULE.len()));
    println!("{}", profile.description);
    println!("\nAvailable functions:");
    for function in &functions.functions {
        println!("  - {}: {}", function.name, function.description);
    }
    println!("\n{}", profile.instructions);
    println!("{}", RULE);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        // EOF or Ctrl-C
        let Some(line) = line else {
            println!("\n\n{}", profile.goodbye_message);
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if profile.is_exit_command(input) {
            println!("\n{}", profile.goodbye_message);
            break;
        }

        let outcome = session.process_message(input).await;
        println!("\n{}: {}", profile.name, outcome.response);

        if profile.debug {
            print_debug(&outcome);
        }
        if outcome.ready_to_execute {
            print_execution(&outcome);
        }
    }

    Ok(())
}

fn print_debug(outcome: &TurnOutcome) {
    if let Some(intent) = &outcome.intent {
        println!("[Intent: {}]", intent);
    }
    if !outcome.parameters.is_empty() {
        println!("[Parameters: {}]", pretty(&outcome.parameters));
    }
}

fn print_execution(outcome: &TurnOutcome) {
    println!(
        "\nReady to execute '{}' with:",
        outcome.intent.as_deref().unwrap_or_default()
    );
    for (key, value) in &outcome.parameters {
        match value.as_str() {
            Some(text) => println!("   {}: {}", key, text),
            None => println!("   {}: {}", key, value),
        }
    }
    println!("\n{}", RULE);
}

fn pretty(parameters: &Parameters) -> String {
    serde_json::to_string_pretty(parameters).unwrap_or_else(|_| "{}".to_string())
}
