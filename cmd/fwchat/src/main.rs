//! fwchat - match free-text firewall change requests against a rule table.

mod config;
mod dataset;
mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fwchat_rules::{Chatbot, EntityLabeler, RuleTable};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use config::Config;
use dataset::SampleRng;

/// Firewall rule chatbot.
///
/// Extracts addresses, zones and the service from a request such as
///   Allow access for IP "10.0.0.5" from "10.0.0.1" source and "LAN" zone to "DMZ" zone with Service "HTTP"
/// and matches them against a table of known rules.
#[derive(Parser, Debug)]
#[command(name = "fwchat")]
#[command(about = "Match free-text firewall change requests against a rule table")]
#[command(version)]
struct Cli {
    /// Config file (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rule table file (overrides config and RULES_PATH)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the chat API over HTTP
    Serve {
        /// Listen address (e.g. :5000)
        #[arg(long)]
        listen: Option<String>,
    },
    /// Match one request and print the result
    Match { prompt: String },
    /// Print the entities extracted from one request
    Extract {
        prompt: String,

        /// Also print the spans labeled by the configured model
        #[arg(long)]
        labels: bool,
    },
    /// Generate a synthetic annotated rule table
    Generate {
        /// Number of rows
        #[arg(short = 'n', long, default_value_t = dataset::DEFAULT_COUNT)]
        count: usize,

        /// Output CSV file
        #[arg(short = 'o', long, default_value = dataset::DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load(cli.config.as_deref())?;
    if let Some(rules) = &cli.rules {
        cfg.rules_path = rules.clone();
    }
    init_logging(cli.verbose || cfg.debug);

    match cli.command {
        Commands::Serve { listen } => {
            if let Some(listen) = listen {
                cfg.listen = listen;
            }
            let bot = Arc::new(build_chatbot(&cfg)?);
            server::serve(&cfg.listen, bot).await
        }
        Commands::Match { prompt } => {
            let bot = build_chatbot(&cfg)?;
            let result = bot.process(&prompt);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Extract { prompt, labels } => {
            let bot = build_chatbot(&cfg)?;
            let mut out = json!({ "entities": bot.extract(&prompt) });
            if labels {
                let Some(spans) = bot.label(&prompt) else {
                    anyhow::bail!("--labels needs a model (model_path or MODEL_PATH)");
                };
                out["labels"] = serde_json::to_value(spans?)?;
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        Commands::Generate {
            count,
            output,
            seed,
        } => {
            let mut rng = match seed {
                Some(seed) => SampleRng::new(seed),
                None => SampleRng::from_entropy()?,
            };
            let table = dataset::generate(count, &mut rng);
            dataset::write(&output, &table)?;
            println!("Wrote {} rules to {}", table.len(), output.display());
            Ok(())
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over the debug flag.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_chatbot(cfg: &Config) -> Result<Chatbot> {
    let table = RuleTable::load(&cfg.rules_path)
        .with_context(|| format!("load rule table {}", cfg.rules_path.display()))?;
    let mut bot =
        Chatbot::new(table, cfg.match_options()).context("compile extraction patterns")?;

    if let Some(dir) = &cfg.model_path {
        bot = bot.with_labeler(load_labeler(dir)?);
    }
    Ok(bot)
}

#[cfg(feature = "onnx")]
fn load_labeler(dir: &Path) -> Result<Box<dyn EntityLabeler>> {
    let labeler = fwchat_ner::OnnxLabeler::load(dir)
        .with_context(|| format!("load model {}", dir.display()))?;
    Ok(Box::new(labeler))
}

#[cfg(not(feature = "onnx"))]
fn load_labeler(dir: &Path) -> Result<Box<dyn EntityLabeler>> {
    anyhow::bail!(
        "model {} is configured but fwchat was built without the onnx feature",
        dir.display()
    )
}
