//! factorvae-report command line tool
//!
//! ```text
//! factorvae-report --seeds seed1,seed2 train-loss --ckpt-dir runs/ad --gammas 4,6 --lambdas 10
//! factorvae-report --config report.json compare
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueHint};
use tracing::info;

use factorvae_report::aggregate::compare_methods;
use factorvae_report::config::MethodConfig;
use factorvae_report::{logging, plot, ReportConfig};

#[derive(Parser, Debug)]
#[command(
    name = "factorvae-report",
    version,
    about = "Seed-averaged metrics and comparison plots for FactorVAE training runs"
)]
struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Seeds to average over, e.g. seed1,seed2,seed3
    #[arg(long, global = true, value_delimiter = ',')]
    seeds: Vec<String>,

    /// Ignore log records past this iteration
    #[arg(long, global = true)]
    max_iters: Option<u64>,

    /// Fixed axis ranges and compact canvas
    #[arg(long, global = true)]
    detail: bool,

    /// Divisor of each training window
    #[arg(long, global = true)]
    window: Option<u32>,

    /// Iteration stride between training points
    #[arg(long, global = true)]
    emit_every: Option<u64>,

    /// Directory charts are written to
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    output_dir: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plot seed-averaged reconstruction and total-correlation losses
    TrainLoss(RootArgs),

    /// Plot seed-averaged disentanglement scores
    Disentanglement(RootArgs),

    /// Plot final reconstruction error against final score for two methods
    Compare(CompareArgs),

    /// Print the final score and reconstruction loss of every setting as JSON
    Summary(RootArgs),
}

#[derive(Args, Debug)]
struct RootArgs {
    /// Checkpoint root holding one directory per run
    #[arg(long, value_hint = ValueHint::DirPath)]
    ckpt_dir: Option<PathBuf>,

    /// Gamma values to select
    #[arg(long, value_delimiter = ',')]
    gammas: Vec<String>,

    /// Lambda values to select
    #[arg(long, value_delimiter = ',')]
    lambdas: Vec<String>,

    /// Force (true) or disable (false) vanilla mode instead of inferring it from the path
    #[arg(long)]
    vanilla: Option<bool>,
}

impl RootArgs {
    fn apply(&self, config: &mut ReportConfig) {
        if let Some(dir) = &self.ckpt_dir {
            config.ckpt_dir = Some(dir.clone());
        }
        if !self.gammas.is_empty() {
            config.gammas.clone_from(&self.gammas);
        }
        if !self.lambdas.is_empty() {
            config.lambdas.clone_from(&self.lambdas);
        }
        if self.vanilla.is_some() {
            config.vanilla = self.vanilla;
        }
    }
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Checkpoint roots: FactorVAE first, AD-FactorVAE second
    #[arg(long = "method", value_hint = ValueHint::DirPath)]
    methods: Vec<PathBuf>,

    /// Comma-separated gammas, once per --method
    #[arg(long = "method-gammas")]
    method_gammas: Vec<String>,

    /// Comma-separated lambdas, once per --method
    #[arg(long = "method-lambdas")]
    method_lambdas: Vec<String>,
}

impl CompareArgs {
    fn apply(&self, config: &mut ReportConfig) {
        if self.methods.is_empty() {
            return;
        }
        config.methods = self
            .methods
            .iter()
            .enumerate()
            .map(|(idx, dir)| MethodConfig {
                ckpt_dir: dir.clone(),
                gammas: split_list(self.method_gammas.get(idx)),
                lambdas: split_list(self.method_lambdas.get(idx)),
                vanilla: None,
            })
            .collect();
    }
}

fn split_list(raw: Option<&String>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

impl Cli {
    fn config(&self) -> Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ReportConfig::default(),
        };

        if !self.seeds.is_empty() {
            config.seeds.clone_from(&self.seeds);
        }
        if let Some(max_iters) = self.max_iters {
            config.max_iters = max_iters;
        }
        if self.detail {
            config.detail = true;
        }
        if let Some(window) = self.window {
            config.window = window;
        }
        if let Some(emit_every) = self.emit_every {
            config.emit_every = emit_every;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }

        match &self.command {
            Command::TrainLoss(args) | Command::Disentanglement(args) | Command::Summary(args) => {
                args.apply(&mut config);
            }
            Command::Compare(args) => args.apply(&mut config),
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level)?;
    let config = cli.config()?;

    match &cli.command {
        Command::TrainLoss(_) => {
            let aggregator = config.aggregator()?;
            let curves = aggregator
                .training_curves()
                .with_context(|| format!("aggregating {}", aggregator.root().display()))?;
            let path = output_path(&config, plot::TRAIN_LOSS_FILE)?;
            plot::render_train_loss(&path, &curves, config.detail)?;
        }
        Command::Disentanglement(_) => {
            let aggregator = config.aggregator()?;
            let curves = aggregator
                .disentanglement_curves()
                .with_context(|| format!("aggregating {}", aggregator.root().display()))?;
            let path = output_path(&config, plot::DISENTANGLEMENT_FILE)?;
            plot::render_disentanglement(&path, &curves, config.detail)?;
        }
        Command::Compare(_) => {
            let summaries = compare_methods(&config.method_aggregators()?)?;
            let path = output_path(&config, plot::COMPARISON_FILE)?;
            plot::render_comparison(&path, &summaries[0].points, &summaries[1].points)?;
        }
        Command::Summary(_) => {
            let summary = config.aggregator()?.summary()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn output_path(config: &ReportConfig, file: &str) -> Result<PathBuf> {
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    let path = config.output_dir.join(file);
    info!(path = %path.display(), "writing chart");
    Ok(path)
}
