use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use ktest_minimize::{
    minimize_partitioned, minimize_slice, minimize_with_fixed, Completion, Config, Limits,
    Outcome, Partition,
};
use regex::Regex;
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

mod report;
mod settings;
mod shell;

pub use report::Report;
pub use settings::Settings;
pub use shell::ShellPredicate;

#[derive(Parser, Debug)]
#[command(name = "ktest-minimize")]
#[command(about = "Shrink the lines of a file while a shell command keeps passing", long_about = None)]
#[command(version)]
pub struct Cli {
    /// File whose lines are minimized
    pub input: PathBuf,

    /// Shell command; `{}` is replaced with the candidate file path
    #[arg(long)]
    pub cmd: String,

    /// Exit status meaning the candidate still reproduces
    #[arg(long)]
    pub expect_status: Option<i32>,

    /// Predicate call budget (0 = unlimited)
    #[arg(long)]
    pub pred_limit: Option<usize>,

    /// Chunk-count budget (0 = unlimited)
    #[arg(long)]
    pub max_chunks: Option<usize>,

    /// Split the input into this many initial chunks
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub seed_parts: Option<u64>,

    /// Lines matching this regex are never removed
    #[arg(long)]
    pub keep: Option<String>,

    /// TOML settings file (flags take precedence)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print a JSON report on stdout
    #[arg(long)]
    pub json: bool,

    /// Re-run the command on the final result
    #[arg(long)]
    pub verify: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Fully resolved run options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub limits: Limits,
    pub expect_status: i32,
    pub seed_parts: usize,
    pub keep: Option<String>,
}

impl RunOptions {
    /// Overlay command-line flags on top of file settings
    pub fn resolve(cli: &Cli, settings: Settings) -> Self {
        let flags = Limits {
            pred_limit: cli.pred_limit.unwrap_or(0),
            max_chunks: cli.max_chunks.unwrap_or(0),
        };
        Self {
            limits: settings.limits.overlay(flags),
            expect_status: cli.expect_status.or(settings.expect_status).unwrap_or(0),
            seed_parts: cli
                .seed_parts
                .map(|n| n as usize)
                .or(settings.seed_parts)
                .unwrap_or(1),
            keep: cli.keep.clone().or(settings.keep),
        }
    }
}

pub fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet || cli.json {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    run(&cli)
}

pub fn run(cli: &Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let options = RunOptions::resolve(cli, settings);
    log::debug!("resolved options: {options:?}");

    let raw = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let lines = split_lines(&raw);

    let shell = RefCell::new(ShellPredicate::new(&cli.cmd, options.expect_status)?);
    if !shell.borrow_mut().check(&lines)? {
        anyhow::bail!(
            "{} does not satisfy `{}` (expected exit status {})",
            cli.input.display(),
            cli.cmd,
            options.expect_status
        );
    }

    let outcome = minimize_lines(&shell, &lines, &options)?;
    match outcome.status {
        Completion::Converged => {}
        Completion::PredicateBudgetExhausted { .. } => {
            log::info!("predicate budget exhausted, result is partially reduced");
        }
        Completion::TooManyChunks { .. } => {
            log::warn!("{}; result may not satisfy the command", outcome.status);
        }
    }

    let verified = if cli.verify {
        Some(shell.borrow_mut().check(&outcome.items)?)
    } else {
        None
    };

    let report = Report {
        status: outcome.status,
        stats: outcome.stats,
        verified,
        lines: outcome.items.iter().map(|line| line_body(line)).collect(),
    };
    log::info!("{}", report.summary());

    if let Some(path) = &cli.output {
        fs::write(path, outcome.items.concat())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    if cli.json {
        print_stdout(&(serde_json::to_string_pretty(&report)? + "\n"))?;
    } else if cli.output.is_none() {
        print_stdout(&outcome.items.concat())?;
    }

    if verified == Some(false) {
        anyhow::bail!("minimized result no longer satisfies `{}`", cli.cmd);
    }
    Ok(())
}

fn minimize_lines(
    shell: &RefCell<ShellPredicate>,
    lines: &[String],
    options: &RunOptions,
) -> Result<Outcome<String>> {
    let config = Config::new(|candidate: &[String]| shell.borrow_mut().check(candidate))
        .limits(options.limits)
        .logf(|args| log::info!("{args}"));

    let outcome = if let Some(pattern) = &options.keep {
        let keep = Regex::new(pattern).with_context(|| format!("Invalid --keep regex {pattern}"))?;
        if options.seed_parts > 1 {
            log::warn!("--seed-parts is ignored together with --keep");
        }
        minimize_with_fixed(config, lines, |line| keep.is_match(line_body(line)))?
    } else if options.seed_parts > 1 {
        let partition = Partition::even(lines.len(), options.seed_parts);
        minimize_partitioned(config, lines, &partition)?
    } else {
        minimize_slice(config, lines)?
    };
    Ok(outcome)
}

/// Split text into lines that keep their terminators, so concatenating any
/// subsequence reproduces the input bytes for the lines kept
fn split_lines(raw: &str) -> Vec<String> {
    raw.split_inclusive('\n').map(str::to_string).collect()
}

/// Line without its `\n` or `\r\n` terminator
fn line_body(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}
