mod harness;
mod policy;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use harness::{RunReport, SimConfig, SimSession};
use policy::GameplayStrategy;

#[derive(Debug, Parser)]
#[command(name = "gravehold-sim", version)]
#[command(about = "Automated playtesting for the Gravehold rules core")]
struct Args {
    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Iterations per seed and strategy; iteration i plays seed + i
    #[arg(long, default_value_t = 10)]
    iterations: u64,

    /// Strategies to run (defaults to all)
    #[arg(long, value_enum, value_delimiter = ',')]
    strategies: Vec<GameplayStrategy>,

    /// Turn cap per game
    #[arg(long, default_value_t = 50)]
    max_turns: u32,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "console"])]
    report: String,

    /// Verbose output (per-game lines)
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let seeds = parse_seeds(&args.seeds)?;
    let strategies = if args.strategies.is_empty() {
        vec![
            GameplayStrategy::Rusher,
            GameplayStrategy::Fighter,
            GameplayStrategy::Wanderer,
        ]
    } else {
        args.strategies.clone()
    };

    let mut reports = Vec::new();
    for strategy in &strategies {
        for seed in &seeds {
            for iteration in 0..args.iterations {
                let config =
                    SimConfig::new(*strategy, seed.wrapping_add(iteration))
                        .with_max_turns(args.max_turns);
                let mut session = SimSession::demo(config)
                    .with_context(|| format!("seed {}", config.seed))?;
                let report = session.run();
                if args.verbose {
                    print_game_line(&report);
                }
                reports.push(report);
            }
        }
    }

    match args.report.as_str() {
        "json" => write_json(&args.output, &reports)?,
        _ => print_summary(&strategies, &reports),
    }
    Ok(())
}

fn parse_seeds(csv: &str) -> Result<Vec<u64>> {
    csv.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u64>().with_context(|| format!("bad seed '{part}'")))
        .collect()
}

fn print_game_line(report: &RunReport) {
    let outcome = match report.ending {
        Some(gravehold_game::Ending::Victory) => "victory".green(),
        Some(gravehold_game::Ending::Defeat) => "defeat".red(),
        None => "turn cap".yellow(),
    };
    println!(
        "  seed {:>6}  {:<8}  {:>3} turns  {}  objectives {}/{}",
        report.seed,
        report.strategy,
        report.turns,
        outcome,
        report.objectives_claimed,
        report.objectives_total,
    );
}

fn print_summary(strategies: &[GameplayStrategy], reports: &[RunReport]) {
    println!("{}", "Gravehold playtest summary".bold());
    for strategy in strategies {
        let label = strategy.label();
        let runs: Vec<&RunReport> = reports
            .iter()
            .filter(|report| report.strategy == label)
            .collect();
        if runs.is_empty() {
            continue;
        }
        let wins = runs.iter().filter(|report| report.won()).count();
        let losses = runs
            .iter()
            .filter(|report| report.ending == Some(gravehold_game::Ending::Defeat))
            .count();
        let stalled = runs.len() - wins - losses;
        let avg_turns =
            f64::from(runs.iter().map(|report| report.turns).sum::<u32>()) / runs.len() as f64;
        println!(
            "  {:<8} {} games  {} {}  {} {}  {} stalled  avg {:.1} turns",
            label,
            runs.len(),
            wins.to_string().green(),
            "won",
            losses.to_string().red(),
            "lost",
            stalled,
            avg_turns,
        );
    }
}

fn write_json(output: &Option<PathBuf>, reports: &[RunReport]) -> Result<()> {
    let json = serde_json::to_string_pretty(reports)?;
    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            writer.write_all(json.as_bytes())?;
            writer.flush()?;
        }
        None => {
            let mut out = stdout();
            out.write_all(json.as_bytes())?;
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}
