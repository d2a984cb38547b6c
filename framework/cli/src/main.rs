use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use envbench_runner::prelude::{measure, Environment, MeasureArgs};
use envbench_summariser::{format_report, run_analysis, EnvironmentInput};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct EnvbenchCli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Measure one environment and save the result
    Measure(MeasureArgs),
    /// Compare the saved results of the docker and vm environments
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Directory holding the docker results
    #[arg(long, env = "DOCKER_DATA_PATH", default_value = "./docker-actions")]
    docker_data_path: PathBuf,

    /// Directory holding the vm results
    #[arg(long, env = "VM_DATA_PATH", default_value = "./vm-actions")]
    vm_data_path: PathBuf,

    /// Where the comparison report is written
    #[arg(long, env = "ANALYSIS_REPORT_PATH", default_value = "analysis.json")]
    report_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = EnvbenchCli::parse();

    let outcome = match cli.command {
        Command::Measure(args) => measure(args).map(|path| {
            println!("Result saved to {}", path.display());
        }),
        Command::Analyze(args) => analyze(args),
    };

    if let Err(e) = &outcome {
        log::error!("{e:#}");
    }
    outcome
}

fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let report = run_analysis(
        &EnvironmentInput::new(Environment::Docker.label(), &args.docker_data_path),
        &EnvironmentInput::new(Environment::Vm.label(), &args.vm_data_path),
        &args.report_path,
    )
    .context("Analysis failed")?;

    print!("{}", format_report(&report));
    println!("Report saved to {}", args.report_path.display());

    Ok(())
}
