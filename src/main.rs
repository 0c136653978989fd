use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use svh_analysis::config::AnalysisConfig;
use svh_analysis::logging;
use svh_analysis::pipeline::{Pipeline, PipelineResult, PipelineSteps};

#[derive(Parser)]
#[command(name = "svh_analysis")]
#[command(about = "Advance care planning analysis of the SVH outbreak patient database")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Patient database to read, overriding the configuration
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Worksheet to read from a workbook input
    #[arg(long, global = true)]
    sheet: Option<String>,

    /// Output directory, overriding the configuration
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis: cleaned data, tables, figures and flow diagram
    Run,
    /// Normalize the database and write the cleaned dataset only
    Clean,
    /// Write the summary tables and study findings
    Tables,
    /// Draw a figure for every variable
    Plots,
    /// Build the code status flow diagram
    Flow,
}

impl Commands {
    fn steps(&self) -> PipelineSteps {
        match self {
            Commands::Run => PipelineSteps::all(),
            Commands::Clean => PipelineSteps::clean_only(),
            Commands::Tables => PipelineSteps::tables_only(),
            Commands::Plots => PipelineSteps::plots_only(),
            Commands::Flow => PipelineSteps::flow_only(),
        }
    }
}

fn print_summary(result: &PipelineResult) {
    println!("\n📊 Analysis Results:");
    println!("   Records: {}", result.records);
    println!("   Decision-maker patient: {}", result.patient_decides);
    println!("   Decision-maker surrogate: {}", result.surrogate_decides);
    println!("   Normalization warnings: {}", result.warnings);
    println!("   Records flagged by quality gate: {}", result.quality_flags);

    if let Some(findings) = &result.findings {
        println!("\n🔬 Study questions:");
        for hypothesis in &findings.hypotheses {
            match &hypothesis.result {
                Some(r) => println!(
                    "   - {}: {} p={:.3}",
                    hypothesis.question, r.test, r.p_value
                ),
                None => println!("   - {}: not testable", hypothesis.question),
            }
        }
    }

    println!("\n💾 Artifacts:");
    for artifact in &result.artifacts {
        println!("   - {}", artifact.display());
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AnalysisConfig::load(cli.config.as_deref())?;
    if let Some(input) = cli.input {
        config.input.path = input;
    }
    if let Some(sheet) = cli.sheet {
        config.input.sheet = Some(sheet);
    }
    if let Some(output) = cli.output {
        config.output.dir = output;
    }

    // Initialize logging
    logging::init_logging(&config.output.log_dir);
    info!(input = %config.input.path.display(), output = %config.output.dir.display(), "Configuration loaded");

    match Pipeline::run(&config, cli.command.steps()) {
        Ok(result) => {
            print_summary(&result);
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {:#}", e);
            Err(e)
        }
    }
}
