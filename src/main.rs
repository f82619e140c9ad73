mod script;
mod sink;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use canvas::config::{ConfigError, EditorConfig};
use canvas::engine::EngineCore;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::script::{Replay, ScriptError, Summary};
use crate::sink::DirSink;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Script(#[from] ScriptError),
}

#[derive(Parser, Debug)]
#[command(name = "certboard", about = "Certificate layout editor: replay editing scripts and export the result")]
struct Cli {
    /// Directory exported artifacts are written to.
    #[arg(long, env = "CERTBOARD_OUT_DIR", default_value = ".", global = true)]
    out: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON editing script.
    Replay {
        script: PathBuf,
        /// Also export the final scene after the last step.
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
    },
    /// Build a sample certificate and export it.
    Demo {
        #[arg(long, value_enum, default_value_t = ExportFormat::Both)]
        format: ExportFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Png,
    Pdf,
    Both,
}

impl ExportFormat {
    fn png(self) -> bool {
        matches!(self, Self::Png | Self::Both)
    }

    fn pdf(self) -> bool {
        matches!(self, Self::Pdf | Self::Both)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(summary) => {
            tracing::info!(steps = summary.steps, notices = summary.notices, saved = summary.saved, "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "certboard failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Summary, CliError> {
    let config = EditorConfig::from_env()?;
    let mut engine = EngineCore::new(config);
    let mut sink = DirSink::new(&cli.out);

    let summary = match cli.command {
        Command::Replay { script, format } => {
            let json = std::fs::read_to_string(&script)
                .map_err(|source| ScriptError::Read { path: script.clone(), source })?;
            let steps = script::parse(&json)?;
            let base_dir = script.parent().unwrap_or(Path::new("."));
            let summary = Replay::new(&mut engine, &mut sink, base_dir).run(&steps)?;
            match format {
                Some(format) => {
                    let extra = Replay::new(&mut engine, &mut sink, base_dir).finish(format.png(), format.pdf())?;
                    Summary { saved: summary.saved + extra.saved, ..summary }
                }
                None => summary,
            }
        }
        Command::Demo { format } => {
            let summary = Replay::new(&mut engine, &mut sink, Path::new(".")).run(&script::demo())?;
            let extra = Replay::new(&mut engine, &mut sink, Path::new(".")).finish(format.png(), format.pdf())?;
            Summary { saved: summary.saved + extra.saved, ..summary }
        }
    };
    for path in sink.written() {
        println!("{}", path.display());
    }
    engine.shutdown();
    Ok(summary)
}
