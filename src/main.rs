mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use yiiref::diagnostics;

#[derive(Parser)]
#[command(name = "yiiref", version, about = "Static view and controller navigation for Yii 1.x projects")]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root holding the protected directory and `.yiiref.toml`
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List the actions declared in a controller file
    Actions {
        /// Controller file to scan
        file: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Report render calls whose view file is missing or unresolvable (exit 0/1)
    Check {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Find the controller file and action that render a view file
    Controller {
        /// View file under a views directory
        view: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Resolve one view name as a render call in the given file would
    Resolve {
        /// Controller or view file the render call is made from
        file: PathBuf,

        /// View name as written in the render call
        name: String,

        /// Resolve as `renderPartial` instead of `render`
        #[arg(long)]
        partial: bool,
    },
    /// Resolve every render call in a controller or view file
    Views {
        /// Controller or view file to scan
        file: PathBuf,

        /// Only the action whose body contains this one-based line
        #[arg(long)]
        line: Option<u32>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = cli.root;

    let result = match cli.command {
        Commands::Actions { file, json } => commands::actions(&root, &file, json).map(|()| return ExitCode::SUCCESS),
        Commands::Check { json } => commands::check(&root, json),
        Commands::Controller { view, json } => {
            commands::controller(&root, &view, json).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Resolve { file, name, partial } => {
            commands::resolve(&root, &file, &name, partial).map(|()| return ExitCode::SUCCESS)
        },
        Commands::Views { file, line, json } => {
            commands::views(&root, &file, line, json).map(|()| return ExitCode::SUCCESS)
        },
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2)
        },
    };
}
