use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "code-coach")]
#[command(version)]
#[command(about = "Coding-practice assistant: LLM code analysis and a career-guidance chat")]
pub struct Args {
    /// Path to a TOML config file (defaults to ./code-coach.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Analyze a solution against a problem from the dataset
    Analyze {
        /// Problem id as listed in the dataset
        #[arg(long, short)]
        problem: String,

        /// Source file to analyze (defaults to the language's starter snippet)
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Language id (javascript, python, rust, ...)
        #[arg(long, short, default_value = "javascript")]
        language: String,
    },

    /// Interactive chat in the terminal
    Chat,

    /// Launch the web UI on localhost
    Serve {
        /// Port for the web UI server (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
    },

    /// List the supported editor languages
    Languages,

    /// Print shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
