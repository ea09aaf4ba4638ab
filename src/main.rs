use clap::{CommandFactory, Parser};
use colored::*;
use tracing_subscriber::EnvFilter;

use code_coach::cli::{Args, Command};
use code_coach::config::AppConfig;
use code_coach::console;
use code_coach::dispatch::Dispatcher;
use code_coach::languages::LANGUAGES;
use code_coach::{web, ChatView};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = AppConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Analyze { problem, file, language } => {
            let dispatcher = Dispatcher::new(&config.inference)?;
            let mut stdout = std::io::stdout();
            if let Err(e) =
                console::run_analyze(&config, &dispatcher, &problem, file.as_deref(), &language, &mut stdout)
                    .await
            {
                eprintln!("{} {}", "error:".red().bold(), e);
                std::process::exit(1);
            }
        }
        Command::Chat => {
            let dispatcher = Dispatcher::new(&config.inference)?;
            let mut view = ChatView::from_config(&config);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            console::run_chat(&mut view, &dispatcher, stdin, &mut std::io::stdout()).await?;
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            web::serve(config, port).await?;
        }
        Command::Languages => {
            for lang in LANGUAGES {
                println!("{:<12} {}", lang.id.bright_cyan(), lang.name);
            }
        }
        Command::Completions { shell } => {
            let mut cmd = Args::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}
