/// Mediamix simulator - drive an in-memory page from the command line
use clap::{Parser, Subcommand};
use mediamix_sim::{
    commands::Command,
    config::SimConfig,
    host,
    session::{describe_view, Outcome, Session},
};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mediamix-sim")]
#[command(about = "Headless Mediamix engine with a command-line controller", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MEDIAMIX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from standard input (the default)
    Shell,
    /// Run the given commands in order, then exit
    Exec {
        /// One command per argument, e.g. "volume 0.5" "status"
        #[arg(required = true)]
        commands: Vec<String>,
    },
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediamix=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = SimConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => shell(&config).await?,
        Commands::Exec { commands } => exec(&config, &commands).await?,
        Commands::Config => println!("{}", serde_json::to_string_pretty(&config)?),
    }

    Ok(())
}

async fn open(config: &SimConfig) -> anyhow::Result<Session> {
    let (transport, handle, notifications) = host::spawn(config)?;
    let session = Session::open(transport, handle, notifications).await?;

    tracing::info!("Controller opened");
    println!("{}", describe_view(session.view()));
    Ok(session)
}

/// Run one line, printing its output and any notifications it caused
///
/// Returns `false` once the session should end.
async fn run_line(session: &mut Session, line: &str) -> bool {
    let command = match Command::parse(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(e) => {
            eprintln!("{}", e);
            return true;
        }
    };

    match session.execute(command).await {
        Ok(Outcome::Output(output)) => println!("{}", output),
        Ok(Outcome::Quit) => return false,
        Err(e) => eprintln!("error: {}", e),
    }

    let notifications = session.drain_notifications();
    for notification in &notifications {
        println!("<- {}", serde_json::to_string(notification).unwrap_or_default());
    }
    if !notifications.is_empty() {
        println!("{}", describe_view(session.view()));
    }

    true
}

async fn shell(config: &SimConfig) -> anyhow::Result<()> {
    let mut session = open(config).await?;
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !run_line(&mut session, &line).await {
            break;
        }
    }

    session.close()?;
    Ok(())
}

async fn exec(config: &SimConfig, commands: &[String]) -> anyhow::Result<()> {
    let mut session = open(config).await?;

    for line in commands {
        println!("> {}", line);
        if !run_line(&mut session, line).await {
            break;
        }
    }

    session.close()?;
    Ok(())
}
