use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roster_client::{load_settings, RosterApp, UiEvent};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod render;

use render::Screen;

#[derive(Parser, Debug)]
#[command(name = "roster", about = "Mergington High School activity roster")]
struct Args {
    /// Overrides `server_url` from roster.toml and the environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show all activities and their participants.
    List,
    /// Show who is signed in.
    Status,
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "ROSTER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Signup {
        #[arg(long)]
        activity: String,
        #[arg(long)]
        email: String,
    },
    Unregister {
        #[arg(long)]
        activity: String,
        #[arg(long)]
        email: String,
    },
}

fn drain_into(screen: &mut Screen, events: &mut broadcast::Receiver<UiEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => screen.apply(event),
            Err(TryRecvError::Lagged(skipped)) => debug!(skipped, "ui: event stream lagged"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut settings = load_settings(args.config);
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(token_file) = args.token_file {
        settings.token_file = Some(token_file);
    }

    let filter =
        EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app = RosterApp::from_settings(&settings).context("failed to set up roster client")?;
    let mut events = app.subscribe_events();
    let mut screen = Screen::default();

    let ready = app.start().await;
    info!(
        server_url = %settings.server_url,
        authenticated = ready.session.is_authenticated(),
        roster_loaded = ready.roster_loaded,
        "roster: ready"
    );

    let succeeded = match args.command.unwrap_or(Command::List) {
        Command::List => ready.roster_loaded,
        Command::Status => true,
        Command::Login { username, password } => {
            app.session.login(&username, &password).await.is_ok()
        }
        Command::Logout => {
            app.session.logout().await;
            true
        }
        Command::Signup { activity, email } => {
            app.roster.signup(&activity, &email).await.is_ok()
        }
        Command::Unregister { activity, email } => {
            app.roster.unregister(&activity, &email).await.is_ok()
        }
    };

    drain_into(&mut screen, &mut events);
    print!("{}", screen.render());

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
