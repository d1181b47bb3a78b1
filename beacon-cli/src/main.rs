use anyhow::{Context, Result};
use beacon_client::{Client, ClientConfig};
use beacon_core::{Envelope, IceServerConfig, Targeting};
use beacon_server::{ServerOptions, SignalingServer};
use clap::{Parser, Subcommand};
use colored::*;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beacon")]
#[command(about = "Room-oriented signaling server and client", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a signaling server
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// Only accept connections presenting this application name
        #[arg(long)]
        app_name: Option<String>,

        #[arg(long, default_value = "default")]
        default_room: String,

        /// Don't join connections to the default room automatically
        #[arg(long)]
        no_default_room: bool,

        /// Don't create rooms on first join
        #[arg(long)]
        no_auto_create: bool,

        /// STUN/TURN urls handed to clients (repeatable)
        #[arg(long = "ice-server")]
        ice_servers: Vec<String>,
    },
    /// Join a room and chat from the terminal
    Join {
        #[arg(long, default_value = "ws://127.0.0.1:3000/ws")]
        url: String,

        #[arg(long, default_value = "default")]
        app: String,

        #[arg(long)]
        room: Option<String>,

        #[arg(long)]
        username: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            bind,
            app_name,
            default_room,
            no_default_room,
            no_auto_create,
            ice_servers,
        } => {
            serve(
                bind,
                app_name,
                default_room,
                no_default_room,
                no_auto_create,
                ice_servers,
            )
            .await
        }
        Commands::Join {
            url,
            app,
            room,
            username,
        } => join(url, app, room, username).await,
    }
}

async fn serve(
    bind: SocketAddr,
    app_name: Option<String>,
    default_room: String,
    no_default_room: bool,
    no_auto_create: bool,
    ice_servers: Vec<String>,
) -> Result<()> {
    let defaults = ServerOptions::default();
    let options = ServerOptions {
        app_name,
        room_default_name: default_room,
        room_default_enable: !no_default_room,
        room_auto_create_enable: !no_auto_create,
        ice_servers: if ice_servers.is_empty() {
            defaults.ice_servers.clone()
        } else {
            vec![IceServerConfig {
                urls: ice_servers,
                username: None,
                credential: None,
            }]
        },
        ..defaults
    };

    println!(
        "{}",
        format!("🚀 Signaling server on ws://{bind}/ws").green().bold()
    );

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    SignalingServer::new(options)
        .serve(listener)
        .await
        .context("Server failed")?;
    Ok(())
}

async fn join(
    url: String,
    app: String,
    room: Option<String>,
    username: Option<String>,
) -> Result<()> {
    let mut config = ClientConfig::new(&url, &app);
    if let Some(username) = &username {
        config = config.with_username(username.clone());
    }
    if let Some(room) = &room {
        config = config.with_room(room.clone());
    }

    let client = Client::connect(config)
        .await
        .context("Failed to connect to the signaling server")?;
    println!(
        "{} {}",
        "Connected as".green().bold(),
        client.client_id().to_string().cyan()
    );

    let names = client.clone();
    client.set_peer_listener(Some("chat"), None, move |sender, _, data, _| {
        let text = data
            .as_json()
            .and_then(|v| v.get("text"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        println!(
            "{} {}",
            format!("{}:", names.id_to_name(sender)).cyan().bold(),
            text
        );
    });
    client.set_room_occupant_listener(|room, snapshot| {
        println!(
            "{}",
            format!("[{room}] {} occupant(s)", snapshot.occupants.len()).dimmed()
        );
    });
    client.set_disconnect_listener(|| {
        println!("{}", "Lost connection to the server".red().bold());
        std::process::exit(1);
    });

    let target_room = room.unwrap_or_else(|| "default".to_owned());
    let prompt = username.unwrap_or_else(|| "me".to_owned());

    println!("{}", "Type messages; /quit leaves.".dimmed());
    loop {
        let prompt = prompt.clone();
        let line: String = tokio::task::spawn_blocking(move || {
            dialoguer::Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
        })
        .await
        .context("Prompt task failed")??;

        if line == "/quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let envelope = Envelope::json(
            "chat",
            serde_json::json!({ "text": line }),
            Targeting::room(target_room.as_str()),
        );
        if let Err(e) = client.send_message(envelope).await {
            println!("{}", format!("Send failed: {e}").red());
        }
    }

    client.disconnect();
    Ok(())
}
