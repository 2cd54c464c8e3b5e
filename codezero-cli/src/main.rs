use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use codezero_call::media::SyntheticMedia;
use codezero_call::peer::RtcPeerConnector;
use codezero_call::{
    CallConfig, CallController, CallError, CallPhase, CallSnapshot, StartOutcome, WsRelayClient,
};
use codezero_core::link::{room_from_link, share_link};
use codezero_core::{CallRole, IceServerConfig, RoomId};
use colored::*;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codezero")]
#[command(about = "Peer-to-peer calls for the CodeZero editor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a call, or join one when a room or link is given.
    Call(CallArgs),

    /// Print the share link for a room.
    Link {
        #[arg(long)]
        room: RoomId,

        #[arg(long, env = "CODEZERO_SHARE_BASE")]
        share_base: Option<String>,
    },
}

#[derive(Args)]
struct CallArgs {
    /// Room to join.
    #[arg(long, conflicts_with = "link")]
    room: Option<RoomId>,

    /// Share link to join; its `roomId` parameter selects the room.
    #[arg(long)]
    link: Option<String>,

    /// Relay WebSocket endpoint.
    #[arg(long, env = "CODEZERO_RELAY_URL")]
    relay: Option<String>,

    #[arg(long, env = "CODEZERO_SHARE_BASE")]
    share_base: Option<String>,

    /// STUN/TURN urls; replaces the default public STUN servers.
    #[arg(long = "stun", env = "CODEZERO_STUN", value_delimiter = ',')]
    stun: Vec<String>,

    /// Decline camera and microphone access.
    #[arg(long)]
    deny_media: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Call(args) => run_call(args).await,
        Commands::Link { room, share_base } => {
            let base = share_base.unwrap_or_else(|| CallConfig::default().share_base_url);
            let link = share_link(&base, &room)
                .with_context(|| format!("Invalid share base URL {}", base))?;
            println!("{}", link);
            Ok(())
        }
    }
}

fn build_config(args: &CallArgs) -> CallConfig {
    let mut config = CallConfig::default();
    if let Some(relay) = &args.relay {
        config.relay_url = relay.clone();
    }
    if let Some(base) = &args.share_base {
        config.share_base_url = base.clone();
    }
    if !args.stun.is_empty() {
        config.ice_servers = vec![IceServerConfig {
            urls: args.stun.clone(),
            username: None,
            credential: None,
        }];
    }
    config
}

async fn run_call(args: CallArgs) -> Result<()> {
    let config = build_config(&args);

    let room = match (&args.room, &args.link) {
        (Some(room), _) => Some(room.clone()),
        (None, Some(link)) => match room_from_link(link) {
            Some(room) => Some(room),
            None => bail!("Link has no valid roomId: {}", link),
        },
        (None, None) => None,
    };
    match &room {
        Some(room) => info!("Joining room {}", room),
        None => info!("Creating a new room"),
    }

    println!("{}", format!("Connecting to relay {}...", config.relay_url).cyan());
    let relay = WsRelayClient::connect(&config.relay_url)
        .await
        .context("Failed to reach the relay")?;

    let media = if args.deny_media {
        SyntheticMedia::denying()
    } else {
        SyntheticMedia::new()
    };

    let controller = CallController::spawn(
        Arc::new(relay),
        Arc::new(media),
        Arc::new(RtcPeerConnector::new(&config)),
    );

    let mut watch = controller.watch();
    tokio::spawn(async move {
        let mut last = watch.borrow().phase;
        while watch.changed().await.is_ok() {
            let snapshot = watch.borrow_and_update().clone();
            if snapshot.phase != last {
                last = snapshot.phase;
                print_phase(&snapshot);
            }
        }
    });

    start(&controller, room, &config).await;
    println!(
        "{}",
        "Commands: [c]amera, [m]icrophone, [s]tart/stop, [q]uit".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let command = line.trim();
                debug!("Console command {:?}", command);
                match command {
                    "c" => print_toggle("Camera", controller.toggle_camera().await),
                    "m" => print_toggle("Microphone", controller.toggle_mic().await),
                    "s" => start(&controller, None, &config).await,
                    "q" => break,
                    "" => {}
                    other => println!("{} {}", "Unknown command:".yellow(), other),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!("{}", "Hanging up...".cyan());
    controller.shutdown().await;
    info!("Call controller stopped");
    Ok(())
}

async fn start(controller: &CallController, room: Option<RoomId>, config: &CallConfig) {
    match controller.start_or_join(room).await {
        Ok(StartOutcome::Started { room_id, role }) => {
            println!(
                "{} room {} as {}",
                "Call started:".green().bold(),
                room_id.as_str().bold(),
                match role {
                    CallRole::Creator => "creator",
                    CallRole::Joiner => "joiner",
                }
            );
            if role == CallRole::Creator {
                match share_link(&config.share_base_url, &room_id) {
                    Ok(link) => println!("Share: {}", link.underline()),
                    Err(e) => warn!("Invalid share base {}: {}", config.share_base_url, e),
                }
            }
        }
        Ok(StartOutcome::Ended) => println!("{}", "Call ended.".yellow()),
        Err(CallError::PermissionDenied) => println!(
            "{}",
            "Camera or microphone access was denied. Allow it and try again.".red()
        ),
        Err(e) => println!("{} {}", "Call failed:".red().bold(), e),
    }
}

fn print_toggle(what: &str, state: Option<bool>) {
    match state {
        Some(true) => println!("{} on", what),
        Some(false) => println!("{} off", what),
        None => println!("{}", "No active call.".dimmed()),
    }
}

fn print_phase(snapshot: &CallSnapshot) {
    let label = match snapshot.phase {
        CallPhase::Idle => "idle".normal(),
        CallPhase::AcquiringMedia => "acquiring media".cyan(),
        CallPhase::Negotiating => "negotiating".cyan(),
        CallPhase::Connected => "connected".green().bold(),
        CallPhase::Ending => "ending".yellow(),
        CallPhase::Failed(reason) => format!("failed ({:?})", reason).red().bold(),
    };
    println!("Call is {}", label);

    if snapshot.phase == CallPhase::Connected {
        if let Some(track) = snapshot.remote_video() {
            println!("Receiving remote video {}", track.id.dimmed());
        }
    }
}
