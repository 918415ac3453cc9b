// Binary entry point — panicking on unrecoverable startup errors is fine here.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use lumen::engine::{Command, CommandQueue, Engine, EngineConfig};
use lumen::model::parse_scene_payload;
use lumen::osc::{receiver::OscReceiver, sender::OscSender};
use lumen::settings::Settings;

#[derive(Parser)]
#[command(name = "lumen", about = "OSC-driven LED animation engine", version)]
struct Cli {
    /// Settings file (JSON). Defaults apply when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene file to load at startup
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Override the OSC listen address
    #[arg(long)]
    listen: Option<String>,

    /// Override the render rate
    #[arg(long)]
    fps: Option<f64>,

    /// Override the strip length
    #[arg(long)]
    leds: Option<u32>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_settings(cli: &Cli) -> Settings {
    let mut settings = match &cli.config {
        Some(path) => match Settings::load(path) {
            Ok(s) => s,
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot load settings");
                process::exit(1);
            }
        },
        None => Settings::default(),
    };
    if let Some(listen) = &cli.listen {
        settings.osc.listen = listen.clone();
    }
    if let Some(fps) = cli.fps {
        settings.animation.target_fps = fps;
    }
    if let Some(leds) = cli.leds {
        settings.animation.led_count = leds;
    }
    settings
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let settings = load_settings(&cli);

    let queue = Arc::new(CommandQueue::new(settings.animation.command_queue_capacity));
    let (frame_tx, frame_rx) = mpsc::channel::<Vec<u8>>(4);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let config = EngineConfig {
        strip_len: settings.animation.led_count,
        target_fps: settings.animation.target_fps,
        master_brightness: settings.animation.master_brightness,
        dissolve_seconds: settings.animation.dissolve_seconds,
        speed_percent: settings.animation.speed_percent,
    };

    // Preload a scene file before the loop starts, same path as /load_json.
    if let Some(path) = &cli.scene {
        match std::fs::read_to_string(path)
            .map_err(lumen::EngineError::from)
            .and_then(|text| {
                parse_scene_payload(&text, settings.animation.led_count).map_err(Into::into)
            }) {
            Ok(scenes) => {
                info!(path = %path.display(), count = scenes.len(), "preloading scenes");
                queue.push(Command::LoadScene(scenes));
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot preload scene file");
                process::exit(1);
            }
        }
    } else {
        warn!("no scene preloaded; strip stays dark until /load_json arrives");
    }

    let receiver = match OscReceiver::bind(
        &settings.osc.listen,
        Arc::clone(&queue),
        settings.animation.led_count,
    )
    .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(addr = %settings.osc.listen, error = %e, "cannot bind OSC receiver");
            process::exit(1);
        }
    };

    let sender = match OscSender::bind(settings.osc.destinations.clone(), frame_rx).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "cannot bind OSC sender");
            process::exit(1);
        }
    };

    let engine = Engine::new(config, Arc::clone(&queue), Some(frame_tx));

    let receiver_task = tokio::spawn(receiver.run(shutdown_rx.clone()));
    let sender_task = tokio::spawn(sender.run(shutdown_rx.clone()));
    let engine_task = tokio::spawn(engine.run(shutdown_rx));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => error!(error = %e, "cannot listen for ctrl-c"),
    }
    let _ = shutdown_tx.send(true);

    let _ = engine_task.await;
    let _ = sender_task.await;
    let _ = receiver_task.await;
    info!("stopped");
}
