use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use glam::Vec2;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use openremap::controller::{DeviceSnapshot, GilrsSampler, Initializing, RawSampler, Sampling};
use openremap::mapping::{FrameReport, SequenceStatus};
use openremap::persistence::TomlFileStore;
use openremap::{Action, Column, InputRemapper, RemapSettings};

// 60 Hz
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

#[derive(Parser, Debug)]
#[command(name = "openremap", version, about = "Remap gamepad, keyboard and mouse input")]
struct Cli {
    /// Settings file, defaults to ~/.config/openremap/settings.toml
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Binding store, defaults to ~/.config/openremap/bindings.toml
    #[arg(long)]
    bindings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calibrate, then log movement, camera and button presses
    Monitor,
    /// Rebind every action of one column, then save
    Rebind {
        /// 0 = keyboard/mouse, 1 = primary pad, 2 = secondary pad
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
        column: u8,
    },
    /// Revert all columns to their defaults and save
    Reset,
    /// Print the bindings of every action
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;
    let cli = Cli::parse();

    let settings_path = cli.settings.unwrap_or_else(RemapSettings::default_path);
    let settings = RemapSettings::load_or_create(&settings_path)
        .map_err(|e| eyre!("Failed to load settings from {}: {}", settings_path.display(), e))?;
    let mut store =
        TomlFileStore::open_or_empty(cli.bindings.unwrap_or_else(TomlFileStore::default_path));
    info!("Using binding store {}", store.path().display());

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            ctrl_c_token.cancel();
        }
    });

    match cli.command {
        Command::Monitor => {
            let mut remapper = gilrs_remapper(settings)?;
            remapper.load_bindings(&store);
            monitor(&mut remapper, &token).await;
        }
        Command::Rebind { column } => {
            let column = Column::try_from(usize::from(column))?;
            let mut remapper = gilrs_remapper(settings)?;
            remapper.load_bindings(&store);
            if rebind(&mut remapper, column, &token).await && !remapper.save_bindings(&mut store) {
                warn!("Bindings were not fully saved");
            }
        }
        Command::Reset => {
            let mut remapper = InputRemapper::new(DeviceSnapshot::new(), settings);
            remapper.revert_all();
            if !remapper.save_bindings(&mut store) {
                warn!("Bindings were not fully saved");
            }
            show(&remapper);
        }
        Command::Show => {
            let mut remapper = InputRemapper::new(DeviceSnapshot::new(), settings);
            remapper.load_bindings(&store);
            show(&remapper);
        }
    }

    Ok(())
}

type GilrsRemapper = InputRemapper<GilrsSampler<Sampling>>;

fn gilrs_remapper(settings: RemapSettings) -> Result<GilrsRemapper> {
    let sampler = GilrsSampler::<Initializing>::create()?.initialize();
    Ok(InputRemapper::new(sampler, settings))
}

/// Runs `frame` at 60 Hz until it returns false or the token is canceled
async fn run_frames<F>(token: &CancellationToken, mut frame: F)
where
    F: FnMut(Duration) -> bool,
{
    let mut interval = tokio::time::interval(FRAME_INTERVAL);
    let mut last = interval.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!("Frame loop canceled");
                break;
            }

            now = interval.tick() => {
                let elapsed = now - last;
                last = now;
                if !frame(elapsed) {
                    break;
                }
            }
        }
    }
}

async fn monitor(remapper: &mut GilrsRemapper, token: &CancellationToken) {
    info!(
        "Connected pads: {:?}",
        remapper.sampler().connected_device_names()
    );
    info!("Press any button and leave the sticks alone to calibrate");
    remapper.recalibrate();

    let mut last_movement = Vec2::ZERO;
    let mut last_camera = Vec2::ZERO;
    run_frames(token, |elapsed| {
        remapper.sampler_mut().refresh();
        let report: FrameReport = remapper.update(elapsed);
        if report.calibration.is_some() {
            return true;
        }

        let movement = remapper.movement();
        if movement != last_movement {
            info!("Movement: ({:.2}, {:.2})", movement.x, movement.y);
            last_movement = movement;
        }
        let camera = remapper.camera_vector();
        if camera != last_camera {
            info!("Camera: ({:.2}, {:.2})", camera.x, camera.y);
            last_camera = camera;
        }
        for action in Action::ALL {
            if remapper.just_pressed(action) {
                info!("{} pressed", action);
            }
        }
        true
    })
    .await;
}

/// Returns true if the sequence ran to the end
async fn rebind(remapper: &mut GilrsRemapper, column: Column, token: &CancellationToken) -> bool {
    if !remapper.start_rebind_sequence(column, Action::ALL.to_vec()) {
        return false;
    }

    let mut last_status = None;
    let mut finished = false;
    run_frames(token, |elapsed| {
        remapper.sampler_mut().refresh();
        let status = remapper.update(elapsed).sequence;
        if status != last_status {
            match status {
                Some(SequenceStatus::Settling(action)) => {
                    debug!("Release all inputs before {}", action)
                }
                Some(SequenceStatus::Capturing(action)) => {
                    info!("{}: {}", action.menu_label(), action.description())
                }
                Some(SequenceStatus::Finished) | None => {}
            }
            last_status = status;
        }
        finished = matches!(status, Some(SequenceStatus::Finished));
        !finished
    })
    .await;

    if !finished {
        remapper.cancel_rebind();
    }
    finished
}

fn show<S: RawSampler>(remapper: &InputRemapper<S>) {
    for action in Action::ALL {
        let labels = remapper.action_labels(action);
        println!(
            "{:<12} {}",
            action.menu_label(),
            if labels.is_empty() { "-" } else { labels.as_str() }
        );
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}
