mod alarm;
mod app;
mod audio;
mod client;
mod config;
mod render;
mod threshold;
mod ui;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use gtk4::glib;
use gtk4::prelude::*;
use tokio::task::JoinHandle;

use app::{AppState, BackendEvent};
use client::StatusClient;
use config::Config;

const APP_ID: &str = "io.github.occupancy-alarm";
/// Stop requests issued on window close, awaited before exit.
type PendingStops = Rc<RefCell<Vec<JoinHandle<()>>>>;

/// How long a close-time `stop_detection` may keep the process alive.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "occupancy-alarm", version, about = "Occupancy dashboard with audible alarm")]
struct Cli {
    /// Detection server base URL
    #[arg(long)]
    server: Option<String>,

    /// Alarm sound (WAV)
    #[arg(long)]
    sound: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective config back to the config file
    #[arg(long)]
    write_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a two-tone alarm WAV
    GenerateAlarm {
        /// Output path (defaults to the configured alarm sound)
        path: Option<PathBuf>,
        /// Length in seconds
        #[arg(long, default_value_t = 2.0)]
        duration: f32,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let mut config = Config::load_from(&config_path);
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if let Some(sound) = cli.sound {
        config.alarm_sound = Some(sound);
    }

    if cli.write_config {
        match config.save_to(&config_path) {
            Ok(()) => log::info!("Config written to {}", config_path.display()),
            Err(e) => log::warn!("Failed to save config: {e}"),
        }
    }

    if let Some(Command::GenerateAlarm { path, duration }) = cli.command {
        let Some(path) = path.or(config.alarm_sound) else {
            log::error!("No output path given and no alarm sound configured");
            std::process::exit(2);
        };
        if let Err(e) = audio::generate::write_alarm_wav(&path, duration) {
            log::error!("Failed to generate alarm sound: {e}");
            std::process::exit(1);
        }
        return;
    }

    log::info!("Occupancy monitor starting");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let application = libadwaita::Application::builder()
        .application_id(APP_ID)
        .build();

    let handle = runtime.handle().clone();
    let pending: PendingStops = Rc::new(RefCell::new(Vec::new()));
    {
        let pending = pending.clone();
        application.connect_activate(move |app| on_activate(app, &config, &handle, &pending));
    }
    // Arguments were consumed by clap; GTK gets none.
    application.run_with_args(&[] as &[&str]);

    app::finish_pending(&runtime, pending.take(), SHUTDOWN_GRACE);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
}

fn on_activate(
    app: &libadwaita::Application,
    config: &Config,
    runtime: &tokio::runtime::Handle,
    pending: &PendingStops,
) {
    if let Some(window) = app.active_window() {
        window.present();
        return;
    }

    let client = match StatusClient::new(&config.server_url, config.request_timeout()) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Cannot reach {}: {e}", config.server_url);
            app.quit();
            return;
        }
    };

    // Async channel for runtime → UI communication
    let (backend_tx, backend_rx) = async_channel::unbounded::<BackendEvent>();

    let dashboard = ui::dashboard::build_dashboard(app, &config.server_url);
    let state = Rc::new(RefCell::new(AppState::new(
        config.clone(),
        client,
        runtime.clone(),
        Box::new(dashboard.clone()),
        backend_tx,
    )));

    // Window close: silence the alarm before anything else
    {
        let state_clone = state.clone();
        let pending = pending.clone();
        dashboard.window.connect_close_request(move |_| {
            if let Some(task) = app::shutdown(&state_clone) {
                pending.borrow_mut().push(task);
            }
            glib::Propagation::Proceed
        });
    }

    dashboard.window.present();

    app::start_polling(&state);

    // Attach backend event handler
    {
        let state_clone = state.clone();
        glib::spawn_future_local(async move {
            while let Ok(event) = backend_rx.recv().await {
                app::handle_backend_event(&state_clone, event);
            }
        });
    }
}
