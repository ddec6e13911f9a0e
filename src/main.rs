use std::process;
use std::sync::Arc;
use std::time::Duration;

use ftpcamd::engine::Engine;
use ftpcamd::ftp::FtpConnector;
use ftpcamd::guard::FsGuard;
use ftpcamd::pending::PendingSet;
use ftpcamd::shutdown::get_signal_type;
use ftpcamd::{cli, config, instance, logging, watcher, worker};
use ftpcamd::{PROGRAM_NAME, PROGRAM_VERSION};

fn main() {
    let (log_file, config_file, oneshot) = cli::parse_args();
    if let Some(log_file) = log_file {
        logging::set_log_file(log_file);
    }

    let _ = logging::info(&format!("{} {} starting", PROGRAM_NAME, PROGRAM_VERSION));

    let config_file = config_file.expect("config file argument checked by parse_args");
    let config = match config::parse_config(&config_file) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            let _ = logging::error(&format!("Error parsing config {}: {}", config_file, e));
            process::exit(1);
        }
    };

    if let Err(e) = instance::check_single_instance() {
        let _ = logging::error(&e.to_string());
        process::exit(1);
    }
    let _cleanup = scopeguard::guard((), |_| instance::cleanup_lock_file());

    let pending = Arc::new(PendingSet::new(config.extensions.clone()));

    // Seed with files already present before the watch begins.
    let video_dir = std::path::Path::new(&config.video_dir);
    match watcher::scan_existing(video_dir, &pending) {
        Ok(seeded) => {
            let _ = logging::info(&format!(
                "Startup scan of {} seeded {} pending file(s)",
                config.video_dir, seeded
            ));
        }
        Err(e) => {
            let _ = logging::error(&format!(
                "Error scanning video directory {}: {}",
                config.video_dir, e
            ));
            process::exit(1);
        }
    }

    // The watcher handle must stay alive for the watch to persist.
    let _watcher = if oneshot {
        None
    } else {
        match watcher::spawn(video_dir, Arc::clone(&pending)) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                let _ = logging::error(&format!(
                    "Error watching video directory {}: {}",
                    config.video_dir, e
                ));
                process::exit(1);
            }
        }
    };

    let engine = Engine::new(
        Arc::clone(&config),
        Box::new(FtpConnector::new(Arc::clone(&config))),
        Box::new(FsGuard),
    );

    if oneshot {
        let uploaded = worker::drain_cycle(&engine, &pending);
        let _ = logging::info(&format!(
            "Single cycle complete, {} file(s) uploaded, {} still pending",
            uploaded,
            pending.len()
        ));
    } else {
        worker::run(&engine, &pending, Duration::from_secs(config.cycle_seconds));
        if let Some(signal_type) = get_signal_type() {
            let signal_name = match signal_type {
                1 => "SIGINT",
                _ => "SIGTERM",
            };
            let _ = logging::info(&format!("Received {}, shutting down", signal_name));
        }
    }

    let _ = logging::info(&format!("{} stopped", PROGRAM_NAME));
}
