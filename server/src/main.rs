//! Link-layer file-transfer server: runs as the follower for whichever
//! operation the next connecting driver requests.

use ltproto::config::Config;
use ltproto::phase::{self, SessionOutcome};
use ltproto::raw_socket::RawSocketTransport;
use std::fs::File;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let ifname = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("usage: server <interface> [storage-dir]");
        std::process::exit(2);
    });
    let storage_dir = std::env::args().nth(2).unwrap_or_else(|| ".".to_string());

    let mut transport = match RawSocketTransport::bind(&ifname) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("failed to bind to interface {ifname}: {e}");
            std::process::exit(1);
        }
    };
    let config = Config::new();

    log::info!("listening on {ifname}, storing files under {storage_dir}");

    loop {
        let storage_dir = storage_dir.clone();
        let result = phase::run_follower_session(
            &mut transport,
            &config,
            |name| File::create(Path::new(&storage_dir).join(String::from_utf8_lossy(name).as_ref())),
            |name| File::open(Path::new(&storage_dir).join(String::from_utf8_lossy(name).as_ref())),
        );

        match result {
            Ok(SessionOutcome::Backup(name)) => {
                log::info!("backup of {} completed", String::from_utf8_lossy(&name));
            }
            Ok(SessionOutcome::Restore(name)) => {
                log::info!("restore of {} completed", String::from_utf8_lossy(&name));
            }
            Ok(SessionOutcome::Verify(name, matched)) => {
                log::info!(
                    "verify of {} completed, matched = {matched}",
                    String::from_utf8_lossy(&name)
                );
            }
            Err(e) => {
                log::warn!("session failed: {e}");
            }
        }
    }
}
