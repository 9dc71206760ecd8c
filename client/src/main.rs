//! CLI front-end for the link-layer file-transfer client: drives a
//! BACKUP, RESTORE or VERIFY session as the session's driver.

use ltproto::config::Config;
use ltproto::phase;
use ltproto::raw_socket::RawSocketTransport;
use std::fs::File;
use std::process::ExitCode;

fn usage() -> ! {
    eprintln!("usage: client <backup|restore|verify> <file> <interface>");
    std::process::exit(2);
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| usage());
    let path = args.next().unwrap_or_else(|| usage());
    let ifname = args.next().unwrap_or_else(|| usage());

    let mut transport = match RawSocketTransport::bind(&ifname) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("failed to bind to interface {ifname}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let config = Config::new();
    let filename = path.as_bytes();

    let ok = match command.as_str() {
        "backup" => {
            let mut file = match File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("cannot open {path}: {e}");
                    return ExitCode::FAILURE;
                }
            };
            phase::run_backup_driver(&mut transport, &config, filename, &mut file)
        }
        "restore" => {
            let mut file = match File::create(&path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("cannot create {path}: {e}");
                    return ExitCode::FAILURE;
                }
            };
            phase::run_restore_driver(&mut transport, &config, filename, &mut file)
        }
        "verify" => {
            let mut file = match File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("cannot open {path}: {e}");
                    return ExitCode::FAILURE;
                }
            };
            phase::run_verify_driver(&mut transport, &config, filename, &mut file)
        }
        _ => usage(),
    };

    match ok {
        Ok(true) => {
            log::info!("{command} of {path} completed successfully");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("{command} of {path} was rejected by the peer");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{command} of {path} failed: {e}");
            ExitCode::FAILURE
        }
    }
}
