use log::{error, info, warn};
use std::process;

use rusty_gate::auth::JwtService;
use rusty_gate::config::GateConfig;
use rusty_gate::matcher::Matcher;
use rusty_gate::storage::memory::StoredUser;
use rusty_gate::Result;

const USAGE: &str = "usage:
    rusty_gate issue <subject> [email] [roles...]
    rusty_gate inspect <token>
    rusty_gate match <subject> <pattern>";

fn main() {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(_) => info!("Environment variables loaded from .env file"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("issue") if args.len() >= 2 => {
            let email = args.get(2).cloned().unwrap_or_default();
            let roles = args.iter().skip(3).cloned().collect();
            let user = StoredUser::new(args[1].clone(), email, roles);

            let service = jwt_service()?;
            let claims = service.new_claims(&user);
            let token = service.issue(&claims)?;
            print_json(&token);
        }
        Some("inspect") if args.len() == 2 => {
            let claims = jwt_service()?.parse_claims(&args[1])?;
            print_json(&claims);
        }
        Some("match") if args.len() == 3 => {
            let matched = Matcher::new().is_match(&args[1], &args[2])?;
            println!("{}", matched);
        }
        _ => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    }

    Ok(())
}

fn jwt_service() -> Result<JwtService> {
    let config = GateConfig::from_env()?;
    info!(
        "Configuration: algorithm={:?}, expiration={}s",
        config.jwt_algorithm,
        config.expiration.as_secs()
    );
    Ok(JwtService::new(config.jwt_config()?))
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize output: {}", e),
    }
}
