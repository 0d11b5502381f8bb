//! chirp-auth admin entry point

use chirp_auth::{
    auth::{AccessTokenIssuer, PasswordHasher},
    config::AppConfig,
    db, telemetry,
};
use std::io::BufRead;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // .env is a development convenience; production sets the environment
    dotenv::dotenv().ok();

    match args.get(1).map(String::as_str) {
        Some("--version") => {
            println!("chirp-auth {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some("--help") | None => {
            print_help();
            Ok(())
        }
        Some("hash-password") => hash_password(),
        Some("issue-token") => {
            let Some(user_id) = args.get(2) else {
                anyhow::bail!("issue-token requires a user ID");
            };
            issue_token(user_id)
        }
        Some("check") => check().await,
        Some(other) => {
            eprintln!("Unknown argument: {}", other);
            print_help();
            std::process::exit(1);
        }
    }
}

/// Read one password from stdin and print its hash
fn hash_password() -> anyhow::Result<()> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(&['\r', '\n'][..]);

    let hash = PasswordHasher::new().hash(password)?;
    println!("{}", hash);
    Ok(())
}

fn issue_token(user_id: &str) -> anyhow::Result<()> {
    let user_id = Uuid::parse_str(user_id)?;
    let config = load_config()?;

    let token = AccessTokenIssuer::from_config(&config.security).issue(user_id)?;
    println!("{}", token);
    Ok(())
}

/// Load configuration and ping the database
async fn check() -> anyhow::Result<()> {
    let config = load_config()?;
    telemetry::init_telemetry(&config.logging)?;

    let pool = db::create_pool(&config.database).await?;
    match db::health_check(&pool).await {
        db::HealthStatus::Healthy => {
            tracing::info!("Configuration and database OK");
            Ok(())
        }
        db::HealthStatus::Unhealthy(reason) => {
            anyhow::bail!("database unhealthy: {}", reason)
        }
    }
}

fn load_config() -> anyhow::Result<AppConfig> {
    AppConfig::from_env().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

fn print_help() {
    println!("chirp-auth {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: chirp-auth <command>");
    println!();
    println!("Commands:");
    println!("  hash-password          read a password from stdin and print its hash");
    println!("  issue-token <user-id>  print an access token for a user");
    println!("  check                  validate configuration and database connectivity");
    println!("  --version              print version and exit");
    println!("  --help                 print this help and exit");
    println!();
    println!("Configuration is read from CHIRP_* environment variables,");
    println!("e.g. CHIRP_DATABASE__URL and CHIRP_SECURITY__JWT_SECRET.");
}
