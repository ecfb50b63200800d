use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{debug, info};
use tabled::{Table, Tabled};

use aqara::config::{self, Config};
use aqara::{AqaraClient, Credentials, Device, Region};

#[derive(Parser)]
#[command(name = "aqara")]
#[command(about = "A CLI for the Aqara open cloud API")]
#[command(version)]
struct Cli {
    /// Aqara data centre: china, usa, south-korea, russia, europe or singapore
    #[arg(long, env = "AQARA_REGION", global = true)]
    region: Option<Region>,

    /// App ID from the Aqara developer console
    #[arg(long, env = "AQARA_APP_ID", global = true)]
    app_id: Option<String>,

    /// Key ID from the Aqara developer console
    #[arg(long, env = "AQARA_KEY_ID", global = true)]
    key_id: Option<String>,

    /// App key from the Aqara developer console
    #[arg(long, env = "AQARA_APP_KEY", hide_env_values = true, global = true)]
    app_key: Option<String>,

    /// Phone number or email address registered with Aqara
    #[arg(long, env = "AQARA_ACCOUNT", global = true)]
    account: Option<String>,

    /// Log raw API responses
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a one-time authorization code to the account by SMS or email
    RequestCode,
    /// Log in with an authorization code and list the account's devices
    Devices {
        /// Authorization code already received (skips requesting a new one)
        #[arg(long)]
        auth_code: Option<String>,
    },
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "DID")]
    did: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
}

impl From<&Device> for DeviceRow {
    fn from(device: &Device) -> Self {
        Self {
            name: if device.device_name.is_empty() {
                "Unnamed".to_string()
            } else {
                device.device_name.clone()
            },
            model: device.model.clone(),
            did: device.did.clone(),
            state: if device.is_online() {
                "Online".to_string()
            } else {
                "Offline".to_string()
            },
            firmware: device.firmware_version.clone(),
        }
    }
}

struct Settings {
    region: Region,
    credentials: Credentials,
    account: String,
}

fn required(value: Option<String>, what: &str, flag: &str, env: &str) -> Result<String> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| {
        anyhow::anyhow!(
            "{} is required. Provide via --{}, the {} environment variable or ~/.aqara.yml.",
            what,
            flag,
            env
        )
    })
}

/// Flags and environment variables win over the configuration file.
fn resolve_settings(cli: &Cli, config: Config) -> Result<Settings> {
    let region = cli.region.or(config.region).unwrap_or_default();
    let app_id = required(
        cli.app_id.clone().or(config.app_id),
        "App ID",
        "app-id",
        "AQARA_APP_ID",
    )?;
    let key_id = required(
        cli.key_id.clone().or(config.key_id),
        "Key ID",
        "key-id",
        "AQARA_KEY_ID",
    )?;
    let app_key = required(
        cli.app_key.clone().or(config.app_key),
        "App key",
        "app-key",
        "AQARA_APP_KEY",
    )?;
    let account = required(
        cli.account.clone().or(config.account),
        "Account",
        "account",
        "AQARA_ACCOUNT",
    )?;

    Ok(Settings {
        region,
        credentials: Credentials::new(app_id, key_id, app_key),
        account,
    })
}

fn clean_auth_code(code: &str) -> Result<String> {
    let code = code.trim();
    if code.is_empty() {
        return Err(anyhow::anyhow!("No authorization code entered."));
    }
    Ok(code.to_string())
}

fn prompt_auth_code() -> Result<String> {
    clean_auth_code(&rpassword::prompt_password("Authorization code: ")?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let settings = resolve_settings(&cli, config::load_config()?)?;
    debug!(
        "Using region {} ({}) for account {}",
        settings.region,
        settings.region.host(),
        settings.account
    );

    let mut client = AqaraClient::new(
        settings.region,
        settings.credentials,
        &settings.account,
        cli.debug,
    );

    match cli.command {
        Commands::RequestCode => {
            client.request_auth_code().await?;
            println!("Authorization code sent to {}.", settings.account);
        }
        Commands::Devices { auth_code } => {
            let auth_code = match auth_code {
                Some(code) => clean_auth_code(&code)?,
                None => {
                    client.request_auth_code().await?;
                    println!("Authorization code sent to {}.", settings.account);
                    prompt_auth_code()?
                }
            };

            info!("Logging in to Aqara...");
            client.exchange_token(&auth_code).await?;

            let devices = client.list_devices().await?;
            if devices.data.is_empty() {
                println!("No devices found for this account.");
                return Ok(());
            }

            let rows: Vec<DeviceRow> = devices.data.iter().map(DeviceRow::from).collect();
            println!("{}", Table::new(&rows));
            println!("Total devices: {}", devices.total_count);
        }
    }

    Ok(())
}
