//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::schema::StorageBackend;
use crate::config::{Config, ConfigManager};
use crate::error::{RestifyError, RestifyResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Every key accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "client.endpoint",
    "client.timeout_secs",
    "client.user_agent",
    "client.coalesce",
    "cache.backend",
    "cache.dir",
    "cache.default_ttl_secs",
];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    manager: &ConfigManager,
    config: &Config,
) -> RestifyResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> RestifyResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> RestifyResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> RestifyResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();

    if !VALID_KEYS.contains(&key) {
        ui::step_error_detail(&ctx, "Unknown config key", key);
        ui::remark(&ctx, "Valid keys:");
        for valid in VALID_KEYS {
            ui::remark(&ctx, valid);
        }
        return Err(RestifyError::User(format!("Unknown config key: {}", key)));
    }

    apply(&mut config, key, value)?;

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply a dot-separated key to the configuration
fn apply(config: &mut Config, key: &str, value: &str) -> RestifyResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(RestifyError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },

        ["client", "endpoint"] => config.client.endpoint = value.to_string(),
        ["client", "timeout_secs"] => config.client.timeout_secs = parse_u64(value)?,
        ["client", "user_agent"] => config.client.user_agent = value.to_string(),
        ["client", "coalesce"] => config.client.coalesce = parse_bool(value)?,

        ["cache", "backend"] => {
            config.cache.backend = value.parse::<StorageBackend>().map_err(RestifyError::User)?
        }
        ["cache", "dir"] => {
            config.cache.dir = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            }
        }
        ["cache", "default_ttl_secs"] => config.cache.default_ttl_secs = parse_u64(value)?,

        _ => return Err(RestifyError::User(format!("Unknown config key: {}", key))),
    }

    Ok(())
}

fn parse_bool(value: &str) -> RestifyResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(RestifyError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> RestifyResult<u64> {
    value
        .parse()
        .map_err(|_| RestifyError::User(format!("Invalid number: {}", value)))
}
