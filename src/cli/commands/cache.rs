//! Cache command - inspect and remove stored entries

use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::Config;
use crate::error::{RestifyError, RestifyResult};
use crate::storage::{create_storage, Storage};
use crate::ui::{self, UiContext};
use chrono::{DateTime, Utc};

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> RestifyResult<()> {
    let storage = create_storage(&config.cache).await?;

    match args.action {
        CacheAction::Show { key } => show_entry(&*storage, &key).await,
        CacheAction::Remove { key } => remove_entry(&*storage, &key).await,
        CacheAction::Clear => clear_entries(&*storage).await,
    }
}

async fn show_entry(storage: &dyn Storage, key: &str) -> RestifyResult<()> {
    let ctx = UiContext::detect();
    let entry = storage
        .get(key)
        .await?
        .ok_or_else(|| RestifyError::User(format!("No entry stored for {}", key)))?;

    let expires = DateTime::<Utc>::from_timestamp(entry.expires_at, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| entry.expires_at.to_string());
    let state = if entry.is_fresh(Utc::now().timestamp()) {
        "fresh"
    } else {
        "expired"
    };

    ui::key_value(&ctx, "Backend", storage.backend_name());
    ui::key_value(&ctx, "Expires", &format!("{} ({})", expires, state));
    println!("{}", serde_json::to_string_pretty(&entry.data)?);
    Ok(())
}

async fn remove_entry(storage: &dyn Storage, key: &str) -> RestifyResult<()> {
    storage.remove(key).await?;
    ui::step_ok_detail(&UiContext::detect(), "Entry removed", key);
    Ok(())
}

async fn clear_entries(storage: &dyn Storage) -> RestifyResult<()> {
    storage.clear().await?;
    ui::step_ok_detail(
        &UiContext::detect(),
        "Cache cleared",
        storage.backend_name(),
    );
    Ok(())
}
