use std::path::Path;

use anyhow::Context;
use dialoguer::{Input, Password};
use gridapi::{Credentials, DEFAULT_BASE_URL, config_path, update_api_key, update_base_url};

pub fn handle(base_url: Option<String>, key: Option<String>) -> anyhow::Result<()> {
    let path = config_path()?;
    if base_url.is_none() && key.is_none() {
        return logon(&path);
    }

    if let Some(url) = base_url {
        update_base_url(&path, &url)?;
        println!("Updated base URL in {}", path.display());
    }
    if let Some(key) = key {
        update_api_key(&path, &key)?;
        println!("Updated API key in {}", path.display());
    }
    Ok(())
}

/// Prompts for every field and overwrites the credentials file.
pub fn logon(path: &Path) -> anyhow::Result<()> {
    let username: String = Input::new()
        .with_prompt("GRiD Username")
        .interact_text()
        .context("failed to read username")?;
    let password = Password::new()
        .with_prompt("GRiD Password")
        .interact()
        .context("failed to read password")?;
    let key: String = Input::new()
        .with_prompt("GRiD API Key")
        .interact_text()
        .context("failed to read API key")?;
    let url: String = Input::new()
        .with_prompt("GRiD Base URL")
        .default(DEFAULT_BASE_URL.to_string())
        .interact_text()
        .context("failed to read base URL")?;

    Credentials::from_login(&username, &password, &key, &url).save(path)?;
    println!("Credentials written to {}", path.display());
    Ok(())
}
