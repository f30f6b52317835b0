use std::path::Path;

use anyhow::Context;

use super::load_config;

pub fn check(path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(path)?;
    config.validate().context("invalid configuration")?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
