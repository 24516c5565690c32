use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{heatmap::HeatmapConfig, road::OverpassConfig};

#[derive(Debug, Deserialize)]
pub struct Config {
    // may be left out when DATABASE_URL is provided through the environment
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default)]
    pub overpass: OverpassConfig,
    #[serde(default)]
    pub heatmap: HeatmapConfig,
}

fn default_http_port() -> u16 {
    8080
}

pub fn load(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path).context("Failed to read config")?;
    parse(&data)
}

fn parse(data: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(data).context("Failed to parse config")?;

    dotenvy::dotenv().ok();
    if let Ok(url) = env::var("DATABASE_URL") {
        config.database_url = url;
    }
    anyhow::ensure!(
        !config.database_url.is_empty(),
        "database_url is not configured and DATABASE_URL is not set"
    );

    config.heatmap.validate()?;
    Ok(config)
}
