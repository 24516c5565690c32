use std::path::{Path, PathBuf};

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use sqlx::PgPool;

mod config;
mod heatmap;
mod import;
mod model;
mod road;
mod speed;
mod store;

#[derive(Debug, Parser)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer speed limit lookups, accept speed submissions and serve the heatmap
    Serve { port: Option<u16> },
    /// Load speed records from a CSV file
    Import { path: PathBuf },
    /// Write the heatmap of all stored records to a GeoJSON file
    Heatmap {
        #[arg(short, long, default_value = "heatmap.geojson")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let path = match cli.config.as_deref() {
        Some(x) => x,
        None => Path::new("config.toml"),
    };
    let config = config::load(path)?;

    let pool = PgPool::connect(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;

    match cli.command {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.http_port);
            let overpass = web::Data::new(road::OverpassClient::new(config.overpass)?);
            let heatmap_config = web::Data::new(config.heatmap);

            info!("listening on port {port}");
            HttpServer::new(move || {
                App::new()
                    .wrap(Logger::default())
                    .app_data(web::Data::new(pool.clone()))
                    .app_data(overpass.clone())
                    .app_data(heatmap_config.clone())
                    .app_data(speed::json_config())
                    .app_data(speed::query_config())
                    .service(speed::limit_service)
                    .service(speed::info_service)
                    .service(heatmap::service)
            })
            .bind(("0.0.0.0", port))?
            .run()
            .await?;
        }

        Command::Import { path } => import::run(pool, &path).await?,
        Command::Heatmap { output } => heatmap::run(pool, config.heatmap, &output).await?,
    };

    Ok(())
}
