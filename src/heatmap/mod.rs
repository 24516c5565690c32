//! Speed-deviation heatmap.
//!
//! Stored samples are split into trips, every trip is resampled at a fixed
//! interval along its path, and points from all trips that land on the same
//! coordinate are averaged into one GeoJSON feature.

use std::{fs, path::Path as FsPath};

use actix_web::{
    error::{ErrorBadRequest, ErrorInternalServerError},
    get, web, HttpResponse,
};
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use log::{debug, info};
use rayon::prelude::*;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{model::Sample, store};

mod aggregate;
mod interpolate;
mod path;
mod trip;

pub use aggregate::AggregatedPoint;
pub use path::{DistanceMetric, Path};

#[derive(Debug, thiserror::Error)]
pub enum HeatmapError {
    #[error("sample #{index} is earlier than the sample before it")]
    Unsorted { index: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    pub time_threshold_minutes: f64,
    pub interval: f64,
    pub metric: DistanceMetric,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            time_threshold_minutes: 30.0,
            interval: 100.0,
            metric: DistanceMetric::Degrees,
        }
    }
}

impl HeatmapConfig {
    pub fn validate(&self) -> Result<(), HeatmapError> {
        if !(self.time_threshold_minutes >= 0.0) {
            return Err(HeatmapError::InvalidParameter(format!(
                "time threshold must be a non-negative number of minutes, got {}",
                self.time_threshold_minutes
            )));
        }
        if !(self.interval > 0.0) || !self.interval.is_finite() {
            return Err(HeatmapError::InvalidParameter(format!(
                "interval must be a positive number, got {}",
                self.interval
            )));
        }
        Ok(())
    }
}

/// Runs the whole pipeline over time-ordered samples.
///
/// Trips are resampled in parallel; aggregation waits for all of them.
pub fn compute(
    samples: &[Sample],
    config: &HeatmapConfig,
) -> Result<Vec<AggregatedPoint>, HeatmapError> {
    config.validate()?;

    let trips = trip::segment(samples, config.time_threshold_minutes)?;
    debug!("{} samples split into {} trips", samples.len(), trips.len());

    let resampled = trips
        .par_iter()
        .map(|trip| {
            let Some((path, distances)) = path::build(trip, config.metric) else {
                debug!("skipping trip with {} sample(s)", trip.len());
                return Ok(Vec::new());
            };
            let deviations: Vec<i32> = trip.iter().map(|s| s.speed_difference).collect();
            interpolate::interpolate(&path, &distances, &deviations, config.interval)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(aggregate::aggregate(resampled.into_iter().flatten()))
}

/// Wraps aggregated points into point features carrying their mean deviation.
pub fn assemble(points: &[AggregatedPoint]) -> FeatureCollection {
    let features = points
        .iter()
        .map(|p| {
            let mut properties = JsonObject::new();
            properties.insert("speed_difference".to_string(), json!(p.mean_deviation));
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![p.x, p.y]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

async fn load(
    pool: &PgPool,
    config: HeatmapConfig,
) -> Result<Result<FeatureCollection, HeatmapError>> {
    let samples = store::samples(pool)
        .await
        .context("Failed to load samples")?;

    let result = web::block(move || compute(&samples, &config))
        .await
        .map_err(|_| anyhow::anyhow!("Heatmap computation was cancelled"))?;
    Ok(result.map(|points| assemble(&points)))
}

#[derive(Debug, Deserialize)]
pub struct HeatmapQuery {
    time_threshold: Option<f64>,
    interval: Option<f64>,
}

#[get("/api/speed-heatmap")]
pub async fn service(
    query: web::Query<HeatmapQuery>,
    pool: web::Data<PgPool>,
    defaults: web::Data<HeatmapConfig>,
) -> actix_web::Result<HttpResponse> {
    let query = query.into_inner();
    let config = HeatmapConfig {
        time_threshold_minutes: query
            .time_threshold
            .unwrap_or(defaults.time_threshold_minutes),
        interval: query.interval.unwrap_or(defaults.interval),
        metric: defaults.metric,
    };
    config.validate().map_err(ErrorBadRequest)?;

    let collection = load(&pool, config)
        .await
        .map_err(ErrorInternalServerError)?
        .map_err(ErrorInternalServerError)?;

    Ok(HttpResponse::Ok()
        .content_type("application/geo+json")
        .json(collection))
}

/// Writes the heatmap for every stored sample to a GeoJSON file.
pub async fn run(pool: PgPool, config: HeatmapConfig, output: &FsPath) -> Result<()> {
    let collection = load(&pool, config).await??;
    info!(
        "writing {} heatmap points to {}",
        collection.features.len(),
        output.display()
    );
    fs::write(output, serde_json::to_string(&collection)?)?;
    Ok(())
}
