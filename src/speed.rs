//! Speed limit lookups and speed submissions.

use actix_web::{
    error::{ErrorInternalServerError, InternalError},
    get, post, web, HttpRequest, HttpResponse,
};
use anyhow::Context;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;

use crate::{model::SpeedRecord, road::OverpassClient, store};

#[derive(Debug, Deserialize)]
pub struct Position {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    lat: f64,
    lon: f64,
    current_speed: i32,
}

#[derive(Debug, Serialize)]
struct SpeedResponse {
    latitude: f64,
    longitude: f64,
    current_speed: i32,
    road_speed_limit: i32,
    speed_difference: i32,
}

fn unprocessable(detail: impl ToString) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(json!({ "detail": detail.to_string() }))
}

fn no_speed_limit() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "No speed limit information found" }))
}

fn check_position(lat: f64, lon: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} is out of range"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude {lon} is out of range"));
    }
    Ok(())
}

/// Malformed request bodies are answered with 422 rather than actix's default 400.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        let response = unprocessable(&err);
        InternalError::from_response(err, response).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| {
        let response = unprocessable(&err);
        InternalError::from_response(err, response).into()
    })
}

#[get("/api/speed-limit")]
pub async fn limit_service(
    position: web::Query<Position>,
    overpass: web::Data<OverpassClient>,
) -> actix_web::Result<HttpResponse> {
    let Position { lat, lon } = position.into_inner();
    if let Err(e) = check_position(lat, lon) {
        return Ok(unprocessable(e));
    }

    let limit = overpass
        .speed_limit(lat, lon)
        .await
        .map_err(ErrorInternalServerError)?;

    Ok(match limit {
        Some(speed_limit) => HttpResponse::Ok().json(json!({ "speed_limit": speed_limit })),
        None => no_speed_limit(),
    })
}

#[post("/api/speed-info")]
pub async fn info_service(
    data: web::Json<SpeedRequest>,
    overpass: web::Data<OverpassClient>,
    pool: web::Data<PgPool>,
) -> actix_web::Result<HttpResponse> {
    let SpeedRequest {
        lat,
        lon,
        current_speed,
    } = data.into_inner();
    if let Err(e) = check_position(lat, lon) {
        return Ok(unprocessable(e));
    }
    if current_speed < 0 {
        return Ok(unprocessable(format!(
            "current speed {current_speed} is negative"
        )));
    }

    let Some(road_speed_limit) = overpass
        .speed_limit(lat, lon)
        .await
        .map_err(ErrorInternalServerError)?
    else {
        return Ok(no_speed_limit());
    };

    let record = SpeedRecord {
        latitude: lat,
        longitude: lon,
        current_speed,
        road_speed_limit,
        timestamp: None,
    };
    store::insert(&**pool, &record)
        .await
        .context("writing to database failed")
        .map_err(ErrorInternalServerError)?;
    info!("stored speed record at {lat},{lon}");

    Ok(HttpResponse::Ok().json(SpeedResponse {
        latitude: lat,
        longitude: lon,
        current_speed,
        road_speed_limit,
        speed_difference: record.speed_difference(),
    }))
}
