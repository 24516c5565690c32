//! Posted speed limits from OpenStreetMap, looked up through the Overpass API.

use std::{collections::HashMap, time::Duration};

use anyhow::{Context, Result};
use geo::Coord;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::heatmap::{DistanceMetric, Path};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverpassConfig {
    pub url: String,
    /// Search radius around the requested position, in metres.
    pub radius: u32,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            url: "https://overpass-api.de/api/interpreter".to_string(),
            radius: 50,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub geometry: Option<Vec<Node>>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Node {
    pub lat: f64,
    pub lon: f64,
}

pub struct OverpassClient {
    client: Client,
    config: OverpassConfig,
}

impl OverpassClient {
    pub fn new(config: OverpassConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    /// Every highway within the configured radius of a position.
    pub async fn nearby_roads(&self, lat: f64, lon: f64) -> Result<Vec<Element>> {
        let query = format!(
            "[out:json];\nway(around:{},{lat},{lon})[\"highway\"];\nout geom;",
            self.config.radius
        );

        let response: OverpassResponse = self
            .client
            .get(&self.config.url)
            .query(&[("data", query)])
            .send()
            .await
            .context("Overpass request failed")?
            .error_for_status()
            .context("Overpass returned an error")?
            .json()
            .await
            .context("Failed to parse Overpass response")?;

        debug!("{} roads near {lat},{lon}", response.elements.len());
        Ok(response.elements)
    }

    pub async fn speed_limit(&self, lat: f64, lon: f64) -> Result<Option<i32>> {
        let roads = self.nearby_roads(lat, lon).await?;
        Ok(speed_limit(&roads, lat, lon))
    }
}

/// The posted limit of the road nearest to a position.
///
/// Only the nearest road is considered: if it has no usable `maxspeed` tag
/// there is no limit, even when a road further away has one.
pub fn speed_limit(roads: &[Element], lat: f64, lon: f64) -> Option<i32> {
    let position = Coord { x: lon, y: lat };

    let mut nearest: Option<(&Element, f64)> = None;
    for road in roads {
        let Some(geometry) = &road.geometry else {
            continue;
        };
        let coords = geometry.iter().map(|n| Coord { x: n.lon, y: n.lat }).collect();
        let distance = Path::new(coords, DistanceMetric::Degrees).distance_to(position);
        if nearest.map_or(true, |(_, d)| distance < d) {
            nearest = Some((road, distance));
        }
    }

    let (road, _) = nearest?;
    parse_maxspeed(road.tags.get("maxspeed")?)
}

/// Leading number of an OSM `maxspeed` value, e.g. `50` or `30 mph`.
/// Limits that are not positive are ignored.
fn parse_maxspeed(value: &str) -> Option<i32> {
    value
        .split_whitespace()
        .next()?
        .parse()
        .ok()
        .filter(|x| *x > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn road(nodes: &[(f64, f64)], maxspeed: Option<&str>) -> Element {
        Element {
            geometry: Some(nodes.iter().map(|&(lat, lon)| Node { lat, lon }).collect()),
            tags: maxspeed
                .map(|x| HashMap::from([("maxspeed".to_string(), x.to_string())]))
                .unwrap_or_default(),
        }
    }

    #[test]
    fn maxspeed_values() {
        assert_eq!(parse_maxspeed("50"), Some(50));
        assert_eq!(parse_maxspeed("30 mph"), Some(30));
        assert_eq!(parse_maxspeed("none"), None);
        assert_eq!(parse_maxspeed("DE:urban"), None);
        assert_eq!(parse_maxspeed(""), None);
        assert_eq!(parse_maxspeed("-5"), None);
        assert_eq!(parse_maxspeed("0"), None);
    }

    #[test]
    fn nearest_road_wins() {
        let roads = [
            road(&[(52.5210, 13.4000), (52.5210, 13.4100)], Some("30")),
            road(&[(52.5201, 13.4000), (52.5201, 13.4100)], Some("50")),
        ];
        assert_eq!(speed_limit(&roads, 52.5200, 13.4050), Some(50));
    }

    #[test]
    fn nearest_road_without_limit() {
        let roads = [
            road(&[(52.5210, 13.4000), (52.5210, 13.4100)], Some("30")),
            road(&[(52.5201, 13.4000), (52.5201, 13.4100)], None),
        ];
        assert_eq!(speed_limit(&roads, 52.5200, 13.4050), None);
    }

    #[test]
    fn skips_elements_without_geometry() {
        let roads = [
            Element {
                geometry: None,
                tags: HashMap::from([("maxspeed".to_string(), "100".to_string())]),
            },
            road(&[(52.5300, 13.4000), (52.5300, 13.4100)], Some("70")),
        ];
        assert_eq!(speed_limit(&roads, 52.5200, 13.4050), Some(70));
    }

    #[test]
    fn no_roads() {
        assert_eq!(speed_limit(&[], 52.5200, 13.4050), None);
    }

    #[test]
    fn parses_overpass_json() {
        let response: OverpassResponse = serde_json::from_str(
            r#"{
                "version": 0.6,
                "elements": [
                    {
                        "type": "way",
                        "id": 4611694,
                        "geometry": [{"lat": 52.52, "lon": 13.40}, {"lat": 52.52, "lon": 13.41}],
                        "tags": {"highway": "primary", "maxspeed": "50"}
                    },
                    {"type": "node", "id": 1}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(response.elements.len(), 2);
        assert_eq!(speed_limit(&response.elements, 52.5201, 13.405), Some(50));
    }
}
