//! Polylines through a trip's samples and distances measured along them.

use geo::{Coord, LineString, Point};
use serde::Deserialize;

use crate::model::Sample;

/// How lengths along a path are measured.
///
/// `Degrees` is plain planar distance between longitude/latitude pairs, which
/// is what stored heatmaps have always been computed with. `Haversine` gives
/// metres instead, in which case the heatmap interval is also in metres.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Degrees,
    Haversine,
}

impl DistanceMetric {
    #[allow(deprecated)]
    pub fn distance(self, a: Coord, b: Coord) -> f64 {
        match self {
            DistanceMetric::Degrees => (b - a).x.hypot((b - a).y),
            DistanceMetric::Haversine => {
                use geo::HaversineDistance;
                Point::from(a).haversine_distance(&Point::from(b))
            }
        }
    }
}

/// An ordered polyline with the running length at each vertex.
#[derive(Debug, Clone)]
pub struct Path {
    line: LineString,
    // cumulative[i] is the length from the start to vertex i
    cumulative: Vec<f64>,
}

impl Path {
    pub fn new(coords: Vec<Coord>, metric: DistanceMetric) -> Self {
        let mut cumulative = Vec::with_capacity(coords.len());
        let mut total = 0.0;
        for (i, c) in coords.iter().enumerate() {
            if i > 0 {
                total += metric.distance(coords[i - 1], *c);
            }
            cumulative.push(total);
        }

        Self {
            line: LineString::new(coords),
            cumulative,
        }
    }

    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn line(&self) -> &LineString {
        &self.line
    }

    /// Distance along the path to the point on it nearest to `c`.
    ///
    /// When several segments are equally near, the earliest one wins.
    pub fn project(&self, c: Coord) -> f64 {
        self.nearest(c).map(|(along, _)| along).unwrap_or(0.0)
    }

    /// Planar distance from `c` to the nearest point of the path.
    pub fn distance_to(&self, c: Coord) -> f64 {
        match self.line.0.as_slice() {
            [] => f64::INFINITY,
            [only] => planar(*only, c),
            _ => self.nearest(c).map(|(_, d)| d).unwrap_or(f64::INFINITY),
        }
    }

    fn nearest(&self, c: Coord) -> Option<(f64, f64)> {
        let mut best: Option<(f64, f64)> = None;
        for (i, segment) in self.line.lines().enumerate() {
            let d = segment.delta();
            let norm = d.x * d.x + d.y * d.y;
            let t = if norm == 0.0 {
                0.0
            } else {
                let v = c - segment.start;
                ((v.x * d.x + v.y * d.y) / norm).clamp(0.0, 1.0)
            };
            let closest = if t == 0.0 {
                segment.start
            } else if t == 1.0 {
                segment.end
            } else {
                segment.start + d * t
            };

            let distance = planar(closest, c);
            if best.map_or(true, |(_, x)| distance < x) {
                let segment_length = self.cumulative[i + 1] - self.cumulative[i];
                best = Some((self.cumulative[i] + t * segment_length, distance));
            }
        }
        best
    }

    /// The point at `distance` along the path, clamped to its ends.
    pub fn interpolate(&self, distance: f64) -> Option<Coord> {
        let coords = &self.line.0;
        let first = *coords.first()?;
        if distance <= 0.0 {
            return Some(first);
        }

        for (i, segment) in self.line.lines().enumerate() {
            let start = self.cumulative[i];
            let end = self.cumulative[i + 1];
            if distance <= end && end > start {
                let t = (distance - start) / (end - start);
                return Some(segment.start + segment.delta() * t);
            }
        }
        coords.last().copied()
    }
}

fn planar(a: Coord, b: Coord) -> f64 {
    (b - a).x.hypot((b - a).y)
}

/// Builds the path through a trip and the projected distance of each of its
/// samples. Trips with fewer than two samples have no path.
pub fn build(trip: &[Sample], metric: DistanceMetric) -> Option<(Path, Vec<f64>)> {
    if trip.len() < 2 {
        return None;
    }

    let coords: Vec<Coord> = trip
        .iter()
        .map(|s| Coord {
            x: s.longitude,
            y: s.latitude,
        })
        .collect();
    let path = Path::new(coords, metric);
    let distances = path.line.0.iter().map(|c| path.project(*c)).collect();

    Some((path, distances))
}
