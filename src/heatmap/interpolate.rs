use geo::Coord;

use super::{path::Path, HeatmapError};

/// A point placed at a fixed distance along a trip's path, carrying the mean
/// deviation of the two samples around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResamplePoint {
    pub distance: f64,
    pub coord: Coord,
    pub value: f64,
}

/// Resamples a path every `interval`, starting at its beginning and stopping
/// before the whole part of the path's length.
///
/// Each resample point takes the mean deviation of the first pair of
/// consecutive samples whose projected distances bracket it. Points without a
/// bracketing pair, or whose pair contains a zero deviation, are left out:
/// a zero deviation means there is no signal for that sample.
pub fn interpolate(
    path: &Path,
    distances: &[f64],
    deviations: &[i32],
    interval: f64,
) -> Result<Vec<ResamplePoint>, HeatmapError> {
    if !(interval > 0.0) || !interval.is_finite() {
        return Err(HeatmapError::InvalidParameter(format!(
            "interval must be a positive number, got {interval}"
        )));
    }
    if distances.len() != deviations.len() {
        return Err(HeatmapError::InvalidParameter(format!(
            "{} projected distances for {} deviations",
            distances.len(),
            deviations.len()
        )));
    }

    let length = path.length();
    // distances stay below the truncated length, so a path shorter than one
    // unit is not resampled at all
    let limit = length.trunc();
    let mut points = Vec::new();
    for k in 0.. {
        let distance = k as f64 * interval;
        if distance >= limit {
            break;
        }
        let Some(coord) = path.interpolate(distance) else {
            break;
        };

        let projected = path.project(coord);
        if let Some(value) = bracketed_mean(distances, deviations, projected) {
            points.push(ResamplePoint {
                distance,
                coord,
                value,
            });
        }
    }

    Ok(points)
}

fn bracketed_mean(distances: &[f64], deviations: &[i32], d: f64) -> Option<f64> {
    let j = distances
        .windows(2)
        .position(|pair| pair[0] <= d && d <= pair[1])?;

    match (deviations[j], deviations[j + 1]) {
        (0, _) | (_, 0) => None,
        (a, b) => Some((a as f64 + b as f64) / 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::path::DistanceMetric;

    fn straight(xs: &[f64]) -> (Path, Vec<f64>) {
        let coords: Vec<Coord> = xs.iter().map(|&x| Coord { x, y: 0.0 }).collect();
        let path = Path::new(coords, DistanceMetric::Degrees);
        (path, xs.to_vec())
    }

    #[test]
    fn scenario_a_shorter_than_interval() {
        let (path, distances) = straight(&[0.0, 0.001]);
        let points = interpolate(&path, &distances, &[10, 20], 100.0).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn zero_length_path() {
        let (path, distances) = straight(&[1.0, 1.0]);
        let points = interpolate(&path, &distances, &[10, 20], 100.0).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn means_of_bracketing_samples() {
        let (path, distances) = straight(&[0.0, 1.0, 2.0]);
        let points = interpolate(&path, &distances, &[10, 30, 20], 0.5).unwrap();

        let distances: Vec<f64> = points.iter().map(|p| p.distance).collect();
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(distances, vec![0.0, 0.5, 1.0, 1.5]);
        // 1.0 sits on the shared vertex and takes the earlier pair
        assert_eq!(values, vec![20.0, 20.0, 20.0, 25.0]);
        assert_eq!(points[3].coord, Coord { x: 1.5, y: 0.0 });
    }

    #[test]
    fn scenario_c_zero_bracket_dropped() {
        let (path, distances) = straight(&[0.0, 1.0, 2.0]);
        let points = interpolate(&path, &distances, &[10, 0, 20], 0.5).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn only_zero_pairs_dropped() {
        let (path, distances) = straight(&[0.0, 1.0, 2.0, 3.0]);
        let points = interpolate(&path, &distances, &[10, 0, 20, 40], 0.5).unwrap();
        let distances: Vec<f64> = points.iter().map(|p| p.distance).collect();
        // 2.0 sits on a shared vertex and takes the earlier pair, which has a zero
        assert_eq!(distances, vec![2.5]);
        assert_eq!(points[0].value, 30.0);
    }

    #[test]
    fn distances_are_increasing_multiples_below_length() {
        let (path, distances) = straight(&[0.0, 1.0, 2.5, 4.0]);
        let points = interpolate(&path, &distances, &[5, 7, 9, 11], 0.5).unwrap();
        assert_eq!(points.len(), 8);
        for (k, p) in points.iter().enumerate() {
            assert_eq!(p.distance, k as f64 * 0.5);
            assert!(p.distance < path.length());
            assert_ne!(p.value, 0.0);
        }
    }

    #[test]
    fn partial_last_interval() {
        let (path, distances) = straight(&[0.0, 150.0]);
        let points = interpolate(&path, &distances, &[10, 20], 100.0).unwrap();
        let distances: Vec<f64> = points.iter().map(|p| p.distance).collect();
        assert_eq!(distances, vec![0.0, 100.0]);
        assert!(points.iter().all(|p| p.value == 15.0));
    }

    #[test]
    fn no_bracket_dropped() {
        // samples only cover the first half of the path
        let path = Path::new(
            vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 4.0, y: 0.0 }],
            DistanceMetric::Degrees,
        );
        let points = interpolate(&path, &[0.0, 2.0], &[10, 20], 1.0).unwrap();
        let distances: Vec<f64> = points.iter().map(|p| p.distance).collect();
        assert_eq!(distances, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn rejects_bad_interval() {
        let (path, distances) = straight(&[0.0, 1.0]);
        assert!(interpolate(&path, &distances, &[1, 2], 0.0).is_err());
        assert!(interpolate(&path, &distances, &[1, 2], -1.0).is_err());
        assert!(interpolate(&path, &distances, &[1, 2], f64::NAN).is_err());
        assert!(interpolate(&path, &distances, &[1, 2], f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let (path, distances) = straight(&[0.0, 1.0]);
        assert!(interpolate(&path, &distances, &[1], 1.0).is_err());
    }
}
