use std::collections::HashMap;

use serde::Serialize;

use super::interpolate::ResamplePoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregatedPoint {
    pub x: f64,
    pub y: f64,
    pub mean_deviation: f64,
}

struct Group {
    x: f64,
    y: f64,
    sum: f64,
    count: u32,
}

/// Merges resample points that landed on exactly the same coordinate,
/// averaging their non-zero values. Coordinates keep the order in which they
/// were first seen; coordinates with nothing but zeros are dropped.
pub fn aggregate(points: impl IntoIterator<Item = ResamplePoint>) -> Vec<AggregatedPoint> {
    let mut index: HashMap<(u64, u64), usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for point in points {
        let i = *index.entry(key(point.coord.x, point.coord.y)).or_insert_with(|| {
            groups.push(Group {
                x: point.coord.x,
                y: point.coord.y,
                sum: 0.0,
                count: 0,
            });
            groups.len() - 1
        });

        if point.value != 0.0 {
            groups[i].sum += point.value;
            groups[i].count += 1;
        }
    }

    groups
        .into_iter()
        .filter(|g| g.count > 0)
        .map(|g| AggregatedPoint {
            x: g.x,
            y: g.y,
            mean_deviation: g.sum / g.count as f64,
        })
        .collect()
}

fn key(x: f64, y: f64) -> (u64, u64) {
    // adding zero turns -0.0 into 0.0 so both share a key
    ((x + 0.0).to_bits(), (y + 0.0).to_bits())
}
