//! Bulk-loads speed records from a CSV file.

use std::{io::Read, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;
use sqlx::PgPool;

use crate::{model::SpeedRecord, store};

#[derive(Debug, Deserialize)]
struct CsvRecord {
    latitude: f64,
    longitude: f64,
    current_speed: i32,
    road_speed_limit: i32,
    timestamp: DateTime<Utc>,
}

impl From<CsvRecord> for SpeedRecord {
    fn from(value: CsvRecord) -> Self {
        SpeedRecord {
            latitude: value.latitude,
            longitude: value.longitude,
            current_speed: value.current_speed,
            road_speed_limit: value.road_speed_limit,
            timestamp: Some(value.timestamp),
        }
    }
}

fn parse(reader: impl Read) -> Result<Vec<SpeedRecord>> {
    let mut output = Vec::new();
    let mut reader = csv::Reader::from_reader(reader);
    for (i, result) in reader.deserialize().enumerate() {
        let record: CsvRecord =
            result.with_context(|| format!("Failed to parse row {}", i + 1))?;
        output.push(record.into());
    }

    Ok(output)
}

pub async fn run(pool: PgPool, path: &Path) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let records = parse(file)?;

    let mut tx = pool.begin().await?;
    for record in &records {
        store::insert(&mut *tx, record).await?;
    }
    tx.commit().await?;

    info!("imported {} speed records", records.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_rows() {
        let data = "\
latitude,longitude,current_speed,road_speed_limit,timestamp
52.5200,13.4050,62,50,2024-08-01T10:00:00Z
52.5201,13.4051,40,50,2024-08-01T10:00:05Z
";
        let records = parse(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].speed_difference(), 12);
        assert_eq!(records[1].speed_difference(), 0);
        assert_eq!(
            records[1].timestamp,
            Some(Utc.with_ymd_and_hms(2024, 8, 1, 10, 0, 5).unwrap())
        );
    }

    #[test]
    fn reports_bad_row() {
        let data = "\
latitude,longitude,current_speed,road_speed_limit,timestamp
52.5200,13.4050,fast,50,2024-08-01T10:00:00Z
";
        let err = parse(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }
}
