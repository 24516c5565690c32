//! Speed records kept in PostgreSQL.

use futures::TryStreamExt;
use sqlx::{query, query_as, PgExecutor, PgPool};

use crate::model::{Sample, SpeedRecord};

pub async fn insert<'e>(
    executor: impl PgExecutor<'e>,
    record: &SpeedRecord,
) -> sqlx::Result<()> {
    query(
        "insert into speed_record (latitude, longitude, current_speed, road_speed_limit, speed_difference, timestamp) \
         values ($1, $2, $3, $4, $5, coalesce($6, now()))",
    )
    .bind(record.latitude)
    .bind(record.longitude)
    .bind(record.current_speed)
    .bind(record.road_speed_limit)
    .bind(record.speed_difference())
    .bind(record.timestamp)
    .execute(executor)
    .await?;

    Ok(())
}

/// Every stored sample, oldest first.
pub async fn samples(pool: &PgPool) -> sqlx::Result<Vec<Sample>> {
    query_as::<_, Sample>(
        "select latitude, longitude, speed_difference, timestamp from speed_record order by timestamp, id",
    )
    .fetch(pool)
    .try_collect()
    .await
}
