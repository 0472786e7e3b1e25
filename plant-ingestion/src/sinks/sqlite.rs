use futures::StreamExt;
use plant_client::{db::plant_queries, PlantRecord};
use sqlx::SqlitePool;

use crate::pipeline::{Envelope, PipelineError, Sink};

/// Replaces the `power_plants` table with the incoming records.
///
/// The whole stream is collected first, then the drop, recreate and insert
/// run in one transaction: a failed run leaves the previous load in place.
pub struct SqlitePlantSink {
    pool: SqlitePool,
    /// Rows per multi-row `INSERT` statement.
    batch_size: usize,
}

impl SqlitePlantSink {
    pub fn new(pool: SqlitePool, batch_size: usize) -> Self {
        Self {
            pool,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait::async_trait]
impl Sink<PlantRecord> for SqlitePlantSink {
    async fn run<S>(&self, mut input: S) -> Result<u64, PipelineError>
    where
        S: futures::Stream<Item = Result<Envelope<PlantRecord>, PipelineError>> + Send + Unpin + 'static,
    {
        let mut buffer: Vec<PlantRecord> = Vec::new();
        while let Some(item) = input.next().await {
            buffer.push(item?.payload);
        }

        match plant_queries::replace_all(&self.pool, &buffer, self.batch_size).await {
            Ok(written) => {
                metrics::counter!("plant_store_inserted_records_total").increment(written);
                tracing::debug!(written, batch_size = self.batch_size, "replaced power_plants");
                Ok(written)
            }
            Err(e) => {
                tracing::error!(error = %e, "plant store replace failed");
                Err(PipelineError::Sink(format!("failed to replace power_plants: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    fn record(i: i64, n: i64) -> PlantRecord {
        PlantRecord {
            plant_id: i,
            plant_name: format!("p{i}"),
            state: "WY".to_string(),
            latitude: 43.0,
            longitude: -107.0,
            annual_net_generation: 1.0,
            annual_net_generation_percentage: 100.0 / n as f64,
        }
    }

    fn envelopes(n: i64) -> Vec<Result<Envelope<PlantRecord>, PipelineError>> {
        (0..n)
            .map(|i| {
                Ok(Envelope {
                    payload: record(i, n),
                    row: i as usize + 3,
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn writes_partial_last_batch() {
        let pool = memory_pool().await;
        let sink = SqlitePlantSink::new(pool.clone(), 3);

        let written = sink.run(stream::iter(envelopes(7))).await.unwrap();
        assert_eq!(written, 7);
        assert_eq!(plant_queries::count(&pool).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn rerun_replaces_previous_contents() {
        let pool = memory_pool().await;
        let sink = SqlitePlantSink::new(pool.clone(), 500);

        sink.run(stream::iter(envelopes(5))).await.unwrap();
        sink.run(stream::iter(envelopes(2))).await.unwrap();
        assert_eq!(plant_queries::count(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn upstream_error_aborts_the_load() {
        let pool = memory_pool().await;
        let sink = SqlitePlantSink::new(pool.clone(), 500);
        sink.run(stream::iter(envelopes(5))).await.unwrap();

        let mut items = envelopes(2);
        items.push(Err(PipelineError::Source("boom".to_string())));
        let res = sink.run(stream::iter(items)).await;
        assert!(matches!(res, Err(PipelineError::Source(_))));
        assert_eq!(plant_queries::count(&pool).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn failed_insert_in_a_later_batch_keeps_previous_contents() {
        let pool = memory_pool().await;
        let sink = SqlitePlantSink::new(pool.clone(), 1);
        sink.run(stream::iter(envelopes(5))).await.unwrap();

        let mut bad = record(99, 2);
        bad.latitude = f64::NAN;
        let items = vec![
            Ok(Envelope { payload: record(98, 2), row: 3 }),
            Ok(Envelope { payload: bad, row: 4 }),
        ];
        let res = sink.run(stream::iter(items)).await;

        assert!(matches!(res, Err(PipelineError::Sink(_))));
        assert_eq!(plant_queries::count(&pool).await.unwrap(), 5);
        assert_eq!(plant_queries::get_by_id(&pool, 98).await.unwrap(), None);
    }

    #[tokio::test]
    async fn zero_batch_size_is_clamped() {
        let pool = memory_pool().await;
        let sink = SqlitePlantSink::new(pool.clone(), 0);
        assert_eq!(sink.run(stream::iter(envelopes(2))).await.unwrap(), 2);
    }
}
