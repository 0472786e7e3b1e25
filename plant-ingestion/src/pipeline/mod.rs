use std::pin::Pin;

use futures::{stream, Stream, TryStreamExt};
use plant_client::PlantRecord;

use crate::health::{self, HealthReport};
use crate::sources::PlantRow;

/// A payload plus the 1-based line of the source sheet it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub payload: T,
    pub row: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("schema mismatch: missing column(s) {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },
    #[error("source error: {0}")]
    Source(String),
    #[error("validation failure: {0}")]
    Validation(Box<HealthReport>),
    #[error("sink error: {0}")]
    Sink(String),
}

/// What to do when the post-ingestion health check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Abort the ingestion run.
    Enforce,
    /// Log a warning and persist anyway.
    Warn,
}

impl ValidationPolicy {
    pub fn from_ignore_flag(ignore_validation_failure: bool) -> Self {
        if ignore_validation_failure {
            Self::Warn
        } else {
            Self::Enforce
        }
    }
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

/// Batch-level transform. Unlike a per-record map it sees the whole dataset,
/// which dataset-wide aggregates need.
#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Vec<Envelope<I>>) -> Result<Vec<Envelope<O>>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    /// Consume the stream and return the number of records persisted.
    async fn run<S>(&self, input: S) -> Result<u64, PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

#[derive(Debug, Clone)]
pub struct IngestionSummary {
    pub report: HealthReport,
    pub persisted: u64,
}

/// Read every row, annotate it, and run the health check. Nothing is persisted.
pub async fn prepare<S, T>(
    source: &S,
    transform: &T,
) -> Result<(Vec<Envelope<PlantRecord>>, HealthReport), PipelineError>
where
    S: Source<PlantRow>,
    T: Transform<PlantRow, PlantRecord>,
{
    tracing::info!("reading and normalizing source rows");
    let rows: Vec<Envelope<PlantRow>> = source.stream().await.try_collect().await?;
    tracing::info!(rows = rows.len(), "reading and normalizing source rows - done");

    tracing::info!("calculating annual net generation percentages");
    let records = transform.apply(rows).await?;
    tracing::info!("calculating annual net generation percentages - done");

    let report = health::check(&records);
    report.log();

    Ok((records, report))
}

pub struct Pipeline<S, T, K> {
    pub source: S,
    pub transform: T,
    pub sink: K,
    pub policy: ValidationPolicy,
}

impl<S, T, K> Pipeline<S, T, K>
where
    S: Source<PlantRow> + 'static,
    T: Transform<PlantRow, PlantRecord> + 'static,
    K: Sink<PlantRecord> + 'static,
{
    /// One full ingestion run: load, annotate, validate, then replace the store contents.
    pub async fn run(self) -> Result<IngestionSummary, PipelineError> {
        let (records, report) = prepare(&self.source, &self.transform).await?;

        if !report.passed() {
            metrics::counter!("plant_health_check_failures_total").increment(1);

            // NaN percentages cannot be stored, so this one is never waived.
            if report.percentages_undefined() || self.policy == ValidationPolicy::Enforce {
                return Err(PipelineError::Validation(Box::new(report)));
            }

            tracing::warn!(
                report = %report,
                "health checks failed; continuing because validation failures are ignored"
            );
        }

        let persisted = self
            .sink
            .run(stream::iter(records.into_iter().map(Ok)))
            .await?;
        tracing::info!(persisted, "ingestion run complete");

        Ok(IngestionSummary { report, persisted })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    };

    use futures::StreamExt;

    use super::*;
    use crate::transform::PercentageCalculator;

    struct VecSource(Vec<PlantRow>);

    #[async_trait::async_trait]
    impl Source<PlantRow> for VecSource {
        async fn stream(&self) -> EnvelopeStream<PlantRow> {
            let items: Vec<_> = self
                .0
                .iter()
                .cloned()
                .enumerate()
                .map(|(i, payload)| Ok(Envelope { payload, row: i + 3 }))
                .collect();
            Box::pin(stream::iter(items))
        }
    }

    #[derive(Clone, Default)]
    struct CountingSink(Arc<AtomicU64>);

    #[async_trait::async_trait]
    impl Sink<PlantRecord> for CountingSink {
        async fn run<St>(&self, mut input: St) -> Result<u64, PipelineError>
        where
            St: Stream<Item = Result<Envelope<PlantRecord>, PipelineError>> + Send + Unpin + 'static,
        {
            let mut n = 0;
            while let Some(item) = input.next().await {
                item?;
                n += 1;
            }
            self.0.store(n, Ordering::SeqCst);
            Ok(n)
        }
    }

    fn row(plant_id: i64, generation: f64) -> PlantRow {
        PlantRow {
            plant_id,
            plant_name: format!("plant-{plant_id}"),
            state: "AZ".to_string(),
            latitude: 33.0,
            longitude: -112.0,
            annual_net_generation: generation,
        }
    }

    fn pipeline(rows: Vec<PlantRow>, policy: ValidationPolicy) -> (Pipeline<VecSource, PercentageCalculator, CountingSink>, Arc<AtomicU64>) {
        let sink = CountingSink::default();
        let written = sink.0.clone();
        (
            Pipeline {
                source: VecSource(rows),
                transform: PercentageCalculator,
                sink,
                policy,
            },
            written,
        )
    }

    #[tokio::test]
    async fn valid_dataset_is_persisted() {
        let (p, written) = pipeline(
            vec![row(1, 100.0), row(2, 200.0), row(3, 700.0)],
            ValidationPolicy::Enforce,
        );

        let summary = p.run().await.unwrap();
        assert!(summary.report.passed());
        assert_eq!(summary.persisted, 3);
        assert_eq!(written.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn duplicates_abort_when_enforced() {
        let (p, written) = pipeline(vec![row(42, 1.0), row(42, 1.0)], ValidationPolicy::Enforce);

        let err = p.run().await.unwrap_err();
        match err {
            PipelineError::Validation(report) => assert_eq!(report.duplicate_ids, 1),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(written.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicates_are_persisted_when_ignored() {
        let (p, written) = pipeline(vec![row(42, 1.0), row(42, 1.0)], ValidationPolicy::Warn);

        let summary = p.run().await.unwrap();
        assert!(!summary.report.passed());
        assert_eq!(written.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_total_generation_is_fatal_even_when_ignored() {
        let (p, written) = pipeline(vec![row(1, 0.0), row(2, 0.0)], ValidationPolicy::Warn);

        let err = p.run().await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(written.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn prepare_does_not_touch_the_sink() {
        let source = VecSource(vec![row(1, 5.0), row(2, 15.0)]);
        let (records, report) = prepare(&source, &PercentageCalculator).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row, 3);
        assert!(report.passed());
    }

    #[test]
    fn policy_follows_ignore_flag() {
        assert_eq!(ValidationPolicy::from_ignore_flag(true), ValidationPolicy::Warn);
        assert_eq!(ValidationPolicy::from_ignore_flag(false), ValidationPolicy::Enforce);
    }

    #[test]
    fn schema_mismatch_lists_every_missing_column() {
        let err = PipelineError::SchemaMismatch {
            missing: vec!["Plant name".to_string(), "Plant latitude".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "schema mismatch: missing column(s) Plant name, Plant latitude"
        );
    }
}
