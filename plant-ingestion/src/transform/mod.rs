use crate::pipeline::{Envelope, PipelineError, Transform};
use crate::sources::PlantRow;
use plant_client::PlantRecord;

/// Annotate every row with its share of the dataset-wide annual net generation.
///
/// `percentage = 100 * annual_net_generation / Σ annual_net_generation`.
/// A zero total yields NaN shares; the health check is what rejects that.
pub fn annotate_percentages(rows: Vec<Envelope<PlantRow>>) -> Vec<Envelope<PlantRecord>> {
    let total: f64 = rows.iter().map(|env| env.payload.annual_net_generation).sum();

    rows.into_iter()
        .map(|env| {
            let p = env.payload;
            Envelope {
                payload: PlantRecord {
                    annual_net_generation_percentage: p.annual_net_generation * 100.0 / total,
                    plant_id: p.plant_id,
                    plant_name: p.plant_name,
                    state: p.state,
                    latitude: p.latitude,
                    longitude: p.longitude,
                    annual_net_generation: p.annual_net_generation,
                },
                row: env.row,
            }
        })
        .collect()
}

#[derive(Clone, Copy, Default)]
pub struct PercentageCalculator;

#[async_trait::async_trait]
impl Transform<PlantRow, PlantRecord> for PercentageCalculator {
    async fn apply(
        &self,
        input: Vec<Envelope<PlantRow>>,
    ) -> Result<Vec<Envelope<PlantRecord>>, PipelineError> {
        Ok(annotate_percentages(input))
    }
}
