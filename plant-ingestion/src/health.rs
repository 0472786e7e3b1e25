use std::{collections::HashSet, fmt};

use plant_client::PlantRecord;

use crate::pipeline::Envelope;

/// How many duplicate ids are named in diagnostics.
const DUPLICATE_SAMPLE: usize = 5;

/// Outcome of the post-ingestion health checks.
///
/// Both checks are always evaluated; the report never repairs data.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub record_count: usize,
    pub total_generation: f64,
    pub total_percentage: f64,
    /// Records whose id repeats an earlier record's id (occurrences, not groups).
    pub duplicate_ids: usize,
    /// First few repeated ids with the source line of the repeat.
    pub duplicate_samples: Vec<(i64, usize)>,
}

/// Run the total-percentage and id-uniqueness checks over the annotated dataset.
pub fn check(records: &[Envelope<PlantRecord>]) -> HealthReport {
    let mut seen = HashSet::with_capacity(records.len());
    let mut duplicate_ids = 0;
    let mut duplicate_samples = Vec::new();
    let mut total_generation = 0.0;
    let mut total_percentage = 0.0;

    for env in records {
        let r = &env.payload;
        total_generation += r.annual_net_generation;
        total_percentage += r.annual_net_generation_percentage;

        if !seen.insert(r.plant_id) {
            duplicate_ids += 1;
            if duplicate_samples.len() < DUPLICATE_SAMPLE {
                duplicate_samples.push((r.plant_id, env.row));
            }
        }
    }

    HealthReport {
        record_count: records.len(),
        total_generation,
        total_percentage,
        duplicate_ids,
        duplicate_samples,
    }
}

impl HealthReport {
    /// Half-way cases round to even.
    pub fn rounded_total_percentage(&self) -> f64 {
        self.total_percentage.round_ties_even()
    }

    pub fn total_percentage_ok(&self) -> bool {
        self.rounded_total_percentage() == 100.0
    }

    pub fn ids_unique(&self) -> bool {
        self.duplicate_ids == 0
    }

    pub fn passed(&self) -> bool {
        self.total_percentage_ok() && self.ids_unique()
    }

    /// Shares cannot be computed when nothing was generated in total.
    pub fn percentages_undefined(&self) -> bool {
        self.total_generation == 0.0 || !self.total_percentage.is_finite()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        let mut out = Vec::new();

        if self.percentages_undefined() {
            out.push(format!(
                "total annual net generation is {} over {} records; percentages are undefined",
                self.total_generation, self.record_count
            ));
        } else if !self.total_percentage_ok() {
            out.push(format!(
                "total annual net generation percentage is {}, expected 100",
                self.rounded_total_percentage()
            ));
        }

        if !self.ids_unique() {
            let sample = self
                .duplicate_samples
                .iter()
                .map(|(id, row)| format!("{id} (line {row})"))
                .collect::<Vec<_>>()
                .join(", ");
            out.push(format!(
                "{} duplicate plant_id value(s), they should be unique; e.g. {sample}",
                self.duplicate_ids
            ));
        }

        out
    }

    pub fn log(&self) {
        tracing::info!(records = self.record_count, "health checks");

        if self.total_percentage_ok() {
            tracing::info!(total_percentage = self.rounded_total_percentage(), "total percentage - OK");
        }
        if self.ids_unique() {
            tracing::info!(duplicates = 0, "duplicates in plant_id - OK");
        }
        for d in self.diagnostics() {
            tracing::warn!("{d}");
        }

        if self.passed() {
            tracing::info!("health checks passed");
        }
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            write!(
                f,
                "{} records, total percentage {}, no duplicate ids",
                self.record_count,
                self.rounded_total_percentage()
            )
        } else {
            write!(f, "{}", self.diagnostics().join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(plant_id: i64, generation: f64, percentage: f64, row: usize) -> Envelope<PlantRecord> {
        Envelope {
            payload: PlantRecord {
                plant_id,
                plant_name: String::new(),
                state: "AZ".to_string(),
                latitude: 0.0,
                longitude: 0.0,
                annual_net_generation: generation,
                annual_net_generation_percentage: percentage,
            },
            row,
        }
    }

    #[test]
    fn valid_dataset_passes() {
        let report = check(&[
            record(1, 100.0, 10.0, 3),
            record(2, 200.0, 20.0, 4),
            record(3, 700.0, 70.0, 5),
        ]);

        assert!(report.passed());
        assert_eq!(report.rounded_total_percentage(), 100.0);
        assert!(report.diagnostics().is_empty());
    }

    #[test]
    fn shared_id_counts_one_duplicate() {
        let report = check(&[record(42, 1.0, 50.0, 3), record(42, 1.0, 50.0, 4)]);

        assert!(!report.passed());
        assert!(report.total_percentage_ok());
        assert_eq!(report.duplicate_ids, 1);
        assert_eq!(report.duplicate_samples, vec![(42, 4)]);
    }

    #[test]
    fn duplicates_count_occurrences_not_groups() {
        let report = check(&[
            record(1, 1.0, 20.0, 3),
            record(1, 1.0, 20.0, 4),
            record(1, 1.0, 20.0, 5),
            record(2, 1.0, 20.0, 6),
            record(2, 1.0, 20.0, 7),
        ]);
        assert_eq!(report.duplicate_ids, 3);
    }

    #[test]
    fn both_checks_are_reported_together() {
        let report = check(&[record(7, 1.0, 40.0, 3), record(7, 1.0, 40.0, 4)]);

        assert!(!report.total_percentage_ok());
        assert!(!report.ids_unique());
        let diagnostics = report.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[0].contains("80"));
        assert!(diagnostics[1].contains("7 (line 4)"));
    }

    #[test]
    fn total_within_half_a_percent_rounds_to_100() {
        assert!(check(&[record(1, 1.0, 100.4, 3)]).passed());
        assert!(!check(&[record(1, 1.0, 100.6, 3)]).passed());
    }

    #[test]
    fn nan_shares_are_undefined_and_fail() {
        let report = check(&[record(1, 0.0, f64::NAN, 3)]);
        assert!(report.percentages_undefined());
        assert!(!report.passed());
        assert!(report.to_string().contains("undefined"));
    }

    #[test]
    fn empty_dataset_is_undefined() {
        let report = check(&[]);
        assert!(report.percentages_undefined());
        assert!(!report.passed());
    }
}
