/// One power plant after normalization, annotated with its share of the
/// dataset-wide annual net generation.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlantRecord {
    pub plant_id: i64,
    pub plant_name: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub annual_net_generation: f64,
    pub annual_net_generation_percentage: f64,
}
