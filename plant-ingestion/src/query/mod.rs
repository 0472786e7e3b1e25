use plant_client::{db::plant_queries, domain::BoundingBoxError, BoundingBox, PlantRecord};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Result list plus its length and the echoed query parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse<P> {
    pub results: Vec<PlantRecord>,
    pub total_count: usize,
    #[serde(flatten)]
    pub params: P,
}

impl<P> QueryResponse<P> {
    fn new(results: Vec<PlantRecord>, params: P) -> Self {
        Self {
            total_count: results.len(),
            results,
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateQuery {
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdQuery {
    pub plant_id: i64,
}

/// Centre point and half side length, in degrees, of a bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    #[error("invalid area query: {0}")]
    InvalidArea(#[from] BoundingBoxError),
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Read-side facade over the plant store.
#[derive(Clone)]
pub struct PlantQueryService {
    pool: SqlitePool,
}

impl PlantQueryService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The state code is matched exactly as given.
    pub async fn by_state(&self, params: StateQuery) -> Result<QueryResponse<StateQuery>, QueryError> {
        metrics::counter!("plant_queries_total", "kind" => "state").increment(1);
        let results = plant_queries::get_by_state(&self.pool, &params.state).await?;
        Ok(QueryResponse::new(results, params))
    }

    pub async fn by_id(&self, params: IdQuery) -> Result<QueryResponse<IdQuery>, QueryError> {
        metrics::counter!("plant_queries_total", "kind" => "id").increment(1);
        let results = plant_queries::get_by_id(&self.pool, params.plant_id)
            .await?
            .into_iter()
            .collect();
        Ok(QueryResponse::new(results, params))
    }

    /// `radius` is the half side of a lat/lon box, not a circular distance.
    pub async fn in_area(&self, params: AreaQuery) -> Result<QueryResponse<AreaQuery>, QueryError> {
        metrics::counter!("plant_queries_total", "kind" => "area").increment(1);
        let bbox = BoundingBox::around(params.latitude, params.longitude, params.radius)?;
        let results = plant_queries::get_in_area(&self.pool, &bbox).await?;
        Ok(QueryResponse::new(results, params))
    }

    pub async fn record_count(&self) -> Result<i64, QueryError> {
        Ok(plant_queries::count(&self.pool).await?)
    }
}
