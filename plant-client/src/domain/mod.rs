pub mod bounding_box;
pub mod plant_record;

pub use bounding_box::{BoundingBox, BoundingBoxError};
pub use plant_record::PlantRecord;
