pub mod plant_queries;

pub use plant_queries::{count, get_by_id, get_by_state, get_in_area, insert_all, replace_all, reset};
