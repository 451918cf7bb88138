pub mod algo;
pub mod data;
pub mod model;
pub mod problem;
