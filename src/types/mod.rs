pub mod bucket;
pub mod sample;
