pub mod los;
pub mod paths;
pub mod sector;
