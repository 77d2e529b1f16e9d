pub mod config;
pub mod coverage;
pub mod error;
pub mod geo;
pub mod io;
pub mod physics;
pub mod terrain;


pub use crate::config::LosConfig;
pub use crate::coverage::{AntennaGrid, LosEngine, ResultMap};
pub use crate::error::LosError;
