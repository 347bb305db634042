pub mod insights;
pub mod prediction;

pub use insights::InsightService;
pub use prediction::PredictionService;
