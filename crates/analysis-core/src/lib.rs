pub mod error;
pub mod scoring;
pub mod traits;
pub mod types;

pub use error::*;
pub use scoring::{recommendation_for_score, score_stock, ScoreBreakdown};
pub use traits::*;
pub use types::*;
