mod engine;
mod types;

pub use engine::{project, project_with_rounding, round_half_up};
pub use types::{ContributionFrequency, ProjectionInput, RoundingPolicy, YearSnapshot};
