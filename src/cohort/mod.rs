mod aggregate;
mod collect;
mod record;
mod roster;
mod source;

pub use aggregate::{EntitySummary, default_workers};
pub use collect::{Cohort, CohortInput, collect_cohort};
pub use roster::{GroupLabel, RosterMetrics};
