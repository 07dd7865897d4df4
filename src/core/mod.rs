mod engine;
mod rates;
mod types;

pub use engine::{PROJECTION_HORIZON_YEARS, project};
pub use rates::{RateTable, RateTableError, RepaymentThreshold, TableEpoch};
pub use types::{
    Inputs, Milestone, MilestoneKind, SimulationResult, VoluntaryPayment, YearlyRecord,
};
