use serde::Serialize;

/// Validated engine inputs. The rate table and indexation rate are passed to
/// the engine separately so table epochs can be swapped without touching the
/// borrower's figures.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub current_debt: f64,
    pub annual_income: f64,
    /// Expected annual salary increase in percent.
    pub salary_growth_rate: f64,
    pub voluntary_payment: Option<VoluntaryPayment>,
}

/// One-off extra repayment applied at the start of the given projection year
/// (1-based), before that year's indexation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoluntaryPayment {
    pub year: u32,
    pub amount: f64,
}

/// One row of the projection ledger, recorded after the year's indexation and
/// repayments have been applied.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRecord {
    pub year: u32,
    pub remaining_debt: f64,
    pub annual_repayment: f64,
    pub income: f64,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MilestoneKind {
    Start,
    Progress,
    PaymentEvent,
    Payoff,
    HorizonReached,
}

/// A notable event on the repayment timeline. Milestones are emitted in
/// non-decreasing year order; within a year a payment event precedes any
/// progress milestone computed from the post-payment balance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub year: u32,
    pub description: String,
    pub kind: MilestoneKind,
    pub debt_value_at_event: f64,
}

/// Complete projection output. Fully derived from the inputs; owned by the
/// caller once returned.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub initial_repayment_rate: f64,
    pub initial_annual_repayment: f64,
    pub initial_weekly_repayment: f64,
    pub years_to_repay: u32,
    pub projected_balance_next_period: f64,
    pub total_indexation_accrued: f64,
    pub total_repaid: f64,
    pub yearly_records: Vec<YearlyRecord>,
    pub milestones: Vec<Milestone>,
}
