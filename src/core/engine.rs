use super::rates::RateTable;
use super::types::{Inputs, Milestone, MilestoneKind, SimulationResult, YearlyRecord};

/// Hard stop for the projection loop. A repayment rate that never outpaces
/// indexation would otherwise loop forever.
pub const PROJECTION_HORIZON_YEARS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressMark {
    QuarterRepaid,
    HalfRepaid,
    ThreeQuartersRepaid,
}

struct ProgressCheck {
    mark: ProgressMark,
    remaining_fraction: f64,
    description: &'static str,
}

/// Checked in this fixed order every year; each fires at most once.
const PROGRESS_CHECKS: [ProgressCheck; 3] = [
    ProgressCheck {
        mark: ProgressMark::QuarterRepaid,
        remaining_fraction: 0.75,
        description: "25% of debt repaid",
    },
    ProgressCheck {
        mark: ProgressMark::HalfRepaid,
        remaining_fraction: 0.50,
        description: "50% of debt repaid",
    },
    ProgressCheck {
        mark: ProgressMark::ThreeQuartersRepaid,
        remaining_fraction: 0.25,
        description: "75% of debt repaid",
    },
];

/// Set of progress marks that have already fired, indexed by the mark enum.
#[derive(Debug, Default)]
struct FiredMarks(u8);

impl FiredMarks {
    fn contains(&self, mark: ProgressMark) -> bool {
        self.0 & (1 << mark as u8) != 0
    }

    fn insert(&mut self, mark: ProgressMark) {
        self.0 |= 1 << mark as u8;
    }
}

/// Project year-by-year repayment of the debt until payoff or the horizon.
///
/// Inputs are assumed validated (non-negative amounts, voluntary payment year
/// and amount paired); the balance is still clamped at zero so the ledger
/// never goes negative. Within a year, indexation accrues on the opening
/// balance before the year's repayments are subtracted, and a voluntary
/// payment joins that same subtraction. This ordering is part of the
/// contract; callers rely on numerical parity with it.
pub fn project(inputs: &Inputs, table: &RateTable, indexation_rate: f64) -> SimulationResult {
    let initial_debt = inputs.current_debt;
    let mut remaining_debt = initial_debt;
    let mut current_income = inputs.annual_income;
    let mut year: u32 = 0;
    let mut total_indexation = 0.0;
    let mut total_repaid = 0.0;

    let initial_repayment_rate = table.resolve_rate(current_income);
    let initial_annual_repayment = current_income * initial_repayment_rate / 100.0;

    let mut yearly_records = Vec::new();
    let mut milestones = vec![Milestone {
        year: 0,
        description: "Starting HECS-HELP debt".to_string(),
        kind: MilestoneKind::Start,
        debt_value_at_event: initial_debt,
    }];
    let mut fired = FiredMarks::default();

    while remaining_debt > 0.0 && year < PROJECTION_HORIZON_YEARS {
        let rate = table.resolve_rate(current_income);
        let yearly_repayment = current_income * rate / 100.0;
        let yearly_indexation = remaining_debt * indexation_rate / 100.0;

        let mut total_yearly_repayment = yearly_repayment;
        if let Some(voluntary) = inputs.voluntary_payment {
            // The voluntary payment lands at the start of its year, before
            // that year's indexation.
            if year + 1 == voluntary.year {
                total_yearly_repayment += voluntary.amount;
                milestones.push(Milestone {
                    year: year + 1,
                    description: "Voluntary payment applied".to_string(),
                    kind: MilestoneKind::PaymentEvent,
                    debt_value_at_event: (remaining_debt - total_yearly_repayment).max(0.0),
                });
            }
        }

        total_indexation += yearly_indexation;
        total_repaid += total_yearly_repayment;

        remaining_debt = (remaining_debt + yearly_indexation - total_yearly_repayment).max(0.0);

        yearly_records.push(YearlyRecord {
            year: year + 1,
            remaining_debt,
            annual_repayment: total_yearly_repayment,
            income: current_income,
        });

        current_income *= 1.0 + inputs.salary_growth_rate / 100.0;
        year += 1;

        for check in &PROGRESS_CHECKS {
            if !fired.contains(check.mark)
                && remaining_debt <= initial_debt * check.remaining_fraction
            {
                fired.insert(check.mark);
                milestones.push(Milestone {
                    year,
                    description: check.description.to_string(),
                    kind: MilestoneKind::Progress,
                    debt_value_at_event: remaining_debt,
                });
            }
        }
    }

    if remaining_debt > 0.0 {
        milestones.push(Milestone {
            year: PROJECTION_HORIZON_YEARS,
            description: "Projection limit reached - debt not fully repaid".to_string(),
            kind: MilestoneKind::HorizonReached,
            debt_value_at_event: remaining_debt,
        });
    } else if year > 0 {
        // A debt that starts at zero records only the start milestone.
        milestones.push(Milestone {
            year,
            description: "Debt fully repaid".to_string(),
            kind: MilestoneKind::Payoff,
            debt_value_at_event: 0.0,
        });
    }

    SimulationResult {
        initial_repayment_rate,
        initial_annual_repayment,
        initial_weekly_repayment: initial_annual_repayment / 52.0,
        years_to_repay: year,
        projected_balance_next_period: initial_debt * (1.0 + indexation_rate / 100.0),
        total_indexation_accrued: total_indexation,
        total_repaid,
        yearly_records,
        milestones,
    }
}
