use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One band of a progressive repayment schedule. The band covers incomes in
/// `[min_income, max_income)`; the terminal band is unbounded
/// (`max_income == f64::INFINITY`). Rates are percentages of income.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepaymentThreshold {
    pub min_income: f64,
    pub max_income: f64,
    pub rate: f64,
}

impl RepaymentThreshold {
    pub const fn new(min_income: f64, max_income: f64, rate: f64) -> Self {
        Self {
            min_income,
            max_income,
            rate,
        }
    }
}

/// A malformed schedule is a configuration defect and is rejected when the
/// table is built, never at lookup time.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RateTableError {
    #[error("rate table has no thresholds")]
    Empty,
    #[error("threshold starting at {min_income} does not end above its start ({max_income})")]
    NotAscending { min_income: f64, max_income: f64 },
    #[error("threshold starting at {found} leaves a gap or overlap after {expected}")]
    Discontinuity { expected: f64, found: f64 },
    #[error("terminal threshold must be unbounded, found upper bound {0}")]
    BoundedTerminal(f64),
    #[error("repayment rate {0} is outside 0..=100 percent")]
    RateOutOfRange(f64),
}

/// Ordered, contiguous repayment schedule. Incomes below the first band
/// resolve to a nil rate; the table itself may therefore start above zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    thresholds: Vec<RepaymentThreshold>,
}

impl RateTable {
    /// Build a table, validating shape up front: ascending bands, no gaps or
    /// overlaps, rates in percent range, unbounded terminal band.
    pub fn new(thresholds: Vec<RepaymentThreshold>) -> Result<Self, RateTableError> {
        let Some(last) = thresholds.last() else {
            return Err(RateTableError::Empty);
        };
        if last.max_income.is_finite() {
            return Err(RateTableError::BoundedTerminal(last.max_income));
        }

        for threshold in &thresholds {
            if !(threshold.min_income < threshold.max_income) {
                return Err(RateTableError::NotAscending {
                    min_income: threshold.min_income,
                    max_income: threshold.max_income,
                });
            }
            if !(0.0..=100.0).contains(&threshold.rate) {
                return Err(RateTableError::RateOutOfRange(threshold.rate));
            }
        }

        for pair in thresholds.windows(2) {
            if pair[1].min_income != pair[0].max_income {
                return Err(RateTableError::Discontinuity {
                    expected: pair[0].max_income,
                    found: pair[1].min_income,
                });
            }
        }

        Ok(Self { thresholds })
    }

    /// Built-in schedule for a published income year.
    pub fn for_epoch(epoch: TableEpoch) -> Self {
        let bands = match epoch {
            TableEpoch::Ty2023 => &TABLE_2023[..],
            TableEpoch::Ty2024_25 => &TABLE_2024_25[..],
        };
        Self::new(bands.to_vec()).expect("built-in rate tables are well-formed")
    }

    /// Rate (percent of income) for the first band containing the income.
    /// Linear scan; tables are small.
    pub fn resolve_rate(&self, income: f64) -> f64 {
        for threshold in &self.thresholds {
            if income >= threshold.min_income && income < threshold.max_income {
                return threshold.rate;
            }
        }
        0.0
    }

    pub fn thresholds(&self) -> &[RepaymentThreshold] {
        &self.thresholds
    }
}

/// Which published repayment schedule to apply. New income years are new
/// table constants, not new code.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize)]
pub enum TableEpoch {
    #[serde(rename = "2023", alias = "ty2023")]
    Ty2023,
    #[serde(rename = "2024-25", alias = "2024_25", alias = "ty2024-25")]
    Ty2024_25,
}

impl TableEpoch {
    /// Published indexation rate for the income year, applied unless the
    /// caller overrides it.
    pub fn default_indexation_rate(self) -> f64 {
        match self {
            TableEpoch::Ty2023 => 7.1,
            TableEpoch::Ty2024_25 => 4.0,
        }
    }
}

/// 2023 schedule as shipped in the first release of the calculator: a
/// simplified chain that jumps to the terminal 10% band above $107,999.
const TABLE_2023: [RepaymentThreshold; 13] = [
    RepaymentThreshold::new(51_550.0, 57_154.0, 1.0),
    RepaymentThreshold::new(57_154.0, 62_764.0, 2.0),
    RepaymentThreshold::new(62_764.0, 66_354.0, 2.5),
    RepaymentThreshold::new(66_354.0, 69_999.0, 3.0),
    RepaymentThreshold::new(69_999.0, 73_999.0, 3.5),
    RepaymentThreshold::new(73_999.0, 77_999.0, 4.0),
    RepaymentThreshold::new(77_999.0, 82_999.0, 4.5),
    RepaymentThreshold::new(82_999.0, 87_999.0, 5.0),
    RepaymentThreshold::new(87_999.0, 92_999.0, 5.5),
    RepaymentThreshold::new(92_999.0, 97_999.0, 6.0),
    RepaymentThreshold::new(97_999.0, 102_999.0, 6.5),
    RepaymentThreshold::new(102_999.0, 107_999.0, 7.0),
    RepaymentThreshold::new(107_999.0, f64::INFINITY, 10.0),
];

/// 2024-25 schedule: the full progressive ladder in half-point steps.
const TABLE_2024_25: [RepaymentThreshold; 18] = [
    RepaymentThreshold::new(51_550.0, 59_519.0, 1.0),
    RepaymentThreshold::new(59_519.0, 63_090.0, 2.0),
    RepaymentThreshold::new(63_090.0, 66_876.0, 2.5),
    RepaymentThreshold::new(66_876.0, 70_889.0, 3.0),
    RepaymentThreshold::new(70_889.0, 75_000.0, 3.5),
    RepaymentThreshold::new(75_000.0, 79_500.0, 4.0),
    RepaymentThreshold::new(79_500.0, 84_430.0, 4.5),
    RepaymentThreshold::new(84_430.0, 89_495.0, 5.0),
    RepaymentThreshold::new(89_495.0, 94_866.0, 5.5),
    RepaymentThreshold::new(94_866.0, 100_558.0, 6.0),
    RepaymentThreshold::new(100_558.0, 106_591.0, 6.5),
    RepaymentThreshold::new(106_591.0, 112_986.0, 7.0),
    RepaymentThreshold::new(112_986.0, 119_765.0, 7.5),
    RepaymentThreshold::new(119_765.0, 126_951.0, 8.0),
    RepaymentThreshold::new(126_951.0, 134_569.0, 8.5),
    RepaymentThreshold::new(134_569.0, 142_643.0, 9.0),
    RepaymentThreshold::new(142_643.0, 151_201.0, 9.5),
    RepaymentThreshold::new(151_201.0, f64::INFINITY, 10.0),
];

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    #[test]
    fn builtin_tables_are_well_formed() {
        let ty2023 = RateTable::for_epoch(TableEpoch::Ty2023);
        let ty2024_25 = RateTable::for_epoch(TableEpoch::Ty2024_25);
        assert_eq!(ty2023.thresholds().len(), 13);
        assert_eq!(ty2024_25.thresholds().len(), 18);
    }

    #[test]
    fn resolves_nil_below_first_band() {
        let table = RateTable::for_epoch(TableEpoch::Ty2024_25);
        assert_eq!(table.resolve_rate(0.0), 0.0);
        assert_eq!(table.resolve_rate(40_000.0), 0.0);
        assert_eq!(table.resolve_rate(51_549.99), 0.0);
    }

    #[test]
    fn resolves_band_boundaries_2024_25() {
        let table = RateTable::for_epoch(TableEpoch::Ty2024_25);
        assert_eq!(table.resolve_rate(51_550.0), 1.0);
        assert_eq!(table.resolve_rate(59_519.0), 2.0);
        assert_eq!(table.resolve_rate(70_000.0), 3.0);
        assert_eq!(table.resolve_rate(70_889.0), 3.5);
        assert_eq!(table.resolve_rate(151_200.0), 9.5);
        assert_eq!(table.resolve_rate(151_201.0), 10.0);
        assert_eq!(table.resolve_rate(1_000_000.0), 10.0);
    }

    #[test]
    fn resolves_band_boundaries_2023() {
        let table = RateTable::for_epoch(TableEpoch::Ty2023);
        assert_eq!(table.resolve_rate(51_549.0), 0.0);
        assert_eq!(table.resolve_rate(51_550.0), 1.0);
        assert_eq!(table.resolve_rate(70_000.0), 3.5);
        assert_eq!(table.resolve_rate(107_998.0), 7.0);
        assert_eq!(table.resolve_rate(107_999.0), 10.0);
    }

    #[test]
    fn rejects_empty_table() {
        assert_eq!(RateTable::new(Vec::new()), Err(RateTableError::Empty));
    }

    #[test]
    fn rejects_gap_between_bands() {
        let err = RateTable::new(vec![
            RepaymentThreshold::new(50_000.0, 60_000.0, 1.0),
            RepaymentThreshold::new(61_000.0, f64::INFINITY, 2.0),
        ])
        .expect_err("gap must be rejected");
        assert_eq!(
            err,
            RateTableError::Discontinuity {
                expected: 60_000.0,
                found: 61_000.0,
            }
        );
    }

    #[test]
    fn rejects_overlapping_bands() {
        let err = RateTable::new(vec![
            RepaymentThreshold::new(50_000.0, 60_000.0, 1.0),
            RepaymentThreshold::new(59_000.0, f64::INFINITY, 2.0),
        ])
        .expect_err("overlap must be rejected");
        assert_eq!(
            err,
            RateTableError::Discontinuity {
                expected: 60_000.0,
                found: 59_000.0,
            }
        );
    }

    #[test]
    fn rejects_bounded_terminal_band() {
        let err = RateTable::new(vec![RepaymentThreshold::new(50_000.0, 60_000.0, 1.0)])
            .expect_err("bounded terminal band must be rejected");
        assert_eq!(err, RateTableError::BoundedTerminal(60_000.0));
    }

    #[test]
    fn rejects_inverted_band() {
        let err = RateTable::new(vec![
            RepaymentThreshold::new(60_000.0, 50_000.0, 1.0),
            RepaymentThreshold::new(50_000.0, f64::INFINITY, 2.0),
        ])
        .expect_err("inverted band must be rejected");
        assert_eq!(
            err,
            RateTableError::NotAscending {
                min_income: 60_000.0,
                max_income: 50_000.0,
            }
        );
    }

    #[test]
    fn rejects_rate_out_of_percent_range() {
        let err = RateTable::new(vec![RepaymentThreshold::new(0.0, f64::INFINITY, 120.0)])
            .expect_err("rate above 100 must be rejected");
        assert_eq!(err, RateTableError::RateOutOfRange(120.0));
    }

    #[test]
    fn epoch_default_indexation_rates() {
        assert_eq!(TableEpoch::Ty2023.default_indexation_rate(), 7.1);
        assert_eq!(TableEpoch::Ty2024_25.default_indexation_rate(), 4.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_rates_are_monotonic_in_income(lo in 0u32..300_000, hi in 0u32..300_000) {
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            for epoch in [TableEpoch::Ty2023, TableEpoch::Ty2024_25] {
                let table = RateTable::for_epoch(epoch);
                prop_assert!(table.resolve_rate(lo as f64) <= table.resolve_rate(hi as f64));
            }
        }
    }
}
