//! Split and distribution policies.
//!
//! Two distinct families of share computation live here:
//!
//! - [`SplitType`] divides a **bill total across its participants**. The
//!   shares always sum exactly to the bill total: rounding leftovers are
//!   spread deterministically and unspecified shares (an auto-added creator)
//!   absorb the remainder.
//! - [`DistributionType`] divides an **expense amount across linked
//!   buckets** (budgets or savings goals). Here the shares intentionally do
//!   *not* have to sum to the expense amount: `equal_split` hands every
//!   bucket the full amount and `half` hands every bucket half of it.
//!
//! All functions are pure and operate on integer minor units.

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// How a bill total is divided across participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    Equal,
    Percentage,
    Manual,
}

impl SplitType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Percentage => "percentage",
            Self::Manual => "manual",
        }
    }
}

impl TryFrom<&str> for SplitType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "equal" => Ok(Self::Equal),
            "percentage" => Ok(Self::Percentage),
            "manual" => Ok(Self::Manual),
            other => Err(EngineError::Validation(format!(
                "invalid split type: {other}"
            ))),
        }
    }
}

/// How an expense amount is divided across linked buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionType {
    None,
    Manual,
    EqualSplit,
    Half,
}

impl DistributionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Manual => "manual",
            Self::EqualSplit => "equal_split",
            Self::Half => "half",
        }
    }
}

impl TryFrom<&str> for DistributionType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "none" => Ok(Self::None),
            "manual" => Ok(Self::Manual),
            "equal_split" => Ok(Self::EqualSplit),
            "half" => Ok(Self::Half),
            other => Err(EngineError::Validation(format!(
                "invalid distribution type: {other}"
            ))),
        }
    }
}

/// Named inputs for [`bill_shares`].
///
/// `percentages_bp`/`amounts_minor` hold one value per *named* participant,
/// in participant order. When `creator_appended` is set, the creator was not
/// among the named participants and gets the remainder share appended.
pub(crate) struct BillShareInputs<'a> {
    pub total_minor: i64,
    pub participant_count: usize,
    pub percentages_bp: &'a [i64],
    pub amounts_minor: &'a [i64],
    pub creator_appended: bool,
}

/// Computes one owed share per participant for a bill.
///
/// The returned vector has exactly `participant_count` entries and, for
/// `equal` and for the auto-appended-creator cases, sums exactly to
/// `total_minor`.
pub(crate) fn bill_shares(
    split_type: SplitType,
    inputs: &BillShareInputs<'_>,
) -> ResultEngine<Vec<i64>> {
    let named_count = inputs.participant_count - usize::from(inputs.creator_appended);

    match split_type {
        SplitType::Equal => equal_shares(inputs.total_minor, inputs.participant_count),
        SplitType::Percentage => {
            if inputs.percentages_bp.len() != named_count {
                return Err(EngineError::Validation(format!(
                    "expected {named_count} percentages, got {}",
                    inputs.percentages_bp.len()
                )));
            }
            let mut shares = Vec::with_capacity(inputs.participant_count);
            for &bp in inputs.percentages_bp {
                if bp < 0 {
                    return Err(EngineError::Validation(
                        "percentage must be >= 0".to_string(),
                    ));
                }
                shares.push(percentage_share(inputs.total_minor, bp));
            }
            if inputs.creator_appended {
                // The creator absorbs whatever the named percentages leave
                // over, clamped at zero.
                let named_sum: i64 = shares.iter().sum();
                shares.push((inputs.total_minor - named_sum).max(0));
            }
            Ok(shares)
        }
        SplitType::Manual => {
            if inputs.amounts_minor.len() != named_count {
                return Err(EngineError::Validation(format!(
                    "expected {named_count} amounts, got {}",
                    inputs.amounts_minor.len()
                )));
            }
            let mut shares = inputs.amounts_minor.to_vec();
            if inputs.creator_appended {
                let named_sum: i64 = shares.iter().sum();
                shares.push(inputs.total_minor - named_sum);
            }
            Ok(shares)
        }
    }
}

/// Splits `total_minor` into `count` shares that differ by at most one minor
/// unit and sum exactly to `total_minor`. The first `total % count`
/// participants carry the extra unit.
fn equal_shares(total_minor: i64, count: usize) -> ResultEngine<Vec<i64>> {
    if count == 0 {
        return Err(EngineError::Validation(
            "a bill needs at least one participant".to_string(),
        ));
    }
    let count_i64 = count as i64;
    let base = total_minor / count_i64;
    let remainder = total_minor % count_i64;

    Ok((0..count_i64)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect())
}

/// `total * bp / 10_000`, truncated toward zero. `6000` bp = 60%.
fn percentage_share(total_minor: i64, bp: i64) -> i64 {
    total_minor * bp / 10_000
}

/// Computes one share per selected bucket for an expense.
///
/// `manual_minor` is consulted only for [`DistributionType::Manual`] with
/// more than one bucket; a single selected bucket always receives the full
/// expense amount, whatever the policy says.
pub(crate) fn distribution_shares(
    distribution: DistributionType,
    amount_minor: i64,
    bucket_count: usize,
    manual_minor: &[i64],
) -> ResultEngine<Vec<i64>> {
    if distribution == DistributionType::None || bucket_count == 0 {
        return Ok(Vec::new());
    }
    if bucket_count == 1 {
        return Ok(vec![amount_minor]);
    }

    match distribution {
        DistributionType::None => Ok(Vec::new()),
        DistributionType::Manual => {
            if manual_minor.len() != bucket_count {
                return Err(EngineError::Validation(format!(
                    "expected {bucket_count} manual amounts, got {}",
                    manual_minor.len()
                )));
            }
            // The sub-cent tolerance of the manual check collapses to exact
            // equality in integer minor units.
            let sum: i64 = manual_minor.iter().sum();
            if sum != amount_minor {
                return Err(EngineError::Validation(format!(
                    "manual amounts sum to {sum}, expense amount is {amount_minor}"
                )));
            }
            Ok(manual_minor.to_vec())
        }
        // Every bucket claims the full amount. Joint claims are the point:
        // two budgets may both account for the whole expense.
        DistributionType::EqualSplit => Ok(vec![amount_minor; bucket_count]),
        DistributionType::Half => Ok(vec![amount_minor / 2; bucket_count]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(total_minor: i64) -> BillShareInputs<'static> {
        BillShareInputs {
            total_minor,
            participant_count: 0,
            percentages_bp: &[],
            amounts_minor: &[],
            creator_appended: false,
        }
    }

    #[test]
    fn equal_split_sums_exactly() {
        let mut i = inputs(100_00);
        i.participant_count = 3;
        let shares = bill_shares(SplitType::Equal, &i).unwrap();

        assert_eq!(shares.iter().sum::<i64>(), 100_00);
        assert_eq!(shares, vec![33_34, 33_33, 33_33]);
    }

    #[test]
    fn equal_split_shares_differ_by_at_most_one_cent() {
        let mut i = inputs(100_01);
        i.participant_count = 7;
        let shares = bill_shares(SplitType::Equal, &i).unwrap();

        let min = shares.iter().min().unwrap();
        let max = shares.iter().max().unwrap();
        assert!(max - min <= 1);
        assert_eq!(shares.iter().sum::<i64>(), 100_01);
    }

    #[test]
    fn percentage_appends_creator_remainder() {
        let mut i = inputs(200_00);
        i.participant_count = 3;
        i.percentages_bp = &[6000, 4000];
        i.creator_appended = true;
        let shares = bill_shares(SplitType::Percentage, &i).unwrap();

        assert_eq!(shares, vec![120_00, 80_00, 0]);
        assert_eq!(shares.iter().sum::<i64>(), 200_00);
    }

    #[test]
    fn percentage_creator_remainder_clamps_at_zero() {
        let mut i = inputs(100_00);
        i.participant_count = 3;
        i.percentages_bp = &[8000, 4000];
        i.creator_appended = true;
        let shares = bill_shares(SplitType::Percentage, &i).unwrap();

        assert_eq!(shares, vec![80_00, 40_00, 0]);
    }

    #[test]
    fn manual_appends_creator_remainder() {
        let mut i = inputs(90_00);
        i.participant_count = 3;
        i.amounts_minor = &[30_00, 40_00];
        i.creator_appended = true;
        let shares = bill_shares(SplitType::Manual, &i).unwrap();

        assert_eq!(shares, vec![30_00, 40_00, 20_00]);
    }

    #[test]
    fn percentage_count_mismatch_is_rejected() {
        let mut i = inputs(100_00);
        i.participant_count = 3;
        i.percentages_bp = &[5000];
        let err = bill_shares(SplitType::Percentage, &i).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn equal_split_distribution_hands_out_full_amount() {
        let shares =
            distribution_shares(DistributionType::EqualSplit, 40_00, 2, &[]).unwrap();
        assert_eq!(shares, vec![40_00, 40_00]);
    }

    #[test]
    fn half_distribution_halves_per_bucket() {
        let shares = distribution_shares(DistributionType::Half, 40_00, 2, &[]).unwrap();
        assert_eq!(shares, vec![20_00, 20_00]);
    }

    #[test]
    fn single_bucket_receives_full_amount_regardless_of_policy() {
        for policy in [
            DistributionType::Manual,
            DistributionType::EqualSplit,
            DistributionType::Half,
        ] {
            let shares = distribution_shares(policy, 55_00, 1, &[]).unwrap();
            assert_eq!(shares, vec![55_00]);
        }
    }

    #[test]
    fn manual_distribution_mismatch_is_rejected() {
        let err = distribution_shares(DistributionType::Manual, 100_00, 2, &[30_00, 60_00])
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let shares =
            distribution_shares(DistributionType::Manual, 100_00, 2, &[30_00, 70_00]).unwrap();
        assert_eq!(shares, vec![30_00, 70_00]);
    }

    #[test]
    fn none_distribution_yields_no_shares() {
        let shares = distribution_shares(DistributionType::None, 40_00, 2, &[]).unwrap();
        assert!(shares.is_empty());
    }
}
