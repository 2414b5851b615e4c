use super::types::{ProjectionInput, RoundingPolicy, YearSnapshot};

pub fn project(input: &ProjectionInput) -> Vec<YearSnapshot> {
    project_with_rounding(input, RoundingPolicy::AtOutput)
}

/// Year-by-year growth with simple annual interest on each year's starting
/// balance. Contributions land at year end and earn nothing in their first year.
pub fn project_with_rounding(input: &ProjectionInput, policy: RoundingPolicy) -> Vec<YearSnapshot> {
    let years = input.horizon();
    let annual_contribution = input.annual_contribution();
    let rate = input.annual_rate_percent / 100.0;

    let mut balance = input.initial_amount;
    let mut total_contributions = input.initial_amount;
    let mut total_interest = 0.0;
    let mut snapshots = Vec::with_capacity(years as usize);

    for year in 1..=years {
        let starting_balance = balance;
        total_contributions += annual_contribution;

        let interest_earned = balance * rate;
        total_interest += interest_earned;
        balance = balance + annual_contribution + interest_earned;

        let snapshot = YearSnapshot {
            year,
            starting_balance: round_half_up(starting_balance),
            cumulative_contributions: round_half_up(total_contributions - input.initial_amount),
            cumulative_interest: round_half_up(total_interest),
            ending_balance: round_half_up(balance),
        };

        if policy == RoundingPolicy::EachYear {
            balance = snapshot.ending_balance;
            total_interest = snapshot.cumulative_interest;
            total_contributions = input.initial_amount + snapshot.cumulative_contributions;
        }

        snapshots.push(snapshot);
    }

    log::trace!(
        "projected {} years, final balance {:?}",
        years,
        snapshots.last().map(|s| s.ending_balance)
    );
    snapshots
}

/// Nearest whole unit, halves toward positive infinity (-2.5 -> -2).
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}
