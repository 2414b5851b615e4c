use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionFrequency {
    Monthly,
    Annually,
}

impl ContributionFrequency {
    pub fn periods_per_year(self) -> f64 {
        match self {
            ContributionFrequency::Monthly => 12.0,
            ContributionFrequency::Annually => 1.0,
        }
    }
}

/// How rounding of emitted snapshots interacts with the running totals.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum RoundingPolicy {
    /// Accumulate at full precision; only the emitted records are rounded.
    #[default]
    AtOutput,
    /// Carry each year's rounded record forward as the next year's totals.
    EachYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionInput {
    pub initial_amount: f64,
    pub periodic_contribution: f64,
    pub contribution_frequency: ContributionFrequency,
    pub annual_rate_percent: f64,
    /// Negative horizons project nothing.
    pub number_of_years: i32,
}

impl ProjectionInput {
    pub fn annual_contribution(&self) -> f64 {
        self.periodic_contribution * self.contribution_frequency.periods_per_year()
    }

    pub fn horizon(&self) -> u32 {
        self.number_of_years.max(0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSnapshot {
    pub year: u32,
    pub starting_balance: f64,
    /// Excludes the initial amount.
    pub cumulative_contributions: f64,
    pub cumulative_interest: f64,
    pub ending_balance: f64,
}
