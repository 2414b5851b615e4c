//! Calculator state behind every front end: current inputs, step controls,
//! boundary validation of typed values and the view configuration.
//!
//! Every accepted change recomputes the projection synchronously, so the
//! stored projection always belongs to the stored inputs.

pub mod render;
pub mod session;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::core::{ContributionFrequency, ProjectionInput, YearSnapshot, project};

pub const MAX_YEARS: u32 = 500;
/// Largest initial amount or periodic contribution accepted.
pub const MAX_AMOUNT: f64 = 1e12;
/// Accepted annual rate range in percent. At the extremes the balance over
/// `MAX_YEARS` still stays finite for `MAX_AMOUNT` inputs.
pub const MIN_RATE_PERCENT: f64 = -100.0;
pub const MAX_RATE_PERCENT: f64 = 100.0;

pub const DEFAULT_INITIAL_AMOUNT: f64 = 5_000.0;
pub const DEFAULT_PERIODIC_CONTRIBUTION: f64 = 150.0;
pub const DEFAULT_ANNUAL_RATE_PERCENT: f64 = 4.0;
pub const DEFAULT_NUMBER_OF_YEARS: i32 = 10;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Field {
    InitialAmount,
    PeriodicContribution,
    AnnualRate,
    NumberOfYears,
}

impl Field {
    /// Amount one press of an increment/decrement control moves the field.
    pub fn step(self) -> f64 {
        match self {
            Field::InitialAmount => 100.0,
            Field::PeriodicContribution => 10.0,
            Field::AnnualRate => 0.1,
            Field::NumberOfYears => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::InitialAmount => "initial amount",
            Field::PeriodicContribution => "contributions",
            Field::AnnualRate => "rate of return",
            Field::NumberOfYears => "years of growth",
        }
    }

    fn is_money(self) -> bool {
        matches!(self, Field::InitialAmount | Field::PeriodicContribution)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Field {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "initial" | "initial-amount" | "initialamount" => Ok(Field::InitialAmount),
            "contribution" | "contributions" | "periodic-contribution" => {
                Ok(Field::PeriodicContribution)
            }
            "rate" | "rate-of-return" | "annual-rate" => Ok(Field::AnnualRate),
            "years" | "years-of-growth" | "number-of-years" => Ok(Field::NumberOfYears),
            _ => Err(InputError::UnknownField(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} must not be empty")]
    Empty { field: Field },
    #[error("{field} must be a number, got {text:?}")]
    NotANumber { field: Field, text: String },
    #[error("{field} must be a finite number")]
    NotFinite { field: Field },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: Field, min: f64, max: f64 },
    #[error("years of growth must be a whole number")]
    FractionalYears,
    #[error("years of growth must be at most {max}")]
    TooManyYears { max: u32 },
    #[error("unknown field {0:?} (expected initial, contribution, rate or years)")]
    UnknownField(String),
    #[error("unknown contribution frequency {0:?} (expected monthly or annually)")]
    UnknownFrequency(String),
    #[error("unknown viewport {0:?} (expected wide or compact)")]
    UnknownViewport(String),
    #[error("unknown command {0:?}; type help for the command list")]
    UnknownCommand(String),
}

pub fn parse_frequency(text: &str) -> Result<ContributionFrequency, InputError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "monthly" | "month" | "m" => Ok(ContributionFrequency::Monthly),
        "annually" | "annual" | "yearly" | "a" | "y" => Ok(ContributionFrequency::Annually),
        other => Err(InputError::UnknownFrequency(other.to_string())),
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ViewMode {
    #[default]
    Chart,
    Table,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Chart => ViewMode::Table,
            ViewMode::Table => ViewMode::Chart,
        }
    }
}

/// Display density handed to the table renderer. The shell never inspects a
/// live terminal or window size; callers choose the class.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportClass {
    #[default]
    Wide,
    Compact,
}

impl FromStr for ViewportClass {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wide" | "desktop" => Ok(ViewportClass::Wide),
            "compact" | "mobile" | "narrow" => Ok(ViewportClass::Compact),
            other => Err(InputError::UnknownViewport(other.to_string())),
        }
    }
}

/// Parse free text typed into a field into a value the engine accepts.
pub fn parse_field(field: Field, text: &str) -> Result<f64, InputError> {
    let mut cleaned = text.trim();
    if field.is_money() {
        cleaned = cleaned.strip_prefix('$').unwrap_or(cleaned).trim_start();
    }
    if field == Field::AnnualRate {
        cleaned = cleaned.strip_suffix('%').unwrap_or(cleaned).trim_end();
    }
    let cleaned = cleaned.replace(',', "");
    if cleaned.is_empty() {
        return Err(InputError::Empty { field });
    }

    let value = cleaned.parse::<f64>().map_err(|_| InputError::NotANumber {
        field,
        text: text.trim().to_string(),
    })?;
    check_field(field, value)
}

/// Boundary rules shared by typed text, CLI flags and API payloads.
///
/// Negative amounts and years clamp to zero. Anything large enough to
/// overflow the projection is rejected, as are fractional years.
pub fn check_field(field: Field, value: f64) -> Result<f64, InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }

    match field {
        Field::AnnualRate => {
            if !(MIN_RATE_PERCENT..=MAX_RATE_PERCENT).contains(&value) {
                return Err(InputError::OutOfRange {
                    field,
                    min: MIN_RATE_PERCENT,
                    max: MAX_RATE_PERCENT,
                });
            }
            Ok(value)
        }
        Field::InitialAmount | Field::PeriodicContribution => {
            if value > MAX_AMOUNT {
                return Err(InputError::OutOfRange {
                    field,
                    min: 0.0,
                    max: MAX_AMOUNT,
                });
            }
            if value < 0.0 {
                log::warn!("{field} {value} is negative; clamping to 0");
            }
            Ok(value.max(0.0))
        }
        Field::NumberOfYears => {
            if value.fract() != 0.0 {
                return Err(InputError::FractionalYears);
            }
            if value > MAX_YEARS as f64 {
                return Err(InputError::TooManyYears { max: MAX_YEARS });
            }
            if value < 0.0 {
                log::warn!("{field} {value} is negative; clamping to 0");
            }
            Ok(value.max(0.0))
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// NaN maps to zero in both.
fn clamp_amount(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, MAX_AMOUNT) }
}

fn clamp_rate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(MIN_RATE_PERCENT, MAX_RATE_PERCENT)
    }
}

#[derive(Debug, Clone)]
pub struct ShellState {
    initial_amount: f64,
    periodic_contribution: f64,
    frequency: ContributionFrequency,
    annual_rate_percent: f64,
    number_of_years: u32,
    view_mode: ViewMode,
    viewport: ViewportClass,
    projection: Vec<YearSnapshot>,
}

impl Default for ShellState {
    fn default() -> Self {
        Self::new(ProjectionInput {
            initial_amount: DEFAULT_INITIAL_AMOUNT,
            periodic_contribution: DEFAULT_PERIODIC_CONTRIBUTION,
            contribution_frequency: ContributionFrequency::Monthly,
            annual_rate_percent: DEFAULT_ANNUAL_RATE_PERCENT,
            number_of_years: DEFAULT_NUMBER_OF_YEARS,
        })
    }
}

impl ShellState {
    /// Start from already-validated inputs; out-of-range values are clamped.
    pub fn new(input: ProjectionInput) -> Self {
        let mut state = Self {
            initial_amount: clamp_amount(input.initial_amount),
            periodic_contribution: clamp_amount(input.periodic_contribution),
            frequency: input.contribution_frequency,
            annual_rate_percent: clamp_rate(input.annual_rate_percent),
            number_of_years: input.horizon().min(MAX_YEARS),
            view_mode: ViewMode::default(),
            viewport: ViewportClass::default(),
            projection: Vec::new(),
        };
        state.recompute();
        state
    }

    pub fn input(&self) -> ProjectionInput {
        ProjectionInput {
            initial_amount: self.initial_amount,
            periodic_contribution: self.periodic_contribution,
            contribution_frequency: self.frequency,
            annual_rate_percent: self.annual_rate_percent,
            number_of_years: self.number_of_years as i32,
        }
    }

    pub fn projection(&self) -> &[YearSnapshot] {
        &self.projection
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn viewport(&self) -> ViewportClass {
        self.viewport
    }

    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::InitialAmount => self.initial_amount,
            Field::PeriodicContribution => self.periodic_contribution,
            Field::AnnualRate => self.annual_rate_percent,
            Field::NumberOfYears => self.number_of_years as f64,
        }
    }

    pub fn increment(&mut self, field: Field) {
        let next = round_cents(self.value(field) + field.step());
        self.store(field, next);
    }

    /// Decrements never go below zero, the rate included.
    pub fn decrement(&mut self, field: Field) {
        let next = round_cents(self.value(field) - field.step()).max(0.0);
        self.store(field, next);
    }

    /// Apply typed text; a rejected value leaves the state untouched.
    pub fn set_text(&mut self, field: Field, text: &str) -> Result<(), InputError> {
        let value = parse_field(field, text)?;
        self.store(field, value);
        Ok(())
    }

    pub fn set_frequency(&mut self, frequency: ContributionFrequency) {
        if self.frequency != frequency {
            self.frequency = frequency;
            self.recompute();
        }
    }

    pub fn toggle_view_mode(&mut self) {
        self.view_mode = self.view_mode.toggled();
    }

    pub fn set_viewport(&mut self, viewport: ViewportClass) {
        self.viewport = viewport;
    }

    fn store(&mut self, field: Field, value: f64) {
        match field {
            Field::InitialAmount => self.initial_amount = clamp_amount(value),
            Field::PeriodicContribution => self.periodic_contribution = clamp_amount(value),
            Field::AnnualRate => self.annual_rate_percent = clamp_rate(value),
            Field::NumberOfYears => self.number_of_years = (value as u32).min(MAX_YEARS),
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        self.projection = project(&self.input());
        log::debug!(
            "recomputed projection: {} years, {:?}",
            self.projection.len(),
            self.input()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn default_state_projects_ten_years() {
        let state = ShellState::default();
        assert_eq!(state.projection().len(), 10);
        assert_eq!(state.view_mode(), ViewMode::Chart);
        assert_eq!(state.viewport(), ViewportClass::Wide);
        assert_approx(state.projection()[0].ending_balance, 7_000.0);
    }

    #[test]
    fn increments_round_to_two_decimals() {
        let mut state = ShellState::default();
        for _ in 0..3 {
            state.increment(Field::AnnualRate);
        }
        // 4.0 + 0.1 + 0.1 + 0.1 drifts in binary floating point without rounding.
        assert_eq!(state.value(Field::AnnualRate), 4.3);

        state.increment(Field::InitialAmount);
        state.increment(Field::PeriodicContribution);
        state.increment(Field::NumberOfYears);
        assert_approx(state.value(Field::InitialAmount), 5_100.0);
        assert_approx(state.value(Field::PeriodicContribution), 160.0);
        assert_eq!(state.projection().len(), 11);
    }

    #[test]
    fn decrements_clamp_at_zero() {
        let mut state = ShellState::default();
        state.set_text(Field::AnnualRate, "0.05").expect("valid rate");
        state.decrement(Field::AnnualRate);
        assert_approx(state.value(Field::AnnualRate), 0.0);

        state.set_text(Field::InitialAmount, "50").expect("valid amount");
        state.decrement(Field::InitialAmount);
        assert_approx(state.value(Field::InitialAmount), 0.0);

        state.set_text(Field::NumberOfYears, "0").expect("valid years");
        state.decrement(Field::NumberOfYears);
        assert_eq!(state.value(Field::NumberOfYears), 0.0);
        assert!(state.projection().is_empty());
    }

    #[test]
    fn increment_caps_years() {
        let mut state = ShellState::default();
        state
            .set_text(Field::NumberOfYears, &MAX_YEARS.to_string())
            .expect("max years is valid");
        state.increment(Field::NumberOfYears);
        assert_eq!(state.projection().len(), MAX_YEARS as usize);
    }

    #[test]
    fn parse_field_accepts_currency_grouping_and_percent() {
        assert_approx(parse_field(Field::InitialAmount, " $12,500.50 ").unwrap(), 12_500.5);
        assert_approx(parse_field(Field::AnnualRate, "4.5%").unwrap(), 4.5);
        assert_approx(parse_field(Field::AnnualRate, "-2").unwrap(), -2.0);
        assert_approx(parse_field(Field::NumberOfYears, "30").unwrap(), 30.0);
    }

    #[test]
    fn parse_field_clamps_negative_amounts_and_years() {
        assert_approx(parse_field(Field::PeriodicContribution, "-40").unwrap(), 0.0);
        assert_approx(parse_field(Field::NumberOfYears, "-3").unwrap(), 0.0);
    }

    #[test]
    fn parse_field_rejects_invalid_text() {
        assert_eq!(
            parse_field(Field::InitialAmount, "   "),
            Err(InputError::Empty {
                field: Field::InitialAmount
            })
        );
        assert_eq!(
            parse_field(Field::AnnualRate, "four"),
            Err(InputError::NotANumber {
                field: Field::AnnualRate,
                text: "four".to_string()
            })
        );
        assert_eq!(
            parse_field(Field::AnnualRate, "NaN"),
            Err(InputError::NotFinite {
                field: Field::AnnualRate
            })
        );
        assert_eq!(
            parse_field(Field::InitialAmount, "inf"),
            Err(InputError::NotFinite {
                field: Field::InitialAmount
            })
        );
        assert_eq!(
            parse_field(Field::NumberOfYears, "2.5"),
            Err(InputError::FractionalYears)
        );
        assert_eq!(
            parse_field(Field::NumberOfYears, "501"),
            Err(InputError::TooManyYears { max: MAX_YEARS })
        );
    }

    #[test]
    fn rejected_text_keeps_previous_state() {
        let mut state = ShellState::default();
        let before = state.projection().to_vec();
        let err = state
            .set_text(Field::PeriodicContribution, "lots")
            .expect_err("must reject text");
        assert!(err.to_string().contains("contributions"));
        assert_approx(state.value(Field::PeriodicContribution), 150.0);
        assert_eq!(state.projection(), before.as_slice());
    }

    #[test]
    fn frequency_change_recomputes_projection() {
        let mut state = ShellState::default();
        state.set_frequency(ContributionFrequency::Annually);
        assert_approx(state.projection()[0].cumulative_contributions, 150.0);
        assert_approx(state.projection()[0].ending_balance, 5_350.0);
    }

    #[test]
    fn view_mode_toggles_back_and_forth() {
        let mut state = ShellState::default();
        state.toggle_view_mode();
        assert_eq!(state.view_mode(), ViewMode::Table);
        state.toggle_view_mode();
        assert_eq!(state.view_mode(), ViewMode::Chart);
    }

    #[test]
    fn names_parse_into_fields_frequencies_and_viewports() {
        assert_eq!("Rate".parse::<Field>(), Ok(Field::AnnualRate));
        assert_eq!("years".parse::<Field>(), Ok(Field::NumberOfYears));
        assert!(matches!(
            "balance".parse::<Field>(),
            Err(InputError::UnknownField(_))
        ));
        assert_eq!(parse_frequency("Annually"), Ok(ContributionFrequency::Annually));
        assert!(parse_frequency("weekly").is_err());
        assert_eq!("mobile".parse::<ViewportClass>(), Ok(ViewportClass::Compact));
    }

    #[test]
    fn new_clamps_out_of_range_inputs() {
        let state = ShellState::new(ProjectionInput {
            initial_amount: -10.0,
            periodic_contribution: -1.0,
            contribution_frequency: ContributionFrequency::Monthly,
            annual_rate_percent: 3.0,
            number_of_years: -4,
        });
        assert_approx(state.value(Field::InitialAmount), 0.0);
        assert_approx(state.value(Field::PeriodicContribution), 0.0);
        assert!(state.projection().is_empty());
    }

    #[test]
    fn parse_field_rejects_values_that_would_overflow() {
        assert_eq!(
            parse_field(Field::AnnualRate, "1e300"),
            Err(InputError::OutOfRange {
                field: Field::AnnualRate,
                min: MIN_RATE_PERCENT,
                max: MAX_RATE_PERCENT,
            })
        );
        assert!(matches!(
            parse_field(Field::AnnualRate, "-101"),
            Err(InputError::OutOfRange { .. })
        ));
        assert_eq!(
            parse_field(Field::PeriodicContribution, "$2,000,000,000,000"),
            Err(InputError::OutOfRange {
                field: Field::PeriodicContribution,
                min: 0.0,
                max: MAX_AMOUNT,
            })
        );
        assert_approx(parse_field(Field::AnnualRate, "100%").unwrap(), 100.0);
        assert_approx(parse_field(Field::InitialAmount, "1e12").unwrap(), MAX_AMOUNT);
    }

    #[test]
    fn largest_accepted_inputs_keep_the_projection_finite() {
        let state = ShellState::new(ProjectionInput {
            initial_amount: MAX_AMOUNT,
            periodic_contribution: MAX_AMOUNT,
            contribution_frequency: ContributionFrequency::Monthly,
            annual_rate_percent: MAX_RATE_PERCENT,
            number_of_years: MAX_YEARS as i32,
        });
        assert_eq!(state.projection().len(), MAX_YEARS as usize);
        assert!(state.projection().iter().all(|s| {
            s.starting_balance.is_finite()
                && s.cumulative_contributions.is_finite()
                && s.cumulative_interest.is_finite()
                && s.ending_balance.is_finite()
        }));
    }

    #[test]
    fn steps_and_constructor_stay_within_bounds() {
        let mut state = ShellState::new(ProjectionInput {
            initial_amount: f64::INFINITY,
            periodic_contribution: f64::NAN,
            contribution_frequency: ContributionFrequency::Annually,
            annual_rate_percent: 1e300,
            number_of_years: 3,
        });
        assert_approx(state.value(Field::InitialAmount), MAX_AMOUNT);
        assert_approx(state.value(Field::PeriodicContribution), 0.0);
        assert_approx(state.value(Field::AnnualRate), MAX_RATE_PERCENT);

        state.increment(Field::InitialAmount);
        state.increment(Field::AnnualRate);
        assert_approx(state.value(Field::InitialAmount), MAX_AMOUNT);
        assert_approx(state.value(Field::AnnualRate), MAX_RATE_PERCENT);
    }
}
