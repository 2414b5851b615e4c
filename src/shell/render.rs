//! Text rendering of a projection: money formatting, the table view with its
//! per-year deltas, the stacked chart series and a terminal area chart.

use serde::Serialize;

use super::{ShellState, ViewMode, ViewportClass};
use crate::core::{ProjectionInput, YearSnapshot, round_half_up};

pub const DEFAULT_CHART_WIDTH: usize = 60;
pub const DEFAULT_CHART_HEIGHT: usize = 12;

const INITIAL_GLYPH: char = '#';
const CONTRIBUTION_GLYPH: char = '+';
const INTEREST_GLYPH: char = '.';

/// Whole currency units with comma grouping, e.g. `$1,234,567` or `-$40`.
pub fn format_money(value: f64) -> String {
    let rounded = round_half_up(value);
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn final_balance(input: &ProjectionInput, snapshots: &[YearSnapshot]) -> f64 {
    snapshots
        .last()
        .map(|s| s.ending_balance)
        .unwrap_or_else(|| round_half_up(input.initial_amount))
}

pub fn headline(input: &ProjectionInput, snapshots: &[YearSnapshot]) -> String {
    let years = input.horizon();
    let unit = if years == 1 { "year" } else { "years" };
    format!(
        "After {years} {unit}, your total balance is {}",
        format_money(final_balance(input, snapshots))
    )
}

/// One table line. The per-year amounts are differences of consecutive
/// cumulative snapshots, so they add back up to the cumulative columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub year: u32,
    pub starting_balance: f64,
    pub annual_contribution: f64,
    pub cumulative_contributions: f64,
    pub interest_earned: f64,
    pub cumulative_interest: f64,
    pub total_balance: f64,
}

pub fn table_rows(snapshots: &[YearSnapshot]) -> Vec<TableRow> {
    let mut previous: Option<&YearSnapshot> = None;
    let mut rows = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        let (prior_contributions, prior_interest) = previous
            .map(|p| (p.cumulative_contributions, p.cumulative_interest))
            .unwrap_or((0.0, 0.0));
        rows.push(TableRow {
            year: snapshot.year,
            starting_balance: snapshot.starting_balance,
            annual_contribution: snapshot.cumulative_contributions - prior_contributions,
            cumulative_contributions: snapshot.cumulative_contributions,
            interest_earned: snapshot.cumulative_interest - prior_interest,
            cumulative_interest: snapshot.cumulative_interest,
            total_balance: snapshot.ending_balance,
        });
        previous = Some(snapshot);
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

pub fn build_table(snapshots: &[YearSnapshot], viewport: ViewportClass) -> TableView {
    let rows = table_rows(snapshots);
    match viewport {
        ViewportClass::Wide => TableView {
            columns: vec![
                "YEAR",
                "STARTING BALANCE",
                "ANNUAL CONTRIBUTIONS",
                "CUMULATIVE CONTRIBUTIONS",
                "INTEREST EARNED",
                "CUMULATIVE INTEREST",
                "TOTAL BALANCE",
            ],
            rows: rows
                .iter()
                .map(|r| {
                    vec![
                        r.year.to_string(),
                        format_money(r.starting_balance),
                        format_money(r.annual_contribution),
                        format_money(r.cumulative_contributions),
                        format_money(r.interest_earned),
                        format_money(r.cumulative_interest),
                        format_money(r.total_balance),
                    ]
                })
                .collect(),
        },
        ViewportClass::Compact => TableView {
            columns: vec!["YEAR", "STARTING BALANCE", "TOTAL BALANCE"],
            rows: rows
                .iter()
                .map(|r| {
                    vec![
                        r.year.to_string(),
                        format_money(r.starting_balance),
                        format_money(r.total_balance),
                    ]
                })
                .collect(),
        },
    }
}

/// Right-aligned columns separated by two spaces, with a dashed rule under
/// the header.
pub fn render_table(table: &TableView) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.len()).collect();
    for row in &table.rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(idx) {
                *width = (*width).max(cell.len());
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format_line(table.columns.iter().copied(), &widths));
    out.push('\n');
    let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');
    for row in &table.rows {
        out.push_str(&format_line(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:>width$}"))
        .collect::<Vec<_>>()
        .join("  ")
}

/// One stacked-area sample: the three layers drawn bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackedPoint {
    pub year: u32,
    pub initial_amount: f64,
    pub contributions: f64,
    pub interest: f64,
    /// Sum of the three layers.
    pub total_balance: f64,
}

pub fn chart_series(input: &ProjectionInput, snapshots: &[YearSnapshot]) -> Vec<StackedPoint> {
    let initial_amount = round_half_up(input.initial_amount);
    snapshots
        .iter()
        .map(|s| StackedPoint {
            year: s.year,
            initial_amount,
            contributions: s.cumulative_contributions,
            interest: s.cumulative_interest,
            total_balance: initial_amount + s.cumulative_contributions + s.cumulative_interest,
        })
        .collect()
}

/// Hover text for one year of the chart: the year, the total balance, then
/// each layer bottom to top.
pub fn chart_tooltip(point: &StackedPoint) -> String {
    format!(
        "Year: {}\nTotal Balance: {}\nInitial Amount: {}\nTotal Contributions: {}\nTotal Interest Earned: {}",
        point.year,
        format_money(point.total_balance),
        format_money(point.initial_amount),
        format_money(point.contributions),
        format_money(point.interest),
    )
}

/// Terminal stacked-area chart on a fixed grid. Negative interest eats into
/// the layers below it instead of being drawn under the axis.
pub fn render_chart(points: &[StackedPoint], width: usize, height: usize) -> String {
    if points.is_empty() {
        return "No years to chart.\n".to_string();
    }

    let width = width.max(10);
    let height = height.max(4);
    let max_total = points.iter().map(|p| p.total_balance).fold(0.0, f64::max);
    let max_total = if max_total > 0.0 { max_total } else { 1.0 };

    let mut grid = vec![vec![' '; width]; height];
    for col in 0..width {
        let point = &points[col * points.len() / width];
        let total = point.total_balance.max(0.0);
        let initial_top = point.initial_amount.max(0.0).min(total);
        let contribution_top = (point.initial_amount + point.contributions)
            .max(0.0)
            .min(total);

        for (row, line) in grid.iter_mut().enumerate() {
            let value = ((height - row) as f64 - 0.5) / height as f64 * max_total;
            line[col] = if value <= initial_top {
                INITIAL_GLYPH
            } else if value <= contribution_top {
                CONTRIBUTION_GLYPH
            } else if value <= total {
                INTEREST_GLYPH
            } else {
                ' '
            };
        }
    }

    let last_year = points.last().map(|p| p.year).unwrap_or_default();
    let mut out = String::new();
    out.push_str(&format!(
        "Balance: $0 to {} | years 1 to {last_year}\n",
        format_money(max_total)
    ));
    out.push_str(&format!(
        "{INITIAL_GLYPH} Initial Amount  {CONTRIBUTION_GLYPH} Total Contributions  {INTEREST_GLYPH} Total Interest Earned\n"
    ));
    for line in grid {
        out.push('|');
        out.push_str(&line.into_iter().collect::<String>());
        out.push('\n');
    }
    out.push('+');
    out.push_str(&"-".repeat(width));
    out.push('\n');
    out.push_str(&format!(" 1{last_year:>pad$}\n", pad = width - 1));
    out
}

/// Headline plus whichever view the state currently selects.
pub fn render_view(state: &ShellState, chart_width: usize, chart_height: usize) -> String {
    let input = state.input();
    let snapshots = state.projection();

    let mut out = headline(&input, snapshots);
    out.push_str("\n\n");
    match state.view_mode() {
        ViewMode::Chart => out.push_str(&render_chart(
            &chart_series(&input, snapshots),
            chart_width,
            chart_height,
        )),
        ViewMode::Table => out.push_str(&render_table(&build_table(snapshots, state.viewport()))),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContributionFrequency, project};
    use crate::shell::Field;

    fn two_year_input() -> ProjectionInput {
        ProjectionInput {
            initial_amount: 5_000.0,
            periodic_contribution: 150.0,
            contribution_frequency: ContributionFrequency::Monthly,
            annual_rate_percent: 4.0,
            number_of_years: 2,
        }
    }

    #[test]
    fn format_money_groups_thousands() {
        assert_eq!(format_money(0.0), "$0");
        assert_eq!(format_money(100.0), "$100");
        assert_eq!(format_money(999.5), "$1,000");
        assert_eq!(format_money(1_234_567.4), "$1,234,567");
        assert_eq!(format_money(-1_234.0), "-$1,234");
        assert_eq!(format_money(-0.4), "$0");
    }

    #[test]
    fn table_rows_derive_yearly_deltas_from_cumulative_columns() {
        let rows = table_rows(&project(&two_year_input()));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].annual_contribution, 1_800.0);
        assert_eq!(rows[0].interest_earned, 200.0);
        assert_eq!(rows[1].annual_contribution, 1_800.0);
        assert_eq!(rows[1].interest_earned, 280.0);
        assert_eq!(rows[1].total_balance, 9_080.0);
    }

    #[test]
    fn wide_table_has_all_columns() {
        let table = build_table(&project(&two_year_input()), ViewportClass::Wide);
        assert_eq!(table.columns.len(), 7);
        assert_eq!(
            table.rows[1],
            vec!["2", "$7,000", "$1,800", "$3,600", "$280", "$480", "$9,080"]
        );
    }

    #[test]
    fn compact_table_renders_aligned_text() {
        let table = build_table(&project(&two_year_input()), ViewportClass::Compact);
        let expected = concat!(
            "YEAR  STARTING BALANCE  TOTAL BALANCE\n",
            "-------------------------------------\n",
            "   1            $5,000         $7,000\n",
            "   2            $7,000         $9,080\n",
        );
        assert_eq!(render_table(&table), expected);
    }

    #[test]
    fn chart_series_stacks_to_balance() {
        let input = two_year_input();
        let points = chart_series(&input, &project(&input));
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].initial_amount, 5_000.0);
        assert_eq!(points[1].total_balance, 9_080.0);
    }

    #[test]
    fn chart_tooltip_lists_year_total_and_layers() {
        let input = two_year_input();
        let points = chart_series(&input, &project(&input));
        assert_eq!(
            chart_tooltip(&points[1]),
            "Year: 2\nTotal Balance: $9,080\nInitial Amount: $5,000\nTotal Contributions: $3,600\nTotal Interest Earned: $480"
        );
    }

    #[test]
    fn chart_draws_every_layer_on_a_fixed_grid() {
        let state = ShellState::default();
        let input = state.input();
        let chart = render_chart(&chart_series(&input, state.projection()), 40, 12);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.len(), 2 + 12 + 2);
        assert!(lines[1].contains("Total Interest Earned"));
        for line in &lines[2..14] {
            assert_eq!(line.chars().count(), 41);
        }
        assert_eq!(lines[13], format!("|{}", "#".repeat(40)));
        let body = lines[2..14].concat();
        assert!(body.contains('+'));
        assert!(body.contains('.'));
        assert!(lines[15].ends_with("10"));
    }

    #[test]
    fn empty_projection_renders_placeholder_and_initial_headline() {
        let mut input = two_year_input();
        input.number_of_years = 0;
        assert_eq!(render_chart(&[], 40, 10), "No years to chart.\n");
        assert_eq!(headline(&input, &[]), "After 0 years, your total balance is $5,000");
    }

    #[test]
    fn render_view_follows_view_mode() {
        let mut state = ShellState::default();
        state.set_text(Field::NumberOfYears, "1").expect("valid years");

        let chart = render_view(&state, 30, 6);
        assert!(chart.starts_with("After 1 year, your total balance is $7,000\n\n"));
        assert!(chart.contains("Initial Amount"));

        state.toggle_view_mode();
        state.set_viewport(ViewportClass::Compact);
        let table = render_view(&state, 30, 6);
        assert!(table.contains("STARTING BALANCE"));
        assert!(!table.contains("INTEREST EARNED"));
    }
}
