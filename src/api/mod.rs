use axum::{
    Router,
    extract::{Json, Query, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{ContributionFrequency, ProjectionInput, YearSnapshot, project};
use crate::shell::render::{
    StackedPoint, TableView, build_table, chart_series, chart_tooltip, final_balance, headline,
    render_chart, render_table,
};
use crate::shell::session::run_session;
use crate::shell::{
    DEFAULT_ANNUAL_RATE_PERCENT, DEFAULT_INITIAL_AMOUNT, DEFAULT_NUMBER_OF_YEARS,
    DEFAULT_PERIODIC_CONTRIBUTION, Field, InputError, ShellState, ViewMode, ViewportClass,
    check_field, parse_field, parse_frequency,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliFrequency {
    Monthly,
    Annually,
}

impl From<CliFrequency> for ContributionFrequency {
    fn from(value: CliFrequency) -> Self {
        match value {
            CliFrequency::Monthly => ContributionFrequency::Monthly,
            CliFrequency::Annually => ContributionFrequency::Annually,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliViewport {
    Wide,
    Compact,
}

impl From<CliViewport> for ViewportClass {
    fn from(value: CliViewport) -> Self {
        match value {
            CliViewport::Wide => ViewportClass::Wide,
            CliViewport::Compact => ViewportClass::Compact,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliView {
    Chart,
    Table,
}

impl From<CliView> for ViewMode {
    fn from(value: CliView) -> Self {
        match value {
            CliView::Chart => ViewMode::Chart,
            CliView::Table => ViewMode::Table,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "compound",
    about = "Compound interest calculator (initial amount + periodic contributions + annual return)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print one projection and exit
    Project(ProjectArgs),
    /// Adjust inputs line by line and watch the projection update
    Interactive(ProjectionArgs),
    /// Serve the calculator page and JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ProjectionArgs {
    #[arg(long, default_value_t = DEFAULT_INITIAL_AMOUNT, help = "The amount you start with")]
    pub initial_amount: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_PERIODIC_CONTRIBUTION,
        help = "How much you add to your investment each period"
    )]
    pub contribution: f64,
    #[arg(long, value_enum, default_value_t = CliFrequency::Monthly)]
    pub frequency: CliFrequency,
    #[arg(
        long,
        default_value_t = DEFAULT_ANNUAL_RATE_PERCENT,
        allow_negative_numbers = true,
        help = "Annual rate of return in percent, e.g. 4"
    )]
    pub rate_of_return: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_NUMBER_OF_YEARS,
        allow_negative_numbers = true,
        help = "Number of years to grow"
    )]
    pub years: i32,
    #[arg(
        long,
        value_enum,
        default_value_t = CliViewport::Wide,
        help = "Table layout: every column, or year / starting / total only"
    )]
    pub viewport: CliViewport,
}

#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub inputs: ProjectionArgs,
    #[arg(long, value_enum, default_value_t = CliView::Table)]
    pub view: CliView,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[arg(long, default_value_t = 60)]
    pub chart_width: usize,
    #[arg(long, default_value_t = 12)]
    pub chart_height: usize,
}

/// A field sent either as a JSON number or as the raw text of an input box.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    fn parse(&self, field: Field) -> Result<f64, InputError> {
        match self {
            FieldValue::Number(v) => check_field(field, *v),
            FieldValue::Text(text) => parse_field(field, text),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectionPayload {
    initial_amount: Option<FieldValue>,
    #[serde(alias = "contributions", alias = "contribution")]
    periodic_contribution: Option<FieldValue>,
    #[serde(alias = "frequency")]
    contribution_frequency: Option<String>,
    #[serde(alias = "rateOfReturn")]
    annual_rate_percent: Option<FieldValue>,
    #[serde(alias = "yearsOfGrowth", alias = "years")]
    number_of_years: Option<FieldValue>,
    viewport: Option<String>,
}

#[derive(Debug)]
struct ApiRequest {
    input: ProjectionInput,
    viewport: ViewportClass,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionResponse {
    input: ProjectionInput,
    viewport: ViewportClass,
    headline: String,
    final_balance: f64,
    years: Vec<YearSnapshot>,
    chart: Vec<StackedPoint>,
    tooltips: Vec<String>,
    table: TableView,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Flags follow the same boundary rules as typed values: negatives clamp to
/// zero, overflowing or non-finite values are rejected.
fn build_input(args: &ProjectionArgs) -> Result<ProjectionInput, String> {
    let initial_amount = check_field(Field::InitialAmount, args.initial_amount)
        .map_err(|e| format!("--initial-amount: {e}"))?;
    let periodic_contribution = check_field(Field::PeriodicContribution, args.contribution)
        .map_err(|e| format!("--contribution: {e}"))?;
    let annual_rate_percent = check_field(Field::AnnualRate, args.rate_of_return)
        .map_err(|e| format!("--rate-of-return: {e}"))?;
    let number_of_years = check_field(Field::NumberOfYears, f64::from(args.years))
        .map_err(|e| format!("--years: {e}"))?;

    Ok(ProjectionInput {
        initial_amount,
        periodic_contribution,
        contribution_frequency: args.frequency.into(),
        annual_rate_percent,
        number_of_years: number_of_years as i32,
    })
}

fn default_args_for_api() -> ProjectionArgs {
    ProjectionArgs {
        initial_amount: DEFAULT_INITIAL_AMOUNT,
        contribution: DEFAULT_PERIODIC_CONTRIBUTION,
        frequency: CliFrequency::Monthly,
        rate_of_return: DEFAULT_ANNUAL_RATE_PERCENT,
        years: DEFAULT_NUMBER_OF_YEARS,
        viewport: CliViewport::Wide,
    }
}

fn build_projection_response(input: &ProjectionInput, viewport: ViewportClass) -> ProjectionResponse {
    let years = project(input);
    let chart = chart_series(input, &years);
    ProjectionResponse {
        input: *input,
        viewport,
        headline: headline(input, &years),
        final_balance: final_balance(input, &years),
        tooltips: chart.iter().map(chart_tooltip).collect(),
        chart,
        table: build_table(&years, viewport),
        years,
    }
}

pub fn run_project_command(args: &ProjectArgs) -> Result<(), String> {
    let input = build_input(&args.inputs)?;
    let viewport: ViewportClass = args.inputs.viewport.into();
    let response = build_projection_response(&input, viewport);

    let text = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&response)
            .map_err(|e| format!("Failed to serialize projection: {e}"))?,
        OutputFormat::Text => {
            let view = match ViewMode::from(args.view) {
                ViewMode::Chart => render_chart(&response.chart, args.chart_width, args.chart_height),
                ViewMode::Table => render_table(&response.table),
            };
            format!("{}\n\n{view}", response.headline)
        }
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", text.trim_end()).map_err(|e| format!("Failed to write output: {e}"))
}

pub fn run_interactive(args: &ProjectionArgs) -> Result<(), String> {
    let input = build_input(args)?;
    let mut state = ShellState::new(input);
    state.set_viewport(args.viewport.into());

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    run_session(&mut state, stdin.lock(), &mut stdout)
        .map_err(|e| format!("Interactive session failed: {e}"))
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/projection",
            get(projection_get_handler).post(projection_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("compound interest calculator listening on http://{addr}");
    log::info!("local access: http://127.0.0.1:{port}/");
    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn projection_get_handler(Query(payload): Query<ProjectionPayload>) -> Response {
    projection_handler_impl(payload)
}

async fn projection_post_handler(
    payload: Result<Json<ProjectionPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => projection_handler_impl(payload),
        Err(rejection) => {
            let msg = format!("Invalid API JSON payload: {}", rejection.body_text());
            log::warn!("rejected projection request: {msg}");
            error_response(rejection.status(), &msg)
        }
    }
}

fn projection_handler_impl(payload: ProjectionPayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            log::warn!("rejected projection request: {msg}");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    log::debug!("projection request {:?}", request.input);
    let response = build_projection_response(&request.input, request.viewport);
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ProjectionPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: ProjectionPayload) -> Result<ApiRequest, String> {
    let mut args = default_args_for_api();
    let mut viewport = ViewportClass::Wide;

    if let Some(v) = payload.initial_amount {
        args.initial_amount = v.parse(Field::InitialAmount).map_err(|e| e.to_string())?;
    }
    if let Some(v) = payload.periodic_contribution {
        args.contribution = v
            .parse(Field::PeriodicContribution)
            .map_err(|e| e.to_string())?;
    }
    if let Some(v) = payload.contribution_frequency {
        args.frequency = match parse_frequency(&v).map_err(|e| e.to_string())? {
            ContributionFrequency::Monthly => CliFrequency::Monthly,
            ContributionFrequency::Annually => CliFrequency::Annually,
        };
    }
    if let Some(v) = payload.annual_rate_percent {
        args.rate_of_return = v.parse(Field::AnnualRate).map_err(|e| e.to_string())?;
    }
    if let Some(v) = payload.number_of_years {
        args.years = v.parse(Field::NumberOfYears).map_err(|e| e.to_string())? as i32;
    }
    if let Some(v) = payload.viewport {
        viewport = v.parse().map_err(|e: InputError| e.to_string())?;
    }

    let input = build_input(&args)?;
    Ok(ApiRequest { input, viewport })
}
