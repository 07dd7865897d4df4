use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    Inputs, Milestone, PROJECTION_HORIZON_YEARS, RateTable, SimulationResult, TableEpoch,
    VoluntaryPayment, YearlyRecord, project,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// Sanity ceiling for monetary inputs; anything above is a typo, not a loan.
const AMOUNT_CEILING: f64 = 10_000_000.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliTableEpoch {
    Ty2023,
    Ty2024_25,
}

impl From<CliTableEpoch> for TableEpoch {
    fn from(value: CliTableEpoch) -> Self {
        match value {
            CliTableEpoch::Ty2023 => TableEpoch::Ty2023,
            CliTableEpoch::Ty2024_25 => TableEpoch::Ty2024_25,
        }
    }
}

impl From<TableEpoch> for CliTableEpoch {
    fn from(value: TableEpoch) -> Self {
        match value {
            TableEpoch::Ty2023 => CliTableEpoch::Ty2023,
            TableEpoch::Ty2024_25 => CliTableEpoch::Ty2024_25,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    current_debt: Option<f64>,
    annual_income: Option<f64>,
    #[serde(alias = "salaryGrowthRate")]
    expected_salary_increase: Option<f64>,
    indexation_rate: Option<f64>,
    rate_table: Option<TableEpoch>,
    voluntary_payment_year: Option<u32>,
    voluntary_payment_amount: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "hecs",
    about = "HECS-HELP repayment projector (income-tiered repayments, annual indexation)"
)]
struct Cli {
    #[arg(long, help = "Current HECS-HELP loan balance")]
    current_debt: f64,
    #[arg(long, help = "Annual income before tax")]
    annual_income: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Expected annual salary increase in percent"
    )]
    expected_salary_increase: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliTableEpoch::Ty2024_25,
        help = "Repayment threshold table to apply"
    )]
    rate_table: CliTableEpoch,
    #[arg(
        long,
        help = "Annual indexation rate in percent; defaults to the table's published rate"
    )]
    indexation_rate: Option<f64>,
    #[arg(
        long,
        help = "Projection year (1-based) of a one-off voluntary payment; required with --voluntary-payment-amount"
    )]
    voluntary_payment_year: Option<u32>,
    #[arg(
        long,
        help = "One-off voluntary payment amount; required with --voluntary-payment-year"
    )]
    voluntary_payment_amount: Option<f64>,
}

#[derive(Debug)]
struct ProjectRequest {
    inputs: Inputs,
    epoch: TableEpoch,
    indexation_rate: f64,
}

/// Flattened summary of a submitted calculation, in the shape the persistence
/// collaborator stores. Included in every response so storing it never needs
/// the full result.
#[derive(Debug, Serialize)]
struct SubmissionRecord {
    current_debt: f64,
    annual_income: f64,
    expected_salary_increase: f64,
    voluntary_payment_year: Option<u32>,
    voluntary_payment_amount: Option<f64>,
    years_to_repay: u32,
    total_interest: f64,
    total_repayments: f64,
}

impl SubmissionRecord {
    fn new(inputs: &Inputs, result: &SimulationResult) -> Self {
        Self {
            current_debt: inputs.current_debt,
            annual_income: inputs.annual_income,
            expected_salary_increase: inputs.salary_growth_rate,
            voluntary_payment_year: inputs.voluntary_payment.map(|vp| vp.year),
            voluntary_payment_amount: inputs.voluntary_payment.map(|vp| vp.amount),
            years_to_repay: result.years_to_repay,
            total_interest: result.total_indexation_accrued,
            total_repayments: result.total_repaid,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse {
    rate_table: TableEpoch,
    indexation_rate: f64,
    initial_repayment_rate: f64,
    initial_annual_repayment: f64,
    initial_weekly_repayment: f64,
    years_to_repay: u32,
    projected_balance_next_period: f64,
    total_indexation_accrued: f64,
    total_repaid: f64,
    yearly_records: Vec<YearlyRecord>,
    milestones: Vec<Milestone>,
    submission: SubmissionRecord,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_request(cli: Cli) -> Result<ProjectRequest, String> {
    if !cli.current_debt.is_finite() || cli.current_debt < 0.0 {
        return Err("--current-debt must be >= 0".to_string());
    }
    if cli.current_debt > AMOUNT_CEILING {
        return Err(format!("--current-debt must not exceed {AMOUNT_CEILING}"));
    }

    if !cli.annual_income.is_finite() || cli.annual_income < 0.0 {
        return Err("--annual-income must be >= 0".to_string());
    }
    if cli.annual_income > AMOUNT_CEILING {
        return Err(format!("--annual-income must not exceed {AMOUNT_CEILING}"));
    }

    if !(0.0..=100.0).contains(&cli.expected_salary_increase) {
        return Err("--expected-salary-increase must be between 0 and 100".to_string());
    }

    let epoch = TableEpoch::from(cli.rate_table);
    let indexation_rate = cli
        .indexation_rate
        .unwrap_or_else(|| epoch.default_indexation_rate());
    if !(0.0..=100.0).contains(&indexation_rate) {
        return Err("--indexation-rate must be between 0 and 100".to_string());
    }

    let voluntary_payment = match (cli.voluntary_payment_year, cli.voluntary_payment_amount) {
        (None, None) => None,
        (Some(year), Some(amount)) => {
            if year == 0 || year > PROJECTION_HORIZON_YEARS {
                return Err(format!(
                    "--voluntary-payment-year must be between 1 and {PROJECTION_HORIZON_YEARS}"
                ));
            }
            if !amount.is_finite() || amount <= 0.0 {
                return Err("--voluntary-payment-amount must be > 0".to_string());
            }
            if amount > cli.current_debt {
                return Err(
                    "--voluntary-payment-amount cannot exceed --current-debt".to_string(),
                );
            }
            Some(VoluntaryPayment { year, amount })
        }
        _ => {
            return Err(
                "--voluntary-payment-year and --voluntary-payment-amount must be provided together"
                    .to_string(),
            );
        }
    };

    Ok(ProjectRequest {
        inputs: Inputs {
            current_debt: cli.current_debt,
            annual_income: cli.annual_income,
            salary_growth_rate: cli.expected_salary_increase,
            voluntary_payment,
        },
        epoch,
        indexation_rate,
    })
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("HECS HTTP API listening on http://{addr}");
    log::info!("Local access: http://127.0.0.1:{port}/");

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

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let request = match request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => {
            log::debug!("rejected projection request: {msg}");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };

    let table = RateTable::for_epoch(request.epoch);
    let result = project(&request.inputs, &table, request.indexation_rate);
    json_response(StatusCode::OK, build_project_response(&request, result))
}

fn build_project_response(request: &ProjectRequest, result: SimulationResult) -> ProjectResponse {
    let submission = SubmissionRecord::new(&request.inputs, &result);
    ProjectResponse {
        rate_table: request.epoch,
        indexation_rate: request.indexation_rate,
        initial_repayment_rate: result.initial_repayment_rate,
        initial_annual_repayment: result.initial_annual_repayment,
        initial_weekly_repayment: result.initial_weekly_repayment,
        years_to_repay: result.years_to_repay,
        projected_balance_next_period: result.projected_balance_next_period,
        total_indexation_accrued: result.total_indexation_accrued,
        total_repaid: result.total_repaid,
        yearly_records: result.yearly_records,
        milestones: result.milestones,
        submission,
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
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
fn request_from_json(json: &str) -> Result<ProjectRequest, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    request_from_payload(payload)
}

fn request_from_payload(payload: ProjectPayload) -> Result<ProjectRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_debt {
        cli.current_debt = v;
    }
    if let Some(v) = payload.annual_income {
        cli.annual_income = v;
    }
    if let Some(v) = payload.expected_salary_increase {
        cli.expected_salary_increase = v;
    }
    if let Some(v) = payload.indexation_rate {
        cli.indexation_rate = Some(v);
    }
    if let Some(v) = payload.rate_table {
        cli.rate_table = v.into();
    }
    if let Some(v) = payload.voluntary_payment_year {
        cli.voluntary_payment_year = Some(v);
    }
    if let Some(v) = payload.voluntary_payment_amount {
        cli.voluntary_payment_amount = Some(v);
    }

    build_request(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_debt: 30_000.0,
        annual_income: 70_000.0,
        expected_salary_increase: 3.0,
        rate_table: CliTableEpoch::Ty2024_25,
        indexation_rate: None,
        voluntary_payment_year: None,
        voluntary_payment_amount: None,
    }
}
