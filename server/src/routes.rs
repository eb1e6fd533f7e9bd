//! HTTP routing for the fxrate service.
//!
//! Maps the registry and conversion engine onto the public path shape:
//! `/info`, `/{source}`, `/{source}/{from}`, `/{source}/{from}/{to}`
//! and `/{source}/{from}/{to}/{kind}[/{amount}]`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use fxrate_common::{time, ConversionDirection, Currency, RateKind};
use fxrate_fx::{convert, updated_date, FxError, FxResult, RateGraph, Registry};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/info", get(info))
        .route("/{source}", get(source_listing))
        .route("/{source}/{from}", get(from_details))
        .route("/{source}/{from}/{to}", get(pair_details))
        .route("/{source}/{from}/{to}/{kind}", get(convert_pair))
        .route("/{source}/{from}/{to}/{kind}/{amount}", get(convert_pair_amount))
        .with_state(state)
}

/// Boundary-visible failure, mapped onto HTTP statuses.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    BadRequest(String),
    Upstream(String),
}

impl From<FxError> for ApiError {
    fn from(err: FxError) -> Self {
        match err {
            FxError::UnknownSource(_)
            | FxError::NoRate { .. }
            | FxError::RateTypeUnavailable { .. } => ApiError::NotFound,
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Upstream(message) => {
                warn!(error = %message, "Upstream failure surfaced to caller");
                (StatusCode::BAD_GATEWAY, "502 Bad Gateway").into_response()
            }
        }
    }
}

/// Query parameters shared by conversion routes.
#[derive(Debug, Default, Deserialize)]
pub struct ConvertQuery {
    amount: Option<Decimal>,
    precision: Option<i32>,
    /// Presence alone selects reverse direction.
    reverse: Option<String>,
}

impl ConvertQuery {
    fn direction(&self) -> ConversionDirection {
        if self.reverse.is_some() {
            ConversionDirection::Reverse
        } else {
            ConversionDirection::Forward
        }
    }
}

#[derive(Serialize)]
struct InfoResponse {
    status: &'static str,
    sources: Vec<String>,
    version: String,
    #[serde(rename = "apiVersion")]
    api_version: &'static str,
    environment: String,
}

#[derive(Serialize)]
struct SourceListing {
    status: &'static str,
    source: String,
    currency: Vec<String>,
    date: String,
}

#[derive(Serialize)]
struct PairDetails {
    updated: String,
    cash: Value,
    remit: Value,
    middle: Value,
}

async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        status: "ok",
        sources: state.registry.sources(),
        version: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        api_version: "v1",
        environment: std::env::var("FXRATE_ENV").unwrap_or_else(|_| "development".to_string()),
    })
}

async fn source_listing(
    State(state): State<AppState>,
    Path(source): Path<String>,
) -> Result<Response, ApiError> {
    let graph = state.registry.ensure_fresh(&source).await?;
    let currency = graph
        .currencies()
        .into_iter()
        .map(|c| c.code().to_string())
        .collect();

    let listing = SourceListing {
        status: "ok",
        source,
        currency,
        date: time::http_date(time::now()),
    };
    Ok(([(header::DATE, time::http_date(time::now()))], Json(listing)).into_response())
}

async fn from_details(
    State(state): State<AppState>,
    Path((source, from)): Path<(String, String)>,
    Query(query): Query<ConvertQuery>,
) -> Result<Response, ApiError> {
    let graph = state.registry.ensure_fresh(&source).await?;
    let from = parse_currency(&from)?;

    let counters = graph.counter_currencies(from);
    if counters.is_empty() {
        return Err(ApiError::NotFound);
    }

    let mut result = BTreeMap::new();
    for to in counters {
        result.insert(to.code().to_string(), pair_details_body(&graph, from, to, &query)?);
    }
    Ok(Json(result).into_response())
}

async fn pair_details(
    State(state): State<AppState>,
    Path((source, from, to)): Path<(String, String, String)>,
    Query(query): Query<ConvertQuery>,
) -> Result<Response, ApiError> {
    let graph = state.registry.ensure_fresh(&source).await?;
    let from = parse_currency(&from)?;
    let to = parse_currency(&to)?;

    let details = pair_details_body(&graph, from, to, &query)?;
    let updated = updated_date(&graph, from, to)?;
    Ok(([(header::DATE, time::http_date(updated))], Json(details)).into_response())
}

async fn convert_pair(
    State(state): State<AppState>,
    Path((source, from, to, kind)): Path<(String, String, String, String)>,
    Query(query): Query<ConvertQuery>,
) -> Result<Response, ApiError> {
    convert_response(&state, &source, &from, &to, &kind, Decimal::ONE_HUNDRED, query).await
}

async fn convert_pair_amount(
    State(state): State<AppState>,
    Path((source, from, to, kind, amount)): Path<(String, String, String, String, String)>,
    Query(query): Query<ConvertQuery>,
) -> Result<Response, ApiError> {
    let amount = amount
        .parse::<Decimal>()
        .map_err(|e| ApiError::BadRequest(format!("invalid amount: {}", e)))?;
    convert_response(&state, &source, &from, &to, &kind, amount, query).await
}

async fn convert_response(
    state: &AppState,
    source: &str,
    from: &str,
    to: &str,
    kind: &str,
    default_amount: Decimal,
    query: ConvertQuery,
) -> Result<Response, ApiError> {
    let graph = state.registry.ensure_fresh(source).await?;
    let from = parse_currency(from)?;
    let to = parse_currency(to)?;
    let kind = parse_kind(kind)?;

    let answer = run_convert(&graph, from, to, kind, &query, default_amount)?;
    let rounded = apply_precision(answer, query.precision);
    let updated = updated_date(&graph, from, to)?;

    Ok((
        [(header::DATE, time::http_date(updated))],
        rounded.normalize().to_string(),
    )
        .into_response())
}

/// One aggregate details object; per-kind failures render as `false`
/// while the other kinds still answer.
fn pair_details_body(
    graph: &RateGraph,
    from: Currency,
    to: Currency,
    query: &ConvertQuery,
) -> Result<PairDetails, ApiError> {
    let updated = updated_date(graph, from, to)?;

    let value_for = |kind: RateKind| -> Value {
        match run_convert(graph, from, to, kind, query, Decimal::ONE_HUNDRED) {
            Ok(answer) => decimal_json(apply_precision(answer, query.precision)),
            Err(_) => Value::Bool(false),
        }
    };

    Ok(PairDetails {
        updated: time::http_date(updated),
        cash: value_for(RateKind::Cash),
        remit: value_for(RateKind::Remit),
        middle: value_for(RateKind::Middle),
    })
}

fn run_convert(
    graph: &RateGraph,
    from: Currency,
    to: Currency,
    kind: RateKind,
    query: &ConvertQuery,
    default_amount: Decimal,
) -> FxResult<Decimal> {
    let amount = query.amount.unwrap_or(default_amount);
    convert(graph, from, to, kind, amount, query.direction())
}

/// Display rounding: five digits by default, `-1` disables.
fn apply_precision(value: Decimal, precision: Option<i32>) -> Decimal {
    match precision.unwrap_or(5) {
        -1 => value,
        digits if digits >= 0 => value.round_dp(digits.min(28) as u32),
        _ => value,
    }
}

fn decimal_json(value: Decimal) -> Value {
    value
        .normalize()
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.normalize().to_string()))
}

fn parse_currency(code: &str) -> Result<Currency, ApiError> {
    code.parse()
        .map_err(|e: fxrate_common::InvalidCurrency| ApiError::BadRequest(e.to_string()))
}

fn parse_kind(kind: &str) -> Result<RateKind, ApiError> {
    kind.parse()
        .map_err(|e: fxrate_common::InvalidRateKind| ApiError::BadRequest(e.to_string()))
}
