//! HSBC Hong Kong adapter.
//!
//! Scrapes the exchange-rate endpoint; every row is quoted
//! foreign -> HKD, with each of the four prices optional per row.

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::warn;

use fxrate_common::{time, Currency, RateQuad, SidePrices, Timestamp};
use fxrate_fx::{RateSource, SourceError};

use crate::{parse_price, USER_AGENT};

const ENDPOINT: &str = "https://rbwm-api.hsbc.com.hk/digital-pws-tools-investments-eapi-prod-proxy/v1/investments/exchange-rate?locale=en_HK";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HkResponse {
    detail_rates: Vec<HkRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HkRow {
    ccy: String,
    tt_buy_rt: Option<String>,
    bank_buy_rt: Option<String>,
    tt_sel_rt: Option<String>,
    bank_sell_rt: Option<String>,
    last_update_date: Option<String>,
}

/// Adapter for HSBC Hong Kong's published exchange rates.
pub struct HsbcHk {
    client: reqwest::Client,
}

impl HsbcHk {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HsbcHk {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateSource for HsbcHk {
    fn name(&self) -> &str {
        "hsbc.hk"
    }

    async fn fetch(&self) -> Result<Vec<RateQuad>, SourceError> {
        let response: HkResponse = self
            .client
            .get(ENDPOINT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| SourceError::new(e.to_string()))?
            .error_for_status()
            .map_err(|e| SourceError::new(e.to_string()))?
            .json()
            .await
            .map_err(|e| SourceError::new(e.to_string()))?;

        Ok(parse_rows(response.detail_rates))
    }
}

fn parse_rows(rows: Vec<HkRow>) -> Vec<RateQuad> {
    let captured_at = time::now();

    rows.into_iter()
        .filter_map(|row| {
            let from = match Currency::new(&row.ccy) {
                Ok(currency) => currency,
                Err(err) => {
                    warn!(error = %err, "Skipping HSBC HK row");
                    return None;
                }
            };
            let observed_at = parse_update_date(row.last_update_date.as_deref(), captured_at);
            let quad = RateQuad::new(from, Currency::hkd(), observed_at)
                .with_buy(SidePrices {
                    cash: parse_price(row.bank_buy_rt),
                    remit: parse_price(row.tt_buy_rt),
                })
                .with_sell(SidePrices {
                    cash: parse_price(row.bank_sell_rt),
                    remit: parse_price(row.tt_sel_rt),
                });
            if !quad.is_quoted() {
                warn!(pair = %quad, "Skipping HSBC HK row with no prices");
                return None;
            }
            Some(quad)
        })
        .collect()
}

/// The endpoint's update stamp, falling back to capture time when the
/// field is absent or in an unexpected shape.
fn parse_update_date(raw: Option<&str>, fallback: Timestamp) -> Timestamp {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or(fallback)
}
