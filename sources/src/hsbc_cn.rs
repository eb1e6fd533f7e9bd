//! HSBC China adapter.
//!
//! Scrapes the CNY remittance-rate endpoint; every row is quoted
//! CNY -> foreign with cash (notes) and remit (transfer) prices.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use fxrate_common::{time, Currency, RateQuad, SidePrices};
use fxrate_fx::{RateSource, SourceError};

use crate::{parse_price, USER_AGENT};

const ENDPOINT: &str = "https://www.services.cn-banking.hsbc.com.cn/mobile/channel/digital-proxy/cnyTransfer/ratesInfo/remittanceRate?locale=en_CN";

#[derive(Debug, Deserialize)]
struct CnResponse {
    data: CnData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CnData {
    counter_for_repeating_block: Vec<CnRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CnRow {
    exchange_rate_currency: String,
    notes_buying_rate: Option<String>,
    notes_selling_rate: Option<String>,
    transfer_buying_rate: Option<String>,
    transfer_selling_rate: Option<String>,
}

/// Adapter for HSBC China's published remittance rates.
pub struct HsbcCn {
    client: reqwest::Client,
}

impl HsbcCn {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HsbcCn {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateSource for HsbcCn {
    fn name(&self) -> &str {
        "hsbc.cn"
    }

    async fn fetch(&self) -> Result<Vec<RateQuad>, SourceError> {
        let response: CnResponse = self
            .client
            .get(ENDPOINT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::new(e.to_string()))?
            .error_for_status()
            .map_err(|e| SourceError::new(e.to_string()))?
            .json()
            .await
            .map_err(|e| SourceError::new(e.to_string()))?;

        Ok(parse_rows(response.data.counter_for_repeating_block))
    }
}

fn parse_rows(rows: Vec<CnRow>) -> Vec<RateQuad> {
    // The endpoint carries no per-row timestamp; use capture time.
    let observed_at = time::now();

    rows.into_iter()
        .filter_map(|row| {
            let to = match Currency::new(&row.exchange_rate_currency) {
                Ok(currency) => currency,
                Err(err) => {
                    warn!(error = %err, "Skipping HSBC CN row");
                    return None;
                }
            };
            let quad = RateQuad::new(Currency::cny(), to, observed_at)
                .with_buy(SidePrices {
                    cash: parse_price(row.notes_buying_rate),
                    remit: parse_price(row.transfer_buying_rate),
                })
                .with_sell(SidePrices {
                    cash: parse_price(row.notes_selling_rate),
                    remit: parse_price(row.transfer_selling_rate),
                });
            if !quad.is_quoted() {
                warn!(pair = %quad, "Skipping HSBC CN row with no prices");
                return None;
            }
            Some(quad)
        })
        .collect()
}
