//! fxrate Source Adapters
//!
//! One adapter per bank endpoint, each translating the bank's JSON
//! into canonical rate records. Adapters are thin I/O shims; every
//! shared invariant lives in `fxrate-fx`.

pub mod hsbc_cn;
pub mod hsbc_hk;

pub use hsbc_cn::HsbcCn;
pub use hsbc_hk::HsbcHk;

use rust_decimal::Decimal;

pub(crate) const USER_AGENT: &str = concat!("fxrate reqwest/", env!("CARGO_PKG_VERSION"));

/// Parse a quoted price field, dropping blank, unparsable or
/// non-positive values.
pub(crate) fn parse_price(raw: Option<String>) -> Option<Decimal> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<Decimal>().ok())
        .filter(|price| price.is_sign_positive() && !price.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(Some("7.05".into())), Some(dec!(7.05)));
        assert_eq!(parse_price(Some(" 705.0 ".into())), Some(dec!(705.0)));
        assert_eq!(parse_price(Some("".into())), None);
        assert_eq!(parse_price(Some("-".into())), None);
        assert_eq!(parse_price(Some("0".into())), None);
        assert_eq!(parse_price(Some("-1.2".into())), None);
        assert_eq!(parse_price(None), None);
    }
}
