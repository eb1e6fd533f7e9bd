//! Turns a graph lookup into a numeric conversion answer.

use fxrate_common::{ConversionDirection, Currency, RateKind, RateQuad, Timestamp};
use rust_decimal::Decimal;

use crate::error::{FxError, FxResult};
use crate::graph::{LegDirection, Lookup, RateGraph, ResolvedLeg};

/// Convert `amount` between two currencies using one source's graph.
///
/// Resolution order and numeric rules:
/// - the graph resolves the pair directly, inversely or through the
///   anchor currency;
/// - `cash`/`remit` pick the sell price on forward legs and the buy
///   price on inverse legs; `middle` has no side and averages what the
///   source published, preferring the remit sub-type;
/// - each leg's price is divided by its quoting unit and inverted for
///   inverse legs; triangulated legs multiply;
/// - `Forward` multiplies the amount by the resolved rate, `Reverse`
///   divides (how many `from` units obtain `amount` units of `to`).
pub fn convert(
    graph: &RateGraph,
    from: Currency,
    to: Currency,
    kind: RateKind,
    amount: Decimal,
    direction: ConversionDirection,
) -> FxResult<Decimal> {
    if from == to {
        return Ok(amount);
    }
    let rate = resolved_rate(graph, from, to, kind)?;
    Ok(match direction {
        ConversionDirection::Forward => amount * rate,
        ConversionDirection::Reverse => amount / rate,
    })
}

/// The unit-scaled, side-selected, direction-corrected rate for a pair.
pub fn resolved_rate(
    graph: &RateGraph,
    from: Currency,
    to: Currency,
    kind: RateKind,
) -> FxResult<Decimal> {
    match graph.lookup(from, to)? {
        Lookup::Single(leg) => leg_rate(&leg, kind),
        Lookup::Triangulated { first, second } => {
            Ok(leg_rate(&first, kind)? * leg_rate(&second, kind)?)
        }
    }
}

/// The observation time backing the pair's resolution.
pub fn updated_date(graph: &RateGraph, from: Currency, to: Currency) -> FxResult<Timestamp> {
    graph.updated_at(from, to)
}

fn leg_rate(leg: &ResolvedLeg, kind: RateKind) -> FxResult<Decimal> {
    let quad = &leg.quad;
    let price = match kind {
        RateKind::Cash | RateKind::Remit => {
            // Forward legs acquire the counter currency from the source,
            // so the source sells; inverse legs swap the side.
            let side = match leg.direction {
                LegDirection::Forward => &quad.sell,
                LegDirection::Inverse => &quad.buy,
            };
            match kind {
                RateKind::Cash => side.cash,
                _ => side.remit,
            }
        }
        RateKind::Middle => middle_price(quad),
    };

    let price = price
        .filter(|p| p.is_sign_positive() && !p.is_zero())
        .ok_or(FxError::RateTypeUnavailable {
            from: quad.from,
            to: quad.to,
            kind,
        })?;

    let mut rate = price / Decimal::from(quad.unit);
    if leg.direction == LegDirection::Inverse {
        rate = Decimal::ONE / rate;
    }
    Ok(rate)
}

/// Mean of the published buy and sell prices of one sub-type, remit
/// before cash. A lone buy or sell price stands for itself.
fn middle_price(quad: &RateQuad) -> Option<Decimal> {
    mean(quad.buy.remit, quad.sell.remit).or_else(|| mean(quad.buy.cash, quad.sell.cash))
}

fn mean(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a + b) / Decimal::TWO),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxrate_common::{time, SidePrices};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn cur(code: &str) -> Currency {
        Currency::new(code).unwrap()
    }

    fn quoted(from: &str, to: &str, buy: SidePrices, sell: SidePrices, unit: u32) -> RateQuad {
        RateQuad::new(cur(from), cur(to), time::now())
            .with_unit(unit)
            .with_buy(buy)
            .with_sell(sell)
    }

    #[test]
    fn test_pinned_unit_scaled_sell_example() {
        // Graph has (CNY -> USD, unit = 100, sell.remit = 705.0); the
        // forward remit conversion of 1000 must use the sell side.
        let graph = RateGraph::new();
        graph.put(quoted(
            "CNY",
            "USD",
            SidePrices::default(),
            SidePrices {
                cash: None,
                remit: Some(dec!(705.0)),
            },
            100,
        ));

        let answer = convert(
            &graph,
            cur("CNY"),
            cur("USD"),
            RateKind::Remit,
            dec!(1000),
            ConversionDirection::Forward,
        )
        .unwrap();
        assert_eq!(answer, dec!(7050));
    }

    #[test]
    fn test_middle_is_exact_mean() {
        let graph = RateGraph::new();
        graph.put(quoted(
            "CNY",
            "USD",
            SidePrices {
                cash: None,
                remit: Some(dec!(1.10)),
            },
            SidePrices {
                cash: None,
                remit: Some(dec!(1.20)),
            },
            1,
        ));

        let rate = resolved_rate(&graph, cur("CNY"), cur("USD"), RateKind::Middle).unwrap();
        assert_eq!(rate, dec!(1.15));
    }

    #[test]
    fn test_middle_prefers_remit_falls_back_to_cash() {
        let graph = RateGraph::new();
        graph.put(quoted(
            "CNY",
            "USD",
            SidePrices::new(dec!(2.0), dec!(1.0)),
            SidePrices::new(dec!(4.0), dec!(3.0)),
            1,
        ));
        // remit mean (1+3)/2, not cash mean (2+4)/2
        assert_eq!(
            resolved_rate(&graph, cur("CNY"), cur("USD"), RateKind::Middle).unwrap(),
            dec!(2.0)
        );

        let cash_only = RateGraph::new();
        cash_only.put(quoted(
            "CNY",
            "HKD",
            SidePrices {
                cash: Some(dec!(2.0)),
                remit: None,
            },
            SidePrices {
                cash: Some(dec!(4.0)),
                remit: None,
            },
            1,
        ));
        assert_eq!(
            resolved_rate(&cash_only, cur("CNY"), cur("HKD"), RateKind::Middle).unwrap(),
            dec!(3.0)
        );
    }

    #[test]
    fn test_inverse_swaps_side_and_inverts() {
        let graph = RateGraph::new();
        graph.put(quoted(
            "CNY",
            "USD",
            SidePrices {
                cash: None,
                remit: Some(dec!(7.0)),
            },
            SidePrices {
                cash: None,
                remit: Some(dec!(7.2)),
            },
            1,
        ));

        // USD -> CNY resolves the stored CNY/USD entry inversely: the
        // buy price is selected, then the rate is inverted.
        let rate = resolved_rate(&graph, cur("USD"), cur("CNY"), RateKind::Remit).unwrap();
        assert_eq!(rate, Decimal::ONE / dec!(7.0));
    }

    #[test]
    fn test_triangulation_is_leg_composition() {
        let graph = RateGraph::new();
        graph.replace_all(vec![
            quoted(
                "CNY",
                "USD",
                SidePrices {
                    cash: None,
                    remit: Some(dec!(7.00)),
                },
                SidePrices {
                    cash: None,
                    remit: Some(dec!(7.05)),
                },
                1,
            ),
            quoted(
                "CNY",
                "HKD",
                SidePrices {
                    cash: None,
                    remit: Some(dec!(0.90)),
                },
                SidePrices {
                    cash: None,
                    remit: Some(dec!(0.91)),
                },
                1,
            ),
            quoted(
                "CNY",
                "JPY",
                SidePrices {
                    cash: None,
                    remit: Some(dec!(0.046)),
                },
                SidePrices {
                    cash: None,
                    remit: Some(dec!(0.047)),
                },
                1,
            ),
        ]);

        let usd_to_hkd =
            resolved_rate(&graph, cur("USD"), cur("HKD"), RateKind::Remit).unwrap();
        let usd_to_cny =
            resolved_rate(&graph, cur("USD"), cur("CNY"), RateKind::Remit).unwrap();
        let cny_to_hkd =
            resolved_rate(&graph, cur("CNY"), cur("HKD"), RateKind::Remit).unwrap();
        assert_eq!(usd_to_hkd, usd_to_cny * cny_to_hkd);
    }

    #[test]
    fn test_rate_type_unavailable() {
        let graph = RateGraph::new();
        graph.put(quoted(
            "CNY",
            "USD",
            SidePrices::default(),
            SidePrices {
                cash: Some(dec!(7.2)),
                remit: None,
            },
            1,
        ));

        let result = convert(
            &graph,
            cur("CNY"),
            cur("USD"),
            RateKind::Remit,
            dec!(100),
            ConversionDirection::Forward,
        );
        assert!(matches!(
            result,
            Err(FxError::RateTypeUnavailable {
                kind: RateKind::Remit,
                ..
            })
        ));

        // Cash is still answerable on the same entry.
        assert!(convert(
            &graph,
            cur("CNY"),
            cur("USD"),
            RateKind::Cash,
            dec!(100),
            ConversionDirection::Forward,
        )
        .is_ok());
    }

    #[test]
    fn test_no_rate_propagates() {
        let graph = RateGraph::new();
        let result = convert(
            &graph,
            cur("EUR"),
            cur("GBP"),
            RateKind::Middle,
            dec!(100),
            ConversionDirection::Forward,
        );
        assert!(matches!(result, Err(FxError::NoRate { .. })));
    }

    #[test]
    fn test_same_currency_is_identity() {
        let graph = RateGraph::new();
        let answer = convert(
            &graph,
            cur("USD"),
            cur("USD"),
            RateKind::Middle,
            dec!(42),
            ConversionDirection::Forward,
        )
        .unwrap();
        assert_eq!(answer, dec!(42));
    }

    #[test]
    fn test_reverse_direction_divides() {
        let graph = RateGraph::new();
        graph.put(quoted(
            "CNY",
            "USD",
            SidePrices::default(),
            SidePrices {
                cash: None,
                remit: Some(dec!(7.05)),
            },
            1,
        ));

        // 7050 CNY are needed to obtain 1000 USD... in quote terms:
        // reverse asks how many `from` units obtain `amount` of `to`.
        let answer = convert(
            &graph,
            cur("CNY"),
            cur("USD"),
            RateKind::Remit,
            dec!(7050),
            ConversionDirection::Reverse,
        )
        .unwrap();
        assert_eq!(answer, dec!(1000));
    }

    proptest! {
        #[test]
        fn prop_forward_then_reverse_round_trips(
            mantissa in 1i64..10_000_000,
            scale in 0u32..5,
            amount_mantissa in 1i64..1_000_000,
            unit in prop::sample::select(vec![1u32, 100]),
        ) {
            let price = Decimal::new(mantissa, scale);
            let amount = Decimal::new(amount_mantissa, 2);

            let graph = RateGraph::new();
            graph.put(quoted(
                "CNY",
                "USD",
                SidePrices::default(),
                SidePrices { cash: None, remit: Some(price) },
                unit,
            ));

            let forward = convert(
                &graph,
                cur("CNY"),
                cur("USD"),
                RateKind::Remit,
                amount,
                ConversionDirection::Forward,
            ).unwrap();
            let back = convert(
                &graph,
                cur("CNY"),
                cur("USD"),
                RateKind::Remit,
                forward,
                ConversionDirection::Reverse,
            ).unwrap();

            let tolerance = amount * dec!(0.0000000001);
            prop_assert!((back - amount).abs() <= tolerance);
        }
    }
}
