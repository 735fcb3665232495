//! Summary message rendering
//!
//! Fixed plain-text template: greeting, top gainers, top losers, highest
//! prices, closing call-to-action. Percentages and prices-in-base use two
//! decimals; raw unit prices use eight, since most quotes are tiny fractions
//! of the base currency.

use std::fmt::Write;

use crate::types::SummaryRanking;

/// Render the ranked summary into the alert body.
pub fn render_summary(ranking: &SummaryRanking) -> String {
    let mut body = String::new();

    body.push_str("Hello! Here is today's crypto currency summary.\n\n");

    body.push_str("The currencies with the largest increase are:\n\n");
    for (idx, m) in ranking.top_gainers.iter().enumerate() {
        let _ = writeln!(
            body,
            "{}.  {} had an increase of {:.2}% with a price {:.8} {} -> {:.8} {}",
            idx + 1,
            m.currency,
            m.percent_change,
            m.historical_price,
            m.base,
            m.current_price,
            m.base
        );
    }

    body.push_str("\nThe currencies with the smallest increase are:\n\n");
    for (idx, m) in ranking.top_losers.iter().enumerate() {
        let _ = writeln!(
            body,
            "{}.  {} had a change of {:.2}% with a price {:.8} {} -> {:.8} {}",
            idx + 1,
            m.currency,
            m.percent_change,
            m.historical_price,
            m.base,
            m.current_price,
            m.base
        );
    }

    body.push_str("\nThe currencies with the highest prices are:\n\n");
    for (idx, row) in ranking.top_prices.iter().enumerate() {
        let _ = writeln!(
            body,
            "{}.  {} with a price of {:.2} {}",
            idx + 1,
            row.currency,
            row.price,
            row.base
        );
    }

    body.push_str(
        "\nThis is your daily crypto currency recap.\n\n\
         Take a look at your wallet and consider these opportunities to make the most of your holdings.\n\
         Don't miss out on the currencies on the rise!",
    );

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CurrencyAverage, CurrencyMove};

    fn ranking() -> SummaryRanking {
        SummaryRanking {
            top_gainers: vec![CurrencyMove {
                currency: "BTC".to_string(),
                base: "USD".to_string(),
                current_price: 50000.0,
                historical_price: 45000.0,
                percent_change: 11.111111,
            }],
            top_losers: vec![CurrencyMove {
                currency: "ETH".to_string(),
                base: "USD".to_string(),
                current_price: 2400.0,
                historical_price: 2500.0,
                percent_change: -4.0,
            }],
            top_prices: vec![CurrencyAverage {
                currency: "BTC".to_string(),
                base: "USD".to_string(),
                price: 50000.0,
            }],
        }
    }

    #[test]
    fn renders_all_sections_in_order() {
        let body = render_summary(&ranking());

        let greeting = body.find("Hello!").unwrap();
        let gainers = body.find("largest increase").unwrap();
        let losers = body.find("smallest increase").unwrap();
        let prices = body.find("highest prices").unwrap();
        let closing = body.find("daily crypto currency recap").unwrap();

        assert!(greeting < gainers && gainers < losers && losers < prices && prices < closing);
    }

    #[test]
    fn percent_uses_two_decimals_and_unit_prices_eight() {
        let body = render_summary(&ranking());
        assert!(body.contains("11.11%"));
        assert!(body.contains("45000.00000000 USD -> 50000.00000000 USD"));
    }

    #[test]
    fn top_price_uses_two_decimals() {
        let body = render_summary(&ranking());
        assert!(body.contains("1.  BTC with a price of 50000.00 USD"));
    }

    #[test]
    fn negative_change_renders_signed() {
        let body = render_summary(&ranking());
        assert!(body.contains("-4.00%"));
    }

    #[test]
    fn empty_ranking_still_produces_the_template() {
        let body = render_summary(&SummaryRanking::default());
        assert!(body.starts_with("Hello!"));
        assert!(body.contains("largest increase"));
        assert!(body.ends_with("on the rise!"));
    }
}
