//! Provider API URLs.

use url::form_urlencoded;

/// Index names understood by the provider.
pub const NIFTY_50: &str = "NIFTY 50";
pub const NIFTY_500: &str = "NIFTY 500";
pub const NIFTY_BANK: &str = "NIFTY BANK";

/// Builds provider URLs under a fixed origin.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Constituents of an index, e.g. `NIFTY 50`.
    pub fn stock_indices(&self, index: &str) -> String {
        format!("{}/api/equity-stockIndices?index={}", self.base, encode(index))
    }

    pub fn quote_equity(&self, symbol: &str) -> String {
        format!("{}/api/quote-equity?symbol={}", self.base, encode(symbol))
    }

    pub fn trade_info(&self, symbol: &str) -> String {
        format!("{}&section=trade_info", self.quote_equity(symbol))
    }

    pub fn historical(&self, symbol: &str) -> String {
        format!("{}/api/historical/cm/equity?symbol={}", self.base, encode(symbol))
    }
}

/// Percent-encode a query component, spaces as `%20`.
fn encode(value: &str) -> String {
    // A literal '+' is emitted as %2B, so every remaining '+' is a space.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_urls() {
        let endpoints = Endpoints::new("https://www.nseindia.com/");
        assert_eq!(
            endpoints.stock_indices(NIFTY_50),
            "https://www.nseindia.com/api/equity-stockIndices?index=NIFTY%2050"
        );
        assert_eq!(
            endpoints.stock_indices(NIFTY_BANK),
            "https://www.nseindia.com/api/equity-stockIndices?index=NIFTY%20BANK"
        );
    }

    #[test]
    fn test_symbol_urls_are_encoded() {
        let endpoints = Endpoints::new("https://www.nseindia.com");
        assert_eq!(
            endpoints.quote_equity("M&M"),
            "https://www.nseindia.com/api/quote-equity?symbol=M%26M"
        );
        assert_eq!(
            endpoints.trade_info("A+B"),
            "https://www.nseindia.com/api/quote-equity?symbol=A%2BB&section=trade_info"
        );
        assert_eq!(
            endpoints.historical("TCS"),
            "https://www.nseindia.com/api/historical/cm/equity?symbol=TCS"
        );
    }
}
