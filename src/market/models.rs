//! Downstream shapes built from provider payloads.
//!
//! Provider payloads are loosely typed: fields go missing, numbers arrive as
//! strings, `data` is sometimes absent. Mapping never fails on a single row;
//! missing or unusable values become `0` / `""`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::market::status::{exchange_timestamp, MarketStatus};
use crate::upstream::endpoints::NIFTY_BANK;

/// One constituent of an index, as served by `/api/nifty` and `/api/banknifty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRow {
    pub symbol: String,
    pub identifier: String,
    pub last_price: Number,
    pub change: Number,
    pub p_change: Number,
    pub open: Number,
    pub day_high: Number,
    pub day_low: Number,
    pub previous_close: Number,
    pub total_traded_volume: Number,
    pub total_traded_value: Number,
    pub year_high: Number,
    pub year_low: Number,
    #[serde(rename = "perChange365d")]
    pub per_change_365d: Number,
    #[serde(rename = "perChange30d")]
    pub per_change_30d: Number,
    pub last_update_time: String,
}

impl StockRow {
    fn from_row(row: &Value) -> Self {
        let f = Fields(row);
        let last_update_time = match f.text("lastUpdateTime") {
            t if t.is_empty() => exchange_timestamp(),
            t => t,
        };
        Self {
            symbol: f.text("symbol"),
            identifier: f.text("identifier"),
            last_price: f.number("lastPrice"),
            change: f.number("change"),
            p_change: f.number("pChange"),
            open: f.number("open"),
            day_high: f.number("dayHigh"),
            day_low: f.number("dayLow"),
            previous_close: f.number("previousClose"),
            total_traded_volume: f.number("totalTradedVolume"),
            total_traded_value: f.number("totalTradedValue"),
            year_high: f.number("yearHigh"),
            year_low: f.number("yearLow"),
            per_change_365d: f.number("perChange365d"),
            per_change_30d: f.number("perChange30d"),
            last_update_time,
        }
    }
}

/// Map an index payload to stock rows. A payload without a `data` array maps to `[]`.
pub fn stock_rows(payload: &Value) -> Vec<StockRow> {
    data_rows(payload)
        .map(|rows| rows.iter().map(StockRow::from_row).collect())
        .unwrap_or_default()
}

/// Simplified Bank Nifty constituent served by `/api/banknifty-stocks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankNiftyStock {
    pub symbol: String,
    pub open: Number,
    pub high: Number,
    pub low: Number,
    pub pre_close: Number,
    pub last_price: Number,
    pub change: Number,
    pub p_change: Number,
    pub volume: Number,
    pub indices: Vec<String>,
}

/// `None` when the payload has no `data` array.
pub fn bank_nifty_stocks(payload: &Value) -> Option<Vec<BankNiftyStock>> {
    let rows = data_rows(payload)?;
    Some(
        rows.iter()
            .map(|row| {
                let f = Fields(row);
                BankNiftyStock {
                    symbol: f.text("symbol"),
                    open: f.number("open"),
                    high: f.number("dayHigh"),
                    low: f.number("dayLow"),
                    pre_close: f.number("previousClose"),
                    last_price: f.number("lastPrice"),
                    change: f.number("change"),
                    p_change: f.number("pChange"),
                    volume: f.number("totalTradedVolume"),
                    indices: vec![NIFTY_BANK.to_string()],
                }
            })
            .collect(),
    )
}

/// One daily bar for charting. Prices that do not parse are `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: Value,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
}

/// `None` when the payload has no `data` array.
pub fn candles(payload: &Value) -> Option<Vec<Candle>> {
    let rows = data_rows(payload)?;
    Some(
        rows.iter()
            .map(|row| {
                let f = Fields(row);
                Candle {
                    date: row.get("CH_TIMESTAMP").cloned().unwrap_or(Value::Null),
                    open: f.float("CH_OPENING_PRICE"),
                    high: f.float("CH_TRADE_HIGH_PRICE"),
                    low: f.float("CH_TRADE_LOW_PRICE"),
                    close: f.float("CH_CLOSING_PRICE"),
                }
            })
            .collect(),
    )
}

/// Quote merged with its trade-info section under `tradeInfo`.
pub fn stock_details(quote: Value, trade_info: Value) -> Value {
    let mut merged = match quote {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    merged.insert("tradeInfo".to_string(), trade_info);
    Value::Object(merged)
}

/// Zeroed headline snapshot used when an index cannot be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    pub symbol: String,
    pub last_price: f64,
    pub change: f64,
    pub p_change: f64,
    pub open: f64,
    pub day_high: f64,
    pub day_low: f64,
    pub previous_close: f64,
    pub year_high: f64,
    pub year_low: f64,
    pub total_traded_volume: f64,
    pub total_traded_value: f64,
    pub last_update_time: String,
}

impl IndexSnapshot {
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            last_price: 0.0,
            change: 0.0,
            p_change: 0.0,
            open: 0.0,
            day_high: 0.0,
            day_low: 0.0,
            previous_close: 0.0,
            year_high: 0.0,
            year_low: 0.0,
            total_traded_volume: 0.0,
            total_traded_value: 0.0,
            last_update_time: exchange_timestamp(),
        }
    }
}

/// The first row of an index payload (the index itself), passed through
/// untouched, or a zeroed snapshot for `symbol`.
pub fn headline(payload: Option<&Value>, symbol: &str) -> Value {
    payload
        .and_then(data_rows)
        .and_then(|rows| rows.first())
        .filter(|row| is_truthy(row))
        .cloned()
        .unwrap_or_else(|| {
            serde_json::to_value(IndexSnapshot::empty(symbol)).unwrap_or(Value::Null)
        })
}

/// Body of `/api/indices`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicesOverview {
    pub market_status: MarketStatus,
    pub nifty50: Value,
    pub bank_nifty: Value,
}

fn data_rows(payload: &Value) -> Option<&Vec<Value>> {
    payload.get("data").and_then(Value::as_array)
}

fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// Lenient field access on one provider row.
struct Fields<'a>(&'a Value);

impl Fields<'_> {
    fn text(&self, name: &str) -> String {
        match self.0.get(name) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    fn number(&self, name: &str) -> Number {
        match self.0.get(name) {
            Some(Value::Number(n)) => n.clone(),
            Some(Value::String(s)) => parse_float(s)
                .and_then(Number::from_f64)
                .unwrap_or_else(|| Number::from(0)),
            _ => Number::from(0),
        }
    }

    fn float(&self, name: &str) -> Option<f64> {
        match self.0.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_float(s),
            _ => None,
        }
    }
}

/// Parse a provider numeric string, tolerating thousands separators.
fn parse_float(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stock_rows_fill_defaults() {
        let payload = json!({
            "data": [
                {"symbol": "NIFTY 50", "lastPrice": 22000.5, "pChange": "-0.42"},
                {"identifier": "RELIANCEEQN", "totalTradedVolume": 123456, "lastUpdateTime": "15-Jan-2024 15:30:00"}
            ]
        });

        let rows = stock_rows(&payload);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "NIFTY 50");
        assert_eq!(rows[0].identifier, "");
        assert_eq!(rows[0].last_price.as_f64(), Some(22000.5));
        assert_eq!(rows[0].p_change.as_f64(), Some(-0.42));
        assert_eq!(rows[0].day_high, Number::from(0));
        assert!(!rows[0].last_update_time.is_empty());

        assert_eq!(rows[1].symbol, "");
        assert_eq!(rows[1].total_traded_volume, Number::from(123456));
        assert_eq!(rows[1].last_update_time, "15-Jan-2024 15:30:00");
    }

    #[test]
    fn test_stock_row_wire_names() {
        let rows = stock_rows(&json!({"data": [{"symbol": "TCS", "perChange365d": 12.5}]}));
        let wire = serde_json::to_value(&rows[0]).unwrap();

        assert_eq!(wire["symbol"], "TCS");
        assert_eq!(wire["perChange365d"], 12.5);
        assert_eq!(wire["perChange30d"], 0);
        assert_eq!(wire["totalTradedValue"], 0);
        assert!(wire["lastUpdateTime"].is_string());
    }

    #[test]
    fn test_missing_data_maps_to_empty() {
        assert!(stock_rows(&json!({})).is_empty());
        assert!(stock_rows(&json!({"data": {"symbol": "X"}})).is_empty());
        assert!(stock_rows(&json!([1, 2])).is_empty());
        assert!(bank_nifty_stocks(&json!({"data": null})).is_none());
        assert!(candles(&json!({"msg": "no data"})).is_none());
    }

    #[test]
    fn test_bank_nifty_simplified_rows() {
        let payload = json!({
            "data": [{
                "symbol": "HDFCBANK", "open": 1500, "dayHigh": 1520.5, "dayLow": 1490,
                "previousClose": 1495, "lastPrice": 1510, "change": 15, "pChange": 1.0,
                "totalTradedVolume": 9000000
            }]
        });

        let stocks = bank_nifty_stocks(&payload).unwrap();
        let wire = serde_json::to_value(&stocks).unwrap();

        assert_eq!(
            wire,
            json!([{
                "symbol": "HDFCBANK", "open": 1500, "high": 1520.5, "low": 1490,
                "preClose": 1495, "lastPrice": 1510, "change": 15, "pChange": 1.0,
                "volume": 9000000, "indices": ["NIFTY BANK"]
            }])
        );
    }

    #[test]
    fn test_candles_parse_price_strings() {
        let payload = json!({
            "data": [{
                "CH_TIMESTAMP": "2024-01-15",
                "CH_OPENING_PRICE": "3,850.10",
                "CH_TRADE_HIGH_PRICE": 3890,
                "CH_TRADE_LOW_PRICE": "3840.5",
                "CH_CLOSING_PRICE": "n/a"
            }]
        });

        let bars = candles(&payload).unwrap();

        assert_eq!(
            bars,
            vec![Candle {
                date: json!("2024-01-15"),
                open: Some(3850.1),
                high: Some(3890.0),
                low: Some(3840.5),
                close: None,
            }]
        );
        assert_eq!(serde_json::to_value(&bars[0]).unwrap()["close"], Value::Null);
    }

    #[test]
    fn test_stock_details_merges_trade_info() {
        let merged = stock_details(
            json!({"info": {"symbol": "INFY"}, "priceInfo": {"lastPrice": 1600}}),
            json!({"marketDeptOrderBook": {"totalBuyQuantity": 10}}),
        );

        assert_eq!(merged["info"]["symbol"], "INFY");
        assert_eq!(merged["priceInfo"]["lastPrice"], 1600);
        assert_eq!(merged["tradeInfo"]["marketDeptOrderBook"]["totalBuyQuantity"], 10);
    }

    #[test]
    fn test_headline_takes_first_row_or_default() {
        let payload = json!({"data": [{"symbol": "NIFTY 50", "lastPrice": 22000}, {"symbol": "TCS"}]});
        assert_eq!(
            headline(Some(&payload), "NIFTY 50"),
            json!({"symbol": "NIFTY 50", "lastPrice": 22000})
        );

        for missing in [None, Some(&json!({"data": []})), Some(&json!({"data": [null]}))] {
            let snapshot = headline(missing, "NIFTY BANK");
            assert_eq!(snapshot["symbol"], "NIFTY BANK");
            assert_eq!(snapshot["lastPrice"], 0.0);
            assert_eq!(snapshot["totalTradedValue"], 0.0);
            assert!(snapshot["lastUpdateTime"].is_string());
        }
    }
}
