//! Market domain: trading-session status and downstream data shapes.
//!
//! Nothing here performs I/O. `status` is a pure function of the clock and
//! `models` turns provider JSON into the shapes the routes serve.

pub mod models;
pub mod status;

pub use models::{BankNiftyStock, Candle, IndexSnapshot, IndicesOverview, StockRow};
pub use status::{market_status, market_status_at, MarketStatus, SessionPhase};
