//! Trading-session status from wall-clock time.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Asia::Kolkata;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// The exchange's local timezone.
pub const EXCHANGE_TZ: Tz = Kolkata;

const PRE_OPEN: u32 = 9 * 60;
const OPEN: u32 = 9 * 60 + 15;
const CLOSE: u32 = 15 * 60 + 30;
const POST_CLOSE: u32 = 16 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    PreMarket,
    Open,
    PostMarket,
    Closed,
}

/// Status as reported to clients: `{"status": "...", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub status: SessionPhase,
    pub message: String,
}

impl MarketStatus {
    fn new(status: SessionPhase, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == SessionPhase::Open
    }
}

/// Status at `now`, judged in exchange-local time.
///
/// Weekdays: `[09:00, 09:15)` pre-market, `[09:15, 15:30)` open,
/// `[15:30, 16:00)` post-market, closed otherwise. Weekends are closed.
pub fn market_status_at(now: DateTime<Utc>) -> MarketStatus {
    let local = now.with_timezone(&EXCHANGE_TZ);

    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return MarketStatus::new(SessionPhase::Closed, "Weekend - Market Closed");
    }

    match local.hour() * 60 + local.minute() {
        m if (PRE_OPEN..OPEN).contains(&m) => {
            MarketStatus::new(SessionPhase::PreMarket, "Pre-market Session")
        }
        m if (OPEN..CLOSE).contains(&m) => MarketStatus::new(SessionPhase::Open, "Market Open"),
        m if (CLOSE..POST_CLOSE).contains(&m) => {
            MarketStatus::new(SessionPhase::PostMarket, "Post-market Session")
        }
        _ => MarketStatus::new(SessionPhase::Closed, "Market Closed"),
    }
}

pub fn market_status() -> MarketStatus {
    market_status_at(Utc::now())
}

/// Exchange-local timestamp used when a payload carries none,
/// e.g. `10/16/2026, 3:45:12 PM`.
pub fn exchange_timestamp_at(now: DateTime<Utc>) -> String {
    now.with_timezone(&EXCHANGE_TZ)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

pub fn exchange_timestamp() -> String {
    exchange_timestamp_at(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// A moment given in exchange-local time.
    fn ist(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        EXCHANGE_TZ
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_weekday_boundaries() {
        // 2024-01-15 is a Monday
        let cases = [
            (8, 59, SessionPhase::Closed, "Market Closed"),
            (9, 0, SessionPhase::PreMarket, "Pre-market Session"),
            (9, 14, SessionPhase::PreMarket, "Pre-market Session"),
            (9, 15, SessionPhase::Open, "Market Open"),
            (15, 29, SessionPhase::Open, "Market Open"),
            (15, 30, SessionPhase::PostMarket, "Post-market Session"),
            (15, 59, SessionPhase::PostMarket, "Post-market Session"),
            (16, 0, SessionPhase::Closed, "Market Closed"),
        ];
        for (h, m, phase, message) in cases {
            let status = market_status_at(ist(2024, 1, 15, h, m));
            assert_eq!(status.status, phase, "{h:02}:{m:02}");
            assert_eq!(status.message, message, "{h:02}:{m:02}");
        }
    }

    #[test]
    fn test_weekend_is_closed_all_day() {
        let saturday_noon = market_status_at(ist(2024, 1, 13, 12, 0));
        assert_eq!(saturday_noon.status, SessionPhase::Closed);
        assert_eq!(saturday_noon.message, "Weekend - Market Closed");

        let sunday_open_time = market_status_at(ist(2024, 1, 14, 10, 0));
        assert!(!sunday_open_time.is_open());
    }

    #[test]
    fn test_uses_exchange_timezone() {
        // 04:00 UTC on a Monday is 09:30 in the exchange timezone
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 4, 0, 0).unwrap();
        assert!(market_status_at(now).is_open());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(market_status_at(ist(2024, 1, 15, 9, 5))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "pre-market", "message": "Pre-market Session"})
        );
    }

    #[test]
    fn test_exchange_timestamp_format() {
        assert_eq!(
            exchange_timestamp_at(ist(2024, 1, 15, 15, 5)),
            "1/15/2024, 3:05:00 PM"
        );
    }
}
