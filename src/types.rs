// 1.0: all the primitives live here. instruments, orders, sides, venues, timestamps.
// ids are newtypes so an instrument handle never gets mixed up with an order id.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable opaque handle for an instrument. assigned by the host, never an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstrumentId(pub u32);

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Venue-assigned order identifier. zero is never a live order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Buy lifts the ask, Sell hits the bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side that moves a position by `signed_qty`. None for zero.
    pub fn from_signed(signed_qty: i64) -> Option<Self> {
        match signed_qty {
            q if q > 0 => Some(Side::Buy),
            q if q < 0 => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn sign(&self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

// 1.1: desired directional side produced by a signal. sign is -1 / 0 / +1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionSide {
    Short,
    #[default]
    Flat,
    Long,
}

impl PositionSide {
    pub fn sign(&self) -> i64 {
        match self {
            PositionSide::Short => -1,
            PositionSide::Flat => 0,
            PositionSide::Long => 1,
        }
    }

    /// Classify a signed score. zero is Flat.
    pub fn from_score(score: Decimal) -> Self {
        if score > Decimal::ZERO {
            PositionSide::Long
        } else if score < Decimal::ZERO {
            PositionSide::Short
        } else {
            PositionSide::Flat
        }
    }
}

// 1.2: asset class of an instrument. only used for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    Option,
    Future,
    Other,
}

// 1.3: market centers orders are routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    Nasdaq,
    CboeOptions,
    CmeGlobex,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Venue::Nasdaq => "NASDAQ",
            Venue::CboeOptions => "CBOE_OPTIONS",
            Venue::CmeGlobex => "CME_GLOBEX",
        };
        f.write_str(name)
    }
}

/// Order type sent to the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

/// Order time in force. everything the engines send is Day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    #[default]
    Day,
    /// Immediate or cancel.
    Ioc,
    /// Good till canceled.
    Gtc,
}

// 1.4: millisecond timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match chrono::DateTime::from_timestamp_millis(self.0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn side_from_signed_quantity() {
        assert_eq!(Side::from_signed(5), Some(Side::Buy));
        assert_eq!(Side::from_signed(-3), Some(Side::Sell));
        assert_eq!(Side::from_signed(0), None);
        assert_eq!(Side::Buy.opposite(), Side::Sell);
    }

    #[test]
    fn position_side_classification() {
        assert_eq!(PositionSide::from_score(dec!(0.5)), PositionSide::Long);
        assert_eq!(PositionSide::from_score(dec!(-2)), PositionSide::Short);
        assert_eq!(PositionSide::from_score(Decimal::ZERO), PositionSide::Flat);
        assert_eq!(PositionSide::Short.sign(), -1);
        assert_eq!(PositionSide::Flat.sign(), 0);
    }

    #[test]
    fn timestamp_display() {
        let ts = Timestamp::from_millis(0);
        assert_eq!(ts.to_string(), "1970-01-01 00:00:00.000");
    }
}
