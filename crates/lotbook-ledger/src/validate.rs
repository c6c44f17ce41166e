//! Trade validation at the ingestion boundary.

use lotbook_core::{Trade, TradeId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// V1001: Trade id is empty.
    MissingTradeId,
    /// V1002: Quantity is zero or negative.
    NonPositiveQuantity,
    /// V1003: Price is zero or negative.
    NonPositivePrice,
    /// V1004: Quantity exceeds the configured maximum.
    QuantityTooLarge,
    /// V1005: Price exceeds the configured maximum.
    PriceTooLarge,
    /// V1006: Quantity has a fractional part but whole units are required.
    FractionalQuantity,
}

impl ErrorCode {
    /// Get the error code string (e.g., "V1001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingTradeId => "V1001",
            Self::NonPositiveQuantity => "V1002",
            Self::NonPositivePrice => "V1003",
            Self::QuantityTooLarge => "V1004",
            Self::PriceTooLarge => "V1005",
            Self::FractionalQuantity => "V1006",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Bounds a trade must respect to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest accepted quantity.
    pub max_quantity: Decimal,
    /// Largest accepted price.
    pub max_price: Decimal,
    /// Reject fractional quantities.
    pub whole_units: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_quantity: Decimal::from(1_000_000_000u64),
            max_price: Decimal::from(10_000_000u64),
            whole_units: false,
        }
    }
}

/// A trade rejected before it reached the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] trade {trade_id}: {message}")]
pub struct InvalidTradeError {
    /// Error code.
    pub code: ErrorCode,
    /// The offending trade.
    pub trade_id: TradeId,
    /// Error message.
    pub message: String,
}

impl InvalidTradeError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(code: ErrorCode, trade_id: TradeId, message: impl Into<String>) -> Self {
        Self {
            code,
            trade_id,
            message: message.into(),
        }
    }
}

/// Check a trade against `limits`, returning the first violation.
pub fn validate_trade(trade: &Trade, limits: &Limits) -> Result<(), InvalidTradeError> {
    let fail = |code: ErrorCode, message: String| -> Result<(), InvalidTradeError> {
        Err(InvalidTradeError::new(code, trade.id.clone(), message))
    };

    if trade.id.is_blank() {
        return fail(ErrorCode::MissingTradeId, "trade id is empty".to_string());
    }
    if trade.quantity <= Decimal::ZERO {
        return fail(
            ErrorCode::NonPositiveQuantity,
            format!("quantity must be positive, got {}", trade.quantity),
        );
    }
    if trade.price <= Decimal::ZERO {
        return fail(
            ErrorCode::NonPositivePrice,
            format!("price must be positive, got {}", trade.price),
        );
    }
    if trade.quantity > limits.max_quantity {
        return fail(
            ErrorCode::QuantityTooLarge,
            format!(
                "quantity {} exceeds maximum {}",
                trade.quantity, limits.max_quantity
            ),
        );
    }
    if trade.price > limits.max_price {
        return fail(
            ErrorCode::PriceTooLarge,
            format!("price {} exceeds maximum {}", trade.price, limits.max_price),
        );
    }
    if limits.whole_units && !trade.quantity.fract().is_zero() {
        return fail(
            ErrorCode::FractionalQuantity,
            format!("quantity {} is not a whole number of units", trade.quantity),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lotbook_core::{AccountId, StockId};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn buy(id: &str, quantity: Decimal, price: Decimal) -> Trade {
        Trade::buy(id, StockId(1), AccountId(1), date(2024, 1, 1), quantity, price)
    }

    fn code_of(trade: &Trade, limits: &Limits) -> Option<ErrorCode> {
        validate_trade(trade, limits).err().map(|e| e.code)
    }

    #[test]
    fn test_valid_trade() {
        assert!(validate_trade(&buy("T1", dec!(10), dec!(100)), &Limits::default()).is_ok());
    }

    #[test]
    fn test_error_codes() {
        let limits = Limits::default();
        assert_eq!(
            code_of(&buy(" ", dec!(10), dec!(100)), &limits),
            Some(ErrorCode::MissingTradeId)
        );
        assert_eq!(
            code_of(&buy("T", dec!(0), dec!(100)), &limits),
            Some(ErrorCode::NonPositiveQuantity)
        );
        assert_eq!(
            code_of(&buy("T", dec!(10), dec!(-1)), &limits),
            Some(ErrorCode::NonPositivePrice)
        );
        assert_eq!(
            code_of(&buy("T", dec!(1000000001), dec!(1)), &limits),
            Some(ErrorCode::QuantityTooLarge)
        );
        assert_eq!(
            code_of(&buy("T", dec!(1), dec!(10000000.01)), &limits),
            Some(ErrorCode::PriceTooLarge)
        );
    }

    #[test]
    fn test_limits_are_inclusive() {
        let limits = Limits::default();
        assert!(validate_trade(&buy("T", dec!(1000000000), dec!(10000000)), &limits).is_ok());
    }

    #[test]
    fn test_whole_units() {
        let trade = buy("T", dec!(1.5), dec!(10));
        assert!(validate_trade(&trade, &Limits::default()).is_ok());

        let strict = Limits {
            whole_units: true,
            ..Limits::default()
        };
        assert_eq!(code_of(&trade, &strict), Some(ErrorCode::FractionalQuantity));
    }

    #[test]
    fn test_error_display() {
        let err = validate_trade(&buy("T7", dec!(0), dec!(1)), &Limits::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[V1002] trade T7: quantity must be positive, got 0"
        );
    }

    #[test]
    fn test_limits_deserialize_with_defaults() {
        let limits: Limits = serde_json::from_str(r#"{"whole_units": true}"#).unwrap();
        assert!(limits.whole_units);
        assert_eq!(limits.max_price, dec!(10000000));
    }
}
