//! Order lifecycle status.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Status of an order as it moves through the pickup lifecycle.
///
/// Stored as its `SCREAMING_SNAKE_CASE` name in a TEXT column.
///
/// Transitions are deliberately permissive: the only enforced guards are
/// that a cancelled order never transitions again and a completed order only
/// accepts `Completed`. See [`OrderStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order placed, being prepared.
    Active,
    /// Order packed and waiting at the pickup counter.
    ReadyToPickup,
    /// Order picked up.
    Completed,
    /// Order cancelled; stock restored. Terminal.
    Cancelled,
    /// Refund requested and being processed.
    RefundProcessing,
    /// Refund issued.
    Refunded,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Active,
        Self::ReadyToPickup,
        Self::Completed,
        Self::Cancelled,
        Self::RefundProcessing,
        Self::Refunded,
    ];

    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// Guards: `Cancelled` is terminal, and `Completed` only accepts
    /// `Completed` itself. Every other transition is permitted.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Cancelled => false,
            Self::Completed => next == Self::Completed,
            _ => true,
        }
    }

    /// Whether an order in this status may still be cancelled
    /// (with stock restoration).
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Active | Self::ReadyToPickup)
    }

    /// The stored/wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::ReadyToPickup => "READY_TO_PICKUP",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::RefundProcessing => "REFUND_PROCESSING",
            Self::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "READY_TO_PICKUP" => Ok(Self::ReadyToPickup),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "REFUND_PROCESSING" => Ok(Self::RefundProcessing),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(format!("unknown order status: {s}")),
        }
    }
}

// SQLx support (with postgres feature): stored as TEXT
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        s.parse().map_err(Into::into)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}
