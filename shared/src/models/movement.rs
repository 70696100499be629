//! Stock movement ledger model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Unit;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    In,
    Out,
}

impl MovementDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementDirection::In => "in",
            MovementDirection::Out => "out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementDirection::In),
            "out" => Some(MovementDirection::Out),
            _ => None,
        }
    }
}

/// One immutable ledger entry. Product code, name and unit are snapshotted
/// at write time so history stays readable after the product is renamed or
/// soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub direction: MovementDirection,
    pub qty: i32,
    pub product_code: String,
    pub product_name: String,
    pub unit: Unit,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Quantity with its ledger sign: positive for `in`, negative for `out`
    pub fn signed_qty(&self) -> i64 {
        match self.direction {
            MovementDirection::In => i64::from(self.qty),
            MovementDirection::Out => -i64::from(self.qty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_round_trip() {
        assert_eq!(MovementDirection::parse("in"), Some(MovementDirection::In));
        assert_eq!(MovementDirection::parse("out"), Some(MovementDirection::Out));
        assert_eq!(MovementDirection::parse("sideways"), None);
    }

    #[test]
    fn test_signed_qty() {
        let mut m = Movement {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            direction: MovementDirection::In,
            qty: 7,
            product_code: "A100".to_string(),
            product_name: "สินค้า".to_string(),
            unit: Unit::Piece,
            created_by: None,
            created_at: Utc::now(),
        };
        assert_eq!(m.signed_qty(), 7);
        m.direction = MovementDirection::Out;
        assert_eq!(m.signed_qty(), -7);
    }
}
