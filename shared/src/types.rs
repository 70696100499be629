//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Units a product can be counted in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[default]
    Piece,
    Bottle,
    Box,
    Pack,
    Bag,
    Can,
    Case,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Piece => "piece",
            Unit::Bottle => "bottle",
            Unit::Box => "box",
            Unit::Pack => "pack",
            Unit::Bag => "bag",
            Unit::Can => "can",
            Unit::Case => "case",
        }
    }

    /// Thai display label used in notifications
    pub fn label_th(&self) -> &'static str {
        match self {
            Unit::Piece => "ชิ้น",
            Unit::Bottle => "ขวด",
            Unit::Box => "กล่อง",
            Unit::Pack => "แพ็ค",
            Unit::Bag => "ถุง",
            Unit::Can => "กระป๋อง",
            Unit::Case => "ลัง",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "piece" => Some(Unit::Piece),
            "bottle" => Some(Unit::Bottle),
            "box" => Some(Unit::Box),
            "pack" => Some(Unit::Pack),
            "bag" => Some(Unit::Bag),
            "can" => Some(Unit::Can),
            "case" => Some(Unit::Case),
            _ => None,
        }
    }
}

/// Date range for queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}
