//! Festival and personal calendar models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Festival classification shown on the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FestivalCategory {
    NewYear,
    Songkran,
    #[default]
    Festival,
    Holiday,
    Special,
}

impl FestivalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FestivalCategory::NewYear => "new_year",
            FestivalCategory::Songkran => "songkran",
            FestivalCategory::Festival => "festival",
            FestivalCategory::Holiday => "holiday",
            FestivalCategory::Special => "special",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new_year" => Some(FestivalCategory::NewYear),
            "songkran" => Some(FestivalCategory::Songkran),
            "festival" => Some(FestivalCategory::Festival),
            "holiday" => Some(FestivalCategory::Holiday),
            "special" => Some(FestivalCategory::Special),
            _ => None,
        }
    }
}

/// A festival or special sales period (ปีใหม่, สงกรานต์, ลอยกระทง, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Festival {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_recurring: bool,
    pub category: FestivalCategory,
    pub icon: String,
    pub color: String,
    pub notes: Option<String>,
    pub preparation_tasks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Festival {
    /// Length of the festival in days, inclusive of both endpoints
    pub fn duration_days(&self) -> i64 {
        self.end_date.signed_duration_since(self.start_date).num_days() + 1
    }

    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.start_date >= today
    }

    /// Days until the festival starts, `None` once it has started
    pub fn days_until(&self, today: NaiveDate) -> Option<i64> {
        if self.start_date > today {
            Some(self.start_date.signed_duration_since(today).num_days())
        } else {
            None
        }
    }
}

/// Kind of a personal calendar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[default]
    StockOrder,
    StockCheck,
    Delivery,
    Meeting,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::StockOrder => "stock_order",
            EventType::StockCheck => "stock_check",
            EventType::Delivery => "delivery",
            EventType::Meeting => "meeting",
            EventType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stock_order" => Some(EventType::StockOrder),
            "stock_check" => Some(EventType::StockCheck),
            "delivery" => Some(EventType::Delivery),
            "meeting" => Some(EventType::Meeting),
            "other" => Some(EventType::Other),
            _ => None,
        }
    }
}

/// A personal note/event on the calendar, optionally shared with everyone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomEvent {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub event_type: EventType,
    pub priority: crate::models::TaskPriority,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn festival(start: NaiveDate, end: NaiveDate) -> Festival {
        let now = Utc::now();
        Festival {
            id: Uuid::new_v4(),
            name: "สงกรานต์".to_string(),
            description: None,
            start_date: start,
            end_date: end,
            is_recurring: true,
            category: FestivalCategory::Songkran,
            icon: "🎉".to_string(),
            color: "#FF6B6B".to_string(),
            notes: None,
            preparation_tasks: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_duration_is_inclusive() {
        let f = festival(
            NaiveDate::from_ymd_opt(2026, 4, 13).unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 15).unwrap(),
        );
        assert_eq!(f.duration_days(), 3);
    }

    #[test]
    fn test_days_until() {
        let f = festival(
            NaiveDate::from_ymd_opt(2026, 4, 13).unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 15).unwrap(),
        );
        let today = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        assert_eq!(f.days_until(today), Some(12));
        assert!(f.is_upcoming(today));

        let during = NaiveDate::from_ymd_opt(2026, 4, 14).unwrap();
        assert_eq!(f.days_until(during), None);
        assert!(!f.is_upcoming(during));
    }
}
