//! Festival and personal-event calendar service
//!
//! Festivals are shop-wide sales periods shown to everyone; custom events
//! are personal notes that may optionally be shared. Both only feed the
//! calendar views; the single invariant is date validity.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{
    validate_date_range, CustomEvent, EventType, Festival, FestivalCategory, TaskPriority,
};

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

/// How far ahead the upcoming-festivals view looks
const UPCOMING_WINDOW_DAYS: i64 = 60;

/// Calendar service
#[derive(Clone)]
pub struct CalendarService {
    db: PgPool,
}

/// Input for creating a festival
#[derive(Debug, Deserialize)]
pub struct CreateFestivalInput {
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_recurring: Option<bool>,
    pub category: Option<FestivalCategory>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub preparation_tasks: Option<String>,
}

/// Partial update for a festival
#[derive(Debug, Default, Deserialize)]
pub struct UpdateFestivalInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_recurring: Option<bool>,
    pub category: Option<FestivalCategory>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub preparation_tasks: Option<String>,
}

/// Input for creating a custom event
#[derive(Debug, Deserialize)]
pub struct CreateEventInput {
    pub title: String,
    pub date: NaiveDate,
    #[serde(default, alias = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub priority: TaskPriority,
    pub notes: Option<String>,
    pub is_shared: Option<bool>,
}

/// Partial update for a custom event
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEventInput {
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(alias = "type")]
    pub event_type: Option<EventType>,
    pub priority: Option<TaskPriority>,
    pub notes: Option<String>,
    pub is_shared: Option<bool>,
}

/// Month selector for calendar views
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Festival as exposed over the API, with derived calendar fields
#[derive(Debug, Serialize)]
pub struct FestivalResponse {
    #[serde(flatten)]
    pub festival: Festival,
    pub duration_days: i64,
    pub is_upcoming: bool,
    pub days_until: Option<i64>,
}

impl FestivalResponse {
    fn from_festival(festival: Festival, today: NaiveDate) -> Self {
        Self {
            duration_days: festival.duration_days(),
            is_upcoming: festival.is_upcoming(today),
            days_until: festival.days_until(today),
            festival,
        }
    }
}

/// Upcoming-festivals response
#[derive(Debug, Serialize)]
pub struct UpcomingFestivals {
    pub count: usize,
    pub today: NaiveDate,
    pub results: Vec<FestivalResponse>,
}

/// Month calendar response
#[derive(Debug, Serialize)]
pub struct FestivalCalendar {
    pub year: i32,
    pub month: u32,
    pub count: usize,
    pub festivals: Vec<FestivalResponse>,
}

/// Custom event as exposed over the API
#[derive(Debug, Serialize)]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: CustomEvent,
    pub created_by_name: Option<String>,
}

#[derive(Debug, FromRow)]
struct FestivalRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    is_recurring: bool,
    category: String,
    icon: String,
    color: String,
    notes: Option<String>,
    preparation_tasks: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl FestivalRow {
    fn into_festival(self) -> AppResult<Festival> {
        Ok(Festival {
            id: self.id,
            name: self.name,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            is_recurring: self.is_recurring,
            category: FestivalCategory::parse(&self.category)
                .ok_or_else(|| AppError::Internal(format!("bad category: {}", self.category)))?,
            icon: self.icon,
            color: self.color,
            notes: self.notes,
            preparation_tasks: self.preparation_tasks,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    date: NaiveDate,
    event_type: String,
    priority: String,
    notes: Option<String>,
    created_by: Option<Uuid>,
    is_shared: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    creator_full_name: Option<String>,
    creator_username: Option<String>,
}

impl EventRow {
    fn into_response(self) -> AppResult<EventResponse> {
        let event = CustomEvent {
            id: self.id,
            title: self.title,
            date: self.date,
            event_type: EventType::parse(&self.event_type)
                .ok_or_else(|| AppError::Internal(format!("bad event type: {}", self.event_type)))?,
            priority: TaskPriority::parse(&self.priority)
                .ok_or_else(|| AppError::Internal(format!("bad priority: {}", self.priority)))?,
            notes: self.notes,
            created_by: self.created_by,
            is_shared: self.is_shared,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        let created_by_name = match self.creator_full_name {
            Some(ref name) if !name.trim().is_empty() => Some(name.clone()),
            _ => self.creator_username,
        };
        Ok(EventResponse {
            event,
            created_by_name,
        })
    }
}

const FESTIVAL_COLUMNS: &str = "id, name, description, start_date, end_date, is_recurring, \
     category, icon, color, notes, preparation_tasks, created_at, updated_at";

const EVENT_COLUMNS: &str = "e.id, e.title, e.date, e.event_type, e.priority, e.notes, \
     e.created_by, e.is_shared, e.created_at, e.updated_at, \
     u.full_name AS creator_full_name, u.username AS creator_username";

impl CalendarService {
    /// Create a new CalendarService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // Festivals
    // ------------------------------------------------------------------

    /// All festivals ordered by start date
    pub async fn list_festivals(&self) -> AppResult<Vec<FestivalResponse>> {
        let rows = sqlx::query_as::<_, FestivalRow>(&format!(
            "SELECT {FESTIVAL_COLUMNS} FROM festivals ORDER BY start_date ASC",
        ))
        .fetch_all(&self.db)
        .await?;

        let today = Utc::now().date_naive();
        rows.into_iter()
            .map(|row| Ok(FestivalResponse::from_festival(row.into_festival()?, today)))
            .collect()
    }

    /// One festival
    pub async fn get_festival(&self, festival_id: Uuid) -> AppResult<FestivalResponse> {
        let row = sqlx::query_as::<_, FestivalRow>(&format!(
            "SELECT {FESTIVAL_COLUMNS} FROM festivals WHERE id = $1",
        ))
        .bind(festival_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Festival".to_string()))?;

        Ok(FestivalResponse::from_festival(
            row.into_festival()?,
            Utc::now().date_naive(),
        ))
    }

    /// Create a festival
    pub async fn create_festival(&self, input: CreateFestivalInput) -> AppResult<FestivalResponse> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name cannot be empty".to_string(),
                message_th: "ต้องระบุชื่อเทศกาล".to_string(),
            });
        }
        Self::check_dates(input.start_date, input.end_date)?;

        let festival_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO festivals (name, description, start_date, end_date, is_recurring,
                                   category, icon, color, notes, preparation_tasks)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.is_recurring.unwrap_or(true))
        .bind(input.category.unwrap_or_default().as_str())
        .bind(input.icon.as_deref().unwrap_or("🎉"))
        .bind(input.color.as_deref().unwrap_or("#FF6B6B"))
        .bind(&input.notes)
        .bind(&input.preparation_tasks)
        .fetch_one(&self.db)
        .await?;

        self.get_festival(festival_id).await
    }

    /// Partially update a festival. Date changes are validated against the
    /// resulting range, mixing provided and stored endpoints.
    pub async fn update_festival(
        &self,
        festival_id: Uuid,
        input: UpdateFestivalInput,
    ) -> AppResult<FestivalResponse> {
        let current = self.get_festival(festival_id).await?;
        let start = input.start_date.unwrap_or(current.festival.start_date);
        let end = input.end_date.unwrap_or(current.festival.end_date);
        Self::check_dates(start, end)?;

        sqlx::query(
            r#"
            UPDATE festivals
            SET name = COALESCE($1, name),
                description = COALESCE($2, description),
                start_date = $3,
                end_date = $4,
                is_recurring = COALESCE($5, is_recurring),
                category = COALESCE($6, category),
                icon = COALESCE($7, icon),
                color = COALESCE($8, color),
                notes = COALESCE($9, notes),
                preparation_tasks = COALESCE($10, preparation_tasks),
                updated_at = NOW()
            WHERE id = $11
            "#,
        )
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.description)
        .bind(start)
        .bind(end)
        .bind(input.is_recurring)
        .bind(input.category.map(|c| c.as_str()))
        .bind(&input.icon)
        .bind(&input.color)
        .bind(&input.notes)
        .bind(&input.preparation_tasks)
        .bind(festival_id)
        .execute(&self.db)
        .await?;

        self.get_festival(festival_id).await
    }

    /// Delete a festival
    pub async fn delete_festival(&self, festival_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM festivals WHERE id = $1")
            .bind(festival_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Festival".to_string()));
        }
        Ok(())
    }

    /// Festivals starting within the next 60 days
    pub async fn upcoming_festivals(&self) -> AppResult<UpcomingFestivals> {
        let today = Utc::now().date_naive();
        let horizon = today + Duration::days(UPCOMING_WINDOW_DAYS);

        let rows = sqlx::query_as::<_, FestivalRow>(&format!(
            r#"
            SELECT {FESTIVAL_COLUMNS}
            FROM festivals
            WHERE start_date >= $1 AND start_date <= $2
            ORDER BY start_date ASC
            "#
        ))
        .bind(today)
        .bind(horizon)
        .fetch_all(&self.db)
        .await?;

        let results: Vec<FestivalResponse> = rows
            .into_iter()
            .map(|row| Ok(FestivalResponse::from_festival(row.into_festival()?, today)))
            .collect::<AppResult<_>>()?;

        Ok(UpcomingFestivals {
            count: results.len(),
            today,
            results,
        })
    }

    /// Festivals overlapping the given month
    pub async fn festival_calendar(&self, query: MonthQuery) -> AppResult<FestivalCalendar> {
        let now = Utc::now().date_naive();
        let (year, month, first_day, next_month) = Self::month_bounds(&query, now)?;

        let rows = sqlx::query_as::<_, FestivalRow>(&format!(
            r#"
            SELECT {FESTIVAL_COLUMNS}
            FROM festivals
            WHERE start_date < $2 AND end_date >= $1
            ORDER BY start_date ASC
            "#
        ))
        .bind(first_day)
        .bind(next_month)
        .fetch_all(&self.db)
        .await?;

        let festivals: Vec<FestivalResponse> = rows
            .into_iter()
            .map(|row| Ok(FestivalResponse::from_festival(row.into_festival()?, now)))
            .collect::<AppResult<_>>()?;

        Ok(FestivalCalendar {
            year,
            month,
            count: festivals.len(),
            festivals,
        })
    }

    // ------------------------------------------------------------------
    // Custom events
    // ------------------------------------------------------------------

    /// Events visible to the caller: their own plus everything shared
    pub async fn list_events(&self, user: &AuthUser) -> AppResult<Vec<EventResponse>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM custom_events e
            LEFT JOIN users u ON u.id = e.created_by
            WHERE e.created_by = $1 OR e.is_shared
            ORDER BY e.date ASC, e.created_at DESC
            "#
        ))
        .bind(user.user_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(EventRow::into_response).collect()
    }

    /// Create a custom event. Events created by admins are always shared.
    pub async fn create_event(
        &self,
        user: &AuthUser,
        input: CreateEventInput,
    ) -> AppResult<EventResponse> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation {
                field: "title".to_string(),
                message: "Title cannot be empty".to_string(),
                message_th: "ต้องระบุชื่อบันทึก".to_string(),
            });
        }

        let is_shared = if user.is_admin() {
            true
        } else {
            input.is_shared.unwrap_or(true)
        };

        let event_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO custom_events (title, date, event_type, priority, notes, created_by, is_shared)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(input.title.trim())
        .bind(input.date)
        .bind(input.event_type.as_str())
        .bind(input.priority.as_str())
        .bind(&input.notes)
        .bind(user.user_id)
        .bind(is_shared)
        .fetch_one(&self.db)
        .await?;

        self.fetch_event(event_id).await
    }

    /// Partially update an event. Only the creator or an admin may edit.
    pub async fn update_event(
        &self,
        user: &AuthUser,
        event_id: Uuid,
        input: UpdateEventInput,
    ) -> AppResult<EventResponse> {
        let current = self.fetch_event(event_id).await?;
        Self::check_event_owner(user, &current)?;

        sqlx::query(
            r#"
            UPDATE custom_events
            SET title = COALESCE($1, title),
                date = COALESCE($2, date),
                event_type = COALESCE($3, event_type),
                priority = COALESCE($4, priority),
                notes = COALESCE($5, notes),
                is_shared = COALESCE($6, is_shared),
                updated_at = NOW()
            WHERE id = $7
            "#,
        )
        .bind(input.title.as_deref().map(str::trim))
        .bind(input.date)
        .bind(input.event_type.map(|t| t.as_str()))
        .bind(input.priority.map(|p| p.as_str()))
        .bind(&input.notes)
        .bind(input.is_shared)
        .bind(event_id)
        .execute(&self.db)
        .await?;

        self.fetch_event(event_id).await
    }

    /// Delete an event. Only the creator or an admin may delete.
    pub async fn delete_event(&self, user: &AuthUser, event_id: Uuid) -> AppResult<()> {
        let current = self.fetch_event(event_id).await?;
        Self::check_event_owner(user, &current)?;

        sqlx::query("DELETE FROM custom_events WHERE id = $1")
            .bind(event_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// The caller's next events (shared or their own), soonest first
    pub async fn upcoming_events(&self, user: &AuthUser) -> AppResult<Vec<EventResponse>> {
        let today = Utc::now().date_naive();
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM custom_events e
            LEFT JOIN users u ON u.id = e.created_by
            WHERE (e.created_by = $1 OR e.is_shared) AND e.date >= $2
            ORDER BY e.date ASC
            LIMIT 10
            "#
        ))
        .bind(user.user_id)
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(EventRow::into_response).collect()
    }

    /// Events in the given month visible to the caller
    pub async fn event_calendar(
        &self,
        user: &AuthUser,
        query: MonthQuery,
    ) -> AppResult<Vec<EventResponse>> {
        let now = Utc::now().date_naive();
        let (_, _, first_day, next_month) = Self::month_bounds(&query, now)?;

        let rows = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM custom_events e
            LEFT JOIN users u ON u.id = e.created_by
            WHERE (e.created_by = $1 OR e.is_shared)
              AND e.date >= $2 AND e.date < $3
            ORDER BY e.date ASC
            "#
        ))
        .bind(user.user_id)
        .bind(first_day)
        .bind(next_month)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(EventRow::into_response).collect()
    }

    async fn fetch_event(&self, event_id: Uuid) -> AppResult<EventResponse> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM custom_events e
            LEFT JOIN users u ON u.id = e.created_by
            WHERE e.id = $1
            "#
        ))
        .bind(event_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event".to_string()))?;

        row.into_response()
    }

    fn check_event_owner(user: &AuthUser, event: &EventResponse) -> AppResult<()> {
        if user.is_admin() || event.event.created_by == Some(user.user_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only the creator may modify this event".to_string(),
            ))
        }
    }

    fn check_dates(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
        if let Err(msg) = validate_date_range(start, end) {
            return Err(AppError::Validation {
                field: "end_date".to_string(),
                message: msg.to_string(),
                message_th: "วันสิ้นสุดต้องไม่มาก่อนวันเริ่ม".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve a month query to `[first_day, first_of_next_month)`,
    /// defaulting to the current month
    fn month_bounds(
        query: &MonthQuery,
        today: NaiveDate,
    ) -> AppResult<(i32, u32, NaiveDate, NaiveDate)> {
        use chrono::Datelike;

        let year = query.year.unwrap_or_else(|| today.year());
        let month = query.month.unwrap_or_else(|| today.month());
        if !(1..=12).contains(&month) {
            return Err(AppError::ValidationError(
                "Month must be between 1 and 12".to_string(),
            ));
        }
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::ValidationError("Invalid year/month".to_string()))?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| AppError::ValidationError("Invalid year/month".to_string()))?;

        Ok((year, month, first_day, next_month))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let query = MonthQuery {
            year: None,
            month: None,
        };
        let (year, month, first, next) = CalendarService::month_bounds(&query, today).unwrap();
        assert_eq!((year, month), (2026, 8));
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(next, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
    }

    #[test]
    fn test_month_bounds_december_wraps() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let query = MonthQuery {
            year: Some(2026),
            month: Some(12),
        };
        let (_, _, first, next) = CalendarService::month_bounds(&query, today).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(next, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    }

    #[test]
    fn test_month_bounds_rejects_bad_month() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let query = MonthQuery {
            year: Some(2026),
            month: Some(13),
        };
        assert!(CalendarService::month_bounds(&query, today).is_err());
    }
}
