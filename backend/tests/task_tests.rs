//! Task lifecycle tests
//!
//! The status state machine, due-date urgency, and the accumulating notes
//! behavior.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use shared::{validate_transition, Task, TaskPriority, TaskStatus, TaskType};

const ALL_STATUSES: [TaskStatus; 4] = [
    TaskStatus::Pending,
    TaskStatus::InProgress,
    TaskStatus::Completed,
    TaskStatus::Cancelled,
];

fn task(status: TaskStatus, due_in_days: i64) -> Task {
    let now = Utc::now();
    Task {
        id: Uuid::new_v4(),
        title: "ตรวจนับสต็อกก่อนสงกรานต์".to_string(),
        description: Some("นับของโซน A ทั้งหมด".to_string()),
        task_type: TaskType::InventoryCheck,
        priority: TaskPriority::Urgent,
        status,
        assigned_to: Uuid::new_v4(),
        created_by: Some(Uuid::new_v4()),
        festival_id: None,
        target_quantity: None,
        actual_quantity: None,
        notes: None,
        due_date: now + Duration::days(due_in_days),
        completed_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// The notes accumulation rule used by update_status
fn append_note(existing: Option<&str>, stamp: &str, note: &str) -> String {
    let mut combined = existing.unwrap_or_default().to_string();
    if !combined.is_empty() {
        combined.push('\n');
    }
    combined.push_str(&format!("[{}] {}", stamp, note));
    combined
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// The full transition table, exhaustively
    #[test]
    fn test_transition_table() {
        let allowed = [
            (TaskStatus::Pending, TaskStatus::InProgress),
            (TaskStatus::Pending, TaskStatus::Cancelled),
            (TaskStatus::InProgress, TaskStatus::Completed),
            (TaskStatus::InProgress, TaskStatus::Cancelled),
        ];

        for from in ALL_STATUSES {
            for to in ALL_STATUSES {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    validate_transition(from, to).is_ok(),
                    expected,
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    /// completed -> in_progress is specifically rejected
    #[test]
    fn test_completed_cannot_reopen() {
        let err = validate_transition(TaskStatus::Completed, TaskStatus::InProgress).unwrap_err();
        assert_eq!(err.from, TaskStatus::Completed);
        assert_eq!(err.to, TaskStatus::InProgress);
    }

    #[test]
    fn test_cancelled_is_terminal() {
        for to in ALL_STATUSES {
            assert!(validate_transition(TaskStatus::Cancelled, to).is_err());
        }
    }

    #[test]
    fn test_days_until_due_sign() {
        let now = Utc::now();
        assert_eq!(task(TaskStatus::Pending, 5).days_until_due(now), Some(5));
        assert_eq!(task(TaskStatus::InProgress, 0).days_until_due(now), Some(0));
        // Negative means overdue
        assert_eq!(task(TaskStatus::Pending, -3).days_until_due(now), Some(-3));
    }

    #[test]
    fn test_days_until_due_none_for_terminal() {
        let now = Utc::now();
        assert_eq!(task(TaskStatus::Completed, 5).days_until_due(now), None);
        assert_eq!(task(TaskStatus::Cancelled, -5).days_until_due(now), None);
    }

    #[test]
    fn test_overdue_only_for_open_tasks() {
        let now = Utc::now();
        assert!(task(TaskStatus::Pending, -1).is_overdue(now));
        assert!(task(TaskStatus::InProgress, -1).is_overdue(now));
        assert!(!task(TaskStatus::Completed, -1).is_overdue(now));
        assert!(!task(TaskStatus::Cancelled, -1).is_overdue(now));
    }

    #[test]
    fn test_notes_accumulate() {
        let first = append_note(None, "2026-08-06 14:00", "เริ่มงานแล้ว");
        assert_eq!(first, "[2026-08-06 14:00] เริ่มงานแล้ว");

        let second = append_note(Some(&first), "2026-08-06 16:30", "เสร็จครึ่งแรก");
        assert_eq!(
            second,
            "[2026-08-06 14:00] เริ่มงานแล้ว\n[2026-08-06 16:30] เสร็จครึ่งแรก"
        );
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn status_strategy() -> impl Strategy<Value = TaskStatus> {
        prop_oneof![
            Just(TaskStatus::Pending),
            Just(TaskStatus::InProgress),
            Just(TaskStatus::Completed),
            Just(TaskStatus::Cancelled),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Terminal states never accept a transition, from anywhere
        #[test]
        fn prop_terminal_states_absorb(from in status_strategy(), to in status_strategy()) {
            if from.is_terminal() {
                prop_assert!(validate_transition(from, to).is_err());
            }
        }

        /// No transition ever loops back to pending and none self-loops
        #[test]
        fn prop_no_backwards_or_self_transitions(from in status_strategy(), to in status_strategy()) {
            if to == TaskStatus::Pending || from == to {
                prop_assert!(validate_transition(from, to).is_err());
            }
        }

        /// Any legal sequence of transitions visits pending at most once
        /// and ends open or terminal after at most 2 steps
        #[test]
        fn prop_lifecycle_is_short(steps in prop::collection::vec(status_strategy(), 0..10)) {
            let mut current = TaskStatus::Pending;
            let mut applied = 0;
            for next in steps {
                if validate_transition(current, next).is_ok() {
                    current = next;
                    applied += 1;
                }
            }
            // pending -> in_progress -> completed is the longest chain
            prop_assert!(applied <= 2);
        }

        /// Appending notes never loses earlier entries
        #[test]
        fn prop_notes_never_lost(notes in prop::collection::vec("[a-z]{1,8}", 1..6)) {
            let mut accumulated: Option<String> = None;
            for note in &notes {
                accumulated = Some(append_note(accumulated.as_deref(), "stamp", note));
            }
            let finished = accumulated.unwrap();
            for note in &notes {
                prop_assert!(finished.contains(note.as_str()));
            }
            prop_assert_eq!(finished.lines().count(), notes.len());
        }
    }
}
