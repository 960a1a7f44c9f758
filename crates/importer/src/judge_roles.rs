//! Functional roles for judge panel seats that the export left generic.
//!
//! The last seat of every panel is the data operator. Full ISU panels (ten
//! seats or more) additionally put the technical team at seats 7, 8 and 9.

use std::collections::HashMap;

use serde::Serialize;
use skating_storage::JudgeStore;
use tracing::info;

use crate::error::Result;

/// Smallest panel carrying a technical team at fixed seats.
pub const FULL_PANEL_SIZE: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JudgeRole {
    DataOperator,
    TechnicalController,
    TechnicalSpecialist,
    AssistantTechnicalSpecialist,
}

impl JudgeRole {
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::DataOperator => "DO",
            Self::TechnicalController => "TC",
            Self::TechnicalSpecialist => "TS",
            Self::AssistantTechnicalSpecialist => "ATS",
        }
    }
}

/// Role of the judge at 1-based seat `order` in a panel of `panel_size`.
pub fn role_for_order(order: i32, panel_size: i32) -> Option<JudgeRole> {
    if order <= 0 || panel_size <= 0 {
        return None;
    }
    if order == panel_size {
        return Some(JudgeRole::DataOperator);
    }
    if panel_size < FULL_PANEL_SIZE {
        return None;
    }
    match order {
        7 => Some(JudgeRole::TechnicalController),
        8 => Some(JudgeRole::TechnicalSpecialist),
        9 => Some(JudgeRole::AssistantTechnicalSpecialist),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleChange {
    pub panel_id: i64,
    pub segment_id: i64,
    pub judge_id: i64,
    pub order_num: i32,
    pub role: JudgeRole,
}

/// Assigns roles to panel entries whose role code is still generic. With
/// `dry_run` the changes are only computed.
pub async fn assign_judge_roles<St>(store: &mut St, dry_run: bool) -> Result<Vec<RoleChange>>
where
    St: JudgeStore + ?Sized,
{
    let panels = store.list_panels().await?;

    let mut panel_sizes: HashMap<i64, i32> = HashMap::new();
    for panel in &panels {
        let size = panel_sizes.entry(panel.segment_id).or_default();
        *size = (*size).max(panel.order_num);
    }

    let changes: Vec<RoleChange> = panels
        .iter()
        .filter(|panel| panel.has_unassigned_role())
        .filter_map(|panel| {
            let size = panel_sizes.get(&panel.segment_id).copied()?;
            let role = role_for_order(panel.order_num, size)?;
            Some(RoleChange {
                panel_id: panel.id,
                segment_id: panel.segment_id,
                judge_id: panel.judge_id,
                order_num: panel.order_num,
                role,
            })
        })
        .collect();

    info!(
        panels = panels.len(),
        changes = changes.len(),
        dry_run,
        "Judge roles resolved"
    );
    if dry_run {
        return Ok(changes);
    }

    for change in &changes {
        store
            .update_panel_role(change.panel_id, change.role.as_code())
            .await?;
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use skating_storage::models::{NewJudge, NewJudgePanel};
    use skating_storage::{Database, MemoryDatabase, Store};

    use super::*;

    #[test]
    fn test_last_seat_is_data_operator() {
        for size in 3..=12 {
            assert_eq!(role_for_order(size, size), Some(JudgeRole::DataOperator));
        }
    }

    #[test]
    fn test_technical_team_needs_full_panel() {
        assert_eq!(role_for_order(7, 10), Some(JudgeRole::TechnicalController));
        assert_eq!(role_for_order(8, 10), Some(JudgeRole::TechnicalSpecialist));
        assert_eq!(role_for_order(9, 10), Some(JudgeRole::AssistantTechnicalSpecialist));
        assert_eq!(role_for_order(7, 9), None);
        assert_eq!(role_for_order(1, 10), None);
        assert_eq!(role_for_order(0, 0), None);
    }

    #[test]
    fn test_codes() {
        assert_eq!(JudgeRole::DataOperator.as_code(), "DO");
        assert_eq!(JudgeRole::AssistantTechnicalSpecialist.as_code(), "ATS");
    }

    async fn seed_panel(db: &MemoryDatabase, roles: &[Option<&str>]) {
        let mut store = db.begin().await.unwrap();
        for (index, role) in roles.iter().enumerate() {
            let judge = store
                .insert_judge(NewJudge {
                    last_name: Some(format!("Судья {index}")),
                    ..Default::default()
                })
                .await
                .unwrap();
            store
                .insert_panel(NewJudgePanel {
                    segment_id: 500,
                    judge_id: judge.id,
                    role_code: role.map(str::to_string),
                    order_num: index as i32 + 1,
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        store.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_assign_roles_on_full_panel() {
        let db = MemoryDatabase::new();
        let mut roles = vec![Some("JDG"); 6];
        roles.extend([None, Some(""), Some("J"), Some("REF")]);
        seed_panel(&db, &roles).await;

        let mut store = db.begin().await.unwrap();
        let changes = assign_judge_roles(&mut store, false).await.unwrap();
        store.commit().await.unwrap();

        let assigned: Vec<(i32, &str)> = changes.iter().map(|c| (c.order_num, c.role.as_code())).collect();
        // Seat 10 already carries a specific role and is left alone.
        assert_eq!(assigned, vec![(7, "TC"), (8, "TS"), (9, "ATS")]);
        let stored: Vec<Option<String>> = db
            .snapshot()
            .judge_panels
            .into_iter()
            .map(|p| p.role_code)
            .collect();
        assert_eq!(stored[6].as_deref(), Some("TC"));
        assert_eq!(stored[9].as_deref(), Some("REF"));
    }

    #[tokio::test]
    async fn test_dry_run_changes_nothing() {
        let db = MemoryDatabase::new();
        seed_panel(&db, &[Some("JDG"), Some("JDG"), Some("JDG")]).await;

        let mut store = db.begin().await.unwrap();
        let changes = assign_judge_roles(&mut store, true).await.unwrap();
        store.commit().await.unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].role, JudgeRole::DataOperator);
        let stored = db.snapshot().judge_panels;
        assert!(stored.iter().all(|p| p.role_code.as_deref() == Some("JDG")));
    }
}
