use skating_storage::CoachStore;
use skating_storage::models::{Coach, NewCoach};
use tracing::debug;

use super::session::ImportSession;
use crate::error::Result;
use crate::normalize::{fix_latin_to_cyrillic, normalize_string};

/// Deduplicates coaches by their normalized name. Case is preserved in the
/// key, so "Иванова А.А." and "ИВАНОВА А.А." stay distinct.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoachRegistry;

impl CoachRegistry {
    pub fn normalized_name(raw: &str) -> String {
        normalize_string(&fix_latin_to_cyrillic(raw))
    }

    /// Returns the coach for `raw`, creating it on first sight. Blank names
    /// yield `None`.
    pub async fn get_or_create<St>(
        &self,
        store: &mut St,
        session: &mut ImportSession,
        raw: &str,
    ) -> Result<Option<Coach>>
    where
        St: CoachStore + ?Sized,
    {
        let normalized_name = Self::normalized_name(raw);
        if normalized_name.is_empty() {
            return Ok(None);
        }
        if let Some(coach) = session.cached_coach(&normalized_name) {
            return Ok(Some(coach.clone()));
        }

        let coach = match store.find_coach_by_normalized_name(&normalized_name).await? {
            Some(coach) => coach,
            None => {
                let coach = store
                    .insert_coach(NewCoach {
                        name: raw.trim().to_string(),
                        normalized_name,
                    })
                    .await?;
                debug!(coach_id = coach.id, name = %coach.name, "Coach created");
                coach
            }
        };
        session.cache_coach(coach.clone());
        Ok(Some(coach))
    }
}

#[cfg(test)]
mod tests {
    use skating_storage::{Database, MemoryDatabase};

    use super::*;

    #[tokio::test]
    async fn test_spellings_share_one_coach() {
        let db = MemoryDatabase::new();
        let mut store = db.begin().await.unwrap();
        let mut session = ImportSession::new();

        let a = CoachRegistry
            .get_or_create(&mut store, &mut session, " Иванова  А.А. ")
            .await
            .unwrap()
            .unwrap();
        // Latin "A" repaired to Cyrillic.
        let mut other_session = ImportSession::new();
        let b = CoachRegistry
            .get_or_create(&mut store, &mut other_session, "Иванова A.A.")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(a.id, b.id);
        assert_eq!(a.name, "Иванова  А.А.");
        assert_eq!(a.normalized_name, "Иванова А.А.");
    }

    #[tokio::test]
    async fn test_case_is_significant() {
        let db = MemoryDatabase::new();
        let mut store = db.begin().await.unwrap();
        let mut session = ImportSession::new();

        let a = CoachRegistry
            .get_or_create(&mut store, &mut session, "Петров Б.Б.")
            .await
            .unwrap()
            .unwrap();
        let b = CoachRegistry
            .get_or_create(&mut store, &mut session, "ПЕТРОВ Б.Б.")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_blank_name() {
        let db = MemoryDatabase::new();
        let mut store = db.begin().await.unwrap();
        let mut session = ImportSession::new();
        let coach = CoachRegistry
            .get_or_create(&mut store, &mut session, " \t ")
            .await
            .unwrap();
        assert!(coach.is_none());
    }
}
