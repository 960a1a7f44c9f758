use std::collections::HashMap;

use skating_storage::models::{Club, Coach};
use uuid::Uuid;

/// Caches scoped to one import run. Create one per file and drop it with the
/// file's transaction; ids cached here are meaningless after a rollback.
#[derive(Debug)]
pub struct ImportSession {
    id: Uuid,
    clubs_by_name: HashMap<String, Club>,
    coaches_by_name: HashMap<String, Coach>,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            clubs_by_name: HashMap::new(),
            coaches_by_name: HashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn cached_club(&self, name: &str) -> Option<&Club> {
        self.clubs_by_name.get(name)
    }

    pub(crate) fn cache_club(&mut self, name: String, club: Club) {
        self.clubs_by_name.insert(name, club);
    }

    /// Replaces every cached copy of `club` after its row changed.
    pub(crate) fn refresh_club(&mut self, club: &Club) {
        for cached in self.clubs_by_name.values_mut() {
            if cached.id == club.id {
                *cached = club.clone();
            }
        }
    }

    /// Points names cached for a merged-away club at the club that absorbed it.
    pub(crate) fn repoint_club(&mut self, removed_id: i64, kept: &Club) {
        for cached in self.clubs_by_name.values_mut() {
            if cached.id == removed_id {
                *cached = kept.clone();
            }
        }
    }

    pub(crate) fn cached_coach(&self, normalized_name: &str) -> Option<&Coach> {
        self.coaches_by_name.get(normalized_name)
    }

    pub(crate) fn cache_coach(&mut self, coach: Coach) {
        self.coaches_by_name
            .insert(coach.normalized_name.clone(), coach);
    }
}
