use std::collections::HashSet;

use skating_storage::ClubStore;
use skating_storage::models::{Club, NewClub};
use tracing::{debug, info};

use super::session::ImportSession;
use super::upgrade;
use crate::error::Result;
use crate::normalize::{fix_latin_to_cyrillic, normalize_optional, normalize_string};
use crate::similarity::{ClubNameSimilarity, SequenceMatcher, SimilarityStrategy};
use crate::xml::ClubRecord;

/// One club folded into another by [`ClubRegistry::merge_all_duplicates`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClubMerge {
    pub kept_id: i64,
    pub removed_id: i64,
    pub athletes_moved: u64,
}

/// Resolves club records to stored clubs, reusing an existing row whenever the
/// name matches exactly or is similar enough under the merge policy.
#[derive(Debug, Clone, Default)]
pub struct ClubRegistry<S = SequenceMatcher> {
    similarity: ClubNameSimilarity<S>,
}

impl<S: SimilarityStrategy> ClubRegistry<S> {
    pub fn new(similarity: ClubNameSimilarity<S>) -> Self {
        Self { similarity }
    }

    /// Registers a club, returning `None` when its name is blank.
    pub async fn register<St>(
        &self,
        store: &mut St,
        session: &mut ImportSession,
        record: &ClubRecord,
    ) -> Result<Option<Club>>
    where
        St: ClubStore + ?Sized,
    {
        let name = normalize_string(&fix_latin_to_cyrillic(&record.name));
        if name.is_empty() {
            return Ok(None);
        }
        let short_name = record
            .short_name
            .as_deref()
            .map(fix_latin_to_cyrillic)
            .and_then(|s| normalize_optional(Some(s.as_str())));
        let country = normalize_optional(record.country.as_deref());
        let city = normalize_optional(record.city.as_deref());

        let existing = match session.cached_club(&name) {
            Some(club) => Some(club.clone()),
            None => self.find_existing(store, &name, &record.name).await?,
        };

        let club = match existing {
            Some(mut club) => {
                let mut changed = false;
                if super::should_update(Some(&club.name), Some(&name)) {
                    club.name = name.clone();
                    changed = true;
                }
                changed |= upgrade(&mut club.short_name, short_name.as_deref());
                changed |= upgrade(&mut club.country, country.as_deref());
                changed |= upgrade(&mut club.city, city.as_deref());
                if changed {
                    store.update_club(&club).await?;
                    session.refresh_club(&club);
                    debug!(club_id = club.id, name = %club.name, "Club details upgraded");
                }
                club
            }
            None => {
                let club = store
                    .insert_club(NewClub {
                        external_id: record.external_id.clone(),
                        name: name.clone(),
                        short_name,
                        country,
                        city,
                    })
                    .await?;
                debug!(club_id = club.id, name = %club.name, "Club created");
                club
            }
        };

        session.cache_club(name, club.clone());
        Ok(Some(club))
    }

    /// Exact normalized match first; otherwise the most similar club at or
    /// above the merge threshold.
    async fn find_existing<St>(&self, store: &mut St, name: &str, raw_name: &str) -> Result<Option<Club>>
    where
        St: ClubStore + ?Sized,
    {
        if let Some(club) = store.find_club_by_name(name).await? {
            return Ok(Some(club));
        }

        let mut best: Option<(Club, f64)> = None;
        for club in store.list_clubs().await? {
            if club.name.is_empty() {
                continue;
            }
            if normalize_string(&fix_latin_to_cyrillic(&club.name)) == name {
                return Ok(Some(club));
            }
            let score = self.similarity.similarity(&club.name, raw_name);
            if !self.similarity.thresholds().is_merge(score) {
                continue;
            }
            if best.as_ref().is_none_or(|(_, best_score)| score > *best_score) {
                best = Some((club, score));
            }
        }

        Ok(best.map(|(club, score)| {
            info!(
                incoming = raw_name,
                existing = %club.name,
                similarity = %format!("{:.1}%", score * 100.0),
                "Merging similar club name into existing club"
            );
            club
        }))
    }

    /// Folds every group of similar clubs in the store into one club.
    ///
    /// Groups are the connected components of the "similar" relation. The
    /// survivor has the most athletes, then the longest name, then the lowest
    /// id. Athletes move to it, its empty country, city and short name are
    /// filled from the removed clubs, and the removed rows are deleted.
    pub async fn merge_all_duplicates<St>(
        &self,
        store: &mut St,
        session: &mut ImportSession,
    ) -> Result<Vec<ClubMerge>>
    where
        St: ClubStore + ?Sized,
    {
        let clubs = store.list_clubs().await?;
        let mut merges = Vec::new();
        let mut grouped = HashSet::new();

        for start in 0..clubs.len() {
            if clubs[start].name.is_empty() || grouped.contains(&start) {
                continue;
            }
            grouped.insert(start);
            let mut group = vec![start];
            let mut pending = vec![start];
            while let Some(current) = pending.pop() {
                for candidate in 0..clubs.len() {
                    if grouped.contains(&candidate) || clubs[candidate].name.is_empty() {
                        continue;
                    }
                    if self
                        .similarity
                        .is_match(&clubs[current].name, &clubs[candidate].name)
                    {
                        grouped.insert(candidate);
                        group.push(candidate);
                        pending.push(candidate);
                    }
                }
            }
            if group.len() < 2 {
                continue;
            }

            let members: Vec<Club> = group.into_iter().map(|i| clubs[i].clone()).collect();
            merges.extend(self.merge_group(store, session, members).await?);
        }

        if !merges.is_empty() {
            info!(merged = merges.len(), "Merged duplicate clubs");
        }
        Ok(merges)
    }

    async fn merge_group<St>(
        &self,
        store: &mut St,
        session: &mut ImportSession,
        members: Vec<Club>,
    ) -> Result<Vec<ClubMerge>>
    where
        St: ClubStore + ?Sized,
    {
        let mut ranked = Vec::with_capacity(members.len());
        for club in members {
            let athletes = store.count_club_athletes(club.id).await?;
            ranked.push((athletes, club));
        }
        ranked.sort_by(|(a_count, a), (b_count, b)| {
            b_count
                .cmp(a_count)
                .then_with(|| b.name.chars().count().cmp(&a.name.chars().count()))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut ranked = ranked.into_iter().map(|(_, club)| club);
        let Some(mut kept) = ranked.next() else {
            return Ok(Vec::new());
        };

        let mut merges = Vec::new();
        let mut changed = false;
        for removed in ranked {
            let athletes_moved = store.reassign_club_athletes(removed.id, kept.id).await?;
            changed |= super::fill(&mut kept.country, removed.country.as_ref());
            changed |= super::fill(&mut kept.city, removed.city.as_ref());
            changed |= super::fill(&mut kept.short_name, removed.short_name.as_ref());
            store.delete_club(removed.id).await?;
            session.repoint_club(removed.id, &kept);

            info!(
                removed = %removed.name,
                kept = %kept.name,
                athletes_moved,
                "Merged duplicate club"
            );
            merges.push(ClubMerge {
                kept_id: kept.id,
                removed_id: removed.id,
                athletes_moved,
            });
        }

        if changed {
            store.update_club(&kept).await?;
            session.refresh_club(&kept);
        }
        Ok(merges)
    }
}
