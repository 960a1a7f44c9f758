use chrono::NaiveDate;
use skating_storage::AthleteStore;
use skating_storage::models::{Athlete, AthleteLookupKey, NewAthlete};
use tracing::debug;

use super::{fill, should_update, upgrade};
use crate::error::Result;
use crate::normalize::normalize_optional;

/// Person fields resolved by the import, before deduplication.
#[derive(Debug, Clone, Default)]
pub struct AthletePayload {
    pub external_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub patronymic: Option<String>,
    pub full_name_xml: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub club_id: Option<i64>,
}

impl AthletePayload {
    pub fn lookup_key(&self) -> Option<AthleteLookupKey> {
        AthleteLookupKey::new(
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default(),
            self.birth_date,
        )
    }
}

/// Deduplicates athletes by [`AthleteLookupKey`]. Without a complete key
/// every call creates a new athlete.
#[derive(Debug, Clone, Copy, Default)]
pub struct AthleteRegistry;

impl AthleteRegistry {
    pub async fn get_or_create<St>(&self, store: &mut St, payload: AthletePayload) -> Result<Athlete>
    where
        St: AthleteStore + ?Sized,
    {
        let payload = AthletePayload {
            first_name: normalize_optional(payload.first_name.as_deref()),
            last_name: normalize_optional(payload.last_name.as_deref()),
            patronymic: normalize_optional(payload.patronymic.as_deref()),
            full_name_xml: normalize_optional(payload.full_name_xml.as_deref()),
            ..payload
        };
        let key = payload.lookup_key();

        let existing = match &key {
            Some(key) => store.find_athlete_by_lookup_key(key.as_str()).await?,
            None => None,
        };

        match existing {
            Some(mut athlete) => {
                if Self::merge_into(&mut athlete, &payload, key) {
                    store.update_athlete(&athlete).await?;
                    debug!(athlete_id = athlete.id, "Athlete details upgraded");
                }
                Ok(athlete)
            }
            None => {
                let athlete = store
                    .insert_athlete(NewAthlete {
                        external_id: payload.external_id,
                        first_name: payload.first_name.unwrap_or_default(),
                        last_name: payload.last_name.unwrap_or_default(),
                        patronymic: payload.patronymic,
                        full_name_xml: payload.full_name_xml,
                        lookup_key: key.map(AthleteLookupKey::into_inner),
                        birth_date: payload.birth_date,
                        gender: payload.gender,
                        country: payload.country,
                        club_id: payload.club_id,
                    })
                    .await?;
                debug!(athlete_id = athlete.id, name = %athlete.display_name(), "Athlete created");
                Ok(athlete)
            }
        }
    }

    /// Longer names win; everything else is only filled when missing.
    fn merge_into(athlete: &mut Athlete, payload: &AthletePayload, key: Option<AthleteLookupKey>) -> bool {
        let mut changed = false;
        if should_update(Some(&athlete.first_name), payload.first_name.as_deref()) {
            athlete.first_name = payload.first_name.clone().unwrap_or_default();
            changed = true;
        }
        if should_update(Some(&athlete.last_name), payload.last_name.as_deref()) {
            athlete.last_name = payload.last_name.clone().unwrap_or_default();
            changed = true;
        }
        changed |= upgrade(&mut athlete.patronymic, payload.patronymic.as_deref());
        changed |= upgrade(&mut athlete.full_name_xml, payload.full_name_xml.as_deref());
        changed |= fill(&mut athlete.external_id, payload.external_id.as_ref());
        changed |= fill(&mut athlete.birth_date, payload.birth_date.as_ref());
        changed |= fill(&mut athlete.gender, payload.gender.as_ref());
        changed |= fill(&mut athlete.country, payload.country.as_ref());
        changed |= fill(&mut athlete.club_id, payload.club_id.as_ref());
        changed |= fill(&mut athlete.lookup_key, key.map(AthleteLookupKey::into_inner).as_ref());
        changed
    }
}
