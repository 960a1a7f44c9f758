use async_trait::async_trait;

use super::PgStore;
use crate::error::Result;
use crate::models::{Athlete, NewAthlete};
use crate::repository::AthleteStore;

const ATHLETE_COLUMNS: &str = "id, external_id, first_name, last_name, patronymic, full_name_xml, \
     lookup_key, birth_date, gender, country, club_id, created_at";

#[async_trait]
impl AthleteStore for PgStore {
    async fn find_athlete_by_lookup_key(&mut self, key: &str) -> Result<Option<Athlete>> {
        let athlete = sqlx::query_as::<_, Athlete>(&format!(
            "SELECT {ATHLETE_COLUMNS} FROM athletes WHERE lookup_key = $1 ORDER BY id LIMIT 1"
        ))
        .bind(key)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(athlete)
    }

    async fn insert_athlete(&mut self, athlete: NewAthlete) -> Result<Athlete> {
        let athlete = sqlx::query_as::<_, Athlete>(&format!(
            "INSERT INTO athletes (external_id, first_name, last_name, patronymic, full_name_xml, \
                 lookup_key, birth_date, gender, country, club_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ATHLETE_COLUMNS}"
        ))
        .bind(athlete.external_id)
        .bind(athlete.first_name)
        .bind(athlete.last_name)
        .bind(athlete.patronymic)
        .bind(athlete.full_name_xml)
        .bind(athlete.lookup_key)
        .bind(athlete.birth_date)
        .bind(athlete.gender)
        .bind(athlete.country)
        .bind(athlete.club_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(athlete)
    }

    async fn update_athlete(&mut self, athlete: &Athlete) -> Result<()> {
        sqlx::query(
            "UPDATE athletes SET first_name = $1, last_name = $2, patronymic = $3, \
                 full_name_xml = $4, lookup_key = $5, birth_date = $6, gender = $7, \
                 country = $8, club_id = $9 \
             WHERE id = $10",
        )
        .bind(&athlete.first_name)
        .bind(&athlete.last_name)
        .bind(&athlete.patronymic)
        .bind(&athlete.full_name_xml)
        .bind(&athlete.lookup_key)
        .bind(athlete.birth_date)
        .bind(&athlete.gender)
        .bind(&athlete.country)
        .bind(athlete.club_id)
        .bind(athlete.id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }
}
