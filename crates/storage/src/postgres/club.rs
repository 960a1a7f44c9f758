use async_trait::async_trait;

use super::PgStore;
use crate::error::Result;
use crate::models::{Club, NewClub};
use crate::repository::ClubStore;

const CLUB_COLUMNS: &str = "id, external_id, name, short_name, country, city, created_at";

#[async_trait]
impl ClubStore for PgStore {
    async fn list_clubs(&mut self) -> Result<Vec<Club>> {
        let clubs = sqlx::query_as::<_, Club>(&format!(
            "SELECT {CLUB_COLUMNS} FROM clubs ORDER BY id"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(clubs)
    }

    async fn find_club_by_name(&mut self, name: &str) -> Result<Option<Club>> {
        let club = sqlx::query_as::<_, Club>(&format!(
            "SELECT {CLUB_COLUMNS} FROM clubs WHERE name = $1 ORDER BY id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(club)
    }

    async fn insert_club(&mut self, club: NewClub) -> Result<Club> {
        let club = sqlx::query_as::<_, Club>(&format!(
            "INSERT INTO clubs (external_id, name, short_name, country, city) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CLUB_COLUMNS}"
        ))
        .bind(club.external_id)
        .bind(club.name)
        .bind(club.short_name)
        .bind(club.country)
        .bind(club.city)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(club)
    }

    async fn update_club(&mut self, club: &Club) -> Result<()> {
        sqlx::query(
            "UPDATE clubs SET name = $1, short_name = $2, country = $3, city = $4 WHERE id = $5",
        )
        .bind(&club.name)
        .bind(&club.short_name)
        .bind(&club.country)
        .bind(&club.city)
        .bind(club.id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn count_club_athletes(&mut self, club_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM athletes WHERE club_id = $1")
            .bind(club_id)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count)
    }

    async fn reassign_club_athletes(&mut self, from: i64, to: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE athletes SET club_id = $1 WHERE club_id = $2")
            .bind(to)
            .bind(from)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_club(&mut self, club_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM clubs WHERE id = $1")
            .bind(club_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }
}
