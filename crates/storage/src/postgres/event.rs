use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;

use super::PgStore;
use crate::error::Result;
use crate::models::{Category, Event, NewCategory, NewEvent, NewSegment, Segment};
use crate::repository::EventStore;

const EVENT_COLUMNS: &str = "id, external_id, name, long_name, place, venue, begin_date, end_date, \
     language, event_type, competition_type, status, calculation_time, created_at";

const CATEGORY_COLUMNS: &str = "id, event_id, external_id, name, tv_name, normalized_name, \
     num_entries, num_participants, level, gender, category_type, status";

const SEGMENT_COLUMNS: &str = "id, category_id, external_id, name, tv_name, short_name, \
     segment_type, factor, status, component_factors";

#[async_trait]
impl EventStore for PgStore {
    async fn find_event(
        &mut self,
        name: &str,
        begin_date: Option<NaiveDate>,
    ) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE name = $1 AND begin_date IS NOT DISTINCT FROM $2 \
             ORDER BY id LIMIT 1"
        ))
        .bind(name)
        .bind(begin_date)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(event)
    }

    async fn insert_event(&mut self, event: NewEvent) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events (external_id, name, long_name, place, venue, begin_date, end_date, \
                 language, event_type, competition_type, status, calculation_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(event.external_id)
        .bind(event.name)
        .bind(event.long_name)
        .bind(event.place)
        .bind(event.venue)
        .bind(event.begin_date)
        .bind(event.end_date)
        .bind(event.language)
        .bind(event.event_type)
        .bind(event.competition_type)
        .bind(event.status)
        .bind(event.calculation_time)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(event)
    }

    async fn insert_category(&mut self, category: NewCategory) -> Result<Category> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (event_id, external_id, name, tv_name, normalized_name, \
                 num_entries, num_participants, level, gender, category_type, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(category.event_id)
        .bind(category.external_id)
        .bind(category.name)
        .bind(category.tv_name)
        .bind(category.normalized_name)
        .bind(category.num_entries)
        .bind(category.num_participants)
        .bind(category.level)
        .bind(category.gender)
        .bind(category.category_type)
        .bind(category.status)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(category)
    }

    async fn insert_segment(&mut self, segment: NewSegment) -> Result<Segment> {
        let segment = sqlx::query_as::<_, Segment>(&format!(
            "INSERT INTO segments (category_id, external_id, name, tv_name, short_name, \
                 segment_type, factor, status, component_factors) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {SEGMENT_COLUMNS}"
        ))
        .bind(segment.category_id)
        .bind(segment.external_id)
        .bind(segment.name)
        .bind(segment.tv_name)
        .bind(segment.short_name)
        .bind(segment.segment_type)
        .bind(segment.factor)
        .bind(segment.status)
        .bind(Json(segment.component_factors))
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(segment)
    }
}
