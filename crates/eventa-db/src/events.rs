//! Event repository: submission writes, moderation transitions, and
//! visibility-guarded reads.
//!
//! Writes maintain the plain and accent-folded search projections so the
//! search layer never recomputes them at query time. Content edits reset
//! moderation to Pending; the caller re-queues an AI review.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use eventa_core::language::fold_accents;
use eventa_core::models::{
    CreateEventRequest, Event, EventCategory, EventStatus, ModerationStatus, Price,
};
use eventa_core::traits::EventRepository;
use eventa_core::{Error, Result};

/// Columns selected for every event read.
pub(crate) const EVENT_COLUMNS: &str = "e.id, e.title, e.description, e.starts_at, e.ends_at, \
     e.timezone, e.venue_name, e.address, e.city, e.country, e.lat, e.lng, \
     e.categories, e.price_free, e.price_amount, e.status, e.moderation, \
     e.search_text, e.search_text_folded, e.image_url, e.created_at, e.updated_at";

/// PostgreSQL event repository.
#[derive(Clone)]
pub struct PgEventRepository {
    pool: Pool<Postgres>,
}

impl PgEventRepository {
    /// Create a new repository over the given pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a database row into an [`Event`].
    pub(crate) fn parse_event_row(row: &PgRow) -> Event {
        let categories: Vec<String> = row.get("categories");
        let status: String = row.get("status");
        let moderation: String = row.get("moderation");

        Event {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            starts_at: row.get("starts_at"),
            ends_at: row.get("ends_at"),
            timezone: row.get("timezone"),
            venue_name: row.get("venue_name"),
            address: row.get("address"),
            city: row.get("city"),
            country: row.get("country"),
            lat: row.get("lat"),
            lng: row.get("lng"),
            categories: categories
                .iter()
                .filter_map(|c| EventCategory::parse(c))
                .collect(),
            price: Price {
                free: row.get("price_free"),
                amount: row.get("price_amount"),
            },
            status: EventStatus::from_str_or_draft(&status),
            moderation: ModerationStatus::from_str_or_pending(&moderation),
            search_text: row.get("search_text"),
            search_text_folded: row.get("search_text_folded"),
            image_url: row.get("image_url"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// Plain search projection: title + description + venue + city.
fn search_text(req: &CreateEventRequest) -> String {
    let mut parts = vec![req.title.trim(), req.description.trim()];
    if let Some(venue) = req.venue_name.as_deref() {
        parts.push(venue.trim());
    }
    if let Some(city) = req.city.as_deref() {
        parts.push(city.trim());
    }
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn insert(&self, req: &CreateEventRequest) -> Result<Uuid> {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let text = search_text(req);
        let folded = fold_accents(&text);
        let categories: Vec<String> = req
            .categories
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();

        sqlx::query(
            "INSERT INTO events (id, title, description, starts_at, ends_at, timezone, \
             venue_name, address, city, country, lat, lng, categories, price_free, \
             price_amount, status, moderation, search_text, search_text_folded, image_url, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13::text[], $14, \
             $15, 'draft', 'pending', $16, $17, $18, $19, $19)",
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.starts_at)
        .bind(req.ends_at)
        .bind(&req.timezone)
        .bind(&req.venue_name)
        .bind(&req.address)
        .bind(&req.city)
        .bind(&req.country)
        .bind(req.lat)
        .bind(req.lng)
        .bind(&categories)
        .bind(req.price.free)
        .bind(req.price.amount)
        .bind(&text)
        .bind(&folded)
        .bind(&req.image_url)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "events",
            op = "insert",
            event_id = %id,
            "Inserted event as draft/pending"
        );
        Ok(id)
    }

    async fn update(&self, id: Uuid, req: &CreateEventRequest) -> Result<()> {
        let now = Utc::now();
        let text = search_text(req);
        let folded = fold_accents(&text);
        let categories: Vec<String> = req
            .categories
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();

        // A content edit invalidates the previous review.
        let result = sqlx::query(
            "UPDATE events SET title = $2, description = $3, starts_at = $4, ends_at = $5, \
             timezone = $6, venue_name = $7, address = $8, city = $9, country = $10, \
             lat = $11, lng = $12, categories = $13::text[], price_free = $14, \
             price_amount = $15, moderation = 'pending', search_text = $16, \
             search_text_folded = $17, image_url = $18, updated_at = $19 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.starts_at)
        .bind(req.ends_at)
        .bind(&req.timezone)
        .bind(&req.venue_name)
        .bind(&req.address)
        .bind(&req.city)
        .bind(&req.country)
        .bind(req.lat)
        .bind(req.lng)
        .bind(&categories)
        .bind(req.price.free)
        .bind(req.price.amount)
        .bind(&text)
        .bind(&folded)
        .bind(&req.image_url)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::EventNotFound(id));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Event>> {
        let sql = format!("SELECT {} FROM events e WHERE e.id = $1", EVENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::parse_event_row))
    }

    async fn get_public(&self, id: Uuid) -> Result<Option<Event>> {
        let sql = format!(
            "SELECT {} FROM events e \
             WHERE e.id = $1 AND e.status = 'published' AND e.moderation = 'approved'",
            EVENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::parse_event_row))
    }

    async fn set_moderation(&self, id: Uuid, status: ModerationStatus) -> Result<()> {
        let result = sqlx::query("UPDATE events SET moderation = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::EventNotFound(id));
        }

        debug!(
            subsystem = "db",
            component = "events",
            op = "set_moderation",
            event_id = %id,
            moderation = status.as_str(),
            "Recorded moderation verdict"
        );
        Ok(())
    }

    async fn publish(&self, id: Uuid) -> Result<()> {
        let result =
            sqlx::query("UPDATE events SET status = 'published', updated_at = $2 WHERE id = $1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::EventNotFound(id));
        }
        Ok(())
    }
}
