use crate::{Database, Result, StoreError};
use chrono::{SecondsFormat, Utc};
use mapping::{slugify, FieldMap};
use posts::{Post, PostStatus, StorageProfile};
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Column, Row};
use std::sync::Arc;
use tracing::{debug, info};

/// Filters for the list operation
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<PostStatus>,
    /// Apply the published predicate: status is published and the publish
    /// date, when set, is not in the future
    pub published: bool,
    pub page: u32,
    pub per_page: u32,
}

impl ListFilter {
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    pub fn per_page(&self) -> u32 {
        match self.per_page {
            0 => 15,
            n => n.min(100),
        }
    }
}

/// One page of posts plus the totals the list envelope needs
#[derive(Debug)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl PostPage {
    pub fn last_page(&self) -> i64 {
        if self.total == 0 {
            1
        } else {
            (self.total + self.per_page as i64 - 1) / self.per_page as i64
        }
    }
}

/// CRUD and reconciliation operations over the configured post table.
///
/// All field mapping happens at this boundary: callers speak canonical field
/// names, SQL speaks storage columns.
pub struct PostStore {
    db: Arc<Database>,
    profile: StorageProfile,
}

impl PostStore {
    /// Build a store over a validated storage profile.
    ///
    /// Configuration problems surface here, once, not per call: the table
    /// must exist and every mapped storage column must be present.
    pub async fn open(db: Arc<Database>, profile: StorageProfile) -> Result<Self> {
        if !db.table_exists(&profile.table).await? {
            return Err(StoreError::Configuration(format!(
                "Configured table '{}' does not exist",
                profile.table
            )));
        }

        let columns = db.table_columns(&profile.table).await?;

        // Every query also leans on the row id and the timestamp pair, so a
        // pre-existing host table must carry them too
        let mut required = vec!["id", "created_at", "updated_at"];
        required.extend(profile.mapping.storage_columns());
        for storage in required {
            if !columns.iter().any(|c| c == storage) {
                return Err(StoreError::Configuration(format!(
                    "Table '{}' is missing required column '{}'",
                    profile.table, storage
                )));
            }
        }

        Ok(Self { db, profile })
    }

    pub fn profile(&self) -> &StorageProfile {
        &self.profile
    }

    /// Create a post from canonical data, generating a slug from the title
    /// when none was supplied
    pub async fn create(&self, mut canonical: FieldMap) -> Result<Post> {
        if self.profile.auto_generate_slug && field_is_blank(&canonical, "slug") {
            if let Some(JsonValue::String(title)) = canonical.get("title") {
                let slug = self.generate_unique_slug(title, None).await?;
                canonical.insert("slug".to_string(), JsonValue::String(slug));
            }
        }

        let storage = self.to_storage(&canonical);
        if storage.is_empty() {
            return Err(StoreError::Validation(
                "No mapped fields in payload".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(storage.len());
        let mut placeholders = Vec::with_capacity(storage.len());
        let mut values = Vec::with_capacity(storage.len());
        for (column, value) in &storage {
            columns.push(column.as_str());
            placeholders.push("?");
            values.push(value.clone());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.profile.table,
            columns.join(", "),
            placeholders.join(", ")
        );
        debug!("Executing SQL: {}", sql);

        let mut query = sqlx::query(&sql);
        for value in values {
            query = bind_value(query, value);
        }
        let result = query.execute(self.db.pool()).await?;
        let id = result.last_insert_rowid();

        info!("Created post {} in {}", id, self.profile.table);

        self.find_or_fail(id).await
    }

    /// Overwrite the supplied canonical fields on an existing post.
    ///
    /// The slug is never regenerated here; it only changes when the caller
    /// sends one.
    pub async fn update(&self, id: i64, canonical: FieldMap) -> Result<Post> {
        // A slug change must not steal another row's slug; catching it here
        // turns the would-be unique-index violation into a field error
        if let Some(JsonValue::String(slug)) = canonical.get("slug") {
            if !slug.is_empty() && self.slug_taken(slug, Some(id)).await? {
                return Err(StoreError::DuplicateSlug);
            }
        }

        let storage = self.to_storage(&canonical);
        if storage.is_empty() {
            return self.find_or_fail(id).await;
        }

        let mut set_clauses = vec!["updated_at = CURRENT_TIMESTAMP".to_string()];
        let mut values = Vec::with_capacity(storage.len());
        for (column, value) in &storage {
            set_clauses.push(format!("{} = ?", column));
            values.push(value.clone());
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            self.profile.table,
            set_clauses.join(", ")
        );
        debug!("Executing SQL: {}", sql);

        let mut query = sqlx::query(&sql);
        for value in values {
            query = bind_value(query, value);
        }
        let result = query.bind(id).execute(self.db.pool()).await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("id {}", id)));
        }

        info!("Updated post {} in {}", id, self.profile.table);

        self.find_or_fail(id).await
    }

    /// Create-or-update keyed on slug.
    ///
    /// A payload whose slug already exists updates that post in place, which
    /// makes the create endpoint idempotent under resync. Returns the post
    /// and whether an existing row was updated.
    pub async fn upsert(&self, canonical: FieldMap) -> Result<(Post, bool)> {
        if let Some(JsonValue::String(slug)) = canonical.get("slug") {
            if !slug.is_empty() {
                if let Some(existing) = self.find_by_slug(slug).await? {
                    let updated = self.update(existing.id, canonical).await?;
                    return Ok((updated, true));
                }
            }
        }

        let created = self.create(canonical).await?;
        Ok((created, false))
    }

    /// Derive a free slug from a title.
    ///
    /// Sequential probe: the base slug, then `-1`, `-2`, and so on until no other
    /// row holds it. `exclude_id` keeps an update from colliding with its
    /// own row. The unique index on the slug column remains the final
    /// arbiter under concurrent writers.
    pub async fn generate_unique_slug(
        &self,
        title: &str,
        exclude_id: Option<i64>,
    ) -> Result<String> {
        let base = match slugify(title) {
            s if s.is_empty() => "post".to_string(),
            s => s,
        };

        let mut candidate = base.clone();
        let mut counter = 1u32;
        while self.slug_taken(&candidate, exclude_id).await? {
            candidate = format!("{}-{}", base, counter);
            counter += 1;
        }

        Ok(candidate)
    }

    async fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let sql = format!(
            "SELECT COUNT(*) as count FROM {} WHERE {} = ? AND id != ?",
            self.profile.table,
            self.profile.slug_column()
        );
        let result: (i64,) = sqlx::query_as(&sql)
            .bind(slug)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(self.db.pool())
            .await?;
        Ok(result.0 > 0)
    }

    pub async fn find(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", self.profile.table);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_post(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn find_or_fail(&self, id: i64) -> Result<Post> {
        self.find(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?",
            self.profile.table,
            self.profile.slug_column()
        );
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(row) => Ok(Some(self.row_to_post(&row)?)),
            None => Ok(None),
        }
    }

    /// Delete a post; false means there was nothing to delete
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.profile.table);
        let result = sqlx::query(&sql).bind(id).execute(self.db.pool()).await?;

        if result.rows_affected() > 0 {
            info!("Deleted post {} from {}", id, self.profile.table);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// List posts newest-created-first with optional status/published
    /// filters and pagination
    pub async fn list(&self, filter: &ListFilter) -> Result<PostPage> {
        let (where_sql, binds) = self.filter_clause(filter)?;

        let count_sql = format!(
            "SELECT COUNT(*) as count FROM {}{}",
            self.profile.table, where_sql
        );
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        for bind in &binds {
            count_query = count_query.bind(bind.clone());
        }
        let (total,) = count_query.fetch_one(self.db.pool()).await?;

        let page = filter.page();
        let per_page = filter.per_page();
        let offset = (page as i64 - 1) * per_page as i64;

        let sql = format!(
            "SELECT * FROM {}{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            self.profile.table, where_sql
        );
        debug!("Executing SQL: {}", sql);

        let mut query = sqlx::query(&sql);
        for bind in &binds {
            query = query.bind(bind.clone());
        }
        let rows = query
            .bind(per_page as i64)
            .bind(offset)
            .fetch_all(self.db.pool())
            .await?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            posts.push(self.row_to_post(&row)?);
        }

        Ok(PostPage {
            posts,
            total,
            page,
            per_page,
        })
    }

    fn filter_clause(&self, filter: &ListFilter) -> Result<(String, Vec<String>)> {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        if filter.status.is_some() || filter.published {
            let status_col = self.profile.status_column().ok_or_else(|| {
                StoreError::Configuration(
                    "Status filtering requires a mapped status column".to_string(),
                )
            })?;

            if let Some(status) = filter.status {
                clauses.push(format!("{} = ?", status_col));
                binds.push(status.as_str().to_string());
            }

            if filter.published {
                clauses.push(format!("{} = ?", status_col));
                binds.push(PostStatus::Published.as_str().to_string());

                if let Some(published_at) = self.profile.published_at_column() {
                    // datetime() normalizes both sides to UTC seconds, so
                    // RFC 3339 offsets and bare SQLite timestamps compare
                    // correctly instead of lexically
                    clauses.push(format!(
                        "({col} IS NULL OR datetime({col}) <= datetime(?))",
                        col = published_at
                    ));
                    binds.push(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
                }
            }
        }

        if clauses.is_empty() {
            Ok((String::new(), binds))
        } else {
            Ok((format!(" WHERE {}", clauses.join(" AND ")), binds))
        }
    }

    /// Map canonical data onto storage columns, serializing custom fields
    /// into their flat TEXT column
    fn to_storage(&self, canonical: &FieldMap) -> FieldMap {
        let mut storage = self.profile.mapping.map_to_storage(canonical);
        if let Some(column) = self.profile.custom_fields_column() {
            if let Some(value) = storage.get_mut(column) {
                if value.is_object() || value.is_array() {
                    *value = JsonValue::String(value.to_string());
                }
            }
        }
        storage
    }

    /// Turn a row into a canonical Post
    fn row_to_post(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
        let mut record = FieldMap::new();

        for (i, column) in row.columns().iter().enumerate() {
            let name = column.name();
            if name == "id" || name == "created_at" || name == "updated_at" {
                continue;
            }

            let value = if let Ok(v) = row.try_get::<Option<String>, _>(i) {
                v.map(JsonValue::String).unwrap_or(JsonValue::Null)
            } else if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
                v.map(|n| JsonValue::Number(n.into()))
                    .unwrap_or(JsonValue::Null)
            } else if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
                v.and_then(serde_json::Number::from_f64)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            } else {
                JsonValue::Null
            };

            if !value.is_null() {
                record.insert(name.to_string(), value);
            }
        }

        let mut fields = self.profile.mapping.map_to_canonical(&record);

        // Surface custom_fields as the object it round-trips through TEXT
        if let Some(JsonValue::String(raw)) = fields.get("custom_fields") {
            if let Ok(parsed @ JsonValue::Object(_)) = serde_json::from_str(raw) {
                fields.insert("custom_fields".to_string(), parsed);
            }
        }

        Ok(Post {
            id: row.try_get("id")?,
            fields,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn field_is_blank(data: &FieldMap, name: &str) -> bool {
    match data.get(name) {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.is_empty(),
        _ => false,
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    value: JsonValue,
) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    match value {
        JsonValue::String(s) => query.bind(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        JsonValue::Bool(b) => query.bind(b as i32),
        JsonValue::Null => query.bind(None::<String>),
        other => query.bind(other.to_string()),
    }
}
