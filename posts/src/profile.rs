use crate::{PostsError, Result};
use mapping::{is_canonical_field, FieldMapping};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Banner capability of a storage entity.
///
/// Two concrete variants instead of runtime trait sniffing: either the host
/// table stores a plain URL column, or the bridge downloads the image into a
/// media directory and stores the relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BannerMode {
    UrlOnly,
    WithMedia { media_dir: PathBuf },
}

impl BannerMode {
    pub fn supports_media(&self) -> bool {
        matches!(self, BannerMode::WithMedia { .. })
    }
}

/// The declared mapping layers, lowest priority first: global config, then
/// the per-table config entry, then an explicit per-profile override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingLayers {
    #[serde(default)]
    pub global: Option<FieldMapping>,
    #[serde(default)]
    pub tables: HashMap<String, FieldMapping>,
    #[serde(skip)]
    pub overrides: Option<FieldMapping>,
}

/// Resolved description of the storage entity backing the bridge: table
/// name, field mapping, and banner capability.
///
/// Resolution happens once when the profile is built; requests never re-read
/// mapping configuration.
#[derive(Debug, Clone)]
pub struct StorageProfile {
    pub table: String,
    pub mapping: FieldMapping,
    pub banner: BannerMode,
    /// Generate a slug from the title when a new post carries none
    pub auto_generate_slug: bool,
}

impl StorageProfile {
    /// Resolve a profile from declared mapping layers.
    ///
    /// Layer order is defaults < global < per-table < override. Unknown
    /// canonical field names in any layer are configuration errors, and the
    /// slug field must stay mapped since everything downstream keys on it.
    pub fn resolve(table: &str, banner: BannerMode, layers: &MappingLayers) -> Result<Self> {
        if let Some(global) = &layers.global {
            validate_layer(global)?;
        }
        for declared in layers.tables.values() {
            validate_layer(declared)?;
        }
        if let Some(overrides) = &layers.overrides {
            validate_layer(overrides)?;
        }

        let mut mapping = FieldMapping::defaults();
        if let Some(global) = &layers.global {
            mapping = mapping.merged(global);
        }
        if let Some(per_table) = layers.tables.get(table) {
            mapping = mapping.merged(per_table);
        }
        if let Some(overrides) = &layers.overrides {
            mapping = mapping.merged(overrides);
        }

        // Both banner modes persist through the banner_url column: UrlOnly
        // keeps the remote URL verbatim, WithMedia records the relative path
        // of the downloaded file
        if mapping.storage_field("banner_url").is_none() {
            mapping.set("banner_url", "banner_url");
        }

        if mapping.storage_field("slug").is_none() {
            return Err(PostsError::Profile(format!(
                "Table '{}' has no slug mapping; the bridge reconciles posts by slug",
                table
            )));
        }

        Ok(Self {
            table: table.to_string(),
            mapping,
            banner,
            auto_generate_slug: true,
        })
    }

    pub fn slug_column(&self) -> &str {
        self.mapping
            .storage_field("slug")
            .expect("resolve() guarantees a slug mapping")
    }

    pub fn status_column(&self) -> Option<&str> {
        self.mapping.storage_field("status")
    }

    pub fn published_at_column(&self) -> Option<&str> {
        self.mapping.storage_field("published_at")
    }

    pub fn custom_fields_column(&self) -> Option<&str> {
        self.mapping.storage_field("custom_fields")
    }

    pub fn banner_url_column(&self) -> Option<&str> {
        self.mapping.storage_field("banner_url")
    }

    /// Generate the bootstrap SQL for the backing table
    pub fn create_table_sql(&self) -> String {
        let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];

        for (canonical, storage) in self.mapping.iter_canonical() {
            // A shared column is declared once, under its first canonical user
            if columns.iter().any(|c| c.starts_with(&format!("{} ", storage))) {
                continue;
            }
            let sql_type = match canonical {
                "published_at" => "TIMESTAMP",
                _ => "TEXT",
            };
            columns.push(format!("{} {}", storage, sql_type));
        }

        columns.push("created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP".to_string());
        columns.push("updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP".to_string());

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.table,
            columns.join(",\n    ")
        )
    }

    /// Index bootstrap SQL. The unique slug index is the storage-level
    /// arbiter for slug collisions; the generator's probe is only a
    /// best-effort pre-check.
    pub fn index_sql(&self) -> Vec<String> {
        let mut indexes = vec![format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
            self.table,
            self.slug_column(),
            self.table,
            self.slug_column()
        )];

        if let Some(status) = self.status_column() {
            indexes.push(format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                self.table, status, self.table, status
            ));
        }

        indexes
    }
}

fn validate_layer(declared: &FieldMapping) -> Result<()> {
    for (canonical, _) in declared.iter_all() {
        if !is_canonical_field(canonical) {
            return Err(PostsError::UnknownField(canonical.to_string()));
        }
    }
    Ok(())
}
