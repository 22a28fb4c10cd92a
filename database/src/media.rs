use crate::store::PostStore;
use posts::BannerMode;
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::{info, warn};

impl PostStore {
    /// Attach a banner image to a post.
    ///
    /// UrlOnly profiles store the remote URL verbatim; WithMedia profiles
    /// download the image into the media directory and store its relative
    /// path. Failures never propagate: a broken banner must not fail the
    /// create or update that carried it.
    pub async fn attach_banner(&self, post_id: i64, url: &str) {
        let stored = match self.profile().banner.clone() {
            BannerMode::UrlOnly => url.to_string(),
            BannerMode::WithMedia { media_dir } => {
                match download_banner(&media_dir, post_id, url).await {
                    Ok(relative_path) => relative_path,
                    Err(reason) => {
                        warn!(
                            "Failed to download banner image from URL {} for post {}: {}",
                            url, post_id, reason
                        );
                        return;
                    }
                }
            }
        };

        if self.profile().banner_url_column().is_none() {
            return;
        }

        let mut update = mapping::FieldMap::new();
        update.insert("banner_url".to_string(), JsonValue::String(stored));

        if let Err(e) = self.update(post_id, update).await {
            warn!("Failed to store banner for post {}: {}", post_id, e);
        } else {
            info!("Attached banner to post {}", post_id);
        }
    }
}

async fn download_banner(media_dir: &Path, post_id: i64, url: &str) -> Result<String, String> {
    let response = reqwest::get(url).await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP status {}", response.status()));
    }

    let extension = extension_for(response.headers(), url);
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;

    let post_dir = media_dir.join(post_id.to_string());
    std::fs::create_dir_all(&post_dir).map_err(|e| e.to_string())?;

    let file_name = format!("banner.{}", extension);
    std::fs::write(post_dir.join(&file_name), &bytes).map_err(|e| e.to_string())?;

    Ok(format!("{}/{}", post_id, file_name))
}

fn extension_for(headers: &reqwest::header::HeaderMap, url: &str) -> &'static str {
    let content_type = headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => {
            let path = url.split(['?', '#']).next().unwrap_or(url);
            match path.rsplit('.').next() {
                Some("jpg") | Some("jpeg") => "jpg",
                Some("png") => "png",
                Some("webp") => "webp",
                Some("gif") => "gif",
                _ => "img",
            }
        }
    }
}
