// utils/upload.rs
use std::path::{Path, PathBuf};

use chrono::Utc;

/// Public path prefix under which saved images are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Extension of the client-side filename including the dot, or an empty string.
pub fn extension_of(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

/// Writes an uploaded profile image into `upload_dir` as `<unix-millis><ext>`
/// and returns the public path it is served from.
pub async fn save_profile_image(
    upload_dir: &str,
    original_name: Option<&str>,
    bytes: &[u8],
) -> std::io::Result<String> {
    tokio::fs::create_dir_all(upload_dir).await?;

    let file_name = format!("{}{}", Utc::now().timestamp_millis(), extension_of(original_name));
    let path: PathBuf = Path::new(upload_dir).join(&file_name);
    tokio::fs::write(&path, bytes).await?;

    tracing::info!("Stored profile image at {}", path.display());

    Ok(format!("{}/{}", UPLOADS_ROUTE, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_simple_extensions() {
        assert_eq!(extension_of(Some("me.JPG")), ".jpg");
        assert_eq!(extension_of(Some("archive.tar.png")), ".png");
    }

    #[test]
    fn drops_missing_or_odd_extensions() {
        assert_eq!(extension_of(None), "");
        assert_eq!(extension_of(Some("noext")), "");
        assert_eq!(extension_of(Some("weird.p/g")), "");
    }

    #[tokio::test]
    async fn writes_file_under_upload_dir() {
        let dir = std::env::temp_dir().join(format!("fundifix-upload-{}", uuid::Uuid::new_v4()));
        let dir_str = dir.to_string_lossy().to_string();

        let public_path = save_profile_image(&dir_str, Some("avatar.png"), b"png-bytes")
            .await
            .unwrap();

        assert!(public_path.starts_with("/uploads/"));
        assert!(public_path.ends_with(".png"));

        let file_name = public_path.trim_start_matches("/uploads/");
        let stored = tokio::fs::read(dir.join(file_name)).await.unwrap();
        assert_eq!(stored, b"png-bytes");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
