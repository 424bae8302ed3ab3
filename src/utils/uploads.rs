//! Manejo de archivos subidos
//!
//! Guarda imágenes de formularios multipart bajo el directorio de
//! uploads y devuelve la ruta pública con la que se sirven.

use uuid::Uuid;

use crate::utils::errors::{bad_request_error, internal_error, AppResult};

/// Extensiones de imagen aceptadas
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Deriva una extensión segura del nombre original del archivo
fn safe_extension(file_name: Option<&str>) -> &'static str {
    let ext = file_name
        .and_then(|name| name.rsplit('.').next())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some(e) => ALLOWED_EXTENSIONS
            .iter()
            .find(|allowed| **allowed == e)
            .copied()
            .unwrap_or("jpg"),
        None => "jpg",
    }
}

/// Guarda una imagen y devuelve su ruta pública (`/uploads/<archivo>`)
pub async fn save_image(
    upload_dir: &str,
    file_name: Option<&str>,
    data: &[u8],
) -> AppResult<String> {
    if data.is_empty() {
        return Err(bad_request_error("Empty image upload"));
    }

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| internal_error(&format!("Error creating upload dir: {}", e)))?;

    let stored_name = format!("{}.{}", Uuid::new_v4().simple(), safe_extension(file_name));
    let path = format!("{}/{}", upload_dir.trim_end_matches('/'), stored_name);

    tokio::fs::write(&path, data)
        .await
        .map_err(|e| internal_error(&format!("Error saving upload: {}", e)))?;

    Ok(format!("/uploads/{}", stored_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_extension_known_types() {
        assert_eq!(safe_extension(Some("photo.PNG")), "png");
        assert_eq!(safe_extension(Some("car.jpeg")), "jpeg");
    }

    #[test]
    fn test_safe_extension_falls_back_to_jpg() {
        assert_eq!(safe_extension(Some("malicious.exe")), "jpg");
        assert_eq!(safe_extension(Some("noextension")), "jpg");
        assert_eq!(safe_extension(None), "jpg");
    }

    #[tokio::test]
    async fn test_save_image_rejects_empty_body() {
        let result = save_image("/tmp/intellidrive-test-uploads", Some("a.png"), &[]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_save_image_returns_public_path() {
        let dir = std::env::temp_dir().join("intellidrive-test-uploads");
        let dir = dir.to_str().unwrap();
        let url = save_image(dir, Some("a.png"), b"fake-bytes").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));
    }
}
