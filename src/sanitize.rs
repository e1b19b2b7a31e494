use std::path::{Component, Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;

lazy_static! {
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9-]+$").unwrap();
    static ref POST_FILENAME_REGEX: Regex = Regex::new(r"^[a-z0-9-]+\.md$").unwrap();
    static ref IMAGE_FILENAME_REGEX: Regex = Regex::new(r"^[a-z0-9-]+\.(png|jpg|gif|webp)$").unwrap();
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

/// Caller-supplied names are validated strictly, never silently repaired.
pub fn validate_slug(slug: &str) -> Result<(), ApiError> {
    if !is_valid_slug(slug) {
        return Err(ApiError::Validation(
            "Slug must be lowercase, alphanumeric with hyphens".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_post_filename(name: &str) -> Result<(), ApiError> {
    if !POST_FILENAME_REGEX.is_match(name) {
        return Err(ApiError::Validation(
            "Filename must be lowercase, alphanumeric with hyphens, ending in .md".to_string(),
        ));
    }
    Ok(())
}

/// Lowercased ASCII with every run of other characters collapsed to one
/// hyphen. Empty results take the fallback so a name always comes out.
fn sanitize_base(input: &str, fallback: &str) -> String {
    lazy_static! {
        static ref NON_ALLOWED: Regex = Regex::new(r"[^a-z0-9-]+").unwrap();
        static ref HYPHEN_RUNS: Regex = Regex::new(r"-{2,}").unwrap();
    }

    let ascii = unidecode::unidecode(input).to_lowercase();
    let hyphened = NON_ALLOWED.replace_all(&ascii, "-");
    let collapsed = HYPHEN_RUNS.replace_all(&hyphened, "-");
    let trimmed = collapsed.trim_matches('-');

    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn post_filename_from_title(title: &str) -> String {
    format!("{}.md", sanitize_base(title, "untitled"))
}

fn ext_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some(".png"),
        "image/jpeg" => Some(".jpg"),
        "image/gif" => Some(".gif"),
        "image/webp" => Some(".webp"),
        _ => None,
    }
}

fn ext_for_name(name: &str) -> Option<&'static str> {
    let ext = name.rsplit('.').next()?;
    match ext.to_lowercase().as_str() {
        "png" => Some(".png"),
        "jpg" | "jpeg" => Some(".jpg"),
        "gif" => Some(".gif"),
        "webp" => Some(".webp"),
        _ => None,
    }
}

/// Derives a safe image filename from the uploaded name and declared MIME
/// type. The extension comes from the MIME type when it is one we accept,
/// from the original extension otherwise; anything else is a hard error.
pub fn sanitize_image_name(original: &str, mime: &str) -> Result<String, ApiError> {
    let ext = match ext_for_mime(mime).or_else(|| ext_for_name(original)) {
        Some(ext) => ext,
        None => {
            return Err(ApiError::Validation(
                "Only PNG, JPEG, GIF and WebP are allowed".to_string(),
            ));
        }
    };

    let stem = match original.rfind('.') {
        Some(pos) => &original[..pos],
        None => original,
    };

    let name = format!("{}{}", sanitize_base(stem, "image"), ext);
    if !IMAGE_FILENAME_REGEX.is_match(&name) {
        return Err(ApiError::Validation("Invalid filename".to_string()));
    }

    Ok(name)
}

/// Joins a file name onto its storage directory and proves the result stays
/// inside it. Runs before any filesystem or network call.
pub fn resolve_under(dir: &Path, file_name: &str) -> Result<PathBuf, ApiError> {
    let has_odd_component = Path::new(file_name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if has_odd_component {
        return Err(ApiError::Validation("Invalid path".to_string()));
    }

    let path = dir.join(file_name);
    if !path.starts_with(dir) {
        return Err(ApiError::Validation("Invalid path".to_string()));
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_filename_from_title() {
        assert_eq!(post_filename_from_title("My First Post!! "), "my-first-post.md");
        assert_eq!(post_filename_from_title("Águas de Março"), "aguas-de-marco.md");
        assert_eq!(post_filename_from_title("already-a-slug"), "already-a-slug.md");
    }

    #[test]
    fn test_empty_title_falls_back() {
        assert_eq!(post_filename_from_title(""), "untitled.md");
        assert_eq!(post_filename_from_title("!!! ???"), "untitled.md");
    }

    #[test]
    fn test_validate_post_filename() {
        assert!(validate_post_filename("my-first-post.md").is_ok());
        assert!(validate_post_filename("My-Post.md").is_err());
        assert!(validate_post_filename("post.txt").is_err());
        assert!(validate_post_filename("../post.md").is_err());
        assert!(validate_post_filename(".md").is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("my-first-post").is_ok());
        assert!(validate_slug("my first post").is_err());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("..").is_err());
    }

    #[test]
    fn test_sanitize_image_name_from_mime() {
        assert_eq!(sanitize_image_name("Cover Photo.HEIC", "image/png").unwrap(), "cover-photo.png");
        assert_eq!(sanitize_image_name("shot.jpg", "image/jpeg").unwrap(), "shot.jpg");
        // MIME wins over the original extension
        assert_eq!(sanitize_image_name("shot.png", "image/webp").unwrap(), "shot.webp");
    }

    #[test]
    fn test_sanitize_image_name_from_extension() {
        // Unknown MIME falls back to the original extension
        assert_eq!(sanitize_image_name("photo.JPEG", "").unwrap(), "photo.jpg");
        assert_eq!(sanitize_image_name("photo.gif", "application/octet-stream").unwrap(), "photo.gif");
    }

    #[test]
    fn test_sanitize_image_name_rejects_unknown_types() {
        assert!(sanitize_image_name("archive.zip", "application/zip").is_err());
        assert!(sanitize_image_name("noext", "").is_err());
    }

    #[test]
    fn test_symbol_only_image_name_falls_back() {
        assert_eq!(sanitize_image_name("???.png", "image/png").unwrap(), "image.png");
    }

    #[test]
    fn test_resolve_under() {
        let dir = Path::new("/srv/chronicle/content/blog");
        let path = resolve_under(dir, "my-post.md").unwrap();
        assert_eq!(path, PathBuf::from("/srv/chronicle/content/blog/my-post.md"));

        assert!(resolve_under(dir, "../escape.md").is_err());
        assert!(resolve_under(dir, "/etc/passwd").is_err());
        assert!(resolve_under(dir, "nested/../../escape.md").is_err());
    }
}
