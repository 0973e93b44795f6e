//! Content-type detection and filename handling for media attachments.
//!
//! Uploaded files arrive with a client-claimed MIME type that cannot be
//! trusted. Detection order: magic bytes, then extension for text formats,
//! then the claim itself.

/// Detect the content type of an attachment.
///
/// Magic bytes win over everything. Text formats have no magic bytes, so
/// they fall back to extension mapping. A claimed binary type whose magic
/// bytes are absent does not match its claim and is downgraded to
/// `application/octet-stream`.
pub fn detect_content_type(filename: &str, data: &[u8], claimed: &str) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if let Some(ext) = filename.rsplit('.').next() {
        if let Some(mime) = mime_from_extension(ext) {
            return mime.to_string();
        }
    }

    if claimed_is_binary(claimed) {
        return "application/octet-stream".to_string();
    }

    claimed.to_string()
}

/// True when the claimed MIME type names a binary format that always
/// carries magic bytes.
fn claimed_is_binary(claimed: &str) -> bool {
    if claimed.starts_with("image/")
        || claimed.starts_with("audio/")
        || claimed.starts_with("video/")
    {
        return true;
    }
    matches!(
        claimed,
        "application/pdf" | "application/zip" | "application/gzip" | "application/x-tar"
    )
}

/// Extension mapping for text formats only. Binary formats are excluded:
/// they must pass magic-byte detection or be treated as octet-stream.
fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "txt" | "log" => Some("text/plain"),
        "csv" => Some("text/csv"),
        "html" | "htm" => Some("text/html"),
        "xml" => Some("application/xml"),
        "json" => Some("application/json"),
        "yaml" | "yml" => Some("application/yaml"),
        "md" | "markdown" => Some("text/markdown"),
        // SVG is XML text, safe to trust by extension
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Sanitize an upload filename for safe storage.
pub fn sanitize_filename(filename: &str) -> String {
    // Drop any path components the client sent
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    if sanitized.len() > 255 {
        if let Some(dot_pos) = sanitized.rfind('.') {
            let ext = &sanitized[dot_pos..];
            let name = &sanitized[..255 - ext.len()];
            return format!("{}{}", name, ext);
        }
        return sanitized[..255].to_string();
    }

    sanitized.to_string()
}

/// Extract a storage-safe lowercase extension from an upload filename.
///
/// Returns `None` for missing, oversized, or non-alphanumeric extensions;
/// callers then store the blob without one.
pub fn safe_extension(filename: &str) -> Option<String> {
    let name = sanitize_filename(filename);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_lowercase();
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    // Reserved by the store's atomic-write protocol
    if ext == "tmp" {
        return None;
    }
    Some(ext)
}
