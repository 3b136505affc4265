/// Map a declared content type onto one the classifier accepts.
///
/// Anything not recognisably PNG, GIF or WebP is sent as JPEG.
pub fn normalize_media_type(declared: &str) -> &'static str {
    let lower = declared.to_ascii_lowercase();
    if lower.contains("png") {
        "image/png"
    } else if lower.contains("gif") {
        "image/gif"
    } else if lower.contains("webp") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}
