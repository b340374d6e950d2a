/// Parse a free-text "lat,lng" position into coordinates.
///
/// The intake form sends whatever the browser geolocation produced, so this
/// is lenient: anything that is not two comma-separated numbers yields `None`
/// rather than an error.
pub fn parse_position(position: &str) -> Option<(f64, f64)> {
    let mut parts = position.splitn(2, ',');
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    let lng = parts.next()?.trim().parse::<f64>().ok()?;
    Some((lat, lng))
}

/// Storage name for an uploaded file: millisecond timestamp prefix plus the
/// original filename with any path components stripped.
pub fn storage_file_name(millis: i64, original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim();
    let base = if base.is_empty() { "upload" } else { base };
    format!("{millis}-{base}")
}
