pub use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};

/// Milliseconds since the Unix epoch, used for template timestamps and artifact names.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Format a Unix-epoch millisecond timestamp as `YYYYMMDDHHmmss` in UTC.
///
/// Timestamps past the supported calendar range fall back to the raw millisecond count.
pub fn format_compact_utc(ms: u64) -> String {
    let Ok(t) = time::OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000) else {
        return ms.to_string();
    };
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        t.year(),
        u8::from(t.month()),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_utc_formatting() {
        assert_eq!(format_compact_utc(0), "19700101000000");
        // 2024-02-29T12:34:56Z
        assert_eq!(format_compact_utc(1_709_210_096_000), "20240229123456");
        assert_eq!(format_compact_utc(u64::MAX), u64::MAX.to_string());
    }
}
