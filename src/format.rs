const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Render a byte count with a binary unit, e.g. `10.00 MB`
pub fn format_byte(size: i64) -> String {
    let mut value = size.max(0) as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_byte() {
        assert_eq!(format_byte(0), "0.00 B");
        assert_eq!(format_byte(1023), "1023.00 B");
        assert_eq!(format_byte(3 * 1024), "3.00 KB");
        assert_eq!(format_byte(10 * 1024 * 1024), "10.00 MB");
        assert_eq!(format_byte(1536 * 1024 * 1024), "1.50 GB");
        assert_eq!(format_byte(-5), "0.00 B");
    }
}
