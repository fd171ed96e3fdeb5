//! Byte size conversion and formatting.

const KIB: f64 = 1024.0;

/// Convert a byte count to megabytes (1 MB = 1024 * 1024 bytes)
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / KIB / KIB
}

/// Format a byte count as megabytes with two decimals, e.g. "1.50 MB"
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes_to_megabytes(bytes))
}

/// Format a byte count in the largest unit that keeps the value >= 1
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < KIB {
            break;
        }
        value /= KIB;
        unit = next;
    }

    format!("{:.2} {}", value, unit)
}
