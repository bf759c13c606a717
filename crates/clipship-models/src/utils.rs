//! Shared helpers.

/// Format bytes as a human-readable string (KB, MB, GB).
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    match bytes {
        b if b >= GIB => format!("{:.2} GB", b as f64 / GIB as f64),
        b if b >= MIB => format!("{:.2} MB", b as f64 / MIB as f64),
        b if b >= KIB => format!("{:.2} KB", b as f64 / KIB as f64),
        b => format!("{} B", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GB");
    }

    #[test]
    fn test_format_bytes_edge_cases() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024 + 512), "1.50 KB");
        assert_eq!(format_bytes(500 * 1024 * 1024), "500.00 MB");
    }
}
