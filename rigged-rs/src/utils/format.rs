//! Formatting utilities

use glam::{Mat4, Quat, Vec3};
use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

pub fn format_vec3(v: Vec3) -> String {
    format!("({:.4}, {:.4}, {:.4})", v.x, v.y, v.z)
}

/// Quaternion in storage order, w first
pub fn format_quat(q: Quat) -> String {
    format!("({:.4}, {:.4}, {:.4}, {:.4})", q.w, q.x, q.y, q.z)
}

/// Matrix rows, one per line
pub fn format_matrix(m: &Mat4) -> String {
    (0..4)
        .map(|r| {
            let row = m.row(r);
            format!("[{:>9.4} {:>9.4} {:>9.4} {:>9.4}]", row.x, row.y, row.z, row.w)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a duration in seconds
pub fn format_seconds(seconds: f32) -> String {
    format!("{seconds:.3}s")
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_quat_is_w_first() {
        assert_eq!(format_quat(Quat::IDENTITY), "(1.0000, 0.0000, 0.0000, 0.0000)");
    }

    #[test]
    fn test_format_matrix_rows() {
        let text = format_matrix(&Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        let rows: Vec<_> = text.lines().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].ends_with("1.0000]"));
        assert!(rows[2].ends_with("3.0000]"));
    }

    #[test]
    fn test_format_bytes() {
        assert!(format_bytes(1500).starts_with("1.5"));
        assert!(format_bytes(12).contains("12"));
    }
}
