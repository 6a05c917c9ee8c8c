//! Text rendering for the demos.
//!
//! This module provides:
//! - value formatting (memory, seconds, counts)
//! - the fixed-width comparison and per-engine summary tables
//! - the station result table and the system banner

pub mod table;

// Re-export key types
pub use table::{
    ComparisonRow, render_comparison_line, render_comparison_table, render_engine_summary,
    render_stations, render_system_banner,
};

const MIB: f64 = 1024.0 * 1024.0;

/// Format bytes as MB, switching to GB above 1024 MB.
pub fn format_memory(bytes: u64) -> String {
    let mb = bytes as f64 / MIB;
    if mb > 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else {
        format!("{:.1} MB", mb)
    }
}

pub fn format_secs(secs: f64) -> String {
    format!("{:.2}s", secs)
}

/// `1234567` -> `1,234,567`
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
