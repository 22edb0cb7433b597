//! Output formatting and progress bars for CLI

use indicatif::{ProgressBar, ProgressStyle};

use crate::types::IntervalSummary;

/// Create a progress bar for sampling
pub fn create_sampling_progress(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} samples ({msg})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    pb.set_style(style);
    pb
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Print statistics table
pub fn print_stats_table(stats: &[(&str, String)]) {
    for (key, value) in stats {
        print_kv(key, value);
    }
}

/// Print the interval table of a hat
pub fn print_interval_table(intervals: &[IntervalSummary]) {
    println!(
        "  {:>4} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "#", "x", "x_next", "f(x)", "hat", "squeeze", "cumulative"
    );
    for (i, iv) in intervals.iter().enumerate() {
        println!(
            "  {:>4} {:>12.5} {:>12.5} {:>12.5e} {:>12.5e} {:>12.5e} {:>12.5e}",
            i,
            iv.x,
            iv.x_next,
            iv.fx,
            iv.hat(),
            iv.squeeze,
            iv.cumulative
        );
    }
}
