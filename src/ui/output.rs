//! Output functions for consistent build log formatting

use console::style;

/// Display the buildpack title and homepage
pub fn title(name: &str, version: &str, homepage: Option<&str>) {
    println!();
    println!("{} {}", style(name).bold(), version);
    if let Some(homepage) = homepage {
        println!("  {}", style(homepage).cyan());
    }
}

/// Display a section header
pub fn header(message: &str) {
    println!("  {}", message);
}

/// Display an indented body line
pub fn body(message: &str) {
    for line in message.lines() {
        println!("    {}", style(line).dim());
    }
}

/// Display a warning line
pub fn warn(message: &str) {
    println!("    {} {}", style("[WARN]").yellow(), message);
}

/// Display one configuration row, with the name column padded to `width`
pub fn config_row(name: &str, width: usize, value: &str, marker: &str, description: &str) {
    println!(
        "    ${:<width$}  {:<7}  {}  {}",
        name,
        marker,
        value,
        style(description).dim(),
        width = width
    );
}
