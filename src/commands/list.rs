//! List commands implementation

use crate::targets::available_targets;

/// List all supported targets
pub fn list_targets() {
    println!("Supported targets:");
    println!();
    for target in available_targets() {
        let aliases = if target.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", target.aliases.join(", "))
        };
        println!("  {:<8} - {}{}", target.name, target.description, aliases);
    }
}
