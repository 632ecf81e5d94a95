pub mod parsing;

// Re-export commonly used items
pub use parsing::{parse_fan_rpm, parse_hex_color, parse_power_mode, parse_product_id};
