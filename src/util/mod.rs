//! Parsing and formatting helpers for Kubernetes values.

mod age;
mod quantity;

pub use age::{format_age, human_duration, parse_timestamp};
pub use quantity::{QuantityParseError, cpu_millis, mem_mebibytes, parse_quantity};
