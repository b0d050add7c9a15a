use chrono::{DateTime, Utc};
use rand::Rng;

/// Generate a human-readable receipt number: the sale date followed by a
/// random four-digit suffix, e.g. `20250303-4817`. Uniqueness is enforced
/// by the orders table; collisions within a day are retried by the caller.
pub fn generate(order_date: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(1000..=9999);
    format!("{}-{}", order_date.format("%Y%m%d"), suffix)
}
