//! Human-shareable order identifiers.

use chrono::Utc;
use rand::Rng;

/// Mints an order number: `"VK"` + current epoch milliseconds + a
/// zero-padded random suffix 000-999.
///
/// Monotonically increasing in practice but not guaranteed unique:
/// two calls inside one millisecond have a 1/1000 collision chance per
/// pair. The `orders.order_number` unique constraint backstops this;
/// creation retries with a fresh number on conflict.
pub fn generate() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("VK{millis}{suffix:03}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    #[test]
    fn format_is_prefix_then_digits() {
        let number = generate();
        assert!(number.starts_with("VK"));
        let digits = &number[2..];
        // 13 epoch-millis digits plus the 3-digit suffix
        assert_eq!(digits.len(), 16);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn distinct_across_milliseconds() {
        // Intra-millisecond collisions are a documented weakness, so
        // space the calls out instead of hammering a tight loop.
        let mut seen = HashSet::new();
        for _ in 0..25 {
            assert!(seen.insert(generate()));
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn timestamp_component_is_nondecreasing() {
        let a = generate();
        std::thread::sleep(Duration::from_millis(2));
        let b = generate();
        let ts = |s: &str| s[2..s.len() - 3].parse::<i64>().unwrap();
        assert!(ts(&b) > ts(&a));
    }
}
