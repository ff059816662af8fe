use chrono::Utc;
use rand::Rng;

use crate::db_types::OrderNumber;

/// Generates a fresh order number: a `#`-prefixed creation timestamp with a random suffix to keep two orders placed
/// in the same second distinct.
pub fn new_order_number() -> OrderNumber {
    let timestamp = Utc::now().timestamp();
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    OrderNumber::from(format!("#{timestamp}-{suffix:04}"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_numbers_carry_the_hash_prefix() {
        let number = new_order_number();
        assert!(number.as_str().starts_with('#'));
        assert_eq!(number.as_str().len(), "#".len() + 10 + "-".len() + 4);
    }
}
