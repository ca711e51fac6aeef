use serde_json::Value;

use crate::db::Document;

pub const ORDER_DATE_FIELD: &str = "orderDate";
pub const BUYER_EMAIL_FIELD: &str = "buyerEmail";

/// Builds the stored order from a request body. The server-assigned
/// `orderDate` (epoch milliseconds) replaces any value the client sent.
///
/// Older clients that post their own `orderDate` and expect it to be kept
/// will see it overwritten; the client value is never stored, so order dates
/// always come from the server clock.
pub fn new_order(body: Document, order_date_ms: i64) -> Document {
    let mut order = body;
    order.insert(ORDER_DATE_FIELD.to_string(), Value::from(order_date_ms));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_order_date_wins() {
        let body = json!({ "buyerEmail": "a@b.com", "orderDate": 1, "foodName": "Ramen" });

        let order = new_order(body.as_object().cloned().unwrap(), 1_700_000_000_000);

        assert_eq!(order[ORDER_DATE_FIELD], json!(1_700_000_000_000_i64));
        assert_eq!(order[BUYER_EMAIL_FIELD], json!("a@b.com"));
        assert_eq!(order["foodName"], json!("Ramen"));
    }
}
