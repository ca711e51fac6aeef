use serde::Deserialize;
use serde_json::Value;

use crate::db::{Document, Update};
use crate::error::{AppError, Result};
use crate::utils::coerce_int;

pub const FOOD_NAME_FIELD: &str = "foodName";
pub const ADDED_BY_EMAIL_FIELD: &str = "addedBy.email";
pub const PURCHASE_COUNT_FIELD: &str = "purchaseCount";
pub const FOOD_QUANTITY_FIELD: &str = "foodQuantity";

/// Body of `PUT /allFood/:id`. Every editable field is written; a missing one
/// becomes `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodUpdate {
    pub food_name: Option<Value>,
    pub food_image: Option<Value>,
    pub food_origin: Option<Value>,
    pub food_category: Option<Value>,
    pub price: Option<Value>,
    pub food_quantity: Option<Value>,
    pub food_quantity_type: Option<Value>,
    pub description: Option<Value>,
}

impl FoodUpdate {
    pub fn into_update(self) -> Update {
        let int_field = |v: Option<Value>| v.as_ref().map_or(Value::Null, coerce_int);

        let mut fields = Document::new();
        fields.insert("foodName".into(), self.food_name.unwrap_or_default());
        fields.insert("foodImage".into(), self.food_image.unwrap_or_default());
        fields.insert("foodOrigin".into(), self.food_origin.unwrap_or_default());
        fields.insert("foodCategory".into(), self.food_category.unwrap_or_default());
        fields.insert("price".into(), int_field(self.price));
        fields.insert(FOOD_QUANTITY_FIELD.into(), int_field(self.food_quantity));
        fields.insert("foodQuantityType".into(), self.food_quantity_type.unwrap_or_default());
        fields.insert("description".into(), self.description.unwrap_or_default());

        Update::Set(fields)
    }
}

/// Body of `PATCH /allFood/:id`: a purchase of `orderQuantity` units.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub order_quantity: i64,
}

impl PurchaseRequest {
    /// Stock goes down and popularity goes up by the same amount. Neither is
    /// checked against going negative, but a quantity whose negation does not
    /// fit in an `i64` is rejected.
    pub fn into_update(self) -> Result<Update> {
        let stock_delta = self.order_quantity.checked_neg().ok_or_else(|| {
            AppError::BadRequest(format!("orderQuantity out of range: {}", self.order_quantity))
        })?;

        Ok(Update::Inc(vec![
            (FOOD_QUANTITY_FIELD.to_string(), stock_delta),
            (PURCHASE_COUNT_FIELD.to_string(), self.order_quantity),
        ]))
    }
}
