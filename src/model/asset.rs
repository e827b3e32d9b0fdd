use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::rules::depreciation::depreciated_percentage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub asset_number: String,
    pub name: String,
    pub purchase_cost: Money,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub accumulated_depreciation: Money,
    pub current_book_value: Money,
}

impl Asset {
    pub fn depreciated_percentage(&self) -> Decimal {
        depreciated_percentage(self.purchase_cost, self.current_book_value)
    }
}
