use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Pix,
    Cash,
    CreditCard,
    DebitCard,
    BankTransfer,
    BankSlip,
    Other,
}

/// One installment received against an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub date: NaiveDate,
    #[serde(rename = "valor")]
    pub amount_cents: i64,
    #[serde(rename = "metodo")]
    pub method: PaymentMethod,
}

impl PaymentRecord {
    pub fn new(date: NaiveDate, amount_cents: i64, method: PaymentMethod) -> Self {
        Self { date, amount_cents, method }
    }
}
