//! Boundary to the shop's REST backend.
//!
//! Commands talk to [`Backend`]; [`HttpBackend`] is the real implementation.

mod errors;
mod http;
mod retry;

pub use errors::classify_failure;
pub use http::HttpBackend;
pub use retry::with_retry;

use crate::error::Result;
use crate::model::{
    AdvancePayment, Asset, CommissionSummary, Expense, ExpenseAction, Invoice, Job, JobStatus,
    NewAdvance, NewPayment, NewTip, Payment, Receipt, Tip,
};

/// Reads and writes the CLI needs from the backend.
pub trait Backend {
    fn job(&self, id: &str) -> Result<Job>;
    fn commission_summary(&self, employee_id: &str) -> Result<Option<CommissionSummary>>;
    fn advances(&self, employee_id: &str) -> Result<Vec<AdvancePayment>>;
    fn asset(&self, id: &str) -> Result<Asset>;
    fn invoice(&self, id: &str) -> Result<Invoice>;
    fn receipt(&self, id: &str) -> Result<Receipt>;

    fn create_payment(&self, payment: &NewPayment) -> Result<Payment>;
    fn delete_payment(&self, payment_id: &str) -> Result<()>;
    fn generate_receipt(&self, payment_id: &str) -> Result<Receipt>;
    fn create_tip(&self, tip: &NewTip) -> Result<Tip>;
    fn cancel_tip(&self, tip_id: &str) -> Result<Tip>;
    fn create_advance(&self, advance: &NewAdvance) -> Result<AdvancePayment>;
    fn expense_action(&self, expense_id: &str, action: ExpenseAction) -> Result<Expense>;
    fn update_job_status(&self, job_id: &str, status: JobStatus) -> Result<Job>;
}

/// Relative routes under the API base URL.
pub(crate) mod routes {
    use urlencoding::encode;

    pub fn job(id: &str) -> String {
        format!("sales/jobs/{}/", encode(id))
    }

    pub fn commission_summary(employee_id: &str) -> String {
        format!("sales/commissions/summary/?employee_id={}", encode(employee_id))
    }

    pub fn advances_by_employee(employee_id: &str) -> String {
        format!(
            "sales/advance-payments/by_employee/?employee_id={}",
            encode(employee_id)
        )
    }

    pub fn advances() -> String {
        "sales/advance-payments/".to_string()
    }

    pub fn asset(id: &str) -> String {
        format!("assets/assets/{}/", encode(id))
    }

    pub fn invoice(id: &str) -> String {
        format!("sales/invoices/{}/", encode(id))
    }

    pub fn receipt(id: &str) -> String {
        format!("sales/receipts/{}/", encode(id))
    }

    pub fn receipt_from_payment() -> String {
        "sales/receipts/generate_from_payment/".to_string()
    }

    pub fn payments() -> String {
        "sales/payments/".to_string()
    }

    pub fn payment(id: &str) -> String {
        format!("sales/payments/{}/", encode(id))
    }

    pub fn tips() -> String {
        "sales/tips/".to_string()
    }

    pub fn cancel_tip(id: &str) -> String {
        format!("sales/tips/{}/cancel/", encode(id))
    }

    pub fn expense_action(id: &str, action: &str) -> String {
        format!("expenses/{}/{}/", encode(id), action)
    }
}

#[cfg(test)]
mod tests {
    use super::routes;

    #[test]
    fn ids_are_escaped_in_routes() {
        assert_eq!(routes::job("a b"), "sales/jobs/a%20b/");
        assert_eq!(
            routes::advances_by_employee("e&1"),
            "sales/advance-payments/by_employee/?employee_id=e%261"
        );
        assert_eq!(routes::expense_action("x1", "mark_paid"), "expenses/x1/mark_paid/");
    }
}
