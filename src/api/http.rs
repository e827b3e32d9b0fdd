use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};
use ureq::{Agent, RequestBuilder};

use super::{classify_failure, routes, with_retry, Backend};
use crate::config::ApiSettings;
use crate::error::{Result, ShopError};
use crate::model::{
    AdvancePayment, Asset, CommissionSummary, Expense, ExpenseAction, Invoice, Job, JobStatus,
    Listing, NewAdvance, NewPayment, NewTip, Payment, Receipt, Tip,
};

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// Blocking JSON client for the shop backend.
pub struct HttpBackend {
    agent: Agent,
    base_url: String,
    token: Option<String>,
    retries: u32,
}

impl HttpBackend {
    pub fn new(settings: &ApiSettings) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.resolved_token(),
            retries: settings.retries,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        let request = request.header("Accept", "application/json");
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    /// One attempt; returns the raw body of a 2xx response.
    fn send_once(&self, method: Method, url: &str, body: Option<&str>) -> Result<String> {
        let payload = body.unwrap_or("{}").as_bytes();
        let sent = match method {
            Method::Get => self.authorize(self.agent.get(url)).call(),
            Method::Delete => self.authorize(self.agent.delete(url)).call(),
            Method::Post => self
                .authorize(self.agent.post(url))
                .header("Content-Type", "application/json")
                .send(payload),
            Method::Patch => self
                .authorize(self.agent.patch(url))
                .header("Content-Type", "application/json")
                .send(payload),
        };

        let mut response = sent.map_err(|e| ShopError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ShopError::Transport(e.to_string()))?;

        debug!(method = method.as_str(), url, status, "backend response");

        if (200..300).contains(&status) {
            Ok(text)
        } else {
            Err(classify_failure(status, &text))
        }
    }

    fn request<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<&str>) -> Result<T> {
        let url = self.url(path);
        let what = format!("{} {}", method.as_str(), path);
        with_retry(self.retries, &what, || {
            let text = self.send_once(method, &url, body)?;
            serde_json::from_str(&text).map_err(|e| ShopError::Decode(format!("{what}: {e}")))
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::Get, path, None)
    }

    fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let payload = encode(body)?;
        self.request(Method::Post, path, Some(&payload))
    }

    fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let payload = encode(body)?;
        self.request(Method::Patch, path, Some(&payload))
    }

    fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        let what = format!("DELETE {path}");
        with_retry(self.retries, &what, || {
            self.send_once(Method::Delete, &url, None).map(|_| ())
        })
    }
}

fn encode<B: Serialize>(body: &B) -> Result<String> {
    serde_json::to_string(body).map_err(|e| ShopError::Decode(e.to_string()))
}

impl Backend for HttpBackend {
    fn job(&self, id: &str) -> Result<Job> {
        self.get(&routes::job(id))
    }

    fn commission_summary(&self, employee_id: &str) -> Result<Option<CommissionSummary>> {
        let rows: Listing<CommissionSummary> = self.get(&routes::commission_summary(employee_id))?;
        Ok(rows.into_vec().into_iter().find(|s| s.employee == employee_id))
    }

    fn advances(&self, employee_id: &str) -> Result<Vec<AdvancePayment>> {
        let rows: Listing<AdvancePayment> = self.get(&routes::advances_by_employee(employee_id))?;
        Ok(rows.into_vec())
    }

    fn asset(&self, id: &str) -> Result<Asset> {
        self.get(&routes::asset(id))
    }

    fn invoice(&self, id: &str) -> Result<Invoice> {
        self.get(&routes::invoice(id))
    }

    fn receipt(&self, id: &str) -> Result<Receipt> {
        self.get(&routes::receipt(id))
    }

    fn create_payment(&self, payment: &NewPayment) -> Result<Payment> {
        let created: Payment = self.post(&routes::payments(), payment)?;
        info!(payment = %created.id, job = %payment.job, amount = %payment.amount, "payment created");
        Ok(created)
    }

    fn delete_payment(&self, payment_id: &str) -> Result<()> {
        self.delete(&routes::payment(payment_id))?;
        info!(payment = payment_id, "payment deleted");
        Ok(())
    }

    fn generate_receipt(&self, payment_id: &str) -> Result<Receipt> {
        let receipt: Receipt = self.post(
            &routes::receipt_from_payment(),
            &json!({ "payment_id": payment_id }),
        )?;
        info!(receipt = %receipt.receipt_number, payment = payment_id, "receipt generated");
        Ok(receipt)
    }

    fn create_tip(&self, tip: &NewTip) -> Result<Tip> {
        let created: Tip = self.post(&routes::tips(), tip)?;
        info!(tip = %created.id, employee = %tip.employee, amount = %tip.amount, "tip recorded");
        Ok(created)
    }

    fn cancel_tip(&self, tip_id: &str) -> Result<Tip> {
        self.post(&routes::cancel_tip(tip_id), &json!({}))
    }

    fn create_advance(&self, advance: &NewAdvance) -> Result<AdvancePayment> {
        let created: AdvancePayment = self.post(&routes::advances(), advance)?;
        info!(advance = %created.id, employee = %advance.employee, "advance created");
        Ok(created)
    }

    fn expense_action(&self, expense_id: &str, action: ExpenseAction) -> Result<Expense> {
        self.post(&routes::expense_action(expense_id, action.route()), &json!({}))
    }

    fn update_job_status(&self, job_id: &str, status: JobStatus) -> Result<Job> {
        self.patch(&routes::job(job_id), &json!({ "status": status }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str) -> ApiSettings {
        ApiSettings {
            base_url: base_url.to_string(),
            token: None,
            timeout_secs: 1,
            retries: 1,
        }
    }

    #[test]
    fn base_url_is_normalised() {
        let backend = HttpBackend::new(&settings("http://localhost:8000/api/v1/"));
        assert_eq!(backend.base_url(), "http://localhost:8000/api/v1");
        assert_eq!(
            backend.url("/sales/jobs/1/"),
            "http://localhost:8000/api/v1/sales/jobs/1/"
        );
    }

    #[test]
    fn unreachable_backend_is_a_transport_error() {
        // Port 9 (discard) is closed on test machines; the connection is refused.
        let backend = HttpBackend::new(&settings("http://127.0.0.1:9/api/v1"));
        let err = backend.job("j1").unwrap_err();
        assert!(matches!(err, ShopError::Transport(_)), "got {err:?}");
    }
}
