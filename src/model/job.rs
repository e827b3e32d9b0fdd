use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;

wire_enum! {
    pub enum JobStatus : "job status" {
        Draft => "DRAFT",
        Scheduled => "SCHEDULED",
        InProgress => "IN_PROGRESS",
        QualityCheck => "QC",
        Completed => "COMPLETED",
        Invoiced => "INVOICED",
        Paid => "PAID",
        Closed => "CLOSED",
        Cancelled => "CANCELLED",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub job_number: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub vehicle_display: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub estimate_total: Money,
    #[serde(default)]
    pub final_total: Money,
    #[serde(default)]
    pub discount_amount: Money,
    #[serde(default)]
    pub tax_amount: Money,
    #[serde(default)]
    pub payments_total: Money,
    #[serde(default)]
    pub balance_due: Money,
    #[serde(default)]
    pub lines: Vec<JobLine>,
    #[serde(default)]
    pub technician_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLine {
    pub id: String,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub service_variant_name: Option<String>,
    #[serde(default)]
    pub part_name: Option<String>,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit_price: Money,
    #[serde(default)]
    pub discount_amount: Money,
    #[serde(default)]
    pub total_amount: Money,
    #[serde(default)]
    pub is_completed: bool,
    /// Parallel to `assigned_employee_names`.
    #[serde(default)]
    pub assigned_employees: Vec<String>,
    #[serde(default)]
    pub assigned_employee_names: Vec<String>,
}

impl JobStatus {
    /// Whether a status change may ask for this status. `COMPLETED` is only
    /// ever set by the backend itself and is refused as a target.
    pub fn is_requestable(self) -> bool {
        self != JobStatus::Completed
    }
}

impl Job {
    /// Customer-facing label: job number when assigned, id otherwise.
    pub fn reference(&self) -> &str {
        if self.job_number.is_empty() {
            &self.id
        } else {
            &self.job_number
        }
    }
}

impl JobLine {
    pub fn description(&self) -> String {
        let service = self
            .service_variant_name
            .as_deref()
            .or(self.service_name.as_deref())
            .unwrap_or("Service");
        match self.part_name.as_deref() {
            Some(part) if !part.is_empty() => format!("{service} ({part})"),
            _ => service.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_job() {
        let json = r#"{
            "id": "9a1f",
            "job_number": "JOB-2026-0042",
            "customer_name": "Wanjiru",
            "status": "IN_PROGRESS",
            "estimate_total": "120.00",
            "final_total": "100.00",
            "balance_due": "100.00",
            "technician_name": null,
            "lines": [{
                "id": "l1",
                "service_variant_name": "Full service",
                "part_name": null,
                "quantity": "1.00",
                "unit_price": "100.00",
                "total_amount": "100.00",
                "assigned_employees": ["e1", "e2"],
                "assigned_employee_names": ["Achieng", "Baraka"]
            }]
        }"#;

        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
        assert_eq!(job.final_total, Money::new(100, 0));
        assert_eq!(job.lines[0].assigned_employees.len(), 2);
        assert_eq!(job.lines[0].description(), "Full service");
        assert_eq!(job.reference(), "JOB-2026-0042");
    }

    #[test]
    fn completed_is_read_only() {
        let job: Job = serde_json::from_str(r#"{"id": "1", "status": "COMPLETED"}"#).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(!JobStatus::Completed.is_requestable());
        assert!(JobStatus::QualityCheck.is_requestable());
        assert!(JobStatus::Invoiced.is_requestable());
    }

    #[test]
    fn unknown_status_is_a_decode_failure() {
        let json = r#"{"id": "1", "status": "ON_HOLD"}"#;
        assert!(serde_json::from_str::<Job>(json).is_err());
    }
}
