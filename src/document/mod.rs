//! Printable documents: job card, invoice and receipt.
//!
//! Records from the backend are flattened into serializable document data
//! with every amount already formatted; the Typst templates only lay it out.

mod share;
mod typst;

pub use share::{email_intent, invoice_message, normalize_phone, receipt_message, whatsapp_intent};
pub use typst::{generate_invoice_pdf, generate_job_card_pdf, generate_receipt_pdf};

use serde::Serialize;

use crate::config::{Company, DocumentSettings};
use crate::model::{Badged, Invoice, InvoiceStatus, Job, JobLine, Receipt};
use crate::money::Money;

const DATE_FORMAT: &str = "%d %b %Y";

#[derive(Debug, Serialize)]
pub struct CompanyBlock {
    pub name: String,
    pub tagline: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl From<&Company> for CompanyBlock {
    fn from(company: &Company) -> Self {
        let resolved = company.resolved();
        Self {
            name: resolved.name,
            tagline: resolved.tagline,
            address: resolved.address,
            phone: resolved.phone,
            email: resolved.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BilledTo {
    pub name: String,
    pub phone: Option<String>,
    pub vehicle: Option<String>,
}

impl BilledTo {
    fn from_job(job: &Job) -> Self {
        Self {
            name: job.customer_name.clone().unwrap_or_else(|| "Walk-in customer".into()),
            phone: job.customer_phone.clone(),
            vehicle: job.vehicle_display.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DocLine {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub amount: String,
    pub staff: String,
    pub done: bool,
}

#[derive(Debug, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
    pub emphasis: bool,
}

#[derive(Debug, Serialize)]
pub struct Watermark {
    pub text: String,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct JobCardDoc {
    pub company: CompanyBlock,
    pub number: String,
    pub date: String,
    pub status: String,
    pub status_color: String,
    pub customer: BilledTo,
    pub technician: Option<String>,
    pub lines: Vec<DocLine>,
    pub summary: Vec<SummaryRow>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDoc {
    pub company: CompanyBlock,
    pub number: String,
    pub job_number: Option<String>,
    pub issue_date: String,
    pub due_date: String,
    pub status: String,
    pub customer: BilledTo,
    pub lines: Vec<DocLine>,
    pub summary: Vec<SummaryRow>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub watermark: Option<Watermark>,
}

#[derive(Debug, Serialize)]
pub struct ReceiptDoc {
    pub company: CompanyBlock,
    pub number: String,
    pub issued_at: String,
    pub customer: String,
    pub job_number: Option<String>,
    pub invoice_number: Option<String>,
    pub amount: String,
    pub method: String,
    pub reference: Option<String>,
    pub issued_by: Option<String>,
    pub notes: Option<String>,
    pub watermark: Watermark,
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn amount(settings: &DocumentSettings, value: Money) -> String {
    let sign = if value.is_negative() { "-" } else { "" };
    let magnitude = Money::ZERO - value;
    let shown = if value.is_negative() { magnitude } else { value };
    format!("{sign}{}{}", settings.currency_symbol, shown.grouped())
}

fn row(label: &str, value: String, emphasis: bool) -> SummaryRow {
    SummaryRow {
        label: label.to_string(),
        value,
        emphasis,
    }
}

fn doc_lines(lines: &[JobLine], settings: &DocumentSettings) -> Vec<DocLine> {
    lines
        .iter()
        .map(|line| DocLine {
            description: line.description(),
            quantity: line.quantity.normalize().to_string(),
            unit_price: amount(settings, line.unit_price),
            amount: amount(settings, line.total_amount),
            staff: line.assigned_employee_names.join(", "),
            done: line.is_completed,
        })
        .collect()
}

pub fn job_card(company: &Company, job: &Job, settings: &DocumentSettings) -> JobCardDoc {
    let badge = job.status.badge();
    let total = if job.final_total.is_zero() {
        job.estimate_total
    } else {
        job.final_total
    };

    let mut summary = Vec::new();
    if !job.estimate_total.is_zero() {
        summary.push(row("Estimate", amount(settings, job.estimate_total), false));
    }
    if !job.discount_amount.is_zero() {
        summary.push(row("Discount", amount(settings, Money::ZERO - job.discount_amount), false));
    }
    if !job.tax_amount.is_zero() {
        summary.push(row("Tax", amount(settings, job.tax_amount), false));
    }
    summary.push(row("Total", amount(settings, total), true));
    summary.push(row("Paid", amount(settings, job.payments_total), false));
    summary.push(row("Balance due", amount(settings, job.balance_due), true));

    JobCardDoc {
        company: company.into(),
        number: job.reference().to_string(),
        date: job
            .created_at
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
        status: badge.label.to_string(),
        status_color: badge.tone.hex().to_string(),
        customer: BilledTo::from_job(job),
        technician: job.technician_name.clone(),
        lines: doc_lines(&job.lines, settings),
        summary,
        notes: job.notes.as_deref().and_then(non_blank),
    }
}

/// Invoice document. Line items come from the invoiced job when it is known.
pub fn invoice(
    company: &Company,
    invoice: &Invoice,
    job: Option<&Job>,
    settings: &DocumentSettings,
) -> InvoiceDoc {
    let mut summary = vec![row("Subtotal", amount(settings, invoice.subtotal), false)];
    if !invoice.discount_amount.is_zero() {
        summary.push(row(
            "Discount",
            amount(settings, Money::ZERO - invoice.discount_amount),
            false,
        ));
    }
    if !invoice.tax_amount.is_zero() {
        summary.push(row("Tax", amount(settings, invoice.tax_amount), false));
    }
    summary.push(row("Total", amount(settings, invoice.total_amount), true));
    if let Some(job) = job {
        summary.push(row("Paid", amount(settings, job.payments_total), false));
        summary.push(row("Balance due", amount(settings, job.balance_due), true));
    }

    let customer = match job {
        Some(job) => BilledTo::from_job(job),
        None => BilledTo {
            name: invoice
                .customer_name
                .clone()
                .unwrap_or_else(|| "Walk-in customer".into()),
            phone: None,
            vehicle: None,
        },
    };

    InvoiceDoc {
        company: company.into(),
        number: invoice.invoice_number.clone(),
        job_number: invoice
            .job_number
            .clone()
            .or_else(|| job.map(|j| j.reference().to_string())),
        issue_date: invoice.issue_date.format(DATE_FORMAT).to_string(),
        due_date: invoice.due_date.format(DATE_FORMAT).to_string(),
        status: invoice.status.badge().label.to_string(),
        customer,
        lines: job.map(|j| doc_lines(&j.lines, settings)).unwrap_or_default(),
        summary,
        notes: non_blank(&invoice.notes),
        terms: non_blank(&invoice.terms_and_conditions),
        watermark: invoice_watermark(invoice.status),
    }
}

/// PAID and OVERDUE invoices carry a watermark in their status colour.
pub fn invoice_watermark(status: InvoiceStatus) -> Option<Watermark> {
    status.watermark().map(|text| Watermark {
        text: text.to_string(),
        color: status.badge().tone.hex().to_string(),
    })
}

pub fn receipt(company: &Company, receipt: &Receipt, settings: &DocumentSettings) -> ReceiptDoc {
    ReceiptDoc {
        company: company.into(),
        number: receipt.receipt_number.clone(),
        issued_at: receipt
            .issued_at
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
        customer: receipt
            .customer_name
            .clone()
            .unwrap_or_else(|| "Walk-in customer".into()),
        job_number: receipt.job_number.clone(),
        invoice_number: receipt.invoice_number.clone(),
        amount: amount(settings, receipt.amount_paid),
        method: receipt.payment_method.label().to_string(),
        reference: non_blank(&receipt.payment_reference),
        issued_by: receipt.issued_by_name.clone(),
        notes: non_blank(&receipt.notes),
        watermark: Watermark {
            text: "PAID".into(),
            color: InvoiceStatus::Paid.badge().tone.hex().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobStatus;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn settings() -> DocumentSettings {
        DocumentSettings {
            output_dir: "output".into(),
            currency_symbol: "KSh ".into(),
            phone_country_code: None,
        }
    }

    fn sample_job() -> Job {
        serde_json::from_str(
            r#"{
                "id": "j1",
                "job_number": "JOB-0042",
                "customer_name": "Wanjiru",
                "vehicle_display": "KDA 123A Toyota Axio",
                "status": "COMPLETED",
                "final_total": "1250.00",
                "payments_total": "1000.00",
                "balance_due": "250.00",
                "lines": [{
                    "id": "l1",
                    "service_variant_name": "Full service",
                    "quantity": "1.00",
                    "unit_price": "1250.00",
                    "total_amount": "1250.00",
                    "is_completed": true,
                    "assigned_employees": ["e1"],
                    "assigned_employee_names": ["Achieng"]
                }]
            }"#,
        )
        .unwrap()
    }

    fn sample_invoice(status: InvoiceStatus) -> Invoice {
        Invoice {
            id: "i1".into(),
            invoice_number: "INV-0007".into(),
            job: "j1".into(),
            job_number: None,
            customer_name: Some("Wanjiru".into()),
            status,
            issue_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
            subtotal: Money::new(125000, 2),
            tax_amount: Money::ZERO,
            discount_amount: Money::ZERO,
            total_amount: Money::new(125000, 2),
            notes: String::new(),
            terms_and_conditions: "Payment due within 14 days".into(),
        }
    }

    #[test]
    fn job_card_formats_amounts_and_status() {
        let job = sample_job();
        let doc = job_card(&Company::default(), &job, &settings());
        assert_eq!(doc.number, "JOB-0042");
        assert_eq!(doc.status, "Completed");
        assert_eq!(doc.lines[0].amount, "KSh 1,250.00");
        assert_eq!(doc.lines[0].quantity, "1");
        assert_eq!(doc.lines[0].staff, "Achieng");
        let balance = doc.summary.last().unwrap();
        assert_eq!((balance.label.as_str(), balance.value.as_str()), ("Balance due", "KSh 250.00"));
        assert_eq!(job.lines[0].quantity, Decimal::new(100, 2));
    }

    #[test]
    fn only_paid_and_overdue_invoices_get_a_watermark() {
        for status in InvoiceStatus::ALL {
            let doc = invoice(&Company::default(), &sample_invoice(*status), None, &settings());
            match status {
                InvoiceStatus::Paid => assert_eq!(doc.watermark.unwrap().text, "PAID"),
                InvoiceStatus::Overdue => assert_eq!(doc.watermark.unwrap().text, "OVERDUE"),
                _ => assert!(doc.watermark.is_none()),
            }
        }
    }

    #[test]
    fn invoice_takes_lines_from_the_job() {
        let job = sample_job();
        let doc = invoice(
            &Company::default(),
            &sample_invoice(InvoiceStatus::Sent),
            Some(&job),
            &settings(),
        );
        assert_eq!(doc.lines.len(), 1);
        assert_eq!(doc.job_number.as_deref(), Some("JOB-0042"));
        assert_eq!(doc.customer.vehicle.as_deref(), Some("KDA 123A Toyota Axio"));
        assert_eq!(doc.terms.as_deref(), Some("Payment due within 14 days"));
        assert!(doc.notes.is_none());
    }

    #[test]
    fn discounts_render_negative() {
        let mut inv = sample_invoice(InvoiceStatus::Sent);
        inv.discount_amount = Money::new(5000, 2);
        let doc = invoice(&Company::default(), &inv, None, &settings());
        assert_eq!(doc.summary[1].value, "-KSh 50.00");
    }

    #[test]
    fn job_status_colour_follows_its_badge() {
        let mut job = sample_job();
        job.status = JobStatus::Cancelled;
        let doc = job_card(&Company::default(), &job, &settings());
        assert_eq!(doc.status_color, "#dc2626");
    }
}
