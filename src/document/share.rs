use urlencoding::encode;

use crate::config::{Company, DocumentSettings};
use crate::error::{FieldErrors, Result, ShopError};
use crate::model::{Invoice, Receipt};

/// `mailto:` link with subject and body filled in.
///
/// The recipient goes into the link as typed, so anything that could start
/// another header or a second address is refused.
pub fn email_intent(to: &str, subject: &str, body: &str) -> Result<String> {
    let to = to.trim();
    if !is_plain_address(to) {
        let mut errors = FieldErrors::new();
        errors.add("to", "Enter a valid email address");
        return Err(ShopError::Validation(errors));
    }
    Ok(format!(
        "mailto:{}?subject={}&body={}",
        to,
        encode(subject),
        encode(body)
    ))
}

fn is_plain_address(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !address
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "?&#%,;<>\"".contains(c))
}

/// WhatsApp click-to-chat link with a pre-filled message.
pub fn whatsapp_intent(phone: &str, country_code: Option<&str>, text: &str) -> Result<String> {
    let number = normalize_phone(phone, country_code).ok_or_else(|| {
        let mut errors = FieldErrors::new();
        errors.add("to", "Enter a valid phone number");
        ShopError::Validation(errors)
    })?;
    Ok(format!("https://wa.me/{}?text={}", number, encode(text)))
}

/// Digits only, with a local leading `0` swapped for the country code.
pub fn normalize_phone(phone: &str, country_code: Option<&str>) -> Option<String> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 7 {
        return None;
    }
    let code: String = country_code
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    match digits.strip_prefix('0') {
        Some(local) if !code.is_empty() && !phone.trim_start().starts_with('+') => {
            Some(format!("{code}{local}"))
        }
        _ => Some(digits),
    }
}

/// Subject and body for sending an invoice.
pub fn invoice_message(
    company: &Company,
    invoice: &Invoice,
    settings: &DocumentSettings,
) -> (String, String) {
    let company = company.resolved();
    let subject = format!("Invoice {} from {}", invoice.invoice_number, company.name);
    let greeting = invoice
        .customer_name
        .as_deref()
        .map(|name| format!("Dear {name},"))
        .unwrap_or_else(|| "Hello,".to_string());
    let body = format!(
        "{greeting}\n\nPlease find invoice {} for {}{} due on {}.\n\nThank you,\n{}",
        invoice.invoice_number,
        settings.currency_symbol,
        invoice.total_amount.grouped(),
        invoice.due_date.format("%d %b %Y"),
        company.name,
    );
    (subject, body)
}

/// Subject and body for sending a receipt.
pub fn receipt_message(
    company: &Company,
    receipt: &Receipt,
    settings: &DocumentSettings,
) -> (String, String) {
    let company = company.resolved();
    let subject = format!("Receipt {} from {}", receipt.receipt_number, company.name);
    let greeting = receipt
        .customer_name
        .as_deref()
        .map(|name| format!("Dear {name},"))
        .unwrap_or_else(|| "Hello,".to_string());
    let body = format!(
        "{greeting}\n\nWe have received {}{} by {}. Receipt number {}.\n\nThank you,\n{}",
        settings.currency_symbol,
        receipt.amount_paid.grouped(),
        receipt.payment_method.label(),
        receipt.receipt_number,
        company.name,
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_numbers_get_the_country_code() {
        assert_eq!(
            normalize_phone("0712 345 678", Some("254")).as_deref(),
            Some("254712345678")
        );
        assert_eq!(
            normalize_phone("+254 712-345-678", Some("254")).as_deref(),
            Some("254712345678")
        );
        assert_eq!(normalize_phone("0712345678", None).as_deref(), Some("0712345678"));
        assert_eq!(normalize_phone("12", Some("254")), None);
    }

    #[test]
    fn whatsapp_link_encodes_the_text() {
        let url = whatsapp_intent("0712345678", Some("254"), "Receipt RCP-1: KSh 1,250.00").unwrap();
        assert_eq!(
            url,
            "https://wa.me/254712345678?text=Receipt%20RCP-1%3A%20KSh%201%2C250.00"
        );
    }

    #[test]
    fn email_link_needs_an_address() {
        let url = email_intent("owner@example.com", "Invoice INV-1", "Hi & thanks").unwrap();
        assert_eq!(
            url,
            "mailto:owner@example.com?subject=Invoice%20INV-1&body=Hi%20%26%20thanks"
        );
        let err = email_intent("not-an-address", "s", "b").unwrap_err();
        assert!(err.field_errors().unwrap().contains("to"));
    }

    #[test]
    fn email_recipient_cannot_smuggle_headers() {
        for to in [
            "a@b.com?cc=x@y",
            "a@b.com&bcc=x@y.com",
            "a@b.com,x@y.com",
            "a@b.com;x@y.com",
            "a b@c.com",
            "a@b.com#frag",
            "a%40b@c.com",
            "@b.com",
            "a@",
        ] {
            let err = email_intent(to, "s", "b").unwrap_err();
            assert!(err.field_errors().unwrap().contains("to"), "{to} accepted");
        }
        assert!(email_intent(" first.last+tag@shop.co.ke ", "s", "b")
            .unwrap()
            .starts_with("mailto:first.last+tag@shop.co.ke?subject="));
    }
}
