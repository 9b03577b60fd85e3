//! CSV export of repair inquiries.
//!
//! Every field is quoted, embedded quotes are doubled, and rows end with
//! `\r\n` so the file opens cleanly in spreadsheet software.

use chrono::{DateTime, Utc};

use crate::db::inquiries::ServiceInquiry;

const HEADER: &str =
    "ID,Date,Full Name,Email,Phone,Service,Status,Description,Quoted Price,Admin Notes";

/// Render inquiries as a UTF-8 CSV document, header first.
#[must_use]
pub fn inquiries_to_csv(inquiries: &[ServiceInquiry]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str("\r\n");

    for inquiry in inquiries {
        let fields = [
            inquiry.id.to_string(),
            inquiry.created_at.format("%Y-%m-%d %H:%M").to_string(),
            inquiry.full_name.clone(),
            inquiry.email.clone(),
            inquiry.phone.clone().unwrap_or_default(),
            inquiry.service_type.clone(),
            inquiry.status.to_string(),
            inquiry.description.clone(),
            inquiry
                .quoted_price
                .map(|p| p.to_string())
                .unwrap_or_default(),
            inquiry.admin_notes.clone().unwrap_or_default(),
        ];

        let row = fields
            .iter()
            .map(|field| quote(field))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&row);
        out.push_str("\r\n");
    }

    out
}

/// Attachment filename with an export timestamp.
#[must_use]
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("repair-inquiries-{}.csv", now.format("%Y%m%d%H%M%S"))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use satchel_core::{InquiryId, InquiryStatus};

    use super::*;

    fn inquiry(id: i32, full_name: &str, description: &str) -> ServiceInquiry {
        ServiceInquiry {
            id: InquiryId::new(id),
            created_at: Utc.with_ymd_and_hms(2026, 8, 24, 10, 30, 0).unwrap(),
            full_name: full_name.to_owned(),
            email: "customer@example.com".to_owned(),
            phone: Some("555-0101".to_owned()),
            service_type: "Zipper replacement".to_owned(),
            status: InquiryStatus::Quoted,
            description: description.to_owned(),
            quoted_price: Some(dec!(35.00)),
            admin_notes: None,
        }
    }

    #[test]
    fn header_matches_expected_columns() {
        let csv = inquiries_to_csv(&[]);
        assert_eq!(
            csv,
            "ID,Date,Full Name,Email,Phone,Service,Status,Description,Quoted Price,Admin Notes\r\n"
        );
    }

    #[test]
    fn one_line_per_inquiry_plus_header() {
        let inquiries = vec![
            inquiry(1, "Ada", "Broken strap"),
            inquiry(2, "Grace", "Torn lining"),
            inquiry(3, "Edsger", "Worn handle"),
        ];
        let csv = inquiries_to_csv(&inquiries);
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn every_field_is_quoted() {
        let csv = inquiries_to_csv(&[inquiry(7, "Ada", "Broken strap")]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("\"7\",\"2026-08-24 10:30\",\"Ada\""));
        assert!(row.contains("\"quoted\""));
        assert!(row.contains("\"35.00\""));
        assert!(row.ends_with("\"\""));
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let csv = inquiries_to_csv(&[inquiry(1, "Ada \"Countess\" Lovelace", "strap")]);
        assert!(csv.contains("\"Ada \"\"Countess\"\" Lovelace\""));
    }

    #[test]
    fn commas_and_newlines_stay_inside_the_field() {
        let csv = inquiries_to_csv(&[inquiry(1, "Ada", "leather, cracked")]);
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("\"leather, cracked\""));
    }

    #[test]
    fn filename_carries_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 8, 24, 10, 30, 0).unwrap();
        assert_eq!(export_filename(now), "repair-inquiries-20260824103000.csv");
    }
}
