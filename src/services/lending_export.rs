//! CSV rendering of lending transaction headers

use serde::Serialize;

use crate::domain::LendingHeader;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Transaction ID")]
    id: &'a str,
    #[serde(rename = "User ID")]
    user_id: &'a str,
    #[serde(rename = "User Name")]
    user_name: &'a str,
    #[serde(rename = "NIK Staff")]
    staff_nik: &'a str,
    #[serde(rename = "Staff Name")]
    staff_name: &'a str,
    #[serde(rename = "Submission Date")]
    submission_date: String,
    #[serde(rename = "Return Date")]
    return_date: String,
}

pub fn headers_to_csv(headers: &[LendingHeader]) -> Result<Vec<u8>, String> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    // serde only writes the header record together with the first row
    if headers.is_empty() {
        wtr.write_record([
            "Transaction ID",
            "User ID",
            "User Name",
            "NIK Staff",
            "Staff Name",
            "Submission Date",
            "Return Date",
        ])
        .map_err(|e| format!("CSV write error: {}", e))?;
    }

    for header in headers {
        wtr.serialize(CsvRow {
            id: &header.id,
            user_id: &header.user_id,
            user_name: &header.user_name,
            staff_nik: &header.staff_nik,
            staff_name: &header.staff_name,
            submission_date: header.submission_date.to_rfc3339(),
            return_date: header.return_date.to_rfc3339(),
        })
        .map_err(|e| format!("CSV write error: {}", e))?;
    }

    wtr.into_inner()
        .map_err(|e| format!("CSV flush error: {}", e))
}
