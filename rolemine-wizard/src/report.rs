//! CSV report of the visible role list

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use rolemine_common::models::Role;
use rolemine_common::{Error, Result};

/// First line of every report
pub const REPORT_HEADER: &str = "Role ID,Role Name,User Count,Applications,Permission Count";

/// Generated report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub filename: String,
    pub contents: String,
}

/// `RoleMiningReport_<timestamp>.csv` with ':' and '.' replaced by '-'
pub fn report_filename(at: DateTime<Utc>) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("RoleMiningReport_{}.csv", timestamp)
}

/// Serialize roles, one row each, applications joined with ", "
pub fn build_report(roles: &[Role], at: DateTime<Utc>) -> Result<ReportFile> {
    let mut buf = Vec::with_capacity(64 * (roles.len() + 1));
    buf.extend_from_slice(REPORT_HEADER.as_bytes());
    buf.push(b'\n');

    // Text fields are always quoted; numeric ones never are
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::NonNumeric)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(buf);

    for role in roles {
        writer.write_record([
            role.id.to_string(),
            role.name.clone(),
            role.user_count.to_string(),
            role.applications.join(", "),
            role.permission_count.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("Report buffer flush failed: {}", e)))?;
    let contents =
        String::from_utf8(bytes).map_err(|e| Error::Internal(format!("Report is not UTF-8: {}", e)))?;

    Ok(ReportFile {
        filename: report_filename(at),
        contents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filename_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(
            report_filename(at),
            "RoleMiningReport_2024-03-05T14-07-09-000Z.csv"
        );
    }

    #[test]
    fn test_report_rows() {
        let roles = vec![
            Role::new(1, "Role 1", 15, &["App1", "App2"], 5),
            Role::new("ai-7", "Say \"Hi\" Team", 2, &["CRM"], 1),
        ];
        let report = build_report(&roles, Utc::now()).unwrap();
        let lines: Vec<&str> = report.contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], REPORT_HEADER);
        assert_eq!(lines[1], r#"1,"Role 1",15,"App1, App2",5"#);
        assert_eq!(lines[2], r#""ai-7","Say ""Hi"" Team",2,"CRM",1"#);
    }

    #[test]
    fn test_empty_report_is_header_only() {
        let report = build_report(&[], Utc::now()).unwrap();
        assert_eq!(report.contents, format!("{}\n", REPORT_HEADER));
    }
}
