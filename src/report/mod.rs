//! Derivation of report lines from a negotiated session.
//!
//! [`report`] is all-or-nothing: every requested field is derived before the
//! caller sees any of them, so a failure never leaves a partial report.
//!
//! # Submodules
//!
//! - `field` - selectable fields and their canonical order
//! - `output` - text, JSON and table rendering

pub mod field;
pub mod output;

use serde::Serialize;

use crate::error::TLSCheckError;
use crate::name::{COMMON_NAME, COUNTRY_NAME, ORGANIZATION_NAME};
use crate::time::{days_until, format_timestamp, Clock};
use crate::{Session, Target};

pub use field::{Field, FieldSet};
pub use output::OutputFormat;

/// One rendered field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub field: Field,
    pub label: &'static str,
    pub value: String,
}

impl ReportLine {
    /// `label value`, as printed in text output.
    pub fn to_line(&self) -> String {
        format!("{} {}", self.label, self.value)
    }
}

/// The requested fields of one session, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub target: Target,
    pub lines: Vec<ReportLine>,
}

/// Derives each requested field from `session`, using `clock` for the expiry
/// countdown.
///
/// # Errors
///
/// * `MissingIssuerField` - the issuer field was requested and the issuer lacks
///   `organizationName`, `commonName` or `countryName`
pub fn report(
    session: &Session,
    fields: FieldSet,
    clock: &dyn Clock,
) -> Result<Report, TLSCheckError> {
    let lines = fields
        .iter()
        .map(|field| {
            Ok(ReportLine {
                field,
                label: field.label(),
                value: render(session, field, clock)?,
            })
        })
        .collect::<Result<Vec<_>, TLSCheckError>>()?;

    Ok(Report {
        target: session.target.clone(),
        lines,
    })
}

fn render(session: &Session, field: Field, clock: &dyn Clock) -> Result<String, TLSCheckError> {
    let cert = &session.certificate;
    let value = match field {
        Field::Expiry => format_timestamp(&cert.not_after),
        Field::Issue => format_timestamp(&cert.not_before),
        Field::Days => days_until(&cert.not_after, &clock.now()).to_string(),
        Field::Tls => session.protocol_version.clone(),
        Field::Ciphers => session.cipher.to_string(),
        Field::Issuer => format!(
            "{}, {}, {}",
            cert.issuer.require(ORGANIZATION_NAME)?,
            cert.issuer.require(COMMON_NAME)?,
            cert.issuer.require(COUNTRY_NAME)?
        ),
    };
    Ok(value)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::name::DistinguishedName;
    use crate::time::FixedClock;
    use crate::{Certificate, CipherSuite};
    use chrono::{TimeZone, Utc};

    pub(crate) fn sample_session() -> Session {
        Session {
            target: Target::new("example.com", 443).unwrap(),
            certificate: Certificate {
                not_before: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                not_after: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
                issuer: DistinguishedName::from_pairs(vec![
                    (ORGANIZATION_NAME, "Example CA"),
                    (COMMON_NAME, "Example Root"),
                    (COUNTRY_NAME, "US"),
                ]),
                subject: DistinguishedName::from_pairs(vec![(COMMON_NAME, "example.com")]),
            },
            protocol_version: "TLSv1.3".to_string(),
            cipher: CipherSuite {
                name: "TLS_AES_256_GCM_SHA384".to_string(),
                protocol: "TLSv1.3".to_string(),
                secret_bits: 256,
            },
        }
    }

    fn may_first() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
    }

    fn text(report: &Report) -> Vec<String> {
        report.lines.iter().map(ReportLine::to_line).collect()
    }

    #[test]
    fn test_full_report() {
        let report = report(&sample_session(), FieldSet::all(), &may_first()).unwrap();
        assert_eq!(
            text(&report),
            vec![
                "Certificate expires on: 2024-06-01 00:00:00",
                "Certificate was issued on: 2024-01-01 00:00:00",
                "Days until certificate expiry: 31",
                "TLS version: TLSv1.3",
                "Ciphers used: ('TLS_AES_256_GCM_SHA384', 'TLSv1.3', 256)",
                "Issuer: Example CA, Example Root, US",
            ]
        );
    }

    #[test]
    fn test_subset_report() {
        let fields = FieldSet::from_selection(false, vec![Field::Issuer, Field::Days]);
        let report = report(&sample_session(), fields, &may_first()).unwrap();
        assert_eq!(
            text(&report),
            vec![
                "Days until certificate expiry: 31",
                "Issuer: Example CA, Example Root, US",
            ]
        );
    }

    #[test]
    fn test_expired_certificate_has_negative_days() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap());
        let fields = FieldSet::from_selection(false, vec![Field::Days]);
        let report = report(&sample_session(), fields, &clock).unwrap();
        assert_eq!(report.lines[0].value, "-31");
    }

    #[test]
    fn test_missing_issuer_field_fails_whole_report() {
        let mut session = sample_session();
        session.certificate.issuer = DistinguishedName::from_pairs(vec![
            (ORGANIZATION_NAME, "Example CA"),
            (COMMON_NAME, "Example Root"),
        ]);

        match report(&session, FieldSet::all(), &may_first()) {
            Err(TLSCheckError::MissingIssuerField { attribute }) => {
                assert_eq!(attribute, COUNTRY_NAME)
            }
            other => panic!("expected missing issuer field, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_issuer_field_ignored_when_not_requested() {
        let mut session = sample_session();
        session.certificate.issuer = DistinguishedName::default();

        let fields = FieldSet::from_selection(false, vec![Field::Tls]);
        let report = report(&session, fields, &may_first()).unwrap();
        assert_eq!(text(&report), vec!["TLS version: TLSv1.3"]);
    }
}
