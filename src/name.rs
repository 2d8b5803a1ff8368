//! Flattening of X.509 distinguished names into attribute maps.
//!
//! A distinguished name is an ordered sequence of relative distinguished
//! names, each holding one or more attribute/value pairs. Reports only need
//! a lookup by attribute type, so the sequence is folded into a map where a
//! repeated attribute type keeps the value seen last.

use std::collections::BTreeMap;

use openssl::x509::X509NameRef;
use crate::error::TLSCheckError;

pub const ORGANIZATION_NAME: &str = "organizationName";
pub const COMMON_NAME: &str = "commonName";
pub const COUNTRY_NAME: &str = "countryName";

/// Attribute type to value, keyed by the long attribute name
/// (`organizationName`, `commonName`, `countryName`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    attributes: BTreeMap<String, String>,
}

impl DistinguishedName {
    /// Folds ordered attribute/value pairs into a map. Last write wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut attributes = BTreeMap::new();
        for (key, value) in pairs {
            attributes.insert(key.into(), value.into());
        }
        DistinguishedName { attributes }
    }

    /// Decomposes an OpenSSL name into attribute/value pairs, in encoding order.
    ///
    /// Attributes without a registered long name are keyed by their dotted OID.
    /// A value that is not UTF-8, or that carries a NUL byte, fails with
    /// `CertificateParse`.
    ///
    /// OpenSSL exposes a name as a flat list of entries without its RDN
    /// grouping, so every pair of a multi-valued RDN takes part in the fold.
    /// For `CN=a+CN=b` the result is `b`, not the first pair of the set.
    pub fn from_x509_name(name: &X509NameRef) -> Result<Self, TLSCheckError> {
        let mut pairs = Vec::new();
        for entry in name.entries() {
            let object = entry.object();
            let key = match object.nid().long_name() {
                Ok(long_name) => long_name.to_string(),
                Err(_) => object.to_string(),
            };
            let bytes = entry.data().as_slice();
            if bytes.contains(&0) {
                return Err(TLSCheckError::certificate_parse(format!(
                    "attribute '{}' contains a NUL byte",
                    key
                )));
            }
            let value = std::str::from_utf8(bytes).map_err(|e| {
                TLSCheckError::certificate_parse(format!(
                    "attribute '{}' is not valid UTF-8: {}",
                    key, e
                ))
            })?;
            pairs.push((key, value.to_string()));
        }
        Ok(DistinguishedName::from_pairs(pairs))
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }

    /// Looks up an attribute that must be present.
    pub fn require(&self, attribute: &str) -> Result<&str, TLSCheckError> {
        self.get(attribute)
            .ok_or_else(|| TLSCheckError::MissingIssuerField {
                attribute: attribute.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::nid::Nid;
    use openssl::x509::X509NameBuilder;

    #[test]
    fn test_last_write_wins() {
        let dn = DistinguishedName::from_pairs(vec![
            (COMMON_NAME, "Intermediate"),
            (ORGANIZATION_NAME, "Example CA"),
            (COMMON_NAME, "Example Root"),
        ]);
        assert_eq!(dn.get(COMMON_NAME), Some("Example Root"));
        assert_eq!(dn.get(ORGANIZATION_NAME), Some("Example CA"));
    }

    #[test]
    fn test_require_missing_attribute() {
        let dn = DistinguishedName::from_pairs(vec![(COMMON_NAME, "Example Root")]);
        match dn.require(COUNTRY_NAME) {
            Err(TLSCheckError::MissingIssuerField { attribute }) => {
                assert_eq!(attribute, COUNTRY_NAME)
            }
            other => panic!("expected missing field, got {:?}", other),
        }
    }

    #[test]
    fn test_from_x509_name_uses_long_names() {
        let mut builder = X509NameBuilder::new().unwrap();
        builder.append_entry_by_nid(Nid::COUNTRYNAME, "US").unwrap();
        builder
            .append_entry_by_nid(Nid::ORGANIZATIONNAME, "Example CA")
            .unwrap();
        builder
            .append_entry_by_nid(Nid::COMMONNAME, "Example Root")
            .unwrap();
        let name = builder.build();

        let dn = DistinguishedName::from_x509_name(&name).unwrap();
        assert_eq!(dn.get(COUNTRY_NAME), Some("US"));
        assert_eq!(dn.get(ORGANIZATION_NAME), Some("Example CA"));
        assert_eq!(dn.get(COMMON_NAME), Some("Example Root"));
    }

    #[test]
    fn test_from_x509_name_repeated_attribute() {
        let mut builder = X509NameBuilder::new().unwrap();
        builder.append_entry_by_nid(Nid::COMMONNAME, "first").unwrap();
        builder.append_entry_by_nid(Nid::COMMONNAME, "second").unwrap();
        let name = builder.build();

        let dn = DistinguishedName::from_x509_name(&name).unwrap();
        assert_eq!(dn.get(COMMON_NAME), Some("second"));
    }

    #[test]
    fn test_from_x509_name_rejects_embedded_nul() {
        let mut builder = X509NameBuilder::new().unwrap();
        builder
            .append_entry_by_nid(Nid::ORGANIZATIONNAME, "Example CA\0Evil Corp")
            .unwrap();
        let name = builder.build();
        let raw = name.entries().next().unwrap().data().as_slice().len();
        assert_eq!(raw, "Example CA\0Evil Corp".len());

        match DistinguishedName::from_x509_name(&name) {
            Err(TLSCheckError::CertificateParse { reason }) => {
                assert!(reason.contains(ORGANIZATION_NAME), "{}", reason)
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
