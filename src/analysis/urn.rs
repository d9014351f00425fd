//! Minimal `urn:<nid>:<nss>` primitive.
//!
//! Only the namespace identifier is case-insensitive. The namespace-specific
//! string is compared literally after percent-escape normalization.

use std::str::FromStr;

use crate::error::TypeError;

const NSS_SPECIALS: &str = "-._~!$&'()*+,;=:@/";

/// A parsed, syntactically valid URN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Urn {
    nid: String,
    nss: String,
}

impl Urn {
    /// Build a URN from its two halves, validating both.
    pub fn new(nid: &str, nss: &str) -> Result<Self, TypeError> {
        let urn = format!("urn:{}:{}", nid, nss);
        validate_nid(nid).map_err(|reason| invalid(&urn, reason))?;
        validate_nss(nss).map_err(|reason| invalid(&urn, reason))?;
        Ok(Self {
            nid: nid.to_string(),
            nss: nss.to_string(),
        })
    }

    /// Parse `urn:<nid>:<nss>`. The `urn` scheme is matched case-insensitively.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let (scheme, rest) = input
            .split_once(':')
            .ok_or_else(|| invalid(input, "missing scheme"))?;
        if !scheme.eq_ignore_ascii_case("urn") {
            return Err(invalid(input, "scheme must be 'urn'"));
        }
        let (nid, nss) = rest
            .split_once(':')
            .ok_or_else(|| invalid(input, "missing namespace-specific string"))?;
        validate_nid(nid).map_err(|reason| invalid(input, reason))?;
        validate_nss(nss).map_err(|reason| invalid(input, reason))?;
        Ok(Self {
            nid: nid.to_string(),
            nss: nss.to_string(),
        })
    }

    /// Namespace identifier as written.
    pub fn nid(&self) -> &str {
        &self.nid
    }

    /// Namespace-specific string as written.
    pub fn nss(&self) -> &str {
        &self.nss
    }

    /// Lowercase the namespace identifier and uppercase percent-escape digits.
    pub fn normalize(&self) -> Self {
        Self {
            nid: self.nid.to_ascii_lowercase(),
            nss: normalize_escapes(&self.nss),
        }
    }

    /// URN equivalence: normalized namespace identifier and body are equal.
    pub fn matches(&self, other: &Urn) -> bool {
        let a = self.normalize();
        let b = other.normalize();
        a.nid == b.nid && a.nss == b.nss
    }
}

impl std::fmt::Display for Urn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "urn:{}:{}", self.nid, self.nss)
    }
}

impl FromStr for Urn {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Urn::parse(s)
    }
}

fn invalid(urn: &str, reason: impl Into<String>) -> TypeError {
    TypeError::InvalidUrn {
        urn: urn.to_string(),
        reason: reason.into(),
    }
}

fn validate_nid(nid: &str) -> Result<(), &'static str> {
    if nid.len() < 2 || nid.len() > 32 {
        return Err("namespace identifier must be 2 to 32 characters");
    }
    if !nid.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err("namespace identifier may only contain letters, digits and '-'");
    }
    if nid.starts_with('-') || nid.ends_with('-') {
        return Err("namespace identifier cannot start or end with '-'");
    }
    if nid.eq_ignore_ascii_case("urn") {
        return Err("namespace identifier 'urn' is reserved");
    }
    Ok(())
}

fn validate_nss(nss: &str) -> Result<(), &'static str> {
    if nss.is_empty() {
        return Err("empty namespace-specific string");
    }
    let bytes = nss.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '%' {
            let escape = bytes.get(i + 1..i + 3).ok_or("truncated percent escape")?;
            if !escape.iter().all(u8::is_ascii_hexdigit) {
                return Err("invalid percent escape");
            }
            i += 3;
            continue;
        }
        if !(c.is_ascii_alphanumeric() || NSS_SPECIALS.contains(c)) {
            return Err("invalid character in namespace-specific string");
        }
        i += 1;
    }
    Ok(())
}

fn normalize_escapes(nss: &str) -> String {
    let mut out = String::with_capacity(nss.len());
    let mut remaining = 0;
    for c in nss.chars() {
        if remaining > 0 {
            out.push(c.to_ascii_uppercase());
            remaining -= 1;
        } else {
            if c == '%' {
                remaining = 2;
            }
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let urn = Urn::parse("urn:nop:nop").unwrap();
        assert_eq!(urn.nid(), "nop");
        assert_eq!(urn.nss(), "nop");
        assert_eq!(urn.to_string(), "urn:nop:nop");
    }

    #[test]
    fn test_parse_enricher_body() {
        let urn = Urn::parse("urn:scan:falco!npm,install.json+urn:enrich:verdicts").unwrap();
        assert_eq!(urn.nid(), "scan");
        assert_eq!(urn.nss(), "falco!npm,install.json+urn:enrich:verdicts");
    }

    #[test]
    fn test_scheme_and_nid_case_insensitive() {
        let a = Urn::parse("URN:SCAN:falco!npm").unwrap();
        let b = Urn::parse("urn:scan:falco!npm").unwrap();
        assert!(a.matches(&b));
        assert_eq!(a.normalize().to_string(), "urn:scan:falco!npm");
    }

    #[test]
    fn test_nss_case_sensitive() {
        let a = Urn::parse("urn:scan:Falco!npm").unwrap();
        let b = Urn::parse("urn:scan:falco!npm").unwrap();
        assert!(!a.matches(&b));
    }

    #[test]
    fn test_percent_escapes_normalized() {
        let a = Urn::parse("urn:scan:a%2fb").unwrap();
        let b = Urn::parse("urn:scan:a%2Fb").unwrap();
        assert!(a.matches(&b));
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(Urn::parse("something").is_err());
        assert!(Urn::parse("http://example.com").is_err());
        assert!(Urn::parse("urn:x:nss").is_err());
        assert!(Urn::parse("urn:scan:").is_err());
        assert!(Urn::parse("urn:scan:a b").is_err());
        assert!(Urn::parse("urn:scan:a%2").is_err());
        assert!(Urn::parse("urn:-scan:a").is_err());
    }
}
