// crates/driftlock-resolver/src/uri.rs
//
// The drift:// URI grammar:
//
//   drift:// scheme [ "/" subtype ] "/" contentID
//
// where scheme is `hash`, `semantic`, or `rdf` and contentID is a
// lowercase-hex SHA-256 digest. Examples:
//
//   drift://hash/ab12...
//   drift://semantic/structural/cd34...
//   drift://rdf/turtle/ef56...

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use driftlock_core::hashing::is_hex_digest;
use driftlock_core::DriftlockError;

/// URI scheme family, chosen from the patch's significance class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UriScheme {
    /// Content-hash only; no semantic significance established.
    Hash,
    /// Semantically significant change.
    Semantic,
    /// RDF-derived patch that did not rise to `semantic`.
    Rdf,
}

impl UriScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            UriScheme::Hash => "hash",
            UriScheme::Semantic => "semantic",
            UriScheme::Rdf => "rdf",
        }
    }
}

impl FromStr for UriScheme {
    type Err = DriftlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hash" => Ok(UriScheme::Hash),
            "semantic" => Ok(UriScheme::Semantic),
            "rdf" => Ok(UriScheme::Rdf),
            other => Err(DriftlockError::NotFound(format!(
                "Unknown drift:// scheme '{}'",
                other
            ))),
        }
    }
}

/// Parsed address of a stored patch.
///
/// Derived deterministically from patch content; one content ID is never
/// reused for different bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftUri {
    pub scheme: UriScheme,
    pub subtype: Option<String>,
    pub content_id: String,
}

impl DriftUri {
    pub fn new(scheme: UriScheme, subtype: Option<String>, content_id: String) -> Self {
        Self {
            scheme,
            subtype,
            content_id,
        }
    }

    /// Parse a `drift://` URI string.
    ///
    /// Unknown schemes and malformed content IDs are `NotFound`: such a
    /// URI can never resolve to a stored patch.
    pub fn parse(input: &str) -> Result<Self, DriftlockError> {
        let rest = input.strip_prefix("drift://").ok_or_else(|| {
            DriftlockError::NotFound(format!("'{}' is not a drift:// URI", input))
        })?;
        let parts: Vec<&str> = rest.split('/').collect();
        let (scheme_str, subtype, id) = match parts.as_slice() {
            [scheme, id] => (*scheme, None, *id),
            [scheme, subtype, id] => (*scheme, Some(subtype.to_string()), *id),
            _ => {
                return Err(DriftlockError::NotFound(format!(
                    "Malformed drift:// URI '{}'",
                    input
                )));
            }
        };
        let scheme = UriScheme::from_str(scheme_str)?;
        if !is_hex_digest(id) {
            return Err(DriftlockError::NotFound(format!(
                "Content ID in '{}' is not a SHA-256 digest",
                input
            )));
        }
        Ok(DriftUri::new(scheme, subtype, id.to_string()))
    }
}

impl fmt::Display for DriftUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subtype {
            Some(subtype) => write!(
                f,
                "drift://{}/{}/{}",
                self.scheme.as_str(),
                subtype,
                self.content_id
            ),
            None => write!(f, "drift://{}/{}", self.scheme.as_str(), self.content_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest() -> String {
        "ab".repeat(32)
    }

    #[test]
    fn parse_two_segment_uri() {
        let uri = DriftUri::parse(&format!("drift://hash/{}", digest())).unwrap();
        assert_eq!(uri.scheme, UriScheme::Hash);
        assert!(uri.subtype.is_none());
        assert_eq!(uri.content_id, digest());
    }

    #[test]
    fn parse_three_segment_uri() {
        let uri = DriftUri::parse(&format!("drift://semantic/structural/{}", digest())).unwrap();
        assert_eq!(uri.scheme, UriScheme::Semantic);
        assert_eq!(uri.subtype.as_deref(), Some("structural"));
    }

    #[test]
    fn display_round_trips() {
        for input in [
            format!("drift://hash/{}", digest()),
            format!("drift://rdf/turtle/{}", digest()),
        ] {
            let uri = DriftUri::parse(&input).unwrap();
            assert_eq!(uri.to_string(), input);
        }
    }

    #[test]
    fn unknown_scheme_is_not_found() {
        let err = DriftUri::parse(&format!("drift://bogus/{}", digest())).unwrap_err();
        assert!(matches!(err, DriftlockError::NotFound(_)));
    }

    #[test]
    fn malformed_inputs_are_not_found() {
        for input in [
            "http://hash/ab12",
            "drift://hash",
            "drift://hash/not-a-digest",
            &format!("drift://hash/a/b/{}", digest()),
        ] {
            assert!(
                matches!(DriftUri::parse(input), Err(DriftlockError::NotFound(_))),
                "{} should not parse",
                input
            );
        }
    }
}
