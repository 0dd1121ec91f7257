//! Cache keys derived from validated request parameters.

use std::str::FromStr;

use stockfeed_types::{DataKind, FeedError, FetchParams, Result};

/// Deterministic cache key for one data kind and one set of parameters.
///
/// Parameters are hashed in their validated form, so inputs that validate to
/// the same parameters (a date string and the equivalent date value, a
/// lower-case and an upper-case symbol) share a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Computes the fingerprint of validated parameters.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Json`] if the parameters cannot be serialized.
    pub fn of<P: FetchParams>(params: &P) -> Result<Self> {
        let canonical = serde_json::to_vec(params)?;
        Ok(Self::from_parts(P::KIND, &canonical))
    }

    /// Computes the fingerprint of a kind and a canonical parameter encoding.
    #[must_use]
    pub fn from_parts(kind: DataKind, canonical: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update(&[0]);
        hasher.update(canonical);
        Self(*hasher.finalize().as_bytes())
    }

    /// Returns the raw hash bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the fingerprint as lower-case hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        blake3::Hash::from_bytes(self.0).to_hex().to_string()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        blake3::Hash::from_hex(s)
            .map(|hash| Self(*hash.as_bytes()))
            .map_err(|e| FeedError::Cache(format!("invalid fingerprint '{s}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stockfeed_types::{EventKind, EventParams, MarketParams, RequestParams, Resolution};

    #[test]
    fn test_equivalent_inputs_share_fingerprint() {
        let from_strings =
            RequestParams::validate("vnm", "2022-01-01", "2022-03-31", "1D").unwrap();
        let from_values = RequestParams::validate(
            "VNM",
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2022, 3, 31).unwrap(),
            Resolution::Day1,
        )
        .unwrap();

        assert_eq!(
            Fingerprint::of(&from_strings).unwrap(),
            Fingerprint::of(&from_values).unwrap()
        );
    }

    #[test]
    fn test_different_params_differ() {
        let daily = RequestParams::validate("VNM", "2022-01-01", "2022-03-31", "1D").unwrap();
        let weekly = RequestParams::validate("VNM", "2022-01-01", "2022-03-31", "1W").unwrap();
        assert_ne!(
            Fingerprint::of(&daily).unwrap(),
            Fingerprint::of(&weekly).unwrap()
        );
    }

    #[test]
    fn test_symbol_order_does_not_matter() {
        let a = MarketParams::validate(["FPT", "VNM", "HPG"]).unwrap();
        let b = MarketParams::validate(["hpg", "fpt", "vnm", "FPT"]).unwrap();
        assert_eq!(Fingerprint::of(&a).unwrap(), Fingerprint::of(&b).unwrap());
    }

    #[test]
    fn test_kind_is_part_of_the_key() {
        let canonical = br#"{"symbol":"VNM"}"#;
        assert_ne!(
            Fingerprint::from_parts(DataKind::CompanyProfile, canonical),
            Fingerprint::from_parts(DataKind::MarketData, canonical)
        );
    }

    #[test]
    fn test_default_limit_matches_explicit_limit() {
        let implicit = EventParams::validate("VNM", EventKind::InsiderTrades, None).unwrap();
        let explicit = EventParams::validate("VNM", EventKind::InsiderTrades, Some(30)).unwrap();
        assert_eq!(
            Fingerprint::of(&implicit).unwrap(),
            Fingerprint::of(&explicit).unwrap()
        );
    }

    #[test]
    fn test_hex_round_trip() {
        let fp = Fingerprint::from_parts(DataKind::PriceHistory, b"x");
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hex.parse::<Fingerprint>().unwrap(), fp);
        assert!("not-hex".parse::<Fingerprint>().is_err());
    }
}
