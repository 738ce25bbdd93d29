//! Payment link and claim link URLs
//!
//! ## Link formats
//!
//! ```text
//! <origin>/private-payments/pay?amount=0.1&id=<base58 16 bytes>[&o=<offset>]
//! <origin>/private-payments/claim?s=<base58 32 bytes>
//! ```
//!
//! A payment link never contains a secret. The payer's app generates one at
//! deposit time and the payer relays it to the recipient out of band, possibly
//! as a claim link.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;
use url::form_urlencoded;

use crate::secret::generate_link_id;
use crate::{Error, LinkSecret, Result, CLAIM_PATH, PAY_PATH};

const AMOUNT_PARAM: &str = "amount";
const LINK_ID_PARAM: &str = "id";
const OFFSET_PARAM: &str = "o";
const SECRET_PARAM: &str = "s";

/// Public content of a payment request link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLinkPayload {
    /// Amount in SOL requested by the recipient, kept verbatim
    pub requested_amount: String,
    /// Unique link id for tracking
    pub link_id: String,
    /// Suggested start offset for scanning pool notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl PaymentLinkPayload {
    /// Create a payload for `requested_amount` with a freshly generated link id
    pub fn new(requested_amount: impl Into<String>) -> Self {
        Self {
            requested_amount: requested_amount.into(),
            link_id: generate_link_id(),
            offset: None,
        }
    }

    /// Attach a scan offset hint
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Generate the shareable URL under `origin`
    pub fn to_url(&self, origin: &str) -> String {
        build_payment_link_url(origin, self)
    }
}

impl FromStr for PaymentLinkPayload {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_payment_link(s)
    }
}

/// Build the shareable payment link URL.
///
/// `requested_amount` is passed through without normalization.
pub fn build_payment_link_url(origin: &str, payload: &PaymentLinkPayload) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair(AMOUNT_PARAM, &payload.requested_amount);
    query.append_pair(LINK_ID_PARAM, &payload.link_id);
    if let Some(offset) = payload.offset {
        query.append_pair(OFFSET_PARAM, &offset.to_string());
    }

    format!("{}{}?{}", trim_origin(origin), PAY_PATH, query.finish())
}

/// Parse a payment link URL.
///
/// `amount` and `id` must be present and non-empty. `o` is only a scan hint:
/// an absent, blank or non-integer value yields `offset: None`, which is
/// distinct from an explicit `o=0`.
pub fn parse_payment_link(url_str: &str) -> Result<PaymentLinkPayload> {
    let url = url::Url::parse(url_str.trim())?;

    let mut amount: Option<String> = None;
    let mut link_id: Option<String> = None;
    let mut offset: Option<String> = None;

    for (name, value) in url.query_pairs() {
        match name.as_ref() {
            AMOUNT_PARAM if amount.is_none() => amount = Some(value.into_owned()),
            LINK_ID_PARAM if link_id.is_none() => link_id = Some(value.into_owned()),
            OFFSET_PARAM if offset.is_none() => offset = Some(value.into_owned()),
            _ => {
                // Ignore unknown and repeated parameters
            }
        }
    }

    let requested_amount = amount
        .filter(|a| !a.is_empty())
        .ok_or(Error::MissingParameter(AMOUNT_PARAM))?;
    let link_id = link_id
        .filter(|id| !id.is_empty())
        .ok_or(Error::MissingParameter(LINK_ID_PARAM))?;

    let offset = match offset.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<u64>() {
            Ok(offset) => Some(offset),
            Err(_) => {
                warn!(offset = raw, %link_id, "ignoring malformed scan offset");
                None
            }
        },
    };

    Ok(PaymentLinkPayload {
        requested_amount,
        link_id,
        offset,
    })
}

/// Build a claim URL carrying the secret in its query
pub fn build_claim_url(origin: &str, secret: &LinkSecret) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair(SECRET_PARAM, &secret.to_base58());
    format!("{}{}?{}", trim_origin(origin), CLAIM_PATH, query.finish())
}

/// Extract and decode the secret carried by a claim URL
pub fn secret_from_claim_url(url_str: &str) -> Result<LinkSecret> {
    let url = url::Url::parse(url_str.trim())?;
    let encoded = url
        .query_pairs()
        .find(|(name, _)| name == SECRET_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .ok_or(Error::MissingParameter(SECRET_PARAM))?;

    LinkSecret::from_base58(&encoded)
}

fn trim_origin(origin: &str) -> &str {
    origin.trim().trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ORIGIN: &str = "https://app.example.com";

    #[test]
    fn test_link_builder() {
        let payload = PaymentLinkPayload {
            requested_amount: "0.25".to_string(),
            link_id: "3yZe7d".to_string(),
            offset: None,
        };

        let url = build_payment_link_url(ORIGIN, &payload);
        assert_eq!(
            url,
            "https://app.example.com/private-payments/pay?amount=0.25&id=3yZe7d"
        );
    }

    #[test]
    fn test_link_with_offset() {
        let payload = PaymentLinkPayload::new("1.5").with_offset(42);
        let url = payload.to_url("https://app.example.com/");
        assert!(url.starts_with("https://app.example.com/private-payments/pay?"));
        assert!(url.ends_with("&o=42"));

        let parsed = parse_payment_link(&url).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_amount_is_passed_verbatim() {
        let payload = PaymentLinkPayload {
            requested_amount: "1,5 SOL".to_string(),
            link_id: "abc".to_string(),
            offset: None,
        };
        let parsed: PaymentLinkPayload = payload.to_url(ORIGIN).parse().unwrap();
        assert_eq!(parsed.requested_amount, "1,5 SOL");
    }

    #[test]
    fn test_missing_fields() {
        let err = parse_payment_link("https://app.example.com/private-payments/pay?id=abc")
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter("amount")));

        let err = parse_payment_link("https://app.example.com/private-payments/pay?amount=0.1")
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter("id")));

        let err =
            parse_payment_link("https://app.example.com/private-payments/pay?amount=&id=abc")
                .unwrap_err();
        assert!(matches!(err, Error::MissingParameter("amount")));
    }

    #[test]
    fn test_offset_absent_vs_zero() {
        let base = "https://app.example.com/private-payments/pay?amount=1&id=abc";
        assert_eq!(parse_payment_link(base).unwrap().offset, None);
        assert_eq!(
            parse_payment_link(&format!("{base}&o=")).unwrap().offset,
            None
        );
        assert_eq!(
            parse_payment_link(&format!("{base}&o=0")).unwrap().offset,
            Some(0)
        );
        assert_eq!(
            parse_payment_link(&format!("{base}&o=%20")).unwrap().offset,
            None
        );
    }

    #[test]
    fn test_malformed_offset_keeps_link_usable() {
        let base = "https://app.example.com/private-payments/pay?amount=0.1&id=abc";
        for o in ["soon", "1.5", "-3"] {
            let payload = parse_payment_link(&format!("{base}&o={o}")).unwrap();
            assert_eq!(payload.requested_amount, "0.1");
            assert_eq!(payload.link_id, "abc");
            assert_eq!(payload.offset, None, "o={o}");
        }
    }

    #[test]
    fn test_not_a_url() {
        assert!(matches!(
            parse_payment_link("amount=1&id=abc"),
            Err(Error::UrlParse(_))
        ));
    }

    #[test]
    fn test_claim_url_roundtrip() {
        let secret = LinkSecret::from_bytes([42u8; 32]);
        let url = build_claim_url(ORIGIN, &secret);
        assert_eq!(
            url,
            format!(
                "https://app.example.com/private-payments/claim?s={}",
                secret.to_base58()
            )
        );
        assert_eq!(secret_from_claim_url(&url).unwrap(), secret);
    }

    #[test]
    fn test_claim_url_errors() {
        assert!(matches!(
            secret_from_claim_url("https://app.example.com/private-payments/claim"),
            Err(Error::MissingParameter("s"))
        ));
        assert!(matches!(
            secret_from_claim_url("https://app.example.com/private-payments/claim?s=0OIl"),
            Err(Error::InvalidSecret(_))
        ));
    }

    proptest! {
        #[test]
        fn payment_link_roundtrip(
            amount in "[0-9]{1,6}(\\.[0-9]{1,9})?",
            id_bytes in any::<[u8; 16]>(),
            offset in proptest::option::of(any::<u64>()),
        ) {
            let payload = PaymentLinkPayload {
                requested_amount: amount,
                link_id: bs58::encode(id_bytes).into_string(),
                offset,
            };
            let parsed = parse_payment_link(&build_payment_link_url(ORIGIN, &payload)).unwrap();
            prop_assert_eq!(parsed, payload);
        }
    }
}
