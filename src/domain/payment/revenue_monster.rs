//! Revenue Monster webhook verification.
//!
//! Revenue Monster signs notifications with its RSA private key
//! (PKCS#1 v1.5, SHA-256). The signed string is
//!
//! ```text
//! data=<base64(compact JSON, keys sorted)>&method=post&nonceStr=<X-Nonce-Str>
//!     &requestUrl=<notify url>&signType=sha256&timestamp=<X-Timestamp>
//! ```
//!
//! and the signature arrives base64-encoded in `X-Signature` as
//! `sha256 <signature>`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ring::signature::{UnparsedPublicKey, RSA_PKCS1_2048_8192_SHA256};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use x509_parser::der_parser::ber::BerObjectContent;
use x509_parser::der_parser::der::parse_der;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::FromDer;
use x509_parser::public_key::PublicKey;
use x509_parser::x509::SubjectPublicKeyInfo;

use crate::domain::foundation::ValidationError;

use super::{Gateway, GatewayUpdate, PaymentStatus, WebhookError};

/// Raw values of the three signature headers.
#[derive(Debug, Clone, Copy)]
pub struct RevenueMonsterHeaders<'a> {
    pub signature: &'a str,
    pub nonce_str: &'a str,
    pub timestamp: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueMonsterNotification {
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    pub data: RevenueMonsterTransaction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueMonsterTransaction {
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub status: String,
    pub order: RevenueMonsterOrder,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevenueMonsterOrder {
    pub id: String,
    #[serde(default)]
    pub amount: Option<i64>,
}

impl RevenueMonsterNotification {
    /// Maps the transaction status onto the local vocabulary.
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        match self.data.status.as_str() {
            "SUCCESS" => Some(PaymentStatus::Succeeded),
            "FAILED" => Some(PaymentStatus::Failed),
            "IN_PROCESS" => Some(PaymentStatus::Processing),
            "FULL_REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }

    pub fn to_update(&self) -> GatewayUpdate {
        let event_id = self
            .data
            .transaction_id
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.data.order.id, self.data.status));
        match self.payment_status() {
            Some(status) => GatewayUpdate::Payment {
                gateway: Gateway::RevenueMonster,
                event_id,
                reference: self.data.order.id.clone(),
                status,
            },
            None => GatewayUpdate::Unmapped {
                gateway: Gateway::RevenueMonster,
                event_id,
                event_type: self
                    .event_type
                    .clone()
                    .unwrap_or_else(|| "notification".to_string()),
                raw_status: Some(self.data.status.clone()),
            },
        }
    }
}

/// Builds the string Revenue Monster signs.
pub fn signing_string(body: &JsonValue, nonce_str: &str, request_url: &str, timestamp: &str) -> String {
    // serde_json maps are ordered, so `to_string` yields sorted compact JSON.
    let data = BASE64.encode(body.to_string());
    format!(
        "data={}&method=post&nonceStr={}&requestUrl={}&signType=sha256&timestamp={}",
        data, nonce_str, request_url, timestamp
    )
}

pub struct RevenueMonsterVerifier {
    /// DER-encoded PKCS#1 `RSAPublicKey`.
    public_key: Vec<u8>,
    notify_url: String,
}

impl RevenueMonsterVerifier {
    /// Accepts a PEM (`PUBLIC KEY` or `RSA PUBLIC KEY`) or bare base64 DER.
    /// Keys that are not RSA are refused here rather than at the first
    /// delivery.
    pub fn from_pem(pem: &str, notify_url: impl Into<String>) -> Result<Self, ValidationError> {
        let invalid =
            |reason: &str| ValidationError::invalid_format("revenue_monster_public_key", reason);
        let der = if pem.trim_start().starts_with("-----BEGIN") {
            let (_, block) =
                parse_x509_pem(pem.as_bytes()).map_err(|_| invalid("not a valid PEM block"))?;
            block.contents
        } else {
            BASE64
                .decode(pem.trim())
                .map_err(|_| invalid("not valid base64"))?
        };
        let public_key = rsa_public_key(&der).ok_or_else(|| invalid("not an RSA public key"))?;
        Ok(Self {
            public_key,
            notify_url: notify_url.into(),
        })
    }

    pub fn verify_and_parse(
        &self,
        body: &[u8],
        headers: RevenueMonsterHeaders<'_>,
    ) -> Result<RevenueMonsterNotification, WebhookError> {
        if headers.timestamp.parse::<i64>().is_err() {
            return Err(WebhookError::InvalidTimestamp);
        }
        let (scheme, encoded) = headers
            .signature
            .trim()
            .split_once(' ')
            .ok_or(WebhookError::InvalidSignature)?;
        if !scheme.eq_ignore_ascii_case("sha256") {
            return Err(WebhookError::InvalidSignature);
        }
        let signature = BASE64
            .decode(encoded.trim())
            .map_err(|_| WebhookError::InvalidSignature)?;

        let value: JsonValue =
            serde_json::from_slice(body).map_err(|e| WebhookError::ParseError(e.to_string()))?;
        let message = signing_string(&value, headers.nonce_str, &self.notify_url, headers.timestamp);

        UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, &self.public_key)
            .verify(message.as_bytes(), &signature)
            .map_err(|_| WebhookError::InvalidSignature)?;

        serde_json::from_value(value).map_err(|e| WebhookError::ParseError(e.to_string()))
    }
}

/// Signs a notification body the way Revenue Monster does, returning the
/// `X-Signature` value. Used to build test deliveries.
#[cfg(any(test, feature = "test-util"))]
pub fn sign_revenue_monster_payload(
    pkcs8: &[u8],
    body: &JsonValue,
    nonce_str: &str,
    request_url: &str,
    timestamp: &str,
) -> Option<String> {
    use ring::rand::SystemRandom;
    use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};

    let key_pair = RsaKeyPair::from_pkcs8(pkcs8).ok()?;
    let message = signing_string(body, nonce_str, request_url, timestamp);
    let mut signature = vec![0; key_pair.public().modulus_len()];
    key_pair
        .sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), message.as_bytes(), &mut signature)
        .ok()?;
    Some(format!("sha256 {}", BASE64.encode(signature)))
}

/// PKCS#1 key bytes from an X.509 SubjectPublicKeyInfo, or from a bare
/// PKCS#1 `RSAPublicKey`.
fn rsa_public_key(der: &[u8]) -> Option<Vec<u8>> {
    if let Ok((_, spki)) = SubjectPublicKeyInfo::from_der(der) {
        return match spki.parsed() {
            Ok(PublicKey::RSA(_)) => Some(spki.subject_public_key.data.to_vec()),
            _ => None,
        };
    }
    // RSAPublicKey ::= SEQUENCE { modulus INTEGER, publicExponent INTEGER }
    let (rest, object) = parse_der(der).ok()?;
    let fields = object.as_sequence().ok()?;
    let is_pkcs1 = rest.is_empty()
        && fields.len() == 2
        && fields
            .iter()
            .all(|field| matches!(field.content, BerObjectContent::Integer(_)));
    is_pkcs1.then(|| der.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PUBLIC_PEM: &str = include_str!("../../../tests/fixtures/revenue_monster_public.pem");
    const PRIVATE_PKCS8_B64: &str =
        include_str!("../../../tests/fixtures/revenue_monster_private.pk8.b64");
    const NOTIFY_URL: &str = "https://api.example.com/webhooks/revenue-monster";

    fn private_key() -> Vec<u8> {
        BASE64.decode(PRIVATE_PKCS8_B64.trim()).unwrap()
    }

    fn notification(status: &str) -> JsonValue {
        json!({
            "eventType": "PAYMENT_WEB_ONLINE",
            "code": "SUCCESS",
            "data": {
                "transactionId": "210101000000000000001",
                "status": status,
                "order": { "id": "ORD-1001", "amount": 10000 }
            }
        })
    }

    fn signed(body: &JsonValue) -> String {
        sign_revenue_monster_payload(&private_key(), body, "nonce-abc", NOTIFY_URL, "1704067200")
            .unwrap()
    }

    fn headers(signature: &str) -> RevenueMonsterHeaders<'_> {
        RevenueMonsterHeaders {
            signature,
            nonce_str: "nonce-abc",
            timestamp: "1704067200",
        }
    }

    #[test]
    fn signing_string_sorts_keys() {
        let a = json!({"b": 1, "a": {"d": 2, "c": 3}});
        let s = signing_string(&a, "n", "https://x", "1");
        let expected = BASE64.encode(r#"{"a":{"c":3,"d":2},"b":1}"#);
        assert_eq!(
            s,
            format!(
                "data={}&method=post&nonceStr=n&requestUrl=https://x&signType=sha256&timestamp=1",
                expected
            )
        );
    }

    #[test]
    fn verifies_genuine_notification() {
        let verifier = RevenueMonsterVerifier::from_pem(PUBLIC_PEM, NOTIFY_URL).unwrap();
        let body = notification("SUCCESS");
        let signature = signed(&body);

        let parsed = verifier
            .verify_and_parse(body.to_string().as_bytes(), headers(&signature))
            .unwrap();

        assert_eq!(parsed.data.order.id, "ORD-1001");
        assert_eq!(parsed.payment_status(), Some(PaymentStatus::Succeeded));
    }

    #[test]
    fn key_order_of_delivered_body_does_not_matter() {
        let verifier = RevenueMonsterVerifier::from_pem(PUBLIC_PEM, NOTIFY_URL).unwrap();
        let body = notification("SUCCESS");
        let signature = signed(&body);
        let reordered = r#"{"data":{"order":{"amount":10000,"id":"ORD-1001"},"status":"SUCCESS","transactionId":"210101000000000000001"},"code":"SUCCESS","eventType":"PAYMENT_WEB_ONLINE"}"#;

        assert!(verifier
            .verify_and_parse(reordered.as_bytes(), headers(&signature))
            .is_ok());
    }

    #[test]
    fn tampered_status_fails() {
        let verifier = RevenueMonsterVerifier::from_pem(PUBLIC_PEM, NOTIFY_URL).unwrap();
        let signature = signed(&notification("FAILED"));
        let tampered = notification("SUCCESS").to_string();

        assert!(matches!(
            verifier.verify_and_parse(tampered.as_bytes(), headers(&signature)),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn different_notify_url_fails() {
        let verifier =
            RevenueMonsterVerifier::from_pem(PUBLIC_PEM, "https://evil.example.com/hook").unwrap();
        let body = notification("SUCCESS");
        let signature = signed(&body);
        assert!(verifier
            .verify_and_parse(body.to_string().as_bytes(), headers(&signature))
            .is_err());
    }

    #[test]
    fn malformed_signature_header_fails() {
        let verifier = RevenueMonsterVerifier::from_pem(PUBLIC_PEM, NOTIFY_URL).unwrap();
        let body = notification("SUCCESS").to_string();
        for signature in ["", "sha256", "md5 abcd", "sha256 !!!"] {
            assert!(matches!(
                verifier.verify_and_parse(body.as_bytes(), headers(signature)),
                Err(WebhookError::InvalidSignature)
            ));
        }
    }

    #[test]
    fn accepts_pkcs1_key_encoding() {
        let spki = RevenueMonsterVerifier::from_pem(PUBLIC_PEM, NOTIFY_URL).unwrap();
        let pkcs1_pem = format!(
            "-----BEGIN RSA PUBLIC KEY-----\n{}\n-----END RSA PUBLIC KEY-----",
            BASE64.encode(&spki.public_key)
        );
        let pkcs1 = RevenueMonsterVerifier::from_pem(&pkcs1_pem, NOTIFY_URL).unwrap();
        assert_eq!(pkcs1.public_key, spki.public_key);
    }

    #[test]
    fn rejects_garbage_key() {
        assert!(RevenueMonsterVerifier::from_pem("not a key", NOTIFY_URL).is_err());
        assert!(RevenueMonsterVerifier::from_pem(&BASE64.encode([0x02, 0x01, 0x00]), NOTIFY_URL).is_err());
    }

    #[test]
    fn rejects_non_rsa_key() {
        let ec_pem = "-----BEGIN PUBLIC KEY-----
MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEpoRMgVn+3A5frZviN7JhtnHnXbYa
5mHehgwsjbgHkr0ILq8RTkAsjBzlVN5x0UzlNypNFnZJW1310VgN5G2lxw==
-----END PUBLIC KEY-----
";
        assert!(matches!(
            RevenueMonsterVerifier::from_pem(ec_pem, NOTIFY_URL),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn accepts_bare_base64_spki() {
        let body: String = PUBLIC_PEM
            .lines()
            .filter(|line| !line.starts_with("-----"))
            .collect();
        let bare = RevenueMonsterVerifier::from_pem(&body, NOTIFY_URL).unwrap();
        let pem = RevenueMonsterVerifier::from_pem(PUBLIC_PEM, NOTIFY_URL).unwrap();
        assert_eq!(bare.public_key, pem.public_key);
    }

    #[test]
    fn status_vocabulary() {
        let parse = |status: &str| -> RevenueMonsterNotification {
            serde_json::from_value(notification(status)).unwrap()
        };
        assert_eq!(parse("IN_PROCESS").payment_status(), Some(PaymentStatus::Processing));
        assert_eq!(parse("FULL_REFUNDED").payment_status(), Some(PaymentStatus::Refunded));
        assert_eq!(parse("FAILED").payment_status(), Some(PaymentStatus::Failed));
        assert!(matches!(
            parse("PARTIAL_REFUNDED").to_update(),
            GatewayUpdate::Unmapped { .. }
        ));
    }
}
