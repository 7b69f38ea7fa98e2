use crate::error::SignError;
use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Service-SAS parameters. The string-to-sign layout follows this version.
const SAS_VERSION: &str = "2021-06-08";
/// Every locator is signed as a blob resource.
const SAS_RESOURCE: &str = "b";
const SAS_PROTOCOL: &str = "https";

/// Inputs for one signing call.
///
/// `start` and `expiry` are supplied by the pipeline, which captures a
/// single timestamp for the whole run.
pub struct SasRequest<'a> {
    pub account: &'a str,
    pub key: &'a str,
    pub container: &'a str,
    pub blob: &'a str,
    pub permissions: &'a str,
    pub start: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

/// The signing collaborator.
///
/// Returns the SAS token as a query string without the leading `?`; the
/// pipeline splices it into the reconstructed URL.
pub trait SasSigner: Send + Sync {
    fn sign(&self, request: &SasRequest) -> Result<String>;
}

/// Signs blob URIs with an Azure service SAS.
///
/// String-to-sign construction per the Create Service SAS reference:
/// https://learn.microsoft.com/en-us/rest/api/storageservices/create-service-sas
pub struct ServiceSasSigner;

impl ServiceSasSigner {
    fn signature(&self, request: &SasRequest, key: &[u8]) -> Result<String> {
        // Version 2020-12-06 and later: sixteen fields, unused ones empty.
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}\n\n\n{}\n{}\n{}\n\n\n\n\n\n\n",
            request.permissions,
            format_time(request.start),
            format_time(request.expiry),
            canonicalized_resource(request),
            SAS_PROTOCOL,
            SAS_VERSION,
            SAS_RESOURCE,
        );

        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|err| SignError::Signing(err.to_string()))?;
        mac.update(string_to_sign.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

impl SasSigner for ServiceSasSigner {
    fn sign(&self, request: &SasRequest) -> Result<String> {
        let key = BASE64.decode(request.key.trim()).map_err(|err| {
            SignError::Signing(format!("account key is not valid base64: {}", err))
        })?;

        let start = format_time(request.start);
        let expiry = format_time(request.expiry);
        let signature = self.signature(request, &key)?;

        let elements = [
            ("sv", SAS_VERSION),
            ("spr", SAS_PROTOCOL),
            ("st", start.as_str()),
            ("se", expiry.as_str()),
            ("sr", SAS_RESOURCE),
            ("sp", request.permissions),
            ("sig", signature.as_str()),
        ];

        Ok(elements
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoded(v)))
            .collect::<Vec<String>>()
            .join("&"))
    }
}

fn canonicalized_resource(request: &SasRequest) -> String {
    format!(
        "/blob/{}/{}/{}",
        request.account, request.container, request.blob
    )
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn urlencoded(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Recording signer for pipeline tests.
#[allow(dead_code)]
pub struct MockSasSigner {
    calls: std::sync::Mutex<Vec<SignedCall>>,
    fail_blobs: std::sync::Mutex<Vec<String>>,
}

/// One recorded signing call.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCall {
    pub account: String,
    pub key: String,
    pub container: String,
    pub blob: String,
    pub permissions: String,
    pub start: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

#[allow(dead_code)]
impl MockSasSigner {
    pub fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            fail_blobs: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Make signing fail for a specific blob name.
    pub fn fail_for(&self, blob: &str) {
        self.fail_blobs.lock().unwrap().push(blob.to_string());
    }

    pub fn calls(&self) -> Vec<SignedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockSasSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl SasSigner for MockSasSigner {
    fn sign(&self, request: &SasRequest) -> Result<String> {
        if self
            .fail_blobs
            .lock()
            .unwrap()
            .iter()
            .any(|blob| blob == request.blob)
        {
            return Err(SignError::Signing(format!(
                "mock failure for blob '{}'",
                request.blob
            ))
            .into());
        }

        let mut calls = self.calls.lock().unwrap();
        calls.push(SignedCall {
            account: request.account.to_string(),
            key: request.key.to_string(),
            container: request.container.to_string(),
            blob: request.blob.to_string(),
            permissions: request.permissions.to_string(),
            start: request.start,
            expiry: request.expiry,
        });
        Ok(format!("sv=TEST&sp={}&sig=mock{}", request.permissions, calls.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request<'a>(key: &'a str) -> SasRequest<'a> {
        let start = Utc.with_ymd_and_hms(2022, 3, 1, 8, 12, 34).unwrap();
        SasRequest {
            account: "account",
            key,
            container: "container",
            blob: "blob/path",
            permissions: "r",
            start,
            expiry: start + chrono::Duration::hours(1),
        }
    }

    fn well_formed_key() -> String {
        BASE64.encode([42u8; 64])
    }

    #[test]
    fn test_token_shape() {
        let key = well_formed_key();
        let token = ServiceSasSigner.sign(&request(&key)).unwrap();

        assert!(token.starts_with("sv=2021-06-08&spr=https&st="));
        assert!(token.contains("&sr=b&"));
        assert!(token.contains("&sp=r&"));
        assert!(token.contains("&sig="));
        // Timestamps are url-encoded: colons become %3A
        assert!(token.contains("st=2022-03-01T08%3A12%3A34Z"));
        assert!(token.contains("se=2022-03-01T09%3A12%3A34Z"));
        assert!(!token.starts_with('?'));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let key = well_formed_key();
        let a = ServiceSasSigner.sign(&request(&key)).unwrap();
        let b = ServiceSasSigner.sign(&request(&key)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_keys_give_different_signatures() {
        let key_a = BASE64.encode([1u8; 64]);
        let key_b = BASE64.encode([2u8; 64]);
        let a = ServiceSasSigner.sign(&request(&key_a)).unwrap();
        let b = ServiceSasSigner.sign(&request(&key_b)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_non_base64_key() {
        let err = ServiceSasSigner.sign(&request("*** bad ***")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SignError>(),
            Some(SignError::Signing(_))
        ));
    }

    #[test]
    fn test_canonicalized_resource_includes_blob_path() {
        let key = well_formed_key();
        let req = request(&key);
        assert_eq!(
            canonicalized_resource(&req),
            "/blob/account/container/blob/path"
        );
    }

    #[test]
    fn test_mock_records_calls_and_injects_failures() {
        let signer = MockSasSigner::new();
        signer.fail_for("bad.bin");

        let key = well_formed_key();
        let mut req = request(&key);
        req.blob = "bad.bin";
        assert!(signer.sign(&req).is_err());

        req.blob = "good.bin";
        let token = signer.sign(&req).unwrap();
        assert_eq!(token, "sv=TEST&sp=r&sig=mock1");
        assert_eq!(signer.calls().len(), 1);
        assert_eq!(signer.calls()[0].blob, "good.bin");
    }
}
