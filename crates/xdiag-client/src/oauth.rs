//! OAuth 1.0a request signing
//!
//! User-context endpoints such as `/2/users/me` need an HMAC-SHA1 signature
//! over the method, URL and every query parameter.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::RngCore;
use sha1::Sha1;
use xdiag_core::OAuthCredentials;

use crate::error::{XApiError, XApiResult};

/// Everything except RFC 3986 unreserved characters.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode per RFC 3986, as OAuth 1.0a requires.
pub(crate) fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Signs requests with borrowed user-context credentials.
pub struct OAuthSigner<'a> {
    credentials: &'a OAuthCredentials,
}

impl<'a> OAuthSigner<'a> {
    /// Signer for one set of credentials.
    #[must_use]
    pub fn new(credentials: &'a OAuthCredentials) -> Self {
        Self { credentials }
    }

    /// `Authorization` header value for a request, with a fresh nonce and timestamp.
    ///
    /// `url` must not carry a query string; pass query parameters in `params`.
    pub fn sign(&self, method: &str, url: &str, params: &[(String, String)]) -> XApiResult<String> {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| XApiError::OAuth(format!("Failed to get timestamp: {e}")))?
            .as_secs();

        self.sign_with(method, url, params, &generate_nonce(), timestamp)
    }

    /// `Authorization` header value for a fixed nonce and timestamp.
    pub fn sign_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        nonce: &str,
        timestamp: u64,
    ) -> XApiResult<String> {
        let mut oauth_params = vec![
            (
                "oauth_consumer_key".to_string(),
                self.credentials.app_key.expose().to_string(),
            ),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            (
                "oauth_token".to_string(),
                self.credentials.access_token.expose().to_string(),
            ),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];

        let mut all_params = oauth_params.clone();
        all_params.extend(params.iter().cloned());
        let base_string = signature_base_string(method, url, &all_params);

        let signing_key = format!(
            "{}&{}",
            percent_encode(self.credentials.app_secret.expose()),
            percent_encode(self.credentials.access_secret.expose())
        );
        let signature = hmac_sha1(&signing_key, &base_string)?;
        oauth_params.push(("oauth_signature".to_string(), signature));

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {header}"))
    }
}

/// `METHOD&url&params`, with parameters encoded then sorted.
pub(crate) fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(String, String)],
) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    )
}

fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hmac_sha1(key: &str, data: &str) -> XApiResult<String> {
    type HmacSha1 = Hmac<Sha1>;

    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).map_err(|e| XApiError::OAuth(e.to_string()))?;
    mac.update(data.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use xdiag_core::SecretToken;

    fn credentials() -> OAuthCredentials {
        OAuthCredentials {
            app_key: SecretToken::new("consumer"),
            app_secret: SecretToken::new("consumer-secret"),
            access_token: SecretToken::new("token"),
            access_secret: SecretToken::new("token-secret"),
        }
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("a=b&c"), "a%3Db%26c");
        assert_eq!(percent_encode("safe-_.~"), "safe-_.~");
        assert_eq!(percent_encode("\"ai crypto\""), "%22ai%20crypto%22");
    }

    #[test]
    fn test_base_string_sorts_parameters() {
        let params = vec![
            ("max_results".to_string(), "10".to_string()),
            ("expansions".to_string(), "author_id".to_string()),
        ];
        let base = signature_base_string("get", "https://api.twitter.com/2/users/me", &params);

        assert_eq!(
            base,
            "GET&https%3A%2F%2Fapi.twitter.com%2F2%2Fusers%2Fme&expansions%3Dauthor_id%26max_results%3D10"
        );
    }

    #[test]
    fn test_nonce_is_random_hex() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_header_is_deterministic_for_fixed_inputs() {
        let creds = credentials();
        let signer = OAuthSigner::new(&creds);
        let url = "https://api.twitter.com/2/users/me";

        let first = signer.sign_with("GET", url, &[], "abc", 1_700_000_000).unwrap();
        let second = signer.sign_with("GET", url, &[], "abc", 1_700_000_000).unwrap();
        let other = signer
            .sign_with("GET", url, &[("a".into(), "b".into())], "abc", 1_700_000_000)
            .unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert!(first.starts_with("OAuth "));
        assert!(first.contains("oauth_consumer_key=\"consumer\""));
        assert!(first.contains("oauth_token=\"token\""));
        assert!(first.contains("oauth_timestamp=\"1700000000\""));
        assert!(first.contains("oauth_signature=\""));
        assert!(!first.contains("consumer-secret"));
        assert!(!first.contains("token-secret"));
    }
}
