use chrono::Utc;
use md5::{Digest, Md5};
use rand::distr::Alphanumeric;
use rand::Rng;

pub const NONCE_LENGTH: usize = 16;

/// Application credentials issued by the Aqara developer console.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub app_id: String,
    pub key_id: String,
    /// Secret half of the key pair. Only ever mixed into the signing string.
    pub app_key: String,
}

impl Credentials {
    pub fn new(
        app_id: impl Into<String>,
        key_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            key_id: key_id.into(),
            app_key: app_key.into(),
        }
    }
}

/// The per-request values that end up in the `Nonce`, `Time` and `Sign` headers.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub nonce: String,
    pub time: String,
    pub sign: String,
}

#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
}

impl Signer {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Aqara's signature: MD5 over the lower-cased, ampersand-joined header
    /// fields in fixed key order, with the app key appended. An empty access
    /// token drops the `Accesstoken=` field entirely.
    pub fn sign(&self, access_token: &str, nonce: &str, timestamp: &str) -> String {
        let Credentials {
            app_id,
            key_id,
            app_key,
        } = &self.credentials;

        let signing_string = if access_token.is_empty() {
            format!(
                "Appid={}&Keyid={}&Nonce={}&Time={}{}",
                app_id, key_id, nonce, timestamp, app_key
            )
        } else {
            format!(
                "Accesstoken={}&Appid={}&Keyid={}&Nonce={}&Time={}{}",
                access_token, app_id, key_id, nonce, timestamp, app_key
            )
        };

        let digest = Md5::digest(signing_string.to_ascii_lowercase().as_bytes());
        hex::encode(digest)
    }

    /// Sign a fresh nonce and timestamp. Called once per outbound request.
    pub fn signed_headers(&self, access_token: Option<&str>) -> SignedHeaders {
        let nonce = generate_nonce();
        let time = generate_timestamp();
        let sign = self.sign(access_token.unwrap_or(""), &nonce, &time);
        SignedHeaders { nonce, time, sign }
    }
}

/// Random `[A-Za-z0-9]` string of `NONCE_LENGTH` characters.
pub fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// Current time in milliseconds since the Unix epoch, as a decimal string.
pub fn generate_timestamp() -> String {
    Utc::now().timestamp_millis().to_string()
}
