use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::client::AqaraClient;
use crate::error::{Error, Result};
use crate::models::{null_as_default, string_or_number};
use crate::types::ApiRequest;

const INTENT_GET_AUTH_CODE: &str = "config.auth.getAuthCode";
const INTENT_GET_TOKEN: &str = "config.auth.getToken";
const INTENT_REFRESH_TOKEN: &str = "config.auth.refreshToken";

/// Aqara account identifiers are phone numbers or email addresses.
const ACCOUNT_TYPE: u8 = 0;
const ACCESS_TOKEN_VALIDITY: &str = "1h";

/// In-memory token pair. Either both tokens are empty or both are set; they
/// are only ever replaced together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    access_token: String,
    refresh_token: String,
}

impl Session {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    pub(crate) fn replace(&mut self, access_token: &str, refresh_token: &str) {
        *self = Session {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
        };
    }
}

#[derive(Debug, Serialize)]
pub struct AuthCodeRequest {
    pub account: String,
    #[serde(rename = "accountType")]
    pub account_type: u8,
    #[serde(rename = "accessTokenValidity")]
    pub access_token_validity: String,
}

#[derive(Debug, Serialize)]
pub struct TokenRequest {
    #[serde(rename = "authCode")]
    pub auth_code: String,
    pub account: String,
    #[serde(rename = "accountType")]
    pub account_type: u8,
}

#[derive(Debug, Serialize)]
pub struct RefreshTokenRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Result of both `config.auth.getToken` and `config.auth.refreshToken`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TokenResult {
    #[serde(rename = "expiresIn", default, deserialize_with = "string_or_number")]
    pub expires_in: String,
    #[serde(rename = "openId", default, deserialize_with = "null_as_default")]
    pub open_id: String,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

impl TokenResult {
    fn validate(self) -> Result<Self> {
        if self.access_token.is_empty() || self.refresh_token.is_empty() {
            return Err(Error::Decode(serde::de::Error::custom(
                "token result is missing accessToken or refreshToken",
            )));
        }
        Ok(self)
    }
}

impl AqaraClient {
    /// Ask Aqara to send a one-time authorization code to the account by SMS or email.
    pub async fn request_auth_code(&self) -> Result<()> {
        debug!("Requesting authorization code for account: {}", self.account);

        let request = ApiRequest::new(
            INTENT_GET_AUTH_CODE,
            AuthCodeRequest {
                account: self.account.clone(),
                account_type: ACCOUNT_TYPE,
                access_token_validity: ACCESS_TOKEN_VALIDITY.to_string(),
            },
        );
        self.call(&request, false).await?;

        info!("Authorization code sent to {}", self.account);
        Ok(())
    }

    /// Exchange an authorization code for an access/refresh token pair and
    /// store it in the session. On any failure the previous session is kept.
    pub async fn exchange_token(&mut self, auth_code: &str) -> Result<TokenResult> {
        debug!("Exchanging authorization code for account: {}", self.account);

        let request = ApiRequest::new(
            INTENT_GET_TOKEN,
            TokenRequest {
                auth_code: auth_code.to_string(),
                account: self.account.clone(),
                account_type: ACCOUNT_TYPE,
            },
        );
        let tokens = self.fetch_tokens(&request).await?;

        info!("Login successful, updating account information");
        Ok(tokens)
    }

    /// Trade the session's refresh token for a new token pair.
    pub async fn refresh_token(&mut self) -> Result<TokenResult> {
        debug!("Refreshing access token for account: {}", self.account);

        let request = ApiRequest::new(
            INTENT_REFRESH_TOKEN,
            RefreshTokenRequest {
                refresh_token: self.session.refresh_token().to_string(),
            },
        );
        let tokens = self.fetch_tokens(&request).await?;

        info!("Access token refreshed");
        Ok(tokens)
    }

    async fn fetch_tokens<T: Serialize>(
        &mut self,
        request: &ApiRequest<T>,
    ) -> Result<TokenResult> {
        let tokens: TokenResult = self.call(request, false).await?.decode_result()?;
        let tokens = tokens.validate()?;

        self.session.replace(&tokens.access_token, &tokens.refresh_token);
        Ok(tokens)
    }
}
