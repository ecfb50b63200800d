use log::{debug, error, info};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;

use crate::auth::Session;
use crate::error::{Error, Result};
use crate::models::{DeviceList, DeviceQuery};
use crate::region::Region;
use crate::sign::{Credentials, Signer};
use crate::types::{ApiRequest, ApiResponse};

pub const API_PATH: &str = "/v3.0/open/api";

const INTENT_QUERY_DEVICES: &str = "query.device.info";

/// Client for the Aqara open API. Holds the application credentials, the
/// account being driven and, once a token exchange has succeeded, the session
/// tokens. Nothing is persisted.
pub struct AqaraClient {
    client: reqwest::Client,
    base_url: String,
    signer: Signer,
    pub(crate) account: String,
    pub(crate) session: Session,
    debug: bool,
}

impl AqaraClient {
    pub fn new(region: Region, credentials: Credentials, account: &str, debug: bool) -> Self {
        Self::new_with_base_url(region.base_url(), credentials, account, debug)
    }

    /// Talk to an arbitrary base URL instead of a regional host, e.g. a mock server.
    pub fn new_with_base_url(
        base_url: String,
        credentials: Credentials,
        account: &str,
        debug: bool,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            signer: Signer::new(credentials),
            account: account.to_string(),
            session: Session::default(),
            debug,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    fn get_headers(&self, access_token: Option<&str>) -> Result<HeaderMap> {
        let credentials = self.signer.credentials();
        let signed = self.signer.signed_headers(access_token);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        insert_header(&mut headers, "appid", &credentials.app_id)?;
        insert_header(&mut headers, "keyid", &credentials.key_id)?;
        insert_header(&mut headers, "nonce", &signed.nonce)?;
        insert_header(&mut headers, "time", &signed.time)?;
        insert_header(&mut headers, "sign", &signed.sign)?;
        headers.insert("lang", HeaderValue::from_static("en"));

        if let Some(token) = access_token {
            insert_header(&mut headers, "accesstoken", token)?;
        }

        Ok(headers)
    }

    /// Send one signed request and return the envelope once its code is known
    /// to be 0. The `result` payload is left for the caller to decode;
    /// `ApiResponse::decode_result` checks the code again so it is also safe on
    /// envelopes that did not come through here.
    ///
    /// Authenticated calls sign with and send the current access token, even
    /// if it is still empty; the server is left to reject those.
    pub async fn call<T: Serialize>(
        &self,
        request: &ApiRequest<T>,
        authenticated: bool,
    ) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, API_PATH);
        let body = serde_json::to_vec(request).map_err(Error::Serialization)?;

        let access_token = authenticated.then(|| self.session.access_token());
        let headers = self.get_headers(access_token)?;

        debug!(
            "Calling intent {} (authenticated: {})",
            request.intent, authenticated
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            error!("Call to {} for {} returned {}", url, request.intent, status);
            return Err(Error::Status(status.as_u16()));
        }

        let response_text = response.text().await?;
        if self.debug {
            debug!("Raw response for {}: {}", request.intent, response_text);
        }

        let envelope = serde_json::from_str::<ApiResponse>(&response_text).map_err(|e| {
            error!("Failed to parse response for {}: {}", request.intent, e);
            Error::Decode(e)
        })?;

        if !envelope.is_success() {
            error!(
                "Aqara responded to {} with code {}: {}",
                request.intent,
                envelope.code,
                envelope.error_message()
            );
        }

        envelope.into_result()
    }

    /// First page of up to 100 devices, unfiltered.
    pub async fn list_devices(&self) -> Result<DeviceList> {
        self.query_devices(&DeviceQuery::default()).await
    }

    pub async fn query_devices(&self, query: &DeviceQuery) -> Result<DeviceList> {
        debug!(
            "Fetching devices (page {}, size {})",
            query.page_num, query.page_size
        );

        let request = ApiRequest::new(INTENT_QUERY_DEVICES, query);
        let devices: DeviceList = self.call(&request, true).await?.decode_result()?;

        info!("Number of devices received: {}", devices.total_count);
        Ok(devices)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<()> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| Error::InvalidHeader(format!("{}: {}", name, e)))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}
