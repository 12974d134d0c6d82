//! Customer details bridge
//!
//! Single-attempt GET against the upstream customer API. Non-success statuses
//! and transport failures surface as [`BridgeError::Upstream`]; bodies that
//! are not JSON surface as [`BridgeError::Decode`].

use {
    crate::config::UpstreamConfig,
    crate::error::BridgeError,
    crate::logging,
    reqwest::{
        header::{ACCEPT, CONTENT_TYPE},
        Url,
    },
    serde_json::Value,
    tracing::debug,
};

const CUSTOMER_DETAILS_PATH: [&str; 3] = ["api", "config", "getCustomerDetails"];

#[derive(Debug, Clone)]
pub struct CustomerDetailsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CustomerDetailsClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, BridgeError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| BridgeError::Upstream {
            status: None,
            reason: format!("invalid base URL {:?}: {e}", config.base_url),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(BridgeError::Upstream {
                status: None,
                reason: format!("base URL {:?} cannot carry a path", config.base_url),
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| BridgeError::Upstream {
            status: None,
            reason: e.to_string(),
        })?;

        Ok(Self { http, base_url })
    }

    /// `{base}/api/config/getCustomerDetails/{customerNo}`, with the customer
    /// number percent-encoded as a single path segment
    pub fn endpoint(&self, customer_no: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(CUSTOMER_DETAILS_PATH)
                .push(customer_no);
        }
        url
    }

    /// Fetch and decode the customer record
    pub async fn fetch(&self, customer_no: &str) -> Result<Value, BridgeError> {
        let url = self.endpoint(customer_no);
        debug!(url = %url, "Fetching customer details");

        let response = self
            .http
            .get(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| upstream_failure(&url, None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(upstream_failure(
                &url,
                Some(status.as_u16()),
                format!("HTTP {status}"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| upstream_failure(&url, Some(status.as_u16()), e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| {
            logging::log_upstream_error(url.as_str(), Some(status.as_u16()), &e.to_string());
            BridgeError::Decode(e.to_string())
        })
    }
}

fn upstream_failure(url: &Url, status: Option<u16>, reason: String) -> BridgeError {
    logging::log_upstream_error(url.as_str(), status, &reason);
    BridgeError::Upstream { status, reason }
}
