use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::*;
use crate::config::SyncConfig;
use crate::error::WalletError;

/// Chain data source used by the sync engine and the session handler.
///
/// Every call is fallible; callers decide whether a failure aborts anything.
#[async_trait]
pub trait ChainDataClient: Send + Sync {
    async fn get_address_details(&self, address: &str) -> Result<AddressDetails, WalletError>;

    /// One page (1-based) of confirmed transactions, most recent first
    async fn get_confirmed_transactions(
        &self,
        address: &str,
        page: u32,
    ) -> Result<Vec<Transaction>, WalletError>;

    async fn get_unconfirmed_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<UnconfirmedTransaction>, WalletError>;

    /// One page of the merged history of several addresses
    async fn get_addresses_transactions(
        &self,
        addresses: &[String],
        page: u32,
    ) -> Result<Vec<Transaction>, WalletError>;

    async fn node_request(&self, request: &ApiRequest) -> Result<Value, WalletError>;

    async fn explorer_request(&self, request: &ApiRequest) -> Result<Value, WalletError>;
}

/// HTTP implementation backed by an explorer backend and a full node
#[derive(Clone)]
pub struct ExplorerClient {
    client: reqwest::Client,
    explorer_url: String,
    node_url: String,
    page_limit: u32,
}

impl ExplorerClient {
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_urls(&config.explorer_api_url, &config.node_api_url, config.page_limit)
    }

    pub fn with_urls(explorer_url: &str, node_url: &str, page_limit: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            explorer_url: explorer_url.trim_end_matches('/').to_string(),
            node_url: node_url.trim_end_matches('/').to_string(),
            page_limit,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, WalletError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WalletError::Explorer(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WalletError::Explorer(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WalletError::Explorer(e.to_string()))
    }

    /// Forward a passthrough request below `base`
    async fn forward(
        &self,
        base: &str,
        method: Method,
        request: &ApiRequest,
    ) -> Result<Value, reqwest::Error> {
        let url = format!("{}/{}", base, request.path.trim_start_matches('/'));

        let mut builder = self.client.request(method.clone(), &url);
        if method == Method::POST || method == Method::PUT {
            if let Some(body) = request.params.first() {
                builder = builder.json(body);
            }
        }

        let response = builder.send().await?.error_for_status()?;
        let text = response.text().await?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        // Some endpoints answer plain text (e.g. heights), relay it as a string
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

fn passthrough_method(request: &ApiRequest) -> Result<Method, WalletError> {
    Method::from_bytes(request.method.to_uppercase().as_bytes()).map_err(|_| {
        WalletError::InvalidParams(format!("invalid HTTP method '{}'", request.method))
    })
}

#[async_trait]
impl ChainDataClient for ExplorerClient {
    async fn get_address_details(&self, address: &str) -> Result<AddressDetails, WalletError> {
        let balance: AddressBalance = self
            .get_json(&format!("{}/addresses/{}/balance", self.explorer_url, address))
            .await?;
        let tx_number: u64 = self
            .get_json(&format!(
                "{}/addresses/{}/total-transactions",
                self.explorer_url, address
            ))
            .await?;

        Ok(AddressDetails {
            balance: balance.balance,
            locked_balance: balance.locked_balance,
            tx_number,
        })
    }

    async fn get_confirmed_transactions(
        &self,
        address: &str,
        page: u32,
    ) -> Result<Vec<Transaction>, WalletError> {
        self.get_json(&format!(
            "{}/addresses/{}/transactions?page={}&limit={}",
            self.explorer_url, address, page, self.page_limit
        ))
        .await
    }

    async fn get_unconfirmed_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<UnconfirmedTransaction>, WalletError> {
        self.get_json(&format!(
            "{}/addresses/{}/unconfirmed-transactions",
            self.explorer_url, address
        ))
        .await
    }

    async fn get_addresses_transactions(
        &self,
        addresses: &[String],
        page: u32,
    ) -> Result<Vec<Transaction>, WalletError> {
        let url = format!(
            "{}/addresses/transactions?page={}&limit={}",
            self.explorer_url, page, self.page_limit
        );
        let response = self
            .client
            .post(&url)
            .json(addresses)
            .send()
            .await
            .map_err(|e| WalletError::Explorer(e.to_string()))?;

        if !response.status().is_success() {
            return Err(WalletError::Explorer(format!(
                "POST {} returned {}",
                url,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| WalletError::Explorer(e.to_string()))
    }

    async fn node_request(&self, request: &ApiRequest) -> Result<Value, WalletError> {
        log::debug!("Node passthrough: {} {}", request.method, request.path);
        let method = passthrough_method(request)?;
        self.forward(&self.node_url, method, request)
            .await
            .map_err(|e| WalletError::Node(e.to_string()))
    }

    async fn explorer_request(&self, request: &ApiRequest) -> Result<Value, WalletError> {
        log::debug!("Explorer passthrough: {} {}", request.method, request.path);
        let method = passthrough_method(request)?;
        self.forward(&self.explorer_url, method, request)
            .await
            .map_err(|e| WalletError::Explorer(e.to_string()))
    }
}
