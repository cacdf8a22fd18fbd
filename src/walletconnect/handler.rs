use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::intent::{self, DappIntent, DappTxData};
use super::session::{SessionLifecycle, SessionState};
use super::types::*;
use crate::error::WalletError;
use crate::explorer::{ApiRequest, ChainDataClient};
use crate::wallet::registry::AddressRegistry;

/// Outbound side of the peer session
#[async_trait]
pub trait SessionTransport: Send + Sync {
    async fn respond(&self, topic: &str, response: JsonRpcResponse) -> Result<(), WalletError>;
}

/// What a session request turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Awaiting user confirmation; answered later through
    /// `approve_request` or `reject_request`
    Intent(DappIntent),
    /// API passthrough, already answered
    Relayed,
}

/// Validates inbound signing requests against the wallet's addresses and
/// turns them into intents for the UI.
pub struct SessionRequestHandler {
    registry: Arc<AddressRegistry>,
    client: Arc<dyn ChainDataClient>,
    transport: Arc<dyn SessionTransport>,
    lifecycle: SessionLifecycle,
    request_event: Option<RequestEvent>,
    intent: Option<DappIntent>,
}

fn parse_params<T: DeserializeOwned>(method: RelayMethod, params: &Value) -> Result<T, WalletError> {
    serde_json::from_value(params.clone())
        .map_err(|e| WalletError::InvalidParams(format!("{}: {}", method, e)))
}

impl SessionRequestHandler {
    pub fn new(
        registry: Arc<AddressRegistry>,
        client: Arc<dyn ChainDataClient>,
        transport: Arc<dyn SessionTransport>,
    ) -> Self {
        Self {
            registry,
            client,
            transport,
            lifecycle: SessionLifecycle::Uninitialized,
            request_event: None,
            intent: None,
        }
    }

    pub fn lifecycle(&self) -> &SessionLifecycle {
        &self.lifecycle
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    pub fn current_request(&self) -> Option<&RequestEvent> {
        self.request_event.as_ref()
    }

    pub fn current_intent(&self) -> Option<&DappIntent> {
        self.intent.as_ref()
    }

    pub fn on_session_proposal(&mut self, event: ProposalEvent) -> Result<ChainInfo, WalletError> {
        let required_chain = event.required_chain()?;
        log::info!(
            "Session proposal from '{}' requiring {}",
            event.params.proposer.metadata.name,
            required_chain
        );
        self.lifecycle
            .propose(event.id, required_chain, event.params.proposer.metadata)?;
        Ok(required_chain)
    }

    pub fn on_proposal_approve(&mut self, topic: &str) -> Result<(), WalletError> {
        self.lifecycle.approve(topic)?;
        log::info!("Session {} established", topic);
        Ok(())
    }

    pub fn on_session_delete(&mut self) {
        if self.lifecycle.state() != SessionState::Uninitialized {
            log::info!("Session closed");
        }
        self.lifecycle.delete();
        self.request_event = None;
        self.intent = None;
    }

    /// Handle one request. Every failure is answered to the peer with the
    /// session error code before it is returned.
    pub async fn on_session_request(
        &mut self,
        event: RequestEvent,
    ) -> Result<RequestOutcome, WalletError> {
        log::debug!("Session request {} ({})", event.id, event.method());
        self.request_event = Some(event.clone());
        self.intent = None;

        match self.dispatch(&event).await {
            Ok(RequestOutcome::Intent(intent)) => {
                self.intent = Some(intent.clone());
                Ok(RequestOutcome::Intent(intent))
            }
            Ok(RequestOutcome::Relayed) => {
                self.request_event = None;
                Ok(RequestOutcome::Relayed)
            }
            Err(e) => {
                log::error!("Error while handling session request {}: {}", event.id, e);
                self.respond_error(&event, &e.to_string()).await;
                self.request_event = None;
                Err(e)
            }
        }
    }

    async fn dispatch(&self, event: &RequestEvent) -> Result<RequestOutcome, WalletError> {
        let method: RelayMethod = event.method().parse()?;
        let params = &event.params.request.params;

        let tx = match method {
            RelayMethod::SignAndSubmitTransferTx => {
                let params = parse_params(method, params)?;
                DappTxData::Transfer(intent::transfer_intent(&self.registry.snapshot(), params)?)
            }
            RelayMethod::SignAndSubmitDeployContractTx => {
                let params = parse_params(method, params)?;
                DappTxData::DeployContract(intent::deploy_contract_intent(
                    &self.registry.snapshot(),
                    params,
                )?)
            }
            RelayMethod::SignAndSubmitExecuteScriptTx => {
                let params = parse_params(method, params)?;
                DappTxData::Script(intent::script_intent(&self.registry.snapshot(), params)?)
            }
            RelayMethod::RequestNodeApi | RelayMethod::RequestExplorerApi => {
                let request: ApiRequest = parse_params(method, params)?;
                let result = if method == RelayMethod::RequestNodeApi {
                    self.client.node_request(&request).await?
                } else {
                    self.client.explorer_request(&request).await?
                };
                self.transport
                    .respond(&event.topic, JsonRpcResponse::success(event.id, result))
                    .await?;
                return Ok(RequestOutcome::Relayed);
            }
        };

        Ok(RequestOutcome::Intent(DappIntent::new(event.id, &event.topic, tx)))
    }

    async fn respond_error(&self, event: &RequestEvent, message: &str) {
        let response = JsonRpcResponse::error(event.id, message);
        if let Err(e) = self.transport.respond(&event.topic, response).await {
            log::error!("Could not answer session request {}: {}", event.id, e);
        }
    }

    fn take_request(&mut self) -> Result<RequestEvent, WalletError> {
        self.intent = None;
        self.request_event
            .take()
            .ok_or_else(|| WalletError::InvalidSessionState("no request awaiting an answer".to_string()))
    }

    /// Report the outcome of a confirmed intent (e.g. the submitted tx) to the peer
    pub async fn approve_request(&mut self, result: Value) -> Result<(), WalletError> {
        let event = self.take_request()?;
        self.transport
            .respond(&event.topic, JsonRpcResponse::success(event.id, result))
            .await
    }

    /// Tell the peer the current request was refused or failed
    pub async fn reject_request(&mut self, message: &str) -> Result<(), WalletError> {
        let event = self.take_request()?;
        self.transport
            .respond(&event.topic, JsonRpcResponse::error(event.id, message))
            .await
    }
}
