/// Session lifecycle
///
/// `Uninitialized -> Proposal -> Initialized -> Uninitialized`, with
/// `Proposal -> Uninitialized` when the peer gives up before approval.

use super::types::{ChainInfo, PeerMetadata};
use crate::error::WalletError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Proposal,
    Initialized,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionLifecycle {
    #[default]
    Uninitialized,
    Proposal {
        proposal_id: u64,
        required_chain: ChainInfo,
        proposer: PeerMetadata,
    },
    Initialized {
        topic: String,
        required_chain: ChainInfo,
        peer: PeerMetadata,
    },
}

impl SessionLifecycle {
    pub fn state(&self) -> SessionState {
        match self {
            SessionLifecycle::Uninitialized => SessionState::Uninitialized,
            SessionLifecycle::Proposal { .. } => SessionState::Proposal,
            SessionLifecycle::Initialized { .. } => SessionState::Initialized,
        }
    }

    pub fn required_chain(&self) -> Option<ChainInfo> {
        match self {
            SessionLifecycle::Uninitialized => None,
            SessionLifecycle::Proposal { required_chain, .. }
            | SessionLifecycle::Initialized { required_chain, .. } => Some(*required_chain),
        }
    }

    pub fn topic(&self) -> Option<&str> {
        match self {
            SessionLifecycle::Initialized { topic, .. } => Some(topic),
            _ => None,
        }
    }

    /// Metadata of the connected peer
    pub fn peer(&self) -> Option<&PeerMetadata> {
        match self {
            SessionLifecycle::Initialized { peer, .. } => Some(peer),
            _ => None,
        }
    }

    pub fn proposer(&self) -> Option<&PeerMetadata> {
        match self {
            SessionLifecycle::Proposal { proposer, .. } => Some(proposer),
            _ => None,
        }
    }

    /// Only an idle session accepts a proposal
    pub fn propose(
        &mut self,
        proposal_id: u64,
        required_chain: ChainInfo,
        proposer: PeerMetadata,
    ) -> Result<(), WalletError> {
        if self.state() != SessionState::Uninitialized {
            return Err(WalletError::InvalidSessionState(format!(
                "cannot accept a proposal while {:?}",
                self.state()
            )));
        }
        *self = SessionLifecycle::Proposal {
            proposal_id,
            required_chain,
            proposer,
        };
        Ok(())
    }

    /// Move a pending proposal to a connected session. The state is left
    /// untouched when there is no proposal.
    pub fn approve(&mut self, topic: impl Into<String>) -> Result<(), WalletError> {
        match std::mem::take(self) {
            SessionLifecycle::Proposal {
                required_chain,
                proposer,
                ..
            } => {
                *self = SessionLifecycle::Initialized {
                    topic: topic.into(),
                    required_chain,
                    peer: proposer,
                };
                Ok(())
            }
            other => {
                let state = other.state();
                *self = other;
                Err(WalletError::InvalidSessionState(format!(
                    "cannot approve a proposal while {:?}",
                    state
                )))
            }
        }
    }

    /// Forget the session. No-op when already uninitialized.
    pub fn delete(&mut self) {
        *self = SessionLifecycle::Uninitialized;
    }
}
