//! dApp signing sessions
//!
//! - `types.rs` - Peer events, request params and responses
//! - `intent.rs` - Transaction intents built from requests
//! - `session.rs` - Session lifecycle state machine
//! - `handler.rs` - Request dispatch and peer responses

pub mod handler;
pub mod intent;
pub mod session;
pub mod types;

pub use handler::{RequestOutcome, SessionRequestHandler, SessionTransport};
pub use intent::{AssetAmount, DappIntent, DappTxData};
pub use session::{SessionLifecycle, SessionState};
pub use types::{ChainInfo, JsonRpcResponse, ProposalEvent, RelayMethod, RequestEvent};
