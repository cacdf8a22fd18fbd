// Chain data integration
// Provides the client trait and its HTTP implementation against an explorer backend

pub mod client;
pub mod types;

pub use client::{ChainDataClient, ExplorerClient};
pub use types::*;
