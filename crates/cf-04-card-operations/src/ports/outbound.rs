//! # Outbound Ports
//!
//! The card program's write surface and the deployment lookup. Reads go
//! through [`CardLedgerReader`], which the gateway extends.

use async_trait::async_trait;
use cf_03_card_registry::{CardLedgerReader, LedgerError};
use serde::{Deserialize, Serialize};
use shared_types::{Address, CardCiphertexts, CardId, ChainId, DeploymentInfo};

/// Confirmation of a mint transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    /// Card created by the transaction.
    pub card_id: CardId,
}

/// Confirmation of a fuse transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuseReceipt {
    /// Card created from the burned parents.
    pub new_card_id: CardId,
}

/// Card program transaction surface - outbound port.
///
/// Calls resolve once the transaction is confirmed; a rejected or reverted
/// transaction yields `LedgerError::Rejected`.
#[async_trait]
pub trait CardProgramGateway: CardLedgerReader {
    /// Mint a card from four encrypted attribute inputs of `sender`.
    async fn submit_mint(
        &self,
        program: Address,
        sender: Address,
        attributes: CardCiphertexts,
    ) -> Result<MintReceipt, LedgerError>;

    /// Fuse two cards of `sender`; the program burns both.
    async fn submit_fuse(
        &self,
        program: Address,
        sender: Address,
        a: CardId,
        b: CardId,
    ) -> Result<FuseReceipt, LedgerError>;
}

/// Deployment lookup - outbound port.
#[async_trait]
pub trait DeploymentResolver: Send + Sync {
    /// The card program's deployment on `chain_id`, or `None` if the program
    /// is not deployed there.
    async fn resolve(&self, chain_id: ChainId) -> Option<DeploymentInfo>;
}
