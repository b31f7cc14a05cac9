//! Service layer API for the marketplace UI
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use super::aggregate::{ParticipantSummary, aggregate_by_buyer, aggregate_by_seller};
use super::builder::{REGISTER_BUYER, REGISTER_SELLER, TransactionRequest};
use super::config::ClientConfig;
use super::error::ClientError;
use super::pipeline::{SubmissionPipeline, TransactionSigner};
use super::reader::{self, TradeReader};
use super::rpc::LedgerRpc;
use super::scval::ScVal;
use super::trade::{Address, Role, Trade};

/// Outcome of a write operation, shaped for direct rendering by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    pub success: bool,
    pub transaction_hash: Option<String>,
    pub error: Option<String>,
}

impl WriteResult {
    fn finalized(hash: String) -> Self {
        Self {
            success: true,
            transaction_hash: Some(hash),
            error: None,
        }
    }

    fn failed(err: &ClientError) -> Self {
        Self {
            success: false,
            transaction_hash: None,
            error: Some(err.to_string()),
        }
    }
}

/// The surface the UI talks to. Explicitly constructed with its network
/// client and configuration so tests can substitute a fake ledger.
///
/// Read errors surface as an empty result plus a logged diagnostic, never
/// stale or fabricated data. Write errors come back as a structured
/// [`WriteResult`].
pub struct MarketplaceService<R: LedgerRpc> {
    rpc: R,
    config: ClientConfig,
    // One writer at a time per source account, so two overlapping writes
    // cannot race on the same sequence number. The ledger's own sequence
    // check remains the final safety net.
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<R: LedgerRpc> MarketplaceService<R> {
    pub fn new(rpc: R, config: ClientConfig) -> Self {
        Self {
            rpc,
            config,
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_all_trades(&self) -> Vec<Trade> {
        let reader = TradeReader::new(&self.rpc, &self.config);
        match reader.fetch_all().await {
            Ok(trades) => trades,
            Err(err) => {
                error!(%err, "failed to fetch trade set");
                Vec::new()
            }
        }
    }

    pub async fn get_trade(&self, trade_id: u32) -> Option<Trade> {
        let reader = TradeReader::new(&self.rpc, &self.config);
        match reader.fetch_trade(trade_id).await {
            Ok(trade) => trade,
            Err(err) => {
                error!(trade_id, %err, "failed to fetch trade");
                None
            }
        }
    }

    pub async fn get_buyer_trades(&self, address: &str) -> Vec<Trade> {
        reader::filter_by_participant(&self.get_all_trades().await, Role::Buyer, address)
    }

    pub async fn get_seller_trades(&self, address: &str) -> Vec<Trade> {
        reader::filter_by_participant(&self.get_all_trades().await, Role::Seller, address)
    }

    pub async fn get_buyer_instruments(&self, address: &str) -> Vec<Trade> {
        reader::buyer_instruments(&self.get_all_trades().await, address)
    }

    pub async fn get_seller_listings(&self, address: &str) -> Vec<Trade> {
        reader::seller_listings(&self.get_all_trades().await, address)
    }

    pub async fn get_buyers(&self) -> Vec<ParticipantSummary> {
        aggregate_by_buyer(&self.get_all_trades().await)
    }

    pub async fn get_sellers(&self) -> Vec<ParticipantSummary> {
        aggregate_by_seller(&self.get_all_trades().await)
    }

    /// Register a new buyer. The transaction is signed by the external
    /// wallet and submitted from `source_address`, which must be authorized
    /// by the contract.
    pub async fn register_buyer(
        &self,
        buyer_address: &str,
        buyer_name: &str,
        buyer_lei_id: &str,
        source_address: &str,
        signer: &dyn TransactionSigner,
    ) -> WriteResult {
        self.register_participant(
            REGISTER_BUYER,
            buyer_address,
            buyer_name,
            buyer_lei_id,
            source_address,
            signer,
        )
        .await
    }

    /// Register a new seller. Same flow as [`MarketplaceService::register_buyer`].
    pub async fn register_seller(
        &self,
        seller_address: &str,
        seller_name: &str,
        seller_lei_id: &str,
        source_address: &str,
        signer: &dyn TransactionSigner,
    ) -> WriteResult {
        self.register_participant(
            REGISTER_SELLER,
            seller_address,
            seller_name,
            seller_lei_id,
            source_address,
            signer,
        )
        .await
    }

    async fn register_participant(
        &self,
        entry_point: &str,
        participant: &str,
        name: &str,
        lei_id: &str,
        source: &str,
        signer: &dyn TransactionSigner,
    ) -> WriteResult {
        match self
            .submit_registration(entry_point, participant, name, lei_id, source, signer)
            .await
        {
            Ok(hash) => {
                info!(entry_point, participant, %hash, "registration finalized");
                WriteResult::finalized(hash)
            }
            Err(err) => {
                error!(entry_point, participant, %err, "registration failed");
                WriteResult::failed(&err)
            }
        }
    }

    async fn submit_registration(
        &self,
        entry_point: &str,
        participant: &str,
        name: &str,
        lei_id: &str,
        source: &str,
        signer: &dyn TransactionSigner,
    ) -> Result<String, ClientError> {
        let participant = Address::parse(participant).map_err(|_| {
            ClientError::invalid_argument(
                entry_point,
                format!("'{participant}' is not a ledger address"),
            )
        })?;
        let source = Address::parse(source).map_err(|_| {
            ClientError::invalid_argument(
                entry_point,
                format!("source '{source}' is not a ledger address"),
            )
        })?;

        let request = TransactionRequest::new(
            entry_point,
            vec![
                ScVal::Address(participant),
                ScVal::Str(name.to_string()),
                ScVal::Str(lei_id.to_string()),
            ],
            source.clone(),
        );

        let lock = self.writer_lock(&source).await;
        let _guard = lock.lock().await;
        SubmissionPipeline::new(&self.rpc, &self.config)
            .run(&request, signer)
            .await
    }

    async fn writer_lock(&self, source: &Address) -> Arc<Mutex<()>> {
        let mut locks = self.write_locks.lock().await;
        locks
            .entry(source.as_str().to_ascii_uppercase())
            .or_default()
            .clone()
    }
}
