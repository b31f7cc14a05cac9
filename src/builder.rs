//! Unsigned transaction assembly against the contract's entry points
use super::config::ClientConfig;
use super::error::ClientError;
use super::rpc::LedgerRpc;
use super::scval::ScVal;
use super::trade::Address;
use super::tx::Transaction;

/// Argument kinds the contract's entry points accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    U32,
    Str,
    Address,
}

impl ArgKind {
    fn name(self) -> &'static str {
        match self {
            ArgKind::U32 => "u32",
            ArgKind::Str => "str",
            ArgKind::Address => "address",
        }
    }

    fn matches(self, val: &ScVal) -> bool {
        matches!(
            (self, val),
            (ArgKind::U32, ScVal::U32(_))
                | (ArgKind::Str, ScVal::Str(_))
                | (ArgKind::Address, ScVal::Address(_))
        )
    }
}

// Declared signatures of the marketplace contract. The contract itself is a
// black box; these are its fixed entry points.
pub const GET_ALL_TRADES: &str = "get_all_trades";
pub const GET_TRADE: &str = "get_trade";
pub const REGISTER_BUYER: &str = "register_buyer";
pub const REGISTER_SELLER: &str = "register_seller";

fn entry_signature(entry_point: &str) -> Option<&'static [ArgKind]> {
    match entry_point {
        GET_ALL_TRADES => Some(&[]),
        GET_TRADE => Some(&[ArgKind::U32]),
        REGISTER_BUYER | REGISTER_SELLER => {
            Some(&[ArgKind::Address, ArgKind::Str, ArgKind::Str])
        }
        _ => None,
    }
}

/// One write operation's worth of input. Built once, consumed once by the
/// submission pipeline, discarded after the terminal outcome.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub entry_point: String,
    pub args: Vec<ScVal>,
    pub source: Address,
    pub fee_hint: Option<u32>,
    pub timeout_secs: Option<u32>,
}

impl TransactionRequest {
    pub fn new(entry_point: &str, args: Vec<ScVal>, source: Address) -> Self {
        Self {
            entry_point: entry_point.to_string(),
            args,
            source,
            fee_hint: None,
            timeout_secs: None,
        }
    }

    pub fn set_fee_hint(mut self, fee: u32) -> Self {
        self.fee_hint = Some(fee);
        self
    }

    pub fn set_timeout_secs(mut self, secs: u32) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

pub struct TransactionBuilder<'a> {
    rpc: &'a dyn LedgerRpc,
    config: &'a ClientConfig,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(rpc: &'a dyn LedgerRpc, config: &'a ClientConfig) -> Self {
        Self { rpc, config }
    }

    /// Assemble with a caller-supplied sequence number and no network
    /// round-trip. Read-only simulate calls use this with the placeholder
    /// account at sequence zero.
    pub fn assemble(
        &self,
        request: &TransactionRequest,
        sequence: i64,
    ) -> Result<Transaction, ClientError> {
        let expected = entry_signature(&request.entry_point).ok_or_else(|| {
            ClientError::invalid_argument(&request.entry_point, "unknown entry point")
        })?;
        if request.args.len() != expected.len() {
            return Err(ClientError::invalid_argument(
                &request.entry_point,
                format!(
                    "expected {} arguments, got {}",
                    expected.len(),
                    request.args.len()
                ),
            ));
        }
        for (i, (kind, arg)) in expected.iter().zip(&request.args).enumerate() {
            if !kind.matches(arg) {
                return Err(ClientError::invalid_argument(
                    &request.entry_point,
                    format!("argument {i}: expected {}, got {}", kind.name(), arg.kind()),
                ));
            }
        }

        Ok(Transaction {
            source: request.source.clone(),
            sequence,
            fee: request.fee_hint.unwrap_or(self.config.base_fee),
            timeout_secs: request.timeout_secs.unwrap_or(self.config.tx_timeout_secs),
            network_id: self.config.network_id.clone(),
            contract_id: self.config.contract_id.clone(),
            entry_point: request.entry_point.clone(),
            args: request.args.clone(),
        })
    }

    /// Assemble a submittable transaction, stamped with the next sequence
    /// number read fresh from the source account. The ledger enforces
    /// sequence order; the builder only makes sure it never stamps from a
    /// stale local copy.
    pub async fn build(&self, request: &TransactionRequest) -> Result<Transaction, ClientError> {
        let account = self
            .rpc
            .fetch_account(&request.source)
            .await?
            .ok_or_else(|| ClientError::AccountNotFound(request.source.to_string()))?;
        self.assemble(request, account.sequence + 1)
    }
}
