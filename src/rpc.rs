//! Thin adapter over the ledger's JSON-RPC endpoint.
//!
//! No state is kept between calls and nothing is retried here; bounded
//! retry belongs to the submission pipeline. Transport failures surface as
//! [`ClientError::Network`], malformed responses as [`ClientError::Protocol`].
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ClientError;
use super::scval::ScVal;
use super::trade::Address;

/// RPC error code the endpoint uses for a missing account.
const CODE_ACCOUNT_NOT_FOUND: i64 = -32001;

/// Outcome of simulating a transaction against current network state. A
/// contract rejection is a valid response at this layer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationResult {
    Success { retval: Option<ScVal> },
    Rejected { diagnostic: String },
}

/// Acknowledgement returned when the ledger accepts a transaction for
/// inclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAck {
    pub hash: String,
    pub status: String,
}

/// Transaction status as reported by the ledger. `NotFound` means "not yet
/// included" while the validity window is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
    NotFound,
    Success,
    Failed { status: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub address: String,
    pub sequence: i64,
}

#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn simulate(&self, envelope_b64: &str) -> Result<SimulationResult, ClientError>;
    async fn submit(&self, signed_b64: &str) -> Result<SubmitAck, ClientError>;
    async fn poll_status(&self, hash: &str) -> Result<TxStatus, ClientError>;
    async fn fetch_account(&self, address: &Address) -> Result<Option<AccountState>, ClientError>;
}

// wire shapes

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u32,
    method: &'a str,
    params: P,
}

#[derive(serde::Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(serde::Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Serialize)]
struct TransactionParams<'a> {
    transaction: &'a str,
}

#[derive(Serialize)]
struct HashParams<'a> {
    hash: &'a str,
}

#[derive(Serialize)]
struct AccountParams<'a> {
    address: &'a str,
}

#[derive(serde::Deserialize)]
struct SimulateResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
    /// Base64-wrapped canonical encoding of the contract's return value.
    #[serde(default)]
    retval: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct SendResponse {
    hash: String,
    status: String,
}

#[derive(serde::Deserialize)]
struct GetTransactionResponse {
    status: String,
}

#[derive(serde::Deserialize)]
struct GetAccountResponse {
    address: String,
    sequence: i64,
}

/// [`LedgerRpc`] over a single configured HTTP endpoint.
pub struct HttpLedgerRpc {
    http: reqwest::Client,
    url: String,
}

impl HttpLedgerRpc {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: rpc_url.to_string(),
        }
    }

    async fn call<P, R>(&self, method: &str, params: P) -> Result<RpcResponse<R>, ClientError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        debug!(method, "ledger rpc call");
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let response = self.http.post(self.url.as_str()).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Network(format!(
                "endpoint answered http {status}"
            )));
        }
        response
            .json::<RpcResponse<R>>()
            .await
            .map_err(|e| ClientError::Protocol(format!("{method}: {e}")))
    }

    /// Unwrap a JSON-RPC response that must carry a result.
    fn expect_result<R>(method: &str, response: RpcResponse<R>) -> Result<R, ClientError> {
        if let Some(err) = response.error {
            return Err(ClientError::Protocol(format!(
                "{method}: rpc error {}: {}",
                err.code, err.message
            )));
        }
        response
            .result
            .ok_or_else(|| ClientError::Protocol(format!("{method}: response carries no result")))
    }
}

#[async_trait]
impl LedgerRpc for HttpLedgerRpc {
    async fn simulate(&self, envelope_b64: &str) -> Result<SimulationResult, ClientError> {
        let response: RpcResponse<SimulateResponse> = self
            .call(
                "simulateTransaction",
                TransactionParams {
                    transaction: envelope_b64,
                },
            )
            .await?;
        let body = Self::expect_result("simulateTransaction", response)?;
        if body.status == "SUCCESS" {
            let retval = match body.retval {
                Some(payload) => Some(ScVal::from_base64(&payload)?),
                None => None,
            };
            Ok(SimulationResult::Success { retval })
        } else {
            Ok(SimulationResult::Rejected {
                diagnostic: body
                    .error
                    .unwrap_or_else(|| format!("simulation status {}", body.status)),
            })
        }
    }

    async fn submit(&self, signed_b64: &str) -> Result<SubmitAck, ClientError> {
        let response: RpcResponse<SendResponse> = self
            .call(
                "sendTransaction",
                TransactionParams {
                    transaction: signed_b64,
                },
            )
            .await?;
        let body = Self::expect_result("sendTransaction", response)?;
        if hex::decode(&body.hash).is_err() {
            return Err(ClientError::Protocol(format!(
                "sendTransaction: acknowledged hash '{}' is not hex",
                body.hash
            )));
        }
        Ok(SubmitAck {
            hash: body.hash,
            status: body.status,
        })
    }

    async fn poll_status(&self, hash: &str) -> Result<TxStatus, ClientError> {
        let response: RpcResponse<GetTransactionResponse> =
            self.call("getTransaction", HashParams { hash }).await?;
        let body = Self::expect_result("getTransaction", response)?;
        Ok(match body.status.as_str() {
            "NOT_FOUND" => TxStatus::NotFound,
            "SUCCESS" => TxStatus::Success,
            other => TxStatus::Failed {
                status: other.to_string(),
            },
        })
    }

    async fn fetch_account(&self, address: &Address) -> Result<Option<AccountState>, ClientError> {
        let response: RpcResponse<GetAccountResponse> = self
            .call(
                "getAccount",
                AccountParams {
                    address: address.as_str(),
                },
            )
            .await?;
        if let Some(err) = &response.error {
            if err.code == CODE_ACCOUNT_NOT_FOUND {
                return Ok(None);
            }
        }
        let body = Self::expect_result("getAccount", response)?;
        Ok(Some(AccountState {
            address: body.address,
            sequence: body.sequence,
        }))
    }
}
