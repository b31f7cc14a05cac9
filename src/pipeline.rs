//! Submission pipeline: simulate, collect an external signature, submit,
//! poll until a terminal status.
//!
//! One pipeline instance drives one transaction. Dropping the future
//! abandons the instance: before submission no ledger state exists, and
//! after submission the transaction settles or expires on its own. A
//! terminal failure is never retried here; the caller re-invokes the whole
//! pipeline, which starts from a fresh sequence number.
use async_trait::async_trait;
use tokio::time::sleep;
use tracing::debug;

use super::builder::{TransactionBuilder, TransactionRequest};
use super::config::ClientConfig;
use super::error::ClientError;
use super::rpc::{LedgerRpc, SimulationResult, TxStatus};
use super::tx::{SignedEnvelope, Transaction};

/// The wallet collaborator. Receives the canonical encoded transaction and
/// returns the signed envelope in the same encoding. It may fail, be
/// cancelled by the user, or hang indefinitely; the pipeline simply stays
/// suspended until it answers or the caller drops the future.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign(&self, envelope_b64: &str) -> Result<String, ClientError>;
}

enum Step {
    Built { tx: Transaction },
    Simulated { envelope_b64: String },
    AwaitingSignature { signed_b64: String },
    Pending { hash: String, attempt: u32 },
}

pub struct SubmissionPipeline<'a> {
    rpc: &'a dyn LedgerRpc,
    config: &'a ClientConfig,
}

impl<'a> SubmissionPipeline<'a> {
    pub fn new(rpc: &'a dyn LedgerRpc, config: &'a ClientConfig) -> Self {
        Self { rpc, config }
    }

    /// Drive one request to its terminal outcome. Success returns the
    /// transaction hash reported by the ledger.
    pub async fn run(
        &self,
        request: &TransactionRequest,
        signer: &dyn TransactionSigner,
    ) -> Result<String, ClientError> {
        debug!(entry_point = %request.entry_point, "submission pipeline started");
        let tx = TransactionBuilder::new(self.rpc, self.config)
            .build(request)
            .await?;

        let mut step = Step::Built { tx };
        loop {
            step = match step {
                Step::Built { tx } => {
                    let envelope_b64 = tx.to_base64()?;
                    match self.rpc.simulate(&envelope_b64).await? {
                        SimulationResult::Success { .. } => {
                            debug!("simulation passed");
                            Step::Simulated { envelope_b64 }
                        }
                        SimulationResult::Rejected { diagnostic } => {
                            // no submission is attempted for a call the
                            // contract would reject anyway
                            return Err(ClientError::SimulationRejected(diagnostic));
                        }
                    }
                }
                Step::Simulated { envelope_b64 } => {
                    let signed_b64 = signer.sign(&envelope_b64).await?;
                    Step::AwaitingSignature { signed_b64 }
                }
                Step::AwaitingSignature { signed_b64 } => {
                    let envelope = SignedEnvelope::from_base64(&signed_b64)?;
                    let local_hash = envelope.hash_hex()?;
                    debug!(hash = %local_hash, "transaction signed, submitting");
                    let ack = self.rpc.submit(&signed_b64).await?;
                    if ack.status == "ERROR" {
                        return Err(ClientError::SubmissionFailed(ack.status));
                    }
                    Step::Pending {
                        hash: ack.hash,
                        attempt: 0,
                    }
                }
                Step::Pending { hash, attempt } => {
                    let attempt = attempt + 1;
                    match self.rpc.poll_status(&hash).await? {
                        TxStatus::Success => {
                            debug!(%hash, "transaction finalized");
                            return Ok(hash);
                        }
                        TxStatus::Failed { status } => {
                            return Err(ClientError::SubmissionFailed(status));
                        }
                        TxStatus::NotFound => {
                            // not yet included; keep polling within the bound
                            if attempt >= self.config.max_poll_attempts {
                                return Err(ClientError::Timeout(attempt));
                            }
                            sleep(self.config.poll_interval).await;
                            Step::Pending { hash, attempt }
                        }
                    }
                }
            };
        }
    }
}
