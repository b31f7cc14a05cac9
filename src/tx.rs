//! Transaction envelope types and their canonical wire encoding
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::error::ClientError;
use super::scval::ScVal;
use super::trade::Address;

/// An unsigned contract invocation. Inert data: nothing happens until the
/// signed envelope is submitted.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Transaction {
    #[n(0)]
    pub source: Address,
    #[n(1)]
    pub sequence: i64,
    #[n(2)]
    pub fee: u32,
    #[n(3)]
    pub timeout_secs: u32,
    #[n(4)]
    pub network_id: String,
    #[n(5)]
    pub contract_id: String,
    #[n(6)]
    pub entry_point: String,
    #[n(7)]
    pub args: Vec<ScVal>,
}

impl Transaction {
    /// Canonical encoded form handed to the signing collaborator and to the
    /// simulate endpoint.
    pub fn to_base64(&self) -> Result<String, ClientError> {
        let cbor = minicbor::to_vec(self)
            .map_err(|e| ClientError::Protocol(format!("transaction encoding failed: {e}")))?;
        Ok(BASE64.encode(cbor))
    }

    pub fn from_base64(payload: &str) -> Result<Self, ClientError> {
        let cbor = BASE64
            .decode(payload)
            .map_err(|e| ClientError::Protocol(format!("transaction is not base64: {e}")))?;
        minicbor::decode(&cbor)
            .map_err(|e| ClientError::Protocol(format!("transaction is not canonical cbor: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct Signature {
    /// Public key of the signing account.
    #[n(0)]
    pub hint: String,
    #[n(1)]
    #[cbor(with = "minicbor::bytes")]
    pub bytes: Vec<u8>,
}

/// A transaction plus the signatures the wallet collaborator attached.
#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct SignedEnvelope {
    #[n(0)]
    pub tx: Transaction,
    #[n(1)]
    pub signatures: Vec<Signature>,
}

impl SignedEnvelope {
    pub fn to_base64(&self) -> Result<String, ClientError> {
        let cbor = minicbor::to_vec(self)
            .map_err(|e| ClientError::Protocol(format!("envelope encoding failed: {e}")))?;
        Ok(BASE64.encode(cbor))
    }

    /// Decode and validate the payload returned by the signer. Anything the
    /// ledger would bounce (not base64, not a canonical envelope, no
    /// signature attached) is a [`ClientError::Signature`].
    pub fn from_base64(payload: &str) -> Result<Self, ClientError> {
        let cbor = BASE64
            .decode(payload)
            .map_err(|e| ClientError::Signature(format!("signed payload is not base64: {e}")))?;
        let envelope: SignedEnvelope = minicbor::decode(&cbor).map_err(|e| {
            ClientError::Signature(format!("signed payload is not a canonical envelope: {e}"))
        })?;
        if envelope.signatures.is_empty() {
            return Err(ClientError::Signature(
                "envelope carries no signatures".to_string(),
            ));
        }
        Ok(envelope)
    }

    /// Hash of the canonical signed bytes, hex-encoded. The ledger reports
    /// the same identifier in its submit acknowledgement.
    pub fn hash_hex(&self) -> Result<String, ClientError> {
        let cbor = minicbor::to_vec(self)
            .map_err(|e| ClientError::Protocol(format!("envelope encoding failed: {e}")))?;
        Ok(sha256::digest(&cbor))
    }
}
