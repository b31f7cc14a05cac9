//! Core trade record and ledger address types
use chrono::{DateTime, Utc};

use super::error::ClientError;
use super::scval::ScVal;

// Trade lifecycle states as stored by the contract. State only moves
// forward through this order for a given trade id.
pub const ORDERED: u32 = 0;
pub const FULFILLED: u32 = 1;
pub const SETTLED: u32 = 2;
pub const REJECTED: u32 = 3;
pub const CANCELLED: u32 = 4;

/// Which side of a trade a participant address is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Buyer,
    Seller,
}

/// A ledger account identifier: `G` followed by 55 base-32 characters.
/// Addresses are not case-sensitive in the contract's encoding, so the
/// original casing is kept and comparison goes through [`Address::eq_ignore_case`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address(String);

const ADDRESS_LEN: usize = 56;

/// Placeholder account satisfying the envelope requirement of a read-only
/// simulate call. Never funded, never signs anything.
pub const PLACEHOLDER_ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

impl Address {
    pub fn parse(s: &str) -> Result<Self, ClientError> {
        if s.len() != ADDRESS_LEN {
            return Err(ClientError::Decode(format!(
                "malformed ledger address '{s}': expected {ADDRESS_LEN} characters"
            )));
        }
        let mut chars = s.chars();
        if !chars.next().is_some_and(|c| c.eq_ignore_ascii_case(&'G')) {
            return Err(ClientError::Decode(format!(
                "malformed ledger address '{s}': must start with 'G'"
            )));
        }
        if !chars.all(|c| c.is_ascii_alphabetic() || ('2'..='7').contains(&c)) {
            return Err(ClientError::Decode(format!(
                "malformed ledger address '{s}': not base-32"
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn placeholder() -> Self {
        Self(PLACEHOLDER_ACCOUNT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<C> minicbor::Encode<C> for Address {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(&self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Address {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Address::parse(d.str()?)
            .map_err(|_| minicbor::decode::Error::message("address is malformed"))
    }
}

/// Immutable snapshot of one escrow trade, re-fetched from the ledger on
/// every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub trade_id: u32,
    pub buyer: Address,
    pub seller: Address,
    pub amount: i128,
    pub state: u32,
    pub product_type: String,
    pub description: String,
    pub created_at: Option<u64>,
}

fn field<'a>(record: &'a ScVal, key: &str) -> Result<&'a ScVal, ClientError> {
    record
        .map_get(key)
        .ok_or_else(|| ClientError::Decode(format!("trade record is missing field '{key}'")))
}

fn type_mismatch(key: &str, expected: &str, got: &ScVal) -> ClientError {
    ClientError::Decode(format!(
        "trade field '{key}': expected {expected}, got {}",
        got.kind()
    ))
}

impl Trade {
    /// Decode one trade record from the contract's return value. Fails fast
    /// on any unexpected shape; unknown extra map keys are tolerated since
    /// the contract stores more bookkeeping than the client surfaces.
    pub fn from_scval(record: &ScVal) -> Result<Self, ClientError> {
        if !matches!(record, ScVal::Map(_)) {
            return Err(ClientError::Decode(format!(
                "trade record must be a map, got {}",
                record.kind()
            )));
        }

        let trade_id = field(record, "trade_id")?;
        let trade_id = trade_id
            .as_u32()
            .ok_or_else(|| type_mismatch("trade_id", "u32", trade_id))?;

        let buyer = field(record, "buyer")?;
        let buyer = buyer
            .as_address()
            .ok_or_else(|| type_mismatch("buyer", "address", buyer))?
            .clone();

        let seller = field(record, "seller")?;
        let seller = seller
            .as_address()
            .ok_or_else(|| type_mismatch("seller", "address", seller))?
            .clone();

        let amount = field(record, "amount")?;
        let amount = amount
            .as_i128()
            .ok_or_else(|| type_mismatch("amount", "i128", amount))?;
        if amount < 0 {
            return Err(ClientError::Decode(format!(
                "trade {trade_id} carries a negative amount"
            )));
        }

        let state = field(record, "state")?;
        let state = state
            .as_u32()
            .ok_or_else(|| type_mismatch("state", "u32", state))?;

        let product_type = field(record, "product_type")?;
        let product_type = product_type
            .as_str()
            .ok_or_else(|| type_mismatch("product_type", "str", product_type))?
            .to_string();

        let description = field(record, "description")?;
        let description = description
            .as_str()
            .ok_or_else(|| type_mismatch("description", "str", description))?
            .to_string();

        // created_at is optional: older records predate the field
        let created_at = match record.map_get("created_at") {
            None => None,
            Some(val) => Some(
                val.as_u64()
                    .ok_or_else(|| type_mismatch("created_at", "u64", val))?,
            ),
        };

        Ok(Self {
            trade_id,
            buyer,
            seller,
            amount,
            state,
            product_type,
            description,
            created_at,
        })
    }

    /// Encode back into the contract's record shape. The inverse of
    /// [`Trade::from_scval`]; mainly feeds fixtures and fake ledgers.
    pub fn to_scval(&self) -> ScVal {
        let mut entries = vec![
            (ScVal::sym("trade_id"), ScVal::U32(self.trade_id)),
            (ScVal::sym("buyer"), ScVal::Address(self.buyer.clone())),
            (ScVal::sym("seller"), ScVal::Address(self.seller.clone())),
            (ScVal::sym("amount"), ScVal::I128(self.amount)),
            (ScVal::sym("state"), ScVal::U32(self.state)),
            (
                ScVal::sym("product_type"),
                ScVal::Str(self.product_type.clone()),
            ),
            (
                ScVal::sym("description"),
                ScVal::Str(self.description.clone()),
            ),
        ];
        if let Some(ts) = self.created_at {
            entries.push((ScVal::sym("created_at"), ScVal::U64(ts)));
        }
        ScVal::Map(entries)
    }

    /// State strictly below the terminal settled value.
    pub fn is_active(&self) -> bool {
        self.state < SETTLED
    }

    pub fn is_completed(&self) -> bool {
        self.state == SETTLED
    }

    pub fn participant(&self, role: Role) -> &Address {
        match role {
            Role::Buyer => &self.buyer,
            Role::Seller => &self.seller,
        }
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
    }
}
