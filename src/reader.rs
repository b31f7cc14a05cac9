//! Read-only access to the contract's trade set.
//!
//! Reads are simulated calls: no signature, no submission, no state change.
//! The envelope is built against a placeholder account that exists only to
//! satisfy the simulate call's shape.
use tracing::debug;

use super::builder::{GET_ALL_TRADES, GET_TRADE, TransactionBuilder, TransactionRequest};
use super::config::ClientConfig;
use super::error::ClientError;
use super::rpc::{LedgerRpc, SimulationResult};
use super::scval::ScVal;
use super::trade::{Address, Role, SETTLED, Trade};

pub struct TradeReader<'a> {
    rpc: &'a dyn LedgerRpc,
    config: &'a ClientConfig,
}

impl<'a> TradeReader<'a> {
    pub fn new(rpc: &'a dyn LedgerRpc, config: &'a ClientConfig) -> Self {
        Self { rpc, config }
    }

    async fn read_call(
        &self,
        entry_point: &str,
        args: Vec<ScVal>,
    ) -> Result<Option<ScVal>, ClientError> {
        let request = TransactionRequest::new(entry_point, args, Address::placeholder());
        let tx = TransactionBuilder::new(self.rpc, self.config).assemble(&request, 0)?;
        match self.rpc.simulate(&tx.to_base64()?).await? {
            SimulationResult::Success { retval } => Ok(retval),
            SimulationResult::Rejected { diagnostic } => {
                Err(ClientError::SimulationRejected(diagnostic))
            }
        }
    }

    /// Fetch the full trade set. An absent return value is a valid empty
    /// marketplace. A record that fails to decode fails the whole call: a
    /// partially decoded set would be indistinguishable from a smaller
    /// marketplace.
    pub async fn fetch_all(&self) -> Result<Vec<Trade>, ClientError> {
        let retval = self.read_call(GET_ALL_TRADES, vec![]).await?;
        let Some(val) = retval else {
            debug!("contract returned no trade set");
            return Ok(Vec::new());
        };
        let records = val.as_vec().ok_or_else(|| {
            ClientError::Decode(format!("trade set must be a vec, got {}", val.kind()))
        })?;
        let trades = records
            .iter()
            .map(Trade::from_scval)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = trades.len(), "decoded trade set");
        Ok(trades)
    }

    /// Fetch one trade by id. A rejection from the contract means the id is
    /// unknown, which is an empty outcome rather than an error.
    pub async fn fetch_trade(&self, trade_id: u32) -> Result<Option<Trade>, ClientError> {
        match self.read_call(GET_TRADE, vec![ScVal::U32(trade_id)]).await {
            Ok(None) => Ok(None),
            Ok(Some(val)) => Ok(Some(Trade::from_scval(&val)?)),
            Err(ClientError::SimulationRejected(_)) => Ok(None),
            Err(other) => Err(other),
        }
    }
}

/// Pure filter over an already-fetched set. Address comparison ignores case;
/// an empty address matches nothing.
pub fn filter_by_participant(trades: &[Trade], role: Role, address: &str) -> Vec<Trade> {
    if address.is_empty() {
        return Vec::new();
    }
    trades
        .iter()
        .filter(|t| t.participant(role).eq_ignore_case(address))
        .cloned()
        .collect()
}

/// A seller's open listings: trades still moving toward settlement.
pub fn seller_listings(trades: &[Trade], address: &str) -> Vec<Trade> {
    filter_by_participant(trades, Role::Seller, address)
        .into_iter()
        .filter(|t| t.state < SETTLED)
        .collect()
}

/// A buyer's instruments: trades within the forward lifecycle, settled
/// included; rejected and cancelled trades fall outside it.
pub fn buyer_instruments(trades: &[Trade], address: &str) -> Vec<Trade> {
    filter_by_participant(trades, Role::Buyer, address)
        .into_iter()
        .filter(|t| t.state <= SETTLED)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{AccountState, SubmitAck, TxStatus};
    use crate::trade::{CANCELLED, ORDERED, SETTLED};
    use async_trait::async_trait;

    struct ReadOnlyLedger {
        simulation: SimulationResult,
    }

    #[async_trait]
    impl LedgerRpc for ReadOnlyLedger {
        async fn simulate(&self, _: &str) -> Result<SimulationResult, ClientError> {
            Ok(self.simulation.clone())
        }
        async fn submit(&self, _: &str) -> Result<SubmitAck, ClientError> {
            unimplemented!("reads never submit")
        }
        async fn poll_status(&self, _: &str) -> Result<TxStatus, ClientError> {
            unimplemented!("reads never poll")
        }
        async fn fetch_account(&self, _: &Address) -> Result<Option<AccountState>, ClientError> {
            unimplemented!("reads use the placeholder account")
        }
    }

    fn addr(c: char) -> Address {
        let mut s = String::from("G");
        s.extend(std::iter::repeat(c).take(55));
        Address::parse(&s).unwrap()
    }

    fn trade(id: u32, buyer: char, seller: char, state: u32) -> Trade {
        Trade {
            trade_id: id,
            buyer: addr(buyer),
            seller: addr(seller),
            amount: 100,
            state,
            product_type: "grain".into(),
            description: "bulk".into(),
            created_at: None,
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost:1337", "test net", "CDMAW")
    }

    #[tokio::test]
    async fn empty_retval_is_an_empty_marketplace() {
        let cfg = config();
        let ledger = ReadOnlyLedger {
            simulation: SimulationResult::Success { retval: None },
        };
        let reader = TradeReader::new(&ledger, &cfg);
        assert_eq!(reader.fetch_all().await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn decodes_the_full_set() {
        let cfg = config();
        let trades = vec![trade(1, 'A', 'B', ORDERED), trade(2, 'C', 'D', SETTLED)];
        let ledger = ReadOnlyLedger {
            simulation: SimulationResult::Success {
                retval: Some(ScVal::Vec(trades.iter().map(Trade::to_scval).collect())),
            },
        };
        let reader = TradeReader::new(&ledger, &cfg);
        assert_eq!(reader.fetch_all().await.unwrap(), trades);
    }

    #[tokio::test]
    async fn one_bad_record_fails_the_whole_fetch() {
        let cfg = config();
        let ledger = ReadOnlyLedger {
            simulation: SimulationResult::Success {
                retval: Some(ScVal::Vec(vec![
                    trade(1, 'A', 'B', ORDERED).to_scval(),
                    ScVal::U32(7),
                ])),
            },
        };
        let reader = TradeReader::new(&ledger, &cfg);
        assert!(matches!(
            reader.fetch_all().await,
            Err(ClientError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn non_vec_retval_fails_decode() {
        let cfg = config();
        let ledger = ReadOnlyLedger {
            simulation: SimulationResult::Success {
                retval: Some(ScVal::Str("surprise".into())),
            },
        };
        let reader = TradeReader::new(&ledger, &cfg);
        assert!(matches!(
            reader.fetch_all().await,
            Err(ClientError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn unknown_trade_id_is_empty_not_an_error() {
        let cfg = config();
        let ledger = ReadOnlyLedger {
            simulation: SimulationResult::Rejected {
                diagnostic: "trade not found".into(),
            },
        };
        let reader = TradeReader::new(&ledger, &cfg);
        assert_eq!(reader.fetch_trade(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn fetches_one_trade() {
        let cfg = config();
        let expected = trade(42, 'A', 'B', ORDERED);
        let ledger = ReadOnlyLedger {
            simulation: SimulationResult::Success {
                retval: Some(expected.to_scval()),
            },
        };
        let reader = TradeReader::new(&ledger, &cfg);
        assert_eq!(reader.fetch_trade(42).await.unwrap(), Some(expected));
    }

    #[test]
    fn participant_filter_ignores_case() {
        let trades = vec![trade(1, 'A', 'B', ORDERED), trade(2, 'C', 'B', ORDERED)];
        let lower = addr('A').as_str().to_lowercase();
        let hits = filter_by_participant(&trades, Role::Buyer, &lower);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].trade_id, 1);
    }

    #[test]
    fn empty_address_matches_nothing() {
        let trades = vec![trade(1, 'A', 'B', ORDERED)];
        assert!(filter_by_participant(&trades, Role::Buyer, "").is_empty());
    }

    #[test]
    fn listings_and_instruments_cut_by_state() {
        let trades = vec![
            trade(1, 'A', 'B', ORDERED),
            trade(2, 'A', 'B', SETTLED),
            trade(3, 'A', 'B', CANCELLED),
        ];
        let seller = addr('B');
        let listings = seller_listings(&trades, seller.as_str());
        assert_eq!(listings.iter().map(|t| t.trade_id).collect::<Vec<_>>(), [1]);

        let buyer = addr('A');
        let instruments = buyer_instruments(&trades, buyer.as_str());
        assert_eq!(
            instruments.iter().map(|t| t.trade_id).collect::<Vec<_>>(),
            [1, 2]
        );
    }
}
