//! Per-participant statistics derived from the raw trade set
use std::collections::HashMap;

use super::trade::{Role, Trade};

/// Buyer or seller aggregate. Recomputed from the current trade set on
/// every read, never mutated directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSummary {
    pub address: String,
    pub active_trades: u32,
    pub completed_trades: u32,
    pub total_trade_value: i128,
}

fn aggregate(trades: &[Trade], role: Role) -> Vec<ParticipantSummary> {
    let mut by_address: HashMap<String, ParticipantSummary> = HashMap::new();
    for trade in trades {
        let address = trade.participant(role).as_str();
        let summary = by_address
            .entry(address.to_string())
            .or_insert_with(|| ParticipantSummary {
                address: address.to_string(),
                active_trades: 0,
                completed_trades: 0,
                total_trade_value: 0,
            });
        if trade.is_completed() {
            summary.completed_trades += 1;
        } else if trade.is_active() {
            summary.active_trades += 1;
        }
        // any state outside the active/completed split still carries value
        summary.total_trade_value += trade.amount;
    }
    by_address.into_values().collect()
}

/// One summary per distinct buyer address. Output order is not significant.
pub fn aggregate_by_buyer(trades: &[Trade]) -> Vec<ParticipantSummary> {
    aggregate(trades, Role::Buyer)
}

/// One summary per distinct seller address. Output order is not significant.
pub fn aggregate_by_seller(trades: &[Trade]) -> Vec<ParticipantSummary> {
    aggregate(trades, Role::Seller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::{Address, ORDERED, REJECTED, SETTLED};

    fn addr(c: char) -> Address {
        let mut s = String::from("G");
        s.extend(std::iter::repeat(c).take(55));
        Address::parse(&s).unwrap()
    }

    fn trade(buyer: char, seller: char, state: u32, amount: i128) -> Trade {
        Trade {
            trade_id: 0,
            buyer: addr(buyer),
            seller: addr(seller),
            amount,
            state,
            product_type: "grain".into(),
            description: "bulk".into(),
            created_at: None,
        }
    }

    fn by_address(summaries: Vec<ParticipantSummary>) -> HashMap<String, ParticipantSummary> {
        summaries
            .into_iter()
            .map(|s| (s.address.clone(), s))
            .collect()
    }

    #[test]
    fn one_settled_one_ordered_buyer() {
        let trades = vec![
            trade('A', 'S', SETTLED, 100),
            trade('A', 'S', ORDERED, 50),
        ];
        let summaries = aggregate_by_buyer(&trades);
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.address, addr('A').as_str());
        assert_eq!(summary.active_trades, 1);
        assert_eq!(summary.completed_trades, 1);
        assert_eq!(summary.total_trade_value, 150);
    }

    #[test]
    fn distinct_addresses_get_distinct_summaries() {
        let trades = vec![
            trade('A', 'S', ORDERED, 10),
            trade('B', 'S', ORDERED, 20),
            trade('A', 'T', SETTLED, 30),
        ];
        let buyers = by_address(aggregate_by_buyer(&trades));
        assert_eq!(buyers.len(), 2);
        assert_eq!(buyers[addr('A').as_str()].total_trade_value, 40);
        assert_eq!(buyers[addr('B').as_str()].total_trade_value, 20);

        let sellers = by_address(aggregate_by_seller(&trades));
        assert_eq!(sellers.len(), 2);
        assert_eq!(sellers[addr('S').as_str()].total_trade_value, 30);
        assert_eq!(sellers[addr('T').as_str()].total_trade_value, 30);
    }

    #[test]
    fn out_of_range_state_counts_value_only() {
        let trades = vec![
            trade('A', 'S', 99, 10),
            trade('A', 'S', REJECTED, 5),
        ];
        let summaries = aggregate_by_buyer(&trades);
        let summary = &summaries[0];
        assert_eq!(summary.active_trades, 0);
        assert_eq!(summary.completed_trades, 0);
        assert_eq!(summary.total_trade_value, 15);
    }

    #[test]
    fn empty_set_aggregates_to_nothing() {
        assert!(aggregate_by_buyer(&[]).is_empty());
        assert!(aggregate_by_seller(&[]).is_empty());
    }
}
