//! Property-based tests for the trade record codec
//!
//! The decode path is the most failure-prone step of the read side, so these
//! properties pin down that it is the exact inverse of the record encoding
//! and that it fails loudly instead of coercing bad shapes.
use proptest::prelude::*;

use marketplace_client::scval::ScVal;
use marketplace_client::trade::{Address, Trade};

// PROPERTY TEST STRATEGIES

/// Strategy to generate valid ledger addresses from the base-32 alphabet
fn address_strategy() -> impl Strategy<Value = Address> {
    "[A-Z2-7]{55}".prop_map(|tail| Address::parse(&format!("G{tail}")).unwrap())
}

/// Strategy to generate printable descriptive strings
fn text_strategy() -> impl Strategy<Value = String> {
    "[ -~]{0,40}"
}

fn trade_strategy() -> impl Strategy<Value = Trade> {
    (
        any::<u32>(),
        address_strategy(),
        address_strategy(),
        0i128..=i128::MAX,
        any::<u32>(),
        text_strategy(),
        text_strategy(),
        proptest::option::of(any::<u64>()),
    )
        .prop_map(
            |(trade_id, buyer, seller, amount, state, product_type, description, created_at)| {
                Trade {
                    trade_id,
                    buyer,
                    seller,
                    amount,
                    state,
                    product_type,
                    description,
                    created_at,
                }
            },
        )
}

// PROPERTY TESTS
proptest! {
    /// Property: encoding a trade record and decoding it back yields the
    /// identical record
    #[test]
    fn record_roundtrip_is_identity(trade in trade_strategy()) {
        let decoded = Trade::from_scval(&trade.to_scval()).unwrap();
        prop_assert_eq!(decoded, trade);
    }

    /// Property: the identity holds through the canonical binary form and
    /// its base64 transport wrapping as well
    #[test]
    fn record_roundtrip_through_transport(trade in trade_strategy()) {
        let wrapped = trade.to_scval().to_base64().unwrap();
        let decoded = Trade::from_scval(&ScVal::from_base64(&wrapped).unwrap()).unwrap();
        prop_assert_eq!(decoded, trade);
    }

    /// Property: dropping any required field makes the decode fail rather
    /// than produce a partial record
    #[test]
    fn missing_required_field_fails(trade in trade_strategy(), victim in 0usize..7) {
        let ScVal::Map(mut entries) = trade.to_scval() else { unreachable!() };
        entries.remove(victim);
        prop_assert!(Trade::from_scval(&ScVal::Map(entries)).is_err());
    }

    /// Property: a negative amount never decodes
    #[test]
    fn negative_amount_fails(trade in trade_strategy(), amount in i128::MIN..0) {
        let ScVal::Map(mut entries) = trade.to_scval() else { unreachable!() };
        for entry in entries.iter_mut() {
            if entry.0 == ScVal::sym("amount") {
                entry.1 = ScVal::I128(amount);
            }
        }
        prop_assert!(Trade::from_scval(&ScVal::Map(entries)).is_err());
    }
}
