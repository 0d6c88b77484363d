//! Property tests for inventory and money accounting.
//!
//! Random batch shapes and settlement sequences must never oversell a
//! class, drift the sold counters, or lose a cent between escrow, platform
//! revenue, and gateway transfers.
//!
//! Run with: `cargo test --test accounting_properties`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use boxoffice_core::{AccountId, ClassId, EventId, MarketError, Money};
use boxoffice_testing::TestMarket;
use boxoffice_testing::assertions::{assert_inventory_consistent, assert_money_conserved};
use boxoffice_testing::properties::{prices, quantities};
use proptest::prelude::*;

/// Class quantities with matching per-class prices in cents.
fn sale_batch() -> impl Strategy<Value = (Vec<u32>, Vec<u64>)> {
    quantities(6, 40).prop_flat_map(|qtys| {
        let len = qtys.len();
        (Just(qtys), prices(len, 2_000))
    })
}

/// Lists an event with one class per quantity, minting `multiplier` times
/// the quantity of each.
fn listed(
    test: &TestMarket,
    qtys: &[u32],
    cents: &[u64],
    multiplier: u32,
) -> (AccountId, EventId, Vec<ClassId>) {
    let organizer = test.register("organizer");
    let event_id = test
        .market
        .create_event(organizer, test.details("Prop Gala"))
        .unwrap();
    let ids: Vec<ClassId> = (1..=qtys.len())
        .map(|i| ClassId::new(u64::try_from(i).unwrap()))
        .collect();
    let supply: Vec<u32> = qtys.iter().map(|q| q * multiplier).collect();
    let money: Vec<Money> = cents.iter().copied().map(Money::from_cents).collect();
    test.market
        .create_ticket_classes(event_id, organizer, &ids, &supply, &money)
        .unwrap();
    (organizer, event_id, ids)
}

fn quoted_total(qtys: &[u32], cents: &[u64]) -> u64 {
    qtys.iter().zip(cents).map(|(q, c)| u64::from(*q) * c).sum()
}

proptest! {
    #[test]
    fn full_sellout_conserves_every_cent((qtys, cents) in sale_batch()) {
        let test = TestMarket::new();
        let (_organizer, event_id, ids) = listed(&test, &qtys, &cents, 1);
        let buyer = test.register("buyer");
        let total = Money::from_cents(quoted_total(&qtys, &cents));

        let charged = test
            .market
            .buy_ticket(event_id, buyer, &ids, &qtys, total)
            .unwrap();
        prop_assert_eq!(charged, total);

        for (class_id, class) in test.market.ticket_classes(event_id) {
            prop_assert_eq!(class.available(), 0, "class {} not sold out", class_id);
        }
        let err = test
            .market
            .buy_ticket(event_id, buyer, &ids[..1], &[1], Money::from_cents(cents[0]))
            .unwrap_err();
        prop_assert!(
            matches!(err, MarketError::InsufficientSupply { .. }),
            "assertion failed: matches!(err, MarketError::InsufficientSupply {{ .. }})"
        );

        assert_inventory_consistent(&test, event_id);
        assert_money_conserved(&test, total);
    }

    #[test]
    fn one_shot_refund_drains_escrow_exactly((qtys, cents) in sale_batch()) {
        let test = TestMarket::new();
        let (organizer, event_id, ids) = listed(&test, &qtys, &cents, 1);
        let buyer = test.register("buyer");
        let total = Money::from_cents(quoted_total(&qtys, &cents));
        test.market
            .buy_ticket(event_id, buyer, &ids, &qtys, total)
            .unwrap();
        let escrowed = test.market.escrow_balance(event_id);

        test.market.cancel_event(event_id, organizer).unwrap();
        let refunded = test.market.refund(event_id, buyer, &ids, &qtys).unwrap();

        // Refunding the exact purchase batch quotes the same gross, so the
        // escrowed share comes back to the cent.
        prop_assert_eq!(refunded, escrowed);
        prop_assert_eq!(test.market.escrow_balance(event_id), Money::zero());
        prop_assert_eq!(test.market.total_sold(event_id), 0);
        assert_inventory_consistent(&test, event_id);
        assert_money_conserved(&test, total);
    }

    #[test]
    fn per_class_refunds_fit_inside_escrow((qtys, cents) in sale_batch()) {
        let test = TestMarket::new();
        let (organizer, event_id, ids) = listed(&test, &qtys, &cents, 1);
        let buyer = test.register("buyer");
        let total = Money::from_cents(quoted_total(&qtys, &cents));
        test.market
            .buy_ticket(event_id, buyer, &ids, &qtys, total)
            .unwrap();
        test.market.cancel_event(event_id, organizer).unwrap();

        // Per-line shares floor individually, so class-by-class refunds can
        // never ask the escrow for more than the purchase put in.
        for (i, class_id) in ids.iter().enumerate() {
            let refunded = test.market.refund(event_id, buyer, &[*class_id], &[qtys[i]]);
            prop_assert!(
                refunded.is_ok(),
                "refund of class {} failed: {:?}",
                class_id,
                refunded
            );
        }
        prop_assert_eq!(test.market.total_sold(event_id), 0);
        assert_inventory_consistent(&test, event_id);
        assert_money_conserved(&test, total);
    }

    #[test]
    fn mixed_buyers_keep_counters_in_step((qtys, cents) in sale_batch()) {
        let test = TestMarket::new();
        let (organizer, event_id, ids) = listed(&test, &qtys, &cents, 2);
        let alice = test.register("alice");
        let bob = test.register("bob");
        let total = Money::from_cents(quoted_total(&qtys, &cents));

        test.market
            .buy_ticket(event_id, alice, &ids, &qtys, total)
            .unwrap();
        assert_inventory_consistent(&test, event_id);
        test.market
            .buy_ticket(event_id, bob, &ids, &qtys, total)
            .unwrap();
        assert_inventory_consistent(&test, event_id);

        test.market.cancel_event(event_id, organizer).unwrap();
        test.market.refund(event_id, alice, &ids, &qtys).unwrap();

        for (i, class_id) in ids.iter().enumerate() {
            prop_assert_eq!(test.market.balance_of(event_id, &alice, *class_id), 0);
            prop_assert_eq!(test.market.balance_of(event_id, &bob, *class_id), qtys[i]);
        }
        assert_inventory_consistent(&test, event_id);
        assert_money_conserved(&test, Money::from_cents(quoted_total(&qtys, &cents) * 2));
    }

    #[test]
    fn percentage_share_never_exceeds_the_whole(
        cents in 0u64..=1_000_000_000,
        share in 0u8..=100,
    ) {
        let money = Money::from_cents(cents);
        let part = money.checked_percentage(share).unwrap();
        prop_assert!(part <= money);

        let rest = money.checked_sub(part).unwrap();
        prop_assert_eq!(rest.checked_add(part).unwrap(), money);
    }
}
