//! Property-based tests for treasury invariants
//!
//! Random operation sequences must keep:
//! - Peg: total_collateral == total_issued_supply
//! - Backing: vault balance == total_collateral, mint supply == total_issued_supply
//! - Conservation: every user's reserve + issued stays at its starting amount
//! - Failure atomicity: a rejected operation changes nothing

use std::sync::Arc;

use brb_core::{Address, Amount, AssetId, Keypair};
use brb_ledger::{InMemoryLedger, LedgerService};
use brb_treasury::{ReserveFaucet, Treasury, TreasuryConfig};
use proptest::prelude::*;

const USERS: usize = 3;
const STARTING_RESERVE: u64 = 1_000_000;

#[derive(Debug, Clone)]
enum Op {
    Mint { user: usize, amount: u64 },
    Burn { user: usize, amount: u64 },
    Pause { by_admin: bool, paused: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..USERS, 0u64..600_000).prop_map(|(user, amount)| Op::Mint { user, amount }),
        3 => (0..USERS, 0u64..600_000).prop_map(|(user, amount)| Op::Burn { user, amount }),
        1 => (any::<bool>(), any::<bool>()).prop_map(|(by_admin, paused)| Op::Pause { by_admin, paused }),
    ]
}

struct World {
    treasury: Treasury<InMemoryLedger>,
    address: Address,
    admin: Address,
    users: Vec<Address>,
}

fn world() -> World {
    let ledger = Arc::new(InMemoryLedger::new());
    let faucet = ReserveFaucet::new(AssetId::usdc());
    faucet.install(ledger.as_ref()).unwrap();

    let users: Vec<Address> = (0..USERS)
        .map(|i| Keypair::from_label(&format!("prop-user-{}", i)).address())
        .collect();
    for user in &users {
        faucet
            .drip(ledger.as_ref(), user, Amount::new(STARTING_RESERVE))
            .unwrap();
    }

    let treasury = Treasury::new(TreasuryConfig::default(), ledger).unwrap();
    let admin = Keypair::from_label("prop-admin").address();
    let address = treasury.initialize(&admin, &AssetId::usdc()).unwrap().address;

    World {
        treasury,
        address,
        admin,
        users,
    }
}

fn snapshot(w: &World) -> (brb_treasury::TreasuryRecord, Vec<(Amount, Amount)>) {
    let record = w.treasury.record(&w.address).unwrap();
    let balances = w
        .users
        .iter()
        .map(|u| {
            let b = w.treasury.balances(&w.address, u).unwrap();
            (b.reserve, b.issued)
        })
        .collect();
    (record, balances)
}

proptest! {
    #[test]
    fn prop_treasury_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let w = world();

        for op in ops {
            let before = snapshot(&w);
            let result = match op {
                Op::Mint { user, amount } => w.treasury.mint(&w.address, &w.users[user], Amount::new(amount)),
                Op::Burn { user, amount } => w.treasury.burn(&w.address, &w.users[user], Amount::new(amount)),
                Op::Pause { by_admin, paused } => {
                    let caller = if by_admin { w.admin } else { w.users[0] };
                    w.treasury.set_paused(&w.address, &caller, paused)
                }
            };

            let after = snapshot(&w);
            if result.is_err() {
                prop_assert_eq!(&after, &before);
            }

            let record = &after.0;
            prop_assert_eq!(record.total_collateral, record.total_issued_supply);

            let ledger = w.treasury.ledger();
            prop_assert_eq!(
                ledger.balance(&record.reserve_vault, &record.reserve_asset),
                record.total_collateral
            );
            prop_assert_eq!(ledger.supply(&record.issued_asset), Some(record.total_issued_supply));

            let issued_sum: u64 = after.1.iter().map(|(_, issued)| issued.0).sum();
            prop_assert_eq!(issued_sum, record.total_issued_supply.0);
            for (reserve, issued) in &after.1 {
                prop_assert_eq!(reserve.0 + issued.0, STARTING_RESERVE);
            }
        }
    }

    #[test]
    fn prop_mint_then_burn_restores_balances(amount in 1u64..=STARTING_RESERVE) {
        let w = world();
        let user = w.users[0];
        let before = w.treasury.balances(&w.address, &user).unwrap();

        w.treasury.mint(&w.address, &user, Amount::new(amount)).unwrap();
        w.treasury.burn(&w.address, &user, Amount::new(amount)).unwrap();

        prop_assert_eq!(w.treasury.balances(&w.address, &user).unwrap(), before);
        let record = w.treasury.record(&w.address).unwrap();
        prop_assert!(record.total_collateral.is_zero());
    }
}
