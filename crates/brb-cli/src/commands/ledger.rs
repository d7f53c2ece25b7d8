//! Ledger commands - faucet, balances and history

use brb_core::Amount;
use colored::*;

use super::{resolve_identity, Session};
use crate::display;

/// Fund a demo identity with the reserve asset
pub fn faucet(session: &Session, to: &str, amount: Amount) -> anyhow::Result<()> {
    display::section("Reserve Faucet");

    let faucet = session.faucet();
    let ledger = session.treasury.ledger();
    faucet.install(ledger.as_ref())?;

    let address = resolve_identity(to);
    let balance = faucet.drip(ledger.as_ref(), &address, amount)?;
    session.save()?;

    display::success(&format!(
        "Sent {} to {}",
        display::amount(amount, faucet.asset().as_str()),
        display::identity(to, &address)
    ));
    display::kv("Balance", &display::amount(balance, faucet.asset().as_str()));
    Ok(())
}

pub fn balance(session: &Session, user: &str) -> anyhow::Result<()> {
    let treasury = session.treasury_address()?;
    let record = session.treasury.record(&treasury)?;
    let address = resolve_identity(user);
    let balances = session.treasury.balances(&treasury, &address)?;

    display::section(&format!("Balances: {}", user));
    display::kv("Address", &address.to_hex());
    display::kv(
        record.reserve_asset.as_str(),
        &balances.reserve.to_string(),
    );
    display::kv(&record.issued_symbol, &balances.issued.to_string());
    Ok(())
}

pub fn history(session: &Session, user: &str, limit: usize) -> anyhow::Result<()> {
    let treasury = session.treasury_address()?;
    let record = session.treasury.record(&treasury)?;
    let address = resolve_identity(user);
    let entries = session.treasury.ledger().account_entries(&address);

    display::section(&format!("History: {}", user));
    if entries.is_empty() {
        display::info("No ledger entries");
        return Ok(());
    }

    for entry in entries.iter().rev().take(limit) {
        let symbol = if entry.asset == record.issued_asset {
            record.issued_symbol.as_str()
        } else {
            entry.asset.as_str()
        };
        let amount = display::amount(entry.amount, symbol);
        let amount = match entry.entry_type {
            brb_ledger::EntryType::Credit => format!("+{}", amount).bright_green(),
            brb_ledger::EntryType::Debit => format!("-{}", amount).bright_red(),
        };
        println!(
            "  {}  {:<9} {:>28}  balance {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string().bright_black(),
            format!("{:?}", entry.reason),
            amount,
            entry.balance_after
        );
    }
    if entries.len() > limit {
        display::info(&format!("{} older entries not shown", entries.len() - limit));
    }
    Ok(())
}
