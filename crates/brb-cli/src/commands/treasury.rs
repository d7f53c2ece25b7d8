//! Treasury commands - initialize, mint, burn, pause, info

use brb_core::Amount;
use brb_treasury::{TreasuryRecord, TreasuryStatus};
use colored::*;

use super::{resolve_identity, Session};
use crate::display;

pub fn init(session: &Session, admin: &str) -> anyhow::Result<()> {
    display::section("Initialize Treasury");

    let faucet = session.faucet();
    if faucet.install(session.treasury.ledger().as_ref())? {
        display::info(&format!("Installed local {} mint", faucet.asset()));
    }

    let admin_address = resolve_identity(admin);
    let record = session
        .treasury
        .initialize(&admin_address, &session.treasury.config().reserve_asset)?;
    session.save()?;

    display::success("Treasury initialized");
    print_record(&record);
    display::kv("Admin", &display::identity(admin, &admin_address));
    Ok(())
}

pub fn mint(session: &Session, user: &str, amount: Amount) -> anyhow::Result<()> {
    display::section("Deposit and Mint");

    let treasury = session.treasury_address()?;
    let caller = resolve_identity(user);
    let record = session.treasury.mint(&treasury, &caller, amount)?;
    session.save()?;

    display::success(&format!(
        "Deposited {} and minted {}",
        display::amount(amount, record.reserve_asset.as_str()),
        display::amount(amount, &record.issued_symbol)
    ));
    print_holder(session, user)?;
    print_totals(&record);
    Ok(())
}

pub fn burn(session: &Session, user: &str, amount: Amount) -> anyhow::Result<()> {
    display::section("Burn and Redeem");

    let treasury = session.treasury_address()?;
    let caller = resolve_identity(user);
    let record = session.treasury.burn(&treasury, &caller, amount)?;
    session.save()?;

    display::success(&format!(
        "Burned {} and redeemed {}",
        display::amount(amount, &record.issued_symbol),
        display::amount(amount, record.reserve_asset.as_str())
    ));
    if record.is_paused {
        display::warning("Treasury is paused: redemption only");
    }
    print_holder(session, user)?;
    print_totals(&record);
    Ok(())
}

pub fn set_paused(session: &Session, admin: &str, paused: bool) -> anyhow::Result<()> {
    display::section(if paused { "Pause Treasury" } else { "Unpause Treasury" });

    let treasury = session.treasury_address()?;
    let record = session.treasury.set_paused(&treasury, &resolve_identity(admin), paused)?;
    session.save()?;

    if record.is_paused {
        display::success("Minting halted; redemption remains open");
    } else {
        display::success("Minting resumed");
    }
    Ok(())
}

pub fn info(session: &Session, json: bool) -> anyhow::Result<()> {
    let treasury = session.treasury_address()?;
    let view = session.treasury.view(&treasury)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let record = session.treasury.record(&treasury)?;
    display::section("Treasury");
    print_record(&record);
    display::kv("Admin", &view.admin.to_hex());
    print_totals(&record);

    let status = match view.status {
        TreasuryStatus::Active => "Active".bright_green(),
        TreasuryStatus::Paused => "Paused".bright_yellow(),
    };
    println!("      Status: {}", status);

    match view.collateral_ratio {
        Some(ratio) => display::kv("Collateral Ratio", &format!("{:.2}%", ratio * 100.0)),
        None => display::kv("Collateral Ratio", "n/a (nothing issued)"),
    }

    if !record.verify_derivation() {
        display::warning("Stored nonces do not re-derive the treasury addresses");
    }
    Ok(())
}

fn print_record(record: &TreasuryRecord) {
    display::kv("Treasury", &record.address.to_hex());
    display::kv("Reserve Vault", &record.reserve_vault.to_hex());
    display::kv("Mint Authority", &record.mint_authority.to_hex());
    display::kv("Issued Asset", &format!("{} ({})", record.issued_symbol, record.issued_asset));
    display::kv("Reserve Asset", record.reserve_asset.as_str());
}

fn print_totals(record: &TreasuryRecord) {
    display::kv(
        "Total Collateral",
        &display::amount(record.total_collateral, record.reserve_asset.as_str()),
    );
    display::kv(
        "Total Issued",
        &display::amount(record.total_issued_supply, &record.issued_symbol),
    );
}

fn print_holder(session: &Session, user: &str) -> anyhow::Result<()> {
    let treasury = session.treasury_address()?;
    let record = session.treasury.record(&treasury)?;
    let address = resolve_identity(user);
    let balances = session.treasury.balances(&treasury, &address)?;

    display::kv("Holder", &display::identity(user, &address));
    display::kv(
        "Reserve Balance",
        &display::amount(balances.reserve, record.reserve_asset.as_str()),
    );
    display::kv("Issued Balance", &display::amount(balances.issued, &record.issued_symbol));
    Ok(())
}
