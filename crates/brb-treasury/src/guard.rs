//! Admin guard

use brb_core::Address;
use tracing::warn;

use crate::error::{Result, TreasuryError};
use crate::record::TreasuryRecord;

/// Fail unless `caller` is the record's admin. Never mutates anything.
pub fn ensure_admin(record: &TreasuryRecord, caller: &Address) -> Result<()> {
    if &record.admin != caller {
        warn!(treasury = %record.address.short(), caller = %caller.short(), "Rejected admin call");
        return Err(TreasuryError::Unauthorized { caller: *caller });
    }
    Ok(())
}
