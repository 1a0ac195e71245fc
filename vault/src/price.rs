//! # Price Input
//!
//! The engine treats prices as an opaque, trusted input. Whatever feeds it
//! (a TWAP reader, a keeper's RPC call, a test fixture) implements
//! [`PriceInput`] and hands back a validated [`PriceSnapshot`].

use crate::error::Result;
use crate::math::{PriceSnapshot, Wad};

/// Supplies the current oracle prices on demand.
pub trait PriceInput {
    /// The current prices. Implementations must not return zero prices.
    fn prices(&self) -> Result<PriceSnapshot>;
}

/// A price input that always returns the same snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPrices {
    snapshot: PriceSnapshot,
}

impl StaticPrices {
    /// Fixed prices; zero prices are rejected here rather than on read.
    pub fn new(vol_base: Wad, base_stable: Wad) -> Result<Self> {
        Ok(Self {
            snapshot: PriceSnapshot::new(vol_base, base_stable)?,
        })
    }

    /// Replaces the snapshot, e.g. to simulate a market move.
    pub fn set(&mut self, snapshot: PriceSnapshot) -> Result<()> {
        snapshot.validate()?;
        self.snapshot = snapshot;
        Ok(())
    }
}

impl From<PriceSnapshot> for StaticPrices {
    fn from(snapshot: PriceSnapshot) -> Self {
        Self { snapshot }
    }
}

impl PriceInput for StaticPrices {
    fn prices(&self) -> Result<PriceSnapshot> {
        self.snapshot.validate()?;
        Ok(self.snapshot)
    }
}

impl<P: PriceInput + ?Sized> PriceInput for &P {
    fn prices(&self) -> Result<PriceSnapshot> {
        (**self).prices()
    }
}
