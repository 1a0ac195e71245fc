//! # Rebalance Gate
//!
//! Decides whether a rebalance auction may run, and owns the auction anchor
//! while one does.
//!
//! ```text
//!             is_time_rebalance()            successful rebalance
//!   ┌──────┐ ─────────────────────► ┌───────┐ ──────────────────► ┌──────┐
//!   │ Idle │                        │ Armed │                     │ Idle │ ...
//!   └──────┘ ◄───────────────────── └───────┘ ◄─┐                 └──────┘
//!              paused (reported)        │       │ execute / quote reuse
//!                                       └───────┘ the same anchor
//! ```
//!
//! Eligibility is a dual gate: the vault may rebalance once
//! `rebalance_time_threshold` seconds have passed since the last rebalance
//! (calm markets), or earlier if the base price has moved more than
//! `rebalance_price_deviation_threshold` away from the price recorded at the
//! last rebalance (sharp moves).
//!
//! A time-triggered auction's curve starts when the threshold elapsed, not
//! when a keeper first noticed; a deviation-triggered one starts at the
//! moment it is armed. In both cases the direction is fixed on arming: the
//! curve rises when the base price is above the checkpoint price.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auction::AuctionAnchor;
use crate::config::VaultConfiguration;
use crate::error::{Result, VaultError};
use crate::math::{Rounding, Wad};

/// Time and base price of the last successful rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceCheckpoint {
    /// Unix seconds of the last rebalance (or genesis).
    pub timestamp: u64,
    /// Base price in stable at that moment.
    pub base_price: Wad,
}

/// Whether an auction is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateState {
    /// No auction is running.
    Idle,
    /// An auction is running on this anchor.
    Armed(AuctionAnchor),
}

/// Why the gate considers a rebalance due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// The time threshold elapsed.
    Time,
    /// The base price deviated past the threshold.
    Deviation,
}

/// The rebalance state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceGate {
    checkpoint: RebalanceCheckpoint,
    /// The most recent anchor, armed or not. Seeded at genesis.
    anchor: AuctionAnchor,
    state: GateState,
}

impl RebalanceGate {
    /// A gate whose last rebalance happened at `now` at `base_price`.
    pub fn genesis(now: u64, base_price: Wad) -> Self {
        Self {
            checkpoint: RebalanceCheckpoint {
                timestamp: now,
                base_price,
            },
            anchor: AuctionAnchor {
                trigger_timestamp: now,
                is_price_increasing: false,
            },
            state: GateState::Idle,
        }
    }

    /// The last rebalance checkpoint.
    pub fn checkpoint(&self) -> RebalanceCheckpoint {
        self.checkpoint
    }

    /// The most recent auction anchor.
    pub fn anchor(&self) -> AuctionAnchor {
        self.anchor
    }

    /// The stored state. See [`current_anchor`](Self::current_anchor) for
    /// the state as of a given time and price.
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Which threshold, if any, has been crossed.
    pub fn trigger(&self, config: &VaultConfiguration, base_price: Wad, now: u64) -> Result<Option<Trigger>> {
        let since = now.saturating_sub(self.checkpoint.timestamp);
        if since > config.rebalance_time_threshold {
            return Ok(Some(Trigger::Time));
        }
        if self.deviation(base_price)? > config.rebalance_price_deviation_threshold {
            return Ok(Some(Trigger::Deviation));
        }
        Ok(None)
    }

    /// Whether a rebalance is permitted at `now`. Always `false` while
    /// paused.
    pub fn is_time_rebalance(&self, config: &VaultConfiguration, base_price: Wad, now: u64) -> Result<bool> {
        if config.paused {
            return Ok(false);
        }
        let trigger = self.trigger(config, base_price, now)?;
        debug!(now, %base_price, ?trigger, "gate evaluated");
        Ok(trigger.is_some())
    }

    /// The anchor an auction at `now` prices against, without arming.
    ///
    /// An armed gate returns its stored anchor unchanged, so repeated calls
    /// share one price curve. An idle gate returns the anchor that arming
    /// now would create.
    ///
    /// # Errors
    ///
    /// [`VaultError::NotEligible`] when paused, or when idle and neither
    /// threshold has been crossed.
    pub fn current_anchor(&self, config: &VaultConfiguration, base_price: Wad, now: u64) -> Result<AuctionAnchor> {
        if config.paused {
            return Err(VaultError::paused());
        }
        if let GateState::Armed(anchor) = self.state {
            return Ok(anchor);
        }
        let trigger_timestamp = match self.trigger(config, base_price, now)? {
            Some(Trigger::Time) => self
                .checkpoint
                .timestamp
                .saturating_add(config.rebalance_time_threshold),
            Some(Trigger::Deviation) => now,
            None => return Err(VaultError::gate_idle()),
        };
        Ok(AuctionAnchor {
            trigger_timestamp,
            is_price_increasing: base_price > self.checkpoint.base_price,
        })
    }

    /// Transitions `Idle -> Armed` (a no-op when already armed) and returns
    /// the anchor in force.
    pub fn arm(&mut self, config: &VaultConfiguration, base_price: Wad, now: u64) -> Result<AuctionAnchor> {
        let anchor = self.current_anchor(config, base_price, now)?;
        if self.state == GateState::Idle {
            debug!(
                trigger = anchor.trigger_timestamp,
                increasing = anchor.is_price_increasing,
                "auction armed"
            );
        }
        self.anchor = anchor;
        self.state = GateState::Armed(anchor);
        Ok(anchor)
    }

    /// Records a successful rebalance at `now`.
    ///
    /// The checkpoint moves to `(now, base_price)` and the anchor is reset to
    /// `now`, its direction recording whether the price rose since the
    /// previous checkpoint. The gate goes idle until a threshold is crossed
    /// again.
    pub fn reset_after_rebalance(&mut self, base_price: Wad, now: u64) {
        self.anchor = AuctionAnchor {
            trigger_timestamp: now,
            is_price_increasing: base_price > self.checkpoint.base_price,
        };
        self.checkpoint = RebalanceCheckpoint {
            timestamp: now,
            base_price,
        };
        self.state = GateState::Idle;
    }

    /// `|price / checkpoint_price - 1|`.
    fn deviation(&self, base_price: Wad) -> Result<Wad> {
        if self.checkpoint.base_price.is_zero() {
            return Err(VaultError::InconsistentState(
                "rebalance checkpoint has no reference price".into(),
            ));
        }
        let ratio = Wad::from_ratio(base_price.raw(), self.checkpoint.base_price.raw(), Rounding::Down)?;
        Ok(ratio.abs_diff(Wad::ONE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AccountId;
    use crate::math::WAD;

    const START: u64 = 1_000_000;

    fn config() -> VaultConfiguration {
        VaultConfiguration::mainnet(AccountId::from("gov"))
    }

    fn price(whole: u128) -> Wad {
        Wad::from_raw(whole * WAD)
    }

    fn gate() -> RebalanceGate {
        RebalanceGate::genesis(START, price(2_000))
    }

    #[test]
    fn idle_until_time_threshold_is_exceeded() {
        let config = config();
        let gate = gate();
        let at_threshold = START + config.rebalance_time_threshold;
        assert!(!gate.is_time_rebalance(&config, price(2_000), at_threshold).unwrap());
        assert!(gate.is_time_rebalance(&config, price(2_000), at_threshold + 1).unwrap());
    }

    #[test]
    fn deviation_arms_early() {
        let config = config();
        let gate = gate();
        // 10% is the threshold itself, not beyond it.
        assert!(!gate.is_time_rebalance(&config, price(2_200), START + 1).unwrap());
        assert!(gate.is_time_rebalance(&config, price(2_201), START + 1).unwrap());
        assert!(gate.is_time_rebalance(&config, price(1_799), START + 1).unwrap());
    }

    #[test]
    fn paused_gate_is_never_eligible() {
        let mut config = config();
        config.set_pause(true).unwrap();
        let gate = gate();
        let late = START + 10 * config.rebalance_time_threshold;
        assert!(!gate.is_time_rebalance(&config, price(5_000), late).unwrap());
        assert_eq!(
            gate.current_anchor(&config, price(5_000), late).unwrap_err(),
            VaultError::paused()
        );
    }

    #[test]
    fn time_trigger_anchors_at_threshold_expiry() {
        let config = config();
        let gate = gate();
        let now = START + config.rebalance_time_threshold + 250;
        let anchor = gate.current_anchor(&config, price(2_050), now).unwrap();
        assert_eq!(anchor.trigger_timestamp, START + config.rebalance_time_threshold);
        assert!(anchor.is_price_increasing);
    }

    #[test]
    fn deviation_trigger_anchors_at_arming() {
        let config = config();
        let mut gate = gate();
        let anchor = gate.arm(&config, price(1_500), START + 60).unwrap();
        assert_eq!(anchor.trigger_timestamp, START + 60);
        assert!(!anchor.is_price_increasing);

        // Armed -> Armed keeps the anchor even if the price recovers.
        let again = gate.arm(&config, price(2_000), START + 120).unwrap();
        assert_eq!(again, anchor);
        assert_eq!(gate.current_anchor(&config, price(2_000), START + 120).unwrap(), anchor);
    }

    #[test]
    fn idle_gate_refuses_to_arm() {
        let config = config();
        let mut gate = gate();
        assert_eq!(
            gate.arm(&config, price(2_000), START + 1).unwrap_err(),
            VaultError::gate_idle()
        );
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn reset_goes_idle_with_fresh_anchor() {
        let config = config();
        let mut gate = gate();
        let now = START + config.rebalance_time_threshold + 5;
        gate.arm(&config, price(2_100), now).unwrap();
        gate.reset_after_rebalance(price(2_100), now);

        assert_eq!(gate.state(), GateState::Idle);
        assert_eq!(gate.anchor().trigger_timestamp, now);
        assert!(gate.anchor().is_price_increasing);
        assert_eq!(gate.checkpoint().base_price, price(2_100));
        assert!(!gate.is_time_rebalance(&config, price(2_100), now).unwrap());
    }
}
