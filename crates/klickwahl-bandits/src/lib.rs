//! ε-greedy-Bandit für kontextuelle Item-Empfehlungen.
//!
//! [`EpsilonGreedy`] implementiert das [`Strategy`](klickwahl_core::Strategy)-Trait
//! über einem expliziten [`PolicyState`]. Mit Wahrscheinlichkeit `epsilon`
//! (oder wenn der Kontext unbekannt ist) wird ein Arm gleichverteilt gezogen,
//! sonst der Arm mit dem höchsten laufenden Reward-Mittelwert.
//!
//! Training ([`train`]) und Auslieferung ([`select`]) laufen in getrennten
//! Prozessen und teilen sich nur den über [`persist`] gespeicherten Zustand.

// Ohne `telemetry` werden die Log-Aufrufe zu No-ops kompiliert.
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        tracing::info!($($arg)*);
        #[cfg(not(feature = "telemetry"))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "telemetry")]
        tracing::debug!($($arg)*);
        #[cfg(not(feature = "telemetry"))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

pub mod error;
pub mod persist;
pub mod select;
pub mod state;
pub mod train;

pub use error::{BanditError, Result};
pub use persist::{load_state, save_state};
pub use select::select_item;
pub use state::{PolicyState, StateSnapshot};
pub use train::{Arm, Trainer, TrainingSet};

use klickwahl_core::{ArmId, Context, Strategy};
use rand::{Rng, RngCore};

/// Explorationsrate, mit der trainiert und ausgeliefert wird.
pub const DEFAULT_EPSILON: f64 = 0.1;

/// ε-greedy Policy über einem eigenen [`PolicyState`].
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    epsilon: f64,
    state: PolicyState,
}

impl EpsilonGreedy {
    /// # Errors
    /// [`BanditError::InvalidEpsilon`], wenn `epsilon` nicht endlich in `[0, 1]` liegt.
    pub fn new(epsilon: f64, state: PolicyState) -> Result<Self> {
        if !epsilon.is_finite() || !(0.0..=1.0).contains(&epsilon) {
            return Err(BanditError::InvalidEpsilon(epsilon));
        }
        Ok(Self { epsilon, state })
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[must_use]
    pub fn state(&self) -> &PolicyState {
        &self.state
    }

    /// Reserviert genullte Slots für einen Kontext vor dem ersten Update.
    pub fn ensure_context(&mut self, ctx: &Context) -> bool {
        self.state.ensure_context(ctx)
    }

    #[must_use]
    pub fn into_state(self) -> PolicyState {
        self.state
    }
}

/// Index des größten Werts; bei Gleichstand gewinnt der kleinste Index.
fn greedy_index(rewards: &[f64]) -> usize {
    let mut best = 0;
    for (i, reward) in rewards.iter().enumerate().skip(1) {
        if *reward > rewards[best] {
            best = i;
        }
    }
    best
}

impl Strategy for EpsilonGreedy {
    type Error = BanditError;

    fn select_arm(&self, ctx: &Context, rng: &mut dyn RngCore) -> Result<ArmId> {
        let arm_count = self.state.arm_count();
        if arm_count == 0 {
            return Err(BanditError::EmptyCatalog);
        }
        let explore = rng.gen::<f64>() < self.epsilon;
        match self.state.rewards(ctx) {
            Some(rewards) if !explore && !rewards.is_empty() => Ok(ArmId(greedy_index(rewards))),
            _ => Ok(ArmId(rng.gen_range(0..arm_count))),
        }
    }

    fn update_reward(&mut self, ctx: &Context, arm: ArmId, reward: f64) -> Result<()> {
        let len = self.state.arm_count();
        if arm.index() >= len {
            return Err(BanditError::UnknownArm { arm, len });
        }
        let slots = self
            .state
            .slots_mut(ctx)
            .ok_or_else(|| BanditError::UnseenContext(ctx.clone()))?;
        slots.record(arm.index(), reward);
        Ok(())
    }
}
