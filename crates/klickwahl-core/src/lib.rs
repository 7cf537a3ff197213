//! Gemeinsame Typen für klickwahl: Kontexte, Trainings-Interaktionen und das
//! [`Strategy`]-Trait, hinter dem die Bandit-Policies stehen.

pub mod context;
pub mod interaction;

pub use context::Context;
pub use interaction::{parse_impression_time, Interaction};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stabile Identität eines Arms: seine Position im Arm-Katalog.
///
/// Reward- und Count-Sequenzen sind positionsgleich zum Katalog indiziert,
/// deshalb reicht der Index als Identität.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArmId(pub usize);

impl ArmId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ArmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Auswahl- und Update-Regel eines kontextuellen Banditen.
///
/// Der Zufall wird explizit hereingereicht, damit Läufe mit festem Seed
/// reproduzierbar sind.
pub trait Strategy {
    type Error;

    /// Wählt einen Arm für `ctx`. Verändert keinen Zustand.
    fn select_arm(&self, ctx: &Context, rng: &mut dyn RngCore) -> Result<ArmId, Self::Error>;

    /// Verbucht einen beobachteten Reward für `(ctx, arm)`.
    fn update_reward(&mut self, ctx: &Context, arm: ArmId, reward: f64)
        -> Result<(), Self::Error>;
}
