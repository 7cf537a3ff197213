//! Gelernter Zustand der Policy: pro Kontext ein laufender Reward-Mittelwert
//! und ein Pull-Zähler je Arm.
//!
//! Die Sequenzen sind positionsgleich zum Arm-Katalog: Index `i` in
//! `rewards`/`counts` gehört immer zu `arms[i]`. [`Slots`] hält beide
//! Sequenzen zusammen, damit ihre Längen nicht auseinanderlaufen können.

use klickwahl_core::{ArmId, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{BanditError, Result};

/// Reward- und Count-Sequenz eines Kontexts.
#[derive(Debug, Clone, PartialEq)]
pub struct Slots {
    rewards: Vec<f64>,
    counts: Vec<u64>,
}

impl Slots {
    fn zeroed(len: usize) -> Self {
        Self {
            rewards: vec![0.0; len],
            counts: vec![0; len],
        }
    }

    #[must_use]
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Inkrementeller Mittelwert: `(alt * (n - 1) + r) / n`.
    ///
    /// Muss genau in dieser Form gerechnet werden, damit die Rundung mit
    /// anderen Implementierungen übereinstimmt.
    pub(crate) fn record(&mut self, index: usize, reward: f64) {
        self.counts[index] += 1;
        #[allow(clippy::cast_precision_loss)]
        let n = self.counts[index] as f64;
        self.rewards[index] = (self.rewards[index] * (n - 1.0) + reward) / n;
    }
}

/// Der serialisierbare, gelernte Policy-Zustand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolicyState {
    arms: Vec<String>,
    contexts: BTreeMap<Context, Slots>,
}

impl PolicyState {
    /// Leerer Zustand über einem festen Arm-Katalog (Item-IDs in Katalogreihenfolge).
    #[must_use]
    pub fn new(arms: Vec<String>) -> Self {
        Self {
            arms,
            contexts: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn arms(&self) -> &[String] {
        &self.arms
    }

    #[must_use]
    pub fn arm_count(&self) -> usize {
        self.arms.len()
    }

    /// Item-ID eines Arms, sofern der Index im Katalog liegt.
    #[must_use]
    pub fn item_id(&self, arm: ArmId) -> Option<&str> {
        self.arms.get(arm.index()).map(String::as_str)
    }

    /// Legt für einen neuen Kontext genullte Slots an.
    ///
    /// Ein bereits bekannter Kontext behält seine Werte. Gibt `true` zurück,
    /// wenn der Kontext neu war.
    pub fn ensure_context(&mut self, ctx: &Context) -> bool {
        if self.contexts.contains_key(ctx) {
            return false;
        }
        self.contexts
            .insert(ctx.clone(), Slots::zeroed(self.arms.len()));
        true
    }

    /// Setzt Rewards und Counts eines Kontexts direkt, z. B. beim Laden.
    ///
    /// # Errors
    /// [`BanditError::CorruptState`], wenn eine der Sequenzen nicht die Länge
    /// des Katalogs hat.
    pub fn insert_context(&mut self, ctx: Context, rewards: Vec<f64>, counts: Vec<u64>) -> Result<()> {
        if rewards.len() != self.arms.len() || counts.len() != self.arms.len() {
            return Err(BanditError::CorruptState(format!(
                "context [{ctx}] has {} rewards and {} counts for {} arms",
                rewards.len(),
                counts.len(),
                self.arms.len()
            )));
        }
        self.contexts.insert(ctx, Slots { rewards, counts });
        Ok(())
    }

    #[must_use]
    pub fn slots(&self, ctx: &Context) -> Option<&Slots> {
        self.contexts.get(ctx)
    }

    pub(crate) fn slots_mut(&mut self, ctx: &Context) -> Option<&mut Slots> {
        self.contexts.get_mut(ctx)
    }

    #[must_use]
    pub fn rewards(&self, ctx: &Context) -> Option<&[f64]> {
        self.slots(ctx).map(Slots::rewards)
    }

    #[must_use]
    pub fn counts(&self, ctx: &Context) -> Option<&[u64]> {
        self.slots(ctx).map(Slots::counts)
    }

    /// Alle bekannten Kontexte in ihrer totalen Ordnung.
    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.keys()
    }

    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Persistierbare Form des Zustands.
    #[must_use]
    pub fn to_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            saved_at: None,
            arms: self.arms.clone(),
            contexts: self
                .contexts
                .iter()
                .map(|(ctx, slots)| ContextEntry {
                    context: ctx.clone(),
                    rewards: slots.rewards.clone(),
                    counts: slots.counts.clone(),
                })
                .collect(),
        }
    }
}

impl TryFrom<StateSnapshot> for PolicyState {
    type Error = BanditError;

    fn try_from(snapshot: StateSnapshot) -> Result<Self> {
        let mut state = PolicyState::new(snapshot.arms);
        for entry in snapshot.contexts {
            if state.contexts.contains_key(&entry.context) {
                return Err(BanditError::CorruptState(format!(
                    "duplicate context [{}]",
                    entry.context
                )));
            }
            state.insert_context(entry.context, entry.rewards, entry.counts)?;
        }
        Ok(state)
    }
}

/// Wire-Format des Zustands: Arm-Katalog plus eine Liste von Kontext-Einträgen.
///
/// Kontexte sind keine gültigen JSON-Objektschlüssel, deshalb als Liste.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateSnapshot {
    /// Zeitpunkt des Speicherns (RFC 3339); rein informativ, wird beim Laden ignoriert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    pub arms: Vec<String>,
    #[serde(default)]
    pub contexts: Vec<ContextEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextEntry {
    pub context: Context,
    pub rewards: Vec<f64>,
    pub counts: Vec<u64>,
}
