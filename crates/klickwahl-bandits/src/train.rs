//! Offline-Training aus historischen Interaktionen.
//!
//! Aus den Rohzeilen entstehen der Arm-Katalog (ein Arm je Item, in der
//! Reihenfolge des ersten Auftretens) und pro Arm eine synthetische
//! Reward-Tabelle je Kontext. Gegen diese statische Oberfläche spielt der
//! [`Trainer`] pro Kontext eine feste Anzahl ε-greedy-Runden, bis die
//! laufenden Mittelwerte zum besten Arm des Kontexts tendieren.

use klickwahl_core::{ArmId, Context, Interaction, Strategy};
use rand::RngCore;
use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::state::PolicyState;
use crate::{EpsilonGreedy, DEFAULT_EPSILON};

/// Reward-Zuschlag pro Klick.
pub const CLICK_REWARD: f64 = 1.0;
/// Abzug pro Impression ohne Klick.
pub const NO_CLICK_PENALTY: f64 = 0.1;
/// Simulierte Runden pro Kontext.
pub const DEFAULT_TRIALS_PER_CONTEXT: u32 = 10_000;

/// Ein empfehlbares Item samt synthetischer Trainings-Rewards.
#[derive(Debug, Clone)]
pub struct Arm {
    pub id: ArmId,
    pub item_id: String,
    context_rewards: HashMap<Context, f64>,
}

impl Arm {
    fn new(id: ArmId, item_id: String) -> Self {
        Self {
            id,
            item_id,
            context_rewards: HashMap::new(),
        }
    }

    /// Simulierter Pull: der akkumulierte Reward dieses Arms im Kontext,
    /// `0.0` wenn das Item dort nie gezeigt wurde.
    #[must_use]
    pub fn pull(&self, ctx: &Context) -> f64 {
        self.context_rewards.get(ctx).copied().unwrap_or(0.0)
    }

    fn observe(&mut self, ctx: Context, clicked: bool) {
        let delta = if clicked { CLICK_REWARD } else { -NO_CLICK_PENALTY };
        *self.context_rewards.entry(ctx).or_insert(0.0) += delta;
    }
}

/// Arm-Katalog und Kontexte, abgeleitet aus einer geordneten Folge von Interaktionen.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    arms: Vec<Arm>,
    contexts: Vec<Context>,
    records: usize,
}

impl TrainingSet {
    pub fn from_interactions<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Interaction>,
    {
        let mut set = Self::default();
        let mut by_item: HashMap<String, usize> = HashMap::new();
        let mut seen: HashSet<Context> = HashSet::new();

        for record in records {
            set.records += 1;
            let ctx = Context::from_interaction(&record);
            if seen.insert(ctx.clone()) {
                set.contexts.push(ctx.clone());
            }

            let index = match by_item.get(&record.item_id) {
                Some(&i) => i,
                None => {
                    let i = set.arms.len();
                    by_item.insert(record.item_id.clone(), i);
                    set.arms.push(Arm::new(ArmId(i), record.item_id));
                    i
                }
            };
            set.arms[index].observe(ctx, record.was_clicked);
        }

        log_info!("fetched {} rows of training data", set.records);
        log_info!("there are {} arms to choose from", set.arms.len());
        set
    }

    #[must_use]
    pub fn arms(&self) -> &[Arm] {
        &self.arms
    }

    /// Unterschiedliche Kontexte in der Reihenfolge ihres ersten Auftretens.
    #[must_use]
    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records
    }
}

/// Treibt die ε-greedy-Simulation über alle Kontexte eines [`TrainingSet`].
#[derive(Debug, Clone)]
pub struct Trainer {
    pub epsilon: f64,
    pub trials_per_context: u32,
}

impl Default for Trainer {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            trials_per_context: DEFAULT_TRIALS_PER_CONTEXT,
        }
    }
}

impl Trainer {
    /// Trainiert und gibt den gelernten Zustand zurück.
    ///
    /// Das `TrainingSet` wird verbraucht; seine synthetischen Rewards
    /// überleben das Training nicht.
    pub fn train(&self, set: TrainingSet, rng: &mut dyn RngCore) -> Result<PolicyState> {
        let catalog = set.arms.iter().map(|a| a.item_id.clone()).collect();
        let mut policy = EpsilonGreedy::new(self.epsilon, PolicyState::new(catalog))?;

        if set.arms.is_empty() {
            log_info!("no arms in training data, nothing to train");
            return Ok(policy.into_state());
        }

        log_info!(
            "training {} contexts x {} trials (epsilon {})",
            set.contexts.len(),
            self.trials_per_context,
            self.epsilon
        );
        for ctx in &set.contexts {
            policy.ensure_context(ctx);
            for _ in 0..self.trials_per_context {
                let arm = policy.select_arm(ctx, rng)?;
                let reward = set.arms[arm.index()].pull(ctx);
                policy.update_reward(ctx, arm, reward)?;
            }
            log_debug!("trained context [{}]", ctx);
        }

        Ok(policy.into_state())
    }
}
