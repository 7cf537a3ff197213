//! Auswahl im Serving-Prozess: Zustand laden, einmal wählen, Item melden.
//!
//! Der geladene Zustand wird nur gelesen; hier wird weder gelernt noch
//! gespeichert.

use klickwahl_core::{Context, Strategy};
use rand::RngCore;
use std::path::Path;

use crate::error::{BanditError, Result};
use crate::persist::load_state;
use crate::EpsilonGreedy;

/// Lädt den Zustand aus `state_file` und empfiehlt ein Item für `ctx`.
///
/// # Errors
/// Persistenzfehler beim Laden (es gibt kein sinnvolles Default-Modell)
/// sowie [`BanditError::EmptyCatalog`], wenn ohne Arme trainiert wurde.
pub fn select_item(
    state_file: &Path,
    ctx: &Context,
    epsilon: f64,
    rng: &mut dyn RngCore,
) -> Result<String> {
    let policy = EpsilonGreedy::new(epsilon, load_state(state_file)?)?;
    let arm = policy.select_arm(ctx, rng)?;
    let item = policy
        .state()
        .item_id(arm)
        .ok_or_else(|| BanditError::UnknownArm {
            arm,
            len: policy.state().arm_count(),
        })?
        .to_string();
    log_debug!(
        "context [{}] -> arm {} ({}), epsilon {}",
        ctx,
        arm,
        item,
        policy.epsilon()
    );
    Ok(item)
}
