use klickwahl_bandits::{EpsilonGreedy, Trainer, TrainingSet, DEFAULT_EPSILON};
use klickwahl_core::{Context, Interaction, Strategy};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rows: Vec<Interaction> = serde_json::from_str(
        r#"[
        {"user_id":"demo","item_id":"news","impression_time":"2023-10-27T19:00:00Z","was_clicked":false,"device":"tv"},
        {"user_id":"demo","item_id":"movie","impression_time":"2023-10-27T20:30:00Z","was_clicked":true,"device":"tv"}
    ]"#,
    )?;

    let mut rng = StdRng::seed_from_u64(1);
    let state = Trainer::default().train(TrainingSet::from_interactions(rows), &mut rng)?;
    let policy = EpsilonGreedy::new(DEFAULT_EPSILON, state)?;

    let ctx = Context::new("demo", "evening", "friday", "tv");
    let arm = policy.select_arm(&ctx, &mut rng)?;
    let record = serde_json::json!({
        "context": ctx,
        "arm": arm,
        "item": policy.state().item_id(arm),
        "rewards": policy.state().rewards(&ctx),
    });
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
