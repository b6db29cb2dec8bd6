//! Prompt truncation against the scripted character-level model.

use proptest::prelude::*;

use caz_llm::model::{generate, stop_tokens};
use caz_llm::prompt::{fit_prompt, prompt_budget, user_label};
use caz_llm::{LlmError, PromptBuilder, PromptTurn, SamplingParams, ScriptedModel};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn history(lens: &[usize]) -> Vec<PromptTurn> {
    lens.iter()
        .enumerate()
        .map(|(i, n)| PromptTurn::new(format!("{i}{}", "x".repeat(*n)), "ok"))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn truncation_terminates_within_history_plus_one(
        lens in prop::collection::vec(0usize..40, 0..30),
        budget in 0usize..600,
    ) {
        let model = ScriptedModel::new("");
        let builder = PromptBuilder::new("Caz", "User (Stranger)");
        let turns = history(&lens);
        let result = runtime().block_on(fit_prompt(&model, &builder, &turns, "hi", budget));
        match result {
            Ok(fitted) => {
                prop_assert!(fitted.attempts <= turns.len() + 1);
                prop_assert!(fitted.tokens.len() <= budget);
                prop_assert_eq!(fitted.turns_used + fitted.attempts - 1, turns.len());
            }
            Err(LlmError::PromptOverflow { .. }) => {
                let bare = builder.render(&[], "hi").chars().count();
                prop_assert!(bare > budget);
            }
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }
}

#[test]
fn stranger_prompt_round_trip() {
    let rt = runtime();
    let model = ScriptedModel::new("Caz: Hello there.\nUser (Stranger): more");
    let builder = PromptBuilder::new("Caz", user_label(None, "Stranger"));
    let fitted = rt
        .block_on(fit_prompt(&model, &builder, &[], "Hello", prompt_budget(2048, 150)))
        .unwrap();
    assert_eq!(fitted.text, "User (Stranger): Hello\nCaz:");

    let stops = rt.block_on(stop_tokens(&model, "\n")).unwrap();
    assert_eq!(stops, vec![10]);
    let params = SamplingParams {
        stop_token_ids: stops,
        ..SamplingParams::default()
    };
    let reply = rt
        .block_on(generate(&model, &fitted.tokens, &params, "Caz"))
        .unwrap();
    assert_eq!(reply, "Hello there.");
    assert_eq!(model.prompts(), vec![fitted.text]);
}
