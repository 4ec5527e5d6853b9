// Prompt construction for the three collaborator roles

use crate::recipe::{CollectedIngredient, Step};
use crate::workflow::ExpectedInput;

/// Decision tag the model uses when nothing fits
pub const UNRECOGNIZED: &str = "unrecognized";

pub fn interpretation_system(expected: &ExpectedInput) -> String {
    let schema = serde_json::to_string_pretty(&expected.to_json_schema()).unwrap_or_default();

    let mut prompt = format!(
        "You interpret what a home cook says to a cooking assistant.\n\
         The conversation is in the \"{}\" stage. The assistant just asked: \"{}\"\n\n\
         Reply with exactly one JSON object matching one of these decisions:\n{schema}\n",
        expected.state.title(),
        expected.prompt,
    );

    if !expected.options.is_empty() {
        prompt.push_str("\nOptions (index: name):\n");
        for (index, option) in expected.options.iter().enumerate() {
            prompt.push_str(&format!("  {index}: {option}\n"));
        }
        prompt.push_str("The cook numbers options from 1, so \"the first one\" is index 0.\n");
    }

    prompt.push_str(&format!(
        "\nDurations are whole seconds. If the cook's words fit none of the decisions, \
         reply {{\"decision\": \"{UNRECOGNIZED}\"}}."
    ));
    prompt
}

pub fn proposal_system(count: usize) -> String {
    format!(
        "You are a helpful cooking assistant. Based on the ingredients provided, suggest {count} \
         different recipes. Reply with a JSON object {{\"recipes\": [...]}} where each recipe has:\n\
         - \"name\": recipe name\n\
         - \"description\": one sentence\n\
         - \"difficulty\": \"Easy\", \"Medium\" or \"Hard\"\n\
         - \"base_servings\": servings the quantities are written for (positive integer)\n\
         - \"ingredients\": list of {{\"name\", \"amount\" (number), \"unit\" (string or null), \
         \"kind\" (\"continuous\" for measured amounts, \"discrete\" for counted items), \"preparation\" (string or null)}}\n\
         - \"steps\": list of {{\"instruction\", \"duration_secs\" (integer or null, only for steps that need \
         waiting such as simmering or baking), \"ingredients\" (names from the ingredient list)}}\n\
         Ingredient names must be unique, and each step must only mention ingredients from its recipe."
    )
}

pub fn proposal_user(ingredients: &[CollectedIngredient], servings: u32) -> String {
    let listed: Vec<String> = ingredients
        .iter()
        .map(|ingredient| match &ingredient.quantity {
            Some(quantity) => format!("{} ({quantity})", ingredient.name),
            None => ingredient.name.clone(),
        })
        .collect();

    format!(
        "I have these ingredients: {}. I'm cooking for {servings}. What recipes can I make?",
        listed.join(", ")
    )
}

pub fn advisor_system(step: &Step) -> String {
    format!(
        "You are guiding someone through this cooking step: {}\n\
         Answer their question helpfully and concisely.",
        step.instruction
    )
}
