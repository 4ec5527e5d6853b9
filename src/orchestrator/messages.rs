// Text shown to the cook after each turn

use crate::recipe::{Recipe, RecipeProposal, ScaledQuantity, Step, StepStatus};
use crate::timer::{format_duration, TimerReading, TimerStatus};
use crate::workflow::{CookingState, Effect, ExpectedInput, WorkflowSession};

pub fn welcome() -> String {
    [
        "🍳 Welcome to your cooking assistant!",
        "I'll suggest recipes based on the ingredients you have and guide you step by step.",
    ]
    .join("\n")
}

pub fn commands_hint(state: CookingState) -> Option<&'static str> {
    match state {
        CookingState::CookingGuidance => Some("Commands: 'next' (begin step), 'ask <question>', 'for <n> people', 'restart'"),
        CookingState::StepExecution => Some(
            "Commands: 'next' (continue), 'skip', 'timer <duration>', 'cancel timer', 'ask <question>', 'restart'",
        ),
        _ => None,
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

pub fn candidate_list(candidates: &[RecipeProposal]) -> String {
    let mut lines = vec!["📖 Recipe suggestions:".to_string()];
    for (position, candidate) in candidates.iter().enumerate() {
        let mut line = format!("  {}. {}", position + 1, candidate.name);
        if let Some(difficulty) = candidate.difficulty {
            line.push_str(&format!(" ({difficulty:?})"));
        }
        if let Some(description) = candidate.description.as_deref().filter(|d| !d.is_empty()) {
            line.push_str(&format!(" - {description}"));
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn amount_only(quantity: &ScaledQuantity) -> String {
    ScaledQuantity {
        unit: None,
        ..quantity.clone()
    }
    .to_string()
}

/// Quantity, unit, name and preparation for the requested servings
pub fn ingredient_table(recipe: &Recipe) -> String {
    let header = ["Quantity", "Unit", "Ingredient", "Preparation"];
    let rows: Vec<[String; 4]> = recipe
        .scaled_ingredients()
        .into_iter()
        .map(|(ingredient, scaled)| {
            [
                amount_only(&scaled),
                scaled.unit.clone().unwrap_or_default(),
                ingredient.name.clone(),
                ingredient.preparation.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: [&str; 4]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![
        format!(
            "🧾 Ingredients for {} ({}):",
            recipe.name(),
            plural(recipe.requested_servings() as usize, "serving")
        ),
        render(header),
    ];
    lines.extend(
        rows.iter()
            .map(|row| render([row[0].as_str(), row[1].as_str(), row[2].as_str(), row[3].as_str()])),
    );
    lines.join("\n")
}

pub fn step_overview(recipe: &Recipe) -> String {
    let mut lines = vec![format!("📋 Cooking steps for {}:", recipe.name())];
    for step in recipe.steps() {
        let marker = match step.status {
            StepStatus::Done => "✓",
            StepStatus::Skipped => "-",
            StepStatus::Pending => " ",
        };
        let mut line = format!("  {marker} {}. {}", step.index + 1, step.instruction);
        if let Some(seconds) = step.duration_secs {
            line.push_str(&format!(" [{}]", format_duration(seconds)));
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn step_card(recipe: &Recipe, step: &Step) -> String {
    let mut lines = vec![format!(
        "Step {}/{}: {}",
        step.index + 1,
        recipe.len(),
        step.instruction
    )];

    let uses: Vec<String> = step
        .ingredients
        .iter()
        .filter_map(|name| recipe.ingredient(name))
        .map(|ingredient| format!("{} {}", recipe.scaled_quantity(ingredient), ingredient.name))
        .collect();
    if !uses.is_empty() {
        lines.push(format!("   Uses: {}", uses.join(", ")));
    }
    lines.join("\n")
}

pub fn timer_line(reading: &TimerReading) -> String {
    match reading.status {
        TimerStatus::Running => format!(
            "⏱️  Step {}: {} remaining",
            reading.step_index + 1,
            format_duration(reading.remaining_secs)
        ),
        TimerStatus::Completed => format!("⏰ Step {}: time's up!", reading.step_index + 1),
        TimerStatus::Cancelled => format!(
            "⏹️  Step {}: timer stopped with {} left",
            reading.step_index + 1,
            format_duration(reading.remaining_secs)
        ),
    }
}

/// Notice for an effect, if it has anything to say
pub fn describe_effect(effect: &Effect, session: &WorkflowSession) -> Option<String> {
    match effect {
        Effect::RequestProposals { ingredients, servings } => {
            let names: Vec<&str> = ingredients.iter().map(|i| i.name.as_str()).collect();
            Some(format!(
                "🔎 Finding recipes for {} with {}...",
                plural(*servings as usize, "serving"),
                names.join(", ")
            ))
        }
        Effect::IngredientsCollected { total } => Some(format!("✓ {} so far", plural(*total, "ingredient"))),
        Effect::CandidatesReady { .. } => None,
        Effect::NoViableProposals { .. } => Some(
            "I couldn't put together a recipe from those ingredients. Add more or different ones, then say 'done'."
                .to_string(),
        ),
        Effect::RecipeConfirmed { name } => {
            let mut text = format!("✓ Selected recipe: {name}");
            if let Some(recipe) = session.recipe() {
                text.push_str("\n\n");
                text.push_str(&ingredient_table(recipe));
                text.push_str("\n\n");
                text.push_str(&step_overview(recipe));
            }
            Some(text)
        }
        Effect::RecipeRejected { reason } => {
            Some(format!("That recipe didn't hold together ({reason}). Let me find others."))
        }
        Effect::TimerStarted(reading) => Some(format!("✓ Timer set for {}", format_duration(reading.duration_secs))),
        Effect::TimerRunning(_) => None,
        Effect::TimerCompleted(reading) => Some(timer_line(reading)),
        Effect::TimerCancelled(reading) => Some(timer_line(reading)),
        Effect::StepFinished { index, status, .. } => Some(match status {
            StepStatus::Skipped => format!("Skipped step {}.", index + 1),
            _ => format!("✓ Step {} done.", index + 1),
        }),
        Effect::RecipeCompleted { name } => Some(format!(
            "🎉 Congratulations! You've completed {name}!\nEnjoy your delicious meal! 🍽️"
        )),
        Effect::ServingsAdjusted { servings } => {
            let mut text = format!("✓ Now cooking for {}", plural(*servings as usize, "person"));
            if let Some(recipe) = session.recipe() {
                text.push_str("\n\n");
                text.push_str(&ingredient_table(recipe));
            }
            Some(text)
        }
        Effect::AnswerQuestion { .. } => None,
        Effect::SessionReset => Some("Starting over.".to_string()),
    }
}

/// Where the session stands and what the cook can say next
pub fn state_prompt(session: &WorkflowSession, expected: &ExpectedInput, timers: &[TimerReading]) -> String {
    let mut lines = Vec::new();

    match session.state() {
        CookingState::IngredientCollection if !session.collected_ingredients().is_empty() => {
            let collected: Vec<String> = session
                .collected_ingredients()
                .iter()
                .map(|i| match &i.quantity {
                    Some(quantity) => format!("{} ({quantity})", i.name),
                    None => i.name.clone(),
                })
                .collect();
            lines.push(format!("Collected: {}", collected.join(", ")));
        }
        CookingState::RecipeConfirmation => lines.push(candidate_list(session.candidates())),
        CookingState::CookingGuidance | CookingState::StepExecution => {
            if let (Some(recipe), Some(step)) = (session.recipe(), session.current_step()) {
                lines.push(step_card(recipe, step));
            }
        }
        _ => {}
    }

    if !timers.is_empty() {
        lines.push("Active timers:".to_string());
        lines.extend(timers.iter().map(|t| format!("  {}", timer_line(t))));
    }

    lines.push(expected.prompt.clone());
    if let Some(hint) = commands_hint(session.state()) {
        lines.push(hint.to_string());
    }
    lines.join("\n")
}

pub fn answer(question: &str, answer: &str) -> String {
    format!("💡 {question}\n{}", answer.trim())
}

pub fn reprompt(reason: &str, expected: &ExpectedInput) -> String {
    format!("{reason}. {}", expected.prompt)
}

/// Fuller guidance once short re-prompts have not helped
pub fn help(reason: &str, expected: &ExpectedInput) -> String {
    let mut lines = vec![format!("{reason}."), "Here is what I can do right now:".to_string()];
    lines.extend(
        expected
            .decisions
            .iter()
            .map(|d| format!("  - {}", d.description)),
    );
    if !expected.options.is_empty() {
        lines.push(format!("Options: {}", expected.options.join(", ")));
    }
    lines.push(expected.prompt.clone());
    lines.join("\n")
}
