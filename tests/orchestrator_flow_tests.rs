// Conversation-level tests: offline interpreter, scripted recipe source and
// a manual clock driving the timers

mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use cooking_assistant::cli::commands::run_session;
use cooking_assistant::orchestrator::ReplyKind;
use cooking_assistant::workflow::CookingState;

use fixtures::{manual_clock, offline_orchestrator, recorded_proposals, FakeAdvisor, FakeRecipeSource};

#[tokio::test]
async fn test_full_conversation_from_servings_to_completion() {
    let recipes = Arc::new(FakeRecipeSource::answering(vec![Ok(recorded_proposals())]));
    let advisor = Arc::new(FakeAdvisor::default());
    let clock = manual_clock();
    let mut orchestrator = offline_orchestrator(recipes.clone(), advisor.clone(), clock.clone());

    let opening = orchestrator.opening();
    assert!(opening.message.contains("How many servings"));

    let reply = orchestrator.handle_turn("").await;
    assert_eq!(reply.state, CookingState::IngredientCollection);
    assert_eq!(orchestrator.machine().session().servings(), Some(2));

    let reply = orchestrator.handle_turn("200g flour, 2 eggs and milk").await;
    assert_eq!(reply.kind, ReplyKind::Progress);
    assert!(reply.message.contains("Collected:"), "{}", reply.message);
    assert_eq!(orchestrator.machine().session().collected_ingredients().len(), 3);

    let reply = orchestrator.handle_turn("done").await;
    assert_eq!(reply.state, CookingState::RecipeConfirmation);
    assert!(reply.message.contains("1. Fluffy Pancakes"), "{}", reply.message);
    assert!(reply.message.contains("2. Herb Frittata"));
    assert!(!reply.message.contains("Mystery Stew"));
    {
        let calls = recipes.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 2);
        assert_eq!(calls[0].2, 3);
    }

    // Only two candidates survived validation
    let reply = orchestrator.handle_turn("7").await;
    assert_eq!(reply.kind, ReplyKind::Reprompt { attempt: 1 });
    assert_eq!(reply.state, CookingState::RecipeConfirmation);

    let reply = orchestrator.handle_turn("1").await;
    assert_eq!(reply.state, CookingState::StepExecution);
    assert!(reply.message.contains("Selected recipe: Fluffy Pancakes"), "{}", reply.message);
    assert!(reply.message.contains("Ingredients for Fluffy Pancakes (2 servings)"));
    assert!(reply.message.contains("Step 1/3"));

    let reply = orchestrator.handle_turn("ask Should the batter be lumpy?").await;
    assert_eq!(reply.state, CookingState::StepExecution);
    assert!(reply.message.contains("Keep the heat at medium."));
    assert_eq!(
        advisor.questions.lock().unwrap().as_slice(),
        &[(0, "Should the batter be lumpy?".to_string())]
    );

    let reply = orchestrator.handle_turn("next").await;
    assert_eq!(reply.state, CookingState::StepExecution);
    assert!(reply.message.contains("Step 2/3"), "{}", reply.message);
    let timers = orchestrator.timer_status();
    assert_eq!(timers.len(), 1);
    assert!(timers[0].contains("Step 2"));

    assert!(orchestrator.tick().await.is_none());
    clock.advance_secs(599);
    assert!(orchestrator.tick().await.is_none());

    clock.advance_secs(1);
    let reply = orchestrator.tick().await.expect("finished timer moves the session on");
    assert!(reply.message.contains("time's up"), "{}", reply.message);
    assert!(reply.message.contains("Step 3/3"));
    assert_eq!(reply.state, CookingState::StepExecution);

    let reply = orchestrator.handle_turn("next").await;
    assert_eq!(reply.state, CookingState::Completed);
    assert!(reply.message.contains("Congratulations"));
    assert!(orchestrator.timer_status().is_empty());
}

#[tokio::test]
async fn test_failed_and_empty_proposals_return_to_collection() {
    let recipes = Arc::new(FakeRecipeSource::answering(vec![
        Err("connection reset".to_string()),
        Ok(Vec::new()),
    ]));
    let mut orchestrator = offline_orchestrator(recipes.clone(), Arc::new(FakeAdvisor::default()), manual_clock());

    orchestrator.handle_turn("3").await;
    orchestrator.handle_turn("rice").await;
    let reply = orchestrator.handle_turn("done").await;

    assert_eq!(recipes.call_count(), 2);
    assert_eq!(reply.state, CookingState::IngredientCollection);
    assert!(reply.message.contains("couldn't put together a recipe"), "{}", reply.message);
    // What was collected is kept for the next attempt
    assert_eq!(orchestrator.machine().session().collected_ingredients().len(), 1);
}

#[tokio::test]
async fn test_repeated_misunderstandings_escalate_to_help() {
    let mut orchestrator = offline_orchestrator(
        Arc::new(FakeRecipeSource::default()),
        Arc::new(FakeAdvisor::default()),
        manual_clock(),
    );

    for attempt in 1..=3 {
        let reply = orchestrator.handle_turn("lots of people").await;
        assert_eq!(reply.kind, ReplyKind::Reprompt { attempt });
        assert!(reply.message.contains("How many servings"));
    }

    let reply = orchestrator.handle_turn("lots of people").await;
    assert_eq!(reply.kind, ReplyKind::Help);
    assert!(reply.message.contains("Here is what I can do right now:"));
    assert_eq!(reply.state, CookingState::Starting);

    // The counter starts over after help was shown
    let reply = orchestrator.handle_turn("lots of people").await;
    assert_eq!(reply.kind, ReplyKind::Reprompt { attempt: 1 });
}

#[tokio::test]
async fn test_restart_mid_recipe_starts_a_fresh_session() {
    let recipes = Arc::new(FakeRecipeSource::answering(vec![Ok(recorded_proposals())]));
    let mut orchestrator = offline_orchestrator(recipes, Arc::new(FakeAdvisor::default()), manual_clock());

    for line in ["4", "eggs", "done", "2"] {
        orchestrator.handle_turn(line).await;
    }
    assert_eq!(orchestrator.state(), CookingState::StepExecution);

    let reply = orchestrator.handle_turn("start over").await;
    assert_eq!(reply.state, CookingState::Starting);
    assert!(reply.message.contains("Starting over."));
    assert!(orchestrator.machine().session().recipe().is_none());
}

#[tokio::test]
async fn test_interactive_session_reads_lines_until_quit() {
    let recipes = Arc::new(FakeRecipeSource::answering(vec![Ok(recorded_proposals())]));
    let mut orchestrator = offline_orchestrator(recipes, Arc::new(FakeAdvisor::default()), manual_clock());
    let input: &[u8] = b"3\nflour, eggs\ndone\nquit\nthis line is never read\n";
    let mut output = Vec::new();

    run_session(&mut orchestrator, input, &mut output, Duration::from_secs(3600))
        .await
        .unwrap();

    let printed = String::from_utf8(output).unwrap();
    assert!(printed.contains("Welcome to your cooking assistant"));
    assert!(printed.contains("Recipe suggestions:"));
    assert!(printed.contains("Happy cooking!"));
    assert_eq!(orchestrator.state(), CookingState::RecipeConfirmation);
}

#[tokio::test]
async fn test_interactive_session_ends_at_end_of_input() {
    let mut orchestrator = offline_orchestrator(
        Arc::new(FakeRecipeSource::default()),
        Arc::new(FakeAdvisor::default()),
        manual_clock(),
    );
    let input: &[u8] = b"5\n";
    let mut output = Vec::new();

    run_session(&mut orchestrator, input, &mut output, Duration::from_secs(3600))
        .await
        .unwrap();

    assert_eq!(orchestrator.state(), CookingState::IngredientCollection);
    assert_eq!(orchestrator.machine().session().servings(), Some(5));
    assert!(String::from_utf8(output).unwrap().ends_with("Happy cooking! 👋\n"));
}
