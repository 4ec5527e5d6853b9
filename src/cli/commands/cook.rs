use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::info;

use super::Command;
use crate::config::config;
use crate::llm::LlmAgent;
use crate::orchestrator::{Collaborators, CommandInterpreter, Interpreter, Orchestrator};
use crate::timer::SystemClock;
use crate::workflow::CookingState;

pub struct CookCommand {
    pub offline: bool,
}

impl CookCommand {
    pub fn new(offline: bool) -> Self {
        Self { offline }
    }
}

impl Command for CookCommand {
    async fn execute(&self) -> Result<()> {
        let config = config()?;
        let agent = Arc::new(
            LlmAgent::new(config.llm.clone()).context("Recipe suggestions need a language model")?,
        );

        let interpreter: Arc<dyn Interpreter> = if self.offline {
            Arc::new(CommandInterpreter::new())
        } else {
            agent.clone()
        };
        let collaborators = Collaborators {
            interpreter,
            recipes: agent.clone(),
            advisor: agent,
        };

        let mut orchestrator = Orchestrator::new(collaborators, Arc::new(SystemClock), config.session.clone());
        info!(session_id = %orchestrator.session_id(), offline = self.offline, "Cooking session started");

        let update_every = Duration::from_secs(config.session.timer_update_seconds.max(1));
        run_session(
            &mut orchestrator,
            BufReader::new(tokio::io::stdin()),
            &mut tokio::io::stdout(),
            update_every,
        )
        .await
    }
}

fn is_quit(line: &str, state: CookingState) -> bool {
    let line = line.trim().to_lowercase();
    matches!(line.as_str(), "quit" | "exit" | "q")
        || (state == CookingState::Completed && matches!(line.as_str(), "no" | "n"))
}

async fn show<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n\n> ").await?;
    output.flush().await?;
    Ok(())
}

/// Interactive loop: one turn per input line, with the active timer polled
/// every `update_every` so finished timers move the session on by
/// themselves. Ends on 'quit' or end of input.
pub async fn run_session<R, W>(
    orchestrator: &mut Orchestrator,
    input: R,
    output: &mut W,
    update_every: Duration,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut ticker = tokio::time::interval(update_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately
    ticker.tick().await;

    let opening = orchestrator.opening();
    show(output, &opening.message).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if is_quit(&line, orchestrator.state()) {
                    break;
                }
                let reply = orchestrator.handle_turn(&line).await;
                show(output, &reply.message).await?;
            }
            _ = ticker.tick() => {
                if let Some(reply) = orchestrator.tick().await {
                    output.write_all(b"\n").await?;
                    show(output, &reply.message).await?;
                }
            }
        }
    }

    output
        .write_all("\nThank you for using the Cooking Assistant! Happy cooking! 👋\n".as_bytes())
        .await?;
    output.flush().await?;
    info!(session_id = %orchestrator.session_id(), state = %orchestrator.state(), "Cooking session ended");
    Ok(())
}
