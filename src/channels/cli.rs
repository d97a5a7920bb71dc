//! Console front end: line-based REPL over any reader/writer pair.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Error;
use crate::intake::controller::{ANOTHER_REGISTRATION, FAREWELL, apology};
use crate::intake::{ConversationState, FlowController, FlowOutcome};

const BOT_PREFIX: &str = "AI Chatbot: ";
const USER_PROMPT: &str = "You: ";

/// Drives a [`FlowController`] from lines of text.
pub struct ConsoleChannel<'a, R, W> {
    flow: &'a FlowController,
    lines: tokio::io::Lines<R>,
    out: W,
}

impl<'a, R, W> ConsoleChannel<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(flow: &'a FlowController, input: R, out: W) -> Self {
        Self {
            flow,
            lines: input.lines(),
            out,
        }
    }

    /// Run registrations until the user stops or input ends.
    pub async fn run(mut self) -> Result<(), Error> {
        loop {
            let mut state = self.flow.new_conversation();
            let reply = self.flow.begin(&mut state)?;
            self.say_all(&reply.messages).await?;

            if !self.converse(&mut state).await? {
                return Ok(());
            }

            match state.outcome {
                // The user already declined another registration.
                Some(FlowOutcome::Cancelled) | None => return Ok(()),
                Some(FlowOutcome::Submitted { .. }) | Some(FlowOutcome::Failed { .. }) => {}
            }

            self.say(ANOTHER_REGISTRATION).await?;
            let Some(answer) = self.read_line().await? else {
                return Ok(());
            };
            match self.flow.confirm_restart(&answer).await {
                Ok(true) => {}
                Ok(false) => {
                    self.say(FAREWELL).await?;
                    return Ok(());
                }
                // Unreadable answer: start a fresh attempt rather than exit.
                Err(e) => self.say(&apology(&e)).await?,
            }
        }
    }

    /// Feed lines until the conversation completes. `false` on EOF.
    async fn converse(&mut self, state: &mut ConversationState) -> Result<bool, Error> {
        while !state.is_complete() {
            let Some(line) = self.read_line().await? else {
                return Ok(false);
            };
            if line.is_empty() {
                continue;
            }
            let reply = self.flow.handle_input(state, &line).await?;
            self.say_all(&reply.messages).await?;
        }
        Ok(true)
    }

    async fn read_line(&mut self) -> Result<Option<String>, Error> {
        self.out.write_all(USER_PROMPT.as_bytes()).await?;
        self.out.flush().await?;
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    async fn say(&mut self, text: &str) -> Result<(), Error> {
        let line = format!("{BOT_PREFIX}{text}\n");
        self.out.write_all(line.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }

    async fn say_all(&mut self, messages: &[String]) -> Result<(), Error> {
        for message in messages {
            self.say(message).await?;
        }
        Ok(())
    }
}
