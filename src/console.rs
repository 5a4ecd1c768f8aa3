use log::info;
use tokio::io::{ AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt };

use crate::agent::{ AdvisorAgent, TurnOutcome };

const SPEAKER: &str = "Laptop Advisor";

/// Drives the agent one line at a time until the conversation ends or the
/// input closes. Blank lines are skipped.
pub async fn run_console<R, W>(
    agent: &mut AdvisorAgent,
    greeting: &str,
    reader: R,
    mut writer: W
) -> std::io::Result<()>
    where R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin
{
    let greeting = agent.greet(greeting);
    writer.write_all(format!("{}: {}\n", SPEAKER, greeting).as_bytes()).await?;

    let mut lines = reader.lines();
    loop {
        writer.write_all(b"You: ").await?;
        writer.flush().await?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => {
                info!("Input closed, leaving the conversation.");
                writer.write_all(b"\n").await?;
                break;
            }
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match agent.process_message(input).await {
            TurnOutcome::Reply(text) => {
                writer.write_all(format!("{}: {}\n", SPEAKER, text).as_bytes()).await?;
            }
            TurnOutcome::Ended(farewell) => {
                writer.write_all(format!("{}: {}\n", SPEAKER, farewell).as_bytes()).await?;
                break;
            }
        }
    }
    writer.flush().await
}
