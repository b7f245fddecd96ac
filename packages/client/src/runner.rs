//! Interactive session: join one conversation and chat from stdin.

use std::io::Write;

use converger_shared::time::{format_local_clock_time, now_millis};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    client::ConvergerClient,
    config::ClientConfig,
    domain::{ChannelTopic, ConversationId},
    error::ClientError,
    formatter::MessageFormatter,
    transport::JoinOutcome,
};

/// Redisplay the prompt after printing inbound activity
fn redisplay_prompt(prompt: &str) {
    print!("{}", prompt);
    std::io::stdout().flush().ok();
}

/// Run the interactive client until the user exits or the join is rejected
pub async fn run_client(
    config: ClientConfig,
    token: String,
    conversation_id: ConversationId,
) -> Result<(), ClientError> {
    let topic = ChannelTopic::conversation(&conversation_id);
    let prompt = format!("{}> ", conversation_id);

    let mut client = ConvergerClient::with_config(config);

    let prompt_for_activity = prompt.clone();
    client.on_activity(move |activity| {
        let received_at = format_local_clock_time(now_millis());
        print!(
            "{}",
            MessageFormatter::format_activity(&activity, received_at.as_deref())
        );
        redisplay_prompt(&prompt_for_activity);
    });

    client.connect(&token)?;
    let joined = client.join_conversation(conversation_id)?;

    match joined.receipt.outcome().await? {
        JoinOutcome::Joined(_) => print!("{}", MessageFormatter::format_joined(&topic)),
        JoinOutcome::Rejected(response) => {
            print!(
                "{}",
                MessageFormatter::format_join_rejected(&topic, &response)
            );
            return Err(ClientError::JoinRejected(response));
        }
    }

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    while let Some(line) = input_rx.recv().await {
        client.send_message(&line)?;
    }

    tracing::info!("Client session ended");
    Ok(())
}
