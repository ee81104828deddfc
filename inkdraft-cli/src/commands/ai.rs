use clap::{Args, Subcommand};
use inkdraft_core::{AiAction, PostId, PostStore, PostUpdate, Snapshot};

use super::api_client;
use super::post::post_text;
use crate::config::Config;

#[derive(Args)]
pub struct AiCommand {
    #[command(subcommand)]
    pub command: AiSubcommand,
}

/// Where the text comes from, and whether to write the result back.
#[derive(Args)]
pub struct AiInput {
    /// Text to rewrite
    #[arg(long, conflicts_with = "post", required_unless_present = "post")]
    text: Option<String>,

    /// Rewrite the content of this post
    #[arg(long)]
    post: Option<PostId>,

    /// Replace the post's content with the result (requires --post)
    #[arg(long, requires = "post")]
    apply: bool,
}

#[derive(Subcommand)]
pub enum AiSubcommand {
    /// Summarize in a few sentences
    Summary(AiInput),
    /// Fix grammar, spelling and punctuation
    FixGrammar(AiInput),
    /// Expand into a longer version
    Expand(AiInput),
}

impl AiSubcommand {
    fn parts(&self) -> (AiAction, &AiInput) {
        match self {
            AiSubcommand::Summary(input) => (AiAction::Summary, input),
            AiSubcommand::FixGrammar(input) => (AiAction::FixGrammar, input),
            AiSubcommand::Expand(input) => (AiAction::Expand, input),
        }
    }
}

impl AiCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let client = api_client(config);
        let (action, input) = self.command.parts();

        let text = match (&input.text, input.post) {
            (Some(text), _) => text.clone(),
            (None, Some(id)) => post_text(&client.get(id).await?),
            (None, None) => return Err("Provide --text or --post".into()),
        };
        if text.trim().is_empty() {
            return Err("Nothing to rewrite: the text is empty".into());
        }

        tracing::debug!(action = %action, chars = text.len(), "requesting AI rewrite");
        let response = client.generate(&text, action).await?;
        println!("{}", response.result);

        if let (true, Some(id)) = (input.apply, input.post) {
            let document = Snapshot::from_plain_text(&response.result);
            client
                .update(id, &PostUpdate::content(document.into_inner()))
                .await?;
            println!();
            println!("Applied {} to post {}", action, id);
        }
        Ok(())
    }
}
