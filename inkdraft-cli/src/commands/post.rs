use clap::{Args, Subcommand};
use inkdraft_core::{
    plain_text, EditorStore, NewPost, Post, PostId, PostStatus, PostStore, PostUpdate, Snapshot,
};
use std::io::{self, BufRead, Write};

use super::{api_client, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct PostCommand {
    #[command(subcommand)]
    pub command: PostSubcommand,
}

#[derive(Subcommand)]
pub enum PostSubcommand {
    /// List posts, most recently updated first
    List {
        /// Filter by status (draft, published)
        #[arg(long, short)]
        status: Option<PostStatus>,

        /// Only posts whose title contains this text
        #[arg(long)]
        search: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a new draft
    New {
        /// Post title
        #[arg(long, short)]
        title: Option<String>,
    },

    /// Show a post with its text
    Show {
        /// Post ID
        id: PostId,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Rename a post
    Title {
        /// Post ID
        id: PostId,

        /// New title
        title: String,
    },

    /// Publish a post
    Publish {
        /// Post ID
        id: PostId,
    },

    /// Delete a post
    Delete {
        /// Post ID
        id: PostId,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl PostCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let client = api_client(config);

        match &self.command {
            PostSubcommand::List {
                status,
                search,
                format,
            } => {
                let mut store = EditorStore::new();
                store.set_posts(client.list(*status).await?);
                let posts = store.filter(None, search.as_deref().unwrap_or(""));

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&posts)?);
                    }
                    OutputFormat::Text => {
                        if posts.is_empty() {
                            println!("No posts found.");
                        } else {
                            print_post_table(&posts);
                        }
                    }
                }
                Ok(())
            }

            PostSubcommand::New { title } => {
                let post = match title {
                    Some(title) => NewPost::titled(title.clone()),
                    None => NewPost::default(),
                };
                let created = client.create(&post).await?;
                println!("Created post {}: {}", created.id, created.display_title());
                Ok(())
            }

            PostSubcommand::Show { id, format } => {
                let post = client.get(*id).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&post)?);
                    }
                    OutputFormat::Text => {
                        print!("{}", post);
                        let body = post_text(&post);
                        if !body.is_empty() {
                            println!();
                            println!("{}", body);
                        }
                    }
                }
                Ok(())
            }

            PostSubcommand::Title { id, title } => {
                let updated = client.update(*id, &PostUpdate::title(title.clone())).await?;
                println!("Renamed post {} to '{}'", updated.id, updated.display_title());
                Ok(())
            }

            PostSubcommand::Publish { id } => {
                let published = client.publish(*id).await?;
                println!(
                    "Published post {}: {}",
                    published.id,
                    published.display_title()
                );
                Ok(())
            }

            PostSubcommand::Delete { id, force } => {
                let post = client.get(*id).await?;
                if !force && !confirm(&format!("Delete '{}'?", post.display_title()))? {
                    println!("Cancelled.");
                    return Ok(());
                }
                client.delete(*id).await?;
                println!("Deleted post {}: {}", post.id, post.display_title());
                Ok(())
            }
        }
    }
}

/// Readable text of a post's stored document.
pub fn post_text(post: &Post) -> String {
    Snapshot::from_persisted(post.content.as_deref())
        .map(|s| plain_text(&s))
        .unwrap_or_default()
}

fn confirm(question: &str) -> Result<bool, io::Error> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_post_table(posts: &[&Post]) {
    let title_width = posts
        .iter()
        .map(|p| p.display_title().chars().count())
        .max()
        .unwrap_or(5)
        .clamp(5, 48);

    println!(
        "{:>6}  {:<title_width$}  {:<9}  {}",
        "ID", "TITLE", "STATUS", "UPDATED"
    );
    for post in posts {
        println!(
            "{:>6}  {:<title_width$}  {:<9}  {}",
            post.id,
            truncate(post.display_title(), title_width),
            post.status.as_str(),
            post.updated_at.format("%Y-%m-%d %H:%M"),
        );
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
