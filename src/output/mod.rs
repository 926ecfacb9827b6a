use anyhow::Result;
use console::style;

use crate::cli::OutputFormat;
use crate::pipeline::GeneratedPost;
use crate::store::BlogPost;

/// Render a freshly generated post
pub fn format_generated(post: &GeneratedPost, format: OutputFormat, show_transcript: bool) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(post)?),
        OutputFormat::Text => {
            let mut out = format!("{} (post #{})\n\n", style(&post.title).bold(), post.id);
            if show_transcript {
                out.push_str(&format!("{}\n{}\n\n", style("Transcript").underlined(), post.transcript));
            }
            out.push_str(&post.content);
            Ok(out)
        }
    }
}

/// Render a user's stored posts
pub fn format_posts(posts: &[BlogPost], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(posts)?),
        OutputFormat::Text => {
            if posts.is_empty() {
                return Ok("No blog posts yet.".to_string());
            }

            let lines: Vec<String> = posts
                .iter()
                .map(|post| {
                    format!(
                        "#{:<5} {}  {}  {}",
                        post.id,
                        post.created_at.format("%Y-%m-%d %H:%M"),
                        style(&post.youtube_title).bold(),
                        style(&post.youtube_link).dim(),
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

/// Print a generated post to the console
pub fn print_generated(post: &GeneratedPost, format: OutputFormat, show_transcript: bool) -> Result<()> {
    println!("{}", format_generated(post, format, show_transcript)?);
    Ok(())
}

/// Print stored posts to the console
pub fn print_posts(posts: &[BlogPost], format: OutputFormat) -> Result<()> {
    println!("{}", format_posts(posts, format)?);
    Ok(())
}
