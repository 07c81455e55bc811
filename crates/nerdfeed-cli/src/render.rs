//! Terminal rendering of the feed page.

use chrono::Local;
use colored::Colorize;
use nerdfeed_application::{FeedState, LikeOutcome, Notice};
use nerdfeed_core::post::Post;
use std::fmt::Write;

pub const TITLE: &str = "TODAY IN NERD HISTORY";

/// Renders header, composer and feed.
pub fn render_page(state: &FeedState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("=== {TITLE} ===").bright_magenta().bold());

    match &state.user {
        Some(user) => {
            let line = match &state.profile {
                Some(profile) => format!("Signed in as {} ({})", user.email(), profile.shown_name()),
                None => format!("Signed in as {}", user.email()),
            };
            let _ = writeln!(out, "{}", line.bright_black());
        }
        None => {
            let _ = writeln!(out, "{}", "Not signed in (/signin <email>)".bright_black());
        }
    }
    out.push('\n');

    render_draft(&mut out, state);
    out.push('\n');

    if state.posts.is_empty() {
        let _ = writeln!(out, "{}", "No posts yet.".bright_black());
    }
    for (index, post) in state.posts.iter().enumerate() {
        render_post(&mut out, index + 1, post);
    }
    out
}

fn render_draft(out: &mut String, state: &FeedState) {
    let label = if state.loading { "Draft (posting...)" } else { "Draft" };
    let content = if state.draft.content.is_empty() {
        "(empty)".bright_black().to_string()
    } else {
        state.draft.content.clone()
    };
    let _ = writeln!(out, "{} {}", format!("{label}:").cyan(), content);
    if let Some(image) = &state.draft.image {
        let _ = writeln!(
            out,
            "{} {} ({} bytes)",
            "Image:".cyan(),
            image.file_name,
            image.bytes.len()
        );
    }
}

fn render_post(out: &mut String, position: usize, post: &Post) {
    let when = post.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    let _ = writeln!(
        out,
        "{} {} {}",
        format!("[{position}]").yellow(),
        post.author_name().bright_green().bold(),
        when.to_string().bright_black()
    );
    for line in post.content.lines() {
        let _ = writeln!(out, "    {line}");
    }
    if let Some(url) = &post.image_url {
        let _ = writeln!(out, "    {}", url.blue().underline());
    }
    let _ = writeln!(out, "    {}", format!("/like {position}").bright_black());
}

/// Confirmation printed after a like. Failures stay in the log and
/// rejections were already shown as a notice.
pub fn like_feedback(outcome: &LikeOutcome) -> Option<String> {
    match outcome {
        LikeOutcome::Recorded => Some("Liked.".bright_green().to_string()),
        LikeOutcome::Rejected(_) | LikeOutcome::Failed(_) => None,
    }
}

pub fn render_notice(notice: Notice) -> String {
    format!("! {}", notice.message()).bright_yellow().bold().to_string()
}
