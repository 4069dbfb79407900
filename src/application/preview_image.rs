//! Social preview card for a post, rendered as SVG.

use askama::Template;

use crate::domain::entities::{Post, PostKind};

const LINE_WIDTH: usize = 30;
const MAX_LINES: usize = 4;

#[derive(Template)]
#[template(path = "og_image.svg", escape = "html")]
struct PreviewImageTemplate<'a> {
    emoji: &'static str,
    kind: &'static str,
    title_lines: Vec<String>,
    site: &'a str,
    date: String,
}

/// Renders the 1200x630 preview card of `post`.
///
/// # Errors
///
/// Returns the template error if rendering fails.
pub fn render_preview_image(post: &Post, site: &str) -> Result<Vec<u8>, askama::Error> {
    let kind = post.kind();
    let template = PreviewImageTemplate {
        emoji: kind.emoji(),
        kind: kind_label(kind),
        title_lines: wrap_title(&post.title),
        site,
        date: post
            .publish_date
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_else(|| "Draft".to_string()),
    };

    Ok(template.render()?.into_bytes())
}

fn kind_label(kind: PostKind) -> &'static str {
    match kind {
        PostKind::Link => "Link",
        PostKind::Tweet => "Tweet",
        PostKind::Original => "Original",
    }
}

/// Greedy word wrap; overflow past the last line is cut with an ellipsis.
fn wrap_title(title: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in title.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > LINE_WIDTH {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > MAX_LINES {
        lines.truncate(MAX_LINES);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }

    lines
}
