//! Markdown rendering of post bodies.
//!
//! Two placeholders are expanded before rendering, and only for posts that
//! belong to a series:
//! - `[series-toc]` becomes a list of every post in the series
//! - `[series-next-post]` becomes a link to the following post, if any

use pulldown_cmark::{Options, Parser, html};

use crate::domain::entities::{Post, PostKind};

const SERIES_TOC: &str = "[series-toc]";
const SERIES_NEXT_POST: &str = "[series-next-post]";

/// Renders the post body to HTML.
///
/// `series` must be the full series of `post` in ascending id order, as
/// returned by [`crate::domain::repositories::PostRepository::series`].
pub fn formatted_text(post: &Post, series: &[Post], base_url: &str) -> String {
    render_markdown(&expand_series_placeholders(post, series, base_url))
}

/// Like [`formatted_text`], with a trailing "Read More" link to the external
/// URL for everything that is not a tweet.
pub fn formatted_text_with_external_url(post: &Post, series: &[Post], base_url: &str) -> String {
    let mut text = expand_series_placeholders(post, series, base_url);

    if post.kind() != PostKind::Tweet
        && let Some(url) = post.external_url.as_deref().filter(|u| !u.is_empty())
    {
        text.push_str(&format!("\n\n[Read More]({url})"));
    }

    render_markdown(&text)
}

/// Title shown in feeds and listings: kind emoji, a space, the title.
pub fn formatted_title(post: &Post) -> String {
    format!("{} {}", post.kind().emoji(), post.title)
}

fn expand_series_placeholders(post: &Post, series: &[Post], base_url: &str) -> String {
    if !post.is_part_of_series() {
        return post.text.clone();
    }

    let text = post
        .text
        .replace(SERIES_TOC, &format!("{}\n", series_toc(post, series, base_url)));

    text.replace(SERIES_NEXT_POST, &series_next_post(post, series, base_url))
}

fn series_toc(post: &Post, series: &[Post], base_url: &str) -> String {
    series
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            if entry.id == post.id {
                format!("{}. {}", i + 1, entry.title)
            } else {
                format!("{}. [{}]({})", i + 1, entry.title, entry.url(base_url))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn series_next_post(post: &Post, series: &[Post], base_url: &str) -> String {
    series
        .iter()
        .skip_while(|entry| entry.id != post.id)
        .nth(1)
        .map(|next| format!("[Next: {}]({})", next.title, next.url(base_url)))
        .unwrap_or_default()
}

fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::sample_post;

    const BASE: &str = "https://blog.test";

    fn series_post(id: i64, title: &str, text: &str) -> Post {
        let mut post = sample_post(id, title);
        post.series_slug = Some("async-rust".to_string());
        post.text = text.to_string();
        post
    }

    #[test]
    fn test_plain_markdown_is_rendered() {
        let mut post = sample_post(1, "Hello");
        post.text = "Some **bold** text".to_string();

        assert_eq!(
            formatted_text(&post, &[], BASE),
            "<p>Some <strong>bold</strong> text</p>\n"
        );
    }

    #[test]
    fn test_placeholders_are_left_alone_outside_a_series() {
        let mut post = sample_post(1, "Hello");
        post.text = "[series-next-post]".to_string();

        assert!(formatted_text(&post, &[], BASE).contains("[series-next-post]"));
    }

    #[test]
    fn test_series_toc_links_other_entries_only() {
        let first = series_post(1, "Part one", "intro");
        let second = series_post(2, "Part two", "[series-toc]\n\nbody");
        let third = series_post(3, "Part three", "outro");
        let series = vec![first, second.clone(), third];

        let html = formatted_text(&second, &series, BASE);

        assert!(html.contains(r#"<a href="https://blog.test/posts/1-part-one">Part one</a>"#));
        assert!(html.contains("<li>Part two</li>"));
        assert!(html.contains(r#"<a href="https://blog.test/posts/3-part-three">Part three</a>"#));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn test_series_next_post_points_to_following_entry() {
        let first = series_post(1, "Part one", "[series-next-post]");
        let second = series_post(2, "Part two", "[series-next-post]");
        let series = vec![first.clone(), second.clone()];

        assert!(
            formatted_text(&first, &series, BASE)
                .contains(r#"<a href="https://blog.test/posts/2-part-two">Next: Part two</a>"#)
        );
        assert!(!formatted_text(&second, &series, BASE).contains("Next:"));
    }

    #[test]
    fn test_read_more_appended_for_links() {
        let mut post = sample_post(1, "Hello");
        post.text = "Worth a read".to_string();
        post.external_url = Some("https://example.com/article".to_string());

        let html = formatted_text_with_external_url(&post, &[], BASE);

        assert!(html.contains(r#"<a href="https://example.com/article">Read More</a>"#));
    }

    #[test]
    fn test_read_more_skipped_for_tweets() {
        let mut post = sample_post(1, "Hello");
        post.external_url = Some("https://example.com/article".to_string());
        post.tags = vec!["tweet".to_string()];

        let html = formatted_text_with_external_url(&post, &[], BASE);

        assert!(!html.contains("Read More"));
    }

    #[test]
    fn test_formatted_title_carries_kind_emoji() {
        let mut post = sample_post(1, "Hello");
        post.original_content = true;

        assert_eq!(formatted_title(&post), "🌟 Hello");
    }
}
