use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::post::Post;

/// How many suggestions a post page shows.
pub const DEFAULT_SUGGESTIONS: usize = 3;

/// Only the opening of a post carries its topic; the tail is noise.
const TOPIC_BODY_CHARS: usize = 1200;

/// Collapses markdown to the words a reader would take away from it: code
/// spans dropped, link syntax reduced to its text, markers and punctuation
/// out, everything lowercased.
fn strip_markdown(text: &str) -> String {
    lazy_static! {
        static ref FENCED_CODE: Regex = Regex::new(r"(?s)```.*?```").unwrap();
        static ref INLINE_CODE: Regex = Regex::new(r"`[^`]*`").unwrap();
        static ref LINK: Regex = Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").unwrap();
        static ref MARKERS: Regex = Regex::new(r"[#*_~>]").unwrap();
        static ref PUNCT: Regex = Regex::new(r"[^a-z0-9\s]").unwrap();
    }

    let stripped = FENCED_CODE.replace_all(text, " ");
    let stripped = INLINE_CODE.replace_all(&stripped, " ");
    let stripped = LINK.replace_all(&stripped, "$1");
    let stripped = MARKERS.replace_all(&stripped, " ");
    let stripped = stripped.to_lowercase();
    let stripped = PUNCT.replace_all(&stripped, " ");

    stripped.into_owned()
}

/// The text a post is "about": title, excerpt and the first stretch of the
/// stripped body.
fn topic_text(post: &Post) -> String {
    let body: String = strip_markdown(&post.content).chars().take(TOPIC_BODY_CHARS).collect();
    let excerpt = post.excerpt.as_deref().unwrap_or("");

    strip_markdown(&format!("{} {} {}", post.title, excerpt, body))
}

/// Whitespace tokens, single characters discarded.
fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|t| t.chars().count() > 1)
        .map(|t| t.to_string())
        .collect()
}

/// Jaccard-style similarity between the target token *set* and a candidate
/// token *list*: a token repeated in the candidate counts once per
/// occurrence in the numerator, while the denominator uses the candidate's
/// list length. The asymmetry is kept deliberately for output parity with
/// the reference ranking.
fn score(target: &HashSet<String>, candidate: &[String]) -> f64 {
    let overlap = candidate.iter().filter(|t| target.contains(t.as_str())).count();
    let denom = target.len() + candidate.len() - overlap;
    if denom == 0 {
        return 0.0;
    }
    overlap as f64 / denom as f64
}

/// Ranks the rest of the corpus against one post and returns the `max` best
/// matches. Unknown slug or a one-post corpus yields nothing. Ties keep
/// corpus order.
pub fn related_posts<'a>(slug: &str, posts: &'a [Post], max: usize) -> Vec<&'a Post> {
    let target = match posts.iter().find(|p| p.slug == slug) {
        Some(post) => post,
        None => return vec![],
    };

    let target_tokens: HashSet<String> = tokens(&topic_text(target)).into_iter().collect();

    let mut scored: Vec<(f64, &Post)> = posts.iter()
        .filter(|p| p.slug != slug)
        .map(|p| (score(&target_tokens, &tokens(&topic_text(p))), p))
        .collect();

    // Stable sort, so equal scores stay in corpus order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored.into_iter().take(max).map(|(_, p)| p).collect()
}
