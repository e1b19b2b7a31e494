use fmt::Display;
use std::fmt::Formatter;
use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;
use std::{fmt, fs};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::read_time::read_time_minutes;

/// A chronicle entry, reconstructed from its markdown file on every read.
/// `read_time_minutes` is always derived from the body, never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub content: String,
    pub read_time_minutes: f64,
}

/// Projection of [Post] without the body, used for listings and suggestions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub read_time_minutes: f64,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        PostSummary {
            slug: post.slug.clone(),
            title: post.title.clone(),
            date: post.date.clone(),
            excerpt: post.excerpt.clone(),
            image: post.image.clone(),
            read_time_minutes: post.read_time_minutes,
        }
    }
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "slug={}, date={}\ntitle={}\ncontent:\n{}",
               self.slug,
               self.date,
               self.title,
               self.content
        )
    }
}

/// Example of a post file
/// ---
/// title: "What I learned after 20+ years of software development"
/// date: "2022-04-02"
/// excerpt: "A list of what I try to do myself"
/// image: "/blog/learned.png"
/// ---
///
/// How to be a great software engineer?
impl Post {
    pub fn from_file(slug: &str, file_path: &PathBuf) -> io::Result<Post> {
        let raw = fs::read_to_string(file_path)?;
        Ok(Self::from_string(slug, &raw))
    }

    /// Splits the frontmatter header from the body and fills defaults for
    /// missing fields. Malformed header lines are skipped; a file without a
    /// header is all body.
    pub fn from_string(slug: &str, raw: &str) -> Post {
        let mut title: Option<String> = None;
        let mut date: Option<String> = None;
        let mut excerpt: Option<String> = None;
        let mut image: Option<String> = None;

        let mut lines = raw.lines();
        let mut body = String::new();

        let in_header = matches!(lines.next(), Some(first) if first.trim_end() == "---");

        if in_header {
            let mut closed = false;
            while let Some(line) = lines.next() {
                if line.trim_end() == "---" {
                    closed = true;
                    break;
                }

                let (key, val) = match Self::extract_field(line) {
                    None => continue,
                    Some((k, v)) => (k, v),
                };

                match key {
                    "title" => title = Some(val),
                    "date" => date = Some(val),
                    "excerpt" => excerpt = Some(val),
                    "image" => image = Some(val),
                    _ => {}
                }
            }

            if closed {
                // The header is followed by one blank separator line
                let mut first = true;
                for line in lines {
                    if first && line.trim().is_empty() {
                        first = false;
                        continue;
                    }
                    first = false;
                    body.push_str(line);
                    body.push('\n');
                }
            } else {
                // An unterminated header is no header at all
                title = None;
                date = None;
                excerpt = None;
                image = None;
                body = raw.to_string();
            }
        } else {
            body = raw.to_string();
        }

        let excerpt = excerpt.filter(|s| !s.is_empty());
        let image = image.filter(|s| !s.is_empty());
        let read_time = read_time_minutes(&body);

        Post {
            slug: slug.to_string(),
            title: title.unwrap_or_else(|| slug.to_string()),
            date: date.unwrap_or_default(),
            excerpt,
            image,
            content: body,
            read_time_minutes: read_time,
        }
    }

    fn extract_field(line: &str) -> Option<(&str, String)> {
        lazy_static! {
            static ref FIELD_REGEX: Regex = Regex::new(
                r#"^(?P<key>\w+):\s*"(?P<value>.*)"\s*$"#
            ).unwrap();
        }

        FIELD_REGEX.captures(line).and_then(|cap| {
            let key = cap.name("key").map(|key| key.as_str());
            let val = cap.name("value").map(|val| unescape(val.as_str()));
            match (key, val) {
                (Some(key), Some(val)) => Some((key, val)),
                _ => None,
            }
        })
    }
}

/// Composes a post file header the way the parser reads it back. `image` is
/// written only when present.
pub fn render_frontmatter(title: &str, date: &str, excerpt: &str, image: Option<&str>) -> String {
    let mut buf = String::new();

    let _ = writeln!(&mut buf, "---");
    let _ = writeln!(&mut buf, "title: \"{}\"", escape(title));
    let _ = writeln!(&mut buf, "date: \"{}\"", escape(date));
    let _ = writeln!(&mut buf, "excerpt: \"{}\"", escape(excerpt));
    if let Some(image) = image {
        if !image.trim().is_empty() {
            let _ = writeln!(&mut buf, "image: \"{}\"", escape(image.trim()));
        }
    }
    let _ = writeln!(&mut buf, "---");
    let _ = writeln!(&mut buf);

    buf
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(value: &str) -> String {
    let mut res = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => res.push(next),
                None => res.push(c),
            }
        } else {
            res.push(c);
        }
    }
    res
}
