use std::io;
use std::path::PathBuf;

use spdlog::warn;

use crate::post::Post;
use crate::post_list::PostList;
use crate::sanitize::is_valid_slug;

/// Reads every post in the content directory, newest first. The filesystem
/// is the source of truth; there is no cache and each call re-parses.
///
/// A missing directory means zero posts. A file that cannot be read is
/// skipped so one bad entry never blocks the listing.
pub fn get_posts(posts_dir: &PathBuf) -> io::Result<Vec<Post>> {
    if !posts_dir.exists() {
        return Ok(vec![]);
    }

    let post_list = PostList { posts_dir: posts_dir.clone() };
    let files = post_list.retrieve_files()?;

    let mut posts = vec![];
    for file in files {
        let slug = match file.file_stem().and_then(|s| s.to_str()) {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => continue,
        };

        match Post::from_file(&slug, &file) {
            Ok(post) => posts.push(post),
            Err(e) => {
                warn!("Skipping unreadable post {}: {}", slug, e);
                continue;
            }
        }
    }

    // ISO dates compare lexically, so string order is chronological order.
    // Posts without a date sort last.
    posts.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(posts)
}

/// Looks one post up by its slug. Absent file is `None`, never an error;
/// slugs outside the safe alphabet resolve to `None` without touching the
/// filesystem.
pub fn get_post_by_slug(posts_dir: &PathBuf, slug: &str) -> io::Result<Option<Post>> {
    if !is_valid_slug(slug) {
        return Ok(None);
    }

    let file_path = posts_dir.join(format!("{}.md", slug));
    if !file_path.exists() {
        return Ok(None);
    }

    let post = Post::from_file(slug, &file_path)?;
    Ok(Some(post))
}

/// Case-insensitive substring filter over title and excerpt, for the
/// listing endpoint's search box.
pub fn filter_by_query<'a>(posts: &'a [Post], query: &str) -> Vec<&'a Post> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return posts.iter().collect();
    }

    posts.iter()
        .filter(|post| {
            post.title.to_lowercase().contains(&q)
                || post.excerpt.as_deref().map(|e| e.to_lowercase().contains(&q)).unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::post::render_frontmatter;

    use super::*;

    fn write_post(dir: &std::path::Path, slug: &str, title: &str, date: &str, body: &str) {
        let raw = format!("{}{}", render_frontmatter(title, date, "", None), body);
        fs::write(dir.join(format!("{}.md", slug)), raw).unwrap();
    }

    #[test]
    fn test_missing_dir_is_zero_posts() {
        let posts = get_posts(&PathBuf::from("/no/such/dir/anywhere")).unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn test_posts_sorted_by_date_descending() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        write_post(dir.path(), "older", "Older", "2023-12-31", "old words\n");
        write_post(dir.path(), "newer", "Newer", "2024-01-01", "new words\n");
        fs::write(dir.path().join("undated.md"), "no header at all\n")?;

        let posts = get_posts(&dir.path().to_path_buf())?;
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["newer", "older", "undated"]);
        Ok(())
    }

    #[test]
    fn test_malformed_post_does_not_block_listing() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        write_post(dir.path(), "good", "Good", "2024-02-02", "words\n");
        fs::write(dir.path().join("broken.md"), "---\ntitle: no quotes here\n---\n\nbody\n")?;

        let posts = get_posts(&dir.path().to_path_buf())?;
        assert_eq!(posts.len(), 2);
        let broken = posts.iter().find(|p| p.slug == "broken").unwrap();
        // Malformed header lines degrade to defaults
        assert_eq!(broken.title, "broken");
        Ok(())
    }

    #[test]
    fn test_lookup_by_slug() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        write_post(dir.path(), "the-one", "The One", "2024-03-03", "body\n");

        let posts_dir = dir.path().to_path_buf();
        let post = get_post_by_slug(&posts_dir, "the-one")?.unwrap();
        assert_eq!(post.title, "The One");

        assert!(get_post_by_slug(&posts_dir, "no-such-post")?.is_none());
        assert!(get_post_by_slug(&posts_dir, "../escape")?.is_none());
        Ok(())
    }

    #[test]
    fn test_filter_by_query() {
        let posts = vec![
            Post::from_string("fishing", "---\ntitle: \"Fishing the lake\"\nexcerpt: \"boats and bait\"\n---\n\nbody\n"),
            Post::from_string("hiking", "---\ntitle: \"Hiking the ridge\"\n---\n\nbody\n"),
        ];

        let hits = filter_by_query(&posts, "LAKE");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "fishing");

        let hits = filter_by_query(&posts, "bait");
        assert_eq!(hits.len(), 1);

        let hits = filter_by_query(&posts, "  ");
        assert_eq!(hits.len(), 2);
    }
}
