use std::fmt::Write as _;
use std::fs::File;
use std::io::Write as _;

use chrono::Utc;
use clap::{Parser, ValueEnum};

use chronicle::post::render_frontmatter;
use chronicle::sanitize::post_filename_from_title;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PostOutput {
    Stdout,
    File,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Post title
    #[arg(short, long)]
    title: Option<String>,

    /// One-line summary shown in listings
    #[arg(short, long)]
    excerpt: Option<String>,

    /// Where the skeleton goes
    #[arg(short, long, value_enum, default_value_t = PostOutput::Stdout)]
    output: PostOutput,
}

fn render_body() -> String {
    let mut buf = String::new();

    let _ = writeln!(&mut buf, "This is a body example");
    let _ = writeln!(&mut buf, "Please remove it and replace with your content");

    buf
}

fn render_skeleton(title: &str, excerpt: &str, date: &str) -> String {
    format!("{}{}", render_frontmatter(title, date, excerpt, None), render_body())
}

fn main() {
    let args = Args::parse();
    let date = Utc::now().format("%Y-%m-%d").to_string();

    if matches!(args.output, PostOutput::File) && args.title.is_none() {
        eprintln!("For file output, title is required");
        return;
    }

    let title = args.title.as_deref().unwrap_or("Replace with title");
    let excerpt = args.excerpt.as_deref().unwrap_or("");
    let skeleton = render_skeleton(title, excerpt, &date);

    match args.output {
        PostOutput::Stdout => {
            println!("{}", skeleton);
        }
        PostOutput::File => {
            let file_name = post_filename_from_title(title);
            println!("Creating file {}", file_name);
            let mut file = File::create(&file_name).unwrap();
            file.write_all(skeleton.as_bytes()).unwrap();
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_skeleton() {
        let skeleton = render_skeleton("A walk in the woods", "Short note", "2024-02-27");
        assert_eq!(skeleton, "---\n\
                              title: \"A walk in the woods\"\n\
                              date: \"2024-02-27\"\n\
                              excerpt: \"Short note\"\n\
                              ---\n\
                              \n\
                              This is a body example\n\
                              Please remove it and replace with your content\n");
    }
}
