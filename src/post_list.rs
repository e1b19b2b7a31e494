use std::path::PathBuf;
use std::{fs, io};

pub struct PostList {
    pub posts_dir: PathBuf,
}

impl PostList {
    /// Lists the markdown files in the posts directory. The directory is
    /// flat; anything that is not a regular `*.md` file is ignored.
    pub fn retrieve_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut posts = vec![];
        let entries = fs::read_dir(self.posts_dir.as_path())?;
        for entry in entries {
            if let Ok(entry) = entry {
                if let Ok(file_type) = entry.file_type() {
                    if !file_type.is_file() {
                        continue;
                    }
                    let file_name = entry.file_name();
                    if let Some(file_name) = file_name.to_str() {
                        if file_name.ends_with(".md") {
                            posts.push(entry.path());
                        }
                    }
                }
            }
        }
        Ok(posts)
    }
}
