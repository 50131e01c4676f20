//! Plain-text link files, one URL per line.

use crate::error::SetupError;
use crate::results::ImageLink;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Writes `links` to `path`, replacing any previous file
pub fn write_links(path: &Path, links: &[ImageLink]) -> Result<(), SetupError> {
    let write_error = |source| SetupError::WriteLinks {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }

    let mut out = BufWriter::new(File::create(path).map_err(write_error)?);
    for link in links {
        writeln!(out, "{}", link).map_err(write_error)?;
    }
    out.flush().map_err(write_error)
}

/// Reads links from `path`, ignoring blank lines and surrounding whitespace
pub fn read_links(path: &Path) -> Result<Vec<ImageLink>, SetupError> {
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut file| file.read_to_string(&mut contents))
        .map_err(|source| SetupError::ReadLinks {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ImageLink::new)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_links_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("cats_links.txt");
        let links = vec![
            ImageLink::new("https://img.example/b.jpg"),
            ImageLink::new("https://img.example/a.jpg"),
            ImageLink::new("https://img.example/b.jpg"),
        ];

        write_links(&path, &links).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "https://img.example/b.jpg\nhttps://img.example/a.jpg\nhttps://img.example/b.jpg\n"
        );
        assert_eq!(read_links(&path).unwrap(), links);
    }

    #[test]
    fn test_read_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        std::fs::write(&path, "\n  https://img.example/1.jpg \r\n\n\nhttps://img.example/2.jpg").unwrap();

        let links = read_links(&path).unwrap();

        assert_eq!(
            links,
            vec![
                ImageLink::new("https://img.example/1.jpg"),
                ImageLink::new("https://img.example/2.jpg"),
            ]
        );
    }

    #[test]
    fn test_missing_file_is_a_setup_error() {
        let result = read_links(Path::new("/nonexistent/links.txt"));
        assert!(matches!(result, Err(SetupError::ReadLinks { .. })));
    }
}
