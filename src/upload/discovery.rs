use std::path::PathBuf;
use walkdir::WalkDir;

use super::{media_type_for_name, FileBlob};

/// Expand paths given on the command line into file blobs. Directories are
/// walked for files with a known image extension; plain files are taken as
/// given so validation can report them.
pub fn discover_files(paths: &[PathBuf]) -> Vec<FileBlob> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .and_then(media_type_for_name)
                        .map_or(false, |t| t.starts_with("image/"))
                })
                .collect();

            // Sort by path for consistent ordering
            found.sort();
            for p in found {
                match FileBlob::from_path(&p) {
                    Ok(blob) => files.push(blob),
                    Err(e) => tracing::warn!("Skipping {}: {}", p.display(), e),
                }
            }
        } else {
            match FileBlob::from_path(path) {
                Ok(blob) => files.push(blob),
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_discover_files() {
        let dir = tempdir().unwrap();

        File::create(dir.path().join("photo1.jpg")).unwrap();
        File::create(dir.path().join("photo2.png")).unwrap();
        File::create(dir.path().join("document.txt")).unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        File::create(dir.path().join("subdir/photo3.jpeg")).unwrap();

        let explicit = dir.path().join("document.txt");
        let files = discover_files(&[dir.path().to_path_buf(), explicit]);

        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["photo1.jpg", "photo2.png", "photo3.jpeg", "document.txt"]);
        assert_eq!(files[3].media_type, "text/plain");
    }
}
