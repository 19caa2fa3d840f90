//! Image corpus discovery.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Recursively collect every `.jpg` file under `root`.
///
/// The suffix check is literal and case-sensitive (`.jpeg`, `.png` and
/// `.JPG` are deliberately skipped). Results are full paths sorted in
/// ascending lexicographic order by path string. Unreadable directory
/// entries are skipped.
pub fn discover_jpgs(root: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".jpg"))
        .map(|e| e.path().to_owned())
        .collect();

    // Byte-wise comparison on the whole path, not component-wise.
    images.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Temp directory removed on drop.
    struct TempTree(PathBuf);

    impl TempTree {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "facematch-corpus-{tag}-{}",
                std::process::id()
            ));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn touch(&self, rel: &str) {
            let path = self.0.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"").unwrap();
        }
    }

    impl Drop for TempTree {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_recursive_jpg_only_sorted() {
        let tree = TempTree::new("basic");
        tree.touch("a.jpg");
        tree.touch("sub/b.jpg");
        tree.touch("c.png");

        let found = discover_jpgs(&tree.0);
        let rel: Vec<String> = found
            .iter()
            .map(|p| {
                p.strip_prefix(&tree.0)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(rel, vec!["a.jpg".to_string(), "sub/b.jpg".to_string()]);
    }

    #[test]
    fn test_suffix_is_case_sensitive() {
        let tree = TempTree::new("case");
        tree.touch("upper.JPG");
        tree.touch("lower.jpg");
        tree.touch("alt.jpeg");

        let found = discover_jpgs(&tree.0);
        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("lower.jpg"));
    }

    #[test]
    fn test_empty_folder() {
        let tree = TempTree::new("empty");
        assert!(discover_jpgs(&tree.0).is_empty());
    }

    #[test]
    fn test_deeply_nested() {
        let tree = TempTree::new("nested");
        tree.touch("x/y/z/deep.jpg");
        tree.touch("top.jpg");

        let found = discover_jpgs(&tree.0);
        assert_eq!(found.len(), 2);
        assert!(found[0].ends_with("top.jpg"));
        assert!(found[1].ends_with("deep.jpg"));
    }
}
