//! Content digests for artifact versions
//!
//! Files hash their bytes. Directories hash each file's relative path and
//! digest in sorted order, so the result does not depend on directory
//! iteration order.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Digest plus total content size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    /// `sha256:<hex>`
    pub cas_hash: String,
    /// Total bytes hashed.
    pub size_bytes: u64,
}

/// Hash a file or directory tree.
///
/// # Errors
///
/// Returns any IO error hit while walking or reading the content.
pub fn digest_path(path: &Path) -> io::Result<ContentDigest> {
    if path.is_dir() {
        digest_dir(path)
    } else {
        let (hex, size) = hash_file(path)?;
        Ok(ContentDigest {
            cas_hash: format!("sha256:{hex}"),
            size_bytes: size,
        })
    }
}

fn hash_file(path: &Path) -> io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let size = io::copy(&mut file, &mut hasher)?;
    Ok((format!("{:x}", hasher.finalize()), size))
}

fn digest_dir(root: &Path) -> io::Result<ContentDigest> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    let mut total = 0u64;
    for relative in &files {
        let (hex, size) = hash_file(&root.join(relative))?;
        // Normalize separators so the digest is platform independent
        let key = relative.to_string_lossy().replace('\\', "/");
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
        hasher.update(hex.as_bytes());
        hasher.update([b'\n']);
        total += size;
    }

    Ok(ContentDigest {
        cas_hash: format!("sha256:{:x}", hasher.finalize()),
        size_bytes: total,
    })
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_path_buf());
        }
    }
    Ok(())
}

/// Copy a file or directory tree to `dest`.
///
/// # Errors
///
/// Returns any IO error hit while creating directories or copying files.
pub fn copy_content(src: &Path, dest: &Path) -> io::Result<()> {
    if src.is_dir() {
        fs::create_dir_all(dest)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_content(&entry.path(), &dest.join(entry.file_name()))?;
        }
    } else {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dest)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_digest_known_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, b"").unwrap();

        let digest = digest_path(&path).unwrap();
        assert_eq!(
            digest.cas_hash,
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(digest.size_bytes, 0);
    }

    #[test]
    fn test_dir_digest_survives_copy() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("model");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("model.json"), br#"{"flavor":"mean","value":1.0}"#).unwrap();
        fs::write(src.join("nested/notes.txt"), b"hello").unwrap();

        let dest = dir.path().join("copy");
        copy_content(&src, &dest).unwrap();

        let a = digest_path(&src).unwrap();
        let b = digest_path(&dest).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.size_bytes, 29 + 5);
    }

    #[test]
    fn test_dir_digest_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"one").unwrap();
        let before = digest_path(dir.path()).unwrap();
        fs::write(dir.path().join("a.txt"), b"two").unwrap();
        let after = digest_path(dir.path()).unwrap();
        assert_ne!(before.cas_hash, after.cas_hash);
    }
}
