//! Content-hash cache for image outputs.
//!
//! Resizing is the slowest part of a build, so every file the image registry
//! writes into the cache directory is recorded here together with the hash
//! of the source it was produced from. The next run skips any output whose
//! recorded source hash still matches.
//!
//! ## Freshness
//!
//! An output is fresh for a source with hash `h` when:
//!
//! 1. the output file exists, **and**
//! 2. the cache map has an entry for it equal to `h`, **or**, when there is
//!    no entry at all, the output file's own hash equals `h`.
//!
//! The second branch covers verbatim copies made before the cache file
//! existed (or after it was deleted): a missing entry does not by itself
//! force a rewrite.
//!
//! ## Storage
//!
//! A flat JSON object mapping absolute output path → SHA-256 hex string,
//! loaded at the start of a run and rewritten at the end. A missing or
//! corrupt file loads as an empty cache.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::Path;

/// Map from absolute output path to the hash of the source it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ImageCache {
    entries: BTreeMap<String, String>,
}

impl ImageCache {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from disk. Returns an empty cache if the file doesn't exist or
    /// can't be parsed.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str(&content) {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable image cache");
                Self::empty()
            }
        }
    }

    /// Write to disk, creating parent directories.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn get(&self, output: &Path) -> Option<&str> {
        self.entries.get(&key(output)).map(String::as_str)
    }

    pub fn insert(&mut self, output: &Path, source_hash: String) {
        self.entries.insert(key(output), source_hash);
    }

    /// Apply updates collected from a parallel batch.
    pub fn extend(&mut self, updates: impl IntoIterator<Item = CacheUpdate>) {
        for update in updates {
            self.entries.insert(update.output, update.source_hash);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `output` is a fresh product of a source with `source_hash`.
    ///
    /// With `trust_existing` set, any existing output counts as fresh and
    /// nothing is hashed.
    pub fn is_fresh(&self, output: &Path, source_hash: &str, trust_existing: bool) -> bool {
        if !output.exists() {
            return false;
        }
        if trust_existing {
            return true;
        }
        match self.get(output) {
            Some(recorded) => recorded == source_hash,
            None => hash_file(output).is_ok_and(|h| h == source_hash),
        }
    }
}

/// A cache write produced while processing one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheUpdate {
    pub output: String,
    pub source_hash: String,
}

impl CacheUpdate {
    pub fn new(output: &Path, source_hash: &str) -> Self {
        Self {
            output: key(output),
            source_hash: source_hash.to_string(),
        }
    }
}

/// Keys are absolute paths. Relative paths resolve against the working
/// directory.
fn key(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn copy(&mut self) {
        self.copies += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }

    pub fn absorb(&mut self, other: CacheStats) {
        self.hits += other.hits;
        self.copies += other.copies;
        self.misses += other.misses;
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total() == 0 {
            return write!(f, "no images");
        }
        write!(
            f,
            "{} cached, {} copied, {} resized ({} total)",
            self.hits,
            self.copies,
            self.misses,
            self.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // Freshness
    // =========================================================================

    #[test]
    fn missing_output_is_stale() {
        let tmp = TempDir::new().unwrap();
        let mut cache = ImageCache::empty();
        let out = tmp.path().join("out.jpg");
        cache.insert(&out, "h".into());
        assert!(!cache.is_fresh(&out, "h", false));
        assert!(!cache.is_fresh(&out, "h", true));
    }

    #[test]
    fn cache_entry_decides_when_present() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out-480.jpg");
        fs::write(&out, "resized bytes").unwrap();

        let mut cache = ImageCache::empty();
        cache.insert(&out, "source-hash".into());
        assert!(cache.is_fresh(&out, "source-hash", false));
        assert!(!cache.is_fresh(&out, "other-hash", false));
    }

    #[test]
    fn no_entry_falls_back_to_output_hash() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.png");
        let out = tmp.path().join("out.png");
        fs::write(&src, "identical").unwrap();
        fs::write(&out, "identical").unwrap();

        let cache = ImageCache::empty();
        let source_hash = hash_file(&src).unwrap();
        assert!(cache.is_fresh(&out, &source_hash, false));

        fs::write(&out, "different").unwrap();
        assert!(!cache.is_fresh(&out, &source_hash, false));
    }

    #[test]
    fn trust_existing_skips_hashing() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out.png");
        fs::write(&out, "anything").unwrap();
        let mut cache = ImageCache::empty();
        cache.insert(&out, "old".into());
        assert!(cache.is_fresh(&out, "new", true));
    }

    // =========================================================================
    // Save / Load
    // =========================================================================

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("nested/images.json");
        let mut cache = ImageCache::empty();
        cache.insert(Path::new("/abs/a-480.jpg"), "s1".into());
        cache.extend([CacheUpdate::new(Path::new("/abs/b.png"), "s2")]);

        cache.save(&file).unwrap();
        let loaded = ImageCache::load(&file);
        assert_eq!(loaded, cache);
        assert_eq!(loaded.get(Path::new("/abs/b.png")), Some("s2"));
    }

    #[test]
    fn on_disk_format_is_flat_object() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("images.json");
        let mut cache = ImageCache::empty();
        cache.insert(Path::new("/x.jpg"), "abc".into());
        cache.save(&file).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"/x.jpg": "abc"}));
    }

    #[test]
    fn keys_are_absolute() {
        let update = CacheUpdate::new(Path::new("cache/img/a-480.jpg"), "h");
        assert!(Path::new(&update.output).is_absolute());
        assert!(update.output.ends_with("a-480.jpg"));

        let mut cache = ImageCache::empty();
        cache.extend([update]);
        let absolute = std::env::current_dir().unwrap().join("cache/img/a-480.jpg");
        assert_eq!(cache.get(&absolute), Some("h"));
        assert_eq!(cache.get(Path::new("cache/img/a-480.jpg")), Some("h"));
    }

    #[test]
    fn load_missing_file_returns_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(ImageCache::load(&tmp.path().join("nope.json")).is_empty());
    }

    #[test]
    fn load_corrupt_json_returns_empty() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("images.json");
        fs::write(&file, "not json").unwrap();
        assert!(ImageCache::load(&file).is_empty());
    }

    // =========================================================================
    // Hashing
    // =========================================================================

    #[test]
    fn hash_file_deterministic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.bin");
        fs::write(&path, b"hello world").unwrap();

        let h1 = hash_file(&path).unwrap();
        let h2 = hash_file(&path).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn hash_file_changes_with_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.bin");

        fs::write(&path, b"version 1").unwrap();
        let h1 = hash_file(&path).unwrap();

        fs::write(&path, b"version 2").unwrap();
        let h2 = hash_file(&path).unwrap();

        assert_ne!(h1, h2);
    }

    // =========================================================================
    // CacheStats
    // =========================================================================

    #[test]
    fn cache_stats_display() {
        let s = CacheStats {
            hits: 3,
            copies: 2,
            misses: 1,
        };
        assert_eq!(format!("{}", s), "3 cached, 2 copied, 1 resized (6 total)");
    }

    #[test]
    fn cache_stats_display_empty() {
        assert_eq!(format!("{}", CacheStats::default()), "no images");
    }

    #[test]
    fn cache_stats_absorb() {
        let mut a = CacheStats {
            hits: 1,
            copies: 0,
            misses: 2,
        };
        a.absorb(CacheStats {
            hits: 1,
            copies: 1,
            misses: 0,
        });
        assert_eq!(a.total(), 5);
    }
}
