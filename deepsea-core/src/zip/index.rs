//! Sorted path index over an archive's central directory: canonicalized
//! lookup (`pathStatus`), and per-directory child spans for iteration.
//!
//! Entries sort as their on-disk name would (directories carrying their
//! trailing `/`), which is why `"common/prefix file"` sorts before the
//! directory `"common/prefix"` and after nothing else: `' '` (0x20) is
//! less than `'/'` (0x2F) at the first differing byte.

use std::collections::HashMap;

use super::central_directory::CentralDirectoryEntry;

/// Result of a [`ZipIndex::path_status`] query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    ExistsFile,
    ExistsDirectory,
    Missing,
}

/// Canonicalizes a path: strips a leading `./`, collapses repeated `/`,
/// and drops a trailing `/` (directory paths are tracked separately from
/// their textual form).
pub fn canonicalize(path: &str) -> String {
    let trimmed = path.strip_prefix("./").unwrap_or(path);
    let mut out = String::with_capacity(trimmed.len());
    let mut last_was_slash = false;
    for c in trimmed.chars() {
        if c == '/' {
            if last_was_slash {
                continue;
            }
            last_was_slash = true;
        } else {
            last_was_slash = false;
        }
        out.push(c);
    }
    while out.ends_with('/') {
        out.pop();
    }
    out
}

struct Entry {
    path: String,
    is_directory: bool,
    central_index: Option<usize>,
}

impl Entry {
    fn sort_key(&self) -> String {
        if self.is_directory {
            format!("{}/", self.path)
        } else {
            self.path.clone()
        }
    }
}

/// The sorted path index over one archive's entries.
pub struct ZipIndex {
    entries: Vec<Entry>,
    by_path: HashMap<String, usize>,
}

impl ZipIndex {
    /// Builds an index from parsed central directory entries, synthesizing
    /// implicit parent directories for any path that isn't itself listed.
    pub fn build(central: &[CentralDirectoryEntry]) -> Self {
        let mut entries: Vec<Entry> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (i, record) in central.iter().enumerate() {
            let is_directory = record.name.ends_with('/');
            let path = canonicalize(&record.name);
            if path.is_empty() {
                continue;
            }
            let slot = Entry { path: path.clone(), is_directory, central_index: Some(i) };
            match seen.get(&path) {
                Some(&existing) => entries[existing] = slot,
                None => {
                    seen.insert(path, entries.len());
                    entries.push(slot);
                }
            }
        }

        for record in central {
            let path = canonicalize(&record.name);
            let segments: Vec<&str> = path.split('/').collect();
            for depth in 1..segments.len() {
                let ancestor = segments[..depth].join("/");
                if ancestor.is_empty() || seen.contains_key(&ancestor) {
                    continue;
                }
                seen.insert(ancestor.clone(), entries.len());
                entries.push(Entry { path: ancestor, is_directory: true, central_index: None });
            }
        }

        entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let by_path = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.path.clone(), i))
            .collect();

        ZipIndex { entries, by_path }
    }

    /// Looks up the canonicalized `path`'s status.
    pub fn path_status(&self, path: &str) -> PathStatus {
        let canonical = canonicalize(path);
        match self.by_path.get(&canonical) {
            Some(&i) if self.entries[i].is_directory => PathStatus::ExistsDirectory,
            Some(_) => PathStatus::ExistsFile,
            None => PathStatus::Missing,
        }
    }

    /// The central directory index backing `path`, if it names a file
    /// explicitly stored in the archive (not a synthesized directory).
    pub fn central_index(&self, path: &str) -> Option<usize> {
        let canonical = canonicalize(path);
        self.by_path.get(&canonical).and_then(|&i| self.entries[i].central_index)
    }

    /// Lists the immediate children of `path` (empty string = root), in
    /// sort order.
    pub fn list_directory(&self, path: &str) -> Vec<(String, PathStatus)> {
        let canonical = canonicalize(path);
        let prefix = if canonical.is_empty() { String::new() } else { format!("{canonical}/") };

        self.entries
            .iter()
            .filter_map(|entry| {
                let remainder = entry.path.strip_prefix(&prefix)?;
                if remainder.is_empty() || remainder.contains('/') {
                    return None;
                }
                let status = if entry.is_directory { PathStatus::ExistsDirectory } else { PathStatus::ExistsFile };
                Some((remainder.to_string(), status))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> CentralDirectoryEntry {
        CentralDirectoryEntry {
            name: name.to_string(),
            compression_method: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            local_header_offset: 0,
        }
    }

    #[test]
    fn path_status_matches_reference_scenario() {
        let central = vec![
            entry("directory/"),
            entry("directory/third"),
            entry("directory/fourth"),
            entry("first"),
            entry("second"),
            entry("empty/"),
        ];
        let index = ZipIndex::build(&central);

        assert_eq!(index.path_status("directory"), PathStatus::ExistsDirectory);
        assert_eq!(index.path_status("directory/third"), PathStatus::ExistsFile);
        assert_eq!(index.path_status("director"), PathStatus::Missing);

        let root = index.list_directory(".");
        assert_eq!(
            root,
            vec![
                ("directory".to_string(), PathStatus::ExistsDirectory),
                ("empty".to_string(), PathStatus::ExistsDirectory),
                ("first".to_string(), PathStatus::ExistsFile),
                ("second".to_string(), PathStatus::ExistsFile),
            ]
        );
    }

    #[test]
    fn shared_prefixes_do_not_match() {
        let central = vec![entry("common/prefix"), entry("common/prefix1")];
        let index = ZipIndex::build(&central);
        assert_eq!(index.path_status("common/prefix"), PathStatus::ExistsFile);
        assert_eq!(index.path_status("common/prefix1"), PathStatus::ExistsFile);
    }

    #[test]
    fn list_directory_orders_file_before_sibling_directory() {
        let central = vec![
            entry("common/prefix file"),
            entry("common/prefix/first"),
            entry("common/prefix/second"),
            entry("common/prefix1"),
        ];
        let index = ZipIndex::build(&central);
        let listing = index.list_directory("common");
        assert_eq!(
            listing,
            vec![
                ("prefix file".to_string(), PathStatus::ExistsFile),
                ("prefix".to_string(), PathStatus::ExistsDirectory),
                ("prefix1".to_string(), PathStatus::ExistsFile),
            ]
        );
    }
}
