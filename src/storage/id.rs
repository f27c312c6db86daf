//! Object ids.
//!
//! An id is five lowercase hex groups followed by the original file name:
//!
//! ```text
//! 3c72aedc-ba25-11e6-569a-406c8f413974-original-filename.jpg
//! └──────────── shard groups ────────┘ └──── filename ────┘
//! ```
//!
//! The groups become nested directories (or key prefixes) in a store, which
//! keeps any one directory small. The filename may itself contain dashes;
//! only the first five are separators.

use super::StorageError;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Lengths of the five shard groups, uuid style.
const GROUP_LENGTHS: [usize; 5] = [8, 4, 4, 4, 12];

/// Parsed, lowercased object id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId {
    groups: [String; 5],
    filename: String,
}

impl ObjectId {
    /// The five shard groups, outermost first.
    pub fn groups(&self) -> &[String; 5] {
        &self.groups
    }

    /// Name the original was uploaded under.
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            write!(f, "{group}-")?;
        }
        f.write_str(&self.filename)
    }
}

impl FromStr for ObjectId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StorageError::InvalidId(s.to_string());
        let lowered = s.trim().to_lowercase();
        let mut parts = lowered.splitn(6, '-');

        let mut groups: [String; 5] = Default::default();
        for group in groups.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *group = part.to_string();
        }

        let filename = parts.next().ok_or_else(invalid)?;
        if !is_plain_filename(filename) {
            return Err(invalid());
        }

        Ok(Self {
            groups,
            filename: filename.to_string(),
        })
    }
}

/// A single path component: non-empty, no separators, not `.` or `..`.
pub fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Derive a content-addressed id for a local file.
///
/// The groups are the first 32 hex digits of the file's SHA-256, so
/// uploading the same bytes twice yields the same id and trips the
/// `FileExists` check instead of storing a duplicate.
pub fn generate_id(path: &Path) -> Result<ObjectId, StorageError> {
    if !path.is_file() {
        return Err(StorageError::LocalFileNotFound(path.display().to_string()));
    }
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_lowercase)
        .filter(|n| is_plain_filename(n))
        .ok_or_else(|| StorageError::InvalidId(path.display().to_string()))?;

    let digest = format!("{:x}", Sha256::digest(std::fs::read(path)?));
    let mut rest = digest.as_str();
    let mut groups: [String; 5] = Default::default();
    for (group, len) in groups.iter_mut().zip(GROUP_LENGTHS) {
        let (head, tail) = rest.split_at(len);
        *group = head.to_string();
        rest = tail;
    }

    Ok(ObjectId { groups, filename })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_dashes_in_filename() {
        let id: ObjectId = "3c72aedc-ba25-11e6-569a-406c8f413974-my-photo.jpg"
            .parse()
            .unwrap();
        assert_eq!(id.groups()[0], "3c72aedc");
        assert_eq!(id.groups()[4], "406c8f413974");
        assert_eq!(id.filename(), "my-photo.jpg");
    }

    #[test]
    fn parse_lowercases_everything() {
        let id: ObjectId = "3C72AEDC-BA25-11E6-569A-406C8F413974-Photo.JPG"
            .parse()
            .unwrap();
        assert_eq!(
            id.to_string(),
            "3c72aedc-ba25-11e6-569a-406c8f413974-photo.jpg"
        );
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        for bad in [
            "",
            "photo.jpg",
            "3c72aedc-ba25-11e6-569a-406c8f413974",
            "3c72aedc-ba25-11e6-569a-406c8f413974-",
            "3c72aedc--11e6-569a-406c8f413974-photo.jpg",
            "zzzzzzzz-ba25-11e6-569a-406c8f413974-photo.jpg",
            "3c72aedc-ba25-11e6-569a-406c8f413974-..",
            "3c72aedc-ba25-11e6-569a-406c8f413974-a/b.jpg",
        ] {
            assert!(
                matches!(bad.parse::<ObjectId>(), Err(StorageError::InvalidId(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn generate_id_is_content_addressed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let a = tmp.path().join("A.jpg");
        let b = tmp.path().join("b.jpg");
        std::fs::write(&a, b"same bytes").unwrap();
        std::fs::write(&b, b"same bytes").unwrap();

        let id_a = generate_id(&a).unwrap();
        let id_b = generate_id(&b).unwrap();
        assert_eq!(id_a.groups(), id_b.groups());
        assert_eq!(id_a.filename(), "a.jpg");

        let lengths: Vec<usize> = id_a.groups().iter().map(String::len).collect();
        assert_eq!(lengths, GROUP_LENGTHS);
    }

    #[test]
    fn generate_id_round_trips_through_display() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("with-dashes.png");
        std::fs::write(&path, b"pixels").unwrap();

        let id = generate_id(&path).unwrap();
        assert_eq!(id.to_string().parse::<ObjectId>().unwrap(), id);
    }

    #[test]
    fn generate_id_missing_file() {
        let result = generate_id(Path::new("/nonexistent/photo.jpg"));
        assert!(matches!(result, Err(StorageError::LocalFileNotFound(_))));
    }
}
