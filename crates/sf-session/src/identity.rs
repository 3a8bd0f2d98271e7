//! Anonymous identity persistence.
//!
//! The identity is generated once, persisted under a fixed key and reused on
//! every load until the user deletes their data.

use rand::Rng;
use sf_api_types::AnonId;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::SessionError;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Key/value persistence for the identity string (localStorage in a browser).
pub trait IdentityStore {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn clear(&self, key: &str) -> Result<(), SessionError>;
}

/// `user_<epoch ms>_<9 base36 chars>`. Only uniqueness matters.
pub fn generate_identity<R: Rng + ?Sized>(now_ms: u64, rng: &mut R) -> AnonId {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    AnonId(format!("user_{now_ms}_{suffix}"))
}

#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemoryIdentityStore {
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .values
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        store
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.values
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), SessionError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// Small JSON object file mapping keys to values.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(storage_error(&self.path, err)),
        };
        serde_json::from_slice(&raw).map_err(|err| storage_error(&self.path, err))
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if values.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(err) if err.kind() != ErrorKind::NotFound => Err(storage_error(&self.path, err)),
                _ => Ok(()),
            };
        }

        let body = serde_json::to_vec(values).map_err(|err| storage_error(&self.path, err))?;
        fs::write(&self.path, body).map_err(|err| storage_error(&self.path, err))
    }
}

fn storage_error(path: &Path, err: impl std::fmt::Display) -> SessionError {
    SessionError::Storage(format!("{}: {err}", path.display()))
}

impl IdentityStore for FileIdentityStore {
    fn load(&self, key: &str) -> Option<String> {
        self.read_all()
            .ok()?
            .remove(key)
            .filter(|value| !value.is_empty())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.read_all()?;
        values.insert(key.to_owned(), value.to_owned());
        self.write_all(&values)
    }

    fn clear(&self, key: &str) -> Result<(), SessionError> {
        let mut values = self.read_all()?;
        values.remove(key);
        self.write_all(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generated_identity_has_time_and_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = generate_identity(1_700_000_000_000, &mut rng);
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts[0], "user");
        assert_eq!(parts[1], "1700000000000");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| SUFFIX_ALPHABET.contains(&b)));
    }

    #[test]
    fn identities_differ_between_draws() {
        let mut rng = StdRng::seed_from_u64(11);
        let a = generate_identity(5, &mut rng);
        let b = generate_identity(5, &mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn file_store_roundtrip_and_clear() {
        let path = std::env::temp_dir().join(format!(
            "shopflow-identity-{}-{}",
            std::process::id(),
            rand::random::<u32>()
        ));
        let store = FileIdentityStore::new(&path);
        assert_eq!(store.load("anon_id"), None);

        store.save("anon_id", "user_1_abc").unwrap();
        store.save("other", "x").unwrap();
        assert_eq!(store.load("anon_id").as_deref(), Some("user_1_abc"));

        store.clear("anon_id").unwrap();
        assert_eq!(store.load("anon_id"), None);
        assert_eq!(store.load("other").as_deref(), Some("x"));

        store.clear("other").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn file_store_keeps_separators_and_newlines() {
        let path = std::env::temp_dir().join(format!(
            "shopflow-identity-{}-{}",
            std::process::id(),
            rand::random::<u32>()
        ));
        let store = FileIdentityStore::new(&path);

        store.save("a=b", "x").unwrap();
        store.save("multi", "line one\nline=two").unwrap();
        assert_eq!(store.load("a=b").as_deref(), Some("x"));
        assert_eq!(store.load("a"), None);
        assert_eq!(store.load("multi").as_deref(), Some("line one\nline=two"));

        store.clear("a=b").unwrap();
        store.clear("multi").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let path = std::env::temp_dir().join(format!(
            "shopflow-identity-{}-{}",
            std::process::id(),
            rand::random::<u32>()
        ));
        fs::write(&path, "anon_id=user_1_abc\n").unwrap();
        let store = FileIdentityStore::new(&path);

        assert_eq!(store.load("anon_id"), None);
        assert!(matches!(store.save("anon_id", "y"), Err(SessionError::Storage(_))));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn memory_store_clear_removes_value() {
        let store = MemoryIdentityStore::with_value("anon_id", "user_2_xyz");
        assert_eq!(store.load("anon_id").as_deref(), Some("user_2_xyz"));
        store.clear("anon_id").unwrap();
        assert_eq!(store.load("anon_id"), None);
    }
}
