use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::HashMap;
use std::sync::Mutex;

/// Decoded length of a storage account key, in bytes.
pub const ACCOUNT_KEY_LEN: usize = 64;

/// Validate the format of a storage account key.
///
/// A key must decode as standard base64 to exactly 64 bytes. This is wired
/// into the prompt widget's validation hook so a bad entry re-prompts
/// instead of failing the run.
pub fn validate_account_key(value: &str) -> Result<(), String> {
    match BASE64.decode(value.trim()) {
        Ok(bytes) if bytes.len() == ACCOUNT_KEY_LEN => Ok(()),
        Ok(bytes) => Err(format!(
            "account key must decode to {} bytes, got {}",
            ACCOUNT_KEY_LEN,
            bytes.len()
        )),
        Err(_) => Err("account key is not valid base64".to_string()),
    }
}

/// Session-lifetime cache of account keys, keyed by account name.
///
/// Account names are cached exactly as the locator parser captured them.
/// Nothing is ever written to disk; the cache dies with the process. The
/// mutex exists only because the context shares the cache behind an `Arc` —
/// the pipeline itself is strictly sequential.
pub struct SecretCache {
    entries: Mutex<HashMap<String, String>>,
}

impl SecretCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Last key entered for this account, if any.
    pub fn get(&self, account: &str) -> Option<String> {
        self.entries.lock().unwrap().get(account).cloned()
    }

    /// Remember the key entered for this account.
    pub fn insert(&self, account: &str, key: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(account.to_string(), key.to_string());
    }
}

impl Default for SecretCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well_formed_key() -> String {
        BASE64.encode([7u8; ACCOUNT_KEY_LEN])
    }

    #[test]
    fn test_accepts_64_byte_key() {
        assert!(validate_account_key(&well_formed_key()).is_ok());
    }

    #[test]
    fn test_accepts_key_with_surrounding_whitespace() {
        let key = format!("  {}\n", well_formed_key());
        assert!(validate_account_key(&key).is_ok());
    }

    #[test]
    fn test_rejects_empty_key() {
        assert!(validate_account_key("").is_err());
    }

    #[test]
    fn test_rejects_wrong_length() {
        let short = BASE64.encode([7u8; 32]);
        let err = validate_account_key(&short).unwrap_err();
        assert!(err.contains("64 bytes"));
    }

    #[test]
    fn test_rejects_non_base64() {
        assert!(validate_account_key("!!! not base64 !!!").is_err());
    }

    #[test]
    fn test_cache_round_trip() {
        let cache = SecretCache::new();
        assert_eq!(cache.get("acct"), None);
        cache.insert("acct", "key-one");
        assert_eq!(cache.get("acct").as_deref(), Some("key-one"));

        // Last entry wins
        cache.insert("acct", "key-two");
        assert_eq!(cache.get("acct").as_deref(), Some("key-two"));
    }

    #[test]
    fn test_cache_keys_are_case_sensitive() {
        let cache = SecretCache::new();
        cache.insert("acct", "key");
        assert_eq!(cache.get("Acct"), None);
    }
}
