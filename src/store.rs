//! Encrypted session storage.
//!
//! A [`KeyValueStore`] is an opaque string-to-string store. [`SessionStore`]
//! layers one typed store/get/delete helper per session attribute on top of
//! it. Values are persisted verbatim; structured values are serialized to JSON
//! text by the caller before they reach the store.
//!
//! ## Encryption
//! [`EncryptedFileStore`] keeps a JSON manifest on disk. The store secret is
//! stretched once with Argon2id into a master key, using a salt kept in the
//! manifest. Every value is sealed with ChaCha20-Poly1305 under a key hashed
//! from the master key, the key name and a per-entry salt, with a fresh nonce
//! on every write.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroize;

use crate::models::{Booking, NotificationSettings, SecuritySettings, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Could not decrypt value for key '{0}'")]
    Crypto(String),
    #[error("Entropy source failed: {0}")]
    Entropy(String),
    #[error("Key derivation failed: {0}")]
    Kdf(String),
    #[error("Unsupported store format version {0}")]
    UnsupportedVersion(u32),
    #[error("Store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque persistent key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> StoreResult<()>;
}

// ==================== MemoryStore ====================

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

// ==================== EncryptedFileStore ====================

/// Argon2id cost parameters for turning the store secret into a master key.
///
/// They are recorded in the manifest, so a store always reopens with the
/// parameters it was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub lanes: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            lanes: 4,
        }
    }
}

impl KdfParams {
    fn derive(&self, secret: &str, salt: &[u8; 16]) -> StoreResult<[u8; 32]> {
        let params = Params::new(self.memory_kib, self.iterations, self.lanes, Some(32))
            .map_err(|e| StoreError::Kdf(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut master = [0u8; 32];
        argon2
            .hash_password_into(secret.as_bytes(), salt, &mut master)
            .map_err(|e| StoreError::Kdf(e.to_string()))?;
        Ok(master)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SealedEntry {
    salt: [u8; 16],
    nonce: [u8; 12],
    ciphertext: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    kdf_salt: [u8; 16],
    #[serde(default)]
    kdf: KdfParams,
    entries: HashMap<String, SealedEntry>,
}

impl Manifest {
    const CURRENT_VERSION: u32 = 2;

    fn fresh(kdf: KdfParams) -> StoreResult<Self> {
        Ok(Self {
            version: Self::CURRENT_VERSION,
            kdf_salt: random_bytes()?,
            kdf,
            entries: HashMap::new(),
        })
    }
}

fn random_bytes<const N: usize>() -> StoreResult<[u8; N]> {
    let mut bytes = [0u8; N];
    getrandom::getrandom(&mut bytes).map_err(|e| StoreError::Entropy(e.to_string()))?;
    Ok(bytes)
}

/// File-backed store with per-value authenticated encryption.
pub struct EncryptedFileStore {
    path: PathBuf,
    master: [u8; 32],
    manifest: Mutex<Manifest>,
}

impl std::fmt::Debug for EncryptedFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Drop for EncryptedFileStore {
    fn drop(&mut self) {
        self.master.zeroize();
    }
}

impl EncryptedFileStore {
    /// Open (or lazily create) the store at `path` with default KDF costs.
    pub fn open(path: impl Into<PathBuf>, secret: &str) -> StoreResult<Self> {
        Self::open_with(path, secret, KdfParams::default())
    }

    /// Like [`open`](Self::open). `kdf` only applies when the store is new.
    pub fn open_with(path: impl Into<PathBuf>, secret: &str, kdf: KdfParams) -> StoreResult<Self> {
        let path = path.into();
        let manifest: Manifest = if path.exists() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice(&bytes)?
        } else {
            Manifest::fresh(kdf)?
        };

        if manifest.version != Manifest::CURRENT_VERSION {
            return Err(StoreError::UnsupportedVersion(manifest.version));
        }

        let master = manifest.kdf.derive(secret, &manifest.kdf_salt)?;

        tracing::debug!("Opened session store at {}", path.display());

        Ok(Self {
            path,
            master,
            manifest: Mutex::new(manifest),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Per-entry key. The key name is length-prefixed so distinct
    /// (name, salt) pairs never hash the same input.
    fn derive_key(&self, key: &str, salt: &[u8; 16]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.master);
        hasher.update((key.len() as u64).to_le_bytes());
        hasher.update(key.as_bytes());
        hasher.update(salt);

        let mut derived = [0u8; 32];
        derived.copy_from_slice(&hasher.finalize());
        derived
    }

    fn seal(&self, key: &str, value: &str) -> StoreResult<SealedEntry> {
        let salt: [u8; 16] = random_bytes()?;
        let nonce: [u8; 12] = random_bytes()?;

        let mut entry_key = self.derive_key(key, &salt);
        let cipher = ChaCha20Poly1305::new_from_slice(&entry_key)
            .map_err(|_| StoreError::Crypto(key.to_string()));
        entry_key.zeroize();
        let ciphertext = cipher?
            .encrypt(Nonce::from_slice(&nonce), value.as_bytes())
            .map_err(|_| StoreError::Crypto(key.to_string()))?;

        Ok(SealedEntry {
            salt,
            nonce,
            ciphertext,
        })
    }

    fn open_entry(&self, key: &str, entry: &SealedEntry) -> StoreResult<String> {
        let mut entry_key = self.derive_key(key, &entry.salt);
        let cipher = ChaCha20Poly1305::new_from_slice(&entry_key)
            .map_err(|_| StoreError::Crypto(key.to_string()));
        entry_key.zeroize();
        let plaintext = cipher?
            .decrypt(Nonce::from_slice(&entry.nonce), entry.ciphertext.as_slice())
            .map_err(|_| StoreError::Crypto(key.to_string()))?;

        String::from_utf8(plaintext).map_err(|_| StoreError::Crypto(key.to_string()))
    }

    /// Write the manifest to a sibling temp file, then rename it into place.
    fn persist(&self, manifest: &Manifest) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(manifest)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for EncryptedFileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let manifest = self.manifest.lock().map_err(|_| StoreError::Poisoned)?;
        manifest
            .entries
            .get(key)
            .map(|entry| self.open_entry(key, entry))
            .transpose()
    }

    // Changes are staged on a copy and only become visible once written.
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let entry = self.seal(key, value)?;
        let mut manifest = self.manifest.lock().map_err(|_| StoreError::Poisoned)?;
        let mut staged = manifest.clone();
        staged.entries.insert(key.to_string(), entry);
        self.persist(&staged)?;
        *manifest = staged;
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let mut manifest = self.manifest.lock().map_err(|_| StoreError::Poisoned)?;
        if !manifest.entries.contains_key(key) {
            return Ok(());
        }
        let mut staged = manifest.clone();
        staged.entries.remove(key);
        self.persist(&staged)?;
        *manifest = staged;
        Ok(())
    }
}

// ==================== Session Keys ====================

/// One key per logical session attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Token,
    Email,
    UserData,
    Theme,
    AccentColour,
    Notifications,
    Security,
    CheckedIn,
    CurrentRoom,
    AppState,
    Otp,
}

impl SessionKey {
    pub const ALL: [SessionKey; 11] = [
        SessionKey::Token,
        SessionKey::Email,
        SessionKey::UserData,
        SessionKey::Theme,
        SessionKey::AccentColour,
        SessionKey::Notifications,
        SessionKey::Security,
        SessionKey::CheckedIn,
        SessionKey::CurrentRoom,
        SessionKey::AppState,
        SessionKey::Otp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SessionKey::Token => "Token",
            SessionKey::Email => "Email",
            SessionKey::UserData => "UserData",
            SessionKey::Theme => "Theme",
            SessionKey::AccentColour => "accentColour",
            SessionKey::Notifications => "Notifications",
            SessionKey::Security => "Security",
            SessionKey::CheckedIn => "CheckedIn",
            SessionKey::CurrentRoom => "CurrentRoom",
            SessionKey::AppState => "AppState",
            SessionKey::Otp => "Otp",
        }
    }
}

/// Where the user is in the authentication flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    LoggedIn,
    LoggedOut,
    VerifyOtpLogin,
    VerifyOtpRegister,
    ResetPassword,
}

impl AppState {
    pub fn as_str(self) -> &'static str {
        match self {
            AppState::LoggedIn => "logged_in",
            AppState::LoggedOut => "logged_out",
            AppState::VerifyOtpLogin => "verify_otp_login",
            AppState::VerifyOtpRegister => "verify_otp_register",
            AppState::ResetPassword => "reset_password",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "logged_in" => Some(AppState::LoggedIn),
            "logged_out" => Some(AppState::LoggedOut),
            "verify_otp_login" => Some(AppState::VerifyOtpLogin),
            "verify_otp_register" => Some(AppState::VerifyOtpRegister),
            "reset_password" => Some(AppState::ResetPassword),
            _ => None,
        }
    }
}

// ==================== SessionStore ====================

/// Typed session helpers over a [`KeyValueStore`].
#[derive(Debug)]
pub struct SessionStore<S> {
    backend: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn store(&self, key: SessionKey, value: &str) -> StoreResult<()> {
        self.backend.set(key.as_str(), value)
    }

    pub fn get(&self, key: SessionKey) -> StoreResult<Option<String>> {
        self.backend.get(key.as_str())
    }

    pub fn delete(&self, key: SessionKey) -> StoreResult<()> {
        self.backend.delete(key.as_str())
    }

    /// Parse a JSON value, logging and discarding anything malformed.
    fn get_json<T: DeserializeOwned>(&self, key: SessionKey) -> StoreResult<Option<T>> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Ignoring malformed {} entry: {}", key.as_str(), e);
                Ok(None)
            }
        }
    }

    // --- Token ---

    pub fn store_token(&self, value: &str) -> StoreResult<()> {
        self.store(SessionKey::Token, value)
    }

    pub fn get_token(&self) -> StoreResult<Option<String>> {
        self.get(SessionKey::Token)
    }

    pub fn delete_token(&self) -> StoreResult<()> {
        self.delete(SessionKey::Token)
    }

    // --- Email ---

    pub fn store_user_email(&self, value: &str) -> StoreResult<()> {
        self.store(SessionKey::Email, value)
    }

    pub fn get_user_email(&self) -> StoreResult<Option<String>> {
        self.get(SessionKey::Email)
    }

    pub fn delete_user_email(&self) -> StoreResult<()> {
        self.delete(SessionKey::Email)
    }

    // --- User data ---

    pub fn store_user_data(&self, value: &str) -> StoreResult<()> {
        self.store(SessionKey::UserData, value)
    }

    pub fn get_user_data(&self) -> StoreResult<Option<String>> {
        self.get(SessionKey::UserData)
    }

    pub fn delete_user_data(&self) -> StoreResult<()> {
        self.delete(SessionKey::UserData)
    }

    pub fn user(&self) -> StoreResult<Option<User>> {
        self.get_json(SessionKey::UserData)
    }

    // --- Appearance ---

    pub fn store_theme(&self, value: &str) -> StoreResult<()> {
        self.store(SessionKey::Theme, value)
    }

    pub fn get_theme(&self) -> StoreResult<Option<String>> {
        self.get(SessionKey::Theme)
    }

    pub fn delete_theme(&self) -> StoreResult<()> {
        self.delete(SessionKey::Theme)
    }

    pub fn store_accent_colour(&self, value: &str) -> StoreResult<()> {
        self.store(SessionKey::AccentColour, value)
    }

    pub fn get_accent_colour(&self) -> StoreResult<Option<String>> {
        self.get(SessionKey::AccentColour)
    }

    pub fn delete_accent_colour(&self) -> StoreResult<()> {
        self.delete(SessionKey::AccentColour)
    }

    // --- Settings ---

    pub fn store_notification_settings(&self, value: &str) -> StoreResult<()> {
        self.store(SessionKey::Notifications, value)
    }

    pub fn get_notification_settings(&self) -> StoreResult<Option<String>> {
        self.get(SessionKey::Notifications)
    }

    pub fn notification_settings(&self) -> StoreResult<Option<NotificationSettings>> {
        self.get_json(SessionKey::Notifications)
    }

    pub fn delete_notification_settings(&self) -> StoreResult<()> {
        self.delete(SessionKey::Notifications)
    }

    pub fn store_security_settings(&self, value: &str) -> StoreResult<()> {
        self.store(SessionKey::Security, value)
    }

    pub fn get_security_settings(&self) -> StoreResult<Option<String>> {
        self.get(SessionKey::Security)
    }

    pub fn security_settings(&self) -> StoreResult<Option<SecuritySettings>> {
        self.get_json(SessionKey::Security)
    }

    pub fn delete_security_settings(&self) -> StoreResult<()> {
        self.delete(SessionKey::Security)
    }

    // --- Check-in ---

    pub fn store_checked_in(&self, checked_in: bool) -> StoreResult<()> {
        self.store(SessionKey::CheckedIn, if checked_in { "true" } else { "false" })
    }

    pub fn get_checked_in(&self) -> StoreResult<Option<String>> {
        self.get(SessionKey::CheckedIn)
    }

    pub fn is_checked_in(&self) -> StoreResult<bool> {
        Ok(self.get_checked_in()?.as_deref() == Some("true"))
    }

    pub fn store_current_room(&self, value: &str) -> StoreResult<()> {
        self.store(SessionKey::CurrentRoom, value)
    }

    pub fn get_current_room(&self) -> StoreResult<Option<String>> {
        self.get(SessionKey::CurrentRoom)
    }

    pub fn current_room(&self) -> StoreResult<Option<Booking>> {
        self.get_json(SessionKey::CurrentRoom)
    }

    pub fn delete_current_room(&self) -> StoreResult<()> {
        self.delete(SessionKey::CurrentRoom)
    }

    // --- Auth flow ---

    pub fn set_state(&self, state: AppState) -> StoreResult<()> {
        self.store(SessionKey::AppState, state.as_str())
    }

    pub fn app_state(&self) -> StoreResult<Option<AppState>> {
        Ok(self.get(SessionKey::AppState)?.as_deref().and_then(AppState::parse))
    }

    pub fn store_otp(&self, value: &str) -> StoreResult<()> {
        self.store(SessionKey::Otp, value)
    }

    pub fn get_otp(&self) -> StoreResult<Option<String>> {
        self.get(SessionKey::Otp)
    }

    pub fn delete_otp(&self) -> StoreResult<()> {
        self.delete(SessionKey::Otp)
    }

    /// Remove every session key. `CheckedIn` is reset to `"false"` rather
    /// than removed.
    pub fn delete_all_data(&self) -> StoreResult<()> {
        for key in SessionKey::ALL {
            if key != SessionKey::CheckedIn {
                self.delete(key)?;
            }
        }
        self.store_checked_in(false)
    }
}
