//! Session persistence and the in-memory session manager

use parking_lot::RwLock;
use propdesk_core::{AdminUser, Result, Session};
use std::fmt;
use tracing::{debug, warn};

/// Where a session survives between runs
///
/// Implementations are synchronous: browser storage and small local files
/// never justify an async round trip.
pub trait SessionStore: Send + Sync {
    /// Read the stored session, `None` when nothing usable is stored
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage cannot be read at all.
    fn load(&self) -> Result<Option<Session>>;

    /// Persist `session`, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns an error when the session cannot be written.
    fn save(&self, session: &Session) -> Result<()>;

    /// Forget the stored session
    ///
    /// # Errors
    ///
    /// Returns an error when the stored session cannot be removed.
    fn clear(&self) -> Result<()>;
}

/// Store that keeps the session for the lifetime of the process only
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `session`
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: RwLock::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.slot.read().clone())
    }

    fn save(&self, session: &Session) -> Result<()> {
        *self.slot.write() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.write() = None;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::{write_private_file, FileSessionStore};

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::SessionStore;
    use propdesk_core::{Error, Result, Session};
    use std::{
        fs,
        io::{self, Write},
        path::{Path, PathBuf},
    };
    use tracing::warn;

    /// Store that keeps the session as JSON in a local file
    #[derive(Debug, Clone)]
    pub struct FileSessionStore {
        path: PathBuf,
    }

    impl FileSessionStore {
        /// Store backed by `path`; nothing is touched until the first save
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// File the session is written to
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl SessionStore for FileSessionStore {
        fn load(&self) -> Result<Option<Session>> {
            let contents = match fs::read_to_string(&self.path) {
                Ok(contents) => contents,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(Error::Io(e)),
            };

            match serde_json::from_str(&contents) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Ignoring unreadable session file"
                    );
                    Ok(None)
                }
            }
        }

        fn save(&self, session: &Session) -> Result<()> {
            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }

            let contents = serde_json::to_vec_pretty(session)?;
            let tmp = self.path.with_extension("json.tmp");
            write_private_file(&tmp, &contents)?;
            fs::rename(&tmp, &self.path)?;
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(Error::Io(e)),
            }
        }
    }

    /// Write `contents` to `path` so that only the owner can read it
    ///
    /// On Unix the file is created with mode 0600, and an existing file is
    /// narrowed to 0600 before anything is written to it.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from opening, restricting or writing the file.
    pub fn write_private_file(path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(contents)?;
        file.sync_all()
    }
}

/// Current session plus the store it is mirrored to
///
/// Memory is the source of truth. Writes go to memory first and are then
/// persisted; a failing store is logged and never invalidates the session
/// the process is already using.
pub struct SessionManager {
    current: RwLock<Option<Session>>,
    store: Box<dyn SessionStore>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Manager with no session loaded yet
    pub fn new(store: impl SessionStore + 'static) -> Self {
        Self {
            current: RwLock::new(None),
            store: Box::new(store),
        }
    }

    /// Manager using a [`MemorySessionStore`]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemorySessionStore::new())
    }

    /// Load the stored session into memory
    ///
    /// Returns the restored user. Storage errors are logged and treated as
    /// "no session".
    pub fn restore(&self) -> Option<AdminUser> {
        let loaded = match self.store.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to load stored session");
                None
            }
        };

        let user = loaded.as_ref().map(|s| s.user.clone());
        if let Some(user) = &user {
            debug!(user = %user.email, "Restored stored session");
        }
        *self.current.write() = loaded;
        user
    }

    /// Replace the current session and persist it
    pub fn set(&self, session: Session) {
        *self.current.write() = Some(session.clone());
        self.persist(&session);
    }

    /// Replace the current session only while it still carries
    /// `access_token`
    ///
    /// Returns `false`, leaving memory and storage alone, when the session
    /// was cleared or replaced in the meantime.
    pub fn replace_if_current(&self, access_token: &str, session: Session) -> bool {
        {
            let mut current = self.current.write();
            match current.as_ref() {
                Some(existing) if existing.access_token == access_token => {}
                _ => return false,
            }
            *current = Some(session.clone());
        }

        self.persist(&session);
        true
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.store.save(session) {
            warn!(error = %e, "Failed to persist session");
        }
    }

    /// Drop the current session from memory and storage
    pub fn clear(&self) {
        *self.current.write() = None;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
    }

    /// Copy of the current session
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    /// Current access token
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.access_token.clone())
    }

    /// Signed-in user
    #[must_use]
    pub fn user(&self) -> Option<AdminUser> {
        self.current.read().as_ref().map(|s| s.user.clone())
    }

    /// Replace the stored user, keeping the tokens
    pub fn update_user(&self, user: AdminUser) {
        let updated = {
            let mut current = self.current.write();
            let Some(session) = current.as_mut() else {
                return;
            };
            session.user = user;
            session.clone()
        };

        self.persist(&updated);
    }

    /// Whether a session is loaded
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use pretty_assertions::assert_eq;
    use propdesk_core::{AdminRole, Error};
    use std::sync::{Arc, OnceLock, Weak};
    use uuid::Uuid;

    fn session(access: &str) -> Session {
        Session {
            access_token: access.to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now() + TimeDelta::minutes(15),
            user: AdminUser {
                id: Uuid::from_u128(1),
                email: "ops@propdesk.test".to_string(),
                name: "Ops".to_string(),
                role: AdminRole::Admin,
            },
        }
    }

    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn load(&self) -> Result<Option<Session>> {
            Err(Error::Storage("unavailable".to_string()))
        }

        fn save(&self, _session: &Session) -> Result<()> {
            Err(Error::Storage("quota exceeded".to_string()))
        }

        fn clear(&self) -> Result<()> {
            Err(Error::Storage("unavailable".to_string()))
        }
    }

    /// Records the in-memory token the manager holds at each save
    #[derive(Default)]
    struct ObservingStore {
        manager: Arc<OnceLock<Weak<SessionManager>>>,
        seen: Arc<parking_lot::Mutex<Vec<Option<String>>>>,
    }

    impl SessionStore for ObservingStore {
        fn load(&self) -> Result<Option<Session>> {
            Ok(None)
        }

        fn save(&self, _session: &Session) -> Result<()> {
            let in_memory = self
                .manager
                .get()
                .and_then(Weak::upgrade)
                .and_then(|manager| manager.access_token());
            self.seen.lock().push(in_memory);
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_manager_starts_empty_until_restored() {
        let manager = SessionManager::new(MemorySessionStore::with_session(session("a")));
        assert!(!manager.is_authenticated());

        let user = manager.restore().unwrap();
        assert_eq!(user.email, "ops@propdesk.test");
        assert_eq!(manager.access_token().as_deref(), Some("a"));
    }

    #[test]
    fn test_set_and_clear_mirror_to_store() {
        let manager = SessionManager::in_memory();
        manager.set(session("a"));
        assert!(manager.is_authenticated());
        assert_eq!(manager.store.load().unwrap().unwrap().access_token, "a");

        manager.clear();
        assert!(!manager.is_authenticated());
        assert!(manager.store.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_is_updated_before_the_store() {
        let store = ObservingStore::default();
        let handle = Arc::clone(&store.manager);
        let seen = Arc::clone(&store.seen);

        let manager = Arc::new(SessionManager::new(store));
        handle.set(Arc::downgrade(&manager)).ok();

        manager.set(session("a"));
        assert!(manager.replace_if_current("a", session("b")));

        assert_eq!(*seen.lock(), vec![Some("a".to_string()), Some("b".to_string())]);
    }

    #[test]
    fn test_broken_store_does_not_lose_memory_session() {
        let manager = SessionManager::new(BrokenStore);
        assert!(manager.restore().is_none());

        manager.set(session("a"));
        assert_eq!(manager.access_token().as_deref(), Some("a"));

        manager.clear();
        assert!(!manager.is_authenticated());
    }

    #[test]
    fn test_replace_if_current_requires_matching_token() {
        let manager = SessionManager::in_memory();
        assert!(!manager.replace_if_current("a", session("b")));
        assert!(!manager.is_authenticated());
        assert!(manager.store.load().unwrap().is_none());

        manager.set(session("a"));
        assert!(!manager.replace_if_current("stale", session("c")));
        assert_eq!(manager.access_token().as_deref(), Some("a"));

        assert!(manager.replace_if_current("a", session("b")));
        assert_eq!(manager.access_token().as_deref(), Some("b"));
        assert_eq!(manager.store.load().unwrap().unwrap().access_token, "b");
    }

    #[test]
    fn test_replace_after_clear_is_dropped() {
        let manager = SessionManager::in_memory();
        manager.set(session("a"));
        manager.clear();

        assert!(!manager.replace_if_current("a", session("b")));
        assert!(!manager.is_authenticated());
        assert!(manager.store.load().unwrap().is_none());
    }

    #[test]
    fn test_update_user_keeps_tokens() {
        let manager = SessionManager::in_memory();
        manager.update_user(session("ignored").user);
        assert!(!manager.is_authenticated());

        manager.set(session("a"));
        let mut user = manager.user().unwrap();
        user.name = "Renamed".to_string();
        manager.update_user(user);

        let current = manager.current().unwrap();
        assert_eq!(current.access_token, "a");
        assert_eq!(current.user.name, "Renamed");
        assert_eq!(manager.store.load().unwrap().unwrap().user.name, "Renamed");
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load().unwrap().is_none());

        store.save(&session("a")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().access_token, "a");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(store.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&session("a")).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_leftover_temp_file_is_narrowed_before_writing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, "stale").unwrap();
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_private_file(&tmp, b"{}").unwrap();
        let mode = std::fs::metadata(&tmp).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(std::fs::read_to_string(&tmp).unwrap(), "{}");

        let store = FileSessionStore::new(&path);
        store.save(&session("a")).unwrap();
        assert!(!tmp.exists());
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_private_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.json");

        write_private_file(&path, b"secret").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }
}
