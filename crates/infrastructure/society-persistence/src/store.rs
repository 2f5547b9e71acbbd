use std::collections::BTreeMap;
use std::sync::Arc;

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use society_core::{BuildingId, NavigationState, PhoneNumber, Profile};

use crate::keys::{
    AUTH_TOKEN, BUILDING_ID, LAST_ACTIVE_PATH, NAVIGATION_KEYS, OTP_SCRATCH_KEYS, OTP_SENT_AT,
    SESSION_KEYS, TAB_OPEN_STATES, USER_INFO, USER_MOBILE,
};
use crate::{KeyValueStore, KvOp, MemoryKeyValueStore, RedbKeyValueStore, StorageError};

/// Persisted session data that cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("access token stored without a user profile")]
    TokenWithoutProfile,
    #[error("user profile stored without an access token")]
    ProfileWithoutToken,
    #[error("stored {key} could not be decoded")]
    Malformed { key: &'static str },
    #[error("stored user profile has no roles")]
    ProfileWithoutRoles,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredSession {
    Empty,
    Valid { token: String, profile: Profile },
    Broken(IntegrityError),
}

/// Scratch values kept between the two OTP phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpScratch {
    pub phone: PhoneNumber,
    pub building_id: Option<BuildingId>,
    /// When the backend last accepted a send for this phone.
    pub sent_at: Option<DateTime<Utc>>,
}

/// Typed access to the console's persisted keys.
///
/// Session token and profile only ever change together, in a single batch.
#[derive(Clone)]
pub struct PersistentStore {
    backend: Arc<dyn KeyValueStore>,
}

impl PersistentStore {
    pub fn new(backend: impl KeyValueStore) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_shared(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryKeyValueStore::new())
    }

    pub fn open(path: &Utf8Path) -> Result<Self, StorageError> {
        Ok(Self::new(RedbKeyValueStore::open(path)?))
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.backend.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Like `read`, but an undecodable value is logged and treated as absent.
    fn read_lenient<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.read(key) {
            Err(StorageError::Serde(e)) => {
                tracing::warn!("discarding unreadable {}: {}", key, e);
                Ok(None)
            }
            other => other,
        }
    }

    fn put<T: Serialize + ?Sized>(key: &'static str, value: &T) -> Result<KvOp, StorageError> {
        Ok(KvOp::Put(key, serde_json::to_string(value)?))
    }

    fn removals<'a>(keys: &'a [&'static str]) -> impl Iterator<Item = KvOp> + 'a {
        keys.iter().map(|k| KvOp::Remove(*k))
    }

    // --- session ---

    pub fn token(&self) -> Result<Option<String>, StorageError> {
        self.read(AUTH_TOKEN)
    }

    pub fn profile(&self) -> Result<Option<Profile>, StorageError> {
        self.read(USER_INFO)
    }

    pub fn save_session(&self, token: &str, profile: &Profile) -> Result<(), StorageError> {
        self.backend
            .commit(&[Self::put(AUTH_TOKEN, token)?, Self::put(USER_INFO, profile)?])
    }

    /// Writes the session and drops the OTP scratch values in one batch.
    pub fn complete_login(&self, token: &str, profile: &Profile) -> Result<(), StorageError> {
        let mut ops = vec![Self::put(AUTH_TOKEN, token)?, Self::put(USER_INFO, profile)?];
        ops.extend(Self::removals(&OTP_SCRATCH_KEYS));
        self.backend.commit(&ops)
    }

    pub fn clear_session(&self) -> Result<(), StorageError> {
        let ops: Vec<KvOp> = Self::removals(&SESSION_KEYS).collect();
        self.backend.commit(&ops)
    }

    pub fn load_session(&self) -> Result<StoredSession, StorageError> {
        let token = self.backend.get(AUTH_TOKEN)?;
        let profile = self.backend.get(USER_INFO)?;

        let (token, profile) = match (token, profile) {
            (None, None) => return Ok(StoredSession::Empty),
            (Some(_), None) => {
                return Ok(StoredSession::Broken(IntegrityError::TokenWithoutProfile))
            }
            (None, Some(_)) => {
                return Ok(StoredSession::Broken(IntegrityError::ProfileWithoutToken))
            }
            (Some(t), Some(p)) => (t, p),
        };

        let Ok(token) = serde_json::from_str::<String>(&token) else {
            return Ok(StoredSession::Broken(IntegrityError::Malformed { key: AUTH_TOKEN }));
        };
        if token.trim().is_empty() {
            return Ok(StoredSession::Broken(IntegrityError::Malformed { key: AUTH_TOKEN }));
        }
        let Ok(profile) = serde_json::from_str::<Profile>(&profile) else {
            return Ok(StoredSession::Broken(IntegrityError::Malformed { key: USER_INFO }));
        };
        if !profile.is_well_formed() {
            return Ok(StoredSession::Broken(IntegrityError::ProfileWithoutRoles));
        }
        Ok(StoredSession::Valid { token, profile })
    }

    // --- OTP flow scratch ---

    pub fn save_otp_scratch(&self, scratch: &OtpScratch) -> Result<(), StorageError> {
        let mut ops = vec![Self::put(USER_MOBILE, &scratch.phone)?];
        match &scratch.building_id {
            Some(id) => ops.push(Self::put(BUILDING_ID, id)?),
            None => ops.push(KvOp::Remove(BUILDING_ID)),
        }
        match scratch.sent_at {
            Some(at) => ops.push(Self::put(OTP_SENT_AT, &at.timestamp_millis())?),
            None => ops.push(KvOp::Remove(OTP_SENT_AT)),
        }
        self.backend.commit(&ops)
    }

    /// Unreadable scratch values count as absent.
    pub fn load_otp_scratch(&self) -> Result<Option<OtpScratch>, StorageError> {
        let Some(phone) = self.read_lenient::<PhoneNumber>(USER_MOBILE)? else {
            return Ok(None);
        };
        let building_id = self.read_lenient::<BuildingId>(BUILDING_ID)?;
        let sent_at = self
            .read_lenient::<i64>(OTP_SENT_AT)?
            .and_then(DateTime::from_timestamp_millis);
        Ok(Some(OtpScratch {
            phone,
            building_id,
            sent_at,
        }))
    }

    pub fn clear_otp_scratch(&self) -> Result<(), StorageError> {
        let ops: Vec<KvOp> = Self::removals(&OTP_SCRATCH_KEYS).collect();
        self.backend.commit(&ops)
    }

    // --- navigation ---

    pub fn save_navigation(&self, nav: &NavigationState) -> Result<(), StorageError> {
        let mut ops = Vec::with_capacity(2);
        match &nav.active_path {
            Some(path) => ops.push(Self::put(LAST_ACTIVE_PATH, path)?),
            None => ops.push(KvOp::Remove(LAST_ACTIVE_PATH)),
        }
        ops.push(Self::put(TAB_OPEN_STATES, &nav.expanded_menus)?);
        self.backend.commit(&ops)
    }

    pub fn load_navigation(&self) -> Result<NavigationState, StorageError> {
        Ok(NavigationState {
            active_path: self.read_lenient(LAST_ACTIVE_PATH)?,
            expanded_menus: self
                .read_lenient::<BTreeMap<String, bool>>(TAB_OPEN_STATES)?
                .unwrap_or_default(),
        })
    }

    pub fn clear_navigation(&self) -> Result<(), StorageError> {
        let ops: Vec<KvOp> = Self::removals(&NAVIGATION_KEYS).collect();
        self.backend.commit(&ops)
    }

    /// Logout: session, OTP scratch and navigation keys go in one batch.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        let ops: Vec<KvOp> = Self::removals(&SESSION_KEYS)
            .chain(Self::removals(&OTP_SCRATCH_KEYS))
            .chain(Self::removals(&NAVIGATION_KEYS))
            .collect();
        self.backend.commit(&ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use society_core::Role;

    fn profile() -> Profile {
        Profile {
            id: "u1".into(),
            name: "Asha".into(),
            roles: [Role::BuildingAdmin].into_iter().collect(),
            building_id: Some(BuildingId::parse("B1").unwrap()),
        }
    }

    #[test]
    fn session_round_trips_and_clears_together() {
        let store = PersistentStore::in_memory();
        assert_eq!(store.load_session().unwrap(), StoredSession::Empty);

        store.save_session("tok", &profile()).unwrap();
        assert_eq!(
            store.load_session().unwrap(),
            StoredSession::Valid {
                token: "tok".into(),
                profile: profile()
            }
        );

        store.clear_session().unwrap();
        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.profile().unwrap(), None);
    }

    #[test]
    fn half_written_session_is_broken() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        let store = PersistentStore::from_shared(backend.clone());
        backend
            .commit(&[KvOp::Put(AUTH_TOKEN, "\"tok\"".into())])
            .unwrap();
        assert_eq!(
            store.load_session().unwrap(),
            StoredSession::Broken(IntegrityError::TokenWithoutProfile)
        );

        backend
            .commit(&[KvOp::Put(USER_INFO, "{not json".into())])
            .unwrap();
        assert_eq!(
            store.load_session().unwrap(),
            StoredSession::Broken(IntegrityError::Malformed { key: USER_INFO })
        );
    }

    fn scratch(building_id: Option<BuildingId>) -> OtpScratch {
        OtpScratch {
            phone: PhoneNumber::parse("9876543210").unwrap(),
            building_id,
            sent_at: DateTime::from_timestamp_millis(1_700_000_000_000),
        }
    }

    #[test]
    fn complete_login_drops_scratch() {
        let store = PersistentStore::in_memory();
        let b1 = BuildingId::parse("B1").unwrap();
        store.save_otp_scratch(&scratch(Some(b1))).unwrap();
        assert_eq!(
            store.load_otp_scratch().unwrap(),
            Some(scratch(Some(BuildingId::parse("B1").unwrap())))
        );

        store.complete_login("tok", &profile()).unwrap();
        assert_eq!(store.load_otp_scratch().unwrap(), None);
        assert_eq!(store.backend.get(OTP_SENT_AT).unwrap(), None);
        assert!(matches!(
            store.load_session().unwrap(),
            StoredSession::Valid { .. }
        ));
    }

    #[test]
    fn global_scratch_removes_stale_building_and_send_time() {
        let store = PersistentStore::in_memory();
        store
            .save_otp_scratch(&scratch(Some(BuildingId::parse("B1").unwrap())))
            .unwrap();
        let mut global = scratch(None);
        global.sent_at = None;
        store.save_otp_scratch(&global).unwrap();
        assert_eq!(store.load_otp_scratch().unwrap(), Some(global));
    }

    #[test]
    fn unreadable_send_time_is_dropped() {
        let store = PersistentStore::in_memory();
        store.save_otp_scratch(&scratch(None)).unwrap();
        store
            .backend
            .commit(&[KvOp::Put(OTP_SENT_AT, "\"yesterday\"".into())])
            .unwrap();
        assert_eq!(store.load_otp_scratch().unwrap().unwrap().sent_at, None);
    }

    #[test]
    fn navigation_round_trip_and_clear_all() {
        let store = PersistentStore::in_memory();
        let mut nav = NavigationState::default();
        nav.visit("/building/units");
        store.save_navigation(&nav).unwrap();
        store.save_session("tok", &profile()).unwrap();
        assert_eq!(store.load_navigation().unwrap(), nav);

        store.clear_all().unwrap();
        assert_eq!(store.load_navigation().unwrap(), NavigationState::default());
        assert_eq!(store.load_session().unwrap(), StoredSession::Empty);
    }
}
