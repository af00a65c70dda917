use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use kids_math_core::model::{
    LevelCatalog, LevelId, LevelState, ProfileDraft, ProgressRecord, Score, Stars,
};
use kids_math_core::time::fixed_clock;
use services::{ProgressError, ProgressStore};
use storage::keys;
use storage::repository::{InMemoryKeyValueStore, KeyValueStore, KvWrite, StorageError};

fn store(kv: Arc<dyn KeyValueStore>) -> ProgressStore {
    ProgressStore::new(kv, Arc::new(LevelCatalog::standard()), fixed_clock())
}

fn score(correct: u8) -> Score {
    Score::out_of_session(correct).unwrap()
}

/// Delegates to an in-memory map but refuses batches.
struct NoBatchStore {
    inner: InMemoryKeyValueStore,
    batches: Mutex<usize>,
}

#[async_trait]
impl KeyValueStore for NoBatchStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }

    async fn write_batch(&self, _writes: &[KvWrite]) -> Result<(), StorageError> {
        *self.batches.lock().unwrap() += 1;
        Err(StorageError::Connection("batch rejected".into()))
    }
}

#[tokio::test]
async fn stars_only_go_up_and_frontier_only_moves_forward() {
    let store = store(Arc::new(InMemoryKeyValueStore::new()));
    let hana = store
        .register_user(ProfileDraft::new("はな", 5))
        .await
        .unwrap();
    let user = hana.id();

    let first = store.record_result(user, LevelId::FIRST, score(10)).await.unwrap();
    assert_eq!(first, Stars::MAX);
    assert!(store.is_unlocked(user, LevelId::new(2)).await.unwrap());

    let replay = store.record_result(user, LevelId::FIRST, score(4)).await.unwrap();
    assert_eq!(replay.value(), 1);

    let record = store.load(user).await.unwrap();
    assert_eq!(record.stars(LevelId::FIRST), Stars::MAX);
    assert_eq!(record.best(LevelId::FIRST).unwrap().score, 10);
    assert_eq!(record.max_unlocked_level(), LevelId::new(2));

    let zero = store.apply_score(user, LevelId::new(2), score(0)).await.unwrap();
    assert_eq!(zero.stars, Stars::NONE);
    assert_eq!(zero.unlocked, None);
    assert!(!store.is_unlocked(user, LevelId::new(3)).await.unwrap());
}

#[tokio::test]
async fn last_level_never_unlocks_beyond_catalog() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let store = store(kv.clone());
    let user = "finisher".parse().unwrap();
    kv.set(&keys::progress(&user), r#"{"maxUnlockedLevel":12,"levels":{}}"#)
        .await
        .unwrap();

    let outcome = store.apply_score(&user, LevelId::new(12), score(10)).await.unwrap();
    assert_eq!(outcome.unlocked, None);
    assert_eq!(store.load(&user).await.unwrap().max_unlocked_level(), LevelId::new(12));

    let states = store.level_states(&user).await.unwrap();
    assert_eq!(states.last().unwrap().1, LevelState::Cleared(Stars::MAX));
}

#[tokio::test]
async fn delete_user_removes_profile_progress_and_pointer() {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let store = store(kv.clone());
    let taro = store.register_user(ProfileDraft::new("たろう", 4)).await.unwrap();
    store.record_result(taro.id(), LevelId::FIRST, score(7)).await.unwrap();

    assert!(store.delete_user(taro.id()).await.unwrap());

    assert!(store.list_users().await.unwrap().is_empty());
    assert_eq!(store.current_user().await.unwrap(), None);
    assert_eq!(store.load(taro.id()).await.unwrap(), ProgressRecord::default());
    assert_eq!(kv.get(keys::CURRENT_USER_ID).await.unwrap(), None);
}

#[tokio::test]
async fn failed_delete_leaves_everything_in_place() {
    let inner = InMemoryKeyValueStore::new();
    let store_backend = Arc::new(NoBatchStore {
        inner: inner.clone(),
        batches: Mutex::new(0),
    });
    let store = store(store_backend.clone());

    let profile = ProfileDraft::new("じろう", 6)
        .validate(kids_math_core::time::fixed_now())
        .unwrap();
    inner
        .set(keys::USERS, &serde_json::to_string(&vec![profile.clone()]).unwrap())
        .await
        .unwrap();
    inner.set(keys::CURRENT_USER_ID, profile.id().as_str()).await.unwrap();
    store.record_result(profile.id(), LevelId::FIRST, score(10)).await.unwrap();

    let err = store.delete_user(profile.id()).await.unwrap_err();
    assert!(matches!(err, ProgressError::Storage(_)));
    assert_eq!(*store_backend.batches.lock().unwrap(), 1);

    assert_eq!(store.list_users().await.unwrap(), vec![profile.clone()]);
    assert_eq!(store.current_user().await.unwrap(), Some(profile.clone()));
    assert_eq!(
        store.load(profile.id()).await.unwrap().stars(LevelId::FIRST),
        Stars::MAX
    );
}
