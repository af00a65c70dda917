use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use kids_math_core::model::UserId;
use storage::keys;
use storage::repository::{KeyValueStore, KvWrite, Storage};
use storage::sqlite::SqliteRepository;

async fn memory_repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn temp_db_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("kids_math_{tag}_{}_{nanos}.sqlite3", std::process::id()))
}

#[tokio::test]
async fn sqlite_get_set_remove_roundtrip() {
    let repo = memory_repo("memdb_kv_roundtrip").await;

    assert_eq!(repo.get("missing").await.unwrap(), None);

    repo.set(keys::USERS, "[]").await.unwrap();
    repo.set(keys::USERS, r#"[{"id":"1","name":"taro","age":5}]"#)
        .await
        .unwrap();
    assert_eq!(
        repo.get(keys::USERS).await.unwrap().as_deref(),
        Some(r#"[{"id":"1","name":"taro","age":5}]"#)
    );

    repo.remove(keys::USERS).await.unwrap();
    repo.remove(keys::USERS).await.unwrap();
    assert_eq!(repo.get(keys::USERS).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_batch_commits_all_writes() {
    let repo = memory_repo("memdb_kv_batch").await;
    let user: UserId = "42".parse().unwrap();
    repo.set(&keys::progress(&user), "{}").await.unwrap();
    repo.set(keys::CURRENT_USER_ID, "42").await.unwrap();

    repo.write_batch(&[
        KvWrite::set(keys::USERS, "[]"),
        KvWrite::remove(keys::progress(&user)),
        KvWrite::remove(keys::CURRENT_USER_ID),
    ])
    .await
    .unwrap();

    assert_eq!(repo.get(keys::USERS).await.unwrap().as_deref(), Some("[]"));
    assert_eq!(repo.get(&keys::progress(&user)).await.unwrap(), None);
    assert_eq!(repo.get(keys::CURRENT_USER_ID).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_failed_batch_rolls_back_earlier_writes() {
    let repo = memory_repo("memdb_kv_batch_rollback").await;
    sqlx::query(
        "CREATE TRIGGER reject_poison BEFORE INSERT ON kv_entries \
         WHEN NEW.key = 'poison' BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
    )
    .execute(repo.pool())
    .await
    .expect("create trigger");
    repo.set(keys::CURRENT_USER_ID, "42").await.unwrap();

    let result = repo
        .write_batch(&[
            KvWrite::set(keys::USERS, "[]"),
            KvWrite::remove(keys::CURRENT_USER_ID),
            KvWrite::set("poison", "x"),
        ])
        .await;

    assert!(result.is_err());
    assert_eq!(repo.get(keys::USERS).await.unwrap(), None);
    assert_eq!(
        repo.get(keys::CURRENT_USER_ID).await.unwrap().as_deref(),
        Some("42")
    );
    assert_eq!(repo.get("poison").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = memory_repo("memdb_kv_migrate_twice").await;
    repo.set("k", "v").await.unwrap();
    repo.migrate().await.expect("second migrate");
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn sqlite_values_survive_reconnect() {
    let path = temp_db_path("durable");
    let url = format!("sqlite://{}?mode=rwc", path.display());

    {
        let repo = SqliteRepository::connect(&url).await.expect("open");
        repo.migrate().await.expect("migrate");
        repo.set(keys::CURRENT_USER_ID, "7").await.unwrap();
        repo.close().await;
    }

    let reopened = Storage::sqlite(&url).await.expect("reopen");
    assert_eq!(
        reopened.kv.get(keys::CURRENT_USER_ID).await.unwrap().as_deref(),
        Some("7")
    );

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
