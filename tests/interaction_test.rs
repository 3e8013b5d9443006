//! Integration tests for likes and comments.

use std::time::Duration;

use media_share::db::{Database, MediaItem, NewMedia};
use media_share::interaction::{
    add_comment, CommentThread, InFlightRegistry, LikeControl, LikeState, ToggleOutcome,
};
use media_share::likes::LikeKey;
use media_share::repository::{
    FailureMode, LikeDelta, MediaRepository, MemoryRepository, SqliteRepository,
};
use media_share::session::Session;
use media_share::ShareError;
use tempfile::TempDir;

async fn sqlite_repo() -> (SqliteRepository, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::new(&temp_dir.path().join("test.sqlite"))
        .await
        .expect("Failed to create database");
    (SqliteRepository::new(db, Duration::from_secs(5), 100), temp_dir)
}

fn seeded_item(id: &str, likes: i64) -> MediaItem {
    MediaItem {
        id: id.to_string(),
        title: "Sunset".to_string(),
        description: None,
        image_url: "https://cdn.example.com/media/u1/a.png".to_string(),
        file_path: "u1/a.png".to_string(),
        author_id: "u1".to_string(),
        author_name: "alice_w".to_string(),
        created_at: "2024-01-01T00:00:00.000000Z".to_string(),
        likes,
        views: None,
    }
}

fn bob() -> Session {
    Session::new("u2", "bob_b").with_email("bob@example.com")
}

#[tokio::test]
async fn test_toggle_twice_restores_state_against_sqlite() {
    let (repo, _temp_dir) = sqlite_repo().await;
    let item = repo
        .create_media(&NewMedia {
            title: "Sunset".to_string(),
            description: None,
            image_url: "https://cdn.example.com/media/u1/a.png".to_string(),
            file_path: "u1/a.png".to_string(),
            author_id: "u1".to_string(),
        })
        .await
        .unwrap();

    let session = bob();
    let mut control = LikeControl::resolve(&repo, &session, &item.id, item.likes).await;
    assert_eq!(control.state(), LikeState::NotLiked);

    let first = control.toggle(&repo).await;
    assert!(first.is_confirmed());
    assert_eq!(first.state(), LikeState::Liked);
    assert_eq!(first.count(), 1);

    // A fresh control sees the stored like.
    let reloaded = LikeControl::resolve(&repo, &session, &item.id, 1).await;
    assert_eq!(reloaded.state(), LikeState::Liked);

    let second = control.toggle(&repo).await;
    assert!(second.is_confirmed());
    assert_eq!(control.state(), LikeState::NotLiked);
    assert_eq!(control.count(), 0);

    let stored = repo.get_media(&item.id).await.unwrap().unwrap();
    assert_eq!(stored.likes, 0);
    assert!(!repo.has_like(control.key()).await.unwrap());
}

#[tokio::test]
async fn test_toggle_reconciles_to_stored_count() {
    let repo = MemoryRepository::new();
    repo.seed(seeded_item("m1", 7));

    // The page showed a stale count of 3.
    let mut control = LikeControl::resolve(&repo, &bob(), "m1", 3).await;
    let outcome = control.toggle(&repo).await;

    assert!(matches!(
        outcome,
        ToggleOutcome::Confirmed {
            state: LikeState::Liked,
            count: 8
        }
    ));
    assert_eq!(control.count(), 8);
}

#[tokio::test]
async fn test_failed_count_update_reverts_and_undoes_record() {
    let repo = MemoryRepository::new();
    repo.seed(seeded_item("m1", 2));
    repo.set_failure_mode(FailureMode::RejectLikeCount);

    let mut control = LikeControl::resolve(&repo, &bob(), "m1", 2).await;
    let outcome = control.toggle(&repo).await;

    match outcome {
        ToggleOutcome::RevertedWithReason {
            state,
            count,
            reason,
        } => {
            assert_eq!(state, LikeState::NotLiked);
            assert_eq!(count, 2);
            assert!(matches!(reason, ShareError::Write(_)));
        }
        ToggleOutcome::Confirmed { .. } => panic!("toggle should have been reverted"),
    }
    assert_eq!(control.state(), LikeState::NotLiked);
    assert_eq!(control.count(), 2);
    assert!(repo.likes().is_empty());
    assert_eq!(repo.like_records("m1"), 0);
    assert_eq!(repo.stored_likes("m1"), Some(2));
}

#[tokio::test]
async fn test_unreachable_backend_reverts_with_connectivity() {
    let repo = MemoryRepository::new();
    repo.seed(seeded_item("m1", 0));
    let mut control = LikeControl::new(LikeKey::new("m1", "u2"), LikeState::NotLiked, 0);

    repo.set_failure_mode(FailureMode::Unreachable);
    let outcome = control.toggle(&repo).await;

    assert!(!outcome.is_confirmed());
    assert_eq!(outcome.state(), LikeState::NotLiked);
    assert_eq!(outcome.count(), 0);
}

#[tokio::test]
async fn test_resolve_fails_open() {
    let repo = MemoryRepository::new();
    repo.seed(seeded_item("m1", 4));
    repo.set_failure_mode(FailureMode::Unreachable);

    let control = LikeControl::resolve(&repo, &bob(), "m1", 4).await;
    assert_eq!(control.state(), LikeState::NotLiked);
    assert_eq!(control.count(), 4);
}

#[tokio::test]
async fn test_second_toggle_rejected_while_in_flight() {
    let registry = InFlightRegistry::new();
    let key = LikeKey::new("m1", "u2");

    let guard = registry.try_acquire(&key).expect("first toggle should start");
    assert!(registry.is_pending(&key));
    assert!(registry.try_acquire(&key).is_none());

    // Another user is not blocked.
    assert!(registry.try_acquire(&LikeKey::new("m1", "u3")).is_some());

    drop(guard);
    assert!(!registry.is_pending(&key));
    assert!(registry.try_acquire(&key).is_some());
}

#[tokio::test]
async fn test_comment_thread_against_sqlite() {
    let (repo, _temp_dir) = sqlite_repo().await;
    let item = repo
        .create_media(&NewMedia {
            title: "Sunset".to_string(),
            description: None,
            image_url: "https://cdn.example.com/media/u1/a.png".to_string(),
            file_path: "u1/a.png".to_string(),
            author_id: "u1".to_string(),
        })
        .await
        .unwrap();

    let session = bob();
    add_comment(&repo, &item.id, "older", &session).await.unwrap();

    let mut thread = CommentThread::load(&repo, &item.id).await.unwrap();
    assert_eq!(thread.len(), 1);

    let blank = thread.add(&repo, &session, "   ").await;
    assert!(matches!(blank, Err(ShareError::Validation(_))));
    assert_eq!(thread.len(), 1);

    let added = thread.add(&repo, &session, "  nice!  ").await.unwrap();
    assert_eq!(added.content, "nice!");
    assert_eq!(added.author_name, "bob");
    assert_eq!(thread.comments()[0].content, "nice!");
    assert_eq!(thread.comments()[1].content, "older");

    let reloaded = CommentThread::load(&repo, &item.id).await.unwrap();
    assert_eq!(reloaded.comments()[0].content, "nice!");
}

#[tokio::test]
async fn test_blank_comment_issues_no_write() {
    let repo = MemoryRepository::new();
    repo.seed(seeded_item("m1", 0));

    let result = add_comment(&repo, "m1", "\n\t ", &bob()).await;
    assert!(matches!(result, Err(ShareError::Validation(_))));
    assert_eq!(repo.write_count(), 0);
}

#[tokio::test]
async fn test_stale_control_does_not_double_count() {
    let repo = MemoryRepository::new();
    repo.seed(seeded_item("m1", 0));
    let session = bob();

    // Both controls were built while the item was not liked.
    let mut other_device = LikeControl::resolve(&repo, &session, "m1", 0).await;
    let mut stale = LikeControl::resolve(&repo, &session, "m1", 0).await;

    assert!(other_device.toggle(&repo).await.is_confirmed());
    assert_eq!(repo.stored_likes("m1"), Some(1));

    let outcome = stale.toggle(&repo).await;
    assert!(matches!(
        outcome,
        ToggleOutcome::Confirmed {
            state: LikeState::Liked,
            count: 1
        }
    ));
    assert_eq!(repo.like_records("m1"), 1);
    assert_eq!(repo.stored_likes("m1"), Some(1));
}

#[tokio::test]
async fn test_stale_control_keeps_existing_like_when_count_update_fails() {
    let repo = MemoryRepository::new();
    repo.seed(seeded_item("m1", 1));
    let key = LikeKey::new("m1", "u2");
    assert!(repo.insert_like(&key).await.unwrap());

    repo.set_failure_mode(FailureMode::RejectLikeCount);
    let mut stale = LikeControl::new(key.clone(), LikeState::NotLiked, 0);
    let outcome = stale.toggle(&repo).await;

    assert!(outcome.is_confirmed());
    assert_eq!(outcome.state(), LikeState::Liked);
    assert_eq!(outcome.count(), 1);
    assert!(repo.has_like(&key).await.unwrap());
    assert_eq!(repo.like_records("m1"), 1);
    assert_eq!(repo.stored_likes("m1"), Some(1));
}

#[tokio::test]
async fn test_stale_unlike_of_missing_record_leaves_count() {
    let (repo, _temp_dir) = sqlite_repo().await;
    let item = repo
        .create_media(&NewMedia {
            title: "Sunset".to_string(),
            description: None,
            image_url: "https://cdn.example.com/media/u1/a.png".to_string(),
            file_path: "u1/a.png".to_string(),
            author_id: "u1".to_string(),
        })
        .await
        .unwrap();

    let key = LikeKey::new(item.id.as_str(), "u3");
    assert!(repo.insert_like(&key).await.unwrap());
    repo.update_like_count(&item.id, LikeDelta::Increment).await.unwrap();

    // u2 never liked, but its control believes it did.
    let mut stale = LikeControl::new(LikeKey::new(item.id.as_str(), "u2"), LikeState::Liked, 1);
    let outcome = stale.toggle(&repo).await;

    assert!(outcome.is_confirmed());
    assert_eq!(outcome.state(), LikeState::NotLiked);
    assert_eq!(outcome.count(), 1);
    assert_eq!(repo.get_media(&item.id).await.unwrap().unwrap().likes, 1);
}
