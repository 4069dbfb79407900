use blog_publisher::AppError;
use blog_publisher::domain::repositories::{TokenRepository, TokenSelector};
use blog_publisher::infrastructure::persistence::PgTokenRepository;
use sqlx::PgPool;
use std::sync::Arc;

fn repo(pool: PgPool) -> PgTokenRepository {
    PgTokenRepository::new(Arc::new(pool))
}

#[sqlx::test]
async fn test_authenticate_stamps_last_use(pool: PgPool) {
    let repo = repo(pool);
    let issued = repo.insert("Editor laptop", "digest-a").await.unwrap();
    assert!(issued.last_used_at.is_none());

    let admin = repo.authenticate("digest-a").await.unwrap().unwrap();

    assert_eq!(admin.id, issued.id);
    assert_eq!(admin.name, "Editor laptop");
    assert!(admin.last_used_at.is_some());
}

#[sqlx::test]
async fn test_authenticate_unknown_digest(pool: PgPool) {
    let repo = repo(pool);
    repo.insert("Editor laptop", "digest-a").await.unwrap();

    assert!(repo.authenticate("digest-b").await.unwrap().is_none());
}

#[sqlx::test]
async fn test_revoked_token_no_longer_authenticates(pool: PgPool) {
    let repo = repo(pool);
    let issued = repo.insert("Old phone", "digest-old").await.unwrap();

    let revoked = repo.revoke(issued.id).await.unwrap().unwrap();
    assert!(revoked.is_revoked());

    assert!(repo.authenticate("digest-old").await.unwrap().is_none());
    let stored = repo.find(&TokenSelector::Id(issued.id)).await.unwrap().unwrap();
    assert!(stored.last_used_at.is_none());
}

#[sqlx::test]
async fn test_revoke_is_one_shot(pool: PgPool) {
    let repo = repo(pool);
    let issued = repo.insert("Deploy hook", "digest-deploy").await.unwrap();

    assert!(repo.revoke(issued.id).await.unwrap().is_some());
    assert!(repo.revoke(issued.id).await.unwrap().is_none());
    assert!(repo.revoke(999_999).await.unwrap().is_none());
}

#[sqlx::test]
async fn test_find_by_name_prefers_newest(pool: PgPool) {
    let repo = repo(pool);
    let first = repo.insert("CI", "digest-ci-1").await.unwrap();
    let second = repo.insert("CI", "digest-ci-2").await.unwrap();

    let by_name = repo
        .find(&TokenSelector::Name("CI".to_string()))
        .await
        .unwrap()
        .unwrap();
    let by_id = repo.find(&TokenSelector::Id(first.id)).await.unwrap().unwrap();

    assert_eq!(by_name.id, second.id);
    assert_eq!(by_id.token_hash, "digest-ci-1");
    assert!(
        repo.find(&TokenSelector::Name("nobody".to_string()))
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test]
async fn test_all_lists_revoked_tokens_too(pool: PgPool) {
    let repo = repo(pool);
    let kept = repo.insert("Editor laptop", "digest-a").await.unwrap();
    let gone = repo.insert("Old phone", "digest-b").await.unwrap();
    repo.revoke(gone.id).await.unwrap();

    let tokens = repo.all().await.unwrap();

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].id, gone.id);
    assert!(tokens[0].is_revoked());
    assert_eq!(tokens[1].id, kept.id);
}

#[sqlx::test]
async fn test_same_digest_twice_is_conflict(pool: PgPool) {
    let repo = repo(pool);
    repo.insert("first", "same-digest").await.unwrap();

    let result = repo.insert("second", "same-digest").await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
}
