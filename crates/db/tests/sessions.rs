//! Refresh-token session lifecycle.

use chrono::{Duration, Utc};
use shopfloor_core::roles::Role;
use shopfloor_db::models::session::CreateSession;
use shopfloor_db::models::user::CreateUser;
use shopfloor_db::repositories::{SessionRepo, UserRepo};
use sqlx::PgPool;

async fn seed_user(pool: &PgPool, matricula: &str) {
    UserRepo::create(
        pool,
        &CreateUser {
            matricula: matricula.to_string(),
            name: format!("Usuário {matricula}"),
            password_hash: "hash".to_string(),
            role: Role::Operator,
            created_by: None,
        },
    )
    .await
    .unwrap();
}

fn session(matricula: &str, hash: &str, expires_in: Duration) -> CreateSession {
    CreateSession {
        matricula: matricula.to_string(),
        refresh_token_hash: hash.to_string(),
        expires_at: Utc::now() + expires_in,
        user_agent: None,
        ip_address: None,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cleanup_removes_expired_and_revoked_sessions(pool: PgPool) {
    seed_user(&pool, "000300").await;

    let live = SessionRepo::create(&pool, &session("000300", "live", Duration::days(7)))
        .await
        .unwrap();
    SessionRepo::create(&pool, &session("000300", "stale", Duration::hours(-1)))
        .await
        .unwrap();
    let revoked = SessionRepo::create(&pool, &session("000300", "revoked", Duration::days(7)))
        .await
        .unwrap();
    assert!(SessionRepo::revoke(&pool, revoked.id).await.unwrap());

    let removed = SessionRepo::cleanup_expired(&pool).await.unwrap();
    assert_eq!(removed, 2);

    let found = SessionRepo::find_by_refresh_token_hash(&pool, "live")
        .await
        .unwrap()
        .expect("live session survives cleanup");
    assert_eq!(found.id, live.id);
    assert_eq!(SessionRepo::cleanup_expired(&pool).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoke_all_only_touches_one_user(pool: PgPool) {
    seed_user(&pool, "000301").await;
    seed_user(&pool, "000302").await;
    SessionRepo::create(&pool, &session("000301", "a1", Duration::days(7)))
        .await
        .unwrap();
    SessionRepo::create(&pool, &session("000301", "a2", Duration::days(7)))
        .await
        .unwrap();
    SessionRepo::create(&pool, &session("000302", "b1", Duration::days(7)))
        .await
        .unwrap();

    assert_eq!(SessionRepo::revoke_all_for_user(&pool, "000301").await.unwrap(), 2);
    assert!(SessionRepo::find_by_refresh_token_hash(&pool, "a1")
        .await
        .unwrap()
        .is_none());
    assert!(SessionRepo::find_by_refresh_token_hash(&pool, "b1")
        .await
        .unwrap()
        .is_some());
}
