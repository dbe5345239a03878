//! Session lifecycle tests: sign-in throttling, persistence, sign-out.

mod common;

use chrono::Duration;
use mathlearn_client::db::{LocalStore, StorageKey};
use mathlearn_client::{AuthError, BackendError, Session};
use mathlearn_core::{Clock, RateGuard, Role};

use common::{start_time, TestContext, PASSWORD};

/// Three failed attempts inside the window block the fourth without
/// reaching the backend.
#[tokio::test]
async fn test_sign_in_throttled_after_three_failures() {
    let ctx = TestContext::new();
    ctx.backend.add_account("siswa@example.com", Role::Student);
    let mut session = ctx.session(Clock::fixed(start_time()));

    for _ in 0..3 {
        let err = session
            .sign_in("siswa@example.com", "salah")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Backend(BackendError::Backend { status: 400, .. })));
    }

    let err = session
        .sign_in("siswa@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Throttled { retry_after_secs: 60 }));
    assert_eq!(err.to_string(), "too many attempts, retry in 60 seconds");
    assert_eq!(ctx.backend.state().sign_in_calls, 3);

    session.clock_mut().advance(Duration::seconds(25));
    let err = session
        .sign_in("siswa@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Throttled { retry_after_secs: 35 }));

    session.clock_mut().advance(Duration::seconds(36));
    let user = session.sign_in("siswa@example.com", PASSWORD).await.unwrap();
    assert_eq!(user.email, "siswa@example.com");
    assert_eq!(ctx.backend.state().sign_in_calls, 4);
}

/// A guard allowing no attempts blocks the very first one.
#[tokio::test]
async fn test_zero_attempt_guard_blocks_first_sign_in() {
    let ctx = TestContext::new();
    ctx.backend.add_account("siswa@example.com", Role::Student);
    let mut session = Session::restore(
        ctx.backend(),
        ctx.store.clone(),
        RateGuard::new(Duration::seconds(60), 0),
        Clock::fixed(start_time()),
    )
    .unwrap();

    let err = session
        .sign_in("siswa@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Throttled { retry_after_secs: 60 }));
    assert_eq!(ctx.backend.state().sign_in_calls, 0);
}

/// Sign-up and password reset draw from the same attempt budget.
#[tokio::test]
async fn test_auth_requests_share_throttle() {
    let ctx = TestContext::new();
    let mut session = ctx.session(Clock::fixed(start_time()));

    session
        .sign_up("baru@example.com", PASSWORD, "baru")
        .await
        .unwrap();
    session
        .request_password_reset("baru@example.com")
        .await
        .unwrap();
    let _ = session.sign_in("baru@example.com", "salah").await;

    let err = session
        .request_password_reset("baru@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Throttled { .. }));
    assert_eq!(ctx.backend.state().reset_requests.len(), 1);
}

/// A successful sign-in clears earlier failures.
#[tokio::test]
async fn test_success_resets_attempts() {
    let ctx = TestContext::new();
    ctx.backend.add_account("siswa@example.com", Role::Student);
    let mut session = ctx.session(Clock::fixed(start_time()));

    let _ = session.sign_in("siswa@example.com", "salah").await;
    let _ = session.sign_in("siswa@example.com", "salah").await;
    session.sign_in("siswa@example.com", PASSWORD).await.unwrap();
    session.sign_out().await.unwrap();

    let _ = session.sign_in("siswa@example.com", "salah").await;
    let _ = session.sign_in("siswa@example.com", "salah").await;
    assert!(session.sign_in("siswa@example.com", PASSWORD).await.is_ok());
}

/// Sign-in persists across restarts; sign-out clears it but keeps progress.
#[tokio::test]
async fn test_session_persists_until_sign_out() {
    let ctx = TestContext::new();
    let account = ctx.backend.add_account("guru@example.com", Role::Admin);

    let mut session = ctx.session(Clock::fixed(start_time()));
    assert!(!session.is_signed_in());
    session.sign_in("guru@example.com", PASSWORD).await.unwrap();
    assert!(session.is_admin());

    {
        let store = ctx.store.lock().unwrap();
        store.set(StorageKey::UserProgress, "{\"version\":1,\"progress\":{}}").unwrap();
        assert_eq!(
            store.get(StorageKey::UserId).unwrap(),
            Some(account.id.to_string())
        );
    }

    let mut restored = ctx.session(Clock::fixed(start_time()));
    assert_eq!(restored.current_user(), Some(&account));
    assert_eq!(restored.token(), session.token());

    let token = restored.token().unwrap().to_string();
    restored.sign_out().await.unwrap();
    assert!(!restored.is_signed_in());
    assert_eq!(ctx.backend.state().signed_out, vec![token]);

    let store = ctx.store.lock().unwrap();
    assert_eq!(store.get(StorageKey::Token).unwrap(), None);
    assert!(store.get(StorageKey::UserProgress).unwrap().is_some());
    drop(store);

    assert!(!ctx.session(Clock::fixed(start_time())).is_signed_in());
}

/// A token the backend no longer accepts signs the session out.
#[tokio::test]
async fn test_refresh_with_revoked_token_signs_out() {
    let ctx = TestContext::new();
    let mut session = ctx.signed_in(Role::Student, Clock::fixed(start_time())).await;

    ctx.backend.state().tokens.clear();
    let err = session.refresh_user().await.unwrap_err();
    assert!(matches!(err, AuthError::Backend(ref e) if e.is_unauthorized()));
    assert!(!session.is_signed_in());
    assert!(ctx.session(Clock::fixed(start_time())).current_user().is_none());
}

/// Role changes made on the backend show up after a refresh.
#[tokio::test]
async fn test_refresh_picks_up_role_change() {
    let ctx = TestContext::new();
    let mut session = ctx.signed_in(Role::Student, Clock::fixed(start_time())).await;
    assert!(!session.is_admin());

    let email = session.current_user().unwrap().email.clone();
    ctx.backend
        .state()
        .accounts
        .get_mut(&email)
        .unwrap()
        .role = Role::Admin;

    session.refresh_user().await.unwrap();
    assert!(session.is_admin());
}

#[tokio::test]
async fn test_refresh_requires_sign_in() {
    let ctx = TestContext::new();
    let mut session = ctx.session(Clock::default());
    assert!(matches!(
        session.refresh_user().await,
        Err(AuthError::NotSignedIn)
    ));
}
