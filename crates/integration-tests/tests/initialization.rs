//! Integration tests for lazy wishlist create-or-fetch.
//!
//! These tests drive a `WishlistSession` against in-memory services and
//! check how many remote calls each path makes.

use std::time::Duration;

use futures::future::join_all;
use rust_decimal::Decimal;
use wishlist_core::{AccountId, Item, WishlistId};
use wishlist_integration_tests::{ACCOUNT_EMAIL, ACCOUNT_ID, Call, FakeServices};
use wishlist_sync::{GatewayError, InitPhase, SessionOptions, WishlistError};

// =============================================================================
// Single Flight
// =============================================================================

#[tokio::test]
async fn test_concurrent_callers_share_one_initialization() {
    let services = FakeServices::new();
    let session = services.session();
    let gate = services.control().gate(Call::CurrentAccount);

    let callers: Vec<_> = (0..10)
        .map(|_| {
            let session = session.clone();
            tokio::spawn(async move { session.get_or_create_wishlist().await })
        })
        .collect();

    services.control().wait_for(Call::CurrentAccount, 1).await;
    assert_eq!(session.status(), InitPhase::Initializing);
    gate.open();

    let ids: Vec<WishlistId> = join_all(callers)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked").expect("initialization failed"))
        .collect();

    assert!(ids.iter().all(|id| id == &ids[0]), "all callers see one id");
    assert_eq!(services.control().count(Call::CurrentAccount), 1);
    assert_eq!(services.control().count(Call::ListWishlists), 1);
    assert_eq!(services.control().count(Call::CreateWishlist), 1);
    assert_eq!(session.status(), InitPhase::Initialized);
}

#[tokio::test]
async fn test_initialized_session_makes_no_calls() {
    let services = FakeServices::new();
    let session = services.session();

    let first = session.get_or_create_wishlist().await.expect("first call");
    let calls = services.control().calls().len();

    let second = session.get_or_create_wishlist().await.expect("second call");
    assert_eq!(first, second);
    assert_eq!(services.control().calls().len(), calls);
}

// =============================================================================
// Fetch vs Create
// =============================================================================

#[tokio::test]
async fn test_existing_wishlist_is_fetched_and_enriched() {
    let services = FakeServices::new();
    services.seed_product("P1", "Pineapple Tee", Decimal::from(20));
    services.seed_wishlist("wl-existing", ACCOUNT_ID, vec![Item::new("P1", None)]);
    let session = services.session();

    let id = session.get_or_create_wishlist().await.expect("initialization");

    assert_eq!(id.as_str(), "wl-existing");
    assert_eq!(services.control().count(Call::CreateWishlist), 0);

    let wishlist = session.local_wishlist();
    assert_eq!(wishlist.items.len(), 1);
    assert!(wishlist.items[0].is_enriched());
    assert_eq!(wishlist.items[0].name.as_deref(), Some("Pineapple Tee"));
    assert_eq!(wishlist.currency_symbol.as_deref(), Some("$"));
}

#[tokio::test]
async fn test_last_owned_wishlist_wins() {
    let services = FakeServices::new();
    services.seed_wishlist("wl-old", ACCOUNT_ID, Vec::new());
    services.seed_wishlist("wl-other", "acct-2", Vec::new());
    services.seed_wishlist("wl-new", ACCOUNT_ID, Vec::new());
    services.seed_wishlist("wl-other-2", "acct-2", Vec::new());

    let id = services
        .session()
        .get_or_create_wishlist()
        .await
        .expect("initialization");
    assert_eq!(id.as_str(), "wl-new");
}

#[tokio::test]
async fn test_missing_wishlist_is_created_for_account() {
    let services = FakeServices::new();
    services.seed_wishlist("wl-foreign", "acct-2", Vec::new());
    let session = services.session();

    let id = session.get_or_create_wishlist().await.expect("initialization");

    let created = services.created_wishlists();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].owner, Some(AccountId::new(ACCOUNT_ID)));
    assert_eq!(created[0].title.as_deref(), Some(ACCOUNT_EMAIL));
    assert!(created[0].items.is_empty());

    let wishlist = session.local_wishlist();
    assert_eq!(wishlist.id, Some(id));
    assert!(wishlist.items.is_empty());
    // One account lookup even though both listing and creation need it.
    assert_eq!(services.control().count(Call::CurrentAccount), 1);
}

#[tokio::test]
async fn test_blank_remote_id_is_not_used() {
    let services = FakeServices::new();
    services.seed_wishlist("", ACCOUNT_ID, Vec::new());
    let session = services.session();

    let id = session.get_or_create_wishlist().await.expect("initialization");

    assert_eq!(id.as_str(), "wl-1");
    assert_eq!(services.control().count(Call::CreateWishlist), 1);
    assert_eq!(services.control().count(Call::ListItems), 0);
    assert_eq!(session.local_wishlist().id, Some(id));
}

// =============================================================================
// Failure & Retry
// =============================================================================

#[tokio::test]
async fn test_account_failure_rejects_every_waiter() {
    let services = FakeServices::new();
    services.control().fail(Call::CurrentAccount);
    let gate = services.control().gate(Call::CurrentAccount);
    let session = services.session();

    let (results, ()) = tokio::join!(
        join_all((0..3).map(|_| session.get_or_create_wishlist())),
        async {
            services.control().wait_for(Call::CurrentAccount, 1).await;
            gate.open();
        }
    );

    for result in results {
        let err = result.expect_err("initialization should fail");
        assert!(matches!(
            err,
            WishlistError::InitializationFailed(ref inner)
                if matches!(**inner, WishlistError::AccountResolutionFailed(_))
        ));
    }
    assert_eq!(services.control().count(Call::CurrentAccount), 1);
    assert_eq!(services.control().count(Call::ListWishlists), 0);
    assert_eq!(session.status(), InitPhase::Uninitialized);
}

#[tokio::test]
async fn test_listing_failure_rolls_back_and_retries() {
    let services = FakeServices::new();
    services.control().fail(Call::ListWishlists);
    let session = services.session();

    let err = session
        .get_or_create_wishlist()
        .await
        .expect_err("listing fails");
    assert!(matches!(err.gateway_cause(), Some(GatewayError::Rejected(_))));
    assert_eq!(session.status(), InitPhase::Uninitialized);

    services.control().heal(Call::ListWishlists);
    session.get_or_create_wishlist().await.expect("retry succeeds");

    // The whole sequence ran again.
    assert_eq!(services.control().count(Call::CurrentAccount), 2);
    assert_eq!(services.control().count(Call::ListWishlists), 2);
    assert_eq!(session.status(), InitPhase::Initialized);
}

#[tokio::test]
async fn test_create_failure_rolls_back() {
    let services = FakeServices::new();
    services.control().fail(Call::CreateWishlist);
    let session = services.session();

    let err = session
        .get_or_create_wishlist()
        .await
        .expect_err("create fails");
    assert!(matches!(
        err,
        WishlistError::InitializationFailed(ref inner)
            if matches!(**inner, WishlistError::CreateFailed(_))
    ));
    assert_eq!(session.status(), InitPhase::Uninitialized);
    assert_eq!(session.local_wishlist().id, None);
}

#[tokio::test]
async fn test_timeout_releases_waiters() {
    let services = FakeServices::new();
    services.control().hang(Call::ListWishlists);
    let session = services.session_with(SessionOptions {
        gateway_timeout: Duration::from_millis(50),
        ..SessionOptions::default()
    });

    let results = join_all((0..4).map(|_| session.get_or_create_wishlist())).await;

    for result in results {
        let err = result.expect_err("listing never answers");
        assert!(matches!(err.gateway_cause(), Some(GatewayError::Timeout(_))));
    }
    assert_eq!(session.status(), InitPhase::Uninitialized);
}

// =============================================================================
// Reset & Cancellation
// =============================================================================

#[tokio::test]
async fn test_reset_invalidates_running_initialization() {
    let services = FakeServices::new();
    services.seed_product("P1", "Tee", Decimal::from(10));
    services.seed_wishlist("wl-1", ACCOUNT_ID, vec![Item::new("P1", None)]);
    let session = services.session();
    let gate = services.control().gate(Call::ListWishlists);

    let leader = tokio::spawn({
        let session = session.clone();
        async move { session.get_or_create_wishlist().await }
    });
    services.control().wait_for(Call::ListWishlists, 1).await;
    let waiter = tokio::spawn({
        let session = session.clone();
        async move { session.get_or_create_wishlist().await }
    });
    tokio::task::yield_now().await;

    session.reset();
    gate.open();

    let leader = leader.await.expect("leader panicked");
    assert!(leader.expect_err("stale leader").is_superseded());
    let waiter = waiter.await.expect("waiter panicked");
    assert!(waiter.expect_err("queued behind the stale attempt").is_superseded());

    // Nothing from the stale attempt reached the fresh store.
    assert_eq!(session.local_wishlist().id, None);
    assert!(session.local_wishlist().items.is_empty());

    let id = session.get_or_create_wishlist().await.expect("fresh attempt");
    assert_eq!(id.as_str(), "wl-1");
    assert_eq!(session.local_wishlist().items.len(), 1);
}

#[tokio::test]
async fn test_stale_initialization_does_not_repopulate() {
    let services = FakeServices::new();
    services.seed_wishlist("wl-1", ACCOUNT_ID, vec![Item::new("P1", None)]);
    let session = services.session();
    let gate = services.control().gate(Call::ListItems);

    let leader = tokio::spawn({
        let session = session.clone();
        async move { session.get_or_create_wishlist().await }
    });
    services.control().wait_for(Call::ListItems, 1).await;

    session.reset();
    gate.open();

    assert!(leader.await.expect("leader panicked").is_err());
    assert_eq!(session.status(), InitPhase::Uninitialized);
    let wishlist = session.local_wishlist();
    assert_eq!(wishlist.id, None);
    assert!(wishlist.items.is_empty());
}

#[tokio::test]
async fn test_cancelled_leader_does_not_wedge_session() {
    let services = FakeServices::new();
    let session = services.session();
    let _gate = services.control().gate(Call::CurrentAccount);

    let leader = tokio::spawn({
        let session = session.clone();
        async move { session.get_or_create_wishlist().await }
    });
    services.control().wait_for(Call::CurrentAccount, 1).await;
    assert_eq!(session.status(), InitPhase::Initializing);

    leader.abort();
    let _ = leader.await;

    assert_eq!(session.status(), InitPhase::Uninitialized);
}
