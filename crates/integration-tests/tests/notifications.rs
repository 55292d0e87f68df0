//! Integration tests for reset and change notifications.

use rust_decimal::Decimal;
use wishlist_core::{Item, ProductRef, Wishlist};
use wishlist_integration_tests::{ACCOUNT_ID, Call, FakeServices};
use wishlist_sync::{InitPhase, UpdateSource};

// =============================================================================
// Reset
// =============================================================================

#[tokio::test]
async fn test_reset_clears_state_without_network() {
    let services = FakeServices::new();
    services.seed_product("P1", "Tee", Decimal::from(10));
    services.seed_wishlist("wl-1", ACCOUNT_ID, vec![Item::new("P1", None)]);
    let session = services.session();
    session.get_or_create_wishlist().await.expect("initialization");
    let calls = services.control().calls().len();

    let mut updates = session.subscribe();
    session.reset();

    assert_eq!(services.control().calls().len(), calls);
    assert_eq!(session.status(), InitPhase::Uninitialized);
    assert_eq!(session.local_wishlist(), Wishlist::default());

    let update = updates.try_recv().expect("reset broadcast");
    assert_eq!(update.source, UpdateSource::Reset);
    assert!(update.wishlist.items.is_empty());
    assert!(updates.try_recv().is_none());
}

#[tokio::test]
async fn test_next_call_after_reset_reinitializes() {
    let services = FakeServices::new();
    let session = services.session();
    session.get_or_create_wishlist().await.expect("first login");

    session.reset();
    session.get_or_create_wishlist().await.expect("second login");

    assert_eq!(services.control().count(Call::CurrentAccount), 2);
    assert_eq!(services.control().count(Call::ListWishlists), 2);
    // The wishlist created before the reset is found again.
    assert_eq!(services.control().count(Call::CreateWishlist), 1);
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_broadcasts_persisted_wishlist() {
    let services = FakeServices::new();
    let session = services.session();
    let mut updates = session.subscribe();

    let created = session.create().await.expect("create");

    assert!(created.is_persisted());
    assert!(created.items.is_empty());
    let update = updates.try_recv().expect("create broadcast");
    assert_eq!(update.source, UpdateSource::Auto);
    assert_eq!(update.wishlist.id, created.id);
    assert_eq!(session.status(), InitPhase::Initialized);
}

#[tokio::test]
async fn test_create_replaces_initialized_wishlist() {
    let services = FakeServices::new();
    let session = services.session();
    let first = session.get_or_create_wishlist().await.expect("initialization");

    let created = session.create().await.expect("create");
    let second = created.id.clone().expect("created id");
    assert_ne!(first, second);

    let calls = services.control().calls().len();
    assert_eq!(session.get_or_create_wishlist().await.expect("ready"), second);
    assert_eq!(services.control().calls().len(), calls);

    session
        .add_product(&ProductRef::new("P1"), &[], None)
        .await
        .expect("add");

    assert!(services.remote_items(first.as_str()).is_empty());
    assert_eq!(services.remote_items(second.as_str()).len(), 1);
    let local = session.local_wishlist();
    assert_eq!(local.id, Some(second));
    assert_eq!(local.items.len(), 1);
}

#[tokio::test]
async fn test_create_during_initialization_keeps_leader_outcome() {
    let services = FakeServices::new();
    let gate = services.control().gate(Call::ListWishlists);
    let session = services.session();

    let leader = tokio::spawn({
        let session = session.clone();
        async move { session.get_or_create_wishlist().await }
    });
    services.control().wait_for(Call::ListWishlists, 1).await;

    session.create().await.expect("create");
    assert_eq!(session.status(), InitPhase::Initializing);

    gate.open();
    let id = leader.await.expect("join").expect("initialization");
    assert_eq!(session.get_or_create_wishlist().await.expect("ready"), id);
    assert_eq!(session.local_wishlist().id, Some(id));
}

#[tokio::test]
async fn test_create_without_account_posts_blank_owner() {
    let services = FakeServices::new();
    services.control().fail(Call::CurrentAccount);
    let session = services.session();

    session.create().await.expect("create proceeds");

    let posted = services.created_wishlists();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].owner, None);
    assert_eq!(posted[0].title, None);
}

#[tokio::test]
async fn test_create_without_email_has_no_title() {
    let services = FakeServices::new();
    services.clear_account_email();
    let session = services.session();

    session.create().await.expect("create");

    let posted = services.created_wishlists();
    assert!(posted[0].owner.is_some());
    assert_eq!(posted[0].title, None);
}

#[tokio::test]
async fn test_create_failure_keeps_store() {
    let services = FakeServices::new();
    services.control().fail(Call::CreateWishlist);
    let session = services.session();
    let mut updates = session.subscribe();

    assert!(session.create().await.is_err());
    assert_eq!(session.local_wishlist(), Wishlist::default());
    assert!(updates.try_recv().is_none());
}

// =============================================================================
// Subscriptions
// =============================================================================

#[tokio::test]
async fn test_every_subscriber_sees_updates() {
    let services = FakeServices::new();
    let session = services.session();
    let mut first = session.subscribe();
    let mut second = session.subscribe();

    session
        .add_product(&ProductRef::new("P1"), &[], None)
        .await
        .expect("add");

    for subscription in [&mut first, &mut second] {
        let mut sources = Vec::new();
        while let Some(update) = subscription.try_recv() {
            sources.push(update.source);
        }
        // Creation during initialization, then the add.
        assert_eq!(sources, [UpdateSource::Auto, UpdateSource::Auto]);
    }
}
