//! Follow wishlist updates.

use std::error::Error;
use std::time::Duration;

use tracing::{info, warn};
use wishlist_sync::WishlistSession;

use super::print_json;

/// Print every update as one JSON document until Ctrl+C.
///
/// With `interval`, the wishlist is refreshed every `interval` seconds; a
/// failed refresh is logged and the watch continues.
pub async fn run(session: &WishlistSession, interval: Option<u64>) -> Result<(), Box<dyn Error>> {
    let mut updates = session.subscribe();
    session.get_or_create_wishlist().await?;

    let mut ticker = interval
        .filter(|secs| *secs > 0)
        .map(|secs| tokio::time::interval(Duration::from_secs(secs)));
    if let Some(ticker) = ticker.as_mut() {
        // The first tick completes immediately; initialization just ran.
        ticker.tick().await;
    }

    info!("Watching wishlist, press Ctrl+C to stop");
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(update) => print_json(&update)?,
                None => break,
            },
            () = tick(ticker.as_mut()) => {
                if let Err(e) = session.refresh_current().await {
                    warn!(error = %e, "Periodic refresh failed");
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}

async fn tick(ticker: Option<&mut tokio::time::Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
