//! One-shot wishlist commands.

use std::error::Error;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use wishlist_core::{Price, ProductRef, Wishlist};
use wishlist_sync::{AddOutcome, CurrencyContext, InitPhase, WishlistSession};

use super::print_json;

type CommandResult = Result<(), Box<dyn Error>>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddReport<'a> {
    outcome: &'static str,
    wishlist: &'a Wishlist,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TotalReport {
    total: Decimal,
    currency_symbol: String,
    items: usize,
}

/// Fetch or create the wishlist and print it.
pub async fn show(session: &WishlistSession) -> CommandResult {
    let wishlist_id = session.get_or_create_wishlist().await?;
    info!(%wishlist_id, "Wishlist loaded");
    print_json(&session.local_wishlist())?;
    Ok(())
}

/// Add a product, priced in the session currency.
pub async fn add(
    session: &WishlistSession,
    product: &str,
    name: Option<String>,
    price: Option<Decimal>,
    note: Option<String>,
) -> CommandResult {
    let mut product_ref = ProductRef::new(product);
    if let Some(name) = name {
        product_ref = product_ref.with_name(name);
    }

    let currency = session.currency();
    let prices: Vec<Price> = price
        .map(|amount| Price::new(amount).with_currency(currency.id))
        .into_iter()
        .collect();

    let outcome = session.add_product(&product_ref, &prices, note).await?;
    let outcome = match outcome {
        AddOutcome::Added => "added",
        AddOutcome::AlreadyPresent => "already_present",
    };
    info!(product, outcome, "Add finished");

    print_json(&AddReport {
        outcome,
        wishlist: &session.local_wishlist(),
    })?;
    Ok(())
}

/// Print the wishlist total.
pub async fn total(session: &WishlistSession) -> CommandResult {
    let total = session.total_price().await?;
    let wishlist = session.local_wishlist();
    let currency_symbol = wishlist
        .currency_symbol
        .unwrap_or_else(|| session.currency().symbol);

    print_json(&TotalReport {
        total,
        currency_symbol,
        items: wishlist.items.len(),
    })?;
    Ok(())
}

/// Re-fetch the wishlist, optionally in another currency.
pub async fn refresh(
    session: &WishlistSession,
    currency: Option<String>,
    symbol: Option<String>,
) -> CommandResult {
    if let Some(id) = currency {
        let symbol = symbol.unwrap_or_else(|| id.clone());
        session.set_currency(CurrencyContext::new(id, symbol));
    }

    // A first initialization already loads and prices the wishlist.
    if session.status() == InitPhase::Initialized {
        session.refresh_current().await?;
    } else {
        session.get_or_create_wishlist().await?;
    }

    print_json(&session.local_wishlist())?;
    Ok(())
}

/// Drop the local state. Nothing is sent to the services.
pub fn reset(session: &WishlistSession) -> CommandResult {
    session.reset();
    print_json(&session.local_wishlist())?;
    Ok(())
}
