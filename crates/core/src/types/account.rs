//! The authenticated account that owns a wishlist.

use serde::{Deserialize, Deserializer, Serialize};

use super::{AccountId, Email};

/// Account returned by the account resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account identifier, matched against [`crate::Wishlist::owner`].
    pub id: AccountId,
    /// Contact email, used as the default wishlist title.
    ///
    /// Missing, blank and malformed values all read as `None`.
    #[serde(
        default,
        deserialize_with = "lenient_email",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact_email: Option<Email>,
}

fn lenient_email<'de, D>(deserializer: D) -> Result<Option<Email>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| Email::parse(value.trim()).ok()))
}
