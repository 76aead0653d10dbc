//! Pre-fill data for the onboarding form.

use serde::{Deserialize, Serialize};

use crate::identity::Session;
use crate::profile::ProfileRecord;

/// Values the onboarding form starts from.
///
/// Each field prefers the stored profile, then the identity provider, then
/// the empty string. Empty strings count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: String,
    pub object_id: String,
    pub username: String,
    pub name: String,
    pub bio: String,
    pub image: String,
}

impl UserData {
    pub fn assemble(session: &Session, profile: Option<&ProfileRecord>) -> Self {
        Self {
            id: session.user_id.clone(),
            object_id: first_present([profile.map(|p| p.object_id.as_str())]),
            username: first_present([profile.and_then(|p| p.username.as_deref()), session.username.as_deref()]),
            name: first_present([profile.and_then(|p| p.name.as_deref()), session.first_name.as_deref()]),
            bio: first_present([profile.and_then(|p| p.bio.as_deref())]),
            image: first_present([profile.and_then(|p| p.image.as_deref()), session.image_url.as_deref()]),
        }
    }
}

fn first_present<const N: usize>(candidates: [Option<&str>; N]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}
