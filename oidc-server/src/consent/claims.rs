//! Claim values of the logged-in user

use crate::identity::{User, UserStore};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Resolves claim values for one user during one decision
///
/// The user is looked up once and reused for every claim.
pub struct ClaimResolver<'a> {
    users: &'a UserStore,
    user: OnceLock<(String, Option<User>)>,
}

impl<'a> ClaimResolver<'a> {
    pub fn new(users: &'a UserStore) -> Self {
        Self {
            users,
            user: OnceLock::new(),
        }
    }

    fn with_user<T>(&self, user_id: &str, f: impl FnOnce(Option<&User>) -> T) -> T {
        let (cached_id, cached) = self
            .user
            .get_or_init(|| (user_id.to_string(), self.users.find(user_id)));
        if cached_id == user_id {
            f(cached.as_ref())
        } else {
            f(self.users.find(user_id).as_ref())
        }
    }

    /// Value of `claim_name` for the user, or None when unknown or unsupported
    ///
    /// Profiles are not localized, so the language tag does not change the value.
    pub fn resolve(&self, user_id: &str, claim_name: &str, _language_tag: Option<&str>) -> Option<String> {
        self.with_user(user_id, |user| {
            let user = user?;
            match claim_name {
                "name" => match (&user.given_name, &user.family_name) {
                    (Some(given), Some(family)) => Some(format!("{given} {family}")),
                    _ => None,
                },
                "given_name" => user.given_name.clone(),
                "family_name" => user.family_name.clone(),
                "email" => user.email.clone(),
                _ => None,
            }
        })
    }
}

/// Collect the requested claims as the JSON object the engine embeds in the ID token
///
/// A name of the form `claim#tag` is resolved for that language tag and keyed by
/// the full name. A plain name tries each requested locale in order, then no
/// locale. Returns None when no value was found.
pub fn collect_claims(
    resolver: &ClaimResolver<'_>,
    subject: &str,
    claim_names: &[String],
    claim_locales: &[String],
) -> Option<String> {
    let mut collected = Map::new();

    for full_name in claim_names {
        let value = match full_name.split_once('#') {
            Some((name, tag)) => resolver.resolve(subject, name, Some(tag)),
            None => claim_locales
                .iter()
                .find_map(|locale| resolver.resolve(subject, full_name, Some(locale)))
                .or_else(|| resolver.resolve(subject, full_name, None)),
        };

        if let Some(value) = value {
            collected.insert(full_name.clone(), Value::String(value));
        }
    }

    if collected.is_empty() {
        return None;
    }
    serde_json::to_string(&collected).ok()
}
