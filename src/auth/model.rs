use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identity attributes of the signed-in user.
///
/// A snapshot of what the authentication provider reports; the binding never
/// mutates one, it only swaps whole values when the provider emits a change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub email_verified: bool,
    pub is_anonymous: bool,
    pub phone_number: Option<String>,
    pub photo_url: Option<String>,
    pub provider_id: String,
    pub tenant_id: Option<String>,
}

/// Field-by-field comparison over every stable identity attribute.
///
/// Used to decide whether an identity event actually changed the stored
/// user; an event that re-delivers the same identity (a pure token refresh)
/// must not replace it.
pub fn users_equal(left: Option<&AuthUser>, right: Option<&AuthUser>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.display_name == b.display_name
                && a.email == b.email
                && a.email_verified == b.email_verified
                && a.is_anonymous == b.is_anonymous
                && a.phone_number == b.phone_number
                && a.photo_url == b.photo_url
                && a.provider_id == b.provider_id
                && a.tenant_id == b.tenant_id
                && a.uid == b.uid
        }
        _ => false,
    }
}

/// Result of a (possibly forced) ID token refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTokenResult {
    pub token: String,
    pub auth_time: Option<String>,
    pub issued_at_time: Option<String>,
    pub expiration_time: Option<String>,
    pub sign_in_provider: Option<String>,
    pub claims: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(uid: &str) -> AuthUser {
        AuthUser {
            uid: uid.to_string(),
            email: Some(format!("{uid}@example.com")),
            provider_id: "password".to_string(),
            ..AuthUser::default()
        }
    }

    #[test]
    fn equal_users_compare_equal() {
        assert!(users_equal(Some(&user("alice")), Some(&user("alice"))));
        assert!(users_equal(None, None));
    }

    #[test]
    fn any_attribute_difference_is_a_change() {
        let base = user("alice");

        let mut renamed = base.clone();
        renamed.display_name = Some("Alice".to_string());
        assert!(!users_equal(Some(&base), Some(&renamed)));

        let mut verified = base.clone();
        verified.email_verified = true;
        assert!(!users_equal(Some(&base), Some(&verified)));

        assert!(!users_equal(Some(&base), None));
        assert!(!users_equal(None, Some(&base)));
    }
}
