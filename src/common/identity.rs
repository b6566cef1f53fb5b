use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// The signed-in user as far as comments are concerned: a display name.
///
/// Authorship checks compare this name with `CommentNode::author_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl core::fmt::Display for Identity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Source of the current user. `None` means anonymous.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<Identity>;
}

impl IdentityProvider for Identity {
    fn current_user(&self) -> Option<Identity> {
        Some(self.clone())
    }
}

impl IdentityProvider for Option<Identity> {
    fn current_user(&self) -> Option<Identity> {
        self.clone()
    }
}

/// Lets a session switch users (sign in, sign out) while views hold a handle.
impl IdentityProvider for RefCell<Option<Identity>> {
    fn current_user(&self) -> Option<Identity> {
        self.borrow().clone()
    }
}

impl<P: IdentityProvider + ?Sized> IdentityProvider for Rc<P> {
    fn current_user(&self) -> Option<Identity> {
        (**self).current_user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        let identity = Identity::new("alice");
        assert_eq!(identity.to_string(), "alice");
    }

    #[test]
    fn test_static_providers() {
        assert_eq!(Identity::new("bob").current_user(), Some(Identity::new("bob")));
        assert_eq!(None::<Identity>.current_user(), None);
    }

    #[test]
    fn test_shared_provider_follows_sign_in() {
        let session = Rc::new(RefCell::new(None));
        let view_handle = Rc::clone(&session);
        assert_eq!(view_handle.current_user(), None);

        *session.borrow_mut() = Some(Identity::new("alice"));
        assert_eq!(view_handle.current_user(), Some(Identity::new("alice")));
    }
}
