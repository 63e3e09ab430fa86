//! Who may do what.
//!
//! Every endpoint resolves the caller to an [`AuthUser`] and asks
//! [`can_access`] before reading or writing the target resource. A denial is
//! always reported as `Forbidden`, never as `NotFound`.

use uuid::Uuid;

use crate::{error::AppError, middleware::auth::AuthUser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    List,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn is_write(self) -> bool {
        matches!(self, Action::Create | Action::Update | Action::Delete)
    }
}

/// The resource a request targets, carrying the owner id where ownership matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Product,
    /// A single user account, identified by its id.
    User(Uuid),
    /// The collection of all accounts.
    Users,
    /// The cart owned by the given user.
    Cart(Uuid),
    /// All carts, for the staff overview.
    Carts,
    Site,
    SocialApp,
}

pub fn can_access(actor: &AuthUser, resource: Resource, action: Action) -> bool {
    match resource {
        Resource::Product => !action.is_write() || actor.is_staff,
        Resource::User(owner) => actor.user_id == owner || actor.is_staff,
        Resource::Users => actor.is_staff,
        Resource::Cart(owner) => {
            actor.user_id == owner || (actor.is_staff && !action.is_write())
        }
        Resource::Carts => actor.is_staff && !action.is_write(),
        Resource::Site | Resource::SocialApp => actor.is_staff,
    }
}

pub fn ensure(actor: &AuthUser, resource: Resource, action: Action) -> Result<(), AppError> {
    if can_access(actor, resource, action) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %actor.user_id,
            ?resource,
            ?action,
            "permission denied"
        );
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [Action; 5] = [
        Action::Read,
        Action::List,
        Action::Create,
        Action::Update,
        Action::Delete,
    ];

    fn staff() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            is_staff: true,
        }
    }

    fn customer() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            is_staff: false,
        }
    }

    #[test]
    fn product_writes_require_staff() {
        let user = customer();
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert!(!can_access(&user, Resource::Product, action));
            assert!(can_access(&staff(), Resource::Product, action));
        }
    }

    #[test]
    fn any_authenticated_user_reads_products() {
        assert!(can_access(&customer(), Resource::Product, Action::Read));
        assert!(can_access(&customer(), Resource::Product, Action::List));
        assert!(can_access(&staff(), Resource::Product, Action::List));
    }

    #[test]
    fn users_act_on_themselves_only() {
        let me = customer();
        let other = customer();
        for action in ALL_ACTIONS {
            assert!(can_access(&me, Resource::User(me.user_id), action));
            assert!(!can_access(&me, Resource::User(other.user_id), action));
            assert!(can_access(&staff(), Resource::User(other.user_id), action));
        }
        assert!(!can_access(&me, Resource::Users, Action::List));
        assert!(can_access(&staff(), Resource::Users, Action::List));
    }

    #[test]
    fn site_configuration_is_staff_only() {
        for action in ALL_ACTIONS {
            assert!(!can_access(&customer(), Resource::Site, action));
            assert!(!can_access(&customer(), Resource::SocialApp, action));
            assert!(can_access(&staff(), Resource::Site, action));
            assert!(can_access(&staff(), Resource::SocialApp, action));
        }
    }

    #[test]
    fn staff_can_inspect_but_not_edit_foreign_carts() {
        let owner = customer();
        let admin = staff();
        assert!(can_access(&owner, Resource::Cart(owner.user_id), Action::Update));
        assert!(can_access(&admin, Resource::Cart(owner.user_id), Action::Read));
        assert!(!can_access(&admin, Resource::Cart(owner.user_id), Action::Update));
        assert!(!can_access(&customer(), Resource::Cart(owner.user_id), Action::Read));
        assert!(can_access(&admin, Resource::Carts, Action::List));
        assert!(!can_access(&owner, Resource::Carts, Action::List));
    }

    #[test]
    fn ensure_maps_denial_to_forbidden() {
        let result = ensure(&customer(), Resource::Product, Action::Create);
        assert!(matches!(result, Err(AppError::Forbidden)));
        assert!(ensure(&staff(), Resource::Product, Action::Create).is_ok());
    }
}
