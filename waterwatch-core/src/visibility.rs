//! Query scoping from the current actor and the type selector.

use crate::error::WaterwatchError;
use waterwatch_schemas::{
    query::{QuerySpec, TypeSelector},
    user::User,
};

/// Source of the caller's identity, e.g. a decoded session token.
pub trait AuthProvider {
    fn current_user_id(&self) -> Option<u64>;

    fn is_authenticated(&self) -> bool {
        self.current_user_id().is_some()
    }
}

/// Who is asking for samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Authenticated { user_id: u64 },
    Anonymous { selected_user: Option<u64> },
}

impl Actor {
    /// Resolves the actor from an auth provider. `selected_user` is the roster
    /// pick of an anonymous caller and is ignored once authenticated.
    pub fn resolve(
        auth: &dyn AuthProvider,
        roster: &[User],
        selected_user: Option<u64>,
    ) -> Result<Self, WaterwatchError> {
        match auth.current_user_id() {
            Some(user_id) if auth.is_authenticated() => Ok(Actor::Authenticated { user_id }),
            _ => Actor::anonymous(roster, selected_user),
        }
    }

    /// An anonymous actor, optionally browsing one user from the roster.
    pub fn anonymous(roster: &[User], selected_user: Option<u64>) -> Result<Self, WaterwatchError> {
        if let Some(id) = selected_user {
            if !roster.iter().any(|u| u.id == id) {
                return Err(WaterwatchError::UnknownUser(id));
            }
        }
        Ok(Actor::Anonymous { selected_user })
    }
}

/// Computes the store query for `actor`. Authenticated actors are always
/// scoped to themselves.
pub fn scope_for(actor: &Actor, selector: TypeSelector) -> QuerySpec {
    let user_id = match *actor {
        Actor::Authenticated { user_id } => Some(user_id),
        Actor::Anonymous { selected_user } => selected_user,
    };
    QuerySpec { sample_type: selector, user_id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waterwatch_schemas::sample::SampleType;

    struct Session(Option<u64>);

    impl AuthProvider for Session {
        fn current_user_id(&self) -> Option<u64> {
            self.0
        }
    }

    fn roster() -> Vec<User> {
        vec![
            User { id: 1, username: "ania".into() },
            User { id: 2, username: "marek".into() },
        ]
    }

    #[test]
    fn authenticated_actor_is_self_scoped() {
        let actor = Actor::resolve(&Session(Some(9)), &roster(), Some(2)).unwrap();
        assert_eq!(actor, Actor::Authenticated { user_id: 9 });
        let spec = scope_for(&actor, TypeSelector::Only(SampleType::Sludge));
        assert_eq!(spec.user_id, Some(9));
        assert_eq!(spec.sample_type.as_str(), "sludge");
    }

    #[test]
    fn anonymous_without_pick_has_no_user_filter() {
        let actor = Actor::resolve(&Session(None), &roster(), None).unwrap();
        assert_eq!(scope_for(&actor, TypeSelector::All).user_id, None);
    }

    #[test]
    fn anonymous_pick_must_come_from_roster() {
        let actor = Actor::resolve(&Session(None), &roster(), Some(2)).unwrap();
        assert_eq!(scope_for(&actor, TypeSelector::All).user_id, Some(2));
        assert!(matches!(
            Actor::anonymous(&roster(), Some(42)),
            Err(WaterwatchError::UnknownUser(42))
        ));
    }
}
