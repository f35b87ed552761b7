//! Ownership-based authorization.
//!
//! Access to accounts and transactions is decided in two phases:
//!
//! 1. [`check_claims`] runs before any object is loaded, against the
//!    ownership the request payload claims (`account_owner` or `account`).
//!    A claim on an account must still be resolved against the database, so
//!    the result may be [`Decision::ResolveAccount`].
//! 2. [`can_access`] runs once the object is loaded, against the ownership
//!    recorded on the object itself.
//!
//! Staff and superusers bypass both phases. Anything that cannot be resolved
//! is denied.

/// The identity a request acts as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Actor {
    /// Staff and superusers are allowed everything.
    pub fn is_admin(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

/// A reference to another resource, as sent by a client.
///
/// Clients may send a bare id or a resource path such as
/// `http://host/accounts/3/`; only the trailing numeric segment matters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    Id(i64),
    Malformed,
}

impl Reference {
    /// Parses a textual reference, keeping the last path segment.
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse::<i64>().ok())
            .map_or(Self::Malformed, Self::Id)
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Malformed => None,
        }
    }
}

/// Ownership a write payload claims.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Claims {
    /// Owner named directly (account payloads).
    pub account_owner: Option<Reference>,
    /// Parent account named (transaction payloads).
    pub account: Option<Reference>,
}

/// Outcome of the pre-object check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    /// Allowed only if the account with this id is owned by the actor.
    ResolveAccount(i64),
}

/// Phase 1: decide on the ownership a payload claims.
pub fn check_claims(actor: &Actor, claims: &Claims) -> Decision {
    if actor.is_admin() {
        return Decision::Allow;
    }

    if let Some(owner) = &claims.account_owner {
        return match owner.id() {
            Some(id) if id == actor.id => Decision::Allow,
            _ => Decision::Deny,
        };
    }

    match &claims.account {
        None => Decision::Allow,
        Some(account) => account
            .id()
            .map_or(Decision::Deny, Decision::ResolveAccount),
    }
}

/// Completes [`Decision::ResolveAccount`] once the account owner is known.
///
/// `owner` is `None` both when the account does not exist and when it has no
/// owner; either way the claim is denied.
pub fn owns_resolved(actor: &Actor, owner: Option<Option<i64>>) -> bool {
    owner.flatten() == Some(actor.id)
}

/// Where the owner of a loaded object is recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// Owned through a parent account; holds that account's owner.
    ViaAccount(Option<i64>),
    /// Owned directly; holds the `account_owner` field.
    Direct(Option<i64>),
    Unowned,
}

/// Objects subject to the post-object check.
pub trait Owned {
    fn ownership(&self) -> Ownership;
}

/// Phase 2: decide on a loaded object.
pub fn can_access(actor: &Actor, object: &impl Owned) -> bool {
    if actor.is_admin() {
        return true;
    }

    match object.ownership() {
        Ownership::ViaAccount(owner) | Ownership::Direct(owner) => owner == Some(actor.id),
        Ownership::Unowned => false,
    }
}
