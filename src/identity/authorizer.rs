use std::collections::HashSet;

use super::principal::Principal;

/// Operations that read or mutate state beyond the caller's own slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrivilegedOp {
    GlobalHistory,
    ListContexts,
    Sweep,
}

impl PrivilegedOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivilegedOp::GlobalHistory => "global_history",
            PrivilegedOp::ListContexts => "list_contexts",
            PrivilegedOp::Sweep => "sweep",
        }
    }
}

/// Authorization tier above authentication. Consulted only after the identity is verified.
pub trait PrivilegePolicy: Send + Sync {
    fn allows(&self, principal: &Principal, op: PrivilegedOp) -> bool;

    fn describe(&self) -> String;
}

/// Any authenticated identity may run privileged operations.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAuthenticated;

impl PrivilegePolicy for AllowAuthenticated {
    fn allows(&self, _principal: &Principal, _op: PrivilegedOp) -> bool { true }

    fn describe(&self) -> String { "open (any authenticated identity)".to_string() }
}

/// Only the listed identities may run privileged operations. An empty list denies everyone.
#[derive(Debug, Default, Clone)]
pub struct AllowList {
    identities: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { identities: identities.into_iter().map(Into::into).filter(|s: &String| !s.trim().is_empty()).collect() }
    }

    pub fn len(&self) -> usize { self.identities.len() }
    pub fn is_empty(&self) -> bool { self.identities.is_empty() }
}

impl PrivilegePolicy for AllowList {
    fn allows(&self, principal: &Principal, _op: PrivilegedOp) -> bool {
        self.identities.contains(&principal.identity)
    }

    fn describe(&self) -> String { format!("allow-list ({} identities)", self.identities.len()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_matches_exact_identity() {
        let policy = AllowList::new(["admin", " ", "ops"]);
        assert_eq!(policy.len(), 2);
        assert!(policy.allows(&Principal::new("admin"), PrivilegedOp::Sweep));
        assert!(!policy.allows(&Principal::new("Admin"), PrivilegedOp::Sweep));
        assert!(!policy.allows(&Principal::new("u1"), PrivilegedOp::ListContexts));
    }

    #[test]
    fn empty_allow_list_denies_everyone() {
        let policy = AllowList::default();
        assert!(policy.is_empty());
        assert!(!policy.allows(&Principal::new("admin"), PrivilegedOp::GlobalHistory));
    }

    #[test]
    fn open_policy_allows_any_principal() {
        assert!(AllowAuthenticated.allows(&Principal::new("anyone"), PrivilegedOp::GlobalHistory));
        assert_eq!(PrivilegedOp::ListContexts.as_str(), "list_contexts");
    }
}
