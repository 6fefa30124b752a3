// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The authorization gate.
//!
//! Every service entry point asks [`decide`] before touching the store. Role
//! and ownership rules live in one table ([`RULES`]); state rules that depend
//! on the conversation (the closed-conversation rule) are applied after it.

use supportdesk_core::Identity;
use supportdesk_core::types::{Conversation, ConversationStatus};

/// Everything a caller can ask the chat service to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListConversations,
    ReadConversation,
    ReadMessages,
    CreateConversation,
    UpdateConversation,
    /// `internal_note` is the effective flag, after [`effective_internal_note`].
    CreateMessage { internal_note: bool },
    Subscribe,
}

impl Operation {
    fn kind(self) -> OperationKind {
        match self {
            Operation::ListConversations => OperationKind::ListConversations,
            Operation::ReadConversation => OperationKind::ReadConversation,
            Operation::ReadMessages => OperationKind::ReadMessages,
            Operation::CreateConversation => OperationKind::CreateConversation,
            Operation::UpdateConversation => OperationKind::UpdateConversation,
            Operation::CreateMessage { .. } => OperationKind::CreateMessage,
            Operation::Subscribe => OperationKind::Subscribe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperationKind {
    ListConversations,
    ReadConversation,
    ReadMessages,
    CreateConversation,
    UpdateConversation,
    CreateMessage,
    Subscribe,
}

/// Who, within a role, may perform an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Any caller with the role.
    Any,
    /// Only the owning client. For listings this narrows the result set.
    Owner,
    Nobody,
}

struct Rule {
    op: OperationKind,
    client: Access,
    staff: Access,
}

const RULES: &[Rule] = &[
    Rule { op: OperationKind::ListConversations, client: Access::Owner, staff: Access::Any },
    Rule { op: OperationKind::ReadConversation, client: Access::Owner, staff: Access::Any },
    Rule { op: OperationKind::ReadMessages, client: Access::Owner, staff: Access::Any },
    Rule { op: OperationKind::CreateConversation, client: Access::Any, staff: Access::Nobody },
    Rule { op: OperationKind::UpdateConversation, client: Access::Nobody, staff: Access::Any },
    Rule { op: OperationKind::CreateMessage, client: Access::Owner, staff: Access::Any },
    Rule { op: OperationKind::Subscribe, client: Access::Owner, staff: Access::Any },
];

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Identity is inactive.
    Unauthenticated,
    /// Role or ownership forbids the operation.
    Forbidden,
    /// Allowed in principle, invalid for the conversation's current state.
    Conflict(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

pub const CLOSED_CONVERSATION: &str = "conversation is closed to new messages";

/// Decide whether `identity` may perform `op` on `conversation`.
///
/// `conversation` is `None` only for operations that do not target one
/// (listing and creating). An ownership rule with no conversation denies.
pub fn decide(identity: &Identity, conversation: Option<&Conversation>, op: Operation) -> Decision {
    if let Decision::Deny(denial) = admit(identity) {
        return Decision::Deny(denial);
    }

    let access = RULES
        .iter()
        .find(|rule| rule.op == op.kind())
        .map(|rule| if identity.role.is_staff() { rule.staff } else { rule.client })
        .unwrap_or(Access::Nobody);

    let permitted = match access {
        Access::Any => true,
        Access::Nobody => false,
        Access::Owner => match (op, conversation) {
            (Operation::ListConversations, _) => true,
            (_, Some(conversation)) => conversation.client_id == identity.id,
            (_, None) => false,
        },
    };
    if !permitted {
        return Decision::Deny(Denial::Forbidden);
    }

    if let (Operation::CreateMessage { internal_note: false }, Some(conversation)) =
        (op, conversation)
        && conversation.status == ConversationStatus::Closed
    {
        return Decision::Deny(Denial::Conflict(CLOSED_CONVERSATION));
    }

    Decision::Allow
}

/// Caller-only check, run before a targeted conversation is even loaded.
pub fn admit(identity: &Identity) -> Decision {
    if identity.is_active {
        Decision::Allow
    } else {
        Decision::Deny(Denial::Unauthenticated)
    }
}

/// Which conversations a listing may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    OwnedBy(String),
}

pub fn list_scope(identity: &Identity) -> ListScope {
    if identity.role.is_staff() {
        ListScope::All
    } else {
        ListScope::OwnedBy(identity.id.clone())
    }
}

/// The internal-note flag that will actually be stored.
///
/// Clients asking for an internal note get a public message instead. The
/// request is not rejected, so a client cannot tell the feature exists.
pub fn effective_internal_note(identity: &Identity, requested: bool) -> bool {
    requested && identity.role.is_staff()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use supportdesk_core::Role;
    use supportdesk_core::types::Priority;

    fn conversation(owner: &str, status: ConversationStatus) -> Conversation {
        let now = Utc::now();
        Conversation {
            id: "11111111-1111-4111-8111-111111111111".into(),
            client_id: owner.into(),
            subject: "Help".into(),
            status,
            priority: Priority::Normal,
            assigned_to: None,
            last_message_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    const TARGETED: [Operation; 5] = [
        Operation::ReadConversation,
        Operation::ReadMessages,
        Operation::CreateMessage { internal_note: false },
        Operation::Subscribe,
        Operation::UpdateConversation,
    ];

    #[test]
    fn every_operation_has_a_rule() {
        let kinds = [
            Operation::ListConversations,
            Operation::ReadConversation,
            Operation::ReadMessages,
            Operation::CreateConversation,
            Operation::UpdateConversation,
            Operation::CreateMessage { internal_note: true },
            Operation::Subscribe,
        ];
        for op in kinds {
            assert!(RULES.iter().any(|r| r.op == op.kind()), "{op:?} has no rule");
        }
    }

    #[test]
    fn client_reaches_only_own_conversations() {
        let me = Identity::new("c1", Role::Client);
        let mine = conversation("c1", ConversationStatus::Open);
        let theirs = conversation("c2", ConversationStatus::Open);
        for op in &TARGETED[..4] {
            assert_eq!(decide(&me, Some(&mine), *op), Decision::Allow, "{op:?}");
            assert_eq!(
                decide(&me, Some(&theirs), *op),
                Decision::Deny(Denial::Forbidden),
                "{op:?}"
            );
        }
    }

    #[test]
    fn staff_reach_everything_but_creation() {
        for role in [Role::Team, Role::Admin] {
            let staff = Identity::new("s1", role);
            let any = conversation("c9", ConversationStatus::Open);
            for op in TARGETED {
                assert!(decide(&staff, Some(&any), op).is_allowed(), "{op:?}");
            }
            assert_eq!(
                decide(&staff, None, Operation::CreateConversation),
                Decision::Deny(Denial::Forbidden)
            );
            assert_eq!(list_scope(&staff), ListScope::All);
        }
    }

    #[test]
    fn clients_create_but_never_update() {
        let client = Identity::new("c1", Role::Client);
        let mine = conversation("c1", ConversationStatus::Open);
        assert!(decide(&client, None, Operation::CreateConversation).is_allowed());
        assert_eq!(
            decide(&client, Some(&mine), Operation::UpdateConversation),
            Decision::Deny(Denial::Forbidden)
        );
        assert_eq!(list_scope(&client), ListScope::OwnedBy("c1".into()));
    }

    #[test]
    fn closed_conversation_takes_only_internal_notes() {
        let staff = Identity::new("s1", Role::Team);
        let client = Identity::new("c1", Role::Client);
        let closed = conversation("c1", ConversationStatus::Closed);

        assert_eq!(
            decide(&client, Some(&closed), Operation::CreateMessage { internal_note: false }),
            Decision::Deny(Denial::Conflict(CLOSED_CONVERSATION))
        );
        assert_eq!(
            decide(&staff, Some(&closed), Operation::CreateMessage { internal_note: false }),
            Decision::Deny(Denial::Conflict(CLOSED_CONVERSATION))
        );
        assert!(
            decide(&staff, Some(&closed), Operation::CreateMessage { internal_note: true })
                .is_allowed()
        );
        // Reads stay open.
        assert!(decide(&client, Some(&closed), Operation::ReadMessages).is_allowed());
    }

    #[test]
    fn ownership_is_checked_before_state() {
        let other = Identity::new("c2", Role::Client);
        let closed = conversation("c1", ConversationStatus::Closed);
        assert_eq!(
            decide(&other, Some(&closed), Operation::CreateMessage { internal_note: false }),
            Decision::Deny(Denial::Forbidden)
        );
    }

    #[test]
    fn inactive_identity_is_unauthenticated() {
        let mut admin = Identity::new("a1", Role::Admin);
        admin.is_active = false;
        assert_eq!(
            decide(&admin, None, Operation::ListConversations),
            Decision::Deny(Denial::Unauthenticated)
        );
    }

    #[test]
    fn internal_flag_coerced_for_clients() {
        assert!(!effective_internal_note(&Identity::new("c", Role::Client), true));
        assert!(effective_internal_note(&Identity::new("t", Role::Team), true));
        assert!(!effective_internal_note(&Identity::new("a", Role::Admin), false));
    }
}
