//! Inbound events handed over by the chat platform client.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(v: u64) -> Self {
                Self(v)
            }
        }
    };
}

snowflake!(
    /// Platform user id.
    UserId
);
snowflake!(ChannelId);
snowflake!(MessageId);

/// A new or edited text message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message_id: MessageId,
    pub author_id: UserId,
    pub channel_id: ChannelId,
    pub text: String,
    pub is_edit: bool,
    /// Highest role position of the author, when the platform reports one.
    pub author_privilege: Option<u32>,
}

impl MessageEvent {
    pub fn new(
        author_id: impl Into<UserId>,
        channel_id: impl Into<ChannelId>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            message_id: MessageId(0),
            author_id: author_id.into(),
            channel_id: channel_id.into(),
            text: text.into(),
            is_edit: false,
            author_privilege: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<MessageId>) -> Self {
        self.message_id = id.into();
        self
    }

    pub fn edited(mut self) -> Self {
        self.is_edit = true;
        self
    }

    pub fn with_privilege(mut self, level: u32) -> Self {
        self.author_privilege = Some(level);
        self
    }
}

/// A user invoking a rate-limited action (command).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationEvent {
    pub user_id: UserId,
    pub action_id: String,
}

impl InvocationEvent {
    pub fn new(user_id: impl Into<UserId>, action_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            action_id: action_id.into(),
        }
    }
}

/// Everything the host feeds into the moderation loop, on one stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Message(MessageEvent),
    Invocation(InvocationEvent),
}

impl InboundEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            InboundEvent::Message(m) => m.author_id,
            InboundEvent::Invocation(i) => i.user_id,
        }
    }
}

impl From<MessageEvent> for InboundEvent {
    fn from(ev: MessageEvent) -> Self {
        InboundEvent::Message(ev)
    }
}

impl From<InvocationEvent> for InboundEvent {
    fn from(ev: InvocationEvent) -> Self {
        InboundEvent::Invocation(ev)
    }
}
