use serde::{Deserialize, Serialize};

use crate::domain::{Counter, CounterId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterResponse {
    pub id: CounterId,
    pub name: String,
    pub count: i64,
}

impl From<Counter> for CounterResponse {
    fn from(value: Counter) -> Self {
        Self {
            id: value.id,
            name: value.name,
            count: value.count,
        }
    }
}

/// `count` is 0 both for a missing counter and for one sitting at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterValueResponse {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Positive,
    Info,
}

/// Flash message shown on the counter page after a button press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn incremented(count: i64) -> Self {
        Self {
            kind: NoticeKind::Positive,
            text: format!("Count increased to {count}"),
        }
    }

    pub fn reset() -> Self {
        Self {
            kind: NoticeKind::Info,
            text: "Counter reset to 0".to_string(),
        }
    }
}
