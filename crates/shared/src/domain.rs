use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(CounterId);

/// Name used when a caller does not pick a counter.
pub const DEFAULT_COUNTER_NAME: &str = "default";

/// Upper bound on `counters.name`, in characters.
pub const MAX_COUNTER_NAME_LEN: usize = 100;

/// A named, persisted integer value. Only `count` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub id: CounterId,
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCounter {
    pub name: String,
    pub count: i64,
}

impl NewCounter {
    pub fn new(name: impl Into<String>, count: i64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

impl Default for NewCounter {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTER_NAME, 0)
    }
}

/// Partial update. `count: None` re-persists the row untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterUpdate {
    #[serde(default)]
    pub count: Option<i64>,
}

impl CounterUpdate {
    pub fn set(count: i64) -> Self {
        Self { count: Some(count) }
    }

    pub fn unset() -> Self {
        Self { count: None }
    }

    pub fn apply(&self, counter: &mut Counter) {
        if let Some(count) = self.count {
            counter.count = count;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CounterNameError {
    #[error("counter name cannot be empty")]
    Empty,
    #[error("counter name is {len} characters, limit is {}", MAX_COUNTER_NAME_LEN)]
    TooLong { len: usize },
}

pub fn validate_counter_name(name: &str) -> Result<(), CounterNameError> {
    if name.is_empty() {
        return Err(CounterNameError::Empty);
    }
    let len = name.chars().count();
    if len > MAX_COUNTER_NAME_LEN {
        return Err(CounterNameError::TooLong { len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_counter_defaults_to_default_name_at_zero() {
        let payload = NewCounter::default();
        assert_eq!(payload.name, DEFAULT_COUNTER_NAME);
        assert_eq!(payload.count, 0);

        let parsed: NewCounter = serde_json::from_str(r#"{"name":"clicks"}"#).expect("json");
        assert_eq!(parsed, NewCounter::new("clicks", 0));
    }

    #[test]
    fn unset_update_leaves_count_alone() {
        let mut counter = Counter {
            id: CounterId(1),
            name: "c".into(),
            count: 15,
        };
        CounterUpdate::unset().apply(&mut counter);
        assert_eq!(counter.count, 15);

        CounterUpdate::set(20).apply(&mut counter);
        assert_eq!(counter.count, 20);
        assert_eq!(counter.id, CounterId(1));
    }

    #[test]
    fn update_accepts_null_and_missing_count() {
        let null: CounterUpdate = serde_json::from_str(r#"{"count":null}"#).expect("json");
        let missing: CounterUpdate = serde_json::from_str("{}").expect("json");
        assert_eq!(null, CounterUpdate::unset());
        assert_eq!(missing, CounterUpdate::unset());
    }

    #[test]
    fn name_length_is_counted_in_characters() {
        assert!(validate_counter_name("default").is_ok());
        assert_eq!(validate_counter_name(""), Err(CounterNameError::Empty));
        assert!(validate_counter_name(&"é".repeat(MAX_COUNTER_NAME_LEN)).is_ok());
        assert_eq!(
            validate_counter_name(&"x".repeat(MAX_COUNTER_NAME_LEN + 1)),
            Err(CounterNameError::TooLong {
                len: MAX_COUNTER_NAME_LEN + 1
            })
        );
    }
}
