use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row ids are SQLite `INTEGER PRIMARY KEY` values; each table gets its own
/// newtype so a ticket id can never be passed where a user id is expected.
macro_rules! row_id {
    ($name:ident, $label:expr) => {
        #[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $label, self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

row_id!(UserId, "user");
row_id!(TicketId, "ticket");
row_id!(CommentId, "comment");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_label() {
        assert_eq!(UserId::new(7).to_string(), "user#7");
        assert_eq!(TicketId::new(1).to_string(), "ticket#1");
        assert_eq!(CommentId::new(42).to_string(), "comment#42");
    }

    #[test]
    fn parses_from_path_segment() {
        let id: TicketId = "15".parse().unwrap();
        assert_eq!(id.get(), 15);
        assert!("abc".parse::<TicketId>().is_err());
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&TicketId::new(3)).unwrap();
        assert_eq!(json, "3");
        let parsed: UserId = serde_json::from_str("9").unwrap();
        assert_eq!(parsed, UserId::new(9));
    }
}
