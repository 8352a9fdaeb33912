//! Attribute values with an explicit absent/unknown distinction.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single attribute of a plan or state record.
///
/// `Null` means the attribute has no value. `Unknown` means the value is not
/// decided yet (the server computes it); it only appears in plans and is
/// written out as null if it ever reaches a state file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Attr<T> {
    /// A definite value.
    Known(T),
    /// Explicitly absent.
    Null,
    /// Not known until after apply.
    Unknown,
}

impl<T> Default for Attr<T> {
    fn default() -> Self {
        Self::Null
    }
}

impl<T> Attr<T> {
    /// `Some` becomes `Known`, `None` becomes `Unknown`.
    ///
    /// Used for planned inputs the user left out.
    pub fn known_or_unknown(value: Option<T>) -> Self {
        value.map_or(Self::Unknown, Self::Known)
    }

    /// Whether the value is definite.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Whether the value is explicitly absent.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value is still to be computed.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Borrow the definite value.
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }

    /// Map the definite value, keeping `Null` and `Unknown`.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attr<U> {
        match self {
            Self::Known(value) => Attr::Known(f(value)),
            Self::Null => Attr::Null,
            Self::Unknown => Attr::Unknown,
        }
    }

    /// Borrowing form of the value.
    pub fn as_ref(&self) -> Attr<&T> {
        match self {
            Self::Known(value) => Attr::Known(value),
            Self::Null => Attr::Null,
            Self::Unknown => Attr::Unknown,
        }
    }
}

impl<T: PartialEq> Attr<T> {
    /// The planned value, when it is known and differs from `prior`.
    ///
    /// Unknown and null plan values never produce a change.
    pub fn changed_from(&self, prior: &Attr<T>) -> Option<&T> {
        match (self, prior) {
            (Self::Known(planned), Self::Known(current)) if planned == current => None,
            (Self::Known(planned), _) => Some(planned),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Attr<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Known)
    }
}

impl<T: Serialize> Serialize for Attr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(value) => value.serialize(serializer),
            Self::Null | Self::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Attr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_null() {
        let attr: Attr<i64> = Attr::default();
        assert!(attr.is_null());
        assert_eq!(Attr::<i64>::known_or_unknown(None), Attr::Unknown);
        assert_eq!(Attr::from(Some(3)), Attr::Known(3));
    }

    #[test]
    fn test_changed_from() {
        let planned = Attr::Known("new".to_string());
        assert_eq!(planned.changed_from(&Attr::Known("old".into())), Some(&"new".to_string()));
        assert_eq!(planned.changed_from(&Attr::Known("new".into())), None);
        assert_eq!(planned.changed_from(&Attr::Null), Some(&"new".to_string()));
        assert_eq!(Attr::<String>::Unknown.changed_from(&Attr::Known("x".into())), None);
        assert_eq!(Attr::<String>::Null.changed_from(&Attr::Known("x".into())), None);
    }

    #[test]
    fn test_serde_as_option() {
        #[derive(Serialize, Deserialize)]
        struct Record {
            a: Attr<i64>,
            b: Attr<i64>,
            c: Attr<i64>,
            #[serde(default)]
            d: Attr<i64>,
        }

        let record = Record {
            a: Attr::Known(1),
            b: Attr::Null,
            c: Attr::Unknown,
            d: Attr::Known(4),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"a":1,"b":null,"c":null,"d":4}"#);

        let back: Record = serde_json::from_str(r#"{"a":1,"b":null,"c":null}"#).unwrap();
        assert_eq!(back.a, Attr::Known(1));
        assert!(back.b.is_null());
        assert!(back.c.is_null());
        assert!(back.d.is_null());
    }

    #[test]
    fn test_map_keeps_markers() {
        assert_eq!(Attr::Known(2).map(|v| v * 10), Attr::Known(20));
        assert_eq!(Attr::<i64>::Unknown.map(|v| v * 10), Attr::Unknown);
        assert_eq!(Attr::<i64>::Null.as_ref(), Attr::Null);
    }
}
