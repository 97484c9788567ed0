use sea_orm::{
    sea_query::{ArrayType, Nullable, ValueType, ValueTypeErr},
    DbErr, QueryResult, TryFromU64, TryGetError, TryGetable, Value,
};
use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseIntError};

// Identities are assigned by the database (auto-increment), so unlike
// client-generated keys there is no `new()`: an id only exists once a row does.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn from_i64(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn as_i64(&self) -> i64 {
                self.0
            }

            pub fn parse_str(s: &str) -> Result<Self, ParseIntError> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_str(s)
            }
        }

        // SeaORM trait implementations
        impl From<$name> for Value {
            fn from(id: $name) -> Self {
                Value::BigInt(Some(id.0))
            }
        }

        impl TryGetable for $name {
            fn try_get_by<I: sea_orm::ColIdx>(
                res: &QueryResult,
                idx: I,
            ) -> Result<Self, TryGetError> {
                // Delegate to i64 so NULL surfaces as `TryGetError::Null`,
                // which is what `Option<$name>` columns rely on.
                <i64 as TryGetable>::try_get_by(res, idx).map(Self)
            }
        }

        impl ValueType for $name {
            fn try_from(v: Value) -> Result<Self, ValueTypeErr> {
                match v {
                    Value::BigInt(Some(raw)) => Ok(Self(raw)),
                    Value::Int(Some(raw)) => Ok(Self(i64::from(raw))),
                    _ => Err(ValueTypeErr),
                }
            }

            fn type_name() -> String {
                stringify!($name).to_owned()
            }

            fn array_type() -> ArrayType {
                ArrayType::BigInt
            }

            fn column_type() -> sea_orm::ColumnType {
                sea_orm::ColumnType::BigInteger
            }
        }

        impl Nullable for $name {
            fn null() -> Value {
                Value::BigInt(None)
            }
        }

        impl TryFromU64 for $name {
            fn try_from_u64(n: u64) -> Result<Self, DbErr> {
                <i64 as TryFrom<u64>>::try_from(n)
                    .map(Self)
                    .map_err(|_| DbErr::ConvertFromU64(stringify!($name)))
            }
        }
    };
}

define_id!(FacultyId);
define_id!(StudentId);
define_id!(AvatarId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_conversion() {
        let id = StudentId::from_i64(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(StudentId::from(42), id);
    }

    #[test]
    fn test_id_string_conversion() {
        let id = FacultyId::from_i64(7);
        let s = id.to_string();
        let parsed = FacultyId::parse_str(&s).unwrap();
        assert_eq!(id, parsed);
        assert!(FacultyId::parse_str("seven").is_err());
    }

    #[test]
    fn test_id_serialization() {
        let id = AvatarId::from_i64(3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "3");
        let deserialized: AvatarId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_id_value_round_trip() {
        let value: Value = StudentId::from_i64(9).into();
        let back = <StudentId as ValueType>::try_from(value).unwrap();
        assert_eq!(back, StudentId::from_i64(9));
        assert_eq!(FacultyId::try_from_u64(5).unwrap(), FacultyId::from_i64(5));
        assert_eq!(
            StudentId::try_from_u64(u64::MAX).unwrap_err().to_string(),
            DbErr::ConvertFromU64("StudentId").to_string()
        );
    }
}
