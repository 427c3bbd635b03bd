use crate::error::ModelError;

/// Strongly typed identity for folder records.
///
/// Folder ids are assigned once by the walker, written into the on-disk
/// marker, and never reused after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FolderId(pub i64);

/// Strongly typed identity for content units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ContentId(pub i64);

/// Strongly typed identity for media file records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MediaRecordId(pub i64);

macro_rules! integer_id_impls {
    ($name:ident) => {
        impl $name {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> i64 {
                self.0
            }

            /// The identity immediately following this one in allocation order.
            pub const fn next(self) -> Self {
                Self(self.0 + 1)
            }

            pub fn from_raw(raw: i64) -> Result<Self, ModelError> {
                if raw < 1 {
                    return Err(ModelError::InvalidId(format!(
                        concat!(stringify!($name), " must be positive, got {}"),
                        raw
                    )));
                }
                Ok(Self(raw))
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

integer_id_impls!(FolderId);
integer_id_impls!(ContentId);
integer_id_impls!(MediaRecordId);
