use std::fmt;

macro_rules! int_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(pub i64);

        impl $name {
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

int_id!(MediaItemId, "Primary key of a MediaItem (movie or TV show).");
int_id!(SeasonId, "Primary key of a Season, scoped to one TV MediaItem.");
int_id!(JobId, "Primary key of a Job (one stage attempt).");
int_id!(TranscodeFileId, "Primary key of a TranscodeFile row.");
int_id!(LogEventId, "Primary key of a LogEvent row.");
