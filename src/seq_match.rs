use serde::{Deserialize, Serialize};

/// A raw hit from sequence search against a fragment database.
///
/// Coordinates are 0-indexed and end-inclusive, already normalized so that
/// `query_end >= query_start` and `subject_end >= subject_start` regardless
/// of strand. For circular targets the query range may run past the target
/// length to represent wrap-around without modular arithmetic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Match {
    /// entry of the matched building fragment in the database
    pub entry: String,

    /// unique id for the match: entry name + start index modulo the target
    /// length. Distinguishes repeat occurrences of the same entry and
    /// identifies wrap-around copies with their zero-index original.
    #[serde(default)]
    pub unique_id: String,

    /// sequence of the match on the target
    pub seq: String,

    /// start index of the match on the target (0-indexed)
    pub query_start: i64,

    /// end index of the match on the target (0-indexed, inclusive)
    pub query_end: i64,

    /// start index of the match on the subject fragment (0-indexed)
    #[serde(default)]
    pub subject_start: i64,

    /// end index of the match on the subject fragment (0-indexed, inclusive)
    #[serde(default)]
    pub subject_end: i64,

    /// the database the hit came from
    #[serde(default)]
    pub db: String,

    /// whether the subject is a circular fragment (vector, plasmid, etc)
    #[serde(default)]
    pub circular: bool,

    /// number of mismatching bps in the match
    #[serde(default)]
    pub mismatching: u32,

    /// whether the fragment is local, ie free of procurement cost
    #[serde(default)]
    pub internal: bool,

    /// whether the match is on the sequence strand versus the reverse
    /// complement strand
    #[serde(default = "default_forward")]
    pub forward: bool,
}

fn default_forward() -> bool {
    true
}

impl Match {
    /// Length of the match on the target (end-inclusive coordinates).
    pub fn length(&self) -> i64 {
        self.query_end - self.query_start + 1
    }

    /// The entry + start-modulo-target disambiguator. Wrap-around copies of
    /// a match share the unique id of their zero-index original.
    pub fn derive_unique_id(entry: &str, query_start: i64, target_length: i64) -> String {
        format!("{}{}", entry, query_start.rem_euclid(target_length))
    }

    /// Fills in `unique_id` if the search collaborator didn't supply one.
    pub fn with_unique_id(mut self, target_length: i64) -> Self {
        if self.unique_id.is_empty() {
            self.unique_id = Self::derive_unique_id(&self.entry, self.query_start, target_length);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_match(entry: &str, start: i64, end: i64) -> Match {
        Match {
            entry: entry.to_string(),
            unique_id: String::new(),
            seq: String::new(),
            query_start: start,
            query_end: end,
            subject_start: 0,
            subject_end: end - start,
            db: String::new(),
            circular: false,
            mismatching: 0,
            internal: true,
            forward: true,
        }
    }

    #[test]
    fn test_length_inclusive() {
        assert_eq!(test_match("f1", 0, 49).length(), 50);
        assert_eq!(test_match("f1", 10, 10).length(), 1);
    }

    #[test]
    fn test_unique_id_wraps() {
        // a wrap-around copy shares the id of the original occurrence
        let first = test_match("gnl|addgene|113726", 5, 55).with_unique_id(100);
        let wrapped = test_match("gnl|addgene|113726", 105, 155).with_unique_id(100);
        assert_eq!(first.unique_id, wrapped.unique_id);

        // a second occurrence elsewhere gets its own id
        let other = test_match("gnl|addgene|113726", 40, 90).with_unique_id(100);
        assert_ne!(first.unique_id, other.unique_id);
    }

    #[test]
    fn test_deserialize_defaults() {
        let m: Match = serde_json::from_str(
            r#"{ "entry": "BBa_K1085023", "seq": "ATGC", "query_start": 0, "query_end": 3 }"#,
        )
        .unwrap();
        assert!(m.forward);
        assert!(!m.internal);
        assert_eq!(m.length(), 4);
    }
}
