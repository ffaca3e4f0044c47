//! Code for handling IDs

/// Define a string-based ID type (e.g. for projects or zones)
macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Debug,
            serde::Deserialize,
            serde::Serialize,
        )]
        #[serde(transparent)]
        /// An ID type (e.g. `ProjectID`, `ZoneID`, etc.)
        pub struct $name(pub std::sync::Arc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::sync::Arc::from(id))
            }

            /// The ID as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}
pub(crate) use define_id_type;

#[cfg(test)]
mod tests {
    use indexmap::IndexSet;

    define_id_type! {TestID}

    #[test]
    fn id_lookup_by_str() {
        let ids: IndexSet<TestID> = ["north".into(), "south".into()].into_iter().collect();
        assert_eq!(ids.get("south"), Some(&TestID::new("south")));
        assert!(ids.get("east").is_none());
    }

    #[test]
    fn id_display() {
        assert_eq!(TestID::from("gas_ct".to_string()).to_string(), "gas_ct");
    }
}
