//! Well-known storage keys owned by the draft subsystem.

use std::fmt::Display;

/// Keys this subsystem claims in the shared device store.
///
/// The string forms are part of the persisted layout: changing one orphans
/// every user's in-progress drafts stored under the old name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Full wizard progress: form payload plus step counters.
    RegistrationData,
    /// Step counters only, for progress indicators.
    RegistrationProgress,
    /// Map of named form drafts.
    FormDrafts,
    /// Timestamp of the last successful save.
    LastActivity,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::RegistrationData,
        StorageKey::RegistrationProgress,
        StorageKey::FormDrafts,
        StorageKey::LastActivity,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            StorageKey::RegistrationData => "registration_data",
            StorageKey::RegistrationProgress => "registration_progress",
            StorageKey::FormDrafts => "form_drafts",
            StorageKey::LastActivity => "last_activity",
        }
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_strings_are_stable() {
        assert_eq!(StorageKey::RegistrationData.as_str(), "registration_data");
        assert_eq!(StorageKey::RegistrationProgress.as_str(), "registration_progress");
        assert_eq!(StorageKey::FormDrafts.as_str(), "form_drafts");
        assert_eq!(StorageKey::LastActivity.as_str(), "last_activity");
    }

    #[test]
    fn test_all_keys_are_distinct() {
        let names: HashSet<_> = StorageKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), StorageKey::ALL.len());
    }
}
