//! Static fallback lookup lists, consulted only when the live store has no
//! answer for a name query.
//!
//! Two independent JSON snapshots (an exported contact list and an exported
//! group list) are loaded lazily on first use and cached for the process
//! lifetime. A missing or unparsable file yields an empty list, never an
//! error.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{digits_of, USER_SUFFIX};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FallbackContact {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) first_name: Option<String>,
    #[serde(default)]
    pub(crate) last_name: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
}

impl FallbackContact {
    /// Display name, or first+last concatenation when no single name field.
    pub(crate) fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        match (first.is_empty(), last.is_empty()) {
            (false, false) => format!("{first} {last}"),
            (false, true) => first.to_string(),
            (true, false) => last.to_string(),
            (true, true) => String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FallbackGroup {
    pub(crate) name: String,
    pub(crate) jid: String,
}

fn load_snapshot<T: DeserializeOwned>(path: &Path, label: &str) -> Vec<T> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_slice(&bytes) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("[contacts] could not parse {label} ({}): {e}", path.display());
            Vec::new()
        }
    }
}

/// Best-effort fallback index over the two snapshots. Constructed once at
/// process start and injected into the resolver.
pub(crate) struct ContactIndex {
    contacts_path: PathBuf,
    groups_path: PathBuf,
    contacts: OnceLock<Vec<FallbackContact>>,
    groups: OnceLock<Vec<FallbackGroup>>,
}

impl ContactIndex {
    pub(crate) fn new(contacts_path: PathBuf, groups_path: PathBuf) -> Self {
        Self {
            contacts_path,
            groups_path,
            contacts: OnceLock::new(),
            groups: OnceLock::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_entries(
        contacts: Vec<FallbackContact>,
        groups: Vec<FallbackGroup>,
    ) -> Self {
        let index = Self::new(PathBuf::new(), PathBuf::new());
        let _ = index.contacts.set(contacts);
        let _ = index.groups.set(groups);
        index
    }

    fn contacts(&self) -> &[FallbackContact] {
        self.contacts
            .get_or_init(|| load_snapshot(&self.contacts_path, "contact snapshot"))
    }

    fn groups(&self) -> &[FallbackGroup] {
        self.groups
            .get_or_init(|| load_snapshot(&self.groups_path, "group snapshot"))
    }

    /// Case-insensitive substring match on the contact's display name; the
    /// first match's phone digits become a canonical individual JID. Entries
    /// without usable phone digits count as no match.
    pub(crate) fn find_contact_fallback(&self, query: &str) -> Option<String> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        for entry in self.contacts() {
            if !entry.display_name().to_lowercase().contains(&needle) {
                continue;
            }
            let digits = digits_of(entry.phone.as_deref().unwrap_or(""));
            if digits.is_empty() {
                continue;
            }
            return Some(format!("{digits}{USER_SUFFIX}"));
        }
        None
    }

    /// All groups whose name matches the substring, deterministically ordered
    /// by (name, jid). The caller handles 0/1/many.
    pub(crate) fn find_group_fallback(&self, query: &str) -> Vec<FallbackGroup> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut matches: Vec<FallbackGroup> = self
            .groups()
            .iter()
            .filter(|g| g.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.jid.cmp(&b.jid)));
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: Option<&str>, first: Option<&str>, last: Option<&str>, phone: Option<&str>) -> FallbackContact {
        FallbackContact {
            name: name.map(String::from),
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            phone: phone.map(String::from),
        }
    }

    fn group(name: &str, jid: &str) -> FallbackGroup {
        FallbackGroup { name: name.to_string(), jid: jid.to_string() }
    }

    #[test]
    fn missing_files_mean_empty_lists() {
        let index = ContactIndex::new(
            PathBuf::from("/nonexistent/contacts.json"),
            PathBuf::from("/nonexistent/groups.json"),
        );
        assert!(index.find_contact_fallback("alice").is_none());
        assert!(index.find_group_fallback("family").is_empty());
    }

    #[test]
    fn contact_match_builds_jid_from_digits() {
        let index = ContactIndex::with_entries(
            vec![contact(Some("Alice Smith"), None, None, Some("+1 555-123-4567"))],
            Vec::new(),
        );
        assert_eq!(
            index.find_contact_fallback("alice"),
            Some("15551234567@s.whatsapp.net".to_string())
        );
    }

    #[test]
    fn first_last_concatenation_matches() {
        let index = ContactIndex::with_entries(
            vec![contact(None, Some("Bob"), Some("Jones"), Some("447700900123"))],
            Vec::new(),
        );
        assert_eq!(
            index.find_contact_fallback("bob jones"),
            Some("447700900123@s.whatsapp.net".to_string())
        );
    }

    #[test]
    fn contact_without_phone_digits_is_no_match() {
        let index = ContactIndex::with_entries(
            vec![
                contact(Some("Carol"), None, None, None),
                contact(Some("Carol Two"), None, None, Some("not a number")),
            ],
            Vec::new(),
        );
        assert!(index.find_contact_fallback("carol").is_none());
    }

    #[test]
    fn group_matches_are_sorted_and_complete() {
        let index = ContactIndex::with_entries(
            Vec::new(),
            vec![
                group("Smith Family", "222@g.us"),
                group("Family Chat", "111@g.us"),
                group("Work", "333@g.us"),
            ],
        );
        let hits = index.find_group_fallback("family");
        let names: Vec<_> = hits.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Family Chat", "Smith Family"]);
    }
}
