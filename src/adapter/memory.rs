//! In-process directory backed by a snapshot.
//!
//! Holds members, their groups and balances in memory. The first group of a
//! member is its primary group. Can be seeded from a TOML snapshot:
//!
//! ```toml
//! groups = ["staff"]
//!
//! [[members]]
//! id = "alice"
//! groups = ["vip", "default"]
//! balance = 100.0
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;

use crate::domain::MemberId;
use crate::error::{ConfigError, DirectoryError, Result};
use crate::port::Directory;

/// One member entry of a directory snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberRecord {
    pub id: MemberId,
    /// Groups in priority order; the first is the primary group.
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub balance: f64,
}

/// Serialized directory contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectorySnapshot {
    /// Groups that exist even without members.
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
}

#[derive(Debug, Default)]
struct State {
    groups: BTreeSet<String>,
    members: BTreeMap<MemberId, MemberRecord>,
}

/// Thread-safe in-memory [`Directory`].
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<State>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        let directory = Self::new();
        {
            let mut state = directory.state.write();
            state.groups.extend(snapshot.groups);
            for record in snapshot.members {
                state.groups.extend(record.groups.iter().cloned());
                state.members.insert(record.id.clone(), record);
            }
        }
        directory
    }

    /// Load a snapshot from a TOML file.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let snapshot: DirectorySnapshot = toml::from_str(&content).map_err(ConfigError::Parse)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Insert or replace a member.
    pub fn upsert_member(&self, id: impl Into<MemberId>, groups: &[&str], balance: f64) {
        let record = MemberRecord {
            id: id.into(),
            groups: groups.iter().map(|g| (*g).to_string()).collect(),
            balance,
        };
        let mut state = self.state.write();
        state.groups.extend(record.groups.iter().cloned());
        state.members.insert(record.id.clone(), record);
    }

    /// Update a member's balance. Returns false if the member is unknown.
    pub fn set_balance(&self, id: &MemberId, balance: f64) -> bool {
        match self.state.write().members.get_mut(id) {
            Some(record) => {
                record.balance = balance;
                true
            }
            None => false,
        }
    }

    /// Remove a member. Returns true if it existed.
    pub fn remove_member(&self, id: &MemberId) -> bool {
        self.state.write().members.remove(id).is_some()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().members.len()
    }

    /// Returns true if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_groups(&self) -> std::result::Result<Vec<String>, DirectoryError> {
        Ok(self.state.read().groups.iter().cloned().collect())
    }

    async fn list_members(&self) -> std::result::Result<Vec<MemberId>, DirectoryError> {
        Ok(self.state.read().members.keys().cloned().collect())
    }

    async fn is_member(
        &self,
        member: &MemberId,
        group: &str,
    ) -> std::result::Result<bool, DirectoryError> {
        Ok(self
            .state
            .read()
            .members
            .get(member)
            .is_some_and(|r| r.groups.iter().any(|g| g == group)))
    }

    async fn primary_group(
        &self,
        member: &MemberId,
    ) -> std::result::Result<Option<String>, DirectoryError> {
        Ok(self
            .state
            .read()
            .members
            .get(member)
            .and_then(|r| r.groups.first().cloned()))
    }

    async fn balance_of(&self, member: &MemberId) -> std::result::Result<f64, DirectoryError> {
        self.state
            .read()
            .members
            .get(member)
            .map(|r| r.balance)
            .ok_or_else(|| DirectoryError::Lookup {
                member: member.to_string(),
                reason: "unknown member".into(),
            })
    }

    async fn members_of(&self, group: &str) -> std::result::Result<Vec<MemberId>, DirectoryError> {
        Ok(self
            .state
            .read()
            .members
            .values()
            .filter(|r| r.groups.iter().any(|g| g == group))
            .map(|r| r.id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"
groups = ["staff"]

[[members]]
id = "alice"
groups = ["vip", "default"]
balance = 100.0

[[members]]
id = "bob"
groups = ["default"]
balance = 25.5

[[members]]
id = "carol"
"#;

    fn seeded() -> InMemoryDirectory {
        let snapshot: DirectorySnapshot = toml::from_str(SNAPSHOT).unwrap();
        InMemoryDirectory::from_snapshot(snapshot)
    }

    #[tokio::test]
    async fn snapshot_registers_all_groups() {
        let directory = seeded();
        let groups = directory.list_groups().await.unwrap();
        assert_eq!(groups, vec!["default", "staff", "vip"]);
        assert_eq!(directory.len(), 3);
    }

    #[tokio::test]
    async fn primary_group_is_first_listed() {
        let directory = seeded();
        assert_eq!(
            directory.primary_group(&"alice".into()).await.unwrap(),
            Some("vip".to_string())
        );
        assert_eq!(directory.primary_group(&"carol".into()).await.unwrap(), None);
        assert_eq!(directory.primary_group(&"nobody".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn members_of_matches_any_listed_group() {
        let directory = seeded();
        let members = directory.members_of("default").await.unwrap();
        assert_eq!(members, vec![MemberId::new("alice"), MemberId::new("bob")]);
        assert!(directory.members_of("staff").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn balance_of_unknown_member_fails() {
        let directory = seeded();
        assert!(directory.balance_of(&"nobody".into()).await.is_err());
        assert_eq!(directory.balance_of(&"bob".into()).await.unwrap(), 25.5);
    }

    #[tokio::test]
    async fn mutations_are_visible() {
        let directory = InMemoryDirectory::new();
        directory.upsert_member("dave", &["vip"], 10.0);
        assert!(directory.set_balance(&"dave".into(), 20.0));
        assert!(!directory.set_balance(&"erin".into(), 1.0));
        assert_eq!(directory.balance_of(&"dave".into()).await.unwrap(), 20.0);

        assert!(directory.remove_member(&"dave".into()));
        assert!(directory.is_empty());
        assert_eq!(directory.list_groups().await.unwrap(), vec!["vip"]);
    }
}
