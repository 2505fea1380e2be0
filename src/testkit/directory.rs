//! Scripted [`Directory`] for exercising the caches.
//!
//! Counts every call, can fail on demand and can hold group computations
//! open behind a gate so tests can observe in-flight fetches.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::domain::MemberId;
use crate::error::DirectoryError;
use crate::port::Directory;

#[derive(Debug, Clone)]
struct Member {
    id: MemberId,
    groups: Vec<String>,
    balance: f64,
}

#[derive(Debug, Default)]
struct Script {
    groups: Vec<String>,
    members: Vec<Member>,
    unavailable: bool,
    failing_balances: HashSet<MemberId>,
    failing_primary: bool,
    stalled_listing: bool,
}

/// Directory with call counters and injectable failures.
pub struct ScriptedDirectory {
    script: Mutex<Script>,
    gate: watch::Sender<bool>,
    list_groups_calls: AtomicUsize,
    members_of_calls: AtomicUsize,
    balance_calls: AtomicUsize,
    primary_group_calls: AtomicUsize,
}

impl ScriptedDirectory {
    /// Create an empty, available directory with an open gate.
    #[must_use]
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            script: Mutex::new(Script::default()),
            gate,
            list_groups_calls: AtomicUsize::new(0),
            members_of_calls: AtomicUsize::new(0),
            balance_calls: AtomicUsize::new(0),
            primary_group_calls: AtomicUsize::new(0),
        }
    }

    /// Add a member. The first group is its primary group.
    #[must_use]
    pub fn with_member(self, id: &str, groups: &[&str], balance: f64) -> Self {
        self.add_member(id, groups, balance);
        self
    }

    /// Add a group that has no members.
    #[must_use]
    pub fn with_group(self, group: &str) -> Self {
        self.script.lock().groups.push(group.to_string());
        self
    }

    /// Add a member after construction.
    pub fn add_member(&self, id: &str, groups: &[&str], balance: f64) {
        let mut script = self.script.lock();
        for group in groups {
            if !script.groups.iter().any(|g| g == group) {
                script.groups.push((*group).to_string());
            }
        }
        script.members.push(Member {
            id: MemberId::new(id),
            groups: groups.iter().map(|g| (*g).to_string()).collect(),
            balance,
        });
    }

    /// Change a member's balance.
    pub fn set_balance(&self, id: &str, balance: f64) {
        let mut script = self.script.lock();
        if let Some(member) = script.members.iter_mut().find(|m| m.id.as_str() == id) {
            member.balance = balance;
        }
    }

    /// Make every enumeration call fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.script.lock().unavailable = unavailable;
    }

    /// Make balance lookups for `id` fail.
    pub fn fail_balance_of(&self, id: &str) {
        self.script.lock().failing_balances.insert(MemberId::new(id));
    }

    /// Make primary group lookups fail.
    pub fn fail_primary_group(&self, failing: bool) {
        self.script.lock().failing_primary = failing;
    }

    /// Make `list_groups` never return.
    pub fn stall_list_groups(&self, stalled: bool) {
        self.script.lock().stalled_listing = stalled;
    }

    /// Hold group computations until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    /// Let held and future group computations proceed.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Number of `list_groups` calls.
    #[must_use]
    pub fn list_groups_calls(&self) -> usize {
        self.list_groups_calls.load(Ordering::SeqCst)
    }

    /// Number of group computations started (`members_of` calls).
    #[must_use]
    pub fn members_of_calls(&self) -> usize {
        self.members_of_calls.load(Ordering::SeqCst)
    }

    /// Number of balance lookups.
    #[must_use]
    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    /// Number of primary group lookups.
    #[must_use]
    pub fn primary_group_calls(&self) -> usize {
        self.primary_group_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), DirectoryError> {
        if self.script.lock().unavailable {
            return Err(DirectoryError::Unavailable("scripted outage".into()));
        }
        Ok(())
    }
}

impl Default for ScriptedDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Directory for ScriptedDirectory {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn list_groups(&self) -> Result<Vec<String>, DirectoryError> {
        self.list_groups_calls.fetch_add(1, Ordering::SeqCst);
        let stalled = self.script.lock().stalled_listing;
        if stalled {
            std::future::pending::<()>().await;
        }
        self.check_available()?;
        Ok(self.script.lock().groups.clone())
    }

    async fn list_members(&self) -> Result<Vec<MemberId>, DirectoryError> {
        self.check_available()?;
        Ok(self.script.lock().members.iter().map(|m| m.id.clone()).collect())
    }

    async fn is_member(&self, member: &MemberId, group: &str) -> Result<bool, DirectoryError> {
        Ok(self
            .script
            .lock()
            .members
            .iter()
            .any(|m| &m.id == member && m.groups.iter().any(|g| g == group)))
    }

    async fn primary_group(&self, member: &MemberId) -> Result<Option<String>, DirectoryError> {
        self.primary_group_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock();
        if script.failing_primary {
            return Err(DirectoryError::Lookup {
                member: member.to_string(),
                reason: "scripted primary group failure".into(),
            });
        }
        Ok(script
            .members
            .iter()
            .find(|m| &m.id == member)
            .and_then(|m| m.groups.first().cloned()))
    }

    async fn balance_of(&self, member: &MemberId) -> Result<f64, DirectoryError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock();
        if script.failing_balances.contains(member) {
            return Err(DirectoryError::Lookup {
                member: member.to_string(),
                reason: "scripted balance failure".into(),
            });
        }
        script
            .members
            .iter()
            .find(|m| &m.id == member)
            .map(|m| m.balance)
            .ok_or_else(|| DirectoryError::Lookup {
                member: member.to_string(),
                reason: "unknown member".into(),
            })
    }

    async fn members_of(&self, group: &str) -> Result<Vec<MemberId>, DirectoryError> {
        self.members_of_calls.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.gate.subscribe();
        // Sender lives as long as self, so this only returns once opened.
        let _ = gate.wait_for(|open| *open).await;

        self.check_available()?;
        Ok(self
            .script
            .lock()
            .members
            .iter()
            .filter(|m| m.groups.iter().any(|g| g == group))
            .map(|m| m.id.clone())
            .collect())
    }
}
