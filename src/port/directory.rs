//! Directory port for group membership and balances.
//!
//! This module defines the trait the caches use to query the external
//! membership/ledger service.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::MemberId;
use crate::error::DirectoryError;

/// Source of group membership and member balances.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - Methods are async and may be slow; they are only ever awaited on
///   background tasks, never on a caller that must answer synchronously
/// - Futures must not block the thread when polled
/// - Any call may fail; callers decide whether a failure is fatal
#[async_trait]
pub trait Directory: Send + Sync {
    /// Directory name for logging.
    fn name(&self) -> &str;

    /// Every group name the directory knows.
    async fn list_groups(&self) -> Result<Vec<String>, DirectoryError>;

    /// Every member identity the directory knows.
    async fn list_members(&self) -> Result<Vec<MemberId>, DirectoryError>;

    /// Whether `member` belongs to `group`.
    async fn is_member(&self, member: &MemberId, group: &str) -> Result<bool, DirectoryError>;

    /// The member's primary group, if any.
    async fn primary_group(&self, member: &MemberId) -> Result<Option<String>, DirectoryError>;

    /// The member's balance.
    async fn balance_of(&self, member: &MemberId) -> Result<f64, DirectoryError>;

    /// All members of `group`.
    ///
    /// The default enumerates every member and filters with
    /// [`is_member`](Self::is_member). A failed membership check for one
    /// member is logged and treated as "not a member"; only a failure to
    /// enumerate members is returned. Implementations that can query a
    /// group directly should override this.
    async fn members_of(&self, group: &str) -> Result<Vec<MemberId>, DirectoryError> {
        let members = self.list_members().await?;
        let mut matching = Vec::new();

        for member in members {
            match self.is_member(&member, group).await {
                Ok(true) => matching.push(member),
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        directory = self.name(),
                        member = %member,
                        group = group,
                        error = %e,
                        "Membership check failed, treating as non-member"
                    );
                }
            }
        }

        Ok(matching)
    }
}
