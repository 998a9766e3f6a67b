use async_trait::async_trait;
use tracing::{info, warn};

use crate::models::{Rank, Result};

/// Platform role operations, scoped to one user per call. Each call is an
/// independent async operation that may fail on its own (permissions, rate
/// limits, unknown user) without affecting other users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleApi: Send + Sync {
    async fn current_roles(&self, user_id: &str) -> Result<Vec<String>>;
    async fn add_role(&self, user_id: &str, role: &str) -> Result<()>;
    async fn remove_role(&self, user_id: &str, role: &str) -> Result<()>;
}

/// Bot presence text, consumed only by the status side-task.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceApi: Send + Sync {
    async fn set_presence(&self, text: &str) -> Result<()>;
}

/// Desired end state for one user after a pass.
#[derive(Debug, Clone)]
pub struct RoleAssignment {
    pub user_id: String,
    pub rank: Rank,
}

/// Minimal role mutations for one user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RolePlan {
    pub add: Option<String>,
    pub remove: Vec<String>,
}

impl RolePlan {
    pub fn is_noop(&self) -> bool {
        self.add.is_none() && self.remove.is_empty()
    }
}

/// Computes the minimal add/remove set so the user ends up holding exactly
/// the desired rank-role (none when unranked). Roles outside `rank_roles`
/// are never touched.
pub fn plan_role_update(
    desired: Option<&str>,
    current: &[String],
    rank_roles: &[String],
) -> RolePlan {
    let remove = current
        .iter()
        .filter(|role| rank_roles.iter().any(|r| r == *role))
        .filter(|role| desired != Some(role.as_str()))
        .cloned()
        .collect();

    let add = desired
        .filter(|role| !current.iter().any(|r| r.as_str() == *role))
        .map(str::to_string);

    RolePlan { add, remove }
}

/// Outcome counts for one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Applies computed ranks to platform role state, user by user. A failure
/// for one user is logged and the rest of the pass continues.
pub struct RoleSynchronizer<'a> {
    api: &'a dyn RoleApi,
    rank_roles: Vec<String>,
}

impl<'a> RoleSynchronizer<'a> {
    pub fn new(api: &'a dyn RoleApi, rank_roles: Vec<String>) -> Self {
        Self { api, rank_roles }
    }

    pub async fn sync_all(&self, assignments: &[RoleAssignment]) -> SyncReport {
        let mut report = SyncReport::default();

        for assignment in assignments {
            match self.sync_user(assignment).await {
                Ok(true) => report.updated += 1,
                Ok(false) => report.unchanged += 1,
                Err(e) => {
                    warn!(
                        "Role update failed for {}: {}, continuing with remaining users",
                        assignment.user_id, e
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn sync_user(&self, assignment: &RoleAssignment) -> Result<bool> {
        let user_id = &assignment.user_id;
        let current = self.api.current_roles(user_id).await?;

        let desired = assignment.rank.role_name();
        let plan = plan_role_update(desired.as_deref(), &current, &self.rank_roles);
        if plan.is_noop() {
            return Ok(false);
        }

        for role in &plan.remove {
            self.api.remove_role(user_id, role).await?;
        }
        if let Some(role) = &plan.add {
            self.api.add_role(user_id, role).await?;
        }

        info!(
            "Updated roles for {}: now {}",
            user_id,
            desired.as_deref().unwrap_or("no rank-role")
        );
        Ok(true)
    }
}

/// Log-only role backend so the binary can run a full pass without a live
/// platform session.
pub struct DryRunRoleApi;

#[async_trait]
impl RoleApi for DryRunRoleApi {
    async fn current_roles(&self, _user_id: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn add_role(&self, user_id: &str, role: &str) -> Result<()> {
        info!("[dry-run] would add role {} to {}", role, user_id);
        Ok(())
    }

    async fn remove_role(&self, user_id: &str, role: &str) -> Result<()> {
        info!("[dry-run] would remove role {} from {}", role, user_id);
        Ok(())
    }
}

/// Log-only presence backend for the same purpose.
pub struct DryRunPresence;

#[async_trait]
impl PresenceApi for DryRunPresence {
    async fn set_presence(&self, text: &str) -> Result<()> {
        info!("[dry-run] would set presence to {:?}", text);
        Ok(())
    }
}
