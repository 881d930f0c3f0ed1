//! Client-side role gating. Advisory only: the backend enforces the real rules.

use crate::api::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewPrivateProjects,
    ManageProjects,
    ManageTeams,
    ViewReports,
    SuperviseProjects,
    ReceiveTasks,
    UpdateTaskStatus,
}

impl Role {
    pub fn allows(&self, permission: Permission) -> bool {
        use Permission::*;

        match self {
            Role::Coordinator => matches!(
                permission,
                ViewPrivateProjects | ManageProjects | ManageTeams | ViewReports | UpdateTaskStatus
            ),
            Role::Professor => matches!(
                permission,
                ViewPrivateProjects | SuperviseProjects | UpdateTaskStatus
            ),
            Role::Student => matches!(
                permission,
                ViewPrivateProjects | ReceiveTasks | UpdateTaskStatus
            ),
            Role::Visitor => false,
        }
    }

    /// Visitors only ever see the public project listing.
    pub fn is_public_only(&self) -> bool {
        !self.allows(Permission::ViewPrivateProjects)
    }
}
