use anyhow::Error;
use once_cell::sync::Lazy;
use rocket::serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewOwnProfile,
    EditOwnProfile,

    ViewCustomerDashboard,
    ManageOwnSubscription,
    TrackOwnProgress,
    ManageOwnGoals,
    DownloadResources,
    RateTrainers,

    ViewTrainerDashboard,
    ViewAssignedClients,
    ScheduleSessions,
    MessageClients,

    ViewAdminDashboard,
    ManageAssignments,
    VerifyTrainers,
    ShareResources,
    ManageCatalog,
    FacilitateMessages,
    ManageNotifications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Trainer,
    Admin,
}

static BASE_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewOwnProfile);
    permissions.insert(Permission::EditOwnProfile);

    permissions
});

static CUSTOMER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(BASE_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ViewCustomerDashboard);
    permissions.insert(Permission::ManageOwnSubscription);
    permissions.insert(Permission::TrackOwnProgress);
    permissions.insert(Permission::ManageOwnGoals);
    permissions.insert(Permission::DownloadResources);
    permissions.insert(Permission::RateTrainers);

    permissions
});

static TRAINER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(BASE_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ViewTrainerDashboard);
    permissions.insert(Permission::ViewAssignedClients);
    permissions.insert(Permission::ScheduleSessions);
    permissions.insert(Permission::MessageClients);

    permissions
});

// Admins are staff, not members: they get no customer or trainer dashboards.
static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(BASE_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ViewAdminDashboard);
    permissions.insert(Permission::ManageAssignments);
    permissions.insert(Permission::VerifyTrainers);
    permissions.insert(Permission::ShareResources);
    permissions.insert(Permission::ManageCatalog);
    permissions.insert(Permission::FacilitateMessages);
    permissions.insert(Permission::ManageNotifications);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::Customer => &CUSTOMER_PERMISSIONS,
            Role::Trainer => &TRAINER_PERMISSIONS,
            Role::Admin => &ADMIN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Customer => "customer",
            Role::Trainer => "trainer",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "customer" => Ok(Role::Customer),
            "trainer" => Ok(Role::Trainer),
            "admin" => Ok(Role::Admin),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_do_not_share_dashboards() {
        assert!(Role::Customer.has_permission(Permission::ViewCustomerDashboard));
        assert!(!Role::Customer.has_permission(Permission::ViewTrainerDashboard));
        assert!(!Role::Customer.has_permission(Permission::ViewAdminDashboard));

        assert!(Role::Trainer.has_permission(Permission::ScheduleSessions));
        assert!(!Role::Trainer.has_permission(Permission::ManageOwnGoals));
        assert!(!Role::Trainer.has_permission(Permission::VerifyTrainers));

        assert!(Role::Admin.has_permission(Permission::ManageAssignments));
        assert!(!Role::Admin.has_permission(Permission::ViewCustomerDashboard));
    }

    #[test]
    fn test_everyone_can_edit_own_profile() {
        for role in [Role::Customer, Role::Trainer, Role::Admin] {
            assert!(role.has_permission(Permission::EditOwnProfile));
        }
    }

    #[test]
    fn test_role_string_round_trip() {
        assert_eq!(Role::from_str("trainer").unwrap(), Role::Trainer);
        assert_eq!(Role::Customer.to_string(), "customer");
        assert!(Role::from_str("coach").is_err());
    }
}
