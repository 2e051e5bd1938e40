// Permission grants taken from settings
use crate::application::location_provider::{PermissionChecker, PermissionKind};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct GrantedPermissions {
    granted: HashSet<PermissionKind>,
}

impl GrantedPermissions {
    pub fn new(granted: impl IntoIterator<Item = PermissionKind>) -> Self {
        Self {
            granted: granted.into_iter().collect(),
        }
    }
}

impl PermissionChecker for GrantedPermissions {
    fn has_permission(&self, kind: PermissionKind) -> bool {
        self.granted.contains(&kind)
    }
}
