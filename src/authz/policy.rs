use std::collections::HashMap;

use super::{Action, ResourceKind, Role};

/// Declarative `(kind, action) -> roles` map, built once at process start and
/// never mutated afterwards. A missing entry means nobody short of staff may
/// perform the action.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    entries: HashMap<(ResourceKind, Action), Vec<Role>>,
}

impl PolicyTable {
    /// The portal's access rules: organization management is coordinator
    /// territory, dataset-family content is shared with managers, requests
    /// and projects are open to create and author-editable, users edit
    /// themselves.
    pub fn portal_defaults() -> Self {
        use Action::*;
        use ResourceKind::*;
        use Role::*;

        let mut entries: HashMap<(ResourceKind, Action), Vec<Role>> = HashMap::new();
        let mut add = |kind: ResourceKind, actions: &[Action], roles: &[Role]| {
            for action in actions {
                entries.insert((kind, *action), roles.to_vec());
            }
        };

        add(Organization, &[Update], &[Coordinator]);
        add(Organization, &[HistoryView], &[Coordinator, Manager]);

        add(Representative, &[Create, Update, Delete, View], &[Coordinator]);

        add(Dataset, &[Create, Update, Delete], &[Coordinator, Manager]);
        add(Dataset, &[Plan, HistoryView], &[Coordinator, Manager]);

        add(Distribution, &[Create, Update, Delete], &[Coordinator, Manager]);
        add(Structure, &[Create, Update, Delete], &[Coordinator, Manager]);

        add(Request, &[Create], &[All]);
        add(Request, &[Update, Delete], &[Author, Coordinator, Manager]);
        add(Request, &[Plan], &[Coordinator, Manager]);
        add(Request, &[HistoryView], &[Author, Coordinator, Manager]);

        add(Project, &[Create], &[All]);
        add(Project, &[Update, Delete, HistoryView], &[Author]);

        add(User, &[Update, View], &[Author]);

        Self { entries }
    }

    pub fn roles(&self, kind: ResourceKind, action: Action) -> Option<&[Role]> {
        self.entries.get(&(kind, action)).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_means_no_roles() {
        let table = PolicyTable::portal_defaults();
        assert!(table.roles(ResourceKind::Organization, Action::Create).is_none());
        assert!(table.roles(ResourceKind::Organization, Action::Delete).is_none());
    }

    #[test]
    fn organization_update_is_coordinator_only() {
        let table = PolicyTable::portal_defaults();
        assert_eq!(
            table.roles(ResourceKind::Organization, Action::Update),
            Some(&[Role::Coordinator][..])
        );
    }

    #[test]
    fn request_create_is_open_to_authenticated_users() {
        let table = PolicyTable::portal_defaults();
        assert_eq!(
            table.roles(ResourceKind::Request, Action::Create),
            Some(&[Role::All][..])
        );
    }

    #[test]
    fn dataset_content_is_shared_with_managers() {
        let table = PolicyTable::portal_defaults();
        let roles = table.roles(ResourceKind::Dataset, Action::Update).unwrap();
        assert!(roles.contains(&Role::Coordinator));
        assert!(roles.contains(&Role::Manager));
    }
}
