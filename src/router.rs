//! Role-based view routing.
//!
//! Maps an authenticated session's role plus the requested tab id to the
//! concrete screen. The mapping is total: unknown, stale, or empty
//! requests fall back to the dashboard, and Admin sessions always land on
//! the admin panel regardless of the requested tab. Pure and stateless,
//! re-evaluated on every role or navigation change.

use serde::{Deserialize, Serialize};

use crate::session::UserRole;

/// Concrete screens an authenticated session can land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Dashboard,
    AiConsultant,
    Services,
    Marketplace,
    AdminPanel,
}

impl View {
    /// Stable id used in navigation requests.
    pub fn id(self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::AiConsultant => "ai-consultant",
            View::Services => "services",
            View::Marketplace => "marketplace",
            View::AdminPanel => "admin-panel",
        }
    }

    /// Human-readable label for the UI.
    pub fn label(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::AiConsultant => "AI Consultant",
            View::Services => "Service Catalog",
            View::Marketplace => "Marketplace",
            View::AdminPanel => "Admin Panel",
        }
    }

    /// Parse a navigation id.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "dashboard" => Some(View::Dashboard),
            "ai-consultant" => Some(View::AiConsultant),
            "services" => Some(View::Services),
            "marketplace" => Some(View::Marketplace),
            "admin-panel" => Some(View::AdminPanel),
            _ => None,
        }
    }
}

/// Tab allow-list per role, in display order. Admin gets none: no tab
/// navigation applies to the admin panel.
pub fn allowed_views(role: UserRole) -> &'static [View] {
    match role {
        UserRole::Client => &[View::Dashboard, View::AiConsultant, View::Services],
        UserRole::Professional => &[View::Dashboard, View::Marketplace, View::AiConsultant],
        UserRole::Admin => &[],
    }
}

/// Resolve the concrete view for a role and a requested tab id.
pub fn resolve(role: UserRole, requested: &str) -> View {
    if role == UserRole::Admin {
        return View::AdminPanel;
    }
    match View::from_id(requested.trim()) {
        Some(view) if allowed_views(role).contains(&view) => view,
        _ => View::Dashboard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_always_lands_on_the_admin_panel() {
        assert_eq!(resolve(UserRole::Admin, "dashboard"), View::AdminPanel);
        assert_eq!(resolve(UserRole::Admin, "marketplace"), View::AdminPanel);
        assert_eq!(resolve(UserRole::Admin, "nonsense"), View::AdminPanel);
        assert_eq!(resolve(UserRole::Admin, ""), View::AdminPanel);
    }

    #[test]
    fn client_allow_list_resolves() {
        assert_eq!(resolve(UserRole::Client, "dashboard"), View::Dashboard);
        assert_eq!(
            resolve(UserRole::Client, "ai-consultant"),
            View::AiConsultant
        );
        assert_eq!(resolve(UserRole::Client, "services"), View::Services);
    }

    #[test]
    fn professional_allow_list_resolves() {
        assert_eq!(resolve(UserRole::Professional, "dashboard"), View::Dashboard);
        assert_eq!(
            resolve(UserRole::Professional, "marketplace"),
            View::Marketplace
        );
        assert_eq!(
            resolve(UserRole::Professional, "ai-consultant"),
            View::AiConsultant
        );
    }

    #[test]
    fn off_role_tabs_fall_back_to_dashboard() {
        // A stale tab from before a role change
        assert_eq!(resolve(UserRole::Client, "marketplace"), View::Dashboard);
        assert_eq!(resolve(UserRole::Professional, "services"), View::Dashboard);
        assert_eq!(resolve(UserRole::Client, "admin-panel"), View::Dashboard);
    }

    #[test]
    fn resolve_is_total_over_arbitrary_input() {
        for role in UserRole::ALL {
            for requested in ["", "   ", "DASHBOARD", "settings", "🚀", "dash board"] {
                let view = resolve(*role, requested);
                if *role == UserRole::Admin {
                    assert_eq!(view, View::AdminPanel);
                } else {
                    assert_eq!(view, View::Dashboard);
                }
            }
        }
    }

    #[test]
    fn requested_ids_tolerate_whitespace() {
        assert_eq!(resolve(UserRole::Client, " services "), View::Services);
    }

    #[test]
    fn view_ids_round_trip() {
        for view in [
            View::Dashboard,
            View::AiConsultant,
            View::Services,
            View::Marketplace,
            View::AdminPanel,
        ] {
            assert_eq!(View::from_id(view.id()), Some(view));
        }
        assert_eq!(View::from_id("unknown"), None);
    }

    #[test]
    fn allowed_views_start_at_the_dashboard() {
        assert_eq!(allowed_views(UserRole::Client)[0], View::Dashboard);
        assert_eq!(allowed_views(UserRole::Professional)[0], View::Dashboard);
        assert!(allowed_views(UserRole::Admin).is_empty());
    }
}
