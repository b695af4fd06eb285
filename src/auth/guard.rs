use super::session::AuthSessionState;

/// Login page every guard rejection points at.
pub const LOGIN_PATH: &str = "/login";

/// What a guarded surface should show right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardView {
    /// Session unresolved, or a redirect is underway. Show a neutral
    /// placeholder, never the protected content.
    Loading,
    /// A fresh check confirmed the session; protected content may render.
    Content,
}

/// One guard decision: what to render, and whether to start a navigation
/// to the login page right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardDirective {
    pub view: GuardView,
    pub navigate: bool,
}

/// A navigation command toward the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub location: String,
}

impl LoginRedirect {
    pub fn new() -> Self {
        LoginRedirect {
            location: LOGIN_PATH.to_string(),
        }
    }
}

impl Default for LoginRedirect {
    fn default() -> Self {
        Self::new()
    }
}

/// Decides what a protected surface may show for each observed session
/// state. Navigating to the login page is an explicit transition action:
/// it fires once when the state lands on `Unauthenticated` and is re-armed
/// only by the next check cycle, so observing the same signed-out state
/// again cannot stack up repeated redirects.
#[derive(Debug, Default)]
pub struct RouteGuard {
    navigation_issued: bool,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, state: &AuthSessionState) -> GuardDirective {
        match state {
            AuthSessionState::Unknown => {
                self.navigation_issued = false;
                GuardDirective {
                    view: GuardView::Loading,
                    navigate: false,
                }
            }
            AuthSessionState::Authenticated(_) => {
                self.navigation_issued = false;
                GuardDirective {
                    view: GuardView::Content,
                    navigate: false,
                }
            }
            AuthSessionState::Unauthenticated => {
                let navigate = !self.navigation_issued;
                self.navigation_issued = true;
                GuardDirective {
                    view: GuardView::Loading,
                    navigate,
                }
            }
        }
    }
}
