use crate::models::User;

/// Request-scoped identity: either anonymous or a logged-in user with the
/// session token that authenticated them.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub user: Option<User>,
    pub session_token: Option<String>,
    pub request_id: String,
}

impl ViewerContext {
    pub fn anonymous(request_id: String) -> Self {
        ViewerContext {
            user: None,
            session_token: None,
            request_id,
        }
    }

    pub fn authenticated_user(user: User, session_token: String, request_id: String) -> Self {
        ViewerContext {
            user: Some(user),
            session_token: Some(session_token),
            request_id,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    /// Identity used to separate cached pages between viewers.
    pub fn cache_identity(&self) -> String {
        match &self.user {
            Some(user) => format!("user-{}", user.id),
            None => "anonymous".to_string(),
        }
    }
}
