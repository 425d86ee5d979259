use crate::domains::users::User;

/// Who is making the current request.
///
/// Inserted into request extensions by the authentication middleware and read
/// back through extractors, so every handler states whether it accepts
/// anonymous callers.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    User(User),
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn into_user(self) -> Option<User> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Anonymous => None,
        }
    }
}
