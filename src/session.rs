use serde::{Deserialize, Serialize};
use serde_json::json;

/// Signed-in operator, injected once via `session.signIn` and read by
/// handlers at call time. Replaces the original dashboard's ad-hoc
/// read-current-user-from-storage at every call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub name: String,
    pub role: String,
}

impl Session {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "userId": self.user_id,
            "name": self.name,
            "role": self.role,
        })
    }
}
