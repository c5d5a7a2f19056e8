use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: String,
    pub roles: Vec<String>,
    pub scopes: Vec<String>,
    pub is_admin: bool,
}

impl From<&CurrentUser> for MeResponse {
    fn from(user: &CurrentUser) -> Self {
        Self {
            user_id: user.id.clone(),
            roles: user.claims.role.clone(),
            scopes: user.claims.scope.clone(),
            is_admin: user.claims.is_admin(),
        }
    }
}
