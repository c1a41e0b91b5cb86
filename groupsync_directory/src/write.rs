use anyhow::{Context, Result};
use async_trait::async_trait;
use groupsync_core::{DirectoryWriter, MembershipAction};
use reqwest::Method;
use serde_json::{json, Value};

use crate::rest::DirectoryClient;

#[async_trait]
impl DirectoryWriter for DirectoryClient {
    async fn create_role(&self, role: &str, policy: &Value) -> Result<()> {
        let req = self.build_request(
            self.endpoint(&["v1", "role"])?,
            Some(json!({"role_id": role, "policy": policy})),
            Method::POST,
        );
        self.execute(req)
            .await
            .with_context(|| format!("creating role {role}"))?;
        Ok(())
    }

    async fn update_role_policy(&self, role: &str, policy: &Value) -> Result<()> {
        let req = self.build_request(
            self.endpoint(&["v1", "role", role, "policy"])?,
            Some(json!({ "policy": policy })),
            Method::PUT,
        );
        self.execute(req)
            .await
            .with_context(|| format!("updating policy of role {role}"))?;
        Ok(())
    }

    async fn create_user(&self, user: &str) -> Result<()> {
        let req = self.build_request(
            self.endpoint(&["v1", "user"])?,
            Some(json!({ "user_id": user })),
            Method::POST,
        );
        self.execute(req)
            .await
            .with_context(|| format!("creating user {user}"))?;
        Ok(())
    }

    async fn create_group(&self, group: &str) -> Result<()> {
        let req = self.build_request(
            self.endpoint(&["v1", "group"])?,
            Some(json!({ "group_id": group })),
            Method::POST,
        );
        self.execute(req)
            .await
            .with_context(|| format!("creating group {group}"))?;
        Ok(())
    }

    async fn modify_group_roles(
        &self,
        group: &str,
        action: MembershipAction,
        roles: &[String],
    ) -> Result<()> {
        self.modify_group(group, "roles", action, roles).await
    }

    async fn modify_group_users(
        &self,
        group: &str,
        action: MembershipAction,
        users: &[String],
    ) -> Result<()> {
        self.modify_group(group, "users", action, users).await
    }
}

impl DirectoryClient {
    /// `PUT /v1/group/{group}/{member}?action=...` with `{member: batch}`
    async fn modify_group(
        &self,
        group: &str,
        member: &str,
        action: MembershipAction,
        batch: &[String],
    ) -> Result<()> {
        let mut url = self.endpoint(&["v1", "group", group, member])?;
        url.query_pairs_mut().append_pair("action", action.as_str());

        let mut body = serde_json::Map::new();
        body.insert(member.to_owned(), json!(batch));
        let req = self.build_request(url, Some(Value::Object(body)), Method::PUT);
        self.execute(req)
            .await
            .with_context(|| format!("trying to {action} {member} for group {group}"))?;
        Ok(())
    }
}
