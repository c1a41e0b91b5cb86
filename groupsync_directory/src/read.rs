use std::collections::BTreeSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use groupsync_core::{DirectoryReader, Lookup};
use reqwest::Method;
use serde_json::Value;

use crate::rest::{get_json_from_path, json_body, DirectoryClient};

#[async_trait]
impl DirectoryReader for DirectoryClient {
    async fn list_roles(&self) -> Result<BTreeSet<String>> {
        self.paginate_all(self.endpoint(&["v1", "roles"])?, "roles")
            .await
            .context("listing roles")
    }

    async fn get_role_policy(&self, role: &str) -> Result<Option<Value>> {
        let url = self.endpoint(&["v1", "role", role])?;
        let resp = self
            .execute(self.build_request(url.to_owned(), None, Method::GET))
            .await
            .with_context(|| format!("fetching role {role}"))?;
        let body = json_body(resp).await?;
        let policies = get_json_from_path(&body, &["policies"], &url)?;
        Ok(policies
            .get("IAMPolicy")
            .filter(|p| !p.is_null())
            .cloned())
    }

    async fn list_groups(&self) -> Result<BTreeSet<String>> {
        self.paginate_all(self.endpoint(&["v1", "groups"])?, "groups")
            .await
            .context("listing groups")
    }

    async fn list_group_roles(&self, group: &str) -> Result<Lookup<BTreeSet<String>>> {
        self.paginate(self.endpoint(&["v1", "group", group, "roles"])?, "roles")
            .await
            .with_context(|| format!("listing roles of group {group}"))
    }

    async fn list_group_users(&self, group: &str) -> Result<Lookup<BTreeSet<String>>> {
        self.paginate(self.endpoint(&["v1", "group", group, "users"])?, "users")
            .await
            .with_context(|| format!("listing users of group {group}"))
    }

    async fn list_user_groups(&self, user: &str) -> Result<Lookup<BTreeSet<String>>> {
        self.paginate(self.endpoint(&["v1", "user", user, "groups"])?, "groups")
            .await
            .with_context(|| format!("listing groups of user {user}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use groupsync_core::credentials::DirectoryCredentials;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::DirectoryError;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn setup() -> Result<(MockServer, DirectoryClient)> {
        let server = MockServer::start().await;
        let client = DirectoryClient::new(
            &server.uri(),
            DirectoryCredentials {
                token: "t0ken".to_owned(),
            },
        )?;
        Ok((server, client))
    }

    #[tokio::test]
    async fn role_policy_is_read_from_policies() -> Result<()> {
        let (server, client) = setup().await?;
        let policy = json!({"Version": "2012-10-17", "Statement": []});
        Mock::given(method("GET"))
            .and(path("/v1/role/admin"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"role_id": "admin", "policies": {"IAMPolicy": policy}})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/role/bare"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"policies": {}})))
            .mount(&server)
            .await;

        assert_eq!(client.get_role_policy("admin").await?, Some(policy));
        assert_eq!(client.get_role_policy("bare").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn memberships_come_back_as_sets() -> Result<()> {
        let (server, client) = setup().await?;
        Mock::given(method("GET"))
            .and(path("/v1/group/biologists/users"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Link", "</v1/group/biologists/users/2>; rel=\"next\"")
                    .set_body_json(json!({"users": ["b@x.org", "a@x.org"]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/group/biologists/users/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"users": ["a@x.org"]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/user/new@x.org/groups"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        assert_eq!(
            client.list_group_users("biologists").await?,
            Lookup::Found(set(&["a@x.org", "b@x.org"]))
        );
        assert_eq!(client.list_user_groups("new@x.org").await?, Lookup::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_abort() -> Result<()> {
        let (server, client) = setup().await?;
        Mock::given(method("GET"))
            .and(path("/v1/group/biologists/roles"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/groups"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client.list_group_roles("biologists").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DirectoryError>(),
            Some(DirectoryError::Transport { status, .. }) if status.as_u16() == 500
        ));
        // the top-level listings always exist
        assert!(client.list_groups().await.is_err());
        Ok(())
    }
}
