use std::sync::Arc;
use std::time::Duration;

use bazaar::cache::{CacheConfig, CacheKey, Resource};
use bazaar::infra::error::InfraError;
use bazaar::infra::token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
use bazaar::{ClientError, Marketplace};
use bazaar_api_types::{LoginForm, RegisterForm, Role};
use httpmock::MockServer;
use serde_json::{Value, json};
use url::Url;

fn marketplace(server: &MockServer, store: Arc<dyn TokenStore>) -> Marketplace {
    let base = Url::parse(&server.url("/api")).expect("base url");
    Marketplace::new(&base, CacheConfig::default(), store).expect("marketplace")
}

fn user(id: &str, role: &str) -> Value {
    json!({ "id": id, "email": format!("{id}@bazaar.test"), "name": "Ana", "role": role })
}

fn login_form() -> LoginForm {
    LoginForm {
        email: "u1@bazaar.test".into(),
        password: "hunter22".into(),
        remember: None,
    }
}

#[tokio::test]
async fn login_persists_token_and_sets_identity() -> Result<(), ClientError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileTokenStore::new(dir.path()));
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method("POST")
            .path("/api/auth/login")
            .json_body(json!({ "email": "u1@bazaar.test", "password": "hunter22" }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "success": true,
                "data": { "token": "tok-u1", "user": user("u1", "seller") }
            }));
    });
    let stats_mock = server.mock(|when, then| {
        when.method("GET")
            .path("/api/seller/dashboard/stats")
            .header("authorization", "Bearer tok-u1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "success": true,
                "data": {
                    "totalRevenue": 10.0, "totalOrders": 1, "totalProducts": 2,
                    "totalCustomers": 1, "revenueGrowth": 0.0, "orderGrowth": 0.0,
                    "productGrowth": 0.0, "customerGrowth": 0.0
                }
            }));
    });

    let market = marketplace(&server, store.clone());
    let identity = market.login(&login_form()).await?;

    login.assert();
    assert_eq!(identity.user_id, "u1");
    assert_eq!(identity.role, Role::Seller);
    assert!(market.session().has_role(Role::Seller));
    assert_eq!(store.load()?.as_deref(), Some("tok-u1"));

    // Later requests pick up the new bearer token.
    let stats = market.seller_dashboard_stats().await?;
    stats_mock.assert();
    assert_eq!(stats.total_products, 2);
    Ok(())
}

#[tokio::test]
async fn rejected_login_leaves_session_empty() -> Result<(), ClientError> {
    let store = Arc::new(MemoryTokenStore::new());
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/auth/login");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "success": false, "message": "Invalid credentials" }));
    });

    let market = marketplace(&server, store.clone());
    let err = market
        .login(&login_form())
        .await
        .expect_err("rejected login");

    assert!(matches!(err, ClientError::Rejected { ref message, .. } if message == "Invalid credentials"));
    assert!(market.identity().is_none());
    assert_eq!(store.load()?, None);
    Ok(())
}

#[tokio::test]
async fn unauthorized_login_leaves_session_empty() -> Result<(), ClientError> {
    let store = Arc::new(MemoryTokenStore::new());
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/auth/login");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({ "success": false, "message": "Invalid credentials" }));
    });

    let market = marketplace(&server, store.clone());
    let err = market.login(&login_form()).await.expect_err("401");

    assert!(matches!(err, ClientError::Api { status: 401, .. }));
    assert!(!market.session().is_authenticated());
    assert_eq!(store.load()?, None);
    Ok(())
}

#[tokio::test]
async fn register_signs_the_new_user_in() -> Result<(), ClientError> {
    let store = Arc::new(MemoryTokenStore::new());
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/auth/register");
        then.status(201)
            .header("content-type", "application/json")
            .json_body(json!({
                "success": true,
                "data": { "token": "tok-new", "user": user("u2", "buyer") }
            }));
    });

    let market = marketplace(&server, store.clone());
    let identity = market
        .register(&RegisterForm {
            name: "Ana".into(),
            email: "u2@bazaar.test".into(),
            password: "hunter22".into(),
            confirm_password: "hunter22".into(),
            role: Role::Buyer,
            accept_terms: true,
        })
        .await?;

    assert_eq!(identity.role, Role::Buyer);
    assert_eq!(store.load()?.as_deref(), Some("tok-new"));
    Ok(())
}

#[tokio::test]
async fn logout_clears_local_state_even_when_server_fails() -> Result<(), ClientError> {
    let store = Arc::new(MemoryTokenStore::with_token("tok-u1"));
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET")
            .path("/api/auth/me")
            .header("authorization", "Bearer tok-u1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "success": true, "data": user("u1", "buyer") }));
    });
    server.mock(|when, then| {
        when.method("GET").path("/api/buyer/cart");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "success": true, "data": [] }));
    });
    let logout = server.mock(|when, then| {
        when.method("POST").path("/api/auth/logout");
        then.status(500)
            .header("content-type", "application/json")
            .json_body(json!({ "success": false, "message": "boom" }));
    });

    let market = marketplace(&server, store.clone());
    assert!(market.restore_session().await?.is_some());
    market.cart().await?;
    assert!(!market.cache().is_empty());

    market.logout().await?;

    logout.assert();
    assert!(market.identity().is_none());
    assert_eq!(store.load()?, None);
    assert!(market.cache().is_empty());
    Ok(())
}

#[tokio::test]
async fn restore_validates_persisted_token() -> Result<(), ClientError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileTokenStore::new(dir.path()));
    store.save("tok-admin")?;
    let server = MockServer::start();
    let me = server.mock(|when, then| {
        when.method("GET")
            .path("/api/auth/me")
            .header("authorization", "Bearer tok-admin");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "success": true, "data": user("a1", "admin") }));
    });

    let market = marketplace(&server, store);
    let identity = market.restore_session().await?.expect("restored identity");

    me.assert();
    assert_eq!(identity.role, Role::Admin);
    assert_eq!(identity.token, "tok-admin");
    Ok(())
}

#[tokio::test]
async fn restore_discards_rejected_token() -> Result<(), ClientError> {
    let store = Arc::new(MemoryTokenStore::with_token("expired"));
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/api/auth/me");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({ "success": false, "message": "Token expired" }));
    });

    let market = marketplace(&server, store.clone());

    assert!(market.restore_session().await?.is_none());
    assert!(market.identity().is_none());
    assert_eq!(store.load()?, None);
    Ok(())
}

#[tokio::test]
async fn restore_without_token_makes_no_request() -> Result<(), ClientError> {
    let server = MockServer::start();
    let me = server.mock(|when, then| {
        when.method("GET").path("/api/auth/me");
        then.status(200);
    });

    let market = marketplace(&server, Arc::new(MemoryTokenStore::new()));

    assert!(market.restore_session().await?.is_none());
    assert_eq!(me.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn login_drops_reads_cached_for_the_previous_user() -> Result<(), ClientError> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/auth/login");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "success": true,
                "data": { "token": "tok-u1", "user": user("u1", "buyer") }
            }));
    });
    server.mock(|when, then| {
        when.method("GET").path("/api/products/categories");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "success": true, "data": ["Books"] }));
    });

    let market = marketplace(&server, Arc::new(MemoryTokenStore::new()));
    market.categories().await?;
    let key = CacheKey::singleton(Resource::ProductsCategories);
    assert!(market.cache().status(&key).is_some());

    market.login(&login_form()).await?;

    assert!(market.cache().status(&key).is_none());
    Ok(())
}

#[derive(Debug)]
struct ReadOnlyStore;

impl TokenStore for ReadOnlyStore {
    fn load(&self) -> Result<Option<String>, InfraError> {
        Ok(None)
    }

    fn save(&self, _token: &str) -> Result<(), InfraError> {
        Err(InfraError::configuration("token directory is read-only"))
    }

    fn clear(&self) -> Result<(), InfraError> {
        Ok(())
    }
}

#[tokio::test]
async fn failed_token_save_leaves_no_identity() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/auth/login");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "success": true,
                "data": { "token": "tok-u1", "user": user("u1", "buyer") }
            }));
    });

    let market = marketplace(&server, Arc::new(ReadOnlyStore));
    let err = market.login(&login_form()).await.expect_err("save fails");

    assert!(matches!(err, ClientError::Storage { .. }));
    assert!(market.identity().is_none());
}

#[tokio::test]
async fn logout_during_restore_is_not_undone() -> Result<(), ClientError> {
    let store = Arc::new(MemoryTokenStore::with_token("tok-u1"));
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET")
            .path("/api/auth/me")
            .header("authorization", "Bearer tok-u1");
        then.status(200)
            .header("content-type", "application/json")
            .delay(Duration::from_millis(300))
            .json_body(json!({ "success": true, "data": user("u1", "buyer") }));
    });
    server.mock(|when, then| {
        when.method("POST").path("/api/auth/logout");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "success": true, "data": { "message": "Logged out" } }));
    });

    let market = marketplace(&server, store.clone());
    let restoring = tokio::spawn({
        let market = market.clone();
        async move { market.restore_session().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    market.logout().await?;

    let restored = restoring.await.expect("restore task")?;

    assert!(restored.is_none());
    assert!(market.identity().is_none());
    assert_eq!(store.load()?, None);
    Ok(())
}

#[tokio::test]
async fn failed_restore_does_not_sign_out_a_newer_login() -> Result<(), ClientError> {
    let store = Arc::new(MemoryTokenStore::with_token("expired"));
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET")
            .path("/api/auth/me")
            .header("authorization", "Bearer expired");
        then.status(401)
            .header("content-type", "application/json")
            .delay(Duration::from_millis(300))
            .json_body(json!({ "success": false, "message": "Token expired" }));
    });
    server.mock(|when, then| {
        when.method("POST").path("/api/auth/login");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "success": true,
                "data": { "token": "tok-new", "user": user("u1", "buyer") }
            }));
    });

    let market = marketplace(&server, store.clone());
    let restoring = tokio::spawn({
        let market = market.clone();
        async move { market.restore_session().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    market.login(&login_form()).await?;

    let restored = restoring.await.expect("restore task")?;

    assert_eq!(restored.map(|identity| identity.token).as_deref(), Some("tok-new"));
    assert_eq!(
        market.identity().map(|identity| identity.token).as_deref(),
        Some("tok-new")
    );
    assert_eq!(store.load()?.as_deref(), Some("tok-new"));
    Ok(())
}

#[tokio::test]
async fn refresh_during_logout_stays_signed_out() -> Result<(), ClientError> {
    let store = Arc::new(MemoryTokenStore::new());
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/auth/login");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "success": true,
                "data": { "token": "tok-u1", "user": user("u1", "buyer") }
            }));
    });
    server.mock(|when, then| {
        when.method("GET").path("/api/auth/me");
        then.status(200)
            .header("content-type", "application/json")
            .delay(Duration::from_millis(300))
            .json_body(json!({ "success": true, "data": user("u1", "buyer") }));
    });
    server.mock(|when, then| {
        when.method("POST").path("/api/auth/logout");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "success": true, "data": { "message": "Logged out" } }));
    });

    let market = marketplace(&server, store.clone());
    market.login(&login_form()).await?;
    let refreshing = tokio::spawn({
        let market = market.clone();
        async move { market.refresh_session().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    market.logout().await?;

    refreshing.await.expect("refresh task")?;

    assert!(market.identity().is_none());
    assert_eq!(store.load()?, None);
    Ok(())
}
