use std::sync::Arc;

use corpreg_client::{ClientConfig, ClientError, CompanyClient};
use corpreg_core::{CompanyId, CreateCompany, UpdateCompany};
use corpreg_infra::{AppConfig, InMemoryCompanyRepository};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("client-test-secret".to_string()),
            _ => None,
        })
        .expect("test config");
        let app = corpreg_api::build_app(&config, Arc::new(InMemoryCompanyRepository::new()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn client(&self, password: &str) -> CompanyClient {
        CompanyClient::new(ClientConfig::new(&self.base_url, "testuser", password))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn acme(isin: &str) -> CreateCompany {
    CreateCompany {
        name: "Acme".to_string(),
        exchange: "NYSE".to_string(),
        ticker: "ACME".to_string(),
        isin: isin.to_string(),
        website: Some("https://acme.example".to_string()),
    }
}

#[tokio::test]
async fn create_then_read_back() {
    let srv = TestServer::spawn().await;
    let client = srv.client("password123");

    let created = client.create(&acme("US1234567890")).await.unwrap();
    assert!(created.is_success());
    assert!(client.tokens().has_cached_token().await);
    let created = created.into_data().unwrap();

    let by_id = client.get(created.id).await.unwrap();
    assert_eq!(by_id.data(), Some(&created));

    let by_isin = client.get_by_isin("US1234567890").await.unwrap();
    assert_eq!(by_isin.data(), Some(&created));

    let all = client.list().await.unwrap().into_data().unwrap();
    assert_eq!(all, vec![created]);
}

#[tokio::test]
async fn validation_failure_comes_back_as_envelope() {
    let srv = TestServer::spawn().await;
    let client = srv.client("password123");

    let result = client.create(&CreateCompany::default()).await.unwrap();

    assert!(!result.is_success());
    assert_eq!(result.message(), "Validation failed");
    assert_eq!(result.errors()["Isin"], vec!["ISIN is required."]);
}

#[tokio::test]
async fn missing_company_is_a_failure() {
    let srv = TestServer::spawn().await;
    let client = srv.client("password123");

    let result = client.get(CompanyId::new()).await.unwrap();
    assert!(!result.is_success());
    assert_eq!(result.message(), "Company not found");
}

#[tokio::test]
async fn update_round_trips_through_api() {
    let srv = TestServer::spawn().await;
    let client = srv.client("password123");
    let created = client
        .create(&acme("US1234567890"))
        .await
        .unwrap()
        .into_data()
        .unwrap();

    let result = client
        .update(&UpdateCompany {
            id: created.id,
            name: "Acme Holdings".to_string(),
            exchange: created.exchange.clone(),
            ticker: created.ticker.clone(),
            isin: created.isin.clone(),
            website: None,
            updated_by: None,
        })
        .await
        .unwrap();

    let updated = result.into_data().unwrap();
    assert_eq!(updated.name, "Acme Holdings");
    assert_eq!(updated.updated_by.as_deref(), Some("testuser"));
    assert_eq!(updated.date_created, created.date_created);
}

#[tokio::test]
async fn wrong_credentials_fail_before_any_call() {
    let srv = TestServer::spawn().await;
    let client = srv.client("wrong");

    let err = client.list().await.unwrap_err();
    assert!(matches!(err, ClientError::TokenRejected(401)));
    assert!(!client.tokens().has_cached_token().await);
}

#[tokio::test]
async fn isin_with_reserved_characters_stays_on_lookup_route() {
    let srv = TestServer::spawn().await;
    let client = srv.client("password123");

    let result = client.get_by_isin("US/12?34#5").await.unwrap();

    assert!(!result.is_success());
    assert_eq!(result.message(), "Company not found");
}
