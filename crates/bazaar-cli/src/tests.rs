#![deny(clippy::all, clippy::pedantic)]

use std::sync::Arc;

use bazaar::Marketplace;
use bazaar::cache::CacheConfig;
use bazaar::infra::token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
use bazaar_api_types::ResponseEnvelope;
use clap::Parser;
use httpmock::MockServer;
use serde_json::{Value, json};
use tempfile::NamedTempFile;

use crate::args::{AdminCmd, CartCmd, Cli, Commands, ProductsCmd, SellerCmd, SortArg};
use crate::context::{CliError, Ctx};
use crate::handlers::{admin, auth, buyer, products, seller};

fn ctx_with(server: &MockServer, store: Arc<dyn TokenStore>) -> Ctx {
    let base = url::Url::parse(&server.url("/api")).expect("base url");
    Ctx::new(Marketplace::new(&base, CacheConfig::default(), store).expect("marketplace"))
}

fn ctx(server: &MockServer) -> Ctx {
    ctx_with(server, Arc::new(MemoryTokenStore::new()))
}

async fn signed_in(server: &MockServer, role: &str) -> Result<Ctx, CliError> {
    server.mock(|when, then| {
        when.method("GET")
            .path("/api/auth/me")
            .header("authorization", "Bearer tok");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "success": true, "data": user(role) }));
    });
    let ctx = ctx_with(server, Arc::new(MemoryTokenStore::with_token("tok")));
    ctx.market.restore_session().await?;
    Ok(ctx)
}

fn user(role: &str) -> Value {
    json!({ "id": "u1", "email": "u1@bazaar.test", "name": "Ana", "role": role })
}

fn tmp_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    std::io::Write::write_all(&mut file, contents).expect("write tmp");
    file
}

#[test]
fn cli_accepts_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "bazaar-cli",
        "cart",
        "add",
        "p1",
        "--quantity",
        "3",
        "--api-base",
        "https://shop.example/api",
    ])
    .expect("parse");

    assert_eq!(cli.config.api_base.as_deref(), Some("https://shop.example/api"));
    match cli.command {
        Commands::Cart(cmd) => assert!(matches!(
            cmd.action,
            CartCmd::Add { ref product_id, quantity: 3 } if product_id == "p1"
        )),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn read_secret_prefers_file_and_strips_newline() -> Result<(), CliError> {
    let file = tmp_file(b"from-file\n");
    let secret = crate::io::read_secret(Some("from-env".into()), Some(file.path().to_path_buf()))?;
    assert_eq!(secret, "from-file");
    Ok(())
}

#[test]
fn read_secret_errors_without_source() {
    let err = crate::io::read_secret(None, None).expect_err("missing password");
    assert!(matches!(err, CliError::InvalidInput(_)));
}

#[test]
fn rejected_envelope_is_reported_as_error() {
    let envelope: ResponseEnvelope<Value> = ResponseEnvelope::failed("Out of stock");
    let err = crate::print::print_envelope(envelope, "fallback").expect_err("rejected");
    assert!(matches!(err, CliError::Client(bazaar::ClientError::Rejected { .. })));
}

#[tokio::test]
async fn products_list_sends_filters_and_sort() -> Result<(), CliError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/api/products")
            .query_param("page", "2")
            .query_param("limit", "5")
            .query_param("category", "Books")
            .query_param("sortBy", "price")
            .query_param("sortOrder", "desc");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "success": true,
                "data": { "data": [], "total": 0, "page": 2, "limit": 5, "totalPages": 0 }
            }));
    });

    let cmd = ProductsCmd::List {
        category: Some("Books".into()),
        min_price: None,
        max_price: None,
        tags: Vec::new(),
        sort: Some(SortArg::PriceDesc),
        page: 2,
        limit: 5,
    };
    products::handle(&ctx(&server), cmd).await?;

    mock.assert();
    Ok(())
}

#[tokio::test]
async fn buyer_commands_require_a_session() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/api/buyer/cart");
        then.status(200);
    });

    let err = buyer::cart(&ctx(&server), CartCmd::List)
        .await
        .expect_err("anonymous cart");

    assert!(matches!(err, CliError::NotSignedIn));
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn login_persists_token_file() -> Result<(), CliError> {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileTokenStore::new(dir.path()));
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/api/auth/login")
            .json_body(json!({ "email": "u1@bazaar.test", "password": "pw", "remember": true }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "success": true, "data": { "token": "tok-new", "user": user("buyer") } }));
    });

    let ctx = ctx_with(&server, store.clone());
    auth::login(&ctx, "u1@bazaar.test".into(), None, Some("pw".into())).await?;

    mock.assert();
    assert_eq!(store.load()?.as_deref(), Some("tok-new"));
    assert!(ctx.market.session().is_authenticated());
    Ok(())
}

#[tokio::test]
async fn seller_ship_sends_status_and_tracking() -> Result<(), CliError> {
    let server = MockServer::start();
    let ctx = signed_in(&server, "seller").await?;
    let mock = server.mock(|when, then| {
        when.method("PUT")
            .path("/api/seller/orders/o1")
            .header("authorization", "Bearer tok")
            .json_body(json!({ "status": "shipped", "trackingNumber": "TRK-9" }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "success": true,
                "data": {
                    "id": "o1", "orderNumber": "BZ-1", "status": "shipped",
                    "totalAmount": 12.0, "currency": "EUR", "buyerId": "b1", "sellerId": "u1"
                }
            }));
    });

    let cmd = SellerCmd::Ship {
        id: "o1".into(),
        tracking_number: Some("TRK-9".into()),
    };
    seller::handle(&ctx, cmd).await?;

    mock.assert();
    Ok(())
}

#[tokio::test]
async fn seller_upload_reads_file() -> Result<(), CliError> {
    let server = MockServer::start();
    let ctx = signed_in(&server, "seller").await?;
    let mock = server.mock(|when, then| {
        when.method("POST").path("/api/seller/documents");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "success": true, "data": { "url": "/uploads/license.pdf" } }));
    });
    let file = tmp_file(b"%PDF-1.4");

    let cmd = SellerCmd::UploadDocument {
        file: file.path().to_path_buf(),
        kind: crate::args::DocumentKindArg::BusinessLicense,
        mime: Some("application/pdf".into()),
    };
    seller::handle(&ctx, cmd).await?;

    mock.assert();
    Ok(())
}

#[tokio::test]
async fn admin_reject_requires_reason() -> Result<(), CliError> {
    let server = MockServer::start();
    let ctx = signed_in(&server, "admin").await?;
    let mock = server.mock(|when, then| {
        when.method("POST").path("/api/admin/products/p1/reject");
        then.status(200);
    });

    let err = admin::handle(
        &ctx,
        AdminCmd::RejectProduct {
            id: "p1".into(),
            reason: "  ".into(),
        },
    )
    .await
    .expect_err("blank reason");

    assert!(matches!(err, CliError::InvalidInput(_)));
    assert_eq!(mock.hits(), 0);
    Ok(())
}
