#![deny(clippy::all, clippy::pedantic)]

use bazaar::resources::DocumentUpload;
use bazaar_api_types::OrderStatus;
use serde_json::json;

use super::page;
use crate::args::SellerCmd;
use crate::context::{CliError, Ctx};
use crate::io::{file_name, read_bytes};
use crate::print::{print_envelope, print_json};

pub async fn handle(ctx: &Ctx, cmd: SellerCmd) -> Result<(), CliError> {
    ctx.require_session()?;
    match cmd {
        SellerCmd::Products {
            status,
            page: number,
            limit,
        } => {
            let res = ctx
                .market
                .seller_products(status.map(Into::into), page(number, limit))
                .await?;
            print_json(&res)
        }
        SellerCmd::Orders {
            status,
            page: number,
            limit,
        } => {
            let res = ctx
                .market
                .seller_orders(status.map(Into::into), page(number, limit))
                .await?;
            print_json(&res)
        }
        SellerCmd::Ship {
            id,
            tracking_number,
        } => {
            let res = ctx
                .market
                .update_order_status(&id, OrderStatus::Shipped, tracking_number.as_deref())
                .await?;
            print_envelope(res, "Failed to update order")
        }
        SellerCmd::Stats { period, top } => {
            let (stats, sales, top) = tokio::try_join!(
                ctx.market.seller_dashboard_stats(),
                ctx.market.seller_sales_chart(period.as_deref()),
                ctx.market.seller_top_products(top),
            )?;
            print_json(&json!({ "stats": stats, "sales": sales, "topProducts": top }))
        }
        SellerCmd::UploadDocument { file, kind, mime } => {
            let upload = DocumentUpload {
                file_name: file_name(&file)?,
                mime,
                bytes: read_bytes(&file)?,
            };
            let res = ctx.market.upload_document(upload, kind.into()).await?;
            print_envelope(res, "Upload failed")
        }
    }
}
