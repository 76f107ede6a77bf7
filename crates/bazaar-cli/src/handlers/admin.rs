#![deny(clippy::all, clippy::pedantic)]

use super::page;
use crate::args::AdminCmd;
use crate::context::{CliError, Ctx};
use crate::print::{print_envelope, print_json};

pub async fn handle(ctx: &Ctx, cmd: AdminCmd) -> Result<(), CliError> {
    ctx.require_session()?;
    match cmd {
        AdminCmd::PendingProducts {
            page: number,
            limit,
        } => print_json(&ctx.market.pending_products(page(number, limit)).await?),
        AdminCmd::ApproveProduct { id } => {
            let res = ctx.market.approve_product(&id).await?;
            print_envelope(res, "Failed to approve product")
        }
        AdminCmd::RejectProduct { id, reason } => {
            if reason.trim().is_empty() {
                return Err(CliError::InvalidInput("rejection reason is required".into()));
            }
            let res = ctx.market.reject_product(&id, &reason).await?;
            print_envelope(res, "Failed to reject product")
        }
        AdminCmd::PendingSellers {
            page: number,
            limit,
        } => print_json(&ctx.market.pending_sellers(page(number, limit)).await?),
        AdminCmd::ApproveSeller { id } => {
            let res = ctx.market.approve_seller(&id).await?;
            print_envelope(res, "Failed to approve seller")
        }
    }
}
