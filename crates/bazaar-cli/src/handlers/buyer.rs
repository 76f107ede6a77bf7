#![deny(clippy::all, clippy::pedantic)]

use super::page;
use crate::args::{CartCmd, OrdersCmd};
use crate::context::{CliError, Ctx};
use crate::print::{print_envelope, print_json};

pub async fn cart(ctx: &Ctx, cmd: CartCmd) -> Result<(), CliError> {
    ctx.require_session()?;
    match cmd {
        CartCmd::List => print_json(&ctx.market.cart().await?),
        CartCmd::Add {
            product_id,
            quantity,
        } => {
            let res = ctx.market.add_to_cart(&product_id, quantity).await?;
            print_envelope(res, "Failed to add to cart")
        }
        CartCmd::Update { item_id, quantity } => {
            let res = ctx.market.update_cart_item(&item_id, quantity).await?;
            print_envelope(res, "Failed to update cart item")
        }
        CartCmd::Remove { item_id } => {
            let res = ctx.market.remove_from_cart(&item_id).await?;
            print_envelope(res, "Failed to remove cart item")
        }
        CartCmd::Clear => {
            let res = ctx.market.clear_cart().await?;
            print_envelope(res, "Failed to clear cart")
        }
    }
}

pub async fn orders(ctx: &Ctx, cmd: OrdersCmd) -> Result<(), CliError> {
    ctx.require_session()?;
    match cmd {
        OrdersCmd::List {
            status,
            page: number,
            limit,
        } => {
            let res = ctx
                .market
                .buyer_orders(status.map(Into::into), page(number, limit))
                .await?;
            print_json(&res)
        }
        OrdersCmd::Get { id } => print_json(&ctx.market.buyer_order(&id).await?),
        OrdersCmd::Cancel { id, reason } => {
            let res = ctx.market.cancel_order(&id, reason.as_deref()).await?;
            print_envelope(res, "Failed to cancel order")
        }
    }
}
