#![deny(clippy::all, clippy::pedantic)]

use bazaar::client::ProductFilters;

use super::page;
use crate::args::ProductsCmd;
use crate::context::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: ProductsCmd) -> Result<(), CliError> {
    match cmd {
        ProductsCmd::List {
            category,
            min_price,
            max_price,
            tags,
            sort,
            page: number,
            limit,
        } => {
            let filters = ProductFilters {
                category,
                min_price,
                max_price,
                tags,
                ..Default::default()
            };
            let res = ctx
                .market
                .products(&filters, sort.map(Into::into), page(number, limit))
                .await?;
            print_json(&res)
        }
        ProductsCmd::Get { id } => print_json(&ctx.market.product(&id).await?),
        ProductsCmd::Search {
            query,
            category,
            page: number,
            limit,
        } => {
            let filters = ProductFilters {
                category,
                ..Default::default()
            };
            let res = ctx
                .market
                .search_products(&query, &filters, page(number, limit))
                .await?;
            print_json(&res)
        }
        ProductsCmd::Featured => print_json(&ctx.market.featured_products().await?),
        ProductsCmd::Categories => print_json(&ctx.market.categories().await?),
    }
}
