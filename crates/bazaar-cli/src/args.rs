//! Command-line surface for `bazaar-cli`.

#![deny(clippy::all, clippy::pedantic)]

use std::fmt;
use std::path::PathBuf;

use bazaar::client::{SortDirection, SortField, SortOption};
use bazaar::config::ConfigArgs;
use bazaar_api_types::{DocumentKind, OrderStatus, ProductStatus, Role};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bazaar-cli", version, about = "Bazaar marketplace CLI", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and persist the session token
    Login {
        #[arg(long)]
        email: String,
        /// Password file (the flag avoids shell history leaks)
        #[arg(long)]
        password_file: Option<PathBuf>,
        #[arg(hide = true, env = "BAZAAR_PASSWORD")]
        password_env: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password_file: Option<PathBuf>,
        #[arg(hide = true, env = "BAZAAR_PASSWORD")]
        password_env: Option<String>,
        #[arg(long, default_value_t = RoleArg::Buyer)]
        role: RoleArg,
    },
    /// End the session (local state is cleared even if the server fails)
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Public catalogue
    Products(ProductsArgs),
    /// Buyer cart
    Cart(CartArgs),
    /// Buyer orders
    Orders(OrdersArgs),
    /// Seller workspace
    Seller(SellerArgs),
    /// Moderation and user management
    Admin(AdminArgs),
}

#[derive(Parser, Debug)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub action: ProductsCmd,
}

#[derive(Subcommand, Debug)]
pub enum ProductsCmd {
    /// List products with optional filters
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        sort: Option<SortArg>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Get a product by id
    Get { id: String },
    /// Full-text search
    Search {
        query: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Featured products
    Featured,
    /// Category names
    Categories,
}

#[derive(Parser, Debug)]
pub struct CartArgs {
    #[command(subcommand)]
    pub action: CartCmd,
}

#[derive(Subcommand, Debug)]
pub enum CartCmd {
    /// Show cart items
    List,
    /// Add a product
    Add {
        product_id: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Change the quantity of a cart item
    Update { item_id: String, quantity: u32 },
    /// Remove a cart item
    Remove { item_id: String },
    /// Empty the cart
    Clear,
}

#[derive(Parser, Debug)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub action: OrdersCmd,
}

#[derive(Subcommand, Debug)]
pub enum OrdersCmd {
    /// List own orders
    List {
        #[arg(long)]
        status: Option<OrderStatusArg>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Get an order by id
    Get { id: String },
    /// Cancel an order
    Cancel {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Parser, Debug)]
pub struct SellerArgs {
    #[command(subcommand)]
    pub action: SellerCmd,
}

#[derive(Subcommand, Debug)]
pub enum SellerCmd {
    /// Own product listings
    Products {
        #[arg(long)]
        status: Option<ProductStatusArg>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Incoming orders
    Orders {
        #[arg(long)]
        status: Option<OrderStatusArg>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Mark an order shipped
    Ship {
        id: String,
        #[arg(long)]
        tracking_number: Option<String>,
    },
    /// Dashboard stats, sales and top products
    Stats {
        /// Sales period, e.g. `7d`, `30d`
        #[arg(long)]
        period: Option<String>,
        #[arg(long)]
        top: Option<u32>,
    },
    /// Upload a verification document
    UploadDocument {
        file: PathBuf,
        #[arg(long, value_enum)]
        kind: DocumentKindArg,
        #[arg(long)]
        mime: Option<String>,
    },
}

#[derive(Parser, Debug)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub action: AdminCmd,
}

#[derive(Subcommand, Debug)]
pub enum AdminCmd {
    /// Products awaiting review
    PendingProducts {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    ApproveProduct { id: String },
    RejectProduct {
        id: String,
        #[arg(long)]
        reason: String,
    },
    /// Sellers awaiting verification
    PendingSellers {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    ApproveSeller { id: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RoleArg {
    Buyer,
    Seller,
}

impl RoleArg {
    #[must_use]
    pub fn role(self) -> Role {
        match self {
            Self::Buyer => Role::Buyer,
            Self::Seller => Role::Seller,
        }
    }
}

impl fmt::Display for RoleArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.role().as_str())
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortArg {
    PriceAsc,
    PriceDesc,
    Newest,
    Rating,
}

impl From<SortArg> for SortOption {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::PriceAsc => SortOption::new(SortField::Price, SortDirection::Asc),
            SortArg::PriceDesc => SortOption::new(SortField::Price, SortDirection::Desc),
            SortArg::Newest => SortOption::new(SortField::CreatedAt, SortDirection::Desc),
            SortArg::Rating => SortOption::new(SortField::Rating, SortDirection::Desc),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OrderStatusArg {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl From<OrderStatusArg> for OrderStatus {
    fn from(value: OrderStatusArg) -> Self {
        match value {
            OrderStatusArg::Pending => OrderStatus::Pending,
            OrderStatusArg::Confirmed => OrderStatus::Confirmed,
            OrderStatusArg::Shipped => OrderStatus::Shipped,
            OrderStatusArg::Delivered => OrderStatus::Delivered,
            OrderStatusArg::Cancelled => OrderStatus::Cancelled,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ProductStatusArg {
    Draft,
    Pending,
    Approved,
    Rejected,
    Suspended,
}

impl From<ProductStatusArg> for ProductStatus {
    fn from(value: ProductStatusArg) -> Self {
        match value {
            ProductStatusArg::Draft => ProductStatus::Draft,
            ProductStatusArg::Pending => ProductStatus::Pending,
            ProductStatusArg::Approved => ProductStatus::Approved,
            ProductStatusArg::Rejected => ProductStatus::Rejected,
            ProductStatusArg::Suspended => ProductStatus::Suspended,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum DocumentKindArg {
    Id,
    BusinessLicense,
    TaxCertificate,
    BankStatement,
}

impl From<DocumentKindArg> for DocumentKind {
    fn from(value: DocumentKindArg) -> Self {
        match value {
            DocumentKindArg::Id => DocumentKind::Id,
            DocumentKindArg::BusinessLicense => DocumentKind::BusinessLicense,
            DocumentKindArg::TaxCertificate => DocumentKind::TaxCertificate,
            DocumentKindArg::BankStatement => DocumentKind::BankStatement,
        }
    }
}
