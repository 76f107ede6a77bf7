//! Writes and the cache entries they make obsolete.
//!
//! Every write is described by a [`MutationKind`]; its descriptor lists the
//! key patterns that must be invalidated once the write succeeds.

use std::future::Future;

use bazaar_api_types::ResponseEnvelope;
use metrics::counter;
use tracing::{debug, warn};

use crate::cache::{CacheKey, KeyPattern, QueryCache, Resource};
use crate::client::ClientError;

const SOURCE: &str = "application::mutations";
const METRIC_MUTATIONS: &str = "bazaar_mutations_total";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    CreateProduct,
    UpdateProduct { id: String },
    DeleteProduct { id: String },
    UpdateOrderStatus { id: String },
    AddToCart,
    UpdateCartItem,
    RemoveFromCart,
    ClearCart,
    CreateOrder,
    CancelOrder { id: String },
    AddReview { product_id: String },
    AddAddress,
    UpdateAddress,
    DeleteAddress,
    UpdateUserRole,
    ApproveProduct,
    RejectProduct,
    ApproveSeller,
    RejectSeller,
    UpdateShop,
    UploadDocument,
    UpdateBankDetails,
}

/// A write together with the cache patterns it invalidates on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationDescriptor {
    pub name: &'static str,
    pub affected: Vec<KeyPattern>,
}

fn prefix(resource: Resource) -> KeyPattern {
    KeyPattern::Prefix(resource)
}

fn exact(resource: Resource, id: &str) -> KeyPattern {
    KeyPattern::Exact(CacheKey::entity(resource, id))
}

impl MutationKind {
    pub fn name(&self) -> &'static str {
        match self {
            MutationKind::CreateProduct => "create_product",
            MutationKind::UpdateProduct { .. } => "update_product",
            MutationKind::DeleteProduct { .. } => "delete_product",
            MutationKind::UpdateOrderStatus { .. } => "update_order_status",
            MutationKind::AddToCart => "add_to_cart",
            MutationKind::UpdateCartItem => "update_cart_item",
            MutationKind::RemoveFromCart => "remove_from_cart",
            MutationKind::ClearCart => "clear_cart",
            MutationKind::CreateOrder => "create_order",
            MutationKind::CancelOrder { .. } => "cancel_order",
            MutationKind::AddReview { .. } => "add_review",
            MutationKind::AddAddress => "add_address",
            MutationKind::UpdateAddress => "update_address",
            MutationKind::DeleteAddress => "delete_address",
            MutationKind::UpdateUserRole => "update_user_role",
            MutationKind::ApproveProduct => "approve_product",
            MutationKind::RejectProduct => "reject_product",
            MutationKind::ApproveSeller => "approve_seller",
            MutationKind::RejectSeller => "reject_seller",
            MutationKind::UpdateShop => "update_shop",
            MutationKind::UploadDocument => "upload_document",
            MutationKind::UpdateBankDetails => "update_bank_details",
        }
    }

    pub fn affected(&self) -> Vec<KeyPattern> {
        use Resource::*;

        match self {
            MutationKind::CreateProduct => vec![prefix(SellerProducts), prefix(Products)],
            MutationKind::UpdateProduct { id } | MutationKind::DeleteProduct { id } => vec![
                prefix(SellerProducts),
                exact(Product, id),
                prefix(Products),
            ],
            MutationKind::UpdateOrderStatus { id } => vec![
                prefix(SellerOrders),
                prefix(BuyerOrders),
                exact(BuyerOrder, id),
            ],
            MutationKind::AddToCart
            | MutationKind::UpdateCartItem
            | MutationKind::RemoveFromCart
            | MutationKind::ClearCart => vec![prefix(BuyerCart)],
            MutationKind::CreateOrder => vec![prefix(BuyerOrders), prefix(BuyerCart)],
            MutationKind::CancelOrder { id } => vec![
                prefix(BuyerOrders),
                prefix(SellerOrders),
                exact(BuyerOrder, id),
            ],
            MutationKind::AddReview { product_id } => {
                vec![exact(Product, product_id), prefix(Products)]
            }
            MutationKind::AddAddress | MutationKind::UpdateAddress | MutationKind::DeleteAddress => {
                vec![prefix(BuyerAddresses)]
            }
            MutationKind::UpdateUserRole => vec![prefix(AdminUsers)],
            MutationKind::ApproveProduct => vec![prefix(AdminPendingProducts), prefix(Products)],
            MutationKind::RejectProduct => vec![prefix(AdminPendingProducts)],
            MutationKind::ApproveSeller => vec![prefix(AdminPendingSellers), prefix(AdminUsers)],
            MutationKind::RejectSeller => vec![prefix(AdminPendingSellers)],
            MutationKind::UpdateShop
            | MutationKind::UploadDocument
            | MutationKind::UpdateBankDetails => vec![prefix(AuthMe)],
        }
    }

    pub fn descriptor(&self) -> MutationDescriptor {
        MutationDescriptor {
            name: self.name(),
            affected: self.affected(),
        }
    }
}

/// Runs writes and applies their declared invalidations.
#[derive(Debug, Clone)]
pub struct MutationCoordinator {
    cache: QueryCache,
}

impl MutationCoordinator {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    /// Awaits `call`; when it succeeds with `success: true`, invalidates
    /// every pattern of `descriptor` before returning. Any other outcome is
    /// returned unchanged and leaves the cache untouched.
    pub async fn mutate<T, Fut>(
        &self,
        descriptor: &MutationDescriptor,
        call: Fut,
    ) -> Result<ResponseEnvelope<T>, ClientError>
    where
        Fut: Future<Output = Result<ResponseEnvelope<T>, ClientError>>,
    {
        let outcome = call.await;
        let label = match &outcome {
            Ok(envelope) if envelope.success => {
                let invalidated: usize = descriptor
                    .affected
                    .iter()
                    .map(|pattern| self.cache.invalidate_pattern(pattern))
                    .sum();
                debug!(
                    target: SOURCE,
                    mutation = descriptor.name,
                    invalidated,
                    "mutation applied"
                );
                "ok"
            }
            Ok(envelope) => {
                debug!(
                    target: SOURCE,
                    mutation = descriptor.name,
                    message = envelope.message.as_deref().unwrap_or_default(),
                    "mutation rejected by server"
                );
                "rejected"
            }
            Err(err) => {
                warn!(target: SOURCE, mutation = descriptor.name, error = %err, "mutation failed");
                "error"
            }
        };
        counter!(METRIC_MUTATIONS, "mutation" => descriptor.name, "outcome" => label).increment(1);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use bazaar_api_types::MessageResponse;

    use super::*;
    use crate::cache::{CacheConfig, EntryStatus};
    use crate::client::QueryParams;

    fn rendered(kind: MutationKind) -> Vec<String> {
        kind.affected().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn product_writes_cover_listings_and_entity() {
        assert_eq!(
            rendered(MutationKind::CreateProduct),
            ["seller.products.*", "products.*"]
        );
        assert_eq!(
            rendered(MutationKind::DeleteProduct { id: "p9".into() }),
            ["seller.products.*", "product?id=p9", "products.*"]
        );
    }

    #[test]
    fn order_writes_touch_both_sides() {
        assert_eq!(
            rendered(MutationKind::CancelOrder { id: "o1".into() }),
            ["buyer.orders.*", "seller.orders.*", "buyer.order?id=o1"]
        );
        assert_eq!(
            rendered(MutationKind::CreateOrder),
            ["buyer.orders.*", "buyer.cart.*"]
        );
    }

    #[test]
    fn profile_writes_refresh_identity() {
        for kind in [
            MutationKind::UpdateShop,
            MutationKind::UploadDocument,
            MutationKind::UpdateBankDetails,
        ] {
            assert_eq!(rendered(kind), ["auth.me.*"]);
        }
    }

    async fn warm(cache: &QueryCache, key: CacheKey) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _: u32 = cache
            .read(key, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await
            .expect("warm read");
    }

    fn cache() -> QueryCache {
        QueryCache::new(CacheConfig {
            default_stale: Duration::from_secs(600),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn successful_mutation_invalidates_declared_keys() {
        let cache = cache();
        let listing = CacheKey::new(Resource::Products, &QueryParams::new().with("page", 1));
        let seller = CacheKey::new(Resource::SellerProducts, &QueryParams::new().with("page", 1));
        let cart = CacheKey::singleton(Resource::BuyerCart);
        for key in [&listing, &seller, &cart] {
            warm(&cache, key.clone()).await;
        }

        let coordinator = MutationCoordinator::new(cache.clone());
        let outcome = coordinator
            .mutate(&MutationKind::CreateProduct.descriptor(), async {
                Ok(ResponseEnvelope::ok(MessageResponse {
                    message: "created".into(),
                }))
            })
            .await
            .expect("mutation");

        assert!(outcome.success);
        assert_eq!(cache.status(&listing), Some(EntryStatus::Stale));
        assert_eq!(cache.status(&seller), Some(EntryStatus::Stale));
        assert_eq!(cache.status(&cart), Some(EntryStatus::Fresh));
    }

    #[tokio::test]
    async fn failed_or_rejected_mutation_leaves_cache_alone() {
        let cache = cache();
        let listing = CacheKey::new(Resource::Products, &QueryParams::new());
        warm(&cache, listing.clone()).await;
        let coordinator = MutationCoordinator::new(cache.clone());
        let descriptor = MutationKind::CreateProduct.descriptor();

        let err = coordinator
            .mutate::<MessageResponse, _>(&descriptor, async {
                Err(ClientError::transport("connection reset"))
            })
            .await
            .expect_err("transport failure");
        assert!(matches!(err, ClientError::Transport { .. }));

        let rejected = coordinator
            .mutate::<MessageResponse, _>(&descriptor, async {
                Ok(ResponseEnvelope::failed("Validation failed"))
            })
            .await
            .expect("envelope");
        assert!(!rejected.success);
        assert_eq!(rejected.message.as_deref(), Some("Validation failed"));

        assert_eq!(cache.status(&listing), Some(EntryStatus::Fresh));
    }
}
