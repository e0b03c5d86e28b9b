//! Receipt-to-inventory reconciliation.
//!
//! Turns OCR'd receipt lines into seller inventory. Lines tagged as variants
//! of each other are grouped, matched loosely against what the seller already
//! stocks, and linked through `variant_group_id` plus one `product_variants`
//! row per product. The run is best effort: each step is its own write, a
//! failed step is recorded in the report and the run moves on.

pub mod grouping;
pub mod naming;

use crate::{entities::product_variant::VariantType, errors::ServiceError};
use async_trait::async_trait;
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use grouping::{partition, CandidateGroup, Partition};
use naming::{base_name, extract_variant_value, fuzzy_matches, infer_variant_type, variant_sku};

/// One product line read off a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReceiptCandidate {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub unit: Option<String>,
    pub confidence: Option<f32>,
    /// Lines sharing a non-zero tag are variants of one product.
    pub variant_group_tag: Option<u32>,
}

fn default_quantity() -> i32 {
    1
}

/// The slice of a product the reconciler needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub name: String,
    pub variant_group_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewCatalogProduct {
    pub seller_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub unit: Option<String>,
    pub variant_group_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct VariantLink {
    pub base_product_id: Uuid,
    pub variant_product_id: Uuid,
    pub sku: String,
    pub variant_type: VariantType,
    pub variant_value: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub is_default: bool,
    pub display_order: i32,
}

/// Inventory operations the reconciler depends on.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn seller_products(&self, seller_id: Uuid) -> Result<Vec<CatalogProduct>, ServiceError>;

    async fn insert_product(
        &self,
        product: NewCatalogProduct,
    ) -> Result<CatalogProduct, ServiceError>;

    async fn assign_variant_group(
        &self,
        product_id: Uuid,
        variant_group_id: Uuid,
    ) -> Result<(), ServiceError>;

    /// Returns the id of the new variant row. Linking the same pair twice
    /// yields `ServiceError::Conflict`.
    async fn link_variant(&self, link: VariantLink) -> Result<Uuid, ServiceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeAction {
    /// A new product was created
    Created,
    /// An exact name match was reused (and tagged with the group if needed)
    Existing,
    /// Standalone line that exactly matches an existing product
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CandidateOutcome {
    /// Position of the line in the submitted candidate list
    pub index: usize,
    pub name: String,
    pub action: OutcomeAction,
    pub product_id: Option<Uuid>,
    pub variant_group_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub error: Option<String>,
}

impl CandidateOutcome {
    fn new(index: usize, name: &str, action: OutcomeAction) -> Self {
        Self {
            index,
            name: name.to_string(),
            action,
            product_id: None,
            variant_group_id: None,
            variant_id: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReconciliationReport {
    pub seller_id: Uuid,
    pub outcomes: Vec<CandidateOutcome>,
    /// Products created
    pub created: usize,
    /// Variant rows created
    pub linked: usize,
    /// Existing products that were given a variant group
    pub retagged: usize,
    pub skipped: usize,
    /// Lines with a failed product write or variant link
    pub failed: usize,
}

impl ReconciliationReport {
    fn new(seller_id: Uuid) -> Self {
        Self {
            seller_id,
            outcomes: Vec::new(),
            created: 0,
            linked: 0,
            retagged: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

fn find_exact<'a>(inventory: &'a [CatalogProduct], name: &str) -> Option<&'a CatalogProduct> {
    let wanted = name.trim().to_lowercase();
    inventory
        .iter()
        .find(|p| p.name.trim().to_lowercase() == wanted)
}

/// First loose match wins; there is no ranking.
fn find_fuzzy<'a>(inventory: &'a [CatalogProduct], base: &str) -> Option<&'a CatalogProduct> {
    inventory.iter().find(|p| fuzzy_matches(&p.name, base))
}

fn set_group(inventory: &mut [CatalogProduct], product_id: Uuid, group_id: Uuid) {
    if let Some(product) = inventory.iter_mut().find(|p| p.id == product_id) {
        product.variant_group_id = Some(group_id);
    }
}

pub struct Reconciler<S: CatalogStore + ?Sized> {
    store: Arc<S>,
}

impl<S: CatalogStore + ?Sized> Reconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Runs the heuristic over `candidates` for one seller.
    ///
    /// Only the initial inventory read can fail the whole run.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn reconcile(
        &self,
        seller_id: Uuid,
        candidates: Vec<ReceiptCandidate>,
    ) -> Result<ReconciliationReport, ServiceError> {
        if candidates.is_empty() {
            return Err(ServiceError::BadRequest(
                "At least one candidate is required".to_string(),
            ));
        }
        for candidate in &candidates {
            candidate.validate()?;
        }

        let mut inventory = self.store.seller_products(seller_id).await?;
        let mut report = ReconciliationReport::new(seller_id);
        let Partition { groups, standalone } = partition(candidates);
        debug!(groups = groups.len(), standalone = standalone.len(), "Candidates partitioned");

        for group in groups {
            self.reconcile_group(seller_id, group, &mut inventory, &mut report)
                .await;
        }
        for (index, candidate) in standalone {
            self.reconcile_standalone(seller_id, index, candidate, &mut inventory, &mut report)
                .await;
        }

        report.outcomes.sort_by_key(|o| o.index);

        counter!("marketplace_reconciliation.products_created", report.created as u64);
        counter!("marketplace_reconciliation.variants_linked", report.linked as u64);
        counter!("marketplace_reconciliation.failures", report.failed as u64);
        info!(
            created = report.created,
            linked = report.linked,
            retagged = report.retagged,
            skipped = report.skipped,
            failed = report.failed,
            "Reconciliation finished"
        );
        Ok(report)
    }

    /// Returns the matched product's group, minting one (and tagging the
    /// product with it) when it has none.
    async fn group_for_match(
        &self,
        matched: &CatalogProduct,
        inventory: &mut [CatalogProduct],
        report: &mut ReconciliationReport,
    ) -> Result<Uuid, ServiceError> {
        if let Some(group_id) = matched.variant_group_id {
            return Ok(group_id);
        }
        let group_id = Uuid::new_v4();
        self.store.assign_variant_group(matched.id, group_id).await?;
        set_group(inventory, matched.id, group_id);
        report.retagged += 1;
        debug!(product_id = %matched.id, %group_id, "Existing product tagged with new variant group");
        Ok(group_id)
    }

    async fn create(
        &self,
        seller_id: Uuid,
        candidate: &ReceiptCandidate,
        variant_group_id: Option<Uuid>,
        inventory: &mut Vec<CatalogProduct>,
    ) -> Result<CatalogProduct, ServiceError> {
        let created = self
            .store
            .insert_product(NewCatalogProduct {
                seller_id,
                name: candidate.name.trim().to_string(),
                price: candidate.unit_price,
                stock: candidate.quantity.max(0),
                category: candidate.category.clone(),
                subcategory: candidate.subcategory.clone(),
                unit: candidate.unit.clone(),
                variant_group_id,
            })
            .await?;
        inventory.push(created.clone());
        Ok(created)
    }

    async fn reconcile_group(
        &self,
        seller_id: Uuid,
        group: CandidateGroup,
        inventory: &mut Vec<CatalogProduct>,
        report: &mut ReconciliationReport,
    ) {
        let Some((_, first)) = group.members.first() else {
            return;
        };
        let base = base_name(&first.name);
        let matched = find_fuzzy(inventory, &base).cloned();

        let group_id = match &matched {
            Some(product) => match self.group_for_match(product, inventory, report).await {
                Ok(group_id) => group_id,
                Err(e) => {
                    warn!(error = %e, product_id = %product.id, "Could not tag matched product; starting a new group");
                    Uuid::new_v4()
                }
            },
            None => Uuid::new_v4(),
        };
        let mut base_product_id = matched.as_ref().map(|p| p.id);

        let mut resolved: Vec<(usize, ReceiptCandidate, Uuid)> = Vec::new();
        for (index, candidate) in group.members {
            let mut outcome = CandidateOutcome::new(index, &candidate.name, OutcomeAction::Created);
            outcome.variant_group_id = Some(group_id);

            let existing = find_exact(inventory, &candidate.name).cloned();
            let product_id = match existing {
                Some(product) => {
                    outcome.action = OutcomeAction::Existing;
                    if product.variant_group_id != Some(group_id) {
                        match self.store.assign_variant_group(product.id, group_id).await {
                            Ok(()) => {
                                set_group(inventory, product.id, group_id);
                                report.retagged += 1;
                            }
                            Err(e) => {
                                warn!(error = %e, product_id = %product.id, "Failed to retag existing product");
                                outcome.error = Some(e.response_message());
                                report.failed += 1;
                            }
                        }
                    }
                    product.id
                }
                None => match self.create(seller_id, &candidate, Some(group_id), inventory).await {
                    Ok(product) => {
                        report.created += 1;
                        product.id
                    }
                    Err(e) => {
                        warn!(error = %e, name = %candidate.name, "Failed to create grouped product");
                        outcome.action = OutcomeAction::Failed;
                        outcome.error = Some(e.response_message());
                        report.failed += 1;
                        report.outcomes.push(outcome);
                        continue;
                    }
                },
            };

            outcome.product_id = Some(product_id);
            base_product_id.get_or_insert(product_id);
            report.outcomes.push(outcome);
            resolved.push((index, candidate, product_id));
        }

        let Some(base_id) = base_product_id else {
            return;
        };

        for (position, (index, candidate, product_id)) in resolved.into_iter().enumerate() {
            let value = extract_variant_value(&candidate.name, &base, position);
            let link = VariantLink {
                base_product_id: base_id,
                variant_product_id: product_id,
                sku: variant_sku(&base, &value, &product_id.simple().to_string()),
                variant_type: infer_variant_type(&candidate.name),
                variant_value: value,
                price: candidate.unit_price,
                stock_quantity: candidate.quantity,
                is_default: product_id == base_id,
                display_order: position as i32,
            };
            let result = self.store.link_variant(link).await;
            self.record_link(index, result, report);
        }
    }

    async fn reconcile_standalone(
        &self,
        seller_id: Uuid,
        index: usize,
        candidate: ReceiptCandidate,
        inventory: &mut Vec<CatalogProduct>,
        report: &mut ReconciliationReport,
    ) {
        if let Some(existing) = find_exact(inventory, &candidate.name) {
            let mut outcome = CandidateOutcome::new(index, &candidate.name, OutcomeAction::Skipped);
            outcome.product_id = Some(existing.id);
            outcome.variant_group_id = existing.variant_group_id;
            report.skipped += 1;
            report.outcomes.push(outcome);
            return;
        }

        let base = base_name(&candidate.name);
        let matched = find_fuzzy(inventory, &base).cloned();
        let group_id = match &matched {
            Some(product) => match self.group_for_match(product, inventory, report).await {
                Ok(group_id) => Some(group_id),
                Err(e) => {
                    warn!(error = %e, product_id = %product.id, "Could not tag matched product; creating standalone");
                    None
                }
            },
            None => None,
        };

        let mut outcome = CandidateOutcome::new(index, &candidate.name, OutcomeAction::Created);
        let created = match self.create(seller_id, &candidate, group_id, inventory).await {
            Ok(product) => product,
            Err(e) => {
                warn!(error = %e, name = %candidate.name, "Failed to create product");
                outcome.action = OutcomeAction::Failed;
                outcome.error = Some(e.response_message());
                report.failed += 1;
                report.outcomes.push(outcome);
                return;
            }
        };
        report.created += 1;
        outcome.product_id = Some(created.id);
        outcome.variant_group_id = group_id;
        report.outcomes.push(outcome);

        let (Some(matched), Some(_)) = (matched, group_id) else {
            return;
        };
        let matched_base = base_name(&matched.name);
        let value = extract_variant_value(&candidate.name, &matched_base, index);
        let link = VariantLink {
            base_product_id: matched.id,
            variant_product_id: created.id,
            sku: variant_sku(&matched_base, &value, &created.id.simple().to_string()),
            variant_type: infer_variant_type(&candidate.name),
            variant_value: value,
            price: candidate.unit_price,
            stock_quantity: candidate.quantity,
            is_default: false,
            display_order: index as i32,
        };
        let result = self.store.link_variant(link).await;
        self.record_link(index, result, report);
    }

    /// Link failures are reported on the line's outcome and never abort the run.
    fn record_link(
        &self,
        index: usize,
        result: Result<Uuid, ServiceError>,
        report: &mut ReconciliationReport,
    ) {
        let outcome = report.outcomes.iter_mut().rev().find(|o| o.index == index);
        match (result, outcome) {
            (Ok(variant_id), Some(outcome)) => {
                outcome.variant_id = Some(variant_id);
                report.linked += 1;
            }
            (Ok(_), None) => report.linked += 1,
            (Err(e), outcome) => {
                warn!(error = %e, index, "Variant link failed");
                if let Some(outcome) = outcome {
                    outcome.error = Some(e.response_message());
                }
                report.failed += 1;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::sync::Mutex;

    /// Vec-backed store for exercising the reconciler without a database.
    #[derive(Default)]
    pub struct InMemoryCatalog {
        pub products: Mutex<Vec<(Uuid, CatalogProduct)>>,
        pub links: Mutex<Vec<VariantLink>>,
        /// Makes every `assign_variant_group` call fail.
        pub fail_retags: bool,
    }

    impl InMemoryCatalog {
        pub fn with_products(seller_id: Uuid, products: Vec<CatalogProduct>) -> Self {
            let store = Self::default();
            store
                .products
                .lock()
                .unwrap()
                .extend(products.into_iter().map(|p| (seller_id, p)));
            store
        }

        pub fn product(&self, id: Uuid) -> Option<CatalogProduct> {
            self.products
                .lock()
                .unwrap()
                .iter()
                .find(|(_, p)| p.id == id)
                .map(|(_, p)| p.clone())
        }

        pub fn product_named(&self, name: &str) -> Option<CatalogProduct> {
            self.products
                .lock()
                .unwrap()
                .iter()
                .find(|(_, p)| p.name == name)
                .map(|(_, p)| p.clone())
        }

        pub fn count(&self) -> usize {
            self.products.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CatalogStore for InMemoryCatalog {
        async fn seller_products(
            &self,
            seller_id: Uuid,
        ) -> Result<Vec<CatalogProduct>, ServiceError> {
            Ok(self
                .products
                .lock()
                .unwrap()
                .iter()
                .filter(|(s, _)| *s == seller_id)
                .map(|(_, p)| p.clone())
                .collect())
        }

        async fn insert_product(
            &self,
            product: NewCatalogProduct,
        ) -> Result<CatalogProduct, ServiceError> {
            let created = CatalogProduct {
                id: Uuid::new_v4(),
                name: product.name,
                variant_group_id: product.variant_group_id,
            };
            self.products
                .lock()
                .unwrap()
                .push((product.seller_id, created.clone()));
            Ok(created)
        }

        async fn assign_variant_group(
            &self,
            product_id: Uuid,
            variant_group_id: Uuid,
        ) -> Result<(), ServiceError> {
            if self.fail_retags {
                return Err(ServiceError::InternalError("catalog store offline".into()));
            }
            let mut products = self.products.lock().unwrap();
            let (_, product) = products
                .iter_mut()
                .find(|(_, p)| p.id == product_id)
                .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
            product.variant_group_id = Some(variant_group_id);
            Ok(())
        }

        async fn link_variant(&self, link: VariantLink) -> Result<Uuid, ServiceError> {
            let mut links = self.links.lock().unwrap();
            if links.iter().any(|l| {
                l.base_product_id == link.base_product_id
                    && l.variant_product_id == link.variant_product_id
            }) {
                return Err(ServiceError::Conflict("Variant link already exists".into()));
            }
            links.push(link);
            Ok(Uuid::new_v4())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryCatalog;
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn candidate(name: &str, tag: Option<u32>) -> ReceiptCandidate {
        ReceiptCandidate {
            name: name.to_string(),
            quantity: 12,
            unit_price: dec!(20),
            category: Some("Beverages".into()),
            subcategory: None,
            unit: None,
            confidence: Some(0.9),
            variant_group_tag: tag,
        }
    }

    fn existing(name: &str, group: Option<Uuid>) -> CatalogProduct {
        CatalogProduct {
            id: Uuid::new_v4(),
            name: name.to_string(),
            variant_group_id: group,
        }
    }

    #[tokio::test]
    async fn new_group_creates_products_and_links_to_first() {
        let seller = Uuid::new_v4();
        let store = Arc::new(InMemoryCatalog::default());
        let reconciler = Reconciler::new(store.clone());

        let report = reconciler
            .reconcile(
                seller,
                vec![
                    candidate("Coca Cola 250ml", Some(1)),
                    candidate("Coca Cola 500ml", Some(1)),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.linked, 2);
        assert_eq!(report.failed, 0);

        let small = store.product_named("Coca Cola 250ml").unwrap();
        let large = store.product_named("Coca Cola 500ml").unwrap();
        assert!(small.variant_group_id.is_some());
        assert_eq!(small.variant_group_id, large.variant_group_id);

        let links = store.links.lock().unwrap();
        assert!(links.iter().all(|l| l.base_product_id == small.id));
        assert!(links.iter().all(|l| l.variant_type == VariantType::Size));
        let values: Vec<&str> = links.iter().map(|l| l.variant_value.as_str()).collect();
        assert_eq!(values, vec!["250ml", "500ml"]);
        assert!(links[0].is_default);
        assert!(!links[1].is_default);
    }

    #[tokio::test]
    async fn ungrouped_match_is_retagged_with_a_new_group() {
        let seller = Uuid::new_v4();
        let cola = existing("Coca Cola", None);
        let store = Arc::new(InMemoryCatalog::with_products(seller, vec![cola.clone()]));
        let reconciler = Reconciler::new(store.clone());

        let report = reconciler
            .reconcile(
                seller,
                vec![
                    candidate("Coca Cola 250ml", Some(4)),
                    candidate("Coca Cola 1L", Some(4)),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.retagged, 1);
        assert_eq!(report.created, 2);
        let tagged = store.product(cola.id).unwrap();
        let group = tagged.variant_group_id.expect("matched product tagged");
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.variant_group_id == Some(group)));
        assert!(store
            .links
            .lock()
            .unwrap()
            .iter()
            .all(|l| l.base_product_id == cola.id));
    }

    #[tokio::test]
    async fn grouped_match_donates_its_group() {
        let seller = Uuid::new_v4();
        let group = Uuid::new_v4();
        let store = Arc::new(InMemoryCatalog::with_products(
            seller,
            vec![existing("Amul Taaza Milk 500ml", Some(group))],
        ));
        let reconciler = Reconciler::new(store.clone());

        let report = reconciler
            .reconcile(
                seller,
                vec![
                    candidate("Amul Taaza Milk 1L", Some(9)),
                    candidate("Amul Taaza Milk 200ml", Some(9)),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.retagged, 0);
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.variant_group_id == Some(group)));
    }

    #[tokio::test]
    async fn exact_duplicate_in_group_is_reused_not_created() {
        let seller = Uuid::new_v4();
        let dup = existing("Sprite 250ml", None);
        let store = Arc::new(InMemoryCatalog::with_products(seller, vec![dup.clone()]));
        let reconciler = Reconciler::new(store.clone());

        let report = reconciler
            .reconcile(
                seller,
                vec![candidate("sprite 250ml", Some(2)), candidate("Sprite 500ml", Some(2))],
            )
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(store.count(), 2);
        assert_eq!(report.outcomes[0].action, OutcomeAction::Existing);
        assert_eq!(report.outcomes[0].product_id, Some(dup.id));
        assert!(store.product(dup.id).unwrap().variant_group_id.is_some());
    }

    #[tokio::test]
    async fn failed_retag_of_existing_member_counts_as_failure() {
        let seller = Uuid::new_v4();
        let dup = existing("Sprite 250ml", None);
        let store = Arc::new(InMemoryCatalog {
            fail_retags: true,
            ..InMemoryCatalog::with_products(seller, vec![dup.clone()])
        });
        let reconciler = Reconciler::new(store.clone());

        let report = reconciler
            .reconcile(
                seller,
                vec![candidate("Sprite 250ml", Some(2)), candidate("Sprite 500ml", Some(2))],
            )
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.retagged, 0);
        assert_eq!(report.created, 1);
        assert_eq!(report.outcomes[0].action, OutcomeAction::Existing);
        assert_eq!(report.outcomes[0].error.as_deref(), Some("Internal server error"));
        assert_eq!(report.outcomes[1].error, None);
    }

    #[tokio::test]
    async fn standalone_joins_fuzzy_match_or_stands_alone() {
        let seller = Uuid::new_v4();
        let kurkure = existing("Kurkure 40g", None);
        let store = Arc::new(InMemoryCatalog::with_products(seller, vec![kurkure.clone()]));
        let reconciler = Reconciler::new(store.clone());

        let report = reconciler
            .reconcile(
                seller,
                vec![candidate("Kurkure 90g", None), candidate("Tata Salt 1kg", None)],
            )
            .await
            .unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.linked, 1);
        let group = store.product(kurkure.id).unwrap().variant_group_id;
        assert!(group.is_some());
        assert_eq!(report.outcomes[0].variant_group_id, group);
        assert_eq!(report.outcomes[1].variant_group_id, None);

        let links = store.links.lock().unwrap();
        assert_eq!(links[0].base_product_id, kurkure.id);
        assert_eq!(links[0].variant_type, VariantType::Weight);
        assert_eq!(links[0].variant_value, "90g");
    }

    #[tokio::test]
    async fn standalone_exact_duplicate_is_skipped() {
        let seller = Uuid::new_v4();
        let sugar = existing("Sugar 1kg", None);
        let store = Arc::new(InMemoryCatalog::with_products(seller, vec![sugar.clone()]));
        let reconciler = Reconciler::new(store.clone());

        let report = reconciler
            .reconcile(seller, vec![candidate("SUGAR 1KG", None)])
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 0);
        assert_eq!(report.outcomes[0].action, OutcomeAction::Skipped);
        assert_eq!(report.outcomes[0].product_id, Some(sugar.id));
    }

    #[tokio::test]
    async fn rerun_reports_duplicate_links_without_failing() {
        let seller = Uuid::new_v4();
        let store = Arc::new(InMemoryCatalog::default());
        let reconciler = Reconciler::new(store.clone());
        let lines = vec![
            candidate("Pepsi 250ml", Some(1)),
            candidate("Pepsi 600ml", Some(1)),
        ];

        reconciler.reconcile(seller, lines.clone()).await.unwrap();
        let second = reconciler.reconcile(seller, lines).await.unwrap();

        assert_eq!(second.created, 0);
        assert_eq!(second.linked, 0);
        assert_eq!(second.failed, 2);
        assert!(second.outcomes.iter().all(|o| o.error.is_some()));
        assert_eq!(store.count(), 2);
    }

    #[tokio::test]
    async fn empty_candidate_list_is_rejected() {
        let reconciler = Reconciler::new(Arc::new(InMemoryCatalog::default()));
        let result = reconciler.reconcile(Uuid::new_v4(), vec![]).await;
        assert_matches!(result, Err(ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn other_sellers_inventory_is_ignored() {
        let seller = Uuid::new_v4();
        let store = Arc::new(InMemoryCatalog::with_products(
            Uuid::new_v4(),
            vec![existing("Good Day Biscuit", None)],
        ));
        let reconciler = Reconciler::new(store.clone());

        let report = reconciler
            .reconcile(seller, vec![candidate("Good Day Biscuit", None)])
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 0);
    }
}
