use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    reconciliation::{CatalogStore, ReceiptCandidate, Reconciler, ReconciliationReport},
    services::ocr::OcrBackend,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Receipt scanning: OCR extraction followed by inventory reconciliation.
pub struct ReceiptService {
    ocr: Option<Arc<dyn OcrBackend>>,
    reconciler: Reconciler<dyn CatalogStore>,
    event_sender: EventSender,
}

impl ReceiptService {
    pub fn new(
        ocr: Option<Arc<dyn OcrBackend>>,
        catalog: Arc<dyn CatalogStore>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            ocr,
            reconciler: Reconciler::new(catalog),
            event_sender,
        }
    }

    pub fn ocr_enabled(&self) -> bool {
        self.ocr.is_some()
    }

    fn backend(&self) -> Result<&Arc<dyn OcrBackend>, ServiceError> {
        self.ocr.as_ref().ok_or_else(|| {
            ServiceError::ServiceUnavailable(
                "Receipt OCR is not configured. Set APP__OCR_BASE_URL.".into(),
            )
        })
    }

    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn extract(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Vec<ReceiptCandidate>, ServiceError> {
        if image.is_empty() {
            return Err(ServiceError::BadRequest("Receipt image is empty".into()));
        }
        let backend = self.backend()?;
        let candidates = backend.extract(image, mime_type).await?;
        info!(provider = backend.provider_name(), lines = candidates.len(), "Receipt extracted");
        Ok(candidates)
    }

    #[instrument(skip(self, candidates), fields(seller_id = %seller_id))]
    pub async fn reconcile(
        &self,
        seller_id: Uuid,
        candidates: Vec<ReceiptCandidate>,
    ) -> Result<ReconciliationReport, ServiceError> {
        let report = self.reconciler.reconcile(seller_id, candidates).await?;
        self.event_sender
            .send_or_log(Event::ReceiptReconciled {
                seller_id,
                created: report.created,
                linked: report.linked,
                failed: report.failed,
            })
            .await;
        Ok(report)
    }

    /// Extract, then reconcile whatever was read.
    pub async fn import(
        &self,
        seller_id: Uuid,
        image: &[u8],
        mime_type: &str,
    ) -> Result<ReconciliationReport, ServiceError> {
        let candidates = self.extract(image, mime_type).await?;
        if candidates.is_empty() {
            return Err(ServiceError::BadRequest(
                "No product lines could be read from the receipt".into(),
            ));
        }
        self.reconcile(seller_id, candidates).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::memory::InMemoryCatalog;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    struct CannedOcr(Vec<ReceiptCandidate>);

    #[async_trait]
    impl OcrBackend for CannedOcr {
        async fn extract(
            &self,
            _image: &[u8],
            _mime_type: &str,
        ) -> Result<Vec<ReceiptCandidate>, ServiceError> {
            Ok(self.0.clone())
        }

        fn provider_name(&self) -> &str {
            "canned"
        }
    }

    fn events() -> (EventSender, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(16);
        (EventSender::new(tx), rx)
    }

    #[tokio::test]
    async fn extraction_without_backend_is_unavailable() {
        let (sender, _rx) = events();
        let service = ReceiptService::new(None, Arc::new(InMemoryCatalog::default()), sender);
        assert!(!service.ocr_enabled());
        assert_matches!(
            service.extract(b"jpeg", "image/jpeg").await,
            Err(ServiceError::ServiceUnavailable(_))
        );
    }

    #[tokio::test]
    async fn import_reconciles_extracted_lines_and_emits_event() {
        let (sender, mut rx) = events();
        let ocr = CannedOcr(vec![ReceiptCandidate {
            name: "Tata Salt 1kg".into(),
            quantity: 10,
            unit_price: dec!(28),
            category: None,
            subcategory: None,
            unit: None,
            confidence: Some(0.8),
            variant_group_tag: None,
        }]);
        let service = ReceiptService::new(
            Some(Arc::new(ocr)),
            Arc::new(InMemoryCatalog::default()),
            sender,
        );

        let seller = Uuid::new_v4();
        let report = service.import(seller, b"jpeg", "image/jpeg").await.unwrap();
        assert_eq!(report.created, 1);

        let event = rx.recv().await.unwrap();
        assert_matches!(event, Event::ReceiptReconciled { created: 1, .. });
    }
}
