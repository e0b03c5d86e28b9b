//! CSV product imports: a preview that shows how a file will be read, and
//! the import itself, which creates one product per row.

use crate::{
    entities::product::ProductStatus,
    errors::ServiceError,
    events::{Event, EventSender},
    services::products::{CreateProductRequest, ProductService},
};
use futures::{stream, StreamExt};
use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, str::FromStr, sync::Arc};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CsvPreview {
    pub headers: Vec<String>,
    /// One object per data row, keyed by header
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    /// Data rows in the file, including any beyond the preview limit
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportRowError {
    /// 1-based data row number (the header is not counted)
    pub row: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<ImportRowError>,
}

struct ParsedCsv {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

fn read_csv(bytes: &[u8]) -> Result<ParsedCsv, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ServiceError::BadRequest(format!("Unreadable CSV header: {}", e)))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(ServiceError::BadRequest("CSV file has no header row".into()));
    }

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ServiceError::BadRequest(format!("Invalid CSV: {}", e)))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        // Ragged rows are padded with empty cells or cut to the header width.
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        cells.resize(headers.len(), String::new());
        records.push(cells);
    }
    Ok(ParsedCsv { headers, records })
}

/// Reads up to `limit` data rows as header-keyed objects.
pub fn parse_csv_preview(bytes: &[u8], limit: usize) -> Result<CsvPreview, ServiceError> {
    let ParsedCsv { headers, records } = read_csv(bytes)?;
    let total_rows = records.len();
    let rows = records
        .into_iter()
        .take(limit)
        .map(|cells| {
            headers
                .iter()
                .cloned()
                .zip(cells.into_iter().map(serde_json::Value::String))
                .collect()
        })
        .collect();
    Ok(CsvPreview {
        headers,
        rows,
        total_rows,
    })
}

/// Turns one row into a create request. Column names are matched
/// case-insensitively; `name` and `price` are required.
fn row_to_request(
    columns: &HashMap<String, usize>,
    cells: &[String],
    default_seller_id: Option<Uuid>,
) -> Result<CreateProductRequest, String> {
    let cell = |name: &str| {
        columns
            .get(name)
            .and_then(|i| cells.get(*i))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };

    let name = cell("name").ok_or("name is required")?.to_string();
    let price = cell("price").ok_or("price is required")?;
    let price = Decimal::from_str(price.trim_start_matches('$'))
        .map_err(|_| format!("'{}' is not a valid price", price))?;
    let stock_available = match cell("stock_available") {
        Some(v) => v
            .parse::<i32>()
            .map_err(|_| format!("'{}' is not a valid stock quantity", v))?,
        None => 0,
    };
    let seller_id = match cell("seller_id") {
        Some(v) => Uuid::parse_str(v).map_err(|_| format!("'{}' is not a valid seller_id", v))?,
        None => default_seller_id.ok_or("seller_id is required")?,
    };
    let status = cell("status")
        .map(|v| ProductStatus::from_str(v).map_err(|_| format!("'{}' is not a valid status", v)))
        .transpose()?;

    Ok(CreateProductRequest {
        name,
        description: cell("description").map(str::to_string),
        price,
        category: cell("category").map(str::to_string),
        subcategory: cell("subcategory").map(str::to_string),
        stock_available,
        unit: cell("unit").map(str::to_string),
        seller_id,
        status,
        variant_group_id: None,
        image_urls: Vec::new(),
        force: false,
    })
}

/// Rows run concurrently, so the per-product duplicate check cannot see
/// other rows of the same file. Later repeats of a (name, seller) pair are
/// turned into row errors here.
fn dedupe_rows(
    requests: Vec<Result<CreateProductRequest, String>>,
) -> Vec<Result<CreateProductRequest, String>> {
    let mut first_seen: HashMap<(String, Uuid), usize> = HashMap::new();
    requests
        .into_iter()
        .enumerate()
        .map(|(i, request)| {
            let request = request?;
            let key = (request.name.trim().to_lowercase(), request.seller_id);
            match first_seen.get(&key) {
                Some(row) => Err(format!("duplicate of row {}", row)),
                None => {
                    first_seen.insert(key, i + 1);
                    Ok(request)
                }
            }
        })
        .collect()
}

pub struct ImportService {
    products: Arc<ProductService>,
    event_sender: EventSender,
    max_rows: usize,
    concurrency: usize,
}

impl ImportService {
    pub fn new(
        products: Arc<ProductService>,
        event_sender: EventSender,
        max_rows: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            products,
            event_sender,
            max_rows: max_rows.max(1),
            concurrency: concurrency.max(1),
        }
    }

    pub fn preview(&self, bytes: &[u8]) -> Result<CsvPreview, ServiceError> {
        parse_csv_preview(bytes, self.max_rows)
    }

    /// Creates one product per row, concurrently. Bad rows are reported and
    /// skipped; files with more than the configured row limit are rejected.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn import_products(
        &self,
        bytes: &[u8],
        default_seller_id: Option<Uuid>,
    ) -> Result<ImportResult, ServiceError> {
        let ParsedCsv { headers, records } = read_csv(bytes)?;
        if records.is_empty() {
            return Err(ServiceError::BadRequest("CSV file has no data rows".into()));
        }
        if records.len() > self.max_rows {
            return Err(ServiceError::BadRequest(format!(
                "CSV has {} rows; at most {} can be imported at once",
                records.len(),
                self.max_rows
            )));
        }

        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_lowercase(), i))
            .collect();
        if !columns.contains_key("name") || !columns.contains_key("price") {
            return Err(ServiceError::BadRequest(
                "CSV must have 'name' and 'price' columns".into(),
            ));
        }

        let requests = dedupe_rows(
            records
                .iter()
                .map(|cells| row_to_request(&columns, cells, default_seller_id))
                .collect(),
        );

        let outcomes: Vec<(usize, Result<(), String>)> = stream::iter(requests.into_iter().enumerate())
            .map(|(i, request)| async move {
                let outcome = match request {
                    Ok(request) => self
                        .products
                        .create_product(request)
                        .await
                        .map(|_| ())
                        .map_err(|e| e.response_message()),
                    Err(message) => Err(message),
                };
                (i + 1, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut result = ImportResult::default();
        for (row, outcome) in outcomes {
            match outcome {
                Ok(()) => result.imported += 1,
                Err(error) => result.errors.push(ImportRowError { row, error }),
            }
        }
        result.errors.sort_by_key(|e| e.row);

        counter!("marketplace_import.rows_imported", result.imported as u64);
        counter!("marketplace_import.rows_failed", result.errors.len() as u64);
        if !result.errors.is_empty() {
            warn!(failed = result.errors.len(), "Import finished with failed rows");
        }
        info!(imported = result.imported, "Product import finished");
        self.event_sender
            .send_or_log(Event::ProductsImported {
                imported: result.imported,
                failed: result.errors.len(),
            })
            .await;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = "name,price,category,stock_available\n\
        Coca Cola 250ml,20,Beverages,48\n\
        Coca Cola 500ml,35,Beverages,24\n\
        Tata Salt 1kg,28,Staples,100\n\
        Aashirvaad Atta 5kg,265,Staples,12\n\
        Parle-G 100g,10,Snacks,200\n";

    #[test]
    fn preview_keys_rows_by_header() {
        let preview = parse_csv_preview(SAMPLE.as_bytes(), 100).unwrap();
        assert_eq!(preview.headers, vec!["name", "price", "category", "stock_available"]);
        assert_eq!(preview.rows.len(), 5);
        assert_eq!(preview.total_rows, 5);
        assert_eq!(preview.rows[2]["name"], "Tata Salt 1kg");
        assert_eq!(preview.rows[4]["stock_available"], "200");
    }

    #[test]
    fn preview_pads_ragged_rows_and_skips_blank_lines() {
        let csv = " name , price \nSugar 1kg\n\n,\nTea 250g,120,extra\n";
        let preview = parse_csv_preview(csv.as_bytes(), 10).unwrap();
        assert_eq!(preview.headers, vec!["name", "price"]);
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[0]["price"], "");
        assert_eq!(preview.rows[1].len(), 2);
    }

    #[test]
    fn preview_limit_keeps_total_count() {
        let preview = parse_csv_preview(SAMPLE.as_bytes(), 2).unwrap();
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.total_rows, 5);
    }

    #[test]
    fn empty_file_is_rejected() {
        assert_matches!(parse_csv_preview(b"", 10), Err(ServiceError::BadRequest(_)));
    }

    fn columns(headers: &[&str]) -> HashMap<String, usize> {
        headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_string(), i))
            .collect()
    }

    #[test]
    fn row_uses_default_seller_when_column_missing() {
        let seller = Uuid::new_v4();
        let cols = columns(&["name", "price", "status"]);
        let cells = vec!["Sugar 1kg".to_string(), "$45.50".to_string(), "Available".to_string()];
        let request = row_to_request(&cols, &cells, Some(seller)).unwrap();
        assert_eq!(request.seller_id, seller);
        assert_eq!(request.price, dec!(45.50));
        assert_eq!(request.status, Some(ProductStatus::Available));
        assert!(!request.force);
    }

    #[test]
    fn row_errors_name_the_bad_cell() {
        let cols = columns(&["name", "price"]);
        let err = row_to_request(&cols, &["Tea".into(), "cheap".into()], Some(Uuid::new_v4()))
            .unwrap_err();
        assert!(err.contains("cheap"));
        let err = row_to_request(&cols, &["Tea".into(), "10".into()], None).unwrap_err();
        assert!(err.contains("seller_id"));
    }

    #[test]
    fn repeated_names_in_one_file_are_reported() {
        let seller = Uuid::new_v4();
        let other_seller = Uuid::new_v4();
        let cols = columns(&["name", "price", "seller_id"]);
        let rows: Vec<Vec<String>> = [
            ("Sugar 1kg", seller),
            ("Tea 250g", seller),
            (" sugar 1KG ", seller),
            ("Sugar 1kg", other_seller),
        ]
        .iter()
        .map(|(name, seller)| vec![name.to_string(), "45".to_string(), seller.to_string()])
        .collect();

        let results = dedupe_rows(
            rows.iter()
                .map(|cells| row_to_request(&cols, cells, None))
                .collect(),
        );
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert_eq!(results[2].as_ref().unwrap_err(), "duplicate of row 1");
        assert!(results[3].is_ok());
    }

    proptest! {
        #[test]
        fn preview_returns_one_object_per_data_row(rows in 1usize..40) {
            let mut csv = String::from("name,price\n");
            for i in 0..rows {
                csv.push_str(&format!("Item {},{}\n", i, i + 1));
            }
            let preview = parse_csv_preview(csv.as_bytes(), usize::MAX).unwrap();
            prop_assert_eq!(preview.rows.len(), rows);
            prop_assert!(preview.rows.iter().all(|r| r.len() == 2));
        }
    }
}
