//! # Invoice Repository
//!
//! Database operations for invoices and their frozen line items.
//!
//! ## Invoice Lifecycle in Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Invoice Lifecycle                                 │
//! │                                                                         │
//! │  1. INSERT (one transaction)                                           │
//! │     └── next number INV-YYYYMMDD-NNNN                                  │
//! │     └── invoices row  (status = draft, due = date + terms)             │
//! │     └── invoice_items rows (one per submitted line, in order)          │
//! │                                                                         │
//! │  2. READ                                                               │
//! │     └── get_by_id / list (filter, search, sort, paginate) / stats      │
//! │                                                                         │
//! │  3. STATUS UPDATE (last write wins)                                    │
//! │     └── update_status() → only status + updated_at change              │
//! │                                                                         │
//! │  4. DELETE                                                             │
//! │     └── invoice_items removed by ON DELETE CASCADE                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Items, percentages and totals are copied at submission. Nothing but the
//! status is ever updated, so a stored invoice always re-renders the same.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::editor::Submission;
use tally_core::{
    Customer, Invoice, InvoiceItem, InvoiceStatus, Money, Percentage, ValidationError, DEFAULT_PAGE_SIZE,
};

/// Retries when two inserts race for the same invoice number.
const MAX_NUMBERING_ATTEMPTS: u32 = 3;

/// Pause before retrying a contended insert, multiplied by the attempt.
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

const INVOICE_COLUMNS: &str = "id, invoice_number, customer_name, customer_email, customer_phone, \
     customer_address, invoice_date, due_date, discount_bps, discount_amount_cents, tax_rate_bps, \
     tax_amount_cents, subtotal_cents, total_cents, notes, status, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "invoice_id, item_id, name, description, category, quantity, rate_cents, total_cents";

// =============================================================================
// Query Types
// =============================================================================

/// Column a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    InvoiceDate,
    DueDate,
    Total,
    CustomerName,
    InvoiceNumber,
}

impl SortKey {
    fn column(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::InvoiceDate => "invoice_date",
            SortKey::DueDate => "due_date",
            SortKey::Total => "total_cents",
            SortKey::CustomerName => "customer_name COLLATE NOCASE",
            SortKey::InvoiceNumber => "invoice_number",
        }
    }
}

/// Accepts both `created_at` and `createdAt` spellings.
impl FromStr for SortKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" | "createdAt" => Ok(SortKey::CreatedAt),
            "invoice_date" | "invoiceDate" => Ok(SortKey::InvoiceDate),
            "due_date" | "dueDate" => Ok(SortKey::DueDate),
            "total" => Ok(SortKey::Total),
            "customer_name" | "customerName" => Ok(SortKey::CustomerName),
            "invoice_number" | "invoiceNumber" => Ok(SortKey::InvoiceNumber),
            _ => Err(ValidationError::NotAllowed {
                field: "sortBy".to_string(),
                allowed: [
                    "created_at",
                    "invoice_date",
                    "due_date",
                    "total",
                    "customer_name",
                    "invoice_number",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError::NotAllowed {
                field: "sortOrder".to_string(),
                allowed: vec!["asc".to_string(), "desc".to_string()],
            }),
        }
    }
}

/// Dashboard listing parameters.
///
/// `page` is 1-based. `status: None` means every status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            status: None,
            sort_by: SortKey::default(),
            sort_order: SortOrder::default(),
        }
    }
}

/// Page metadata returned with every listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub items_per_page: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(current_page: u32, items_per_page: u32, total_items: u64) -> Self {
        let per_page = u64::from(items_per_page.max(1));
        let total_pages = total_items.div_ceil(per_page).min(u64::from(u32::MAX)) as u32;
        Pagination {
            current_page,
            total_pages,
            total_items,
            items_per_page,
            has_next_page: current_page < total_pages,
            has_prev_page: current_page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePage {
    pub invoices: Vec<Invoice>,
    pub pagination: Pagination,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStats {
    pub total_invoices: i64,
    /// Sum of totals of paid invoices.
    pub total_revenue: Money,
    pub paid_invoices: i64,
    /// Draft and sent.
    pub pending_invoices: i64,
    pub overdue_invoices: i64,
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    customer_name: String,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    customer_address: Option<String>,
    invoice_date: NaiveDate,
    due_date: NaiveDate,
    discount_bps: i64,
    discount_amount_cents: i64,
    tax_rate_bps: i64,
    tax_amount_cents: i64,
    subtotal_cents: i64,
    total_cents: i64,
    notes: Option<String>,
    status: InvoiceStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self, items: Vec<InvoiceItem>) -> DbResult<Invoice> {
        let id = Uuid::parse_str(&self.id).map_err(|e| DbError::corrupt("invoice", e))?;
        Ok(Invoice {
            id,
            invoice_number: self.invoice_number,
            customer: Customer {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
                address: self.customer_address,
            },
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            items,
            discount: Percentage::from_bps(self.discount_bps),
            discount_amount: Money::from_cents(self.discount_amount_cents),
            tax_rate: Percentage::from_bps(self.tax_rate_bps),
            tax_amount: Money::from_cents(self.tax_amount_cents),
            subtotal: Money::from_cents(self.subtotal_cents),
            total: Money::from_cents(self.total_cents),
            notes: self.notes,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    invoice_id: String,
    item_id: i64,
    name: String,
    description: Option<String>,
    category: String,
    quantity: i64,
    rate_cents: i64,
    total_cents: i64,
}

impl ItemRow {
    fn into_item(self) -> DbResult<(String, InvoiceItem)> {
        let category = self
            .category
            .parse()
            .map_err(|e| DbError::corrupt("invoice_item", e))?;
        let quantity = u32::try_from(self.quantity).map_err(|e| DbError::corrupt("invoice_item", e))?;
        let item = InvoiceItem {
            item_id: self.item_id.max(0) as u64,
            name: self.name,
            description: self.description,
            category,
            quantity,
            rate: Money::from_cents(self.rate_cents),
            total: Money::from_cents(self.total_cents),
        };
        Ok((self.invoice_id, item))
    }
}

#[derive(Debug, FromRow)]
struct StatsRow {
    total_invoices: i64,
    total_revenue_cents: i64,
    paid_invoices: i64,
    pending_invoices: i64,
    overdue_invoices: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
    payment_terms_days: u32,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool, payment_terms_days: u32) -> Self {
        InvoiceRepository {
            pool,
            payment_terms_days,
        }
    }

    /// Persists a submitted draft as a new invoice.
    ///
    /// ## What This Does
    /// 1. Takes the write lock up front (`BEGIN IMMEDIATE`)
    /// 2. Assigns the next `INV-YYYYMMDD-NNNN` number for today
    /// 3. Derives the due date from the payment terms
    /// 4. Writes the invoice and its items in the same transaction
    ///
    /// A lost numbering race (UNIQUE violation) or a busy database is
    /// retried with a fresh number.
    pub async fn insert(&self, submission: &Submission) -> DbResult<Invoice> {
        let mut attempt = 1;
        loop {
            match self.try_insert(submission).await {
                Err(e) if attempt < MAX_NUMBERING_ATTEMPTS && is_retryable_insert(&e) => {
                    warn!(attempt, error = %e, "Invoice insert contended, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_insert(&self, submission: &Submission) -> DbResult<Invoice> {
        let now = Utc::now();
        // The numbering read must not run under a shared lock that later
        // needs upgrading; SQLite refuses that upgrade with SQLITE_BUSY.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let invoice_number = next_invoice_number(&mut *tx, now.date_naive()).await?;
        let invoice = Invoice {
            id: Uuid::new_v4(),
            invoice_number,
            customer: submission.customer.clone(),
            invoice_date: submission.invoice_date,
            due_date: submission.due_date(self.payment_terms_days),
            items: submission.items.clone(),
            discount: submission.discount,
            discount_amount: submission.totals.discount_amount,
            tax_rate: submission.tax_rate,
            tax_amount: submission.totals.tax_amount,
            subtotal: submission.totals.subtotal,
            total: submission.totals.total,
            notes: submission.notes.clone(),
            status: InvoiceStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %invoice.id, invoice_number = %invoice.invoice_number, "Inserting invoice");

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number,
                customer_name, customer_email, customer_phone, customer_address,
                invoice_date, due_date,
                discount_bps, discount_amount_cents, tax_rate_bps, tax_amount_cents,
                subtotal_cents, total_cents,
                notes, status, created_at, updated_at
            ) VALUES (
                ?1, ?2,
                ?3, ?4, ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14,
                ?15, ?16, ?17, ?18
            )
            "#,
        )
        .bind(invoice.id.to_string())
        .bind(&invoice.invoice_number)
        .bind(&invoice.customer.name)
        .bind(&invoice.customer.email)
        .bind(&invoice.customer.phone)
        .bind(&invoice.customer.address)
        .bind(invoice.invoice_date)
        .bind(invoice.due_date)
        .bind(invoice.discount.bps())
        .bind(invoice.discount_amount.cents())
        .bind(invoice.tax_rate.bps())
        .bind(invoice.tax_amount.cents())
        .bind(invoice.subtotal.cents())
        .bind(invoice.total.cents())
        .bind(&invoice.notes)
        .bind(invoice.status)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in invoice.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    invoice_id, position, item_id, name, description, category,
                    quantity, rate_cents, total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(invoice.id.to_string())
            .bind(position as i64)
            .bind(item.item_id as i64)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.category.as_str())
            .bind(i64::from(item.quantity))
            .bind(item.rate.cents())
            .bind(item.total.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(invoice)
    }

    /// Gets an invoice with its items.
    pub async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Invoice>> {
        let row: Option<InvoiceRow> =
            sqlx::query_as(&format!("SELECT {} FROM invoices WHERE id = ?1", INVOICE_COLUMNS))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.items_for(std::slice::from_ref(&row.id)).await?;
        let own_items = items.remove(&row.id).unwrap_or_default();
        row.into_invoice(own_items).map(Some)
    }

    /// Lists invoices for the dashboard.
    ///
    /// ## Query Shape
    /// ```text
    /// WHERE status = ?            (when a status is given)
    ///   AND (invoice_number LIKE ? OR customer_name LIKE ? OR customer_email LIKE ?)
    /// ORDER BY <sort key> <direction>, id
    /// LIMIT ? OFFSET ?
    /// ```
    pub async fn list(&self, query: &ListQuery) -> DbResult<InvoicePage> {
        let page = query.page.max(1);
        let limit = query.limit.max(1);

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM invoices");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM invoices", INVOICE_COLUMNS));
        push_filters(&mut select, query);
        select.push(format!(
            " ORDER BY {} {}, id ASC",
            query.sort_by.column(),
            query.sort_order.keyword()
        ));
        select
            .push(" LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::from(page - 1) * i64::from(limit));

        let rows: Vec<InvoiceRow> = select.build_query_as().fetch_all(&self.pool).await?;

        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut items = self.items_for(&ids).await?;

        let invoices = rows
            .into_iter()
            .map(|row| {
                let own_items = items.remove(&row.id).unwrap_or_default();
                row.into_invoice(own_items)
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(page, limit, total, returned = invoices.len(), "Listed invoices");

        Ok(InvoicePage {
            invoices,
            pagination: Pagination::new(page, limit, total.max(0) as u64),
        })
    }

    /// Overwrites the status of an invoice.
    ///
    /// Last write wins. Whether the move is conventional is decided by the
    /// caller through `tally_core::status::request_transition`.
    pub async fn update_status(&self, id: Uuid, status: InvoiceStatus) -> DbResult<Invoice> {
        let result = sqlx::query("UPDATE invoices SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id.to_string()));
        }

        debug!(id = %id, status = %status, "Invoice status updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id.to_string()))
    }

    /// Deletes an invoice and (by cascade) its items.
    pub async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id.to_string()));
        }

        debug!(id = %id, "Invoice deleted");
        Ok(())
    }

    /// Counters for the dashboard header.
    pub async fn stats(&self) -> DbResult<InvoiceStats> {
        let row: StatsRow = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) AS total_invoices,
                COALESCE(SUM(CASE WHEN status = 'paid' THEN total_cents ELSE 0 END), 0) AS total_revenue_cents,
                COALESCE(SUM(CASE WHEN status = 'paid' THEN 1 ELSE 0 END), 0) AS paid_invoices,
                COALESCE(SUM(CASE WHEN status IN ('draft', 'sent') THEN 1 ELSE 0 END), 0) AS pending_invoices,
                COALESCE(SUM(CASE WHEN status = 'overdue' THEN 1 ELSE 0 END), 0) AS overdue_invoices
            FROM invoices
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(InvoiceStats {
            total_invoices: row.total_invoices,
            total_revenue: Money::from_cents(row.total_revenue_cents),
            paid_invoices: row.paid_invoices,
            pending_invoices: row.pending_invoices,
            overdue_invoices: row.overdue_invoices,
        })
    }

    /// Loads items for a set of invoices, keyed by invoice id, in line order.
    async fn items_for(&self, invoice_ids: &[String]) -> DbResult<HashMap<String, Vec<InvoiceItem>>> {
        let mut grouped: HashMap<String, Vec<InvoiceItem>> = HashMap::new();
        if invoice_ids.is_empty() {
            return Ok(grouped);
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM invoice_items WHERE invoice_id IN (",
            ITEM_COLUMNS
        ));
        let mut separated = builder.separated(", ");
        for id in invoice_ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(") ORDER BY invoice_id, position");

        let rows: Vec<ItemRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        for row in rows {
            let (invoice_id, item) = row.into_item()?;
            grouped.entry(invoice_id).or_default().push(item);
        }
        Ok(grouped)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ListQuery) {
    builder.push(" WHERE 1 = 1");

    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (invoice_number LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR customer_name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR customer_email LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// Escapes LIKE wildcards so user text matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_retryable_insert(err: &DbError) -> bool {
    match err {
        DbError::UniqueViolation { field, .. } => field.contains("invoice_number"),
        other => other.is_contention(),
    }
}

/// Next `INV-YYYYMMDD-NNNN` for the given day.
async fn next_invoice_number(conn: &mut SqliteConnection, day: NaiveDate) -> DbResult<String> {
    let prefix = InvoiceNumber::prefix(day);
    let last: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT MAX(CAST(substr(invoice_number, length(?1) + 1) AS INTEGER))
        FROM invoices
        WHERE invoice_number LIKE ?1 || '%'
        "#,
    )
    .bind(&prefix)
    .fetch_one(&mut *conn)
    .await?;

    Ok(InvoiceNumber::new(day, last.unwrap_or(0).max(0) as u32 + 1).to_string())
}

/// Human-readable invoice number.
struct InvoiceNumber {
    day: NaiveDate,
    sequence: u32,
}

impl InvoiceNumber {
    fn new(day: NaiveDate, sequence: u32) -> Self {
        InvoiceNumber { day, sequence }
    }

    fn prefix(day: NaiveDate) -> String {
        format!("INV-{}-", day.format("%Y%m%d"))
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", InvoiceNumber::prefix(self.day), self.sequence)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
