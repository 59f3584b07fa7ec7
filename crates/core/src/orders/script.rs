//! Order script builder
//!
//! Produces the tagged statements of the order-placement protocol. The
//! statements are issued one by one on a single session inside one explicit
//! transaction; later statements take the order id returned by the header
//! insert as a parameter.
//!
//! Protocol outline:
//! 1. `#ArticleList` temp table, filled in chunks of at most
//!    [`ARTICLE_ROWS_PER_INSERT`] rows
//! 2. order header, returning `kAuftrag`
//! 3. billing and shipping address
//! 4. one joined query resolving article number, description and tax rate
//!    for every article-list row, then one position insert per row
//! 5. totals recalculation, temp table drop, final select

use dealbridge_domain::constants::{
    ADDRESS_TYPE_BILLING, ADDRESS_TYPE_SHIPPING, ARTICLE_ROWS_PER_INSERT,
};
use dealbridge_domain::{
    split_salutation, ArticleListEntry, Customer, DealBridgeError, ResolvedArticle, Result,
};
use rust_decimal::Decimal;

use crate::erp::{SqlRow, SqlValue, Statement, StatementKind};

const CREATE_ARTICLE_LIST: &str = "\
IF OBJECT_ID('tempdb..#ArticleList') IS NOT NULL DROP TABLE #ArticleList;
CREATE TABLE #ArticleList (
    kArtikel INT NOT NULL,
    fAnzahl DECIMAL(25, 13) NOT NULL,
    fVKNetto DECIMAL(25, 13) NOT NULL,
    nSort INT NOT NULL PRIMARY KEY
);";

const INSERT_HEADER: &str = "\
INSERT INTO Verkauf.tAuftrag
    (kKunde, kFirma, kWarenLager, kZahlungsart, kVersandart, kSprache,
     cWaehrung, fFaktor, cAuftragsNr, dErstellt, nType)
OUTPUT INSERTED.kAuftrag
VALUES (@P1, @P2, @P3, @P4, @P5, @P6, @P7, @P8, @P9, SYSDATETIME(), 1)";

const INSERT_ADDRESS: &str = "\
INSERT INTO Verkauf.tAuftragAdresse
    (kAuftrag, kKunde, nTyp, cFirma, cAnrede, cTitel, cVorname, cName,
     cStrasse, cPLZ, cOrt, cLand, cISO, cTel, cMail)
VALUES (@P1, @P2, @P3, @P4, @P5, @P6, @P7, @P8, @P9, @P10, @P11, @P12, @P13, @P14, @P15)";

const RESOLVE_ARTICLES: &str = "\
SELECT al.nSort, al.kArtikel, a.cArtNr, ISNULL(b.cName, a.cArtNr) AS cName,
       a.kSteuerklasse, ISNULL(rate.fSteuersatz, 0) AS fSteuersatz,
       al.fAnzahl, al.fVKNetto
FROM #ArticleList al
LEFT JOIN dbo.tArtikel a ON a.kArtikel = al.kArtikel
LEFT JOIN dbo.tArtikelBeschreibung b
    ON b.kArtikel = al.kArtikel AND b.kSprache = @P1 AND b.kPlattform = 1
OUTER APPLY (
    SELECT TOP 1 st.fSteuersatz
    FROM dbo.tSteuersatz st
    JOIN dbo.tSteuerzone z ON z.kSteuerzone = st.kSteuerzone AND z.kFirma = @P2
    WHERE st.kSteuerklasse = a.kSteuerklasse
    ORDER BY
        CASE WHEN EXISTS (
            SELECT 1 FROM dbo.tSteuerzoneLand zl
            WHERE zl.kSteuerzone = z.kSteuerzone AND zl.cISO = @P3
        ) THEN 0 ELSE 1 END,
        st.nPrio DESC
) rate
ORDER BY al.nSort";

const INSERT_POSITION: &str = "\
INSERT INTO Verkauf.tAuftragPosition
    (kAuftrag, kArtikel, cArtNr, cName, fAnzahl, fVkNetto, fMwSt, kSteuerklasse, nSort, nType)
VALUES (@P1, @P2, @P3, @P4, @P5, @P6, @P7, @P8, @P9, 1)";

const RECALCULATE_TOTALS: &str = "EXEC Verkauf.spAuftragEckdatenBerechnen @kAuftrag = @P1";

const DROP_ARTICLE_LIST: &str = "DROP TABLE #ArticleList";

const SELECT_RESULT: &str = "SELECT kAuftrag, cAuftragsNr FROM Verkauf.tAuftrag WHERE kAuftrag = @P1";

/// Header values of one order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHeader {
    pub erp_customer_id: i32,
    pub legal_entity_id: i32,
    pub warehouse_id: i32,
    pub payment_method_id: i32,
    pub shipping_method_id: i32,
    pub language_id: i32,
    pub currency_code: String,
    pub currency_factor: Decimal,
    pub order_number: String,
}

/// All statements for placing one order
#[derive(Debug, Clone)]
pub struct OrderScript {
    header: OrderHeader,
    customer: Customer,
    articles: Vec<ArticleListEntry>,
}

impl OrderScript {
    pub fn new(header: OrderHeader, customer: Customer, articles: Vec<ArticleListEntry>) -> Self {
        Self { header, customer, articles }
    }

    #[must_use]
    pub fn header(&self) -> &OrderHeader {
        &self.header
    }

    #[must_use]
    pub fn articles(&self) -> &[ArticleListEntry] {
        &self.articles
    }

    #[must_use]
    pub fn create_article_list(&self) -> Statement {
        Statement::new(StatementKind::CreateArticleList, CREATE_ARTICLE_LIST)
    }

    /// Multi-row inserts of the article list, preserving input order.
    #[must_use]
    pub fn fill_article_list(&self) -> Vec<Statement> {
        self.articles
            .chunks(ARTICLE_ROWS_PER_INSERT)
            .map(|chunk| {
                let mut sql =
                    String::from("INSERT INTO #ArticleList (kArtikel, fAnzahl, fVKNetto, nSort) VALUES ");
                let mut params = Vec::with_capacity(chunk.len() * 4);
                for (row, entry) in chunk.iter().enumerate() {
                    let base = row * 4;
                    if row > 0 {
                        sql.push_str(", ");
                    }
                    sql.push_str(&format!(
                        "(@P{}, @P{}, @P{}, @P{})",
                        base + 1,
                        base + 2,
                        base + 3,
                        base + 4
                    ));
                    params.push(SqlValue::Int(entry.erp_article_id));
                    params.push(SqlValue::Decimal(entry.quantity));
                    params.push(SqlValue::Decimal(entry.unit_price_net));
                    params.push(SqlValue::Int(entry.sequence_number));
                }
                Statement::new(StatementKind::FillArticleList, sql).with_params(params)
            })
            .collect()
    }

    #[must_use]
    pub fn insert_header(&self) -> Statement {
        let h = &self.header;
        Statement::new(StatementKind::InsertHeader, INSERT_HEADER).with_params(vec![
            SqlValue::Int(h.erp_customer_id),
            SqlValue::Int(h.legal_entity_id),
            SqlValue::Int(h.warehouse_id),
            SqlValue::Int(h.payment_method_id),
            SqlValue::Int(h.shipping_method_id),
            SqlValue::Int(h.language_id),
            SqlValue::Text(h.currency_code.clone()),
            SqlValue::Decimal(h.currency_factor),
            SqlValue::Text(h.order_number.clone()),
        ])
    }

    /// Billing (type 1) then shipping (type 0) address, both from the
    /// customer's contact data.
    #[must_use]
    pub fn insert_addresses(&self, order_id: i32) -> [Statement; 2] {
        [self.address(order_id, ADDRESS_TYPE_BILLING), self.address(order_id, ADDRESS_TYPE_SHIPPING)]
    }

    fn address(&self, order_id: i32, address_type: i32) -> Statement {
        let c = &self.customer;
        let parts = split_salutation(c.salutation.as_deref().unwrap_or_default());
        Statement::new(StatementKind::InsertAddress, INSERT_ADDRESS).with_params(vec![
            SqlValue::Int(order_id),
            SqlValue::Int(self.header.erp_customer_id),
            SqlValue::Int(address_type),
            SqlValue::opt_text(c.company.as_deref()),
            SqlValue::opt_text(parts.salutation.as_deref()),
            SqlValue::opt_text(parts.title.as_deref()),
            SqlValue::opt_text(c.first_name.as_deref()),
            SqlValue::opt_text(c.last_name.as_deref()),
            SqlValue::opt_text(c.street.as_deref()),
            SqlValue::opt_text(c.postal_code.as_deref()),
            SqlValue::opt_text(c.city.as_deref()),
            SqlValue::opt_text(c.country.as_deref()),
            SqlValue::opt_text(c.country_iso.as_deref()),
            SqlValue::opt_text(c.phone.as_deref()),
            SqlValue::opt_text(c.email.as_deref()),
        ])
    }

    /// Resolves number, description and tax rate for every list row.
    ///
    /// The rate comes from the legal entity's tax zone covering the
    /// customer's country (`cISO`). Without an ISO code, or when no zone
    /// covers it, the highest-priority rate of any zone of the legal entity
    /// is used.
    #[must_use]
    pub fn resolve_articles(&self) -> Statement {
        let country_iso = self
            .customer
            .country_iso
            .as_deref()
            .map(str::trim)
            .filter(|iso| !iso.is_empty())
            .map(str::to_uppercase);
        Statement::new(StatementKind::ResolveArticles, RESOLVE_ARTICLES).with_params(vec![
            SqlValue::Int(self.header.language_id),
            SqlValue::Int(self.header.legal_entity_id),
            country_iso.map_or(SqlValue::Null, SqlValue::Text),
        ])
    }

    #[must_use]
    pub fn insert_position(&self, order_id: i32, article: &ResolvedArticle) -> Statement {
        Statement::new(StatementKind::InsertPosition, INSERT_POSITION).with_params(vec![
            SqlValue::Int(order_id),
            SqlValue::Int(article.erp_article_id),
            SqlValue::Text(article.article_number.clone()),
            SqlValue::Text(article.description.clone()),
            SqlValue::Decimal(article.quantity),
            SqlValue::Decimal(article.unit_price_net),
            SqlValue::Decimal(article.tax_rate),
            SqlValue::from(article.tax_class_id),
            SqlValue::Int(article.sequence_number),
        ])
    }

    #[must_use]
    pub fn recalculate_totals(&self, order_id: i32) -> Statement {
        Statement::new(StatementKind::RecalculateTotals, RECALCULATE_TOTALS)
            .with_params(vec![SqlValue::Int(order_id)])
    }

    #[must_use]
    pub fn drop_article_list(&self) -> Statement {
        Statement::new(StatementKind::DropArticleList, DROP_ARTICLE_LIST)
    }

    #[must_use]
    pub fn select_result(&self, order_id: i32) -> Statement {
        Statement::new(StatementKind::SelectResult, SELECT_RESULT)
            .with_params(vec![SqlValue::Int(order_id)])
    }

    /// Order id from the header insert's `OUTPUT` row.
    pub fn parse_order_id(rows: &[SqlRow]) -> Result<i32> {
        rows.first().and_then(|row| row.get_i32(0)).ok_or_else(|| {
            DealBridgeError::Transaction("order header insert returned no order id".to_string())
        })
    }

    /// Resolved rows in sequence order. An article unknown to the ERP, or a
    /// row count that does not match the article list, fails the order.
    pub fn parse_resolved(&self, rows: &[SqlRow]) -> Result<Vec<ResolvedArticle>> {
        if rows.len() != self.articles.len() {
            return Err(DealBridgeError::Transaction(format!(
                "article resolution returned {} rows for {} order lines",
                rows.len(),
                self.articles.len()
            )));
        }

        let mut resolved = rows
            .iter()
            .map(|row| {
                let sequence_number = row.get_i32(0).ok_or_else(|| malformed("nSort"))?;
                let erp_article_id = row.get_i32(1).ok_or_else(|| malformed("kArtikel"))?;
                let article_number = row.get_str(2).ok_or_else(|| {
                    DealBridgeError::Transaction(format!(
                        "article {erp_article_id} does not exist in the ERP"
                    ))
                })?;
                Ok(ResolvedArticle {
                    sequence_number,
                    erp_article_id,
                    article_number: article_number.to_string(),
                    description: row.get_str(3).unwrap_or(article_number).to_string(),
                    tax_class_id: row.get_i32(4),
                    tax_rate: row.get_decimal(5).unwrap_or(Decimal::ZERO),
                    quantity: row.get_decimal(6).ok_or_else(|| malformed("fAnzahl"))?,
                    unit_price_net: row.get_decimal(7).ok_or_else(|| malformed("fVKNetto"))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        resolved.sort_by_key(|article| article.sequence_number);
        Ok(resolved)
    }

    /// `(kAuftrag, cAuftragsNr)` from the final select.
    pub fn parse_result(rows: &[SqlRow]) -> Result<(i32, String)> {
        let row = rows.first().ok_or_else(|| {
            DealBridgeError::Transaction("order result select returned no rows".to_string())
        })?;
        let order_id = row.get_i32(0).ok_or_else(|| malformed("kAuftrag"))?;
        let order_number = row.get_str(1).ok_or_else(|| malformed("cAuftragsNr"))?;
        Ok((order_id, order_number.to_string()))
    }
}

fn malformed(column: &str) -> DealBridgeError {
    DealBridgeError::Transaction(format!("unexpected value in column {column}"))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn header() -> OrderHeader {
        OrderHeader {
            erp_customer_id: 501,
            legal_entity_id: 1,
            warehouse_id: 2,
            payment_method_id: 3,
            shipping_method_id: 4,
            language_id: 1,
            currency_code: "EUR".into(),
            currency_factor: Decimal::ONE,
            order_number: "EXTERN-20261019-N0001".into(),
        }
    }

    fn entries(count: usize) -> Vec<ArticleListEntry> {
        (1..=count)
            .map(|n| ArticleListEntry {
                erp_article_id: i32::try_from(n).unwrap() + 100,
                quantity: Decimal::ONE,
                unit_price_net: Decimal::from_str("9.99").unwrap(),
                sequence_number: i32::try_from(n).unwrap(),
            })
            .collect()
    }

    fn script(count: usize) -> OrderScript {
        let customer = Customer {
            id: 7,
            erp_customer_id: Some(501),
            salutation: Some("Herr Dr.".into()),
            first_name: Some("Max".into()),
            last_name: Some("Mustermann".into()),
            company: Some("  ".into()),
            ..Customer::default()
        };
        OrderScript::new(header(), customer, entries(count))
    }

    #[test]
    fn fill_chunks_respect_parameter_cap() {
        let statements = script(1_001).fill_article_list();

        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0].params.len(), 2_000);
        assert_eq!(statements[2].params.len(), 4);
        assert!(statements.iter().all(|s| s.params.len() < 2_100));
        assert!(statements[0].sql.ends_with("(@P1997, @P1998, @P1999, @P2000)"));
    }

    #[test]
    fn fill_keeps_sequence_numbers() {
        let statements = script(2).fill_article_list();
        let params = &statements[0].params;

        assert_eq!(params[0], SqlValue::Int(101));
        assert_eq!(params[3], SqlValue::Int(1));
        assert_eq!(params[7], SqlValue::Int(2));
    }

    #[test]
    fn addresses_split_salutation_and_null_blank_fields() {
        let [billing, shipping] = script(1).insert_addresses(77);

        assert_eq!(billing.params[2], SqlValue::Int(ADDRESS_TYPE_BILLING));
        assert_eq!(shipping.params[2], SqlValue::Int(ADDRESS_TYPE_SHIPPING));
        assert_eq!(billing.params[3], SqlValue::Null);
        assert_eq!(billing.params[4], SqlValue::Text("Herr".into()));
        assert_eq!(billing.params[5], SqlValue::Text("Dr.".into()));
        assert_eq!(billing.params[7], SqlValue::Text("Mustermann".into()));
    }

    #[test]
    fn tax_rate_lookup_prefers_the_delivery_country_zone() {
        let mut order = script(1);
        order.customer.country_iso = Some(" at ".into());

        let statement = order.resolve_articles();

        assert!(statement.sql.contains("zl.cISO = @P3"));
        assert_eq!(statement.params[1], SqlValue::Int(header().legal_entity_id));
        assert_eq!(statement.params[2], SqlValue::Text("AT".into()));
    }

    #[test]
    fn tax_rate_lookup_without_country_falls_back_to_any_zone() {
        let statement = script(1).resolve_articles();

        assert_eq!(statement.params.len(), 3);
        assert_eq!(statement.params[2], SqlValue::Null);
    }

    #[test]
    fn header_carries_ids_currency_and_number() {
        let statement = script(1).insert_header();

        assert!(statement.sql.contains("OUTPUT INSERTED.kAuftrag"));
        assert_eq!(statement.params[0], SqlValue::Int(501));
        assert_eq!(statement.params[6], SqlValue::Text("EUR".into()));
        assert_eq!(statement.params[8], SqlValue::Text("EXTERN-20261019-N0001".into()));
    }

    #[test]
    fn unknown_article_fails_resolution() {
        let script = script(1);
        let rows = vec![SqlRow::new(vec![
            SqlValue::Int(1),
            SqlValue::Int(101),
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Decimal(Decimal::ZERO),
            SqlValue::Decimal(Decimal::ONE),
            SqlValue::Decimal(Decimal::ONE),
        ])];

        let err = script.parse_resolved(&rows).unwrap_err();

        assert!(err.to_string().contains("article 101 does not exist"));
    }

    #[test]
    fn resolution_sorts_by_sequence_number() {
        let script = script(2);
        let row = |seq: i32, article: i32| {
            SqlRow::new(vec![
                SqlValue::Int(seq),
                SqlValue::Int(article),
                SqlValue::Text(format!("A-{article}")),
                SqlValue::Null,
                SqlValue::Int(1),
                SqlValue::Decimal(Decimal::from(19)),
                SqlValue::Decimal(Decimal::ONE),
                SqlValue::Decimal(Decimal::TEN),
            ])
        };

        let resolved = script.parse_resolved(&[row(2, 102), row(1, 101)]).unwrap();

        assert_eq!(resolved[0].erp_article_id, 101);
        assert_eq!(resolved[1].erp_article_id, 102);
        assert_eq!(resolved[0].description, "A-101");
    }

    #[test]
    fn resolution_row_count_must_match() {
        assert!(script(2).parse_resolved(&[]).is_err());
    }

    #[test]
    fn result_parsing_requires_both_columns() {
        let rows = vec![SqlRow::new(vec![SqlValue::Int(77), SqlValue::Text("EXTERN-1".into())])];
        assert_eq!(OrderScript::parse_result(&rows).unwrap(), (77, "EXTERN-1".to_string()));

        let missing = vec![SqlRow::new(vec![SqlValue::Int(77), SqlValue::Null])];
        assert!(OrderScript::parse_result(&missing).is_err());
        assert!(OrderScript::parse_order_id(&[]).is_err());
    }
}
