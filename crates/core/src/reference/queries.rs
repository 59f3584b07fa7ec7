//! Read-only lookup queries against the ERP schema

use dealbridge_domain::ReferenceKind;

use crate::erp::{Statement, StatementKind};

/// Query returning `(id, name)` rows for one lookup table, filtered to
/// active rows where the table has an activity flag.
#[must_use]
pub fn fetch_statement(kind: ReferenceKind) -> Statement {
    let sql = match kind {
        ReferenceKind::LegalEntity => "SELECT kFirma, cName FROM dbo.tFirma",
        ReferenceKind::Warehouse => {
            "SELECT kWarenLager, cName FROM dbo.tWarenLager WHERE nAktiv = 1"
        }
        ReferenceKind::PaymentMethod => {
            "SELECT kZahlungsart, cName FROM dbo.tZahlungsart WHERE nAktiv = 1"
        }
        ReferenceKind::ShippingMethod => {
            "SELECT kVersandArt, cName FROM dbo.tversandart WHERE cAktiv = 'Y'"
        }
    };
    Statement::new(StatementKind::FetchReference(kind), sql)
}
