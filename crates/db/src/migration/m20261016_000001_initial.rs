//! Initial database migration.
//!
//! Creates the documents table, the version sequence and the indexes behind
//! the ledger's access paths.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DOCUMENTS_SQL).await?;
        db.execute_unprepared(INDEXES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS documents CASCADE; DROP SEQUENCE IF EXISTS document_version_seq;",
        )
        .await?;
        Ok(())
    }
}

const DOCUMENTS_SQL: &str = r"
-- Versions come from one sequence so a recreated record never reuses a version
CREATE SEQUENCE document_version_seq AS BIGINT START 1;

CREATE TABLE documents (
    collection VARCHAR(32) NOT NULL,
    id UUID NOT NULL,
    company_id UUID NOT NULL,
    version BIGINT NOT NULL,
    body JSONB NOT NULL,
    entry_date DATE,
    entry_type VARCHAR(16),
    entity_id UUID,
    payment_status VARCHAR(16),
    request_status VARCHAR(16),
    ledger_entry_id UUID,
    counterparty_kind VARCHAR(16),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (collection, id),
    CONSTRAINT chk_version_positive CHECK (version > 0)
);
";

const INDEXES_SQL: &str = r"
-- Daily listing for admins
CREATE INDEX idx_documents_entry_date ON documents(company_id, entry_date)
    WHERE collection = 'ledger_entries';

-- Daily listing for store managers, one type at a time
CREATE INDEX idx_documents_entry_date_type ON documents(company_id, entry_date, entry_type)
    WHERE collection = 'ledger_entries';

-- Outstanding balances of one counterparty
CREATE INDEX idx_documents_outstanding ON documents(company_id, entity_id, entry_type, payment_status)
    WHERE collection = 'ledger_entries';

-- Payment history of one counterparty
CREATE INDEX idx_documents_payment_entity ON documents(company_id, entity_id)
    WHERE collection = 'payment_records';

-- Approval queue
CREATE INDEX idx_documents_request_status ON documents(company_id, request_status)
    WHERE collection = 'update_requests';

-- Audit trail of one entry
CREATE INDEX idx_documents_audit_entry ON documents(company_id, ledger_entry_id)
    WHERE collection = 'audit_logs';

-- Directory listing by kind
CREATE INDEX idx_documents_counterparty_kind ON documents(company_id, counterparty_kind)
    WHERE collection = 'counterparties';
";
