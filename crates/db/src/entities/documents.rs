//! `SeaORM` Entity for the documents table.
//!
//! Every record lives in one row keyed by `(collection, id)`. The JSON body is
//! the source of truth; the projected columns only exist so the access paths
//! of the ledger can be indexed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub version: i64,
    #[sea_orm(column_type = "JsonBinary")]
    pub body: Json,
    pub entry_date: Option<Date>,
    pub entry_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub payment_status: Option<String>,
    pub request_status: Option<String>,
    pub ledger_entry_id: Option<Uuid>,
    pub counterparty_kind: Option<String>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
