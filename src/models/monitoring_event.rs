//! Base record extracted from the Finishing/Printing `monitoringevent` table.

use sea_orm::prelude::DateTimeUtc;
use sea_orm::{DbErr, FromQueryResult, QueryResult};

pub const TABLE: &str = "monitoringevent";

pub const COLUMNS: [&str; 16] = [
    "cartNumber",
    "code",
    "dateStart",
    "timeInMilisStart",
    "timeInMilisEnd",
    "dateEnd",
    "productionOrderId",
    "productionOrderOrderNo",
    "remark",
    "machineId",
    "machineName",
    "machineEventName",
    "machineEventId",
    "createdBy",
    "isDeleted",
    "machineEventCategory",
];

/// One monitoring event row before enrichment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MonitoringEvent {
    pub cart_number: Option<String>,
    pub code: Option<String>,
    pub date_start: Option<DateTimeUtc>,
    /// Millisecond instant; only its time of day is meaningful.
    pub time_in_millis_start: Option<i64>,
    pub time_in_millis_end: Option<i64>,
    pub date_end: Option<DateTimeUtc>,
    pub production_order_id: Option<i64>,
    pub production_order_order_no: Option<String>,
    pub remark: Option<String>,
    pub machine_id: Option<i64>,
    pub machine_name: Option<String>,
    pub machine_event_name: Option<String>,
    pub machine_event_id: Option<i64>,
    pub created_by: Option<String>,
    pub is_deleted: Option<bool>,
    pub machine_event_category: Option<String>,
}

impl FromQueryResult for MonitoringEvent {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            cart_number: res.try_get(pre, "cartNumber")?,
            code: res.try_get(pre, "code")?,
            date_start: res.try_get(pre, "dateStart")?,
            time_in_millis_start: res.try_get(pre, "timeInMilisStart")?,
            time_in_millis_end: res.try_get(pre, "timeInMilisEnd")?,
            date_end: res.try_get(pre, "dateEnd")?,
            production_order_id: res.try_get(pre, "productionOrderId")?,
            production_order_order_no: res.try_get(pre, "productionOrderOrderNo")?,
            remark: res.try_get(pre, "remark")?,
            machine_id: res.try_get(pre, "machineId")?,
            machine_name: res.try_get(pre, "machineName")?,
            machine_event_name: res.try_get(pre, "machineEventName")?,
            machine_event_id: res.try_get(pre, "machineEventId")?,
            created_by: res.try_get(pre, "createdBy")?,
            is_deleted: res.try_get(pre, "isDeleted")?,
            machine_event_category: res.try_get(pre, "machineEventCategory")?,
        })
    }
}
