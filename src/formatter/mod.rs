//! # Record Formatter
//!
//! Turns an [`EnrichedEvent`] into a [`FormattedRow`] of warehouse literals.
//!
//! Formatting is pure. Absent source values and missing nested objects render as the
//! null marker. Dates and times are moved forward by [`WAREHOUSE_OFFSET_HOURS`] before
//! rendering; `eventRange` is computed from the unshifted values.

pub mod literal;

pub use literal::{Literal, NULL_MARKER};

use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};
use tracing::instrument;

use crate::error::{EtlError, FormatError};
use crate::models::{EnrichedEvent, MonitoringEvent};

/// Hours added to every rendered date and time.
pub const WAREHOUSE_OFFSET_HOURS: i64 = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// One warehouse row. Field order follows the staging contract's field catalogue.
#[derive(Clone, Debug, PartialEq)]
pub struct FormattedRow {
    pub cart_number: Literal,
    pub monitoring_event_code: Literal,
    pub monitoring_event_started_date: Literal,
    pub event_started_time: Literal,
    pub event_end_time: Literal,
    pub monitoring_event_end_date: Literal,
    pub machine_code: Literal,
    pub machine_condition: Literal,
    pub machine_manufacture: Literal,
    pub machine_name: Literal,
    pub machine_process: Literal,
    pub machine_step_process: Literal,
    pub unit_code: Literal,
    pub division_code: Literal,
    pub division_name: Literal,
    pub unit_name: Literal,
    pub machine_year: Literal,
    pub production_order_buyer_address: Literal,
    pub production_order_buyer_code: Literal,
    pub production_order_buyer_contact: Literal,
    pub production_order_buyer_country: Literal,
    pub production_order_buyer_name: Literal,
    pub production_order_buyer_tempo: Literal,
    pub production_order_construction: Literal,
    pub production_order_delivery_date: Literal,
    pub production_order_production_order_design: Literal,
    pub production_order_finish_width: Literal,
    pub production_order_handling_standard: Literal,
    pub production_order_material: Literal,
    pub production_order_order_no: Literal,
    pub production_order_order_quantity: Literal,
    pub production_order_order_type: Literal,
    pub production_order_origin_greige_fabric: Literal,
    pub production_order_process_type: Literal,
    pub production_order_remark: Literal,
    pub production_order_roll_length: Literal,
    pub production_order_run: Literal,
    pub production_order_sales_contract_no: Literal,
    pub production_order_sample: Literal,
    pub production_order_shrinkage_standard: Literal,
    pub production_order_spelling: Literal,
    pub production_order_uom: Literal,
    pub monitoring_event_remark: Literal,
    pub selected_production_order_detail_code: Literal,
    pub selected_production_order_detail_color_request: Literal,
    pub selected_production_order_detail_color_template: Literal,
    pub selected_production_order_detail_color_type_code: Literal,
    pub selected_production_order_detail_color_type_name: Literal,
    pub selected_production_order_detail_color_type_remark: Literal,
    pub selected_production_order_detail_quantity: Literal,
    pub selected_production_order_detail_uom: Literal,
    pub machine_event_name: Literal,
    pub event_range: Literal,
    pub machine_event_no: Literal,
    pub created_by: Literal,
    pub deleted: Literal,
    pub event_category: Literal,
}

impl FormattedRow {
    /// Every field paired with its warehouse name, in catalogue order.
    pub fn fields(&self) -> [(&'static str, &Literal); 57] {
        [
            ("cartNumber", &self.cart_number),
            ("monitoringEventCode", &self.monitoring_event_code),
            ("monitoringEventStartedDate", &self.monitoring_event_started_date),
            ("eventStartedTime", &self.event_started_time),
            ("eventEndTime", &self.event_end_time),
            ("monitoringEventEndDate", &self.monitoring_event_end_date),
            ("machineCode", &self.machine_code),
            ("machineCondition", &self.machine_condition),
            ("machineManufacture", &self.machine_manufacture),
            ("machineName", &self.machine_name),
            ("machineProcess", &self.machine_process),
            ("machineStepProcess", &self.machine_step_process),
            ("unitCode", &self.unit_code),
            ("divisionCode", &self.division_code),
            ("divisionName", &self.division_name),
            ("unitName", &self.unit_name),
            ("machineYear", &self.machine_year),
            ("productionOrderBuyerAddress", &self.production_order_buyer_address),
            ("productionOrderBuyerCode", &self.production_order_buyer_code),
            ("productionOrderBuyerContact", &self.production_order_buyer_contact),
            ("productionOrderBuyerCountry", &self.production_order_buyer_country),
            ("productionOrderBuyerName", &self.production_order_buyer_name),
            ("productionOrderBuyerTempo", &self.production_order_buyer_tempo),
            ("productionOrderConstruction", &self.production_order_construction),
            ("productionOrderDeliveryDate", &self.production_order_delivery_date),
            (
                "productionOrderProductionOrderDesign",
                &self.production_order_production_order_design,
            ),
            ("productionOrderFinishWidth", &self.production_order_finish_width),
            (
                "productionOrderHandlingStandard",
                &self.production_order_handling_standard,
            ),
            ("productionOrderMaterial", &self.production_order_material),
            ("productionOrderOrderNo", &self.production_order_order_no),
            ("productionOrderOrderQuantity", &self.production_order_order_quantity),
            ("productionOrderOrderType", &self.production_order_order_type),
            (
                "productionOrderOriginGreigeFabric",
                &self.production_order_origin_greige_fabric,
            ),
            ("productionOrderProcessType", &self.production_order_process_type),
            ("productionOrderRemark", &self.production_order_remark),
            ("productionOrderRollLength", &self.production_order_roll_length),
            ("productionOrderRun", &self.production_order_run),
            (
                "productionOrderSalesContractNo",
                &self.production_order_sales_contract_no,
            ),
            ("productionOrderSample", &self.production_order_sample),
            (
                "productionOrderShrinkageStandard",
                &self.production_order_shrinkage_standard,
            ),
            ("productionOrderSpelling", &self.production_order_spelling),
            ("productionOrderUom", &self.production_order_uom),
            ("monitoringEventRemark", &self.monitoring_event_remark),
            (
                "selectedProductionOrderDetailCode",
                &self.selected_production_order_detail_code,
            ),
            (
                "selectedProductionOrderDetailColorRequest",
                &self.selected_production_order_detail_color_request,
            ),
            (
                "selectedProductionOrderDetailColorTemplate",
                &self.selected_production_order_detail_color_template,
            ),
            (
                "selectedProductionOrderDetailColorTypeCode",
                &self.selected_production_order_detail_color_type_code,
            ),
            (
                "selectedProductionOrderDetailColorTypeName",
                &self.selected_production_order_detail_color_type_name,
            ),
            (
                "selectedProductionOrderDetailColorTypeRemark",
                &self.selected_production_order_detail_color_type_remark,
            ),
            (
                "selectedProductionOrderDetailQuantity",
                &self.selected_production_order_detail_quantity,
            ),
            (
                "selectedProductionOrderDetailUom",
                &self.selected_production_order_detail_uom,
            ),
            ("machineEventName", &self.machine_event_name),
            ("eventRange", &self.event_range),
            ("machineEventNo", &self.machine_event_no),
            ("createdBy", &self.created_by),
            ("deleted", &self.deleted),
            ("eventCategory", &self.event_category),
        ]
    }
}

/// Format every enriched record, preserving order. The first failure aborts.
#[instrument(skip_all, fields(records = records.len()))]
pub fn format_all(records: &[EnrichedEvent]) -> Result<Vec<FormattedRow>, EtlError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            format_record(record).map_err(|source| EtlError::Formatting { index, source })
        })
        .collect()
}

/// Render one enriched record.
pub fn format_record(record: &EnrichedEvent) -> Result<FormattedRow, FormatError> {
    let event = &record.event;
    let machine = record.machine.as_ref();
    let division = machine.and_then(|machine| machine.unit.division.as_ref());
    let production_order = record.production_order.as_ref();
    let buyer = production_order.and_then(|order| order.buyer.as_ref());
    let machine_event = record.machine_event.as_ref();

    Ok(FormattedRow {
        cart_number: Literal::non_empty_text(event.cart_number.as_deref()),
        monitoring_event_code: Literal::non_empty_text(event.code.as_deref()),
        monitoring_event_started_date: shifted_date("dateStart", event.date_start)?,
        event_started_time: shifted_time("timeInMilisStart", event.time_in_millis_start)?,
        event_end_time: shifted_time("timeInMilisEnd", event.time_in_millis_end)?,
        monitoring_event_end_date: shifted_date("dateEnd", event.date_end)?,

        machine_code: Literal::text(machine.and_then(|m| m.code.as_deref())),
        machine_condition: Literal::text(machine.and_then(|m| m.condition.as_deref())),
        machine_manufacture: Literal::text(machine.and_then(|m| m.manufacture.as_deref())),
        machine_name: Literal::text(machine.and_then(|m| m.name.as_deref())),
        machine_process: Literal::text(machine.and_then(|m| m.process.as_deref())),
        machine_step_process: Literal::Null,
        unit_code: Literal::non_empty_text(machine.and_then(|m| m.unit.code.as_deref())),
        division_code: Literal::text(division.and_then(|d| d.code.as_deref())),
        division_name: Literal::text(division.and_then(|d| d.name.as_deref())),
        unit_name: Literal::text(machine.and_then(|m| m.unit.name.as_deref())),
        machine_year: Literal::bare(machine.and_then(|m| m.year)),

        production_order_buyer_address: Literal::text(buyer.and_then(|b| b.address.as_deref())),
        production_order_buyer_code: Literal::text(buyer.and_then(|b| b.code.as_deref())),
        production_order_buyer_contact: Literal::text(buyer.and_then(|b| b.contact.as_deref())),
        production_order_buyer_country: Literal::text(buyer.and_then(|b| b.country.as_deref())),
        production_order_buyer_name: Literal::text(buyer.and_then(|b| b.name.as_deref())),
        production_order_buyer_tempo: Literal::quoted(buyer.and_then(|b| b.tempo)),
        production_order_construction: Literal::Null,
        production_order_delivery_date: shifted_date(
            "deliveryDate",
            production_order.and_then(|p| p.delivery_date),
        )?,
        production_order_production_order_design: Literal::Null,
        production_order_finish_width: Literal::text(
            production_order.and_then(|p| p.finish_width.as_deref()),
        ),
        production_order_handling_standard: Literal::text(
            production_order.and_then(|p| p.handling_standard.as_deref()),
        ),
        production_order_material: Literal::text(
            production_order.and_then(|p| p.material.name.as_deref()),
        ),
        production_order_order_no: Literal::text(
            production_order.and_then(|p| p.order_no.as_deref()),
        ),
        production_order_order_quantity: Literal::quoted(
            production_order.and_then(|p| p.order_quantity),
        ),
        production_order_order_type: Literal::text(
            production_order.and_then(|p| p.order_type.name.as_deref()),
        ),
        production_order_origin_greige_fabric: Literal::Null,
        production_order_process_type: Literal::text(
            production_order.and_then(|p| p.process_type.name.as_deref()),
        ),
        production_order_remark: Literal::text(production_order.and_then(|p| p.remark.as_deref())),
        production_order_roll_length: Literal::Null,
        production_order_run: Literal::text(production_order.and_then(|p| p.run.as_deref())),
        production_order_sales_contract_no: Literal::text(
            production_order.and_then(|p| p.sales_contract_no.as_deref()),
        ),
        production_order_sample: Literal::text(production_order.and_then(|p| p.sample.as_deref())),
        production_order_shrinkage_standard: Literal::text(
            production_order.and_then(|p| p.shrinkage_standard.as_deref()),
        ),
        production_order_spelling: Literal::Null,
        production_order_uom: Literal::text(production_order.and_then(|p| p.uom.unit.as_deref())),

        monitoring_event_remark: Literal::non_empty_text(event.remark.as_deref()),
        selected_production_order_detail_code: Literal::Null,
        selected_production_order_detail_color_request: Literal::Null,
        selected_production_order_detail_color_template: Literal::Null,
        selected_production_order_detail_color_type_code: Literal::Null,
        selected_production_order_detail_color_type_name: Literal::Null,
        selected_production_order_detail_color_type_remark: Literal::Null,
        selected_production_order_detail_quantity: Literal::Null,
        selected_production_order_detail_uom: Literal::Null,

        machine_event_name: Literal::non_empty_text(machine_event.and_then(|e| e.name.as_deref())),
        event_range: event_range(event)?,
        machine_event_no: Literal::quoted(machine_event.and_then(|e| e.no).filter(|no| *no != 0)),
        created_by: Literal::text(event.created_by.as_deref()),
        deleted: Literal::quoted(event.is_deleted),
        event_category: Literal::non_empty_text(machine_event.and_then(|e| e.category.as_deref())),
    })
}

fn instant(field: &'static str, millis: i64) -> Result<DateTime<Utc>, FormatError> {
    DateTime::from_timestamp_millis(millis).ok_or(FormatError::InvalidInstant {
        field,
        value: millis,
    })
}

fn shift(field: &'static str, value: DateTime<Utc>) -> Result<DateTime<Utc>, FormatError> {
    value
        .checked_add_signed(Duration::hours(WAREHOUSE_OFFSET_HOURS))
        .ok_or(FormatError::DateOutOfRange { field })
}

fn shifted_date(
    field: &'static str,
    value: Option<DateTime<Utc>>,
) -> Result<Literal, FormatError> {
    let Some(value) = value else {
        return Ok(Literal::Null);
    };
    let shifted = shift(field, value)?;
    Ok(Literal::quoted(Some(shifted.format(DATE_FORMAT))))
}

/// A zero millisecond value counts as absent.
fn shifted_time(field: &'static str, millis: Option<i64>) -> Result<Literal, FormatError> {
    let Some(millis) = millis.filter(|millis| *millis != 0) else {
        return Ok(Literal::Null);
    };
    let shifted = shift(field, instant(field, millis)?)?;
    Ok(Literal::quoted(Some(shifted.format(TIME_FORMAT))))
}

/// Whole minutes between start and end, divided by 60, as quoted text.
///
/// Null unless the end date and every start/end component is present.
fn event_range(event: &MonitoringEvent) -> Result<Literal, FormatError> {
    let (Some(date_start), Some(date_end), Some(start_millis), Some(end_millis)) = (
        event.date_start,
        event.date_end,
        event.time_in_millis_start,
        event.time_in_millis_end,
    ) else {
        return Ok(Literal::Null);
    };

    let start = combine(date_start, instant("timeInMilisStart", start_millis)?);
    let end = combine(date_end, instant("timeInMilisEnd", end_millis)?);
    let minutes = (end - start).num_minutes();

    Ok(Literal::quoted(Some(minutes as f64 / 60.0)))
}

/// Calendar date of `date` with the time of day of `time`, to the second.
fn combine(date: DateTime<Utc>, time: DateTime<Utc>) -> NaiveDateTime {
    let time = time.time();
    date.date_naive()
        .and_time(time.with_nanosecond(0).unwrap_or(time))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::{Buyer, Division, Machine, MachineEvent, ProductionOrder};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn record(event: MonitoringEvent) -> EnrichedEvent {
        EnrichedEvent {
            event,
            ..EnrichedEvent::default()
        }
    }

    #[test]
    fn test_missing_machine_renders_null_machine_fields() {
        let row = format_record(&record(MonitoringEvent {
            cart_number: Some("C1".to_string()),
            ..MonitoringEvent::default()
        }))
        .unwrap();

        assert_eq!(row.cart_number.to_string(), "'C1'");
        for field in [
            &row.machine_code,
            &row.machine_name,
            &row.machine_process,
            &row.unit_code,
            &row.division_code,
            &row.division_name,
            &row.unit_name,
            &row.machine_year,
        ] {
            assert_eq!(field.to_string(), NULL_MARKER);
        }
    }

    #[test]
    fn test_remark_quotes_are_substituted() {
        let row = format_record(&record(MonitoringEvent {
            remark: Some("it's fine".to_string()),
            ..MonitoringEvent::default()
        }))
        .unwrap();

        assert_eq!(row.monitoring_event_remark.to_string(), r#"'it"s fine'"#);
    }

    #[test]
    fn test_dates_and_times_shift_seven_hours() {
        let start = at(2021, 3, 1, 20, 15, 30);
        let row = format_record(&record(MonitoringEvent {
            date_start: Some(start),
            time_in_millis_start: Some(start.timestamp_millis()),
            date_end: Some(at(2021, 3, 1, 2, 0, 0)),
            time_in_millis_end: Some(at(2021, 3, 1, 2, 0, 0).timestamp_millis()),
            ..MonitoringEvent::default()
        }))
        .unwrap();

        // 20:15:30 + 7h crosses midnight.
        assert_eq!(row.monitoring_event_started_date.to_string(), "'2021-03-02'");
        assert_eq!(row.event_started_time.to_string(), "'03:15:30'");
        assert_eq!(row.monitoring_event_end_date.to_string(), "'2021-03-01'");
        assert_eq!(row.event_end_time.to_string(), "'09:00:00'");
    }

    #[test]
    fn test_event_range_is_minutes_over_sixty() {
        let row = format_record(&record(MonitoringEvent {
            date_start: Some(at(2021, 3, 1, 0, 0, 0)),
            time_in_millis_start: Some(at(1970, 1, 1, 8, 0, 0).timestamp_millis()),
            date_end: Some(at(2021, 3, 1, 0, 0, 0)),
            time_in_millis_end: Some(at(1970, 1, 1, 9, 30, 59).timestamp_millis()),
            ..MonitoringEvent::default()
        }))
        .unwrap();

        assert_eq!(row.event_range.to_string(), "'1.5'");
    }

    #[test]
    fn test_event_range_spans_days_and_needs_end_date() {
        let base = MonitoringEvent {
            date_start: Some(at(2021, 3, 1, 0, 0, 0)),
            time_in_millis_start: Some(at(1970, 1, 1, 22, 0, 0).timestamp_millis()),
            date_end: Some(at(2021, 3, 2, 0, 0, 0)),
            time_in_millis_end: Some(at(1970, 1, 1, 0, 0, 0).timestamp_millis()),
            ..MonitoringEvent::default()
        };

        let row = format_record(&record(base.clone())).unwrap();
        assert_eq!(row.event_range.to_string(), "'2'");
        // A zero end time is absent for rendering but still counts as midnight here.
        assert!(row.event_end_time.is_null());

        let open = format_record(&record(MonitoringEvent {
            date_end: None,
            ..base
        }))
        .unwrap();
        assert!(open.event_range.is_null());
    }

    #[test]
    fn test_enriched_fields_render() {
        let enriched = EnrichedEvent {
            event: MonitoringEvent {
                created_by: Some("operator".to_string()),
                is_deleted: Some(false),
                ..MonitoringEvent::default()
            },
            machine: Some(
                Machine {
                    code: Some("M-01".to_string()),
                    name: Some("Stenter 'A'".to_string()),
                    unit_code: Some("U1".to_string()),
                    unit_name: Some("Finishing".to_string()),
                    year: Some(2015),
                    ..Machine::default()
                }
                .with_unit(Some(Division {
                    id: Some(1),
                    code: Some("D1".to_string()),
                    name: Some("Textile".to_string()),
                })),
            ),
            production_order: Some(
                ProductionOrder {
                    order_no: Some("SPP-1".to_string()),
                    order_quantity: Some(1200.0),
                    order_type_name: Some("SOLID".to_string()),
                    delivery_date: Some(at(2021, 4, 30, 18, 0, 0)),
                    ..ProductionOrder::default()
                }
                .with_lookups(Some(Buyer {
                    name: Some("Buyer Co".to_string()),
                    tempo: Some(30),
                    ..Buyer::default()
                })),
            ),
            machine_event: Some(MachineEvent {
                id: Some(4),
                no: Some(12),
                name: Some("Start".to_string()),
                category: Some(String::new()),
            }),
        };

        let row = format_record(&enriched).unwrap();

        assert_eq!(row.machine_code.to_string(), "'M-01'");
        assert_eq!(row.machine_name.to_string(), r#"'Stenter "A"'"#);
        assert_eq!(row.unit_code.to_string(), "'U1'");
        assert_eq!(row.division_name.to_string(), "'Textile'");
        assert_eq!(row.machine_year.to_string(), "2015");
        assert_eq!(row.production_order_buyer_name.to_string(), "'Buyer Co'");
        assert_eq!(row.production_order_buyer_tempo.to_string(), "'30'");
        assert_eq!(row.production_order_order_quantity.to_string(), "'1200'");
        assert_eq!(row.production_order_order_type.to_string(), "'SOLID'");
        assert_eq!(row.production_order_delivery_date.to_string(), "'2021-05-01'");
        assert_eq!(row.machine_event_name.to_string(), "'Start'");
        assert_eq!(row.machine_event_no.to_string(), "'12'");
        assert!(row.event_category.is_null());
        assert_eq!(row.created_by.to_string(), "'operator'");
        assert_eq!(row.deleted.to_string(), "'false'");
        assert!(row.machine_step_process.is_null());
        assert!(row.production_order_spelling.is_null());
    }

    #[test]
    fn test_empty_record_is_all_null() {
        let row = format_record(&EnrichedEvent::default()).unwrap();

        assert!(row.fields().iter().all(|(_, literal)| literal.is_null()));
    }

    #[test]
    fn test_out_of_range_date_fails() {
        let err = format_record(&record(MonitoringEvent {
            date_start: Some(DateTime::<Utc>::MAX_UTC),
            ..MonitoringEvent::default()
        }))
        .unwrap_err();

        assert_eq!(err, FormatError::DateOutOfRange { field: "dateStart" });
    }

    #[test]
    fn test_format_all_reports_failing_index() {
        let records = vec![
            EnrichedEvent::default(),
            record(MonitoringEvent {
                date_end: Some(DateTime::<Utc>::MAX_UTC),
                ..MonitoringEvent::default()
            }),
        ];

        let err = format_all(&records).unwrap_err();

        assert!(matches!(err, EtlError::Formatting { index: 1, .. }));
    }
}
