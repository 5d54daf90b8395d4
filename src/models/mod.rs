//! Row models for the source tables and the enriched record built from them.
//!
//! Source rows are decoded with [`sea_orm::FromQueryResult`]; column names follow
//! the operational schemas exactly and are part of the contract with them.

pub mod machine;
pub mod machine_event;
pub mod monitoring_event;
pub mod production_order;

pub use machine::{Division, Machine, Unit};
pub use machine_event::MachineEvent;
pub use monitoring_event::MonitoringEvent;
pub use production_order::{Buyer, Named, ProductionOrder, Uom};

/// A monitoring event with every join attached.
///
/// Each nested object is `None` when the base record carried no key for it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnrichedEvent {
    pub event: MonitoringEvent,
    pub machine: Option<Machine>,
    pub production_order: Option<ProductionOrder>,
    pub machine_event: Option<MachineEvent>,
}
