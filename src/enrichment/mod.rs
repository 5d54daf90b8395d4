//! # Enricher
//!
//! Attaches machine (with unit and division), production order (with buyer) and
//! machine event data to each base monitoring event.
//!
//! Every join is a single-key, read-only lookup against one source database. A base
//! record without a key for a join gets no nested object and issues no query. A key
//! that points at a missing machine or production order fails the record; missing
//! divisions, buyers and machine events leave the nested object empty.

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, instrument};

use crate::db::SourceConnections;
use crate::error::{EnrichError, EtlError, Join};
use crate::models::{
    Buyer, Division, EnrichedEvent, Machine, MachineEvent, MonitoringEvent, ProductionOrder,
};
use crate::repositories::{CoreRepository, FinishingPrintingRepository, SalesRepository};

/// Joins source data onto monitoring events.
#[derive(Clone, Debug)]
pub struct Enricher {
    finishing_printing: FinishingPrintingRepository,
    core: CoreRepository,
    sales: SalesRepository,
}

impl Enricher {
    pub fn new(sources: &SourceConnections) -> Self {
        Self {
            finishing_printing: FinishingPrintingRepository::new(
                sources.finishing_printing.clone(),
            ),
            core: CoreRepository::new(sources.core.clone()),
            sales: SalesRepository::new(sources.sales.clone()),
        }
    }

    /// Enrich every event, at most `concurrency` records at a time.
    ///
    /// Output order matches input order. The first failing record aborts the stage.
    #[instrument(skip_all, fields(records = events.len(), concurrency = concurrency))]
    pub async fn enrich_all(
        &self,
        events: Vec<MonitoringEvent>,
        concurrency: usize,
    ) -> Result<Vec<EnrichedEvent>, EtlError> {
        stream::iter(events.into_iter().enumerate())
            .map(|(index, event)| async move {
                self.enrich(event)
                    .await
                    .map_err(|source| EtlError::Enrichment { index, source })
            })
            .buffered(concurrency.max(1))
            .try_collect()
            .await
    }

    /// Enrich one base record. Its three top-level joins run concurrently.
    pub async fn enrich(&self, event: MonitoringEvent) -> Result<EnrichedEvent, EnrichError> {
        let (machine, production_order, machine_event) = tokio::try_join!(
            self.join_machine(&event),
            self.join_production_order(&event),
            self.join_machine_event(&event),
        )?;

        Ok(EnrichedEvent {
            event,
            machine,
            production_order,
            machine_event,
        })
    }

    /// Machine by `event.machineId`, with its unit and the unit's division attached.
    pub async fn join_machine(
        &self,
        event: &MonitoringEvent,
    ) -> Result<Option<Machine>, EnrichError> {
        let Some(id) = event.machine_id else {
            return Ok(None);
        };

        let machine = self
            .finishing_printing
            .find_machine(id)
            .await
            .map_err(|source| EnrichError::Query {
                join: Join::Machine,
                key: id,
                source,
            })?
            .ok_or(EnrichError::NotFound {
                join: Join::Machine,
                key: id,
            })?;

        let division = self.join_division(&machine).await?;
        Ok(Some(machine.with_unit(division)))
    }

    /// Division by the machine's `unitDivisionId`.
    pub async fn join_division(&self, machine: &Machine) -> Result<Option<Division>, EnrichError> {
        let Some(id) = machine.unit_division_id else {
            return Ok(None);
        };

        let division = self
            .core
            .find_division(id)
            .await
            .map_err(|source| EnrichError::Query {
                join: Join::Division,
                key: id,
                source,
            })?;
        if division.is_none() {
            debug!(division_id = id, "Division not found; leaving it empty");
        }
        Ok(division)
    }

    /// Production order by `event.productionOrderId`, with buyer and the
    /// synthesized material/order type/process type/uom objects.
    pub async fn join_production_order(
        &self,
        event: &MonitoringEvent,
    ) -> Result<Option<ProductionOrder>, EnrichError> {
        let Some(id) = event.production_order_id else {
            return Ok(None);
        };

        let production_order = self
            .sales
            .find_production_order(id)
            .await
            .map_err(|source| EnrichError::Query {
                join: Join::ProductionOrder,
                key: id,
                source,
            })?
            .ok_or(EnrichError::NotFound {
                join: Join::ProductionOrder,
                key: id,
            })?;

        let buyer = self.join_buyer(&production_order).await?;
        Ok(Some(production_order.with_lookups(buyer)))
    }

    /// Buyer by the production order's `buyerId`.
    pub async fn join_buyer(
        &self,
        production_order: &ProductionOrder,
    ) -> Result<Option<Buyer>, EnrichError> {
        let Some(id) = production_order.buyer_id else {
            return Ok(None);
        };

        self.core
            .find_buyer(id)
            .await
            .map_err(|source| EnrichError::Query {
                join: Join::Buyer,
                key: id,
                source,
            })
    }

    /// Machine event catalogue entry by `event.machineEventId`.
    pub async fn join_machine_event(
        &self,
        event: &MonitoringEvent,
    ) -> Result<Option<MachineEvent>, EnrichError> {
        let Some(id) = event.machine_event_id else {
            return Ok(None);
        };

        self.finishing_printing
            .find_machine_event(id)
            .await
            .map_err(|source| EnrichError::Query {
                join: Join::MachineEvent,
                key: id,
                source,
            })
    }
}
