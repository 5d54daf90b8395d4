//! Production orders (Sales) and their buyers (Core).

use sea_orm::prelude::DateTimeUtc;
use sea_orm::{DbErr, FromQueryResult, QueryResult};

pub const TABLE: &str = "ProductionOrder";

pub const COLUMNS: [&str; 20] = [
    "buyerId",
    "buyerCode",
    "buyerName",
    "buyerType",
    "deliveryDate",
    "designCode",
    "designNumber",
    "finishWidth",
    "handlingStandard",
    "materialName",
    "orderQuantity",
    "orderTypeName",
    "processTypeName",
    "remark",
    "sample",
    "shrinkageStandard",
    "uomUnit",
    "orderNo",
    "RUN",
    "salesContractNo",
];

pub const BUYER_TABLE: &str = "Buyers";

pub const BUYER_COLUMNS: [&str; 6] = ["address", "code", "contact", "country", "name", "tempo"];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductionOrder {
    pub buyer_id: Option<i64>,
    pub buyer_code: Option<String>,
    pub buyer_name: Option<String>,
    pub buyer_type: Option<String>,
    pub delivery_date: Option<DateTimeUtc>,
    pub design_code: Option<String>,
    pub design_number: Option<String>,
    pub finish_width: Option<String>,
    pub handling_standard: Option<String>,
    pub material_name: Option<String>,
    pub order_quantity: Option<f64>,
    pub order_type_name: Option<String>,
    pub process_type_name: Option<String>,
    pub remark: Option<String>,
    pub sample: Option<String>,
    pub shrinkage_standard: Option<String>,
    pub uom_unit: Option<String>,
    pub order_no: Option<String>,
    pub run: Option<String>,
    pub sales_contract_no: Option<String>,
    pub buyer: Option<Buyer>,
    pub material: Named,
    pub order_type: Named,
    pub process_type: Named,
    pub uom: Uom,
}

/// `{name}` wrapper synthesized from a flat `*Name` column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Named {
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Uom {
    pub unit: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Buyer {
    pub address: Option<String>,
    pub code: Option<String>,
    pub contact: Option<String>,
    pub country: Option<String>,
    pub name: Option<String>,
    pub tempo: Option<i64>,
}

impl ProductionOrder {
    /// Re-wraps the flat material/order type/process type/uom columns and attaches the buyer.
    pub fn with_lookups(mut self, buyer: Option<Buyer>) -> Self {
        self.buyer = buyer;
        self.material = Named {
            name: self.material_name.clone(),
        };
        self.order_type = Named {
            name: self.order_type_name.clone(),
        };
        self.process_type = Named {
            name: self.process_type_name.clone(),
        };
        self.uom = Uom {
            unit: self.uom_unit.clone(),
        };
        self
    }
}

impl FromQueryResult for ProductionOrder {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            buyer_id: res.try_get(pre, "buyerId")?,
            buyer_code: res.try_get(pre, "buyerCode")?,
            buyer_name: res.try_get(pre, "buyerName")?,
            buyer_type: res.try_get(pre, "buyerType")?,
            delivery_date: res.try_get(pre, "deliveryDate")?,
            design_code: res.try_get(pre, "designCode")?,
            design_number: res.try_get(pre, "designNumber")?,
            finish_width: res.try_get(pre, "finishWidth")?,
            handling_standard: res.try_get(pre, "handlingStandard")?,
            material_name: res.try_get(pre, "materialName")?,
            order_quantity: res.try_get(pre, "orderQuantity")?,
            order_type_name: res.try_get(pre, "orderTypeName")?,
            process_type_name: res.try_get(pre, "processTypeName")?,
            remark: res.try_get(pre, "remark")?,
            sample: res.try_get(pre, "sample")?,
            shrinkage_standard: res.try_get(pre, "shrinkageStandard")?,
            uom_unit: res.try_get(pre, "uomUnit")?,
            order_no: res.try_get(pre, "orderNo")?,
            run: res.try_get(pre, "RUN")?,
            sales_contract_no: res.try_get(pre, "salesContractNo")?,
            ..Self::default()
        })
    }
}

impl FromQueryResult for Buyer {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            address: res.try_get(pre, "address")?,
            code: res.try_get(pre, "code")?,
            contact: res.try_get(pre, "contact")?,
            country: res.try_get(pre, "country")?,
            name: res.try_get(pre, "name")?,
            tempo: res.try_get(pre, "tempo")?,
        })
    }
}
