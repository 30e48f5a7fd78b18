//! The catalog of raw source resources.
//!
//! Source extracts are header-less, tab-separated files. Each resource name
//! maps to the file it is published as and to the ordered list of column names
//! used to parse it. Column names are lower-cased when the resource is staged.

use crate::{Error, Result};

/// One raw source resource and the schema used to parse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
  /// Staging name; also the suffix of the staging table.
  pub name:      &'static str,
  /// File name under the remote base URL and the local cache directory.
  pub file_name: &'static str,
  /// Ordered column names, as published by the source system.
  pub columns:   &'static [&'static str],
}

impl ResourceSpec {
  /// The lower-cased column schema of the staged relation.
  pub fn staged_columns(&self) -> Vec<String> {
    self.columns.iter().map(|c| c.to_lowercase()).collect()
  }
}

// ─── Fact sources ────────────────────────────────────────────────────────────

pub static SALES_ORDER_HEADER: ResourceSpec = ResourceSpec {
  name:      "salesorderheader",
  file_name: "SalesOrderHeader.csv",
  columns:   &[
    "SalesOrderID",
    "RevisionNumber",
    "OrderDate",
    "DueDate",
    "ShipDate",
    "Status",
    "OnlineOrderFlag",
    "SalesOrderNumber",
    "PurchaseOrderNumber",
    "AccountNumber",
    "CustomerID",
    "SalesPersonID",
    "TerritoryID",
    "BillToAddressID",
    "ShipToAddressID",
    "ShipMethodID",
    "CreditCardID",
    "CreditCardApprovalCode",
    "CurrencyRateID",
    "SubTotal",
    "TaxAmt",
    "Freight",
    "TotalDue",
    "Comment",
    "rowguid",
    "ModifiedDate",
  ],
};

pub static SALES_ORDER_DETAIL: ResourceSpec = ResourceSpec {
  name:      "salesorderdetail",
  file_name: "SalesOrderDetail.csv",
  columns:   &[
    "SalesOrderID",
    "SalesOrderDetailID",
    "CarrierTrackingNumber",
    "OrderQty",
    "ProductID",
    "SpecialOfferID",
    "UnitPrice",
    "UnitPriceDiscount",
    "LineTotal",
    "rowguid",
    "ModifiedDate",
  ],
};

// ─── Dimension sources ───────────────────────────────────────────────────────

pub static PRODUCT: ResourceSpec = ResourceSpec {
  name:      "product",
  file_name: "Product.csv",
  columns:   &[
    "ProductID",
    "Name",
    "ProductNumber",
    "MakeFlag",
    "FinishedGoodsFlag",
    "Color",
    "SafetyStockLevel",
    "ReorderPoint",
    "StandardCost",
    "ListPrice",
    "Size",
    "SizeUnitMeasureCode",
    "WeightUnitMeasureCode",
    "Weight",
    "DaysToManufacture",
    "ProductLine",
    "Class",
    "Style",
    "ProductSubcategoryID",
    "ProductModelID",
    "SellStartDate",
    "SellEndDate",
    "DiscontinuedDate",
    "rowguid",
    "ModifiedDate",
  ],
};

pub static CUSTOMER: ResourceSpec = ResourceSpec {
  name:      "customer",
  file_name: "Customer.csv",
  columns:   &[
    "CustomerID",
    "NameStyle",
    "Title",
    "FirstName",
    "MiddleName",
    "LastName",
    "Suffix",
    "CompanyName",
    "SalesPerson",
    "EmailAddress",
    "Phone",
    "PasswordHash",
    "PasswordSalt",
    "rowguid",
    "ModifiedDate",
  ],
};

pub static TERRITORY: ResourceSpec = ResourceSpec {
  name:      "territory",
  file_name: "SalesTerritory.csv",
  columns:   &[
    "TerritoryID",
    "Name",
    "CountryRegionCode",
    "Group",
    "SalesYTD",
    "SalesLastYear",
    "CostYTD",
    "CostLastYear",
    "rowguid",
    "ModifiedDate",
  ],
};

/// Every resource acquired by the staging step, in acquisition order.
pub static RESOURCES: [&ResourceSpec; 5] = [
  &SALES_ORDER_HEADER,
  &SALES_ORDER_DETAIL,
  &PRODUCT,
  &CUSTOMER,
  &TERRITORY,
];

/// Look up a resource by its staging name.
pub fn lookup(name: &str) -> Result<&'static ResourceSpec> {
  RESOURCES
    .iter()
    .copied()
    .find(|r| r.name == name)
    .ok_or_else(|| Error::UnknownResource(name.to_owned()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn staged_columns_are_lowercase() {
    let cols = TERRITORY.staged_columns();
    assert_eq!(cols[0], "territoryid");
    assert_eq!(cols[3], "group");
    assert!(cols.iter().all(|c| c.chars().all(|ch| !ch.is_uppercase())));
  }

  #[test]
  fn lookup_known_and_unknown() {
    assert_eq!(lookup("product").unwrap().file_name, "Product.csv");
    assert!(matches!(lookup("vendor"), Err(Error::UnknownResource(_))));
  }

  #[test]
  fn resource_names_are_unique() {
    for (i, a) in RESOURCES.iter().enumerate() {
      for b in &RESOURCES[i + 1..] {
        assert_ne!(a.name, b.name);
      }
    }
  }
}
