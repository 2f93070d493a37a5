//! Hand-written table definitions shared by the integration tests.

#![allow(dead_code)]

use pgdsl::codec;
use pgdsl::{Column, DbValue, Field, Path, Relation, RowParser};

#[derive(Clone, Debug, PartialEq)]
pub struct OrderRow {
    pub id: i64,
    pub customer_id: i64,
    pub total: f64,
}

pub struct OrderFields {
    pub id: Field<i64>,
    pub customer_id: Field<i64>,
    pub total: Field<f64>,
}

fn order_columns() -> Vec<Column> {
    vec![
        Column::new("id", &codec::int8()),
        Column::new("customer_id", &codec::int8()),
        Column::new("total", &codec::float8()),
    ]
}

pub fn order_parser(offset: usize) -> RowParser<OrderRow> {
    RowParser::new(
        offset,
        order_columns(),
        move |values| {
            Ok(OrderRow {
                id: codec::int8().read(&values[offset])?,
                customer_id: codec::int8().read(&values[offset + 1])?,
                total: codec::float8().read(&values[offset + 2])?,
            })
        },
        |row| {
            vec![
                DbValue::Int8(row.id),
                DbValue::Int8(row.customer_id),
                DbValue::Float8(row.total),
            ]
        },
    )
}

pub fn orders() -> Relation<OrderFields, OrderRow> {
    Relation::new(
        "orders",
        |path: &Path| OrderFields {
            id: Field::new(path, "id"),
            customer_id: Field::new(path, "customer_id"),
            total: Field::new(path, "total"),
        },
        order_columns(),
        order_parser,
    )
}

#[derive(Clone, Debug, PartialEq)]
pub struct CustomerRow {
    pub id: i64,
    pub name: String,
}

pub struct CustomerFields {
    pub id: Field<i64>,
    pub name: Field<String>,
}

fn customer_columns() -> Vec<Column> {
    vec![
        Column::new("id", &codec::int8()),
        Column::new("name", &codec::text()),
    ]
}

pub fn customer_parser(offset: usize) -> RowParser<CustomerRow> {
    RowParser::new(
        offset,
        customer_columns(),
        move |values| {
            Ok(CustomerRow {
                id: codec::int8().read(&values[offset])?,
                name: codec::text().read(&values[offset + 1])?,
            })
        },
        |row| {
            vec![DbValue::Int8(row.id), DbValue::Text(row.name.clone())]
        },
    )
}

pub fn customers() -> Relation<CustomerFields, CustomerRow> {
    Relation::new(
        "customers",
        |path: &Path| CustomerFields {
            id: Field::new(path, "id"),
            name: Field::new(path, "name"),
        },
        customer_columns(),
        customer_parser,
    )
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemRow {
    pub id: i64,
    pub order_id: i64,
    pub sku: String,
}

pub struct ItemFields {
    pub id: Field<i64>,
    pub order_id: Field<i64>,
    pub sku: Field<String>,
}

fn item_columns() -> Vec<Column> {
    vec![
        Column::new("id", &codec::int8()),
        Column::new("order_id", &codec::int8()),
        Column::new("sku", &codec::text()),
    ]
}

pub fn item_parser(offset: usize) -> RowParser<ItemRow> {
    RowParser::new(
        offset,
        item_columns(),
        move |values| {
            Ok(ItemRow {
                id: codec::int8().read(&values[offset])?,
                order_id: codec::int8().read(&values[offset + 1])?,
                sku: codec::text().read(&values[offset + 2])?,
            })
        },
        |row| {
            vec![
                DbValue::Int8(row.id),
                DbValue::Int8(row.order_id),
                DbValue::Text(row.sku.clone()),
            ]
        },
    )
}

pub fn items() -> Relation<ItemFields, ItemRow> {
    Relation::new(
        "items",
        |path: &Path| ItemFields {
            id: Field::new(path, "id"),
            order_id: Field::new(path, "order_id"),
            sku: Field::new(path, "sku"),
        },
        item_columns(),
        item_parser,
    )
}

/// Flat row vector for one order.
pub fn order_values(id: i64, customer_id: i64, total: f64) -> Vec<DbValue> {
    vec![
        DbValue::Int8(id),
        DbValue::Int8(customer_id),
        DbValue::Float8(total),
    ]
}

/// Flat row vector for one customer.
pub fn customer_values(id: i64, name: &str) -> Vec<DbValue> {
    vec![DbValue::Int8(id), DbValue::Text(name.to_string())]
}
