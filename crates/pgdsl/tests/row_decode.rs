//! Decoder/column synchronization tests.
//!
//! The row parser produced by a compile must track the emitted column
//! order exactly: same width, same offsets, lossless round trips.

mod common;

use common::{
    CustomerRow, OrderRow, customer_parser, customer_values, customers, order_parser,
    order_values, orders,
};
use pgdsl::{DbValue, SelectBuilder};

#[test]
fn emitted_columns_match_decoder_width() {
    let compiled = orders()
        .join_on(customers(), |(o, c)| o.customer_id.eq_field(&c.id))
        .compile()
        .unwrap();
    // Five columns emitted, five slots decoded.
    assert_eq!(compiled.parser().width(), 5);
    assert_eq!(compiled.parser().columns().len(), 5);
    let names: Vec<&str> = compiled
        .parser()
        .columns()
        .iter()
        .map(|c| c.name())
        .collect();
    assert_eq!(names, ["id", "customer_id", "total", "id", "name"]);
}

#[test]
fn join_decoder_splits_at_left_width() {
    let compiled = orders()
        .join_on(customers(), |(o, c)| o.customer_id.eq_field(&c.id))
        .compile()
        .unwrap();

    let mut flat = order_values(1, 42, 250.0);
    flat.extend(customer_values(42, "alice"));
    let (order, customer) = compiled.parser().decode(&flat).unwrap();
    assert_eq!(
        order,
        OrderRow {
            id: 1,
            customer_id: 42,
            total: 250.0
        }
    );
    assert_eq!(
        customer,
        CustomerRow {
            id: 42,
            name: "alice".to_string()
        }
    );
}

#[test]
fn decode_then_encode_round_trips_bit_for_bit() {
    let compiled = orders()
        .join_on(customers(), |(o, c)| o.customer_id.eq_field(&c.id))
        .compile()
        .unwrap();

    let mut flat = order_values(7, 9, 12.5);
    flat.extend(customer_values(9, "bob"));
    let decoded = compiled.parser().decode(&flat).unwrap();
    assert_eq!(compiled.parser().encode(&decoded), flat);
}

#[test]
fn left_join_decodes_missing_right_side_as_none() {
    let compiled = orders()
        .left_join_on(customers(), |(o, c)| o.customer_id.eq_field(&c.id))
        .compile()
        .unwrap();

    let mut matched = order_values(1, 42, 10.0);
    matched.extend(customer_values(42, "alice"));
    let (_, customer) = compiled.parser().decode(&matched).unwrap();
    assert_eq!(
        customer,
        Some(CustomerRow {
            id: 42,
            name: "alice".to_string()
        })
    );

    let mut unmatched = order_values(2, 43, 20.0);
    unmatched.extend([DbValue::Null, DbValue::Null]);
    let (order, customer) = compiled.parser().decode(&unmatched).unwrap();
    assert_eq!(order.id, 2);
    assert_eq!(customer, None);

    // Re-encoding the absent side reproduces the NULL slots.
    let decoded = compiled.parser().decode(&unmatched).unwrap();
    assert_eq!(compiled.parser().encode(&decoded), unmatched);
}

#[test]
fn three_way_join_decodes_the_same_triple_regardless_of_bracketing() {
    // Direct parser composition of the same projection order, bracketed
    // both ways.
    let left_leaning = order_parser(0)
        .joined(&customer_parser(3))
        .joined(&order_parser(5));
    let right_leaning = {
        let tail = customer_parser(3).joined(&order_parser(5));
        order_parser(0).joined(&tail)
    };

    let mut flat = order_values(1, 2, 3.0);
    flat.extend(customer_values(2, "c"));
    flat.extend(order_values(4, 5, 6.0));

    let ((a1, b1), c1) = left_leaning.decode(&flat).unwrap();
    let (a2, (b2, c2)) = right_leaning.decode(&flat).unwrap();
    assert_eq!((a1, b1, c1), (a2, b2, c2));
}

#[test]
fn compiled_three_way_join_width_covers_all_leaves() {
    let compiled = orders()
        .join_on(customers(), |(o, c)| o.customer_id.eq_field(&c.id))
        .join_on(common::items(), |((o, _), i)| o.id.eq_field(&i.order_id))
        .compile()
        .unwrap();
    assert_eq!(compiled.parser().width(), 3 + 2 + 3);

    let mut flat = order_values(1, 2, 3.0);
    flat.extend(customer_values(2, "c"));
    flat.extend([
        DbValue::Int8(10),
        DbValue::Int8(1),
        DbValue::Text("sku-1".to_string()),
    ]);
    let ((order, customer), item) = compiled.parser().decode(&flat).unwrap();
    assert_eq!(order.id, 1);
    assert_eq!(customer.name, "c");
    assert_eq!(item.sku, "sku-1");
    let reencoded = compiled.parser().encode(&((order, customer), item));
    assert_eq!(reencoded, flat);
}

#[test]
fn self_join_decodes_both_halves_independently() {
    let compiled = orders()
        .join_on(orders(), |(a, b)| a.customer_id.eq_field(&b.id))
        .compile()
        .unwrap();
    let mut flat = order_values(1, 2, 3.0);
    flat.extend(order_values(4, 5, 6.0));
    let (left, right) = compiled.parser().decode(&flat).unwrap();
    assert_eq!(left.id, 1);
    assert_eq!(right.id, 4);
}
