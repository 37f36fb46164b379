//! Testing utilities for roster
//!
//! Record fixtures shared by the unit tests.
//!
//! Only available when compiled with `cfg(test)`.

use crate::record::Record;

/// Three team members in group "Mentors" at positions 0, 1 and 2
#[must_use]
pub fn mentors() -> Vec<Record> {
    [("A", "Asha"), ("B", "Bala"), ("C", "Chitra")]
        .into_iter()
        .zip(0u32..)
        .map(|((id, name), index)| {
            Record::new(id)
                .in_group("Mentors")
                .at_index(index)
                .with_field("name", name)
                .with_field("team", "Mentors")
        })
        .collect()
}

/// `count` stock items titled "Item 0", "Item 1", ... in category "Robotics"
#[must_use]
pub fn stock_items(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            Record::new(format!("s{i}"))
                .in_group("Robotics")
                .with_field("title", format!("Item {i}"))
                .with_field("category", "Robotics")
                .with_field("vendor", "Acme")
        })
        .collect()
}

/// `(id, order_index)` pairs, for compact ordering assertions
#[must_use]
pub fn order_of(records: &[Record]) -> Vec<(&str, u32)> {
    records
        .iter()
        .map(|r| (r.id.as_str(), r.order_index.unwrap_or(u32::MAX)))
        .collect()
}
