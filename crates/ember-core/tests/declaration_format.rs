//! Tests for the JSON shape of table definitions.

use ember_core::{ColumnDescriptor, SqlAffinity, TableDefinition};

#[test]
fn test_deserialize_assigns_primary_key_ordinals() {
    let json = r#"{
        "name": "users",
        "columns": [
            { "name": "id", "affinity": "integer", "primary_key": true, "not_null": true },
            { "name": "email", "affinity": "text", "not_null": true, "default": "''" },
            { "name": "bio", "affinity": "text" }
        ]
    }"#;

    let table: TableDefinition = serde_json::from_str(json).unwrap();

    assert_eq!(table.name(), "users");
    assert_eq!(table.columns().len(), 3);

    let id = table.get_column("id").unwrap();
    assert_eq!(id.primary_key_ordinal, Some(1));

    let email = table.get_column("email").unwrap();
    assert_eq!(email.affinity, SqlAffinity::Text);
    assert!(email.has_default());

    let bio = table.get_column("bio").unwrap();
    assert!(!bio.not_null);
    assert!(!bio.primary_key);
}

#[test]
fn test_nullable_primary_key_is_kept() {
    let json = r#"{
        "name": "users",
        "columns": [
            { "name": "id", "affinity": "integer", "primary_key": true, "not_null": false },
            { "name": "name", "affinity": "text" }
        ]
    }"#;

    let table: TableDefinition = serde_json::from_str(json).unwrap();
    let id = table.get_column("id").unwrap();

    assert!(id.primary_key);
    assert!(!id.not_null);
}

#[test]
fn test_round_trip_through_json() {
    let table = TableDefinition::new("events")
        .column(ColumnDescriptor::integer("id").primary_key())
        .column(ColumnDescriptor::blob("payload"))
        .column(ColumnDescriptor::real("weight").not_null().default("1.0"));

    let json = serde_json::to_string(&table).unwrap();
    let back: TableDefinition = serde_json::from_str(&json).unwrap();

    assert_eq!(back, table);
}

#[test]
fn test_unknown_affinity_is_rejected() {
    let json = r#"{ "name": "t", "columns": [ { "name": "a", "affinity": "varchar" } ] }"#;
    assert!(serde_json::from_str::<TableDefinition>(json).is_err());
}
