//! Table declarations loaded from JSON files.
//!
//! ```json
//! {
//!   "tables": [
//!     {
//!       "name": "users",
//!       "columns": [
//!         { "name": "id", "affinity": "integer", "primary_key": true },
//!         { "name": "email", "affinity": "text", "not_null": true, "default": "''" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use ember_core::TableDefinition;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A set of declared tables, in sync order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDeclaration {
    /// Declared tables.
    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

impl SchemaDeclaration {
    /// Parses a declaration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Declaration`](crate::error::SyncError::Declaration)
    /// when the text is not a valid declaration.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a declaration file.
    ///
    /// # Errors
    ///
    /// Returns an IO error when the file cannot be read, or a declaration
    /// error when its content does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use std::io::Write;

    const USERS: &str = r#"{
        "tables": [
            {
                "name": "users",
                "columns": [
                    { "name": "id", "affinity": "integer", "primary_key": true },
                    { "name": "email", "affinity": "text", "not_null": true, "default": "''" }
                ]
            },
            { "name": "tags", "columns": [ { "name": "label", "affinity": "text" } ] }
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let declaration = SchemaDeclaration::from_json(USERS).unwrap();
        let names: Vec<&str> = declaration.tables.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["users", "tags"]);

        let id = declaration.tables[0].get_column("id").unwrap();
        assert!(id.primary_key);
        assert!(!id.not_null);
        assert_eq!(id.primary_key_ordinal, Some(1));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(USERS.as_bytes()).unwrap();

        let declaration = SchemaDeclaration::load(file.path()).unwrap();
        assert_eq!(declaration.tables.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SchemaDeclaration::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SyncError::Io(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = SchemaDeclaration::from_json("{ \"tables\": [ { } ] }").unwrap_err();
        assert!(matches!(err, SyncError::Declaration(_)));
    }
}
