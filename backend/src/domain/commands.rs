//! Domain-level command types.
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the public DTOs defined in
//! the `shared` crate to these internal types.

pub mod predictions {
    use serde_json::{Map, Value};
    use shared::Gender;

    /// Input for creating a new prediction. Every field is optional; the
    /// domain fills defaults and assigns the ID.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct CreatePredictionCommand {
        pub name: Option<String>,
        pub gender: Option<Gender>,
        pub due_date: Option<String>,
        pub name_suggestion: Option<String>,
        pub timestamp: Option<String>,
        pub extra: Map<String, Value>,
    }

    /// Fields to merge over an existing prediction.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct UpdatePredictionCommand {
        pub name: Option<String>,
        pub gender: Option<Gender>,
        pub due_date: Option<String>,
        pub name_suggestion: Option<String>,
        pub timestamp: Option<String>,
        pub extra: Map<String, Value>,
    }
}
