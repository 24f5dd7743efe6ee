//! Schema Registry: named canonical targets, immutable once built and
//! registered at startup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Closed set of field kinds; the kind selects a coercer (see [`crate::coerce`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Email,
    Phone,
    Decimal,
    Date,
    Currency,
    OpaqueId,
    FreeText,
    MassSi,
    LengthSi,
}

/// A single canonical field and its kind.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: Kind,
}

/// A named canonical target: an ordered field list plus per-field synonyms.
///
/// Schemas are immutable once built; the registry hands out shared
/// references so adapters never clone the synonym tables.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    fields: Vec<FieldSpec>,
    synonyms: HashMap<String, Vec<String>>,
}

impl Schema {
    fn new(name: &str, fields: Vec<(&str, Kind)>, synonyms: Vec<(&str, &[&str])>) -> Self {
        Self {
            name: name.to_string(),
            fields: fields
                .into_iter()
                .map(|(name, kind)| FieldSpec { name: name.to_string(), kind })
                .collect(),
            synonyms: synonyms
                .into_iter()
                .map(|(field, aliases)| {
                    (field.to_string(), aliases.iter().map(|a| (*a).to_string()).collect())
                })
                .collect(),
        }
    }

    /// Ordered field list, as declared.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Whether `field` is declared on this schema.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.name == field)
    }

    #[must_use]
    pub fn kind_of(&self, field: &str) -> Option<Kind> {
        self.fields.iter().find(|f| f.name == field).map(|f| f.kind)
    }

    /// Synonym slugs declared for `field` (not including the field's own slug).
    #[must_use]
    pub fn synonyms_of(&self, field: &str) -> &[String] {
        self.synonyms.get(field).map_or(&[], Vec::as_slice)
    }

    /// Whether this schema declares both `first_name` and `last_name`, making
    /// it eligible for the contact adapter's name-splitting behavior.
    #[must_use]
    pub fn supports_name_split(&self) -> bool {
        self.has_field("first_name") && self.has_field("last_name")
    }
}

/// Holds named, immutable schemas. Built once at startup via [`SchemaRegistry::bootstrap`].
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    /// The built-in bootstrap set: `contacts`, `transactions`, `products`.
    #[must_use]
    pub fn bootstrap() -> Self {
        let mut schemas = HashMap::new();

        schemas.insert(
            "contacts".to_string(),
            Schema::new(
                "contacts",
                vec![
                    ("email", Kind::Email),
                    ("phone", Kind::Phone),
                    ("first_name", Kind::FreeText),
                    ("last_name", Kind::FreeText),
                    ("company", Kind::FreeText),
                ],
                vec![
                    ("email", &["e_mail", "email_address", "mail"]),
                    ("phone", &["phone_number", "telephone", "tel", "mobile", "cell"]),
                    ("first_name", &["firstname", "given_name", "fname"]),
                    ("last_name", &["lastname", "surname", "family_name", "lname"]),
                    ("company", &["company_name", "organization", "employer", "org"]),
                ],
            ),
        );

        schemas.insert(
            "transactions".to_string(),
            Schema::new(
                "transactions",
                vec![
                    ("id", Kind::OpaqueId),
                    ("amount", Kind::Decimal),
                    ("currency", Kind::Currency),
                    ("occurred_at", Kind::Date),
                    ("customer_id", Kind::OpaqueId),
                ],
                vec![
                    ("id", &["transaction_id", "txn_id", "reference"]),
                    ("amount", &["total", "value", "price", "sum"]),
                    ("currency", &["currency_code", "ccy"]),
                    ("occurred_at", &["date", "timestamp", "created", "time", "created_at"]),
                    ("customer_id", &["customer", "client_id", "account_id"]),
                ],
            ),
        );

        schemas.insert(
            "products".to_string(),
            Schema::new(
                "products",
                vec![
                    ("sku", Kind::OpaqueId),
                    ("name", Kind::FreeText),
                    ("price", Kind::Decimal),
                    ("currency", Kind::Currency),
                    ("category", Kind::FreeText),
                    ("weight_kg", Kind::MassSi),
                    ("length_m", Kind::LengthSi),
                ],
                vec![
                    ("sku", &["product_sku", "item_sku", "code"]),
                    ("name", &["product_name", "title", "item_name"]),
                    ("price", &["unit_price", "cost", "amount"]),
                    ("currency", &["currency_code", "ccy"]),
                    ("category", &["product_category", "department", "type"]),
                    ("weight_kg", &["weight", "mass"]),
                    ("length_m", &["length", "size"]),
                ],
            ),
        );

        Self { schemas }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Names of every registered schema, sorted for deterministic listing.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Render the registry as the JSON shape served by `GET /v1/schemas`:
    /// one entry per schema, fields in declared order, plus each field's
    /// synonym slugs.
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        let mut schemas = Vec::new();
        for name in self.names() {
            let schema = self.schemas.get(name).expect("name came from this registry");
            let fields: Vec<serde_json::Value> = schema
                .fields()
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "name": f.name,
                        "kind": f.kind,
                        "synonyms": schema.synonyms_of(&f.name),
                    })
                })
                .collect();
            schemas.push(serde_json::json!({ "name": name, "fields": fields }));
        }
        serde_json::json!({ "schemas": schemas })
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::bootstrap()
    }
}
