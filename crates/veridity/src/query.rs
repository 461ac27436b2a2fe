//! Atomic queries — one predicate over one claim slot.
//!
//! A query names a schema, a data slot, an operator, and comparison
//! values. The atomic-query circuit evaluates exactly one predicate, so
//! request parsing rejects anything with more than one field or more
//! than one operator rather than silently proving a narrower statement
//! than the verifier asked for.

use serde::{Deserialize, Serialize};

use crate::claim::{Claim, SchemaHash, SlotValue};
use crate::error::{IdentityError, Result};

/// Comparison operators the atomic-query circuit supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// No predicate; proves only possession of a valid claim.
    Noop,
    Eq,
    Lt,
    Gt,
    /// Membership in a value set.
    In,
}

impl Operator {
    /// Parse a request token (`"$eq"`, `"$lt"`, `"$gt"`, `"$in"`).
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "$eq" => Ok(Operator::Eq),
            "$lt" => Ok(Operator::Lt),
            "$gt" => Ok(Operator::Gt),
            "$in" => Ok(Operator::In),
            other => Err(IdentityError::UnsupportedQuery(format!(
                "unknown operator {other}"
            ))),
        }
    }

    /// The operator's circuit code.
    pub fn code(&self) -> u32 {
        match self {
            Operator::Noop => 0,
            Operator::Eq => 1,
            Operator::Lt => 2,
            Operator::Gt => 3,
            Operator::In => 4,
        }
    }
}

/// A single-predicate query over one claim data slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub schema: SchemaHash,
    pub slot_index: usize,
    pub operator: Operator,
    pub values: Vec<SlotValue>,
}

impl Query {
    /// A possession-only query: no predicate, just a valid claim of
    /// the schema.
    pub fn noop(schema: SchemaHash) -> Self {
        Self {
            schema,
            slot_index: 2,
            operator: Operator::Noop,
            values: Vec::new(),
        }
    }

    /// Parse a verifier request of the form
    /// `{"field": {"$op": value}}` against a schema, resolving the
    /// field name to a data slot index with `resolver`.
    ///
    /// Exactly one field and exactly one operator are accepted;
    /// anything else is an unsupported query.
    pub fn from_request(
        schema: SchemaHash,
        request: &serde_json::Value,
        resolver: impl Fn(&str) -> Result<usize>,
    ) -> Result<Self> {
        let fields = request.as_object().ok_or_else(|| {
            IdentityError::UnsupportedQuery("request must be a JSON object".into())
        })?;
        if fields.len() != 1 {
            return Err(IdentityError::UnsupportedQuery(format!(
                "expected exactly one field, got {}",
                fields.len()
            )));
        }
        let (field, predicate) = fields.iter().next().ok_or_else(|| {
            IdentityError::UnsupportedQuery("request must name a field".into())
        })?;

        let predicates = predicate.as_object().ok_or_else(|| {
            IdentityError::UnsupportedQuery(format!("predicate for {field} must be an object"))
        })?;
        if predicates.len() != 1 {
            return Err(IdentityError::UnsupportedQuery(format!(
                "expected exactly one operator for {field}, got {}",
                predicates.len()
            )));
        }
        let (token, value) = predicates.iter().next().ok_or_else(|| {
            IdentityError::UnsupportedQuery(format!("predicate for {field} must name an operator"))
        })?;

        let operator = Operator::from_token(token)?;
        let values = match value {
            serde_json::Value::Array(items) => items
                .iter()
                .map(parse_value)
                .collect::<Result<Vec<SlotValue>>>()?,
            single => vec![parse_value(single)?],
        };

        Ok(Self {
            schema,
            slot_index: resolver(field)?,
            operator,
            values,
        })
    }

    /// Evaluate the predicate against a claim's data slots.
    ///
    /// Returns an error (not `false`) when the query itself is
    /// malformed for this claim: a non-data slot index, or missing
    /// comparison values.
    pub fn matches(&self, claim: &Claim) -> Result<bool> {
        if self.operator == Operator::Noop {
            return Ok(true);
        }
        let slot = claim.data_slot(self.slot_index).ok_or_else(|| {
            IdentityError::UnsupportedQuery(format!(
                "slot {} is not an addressable data slot",
                self.slot_index
            ))
        })?;
        let first = self.values.first().ok_or_else(|| {
            IdentityError::UnsupportedQuery("operator requires a comparison value".into())
        })?;
        Ok(match self.operator {
            Operator::Noop => true,
            Operator::Eq => slot == *first,
            Operator::Lt => slot < *first,
            Operator::Gt => slot > *first,
            Operator::In => self.values.contains(&slot),
        })
    }
}

fn parse_value(value: &serde_json::Value) -> Result<SlotValue> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(SlotValue::from_u64).ok_or_else(|| {
            IdentityError::UnsupportedQuery(format!("value {n} is not an unsigned integer"))
        }),
        other => Err(IdentityError::UnsupportedQuery(format!(
            "unsupported value type: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaHash {
        SchemaHash::from_document(b"{}", "AgeCredential")
    }

    fn birthday_claim(birthday: u64) -> Claim {
        Claim::builder(schema())
            .index_data(SlotValue::from_u64(birthday), SlotValue::ZERO)
            .revocation_nonce(7)
            .build()
            .unwrap()
    }

    fn resolver(field: &str) -> Result<usize> {
        match field {
            "birthDay" => Ok(2),
            other => Err(IdentityError::UnsupportedQuery(format!(
                "unknown field {other}"
            ))),
        }
    }

    #[test]
    fn test_lt_matches_earlier_birthday() {
        let query = Query::from_request(schema(), &json!({"birthDay": {"$lt": 20100101}}), resolver)
            .unwrap();
        assert!(query.matches(&birthday_claim(19960424)).unwrap());
        assert!(!query.matches(&birthday_claim(20150101)).unwrap());
    }

    #[test]
    fn test_eq_and_gt() {
        let eq = Query::from_request(schema(), &json!({"birthDay": {"$eq": 19960424}}), resolver)
            .unwrap();
        assert!(eq.matches(&birthday_claim(19960424)).unwrap());
        assert!(!eq.matches(&birthday_claim(19960425)).unwrap());

        let gt = Query::from_request(schema(), &json!({"birthDay": {"$gt": 20000101}}), resolver)
            .unwrap();
        assert!(gt.matches(&birthday_claim(20150101)).unwrap());
        assert!(!gt.matches(&birthday_claim(19960424)).unwrap());
    }

    #[test]
    fn test_in_membership() {
        let query = Query::from_request(
            schema(),
            &json!({"birthDay": {"$in": [19960424, 19970505]}}),
            resolver,
        )
        .unwrap();
        assert!(query.matches(&birthday_claim(19960424)).unwrap());
        assert!(!query.matches(&birthday_claim(19980606)).unwrap());
    }

    #[test]
    fn test_noop_always_matches() {
        let query = Query::noop(schema());
        assert!(query.matches(&birthday_claim(1)).unwrap());
        assert!(query.matches(&birthday_claim(99999999)).unwrap());
    }

    #[test]
    fn test_two_fields_rejected() {
        let err = Query::from_request(
            schema(),
            &json!({"birthDay": {"$lt": 1}, "country": {"$eq": 2}}),
            resolver,
        )
        .unwrap_err();
        assert!(matches!(err, IdentityError::UnsupportedQuery(_)));
    }

    #[test]
    fn test_two_operators_rejected() {
        let err = Query::from_request(
            schema(),
            &json!({"birthDay": {"$lt": 20100101, "$gt": 19000101}}),
            resolver,
        )
        .unwrap_err();
        assert!(matches!(err, IdentityError::UnsupportedQuery(_)));
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = Query::from_request(schema(), &json!({"birthDay": {"$ne": 1}}), resolver)
            .unwrap_err();
        assert!(matches!(err, IdentityError::UnsupportedQuery(_)));
    }

    #[test]
    fn test_non_data_slot_rejected() {
        let query = Query {
            schema: schema(),
            slot_index: 0,
            operator: Operator::Eq,
            values: vec![SlotValue::from_u64(1)],
        };
        let err = query.matches(&birthday_claim(1)).unwrap_err();
        assert!(matches!(err, IdentityError::UnsupportedQuery(_)));
    }

    #[test]
    fn test_operator_codes() {
        assert_eq!(Operator::Noop.code(), 0);
        assert_eq!(Operator::Eq.code(), 1);
        assert_eq!(Operator::Lt.code(), 2);
        assert_eq!(Operator::Gt.code(), 3);
        assert_eq!(Operator::In.code(), 4);
    }
}
