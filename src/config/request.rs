//! Request bodies accepted from the HTTP layer

use crate::context::DataContext;
use crate::error::Result;
use serde::Deserialize;

/// Body of a "create rule" request
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateRuleRequest {
    #[serde(rename = "ruleString")]
    pub rule_string: String,
}

/// Body of an "evaluate" request
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvaluateRequest {
    #[serde(rename = "userData")]
    pub user_data: DataContext,
}

impl CreateRuleRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl EvaluateRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Value;

    #[test]
    fn test_create_rule_request() {
        let req = CreateRuleRequest::from_json(r#"{"ruleString": "age > 30"}"#).unwrap();
        assert_eq!(req.rule_string, "age > 30");
    }

    #[test]
    fn test_evaluate_request() {
        let req = EvaluateRequest::from_json(
            r#"{"userData": {"age": 35, "department": "Sales", "salary": 0, "experience": 3}}"#,
        )
        .unwrap();
        assert_eq!(req.user_data.get("age"), &Value::Number(35.0));
        assert_eq!(req.user_data.get("department"), &Value::from("Sales"));
        assert_eq!(req.user_data.len(), 4);
    }

    #[test]
    fn test_evaluate_request_rejects_non_object() {
        assert!(EvaluateRequest::from_json(r#"{"userData": [1, 2]}"#).is_err());
        assert!(EvaluateRequest::from_json(r#"{}"#).is_err());
    }
}
