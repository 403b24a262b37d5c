//! Per-operation request checks
//!
//! Violation field names follow the location of the failure:
//! `path.<name>`, `query.<name>`, `header.<name>` for parameters and `body`
//! or `body<json-pointer>` for the request body.

use axum::http::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use super::{compile_schema, ContractError};
use crate::api::problem::Violation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamLocation::Path => write!(f, "path"),
            ParamLocation::Query => write!(f, "query"),
            ParamLocation::Header => write!(f, "header"),
        }
    }
}

/// JSON type a raw parameter string is coerced into before schema checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarKind {
    Integer,
    Number,
    Boolean,
    String,
}

impl ScalarKind {
    fn of(schema: &Value) -> Self {
        let declared = match schema.get("type") {
            Some(Value::String(t)) => Some(t.as_str()),
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null"),
            _ => None,
        };

        match declared {
            Some("integer") => ScalarKind::Integer,
            Some("number") => ScalarKind::Number,
            Some("boolean") => ScalarKind::Boolean,
            _ => ScalarKind::String,
        }
    }

    fn coerce(self, raw: &str) -> Result<Value, String> {
        match self {
            ScalarKind::Integer => raw
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("'{}' is not an integer", raw)),
            ScalarKind::Number => raw
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("'{}' is not a number", raw)),
            ScalarKind::Boolean => match raw {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("'{}' is not a boolean", raw)),
            },
            ScalarKind::String => Ok(Value::String(raw.to_string())),
        }
    }
}

pub struct ParameterSpec {
    name: String,
    location: ParamLocation,
    required: bool,
    kind: ScalarKind,
    uuid_format: bool,
    validator: jsonschema::Validator,
}

impl ParameterSpec {
    /// `None` for parameter locations that are not checked (cookies)
    fn compile(value: &Value, location: &str) -> Result<Option<Self>, ContractError> {
        let invalid = |message: &str| ContractError::Parameter {
            location: location.to_string(),
            message: message.to_string(),
        };

        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("missing name"))?;
        let param_location = match value.get("in").and_then(Value::as_str) {
            Some("path") => ParamLocation::Path,
            Some("query") => ParamLocation::Query,
            Some("header") => ParamLocation::Header,
            Some("cookie") => return Ok(None),
            _ => return Err(invalid("`in` must be path, query, header or cookie")),
        };
        let required = param_location == ParamLocation::Path
            || value.get("required").and_then(Value::as_bool).unwrap_or(false);

        let schema = value.get("schema").cloned().unwrap_or_else(|| json!({}));
        let validator = compile_schema(&schema, &format!("{} parameter '{}'", location, name))?;

        Ok(Some(Self {
            name: name.to_string(),
            location: param_location,
            required,
            kind: ScalarKind::of(&schema),
            uuid_format: schema.get("format").and_then(Value::as_str) == Some("uuid"),
            validator,
        }))
    }

    pub fn field(&self) -> String {
        format!("{}.{}", self.location, self.name)
    }

    /// Check one raw value
    pub fn check(&self, raw: &str) -> Vec<Violation> {
        let value = match self.kind.coerce(raw) {
            Ok(value) => value,
            Err(message) => return vec![Violation::new(self.field(), message)],
        };

        if self.uuid_format && Uuid::parse_str(raw).is_err() {
            return vec![Violation::new(
                self.field(),
                format!("'{}' is not a valid UUID", raw),
            )];
        }

        self.validator
            .iter_errors(&value)
            .map(|e| Violation::new(self.field(), e.to_string()))
            .collect()
    }
}

pub struct BodySpec {
    required: bool,
    validator: jsonschema::Validator,
}

impl BodySpec {
    /// `None` when the operation declares no JSON body
    fn compile(value: Option<&Value>, location: &str) -> Result<Option<Self>, ContractError> {
        let Some(request_body) = value else {
            return Ok(None);
        };
        let Some(media) = request_body
            .get("content")
            .and_then(|content| content.get("application/json"))
        else {
            return Ok(None);
        };

        let schema = media.get("schema").cloned().unwrap_or_else(|| json!({}));
        let validator = compile_schema(&schema, &format!("{} request body", location))?;

        Ok(Some(Self {
            required: request_body
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            validator,
        }))
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn check(&self, content_type: Option<&HeaderValue>, bytes: &[u8]) -> Vec<Violation> {
        if bytes.is_empty() {
            return if self.required {
                vec![Violation::new("body", "request body is required")]
            } else {
                Vec::new()
            };
        }

        if !is_json(content_type) {
            return vec![Violation::new("body", "Content-Type must be application/json")];
        }

        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(e) => return vec![Violation::new("body", format!("invalid JSON: {}", e))],
        };

        self.validator
            .iter_errors(&value)
            .map(|e| {
                let pointer = e.instance_path.to_string();
                Violation::new(format!("body{}", pointer), e.to_string())
            })
            .collect()
    }
}

fn is_json(content_type: Option<&HeaderValue>) -> bool {
    let Some(mime) = content_type
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::trim)
    else {
        return false;
    };

    mime.eq_ignore_ascii_case("application/json")
        || mime.to_ascii_lowercase().ends_with("+json")
}

/// The checks for one method on one path
pub struct OperationSpec {
    operation_id: Option<String>,
    parameters: Vec<ParameterSpec>,
    body: Option<BodySpec>,
}

impl OperationSpec {
    /// `shared` are the path-level parameters; operation-level ones with the
    /// same name and location replace them
    pub(super) fn compile(
        location: &str,
        shared: &[Value],
        operation: &Value,
    ) -> Result<Self, ContractError> {
        let own = operation
            .get("parameters")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut parameters: Vec<ParameterSpec> = Vec::new();
        for value in shared.iter().chain(own) {
            let Some(param) = ParameterSpec::compile(value, location)? else {
                continue;
            };
            parameters.retain(|p| !(p.name == param.name && p.location == param.location));
            parameters.push(param);
        }

        Ok(Self {
            operation_id: operation
                .get("operationId")
                .and_then(Value::as_str)
                .map(str::to_string),
            parameters,
            body: BodySpec::compile(operation.get("requestBody"), location)?,
        })
    }

    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn body(&self) -> Option<&BodySpec> {
        self.body.as_ref()
    }

    /// Check every declared parameter, collecting all violations
    pub fn check_parameters(
        &self,
        path_params: &HashMap<String, String>,
        query: &[(String, String)],
        headers: &HeaderMap,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();

        for param in &self.parameters {
            let raw: Option<Result<&str, ()>> = match param.location {
                ParamLocation::Path => path_params.get(&param.name).map(|v| Ok(v.as_str())),
                ParamLocation::Query => query
                    .iter()
                    .find(|(key, _)| key == &param.name)
                    .map(|(_, v)| Ok(v.as_str())),
                ParamLocation::Header => headers
                    .get(param.name.as_str())
                    .map(|v| v.to_str().map_err(|_| ())),
            };

            match raw {
                None if param.required => violations.push(Violation::new(
                    param.field(),
                    format!("missing required {} parameter", param.location),
                )),
                None => {},
                Some(Err(())) => violations.push(Violation::new(
                    param.field(),
                    "value is not valid visible ASCII",
                )),
                Some(Ok(raw)) => violations.extend(param.check(raw)),
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operation(value: Value) -> OperationSpec {
        OperationSpec::compile("GET /test", &[], &value).unwrap()
    }

    fn list_operation() -> OperationSpec {
        operation(json!({
            "parameters": [
                {"name": "skip", "in": "query", "schema": {"type": "integer", "minimum": 0}},
                {"name": "limit", "in": "query", "schema": {"type": "integer", "minimum": 1, "maximum": 100}},
                {"name": "X-Trace", "in": "header", "required": true, "schema": {"type": "string"}},
                {"name": "session", "in": "cookie", "schema": {"type": "string"}}
            ]
        }))
    }

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn trace_header() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        headers
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    #[test]
    fn test_cookie_parameters_skipped() {
        assert_eq!(list_operation().parameters().len(), 3);
    }

    #[test]
    fn test_valid_parameters_pass() {
        let violations = list_operation().check_parameters(
            &HashMap::new(),
            &query(&[("skip", "5"), ("limit", "100")]),
            &trace_header(),
        );
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_all_violations_collected() {
        let violations = list_operation().check_parameters(
            &HashMap::new(),
            &query(&[("skip", "-1"), ("limit", "lots")]),
            &HeaderMap::new(),
        );

        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["query.skip", "query.limit", "header.X-Trace"]);
        assert!(violations[1].message.contains("not an integer"));
        assert!(violations[2].message.contains("missing required header"));
    }

    #[test]
    fn test_maximum_enforced() {
        let violations = list_operation().check_parameters(
            &HashMap::new(),
            &query(&[("limit", "101")]),
            &trace_header(),
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "query.limit");
    }

    #[test]
    fn test_uuid_path_parameter() {
        let op = operation(json!({
            "parameters": [{"name": "id", "in": "path", "schema": {"type": "string", "format": "uuid"}}]
        }));

        let mut params = HashMap::new();
        params.insert("id".to_string(), "not-a-uuid".to_string());
        let violations = op.check_parameters(&params, &[], &HeaderMap::new());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "path.id");

        params.insert("id".to_string(), Uuid::new_v4().to_string());
        assert!(op.check_parameters(&params, &[], &HeaderMap::new()).is_empty());
    }

    #[test]
    fn test_operation_parameter_overrides_shared() {
        let shared = vec![json!({"name": "limit", "in": "query", "schema": {"type": "integer", "maximum": 10}})];
        let op = OperationSpec::compile(
            "GET /test",
            &shared,
            &json!({"parameters": [{"name": "limit", "in": "query", "schema": {"type": "integer", "maximum": 50}}]}),
        )
        .unwrap();

        assert_eq!(op.parameters().len(), 1);
        let violations = op.check_parameters(&HashMap::new(), &query(&[("limit", "20")]), &HeaderMap::new());
        assert!(violations.is_empty());
    }

    #[test]
    fn test_boolean_and_number_coercion() {
        assert_eq!(ScalarKind::Boolean.coerce("true"), Ok(Value::Bool(true)));
        assert!(ScalarKind::Boolean.coerce("yes").is_err());
        assert_eq!(ScalarKind::Number.coerce("1.5"), Ok(json!(1.5)));
        assert!(ScalarKind::Number.coerce("NaN").is_err());
        assert_eq!(ScalarKind::of(&json!({"type": ["integer", "null"]})), ScalarKind::Integer);
        assert_eq!(ScalarKind::of(&json!({})), ScalarKind::String);
    }

    // ========================================================================
    // Body
    // ========================================================================

    fn create_operation() -> OperationSpec {
        operation(json!({
            "requestBody": {
                "required": true,
                "content": {"application/json": {"schema": {
                    "type": "object",
                    "required": ["title"],
                    "properties": {
                        "title": {"type": "string", "minLength": 1, "maxLength": 255},
                        "description": {"type": ["string", "null"], "maxLength": 255}
                    }
                }}}
            }
        }))
    }

    fn json_type() -> HeaderValue {
        HeaderValue::from_static("application/json; charset=utf-8")
    }

    #[test]
    fn test_valid_body_passes() {
        let op = create_operation();
        let body = op.body().unwrap();
        assert!(body.required());
        assert!(body.check(Some(&json_type()), br#"{"title":"milk","description":null}"#).is_empty());
    }

    #[test]
    fn test_missing_required_body() {
        let violations = create_operation().body().unwrap().check(None, b"");
        assert_eq!(violations, vec![Violation::new("body", "request body is required")]);
    }

    #[test]
    fn test_wrong_content_type() {
        let violations = create_operation()
            .body()
            .unwrap()
            .check(Some(&HeaderValue::from_static("text/plain")), br#"{"title":"milk"}"#);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "body");
    }

    #[test]
    fn test_invalid_json() {
        let violations = create_operation()
            .body()
            .unwrap()
            .check(Some(&json_type()), b"{\"title\":");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.starts_with("invalid JSON"));
    }

    #[test]
    fn test_schema_errors_use_json_pointer_fields() {
        let long = "x".repeat(256);
        let body = format!(r#"{{"title":"","description":"{}"}}"#, long);
        let violations = create_operation()
            .body()
            .unwrap()
            .check(Some(&json_type()), body.as_bytes());

        let mut fields: Vec<_> = violations.iter().map(|v| v.field.clone()).collect();
        fields.sort();
        assert_eq!(fields, vec!["body/description", "body/title"]);
    }

    #[test]
    fn test_missing_property_reported_at_root() {
        let violations = create_operation()
            .body()
            .unwrap()
            .check(Some(&json_type()), br#"{"description":"x"}"#);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "body");
    }

    #[test]
    fn test_operation_without_body() {
        assert!(list_operation().body().is_none());
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(Some(&HeaderValue::from_static("application/json"))));
        assert!(is_json(Some(&HeaderValue::from_static("Application/JSON; charset=utf-8"))));
        assert!(is_json(Some(&HeaderValue::from_static("application/merge-patch+json"))));
        assert!(!is_json(Some(&HeaderValue::from_static("text/json-ish"))));
        assert!(!is_json(None));
    }
}
