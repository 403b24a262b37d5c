//! The interface contract
//!
//! The service's OpenAPI 3.1 document is compiled into the binary, served
//! verbatim at `/openapi.yaml`, and used by the schema gate to validate
//! incoming requests. At load time every local `$ref` is inlined and each
//! parameter and request body schema is compiled into a JSON Schema
//! (2020-12) validator, so a broken document fails startup rather than the
//! first request.

pub mod operation;
pub mod path;

use axum::http::Method;
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

pub use operation::{BodySpec, OperationSpec, ParamLocation, ParameterSpec};
pub use path::PathTemplate;

/// The contract shipped with the server
pub const OPENAPI_YAML: &str = include_str!("../../openapi.yaml");

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("contract is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("contract has no `paths` object")]
    MissingPaths,

    #[error("unresolvable reference '{0}'")]
    UnresolvedRef(String),

    #[error("reference cycle through '{0}'")]
    RefCycle(String),

    #[error("invalid schema at {location}: {message}")]
    Schema { location: String, message: String },

    #[error("invalid parameter at {location}: {message}")]
    Parameter { location: String, message: String },
}

/// All operations declared under one path template
pub struct RouteSpec {
    template: PathTemplate,
    operations: Vec<(Method, OperationSpec)>,
}

impl RouteSpec {
    pub fn template(&self) -> &str {
        self.template.as_str()
    }

    pub fn operation(&self, method: &Method) -> Option<&OperationSpec> {
        self.operations
            .iter()
            .find(|(declared, _)| declared == method)
            .map(|(_, operation)| operation)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.operations.iter().map(|(method, _)| method)
    }
}

pub struct ApiContract {
    document: String,
    routes: Vec<RouteSpec>,
}

impl ApiContract {
    /// Load the embedded document
    pub fn embedded() -> Result<Self, ContractError> {
        Self::from_yaml(OPENAPI_YAML)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ContractError> {
        let raw: Value = serde_yaml::from_str(text)?;
        let resolved = inline_refs(&raw, &raw, &mut Vec::new())?;

        let paths = resolved
            .get("paths")
            .and_then(Value::as_object)
            .ok_or(ContractError::MissingPaths)?;

        let mut routes = Vec::with_capacity(paths.len());
        for (template, item) in paths {
            routes.push(compile_route(template, item)?);
        }
        routes.sort_by(|a, b| b.template.specificity().cmp(&a.template.specificity()));

        tracing::debug!(paths = routes.len(), "Compiled interface contract");

        Ok(Self {
            document: text.to_string(),
            routes,
        })
    }

    /// The document as written
    pub fn document(&self) -> &str {
        &self.document
    }

    /// The route whose template matches `path`, with its captured path parameters
    pub fn match_route(&self, path: &str) -> Option<(&RouteSpec, HashMap<String, String>)> {
        self.routes
            .iter()
            .find_map(|route| route.template.matches(path).map(|params| (route, params)))
    }
}

fn compile_route(template: &str, item: &Value) -> Result<RouteSpec, ContractError> {
    let empty = Map::new();
    let item = item.as_object().unwrap_or(&empty);
    let shared = item
        .get("parameters")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut operations = Vec::new();
    for (key, operation) in item {
        let Some(method) = http_method(key) else {
            continue;
        };
        let location = format!("{} {}", method, template);
        operations.push((method, OperationSpec::compile(&location, shared, operation)?));
    }

    Ok(RouteSpec {
        template: PathTemplate::parse(template),
        operations,
    })
}

fn http_method(key: &str) -> Option<Method> {
    match key {
        "get" => Some(Method::GET),
        "put" => Some(Method::PUT),
        "post" => Some(Method::POST),
        "delete" => Some(Method::DELETE),
        "options" => Some(Method::OPTIONS),
        "head" => Some(Method::HEAD),
        "patch" => Some(Method::PATCH),
        "trace" => Some(Method::TRACE),
        _ => None,
    }
}

/// Replace every local `{"$ref": "#/..."}` with a copy of its target
fn inline_refs(value: &Value, root: &Value, stack: &mut Vec<String>) -> Result<Value, ContractError> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                if stack.contains(reference) {
                    return Err(ContractError::RefCycle(reference.clone()));
                }
                let target = reference
                    .strip_prefix('#')
                    .and_then(|pointer| root.pointer(pointer))
                    .ok_or_else(|| ContractError::UnresolvedRef(reference.clone()))?;

                stack.push(reference.clone());
                let resolved = inline_refs(target, root, stack);
                stack.pop();
                return resolved;
            }

            map.iter()
                .map(|(key, child)| Ok((key.clone(), inline_refs(child, root, stack)?)))
                .collect::<Result<Map<String, Value>, ContractError>>()
                .map(Value::Object)
        },
        Value::Array(items) => items
            .iter()
            .map(|child| inline_refs(child, root, stack))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

/// Compile a JSON Schema (2020-12) validator
pub(crate) fn compile_schema(
    schema: &Value,
    location: &str,
) -> Result<jsonschema::Validator, ContractError> {
    jsonschema::options()
        .with_draft(jsonschema::Draft::Draft202012)
        .build(schema)
        .map_err(|e| ContractError::Schema {
            location: location.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embedded_contract_loads() {
        let contract = ApiContract::embedded().unwrap();
        assert!(contract.document().starts_with("openapi: 3.1"));

        let (route, params) = contract.match_route("/v1/items/123").unwrap();
        assert_eq!(route.template(), "/v1/items/{id}");
        assert_eq!(params["id"], "123");

        let methods: Vec<_> = route.methods().cloned().collect();
        assert!(methods.contains(&Method::GET));
        assert!(methods.contains(&Method::PUT));
        assert!(methods.contains(&Method::DELETE));
        assert!(route.operation(&Method::POST).is_none());
    }

    #[test]
    fn test_unknown_paths_do_not_match() {
        let contract = ApiContract::embedded().unwrap();
        assert!(contract.match_route("/v1/widgets").is_none());
        assert!(contract.match_route("/healthz").is_none());
    }

    #[test]
    fn test_inline_refs_resolves_nested_pointers() {
        let doc = json!({
            "components": {"schemas": {
                "A": {"$ref": "#/components/schemas/B"},
                "B": {"type": "string"}
            }},
            "use": {"$ref": "#/components/schemas/A"}
        });

        let resolved = inline_refs(&doc, &doc, &mut Vec::new()).unwrap();
        assert_eq!(resolved["use"], json!({"type": "string"}));
    }

    #[test]
    fn test_inline_refs_detects_cycles() {
        let doc = json!({
            "components": {"schemas": {
                "A": {"$ref": "#/components/schemas/B"},
                "B": {"$ref": "#/components/schemas/A"}
            }}
        });

        let result = inline_refs(&doc, &doc, &mut Vec::new());
        assert!(matches!(result, Err(ContractError::RefCycle(_))));
    }

    #[test]
    fn test_dangling_ref_fails_load() {
        let yaml = r##"
openapi: 3.1.0
paths:
  /things:
    get:
      parameters:
        - $ref: "#/components/parameters/Nope"
"##;
        assert!(matches!(
            ApiContract::from_yaml(yaml),
            Err(ContractError::UnresolvedRef(_))
        ));
    }

    #[test]
    fn test_missing_paths_rejected() {
        assert!(matches!(
            ApiContract::from_yaml("openapi: 3.1.0\n"),
            Err(ContractError::MissingPaths)
        ));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert!(matches!(
            ApiContract::from_yaml("paths: [unclosed"),
            Err(ContractError::Parse(_))
        ));
    }
}
