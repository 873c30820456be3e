//! # Schema Registry
//!
//! Schemas are compiled with `jsonschema` (Draft 2020-12) when registered.
//! `$ref`s resolve only against schemas already in the registry; nothing is
//! fetched over the network.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use attest_core::Store;
use jsonschema::{Retrieve, Uri, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SchemaError, Violation};

/// A credential schema descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSchema {
    /// Registry key, referenced as `schemaId` by issuance requests.
    pub id: String,
    pub name: String,
    /// Credential type stamped on credentials issued against this schema,
    /// e.g. `EducationCredential`.
    pub credential_type: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// JSON Schema for `credentialSubject`.
    pub schema: Value,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Read access to schemas, as needed by issuance.
pub trait SchemaSource: Send + Sync {
    fn schema(&self, schema_id: &str) -> Result<CredentialSchema, SchemaError>;

    /// Validate `claims` against the schema's JSON Schema, reporting every
    /// violation.
    fn validate_claims(&self, schema_id: &str, claims: &Value) -> Result<(), SchemaError>;
}

#[derive(Clone)]
struct Compiled {
    descriptor: CredentialSchema,
    validator: Arc<Validator>,
}

/// Registry of compiled credential schemas.
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    schemas: Store<String, Compiled>,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.schemas.len())
            .finish()
    }
}

/// Resolves `$ref` URIs against registered schemas only.
struct RegistryRetriever {
    by_uri: HashMap<String, Value>,
}

impl Retrieve for RegistryRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri = uri.as_str();
        if let Some(v) = self.by_uri.get(uri) {
            return Ok(v.clone());
        }
        let tail = uri.rsplit('/').next().unwrap_or(uri);
        self.by_uri
            .get(tail)
            .cloned()
            .ok_or_else(|| format!("schema reference {uri} is not registered").into())
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and register a schema. Ids are unique.
    pub fn register(&self, schema: CredentialSchema) -> Result<CredentialSchema, SchemaError> {
        if schema.id.trim().is_empty() {
            return Err(SchemaError::InvalidDescriptor("id must not be empty".into()));
        }
        if schema.credential_type.trim().is_empty() {
            return Err(SchemaError::InvalidDescriptor(
                "credentialType must not be empty".into(),
            ));
        }
        if self.schemas.contains(&schema.id) {
            return Err(SchemaError::AlreadyExists(schema.id));
        }

        let validator = self.compile(&schema)?;
        let compiled = Compiled {
            descriptor: schema.clone(),
            validator: Arc::new(validator),
        };
        if !self.schemas.insert_new(schema.id.clone(), compiled) {
            return Err(SchemaError::AlreadyExists(schema.id));
        }
        tracing::info!(schema_id = %schema.id, credential_type = %schema.credential_type, "registered credential schema");
        Ok(schema)
    }

    pub fn get(&self, schema_id: &str) -> Option<CredentialSchema> {
        self.schemas
            .get(&schema_id.to_string())
            .map(|c| c.descriptor)
    }

    /// All schemas, sorted by id.
    pub fn list(&self) -> Vec<CredentialSchema> {
        let mut all: Vec<_> = self.schemas.list().into_iter().map(|c| c.descriptor).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Register every `.json`, `.yaml` and `.yml` descriptor in `dir`, in
    /// file name order. Returns the number registered.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<usize, SchemaError> {
        let dir = dir.as_ref();
        let load_err = |path: &Path, reason: String| SchemaError::Load {
            path: path.display().to_string(),
            reason,
        };
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .map_err(|e| load_err(dir, e.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("json" | "yaml" | "yml")
                )
            })
            .collect();
        paths.sort();

        for path in &paths {
            let content =
                std::fs::read_to_string(path).map_err(|e| load_err(path, e.to_string()))?;
            let schema: CredentialSchema = match path.extension().and_then(|e| e.to_str()) {
                Some("json") => serde_json::from_str(&content)
                    .map_err(|e| load_err(path, format!("invalid JSON: {e}")))?,
                _ => serde_yaml::from_str(&content)
                    .map_err(|e| load_err(path, format!("invalid YAML: {e}")))?,
            };
            self.register(schema)?;
        }
        tracing::info!(dir = %dir.display(), count = paths.len(), "loaded credential schemas");
        Ok(paths.len())
    }

    fn compile(&self, schema: &CredentialSchema) -> Result<Validator, SchemaError> {
        let mut by_uri = HashMap::new();
        for known in self.schemas.list() {
            if let Some(id) = known.descriptor.schema.get("$id").and_then(Value::as_str) {
                by_uri.insert(id.to_string(), known.descriptor.schema.clone());
            }
            by_uri.insert(known.descriptor.id.clone(), known.descriptor.schema.clone());
        }

        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.with_retriever(RegistryRetriever { by_uri });
        opts.build(&schema.schema).map_err(|e| SchemaError::Compile {
            schema_id: schema.id.clone(),
            reason: e.to_string(),
        })
    }
}

impl SchemaSource for SchemaRegistry {
    fn schema(&self, schema_id: &str) -> Result<CredentialSchema, SchemaError> {
        self.get(schema_id)
            .ok_or_else(|| SchemaError::NotFound(schema_id.to_string()))
    }

    fn validate_claims(&self, schema_id: &str, claims: &Value) -> Result<(), SchemaError> {
        let compiled = self
            .schemas
            .get(&schema_id.to_string())
            .ok_or_else(|| SchemaError::NotFound(schema_id.to_string()))?;

        let violations: Vec<Violation> = compiled
            .validator
            .iter_errors(claims)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed {
                schema_id: schema_id.to_string(),
                violations,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn education() -> CredentialSchema {
        CredentialSchema {
            id: "education-v1".into(),
            name: "University degree".into(),
            credential_type: "EducationCredential".into(),
            version: "1.0".into(),
            schema: json!({
                "type": "object",
                "required": ["degree", "gpa"],
                "properties": {
                    "degree": {"type": "string", "minLength": 1},
                    "gpa": {"type": "number", "minimum": 0, "maximum": 4}
                }
            }),
        }
    }

    #[test]
    fn register_and_get() {
        let reg = SchemaRegistry::new();
        reg.register(education()).unwrap();
        assert_eq!(reg.get("education-v1"), Some(education()));
        assert_eq!(reg.list().len(), 1);
        assert!(reg.get("missing").is_none());
    }

    #[test]
    fn duplicate_id_rejected() {
        let reg = SchemaRegistry::new();
        reg.register(education()).unwrap();
        assert!(matches!(
            reg.register(education()),
            Err(SchemaError::AlreadyExists(_))
        ));
    }

    #[test]
    fn empty_descriptor_fields_rejected() {
        let reg = SchemaRegistry::new();
        let mut s = education();
        s.credential_type = " ".into();
        assert!(matches!(reg.register(s), Err(SchemaError::InvalidDescriptor(_))));
    }

    #[test]
    fn invalid_json_schema_rejected() {
        let reg = SchemaRegistry::new();
        let mut s = education();
        s.schema = json!({"type": 42});
        assert!(matches!(reg.register(s), Err(SchemaError::Compile { .. })));
    }

    #[test]
    fn valid_claims_pass() {
        let reg = SchemaRegistry::new();
        reg.register(education()).unwrap();
        reg.validate_claims("education-v1", &json!({"degree": "BSc", "gpa": 3.7}))
            .unwrap();
    }

    #[test]
    fn every_violation_is_reported() {
        let reg = SchemaRegistry::new();
        reg.register(education()).unwrap();
        let err = reg
            .validate_claims("education-v1", &json!({"degree": "", "gpa": 9}))
            .unwrap_err();
        match err {
            SchemaError::ValidationFailed { schema_id, violations } => {
                assert_eq!(schema_id, "education-v1");
                assert_eq!(violations.len(), 2);
                let paths: Vec<_> = violations.iter().map(|v| v.instance_path.as_str()).collect();
                assert!(paths.contains(&"/degree"));
                assert!(paths.contains(&"/gpa"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_required_field_reported_at_root() {
        let reg = SchemaRegistry::new();
        reg.register(education()).unwrap();
        let err = reg
            .validate_claims("education-v1", &json!({"degree": "BA"}))
            .unwrap_err();
        assert!(err.to_string().contains("(root)"));
        assert!(err.to_string().contains("gpa"));
    }

    #[test]
    fn unknown_schema_is_not_found() {
        let reg = SchemaRegistry::new();
        assert!(matches!(
            reg.validate_claims("nope", &json!({})),
            Err(SchemaError::NotFound(_))
        ));
        assert!(matches!(reg.schema("nope"), Err(SchemaError::NotFound(_))));
    }

    #[test]
    fn refs_resolve_against_registered_schemas() {
        let reg = SchemaRegistry::new();
        reg.register(CredentialSchema {
            id: "address".into(),
            name: "Postal address".into(),
            credential_type: "AddressCredential".into(),
            version: "1.0".into(),
            schema: json!({
                "$id": "https://schemas.attest.dev/address.json",
                "type": "object",
                "required": ["city"],
                "properties": {"city": {"type": "string"}}
            }),
        })
        .unwrap();
        reg.register(CredentialSchema {
            id: "residence".into(),
            name: "Residence".into(),
            credential_type: "ResidenceCredential".into(),
            version: "1.0".into(),
            schema: json!({
                "type": "object",
                "properties": {"home": {"$ref": "https://schemas.attest.dev/address.json"}}
            }),
        })
        .unwrap();

        assert!(reg
            .validate_claims("residence", &json!({"home": {"city": "Oslo"}}))
            .is_ok());
        assert!(reg
            .validate_claims("residence", &json!({"home": {}}))
            .is_err());
    }

    #[test]
    fn unregistered_ref_fails_to_compile() {
        let reg = SchemaRegistry::new();
        let err = reg
            .register(CredentialSchema {
                id: "dangling".into(),
                name: "Dangling".into(),
                credential_type: "X".into(),
                version: "1.0".into(),
                schema: json!({"$ref": "https://elsewhere.example/schema.json"}),
            })
            .unwrap_err();
        assert!(matches!(err, SchemaError::Compile { .. }));
    }

    #[test]
    fn load_dir_reads_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            serde_json::to_string(&education()).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.yaml"),
            "id: membership-v1\nname: Membership\ncredentialType: MembershipCredential\nschema:\n  type: object\n  required: [memberId]\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let reg = SchemaRegistry::new();
        assert_eq!(reg.load_dir(dir.path()).unwrap(), 2);
        let membership = reg.get("membership-v1").unwrap();
        assert_eq!(membership.version, "1.0");
        assert!(reg
            .validate_claims("membership-v1", &json!({"memberId": "m-1"}))
            .is_ok());
    }

    #[test]
    fn load_dir_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let reg = SchemaRegistry::new();
        assert!(matches!(reg.load_dir(dir.path()), Err(SchemaError::Load { .. })));
    }
}
