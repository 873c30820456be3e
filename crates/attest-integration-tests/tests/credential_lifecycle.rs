//! Registry → schema → signer → store → checks, across crate boundaries.

use std::sync::Arc;

use serde_json::json;

use attest_core::Timestamp;
use attest_crypto::MemoryKeyStore;
use attest_did::{DidRegistry, DidResolver, DidStatus};
use attest_schema::{CredentialSchema, SchemaRegistry, SchemaSource};
use attest_vc::{
    CredentialChecks, CredentialRecord, CredentialRepository, CredentialSigner, CredentialStore,
    IssueRequest, PresentationEngine, PresentationError, RecordError, SignerError, StatusLedger,
};

struct Stack {
    dids: DidRegistry,
    schemas: SchemaRegistry,
    signer: CredentialSigner,
    presentations: PresentationEngine,
    store: CredentialStore,
    ledger: StatusLedger,
    checks: CredentialChecks,
}

fn stack() -> Stack {
    let dids = DidRegistry::new(Arc::new(MemoryKeyStore::new()));
    let resolver: Arc<dyn DidResolver> = Arc::new(dids.clone());
    let signer = CredentialSigner::new(dids.key_store(), Arc::clone(&resolver));
    let presentations = PresentationEngine::new(dids.key_store(), resolver);
    let ledger = StatusLedger::new();
    let checks = CredentialChecks::new(signer.clone(), ledger.clone());
    let schemas = SchemaRegistry::new();
    schemas
        .register(CredentialSchema {
            id: "employment-v1".into(),
            name: "Employment".into(),
            credential_type: "EmploymentCredential".into(),
            version: "1.0".into(),
            schema: json!({
                "type": "object",
                "required": ["employer", "role"],
                "properties": {
                    "employer": {"type": "string"},
                    "role": {"type": "string"},
                    "since": {"type": "string", "format": "date"}
                }
            }),
        })
        .unwrap();
    Stack {
        dids,
        schemas,
        signer,
        presentations,
        store: CredentialStore::new(),
        ledger,
        checks,
    }
}

#[test]
fn schema_checked_issuance_through_revocation() {
    let s = stack();
    let employer = s.dids.create_did(Some("acme")).unwrap();
    let employee = s.dids.create_did(Some("dana")).unwrap();

    let claims = json!({"id": employee.id.as_str(), "employer": "Acme", "role": "Engineer"});
    s.schemas.validate_claims("employment-v1", &claims).unwrap();
    let schema = s.schemas.schema("employment-v1").unwrap();

    let vc = s
        .signer
        .issue(IssueRequest::new(employer.id.clone(), claims).with_type(schema.credential_type))
        .unwrap();
    s.store
        .create(CredentialRecord::new(vc.clone(), Some("employment-v1".into())).unwrap())
        .unwrap();
    assert!(matches!(
        s.store.create(CredentialRecord::new(vc.clone(), None).unwrap()),
        Err(RecordError::DuplicateId(_))
    ));

    let now = Timestamp::now();
    assert!(s.checks.check(&vc, now).verified);

    let vp = s
        .presentations
        .present(&employee.id, vec![vc.clone()], Some("c-1".into()), None)
        .unwrap();
    assert!(s.presentations.verify(&vp, Some("c-1"), None).verified);

    s.ledger.revoke(&vc.id, Some("left the company".into())).unwrap();
    let outcome = s.checks.check(&vc, now);
    assert!(!outcome.verified);
    assert!(outcome.reason.unwrap().contains("revoked"));
    assert!(matches!(
        s.ledger.revoke(&vc.id, None),
        Err(RecordError::AlreadyRevoked(_))
    ));
}

#[test]
fn invalid_claims_report_every_violation() {
    let s = stack();
    let err = s
        .schemas
        .validate_claims("employment-v1", &json!({"employer": 12}))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("employment-v1"), "{message}");
}

#[test]
fn status_changes_gate_signing_but_not_past_credentials() {
    let s = stack();
    let issuer = s.dids.create_did(Some("acme")).unwrap();
    let holder = s.dids.create_did(Some("dana")).unwrap();
    let vc = s
        .signer
        .issue(IssueRequest::new(issuer.id.clone(), json!({"role": "Engineer"})))
        .unwrap();

    s.dids.set_status(&issuer.id, DidStatus::Revoked).unwrap();
    assert!(matches!(
        s.signer.issue(IssueRequest::new(issuer.id.clone(), json!({}))),
        Err(SignerError::IssuerInactive { .. })
    ));
    assert!(s.checks.check(&vc, Timestamp::now()).verified);

    s.dids.set_status(&holder.id, DidStatus::Deactivated).unwrap();
    assert!(matches!(
        s.presentations.present(&holder.id, vec![vc], None, None),
        Err(PresentationError::HolderInactive { .. })
    ));
}

#[test]
fn foreign_did_key_issuers_verify_without_registration() {
    let s = stack();
    let wallet = attest_cli::wallet::LocalWallet::from_seed_hex(
        "4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb",
    )
    .unwrap();
    let vc = wallet
        .signer()
        .issue(IssueRequest::new(wallet.did().clone(), json!({"name": "x"})))
        .unwrap();
    assert!(s.dids.get_local(wallet.did()).is_none());
    assert!(s.checks.check(&vc, Timestamp::now()).verified);
}
