//! Presentation requests end to end: policy, challenge-bound
//! presentation, auto-approval and manual review.

use std::sync::Arc;

use serde_json::json;

use attest_crypto::MemoryKeyStore;
use attest_did::{DidRegistry, DidResolver};
use attest_vc::{
    CredentialChecks, CredentialSigner, IssueRequest, PresentationEngine, RequiredCredential,
    StatusLedger,
};
use attest_workflow::{
    NewPresentationRequest, SubmissionStatus, SubmissionVerifier, SubmittedArtifact,
    VerificationPolicy, VerificationWorkflow, SYSTEM_REVIEWER,
};

struct World {
    dids: DidRegistry,
    signer: CredentialSigner,
    presentations: PresentationEngine,
    ledger: StatusLedger,
    workflow: VerificationWorkflow,
}

fn world() -> World {
    let dids = DidRegistry::new(Arc::new(MemoryKeyStore::new()));
    let resolver: Arc<dyn DidResolver> = Arc::new(dids.clone());
    let signer = CredentialSigner::new(dids.key_store(), Arc::clone(&resolver));
    let presentations = PresentationEngine::new(dids.key_store(), resolver);
    let ledger = StatusLedger::new();
    let checks = CredentialChecks::new(signer.clone(), ledger.clone());
    let workflow = VerificationWorkflow::new(SubmissionVerifier::new(presentations.clone(), checks));
    World {
        dids,
        signer,
        presentations,
        ledger,
        workflow,
    }
}

fn kyc_policy(auto_approve: bool) -> VerificationPolicy {
    let mut policy = VerificationPolicy::new("kyc", 365);
    policy.credential_types.insert("IdentityCredential".into());
    policy.required_attributes.insert("address.country".into());
    policy.auto_approve = auto_approve;
    policy
}

#[test]
fn auto_approved_presentation() {
    let w = world();
    let bank = "bank-verifier";
    let registrar = w.dids.create_did(Some("registrar")).unwrap();
    let holder = w.dids.create_did(Some("erin")).unwrap();
    w.workflow.create_policy(bank, kyc_policy(true)).unwrap();

    let request = w
        .workflow
        .create_request(
            bank,
            NewPresentationRequest {
                name: "Account opening".into(),
                policy: Some("kyc".into()),
                domain: Some("bank.example".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(
        request.required_credentials,
        vec![RequiredCredential::of_type("IdentityCredential")]
    );

    let vc = w
        .signer
        .issue(
            IssueRequest::new(
                registrar.id.clone(),
                json!({"id": holder.id.as_str(), "address": {"country": "NZ"}}),
            )
            .with_type("IdentityCredential"),
        )
        .unwrap();
    let vp = w
        .presentations
        .present(
            &holder.id,
            vec![vc],
            Some(request.challenge.clone()),
            request.domain.clone(),
        )
        .unwrap();

    let submission = w
        .workflow
        .submit(&request.id, "erin", SubmittedArtifact::Presentation(vp))
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Verified);
    assert_eq!(submission.reviewed_by.as_deref(), Some(SYSTEM_REVIEWER));
    assert!(submission.verification_result.unwrap().verified);
}

#[test]
fn revoked_credential_is_rejected_on_review() {
    let w = world();
    let registrar = w.dids.create_did(Some("registrar")).unwrap();
    let holder = w.dids.create_did(Some("erin")).unwrap();
    w.workflow.create_policy("bank", kyc_policy(false)).unwrap();
    let request = w
        .workflow
        .create_request(
            "bank",
            NewPresentationRequest {
                name: "Account opening".into(),
                policy: Some("kyc".into()),
                ..Default::default()
            },
        )
        .unwrap();

    let vc = w
        .signer
        .issue(
            IssueRequest::new(registrar.id.clone(), json!({"address": {"country": "NZ"}}))
                .with_type("IdentityCredential"),
        )
        .unwrap();
    let vp = w
        .presentations
        .present(&holder.id, vec![vc.clone()], Some(request.challenge.clone()), None)
        .unwrap();
    let submission = w
        .workflow
        .submit(&request.id, "erin", SubmittedArtifact::Presentation(vp))
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Pending);

    w.ledger.revoke(&vc.id, None).unwrap();
    let decided = w
        .workflow
        .decide(&submission.id, "bank", Some("checked".into()))
        .unwrap();
    assert_eq!(decided.status, SubmissionStatus::Rejected);
    assert_eq!(decided.review_notes.as_deref(), Some("checked"));
    assert!(decided
        .verification_result
        .and_then(|o| o.reason)
        .unwrap()
        .contains("revoked"));
}
