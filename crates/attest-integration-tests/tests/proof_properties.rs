//! Property tests over credential proofs.

use proptest::prelude::*;
use serde_json::json;

use attest_cli::verify::verify_credential;
use attest_cli::wallet::LocalWallet;
use attest_core::Timestamp;
use attest_vc::IssueRequest;

fn wallet() -> LocalWallet {
    LocalWallet::from_seed_hex("0101010101010101010101010101010101010101010101010101010101010101")
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_subject_signs_and_verifies(name in "\\PC{0,40}", score in any::<i64>()) {
        let w = wallet();
        let vc = w
            .signer()
            .issue(IssueRequest::new(w.did().clone(), json!({"name": name, "score": score})))
            .unwrap();
        prop_assert!(verify_credential(&vc, Timestamp::now()).verified);
    }

    #[test]
    fn any_subject_change_breaks_the_proof(name in "[a-z]{1,20}", other in "[A-Z]{1,20}") {
        let w = wallet();
        let mut vc = w
            .signer()
            .issue(IssueRequest::new(w.did().clone(), json!({"name": name})))
            .unwrap();
        vc.credential_subject = json!({"name": other});
        prop_assert!(!verify_credential(&vc, Timestamp::now()).verified);
    }
}
