use std::collections::HashMap;

use serde_json::{json, Value};

use sd_vc::did_resolve::StaticResolver;
use sd_vc::key::KeyMaterial;
use sd_vc::sd_jwt::{disclose, issue_sd, present_vp, verify_sd_jwt, verify_vp};
use sd_vc::vc::create_credential;

fn subject_claims() -> HashMap<String, Value> {
    serde_json::from_value(json!({
        "fname": "John",
        "sname": "Doe",
        "nationalId": "ajj3i23293f290"
    }))
    .unwrap()
}

#[async_std::test]
async fn issue_store_present_verify() {
    let issuer = KeyMaterial::generate_secp256k1("did:example:issuer");
    let holder = KeyMaterial::generate_ed25519("did:example:holder");
    let resolver = StaticResolver::new([issuer.to_public(), holder.to_public()]);

    // issuer side
    let credential = create_credential(&issuer.did, &holder.did, subject_claims(), &[]);
    let sd_jwt = issue_sd(
        &issuer,
        credential.to_jwt_claims().unwrap(),
        "ES256K",
        &["fname", "sname"],
    )
    .unwrap();

    // holder stores the full SD-JWT and can verify it locally
    let stored = verify_sd_jwt(&sd_jwt, &resolver).await.unwrap();
    assert_eq!(stored.disclosed["fname"], json!("John"));
    assert_eq!(stored.disclosed["sname"], json!("Doe"));

    // holder presents a subset to a verifier
    let presentation = present_vp(&holder, &[sd_jwt.clone()], &[vec!["fname"]]).unwrap();
    let verified = verify_vp(&presentation, &resolver).await.unwrap();
    assert_eq!(verified.holder.as_deref(), Some("did:example:holder"));
    assert_eq!(verified.disclosed[0]["fname"], json!("John"));
    assert!(!verified.disclosed[0].contains_key("sname"));

    // the derived single-credential form verifies too
    let derived = disclose(&sd_jwt, &["sname"]).unwrap();
    let verified = verify_sd_jwt(&derived, &resolver).await.unwrap();
    assert_eq!(verified.disclosed["sname"], json!("Doe"));
    assert!(!verified.disclosed.contains_key("fname"));

    // undisclosed claims never appear in the signed payload
    let claims = verified.claims.verifiable_credential.unwrap();
    let properties = claims.credential_subject.property_set.unwrap();
    assert!(!properties.contains_key("fname"));
    assert!(!properties.contains_key("sname"));
    assert_eq!(properties["nationalId"], json!("ajj3i23293f290"));
}
