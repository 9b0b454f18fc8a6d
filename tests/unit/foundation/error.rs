use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PrintwarpError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        PrintwarpError::decode("x")
            .to_string()
            .contains("decode error:")
    );
    assert!(
        PrintwarpError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn missing_required_names_the_role() {
    let err = PrintwarpError::missing_required(AssetRole::Mask, "file not found");
    let msg = err.to_string();
    assert!(msg.contains("'mask'"));
    assert!(msg.contains("file not found"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PrintwarpError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
