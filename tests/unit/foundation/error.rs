use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ThumbError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(ThumbError::decode("x").to_string().contains("decode error:"));
    assert!(ThumbError::render("x").to_string().contains("render error:"));
    assert!(
        ThumbError::storage("x")
            .to_string()
            .contains("storage error:")
    );
    assert!(
        ThumbError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ThumbError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde_variant() {
    let err: ThumbError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, ThumbError::Serde(_)));
}
