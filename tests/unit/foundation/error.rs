use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        VoxframeError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        VoxframeError::unsupported("x")
            .to_string()
            .contains("unsupported capability:")
    );
    assert!(
        VoxframeError::resource_load("x")
            .to_string()
            .contains("resource load error:")
    );
    assert!(
        VoxframeError::capture("x")
            .to_string()
            .contains("capture error:")
    );
    assert!(
        VoxframeError::encoding_unsupported("x")
            .to_string()
            .contains("encoding unsupported:")
    );
}

#[test]
fn each_variant_maps_to_one_kind() {
    assert_eq!(
        VoxframeError::synthesis("engine crashed").kind(),
        FailureKind::Synthesis
    );
    assert_eq!(VoxframeError::Cancelled.kind(), FailureKind::Cancelled);
    assert!(VoxframeError::Cancelled.is_cancelled());
    assert!(!VoxframeError::capture("x").is_cancelled());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = VoxframeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), FailureKind::Other);
}
