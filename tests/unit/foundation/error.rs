use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        InkframeError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(InkframeError::config("x").to_string().contains("config error:"));
    assert!(
        InkframeError::structural("x")
            .to_string()
            .contains("structural error:")
    );
    assert!(InkframeError::run("x").to_string().contains("run error:"));
    assert!(InkframeError::driver("x").to_string().contains("driver error:"));
}

#[test]
fn only_structural_faults_are_structural() {
    assert!(InkframeError::structural("dangling edge").is_structural());
    assert!(!InkframeError::run("boom").is_structural());
    assert!(!InkframeError::config("bad field").is_structural());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = InkframeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
