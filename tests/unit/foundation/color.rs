use super::*;

#[test]
fn parses_hex_forms() {
    assert_eq!(Color::parse("#336699").unwrap(), Color::rgba(0x33, 0x66, 0x99, 255));
    assert_eq!(Color::parse("FF000080").unwrap(), Color::rgba(255, 0, 0, 0x80));
    assert_eq!(Color::parse("#fff").unwrap(), Color::WHITE);
    assert!(Color::parse("#12345").is_err());
    assert!(Color::parse("#gg0000").is_err());
}

#[test]
fn deserializes_object_and_array_forms() {
    let c: Color = serde_json::from_str(r#"{"r": 1, "g": 2, "b": 3}"#).unwrap();
    assert_eq!(c, Color::rgba(1, 2, 3, 255));

    let c: Color = serde_json::from_str("[4, 5, 6, 7]").unwrap();
    assert_eq!(c, Color::rgba(4, 5, 6, 7));

    assert!(serde_json::from_str::<Color>("[1, 2]").is_err());
}

#[test]
fn serializes_to_hex() {
    let s = serde_json::to_string(&Color::rgba(0x33, 0x66, 0x99, 255)).unwrap();
    assert_eq!(s, "\"#336699\"");
    assert_eq!(Color::rgba(0, 0, 0, 0).to_hex(), "#00000000");
}
