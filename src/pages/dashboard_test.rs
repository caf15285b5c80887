use super::*;

#[test]
fn greeting_prefers_display_name_then_email() {
    let mut profile = CanonicalIdentity { email: Some("ana@x.test".to_owned()), ..CanonicalIdentity::default() };
    assert_eq!(greeting(&profile), "Welcome, ana@x.test");
    profile.display_name = Some("Ana".to_owned());
    assert_eq!(greeting(&profile), "Welcome, Ana");
    assert_eq!(greeting(&CanonicalIdentity::default()), "Welcome");
}

#[test]
fn field_or_dash_fills_blank_values() {
    assert_eq!(field_or_dash(None), "-");
    assert_eq!(field_or_dash(Some("")), "-");
    assert_eq!(field_or_dash(Some("admin")), "admin");
}
