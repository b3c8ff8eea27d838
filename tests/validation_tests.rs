/// Unit tests for lead schema validation
/// Tests discriminant handling, field rules and type guards
use lead_intake_api::models::{ContactSubject, LeadInput, LeadType, Quantity};
use lead_intake_api::validation::{is_valid_email, validate};
use serde_json::{json, Value};

fn contact() -> Value {
    json!({
        "type": "contact",
        "fullName": "  John Doe ",
        "email": "John@Example.com",
        "subject": "distributor",
        "message": "We would like to become a regional distributor.",
        "company": "Doe Trading",
        "marketingConsent": true,
        "turnstileToken": "token-123"
    })
}

fn product() -> Value {
    json!({
        "type": "product",
        "fullName": "Ana Lima",
        "email": "ana@example.com",
        "productSlug": "steel-drum",
        "productName": "Steel Drum",
        "quantity": "1-2 pallets"
    })
}

fn newsletter() -> Value {
    json!({"type": "newsletter", "email": "news@example.com"})
}

#[cfg(test)]
mod discriminant_tests {
    use super::*;

    #[test]
    fn test_exactly_one_guard_matches() {
        for (raw, expected) in [
            (contact(), LeadType::Contact),
            (product(), LeadType::Product),
            (newsletter(), LeadType::Newsletter),
        ] {
            let lead = validate(&raw).unwrap();
            let guards = [lead.is_contact(), lead.is_product(), lead.is_newsletter()];
            assert_eq!(guards.iter().filter(|g| **g).count(), 1);
            assert_eq!(lead.lead_type(), expected);
        }
    }

    #[test]
    fn test_fields_of_other_variants_do_not_change_the_variant() {
        let mut raw = newsletter();
        raw["fullName"] = json!("Someone Else");
        raw["productSlug"] = json!("steel-drum");
        assert!(validate(&raw).unwrap().is_newsletter());
    }

    #[test]
    fn test_type_is_trimmed_but_case_sensitive() {
        let mut raw = newsletter();
        raw["type"] = json!(" newsletter ");
        assert!(validate(&raw).is_ok());
        raw["type"] = json!("Newsletter");
        assert!(validate(&raw).is_err());
    }
}

#[cfg(test)]
mod contact_tests {
    use super::*;

    #[test]
    fn test_valid_contact_is_normalized() {
        let LeadInput::Contact(lead) = validate(&contact()).unwrap() else {
            panic!("expected contact");
        };
        assert_eq!(lead.full_name, "John Doe");
        assert_eq!(lead.email, "john@example.com");
        assert_eq!(lead.subject, ContactSubject::Distributor);
        assert_eq!(lead.company.as_deref(), Some("Doe Trading"));
        assert!(lead.marketing_consent);
        assert_eq!(lead.submitted_at, None);
    }

    #[test]
    fn test_message_bounds() {
        let mut raw = contact();
        raw["message"] = json!("too short");
        assert!(validate(&raw).unwrap_err().has_issue_for("message"));

        raw["message"] = json!("x".repeat(5001));
        assert!(validate(&raw).unwrap_err().has_issue_for("message"));

        raw["message"] = json!("x".repeat(5000));
        assert!(validate(&raw).is_ok());
    }

    #[test]
    fn test_whitespace_only_message_is_missing() {
        let mut raw = contact();
        raw["message"] = json!("              ");
        assert!(validate(&raw).unwrap_err().has_issue_for("message"));
    }

    #[test]
    fn test_name_bounds() {
        let mut raw = contact();
        raw["fullName"] = json!("J");
        assert!(validate(&raw).unwrap_err().has_issue_for("fullName"));
        raw["fullName"] = json!("J".repeat(101));
        assert!(validate(&raw).unwrap_err().has_issue_for("fullName"));
    }

    #[test]
    fn test_subject_must_be_in_closed_set() {
        let mut raw = contact();
        raw["subject"] = json!("sales");
        assert!(validate(&raw).unwrap_err().has_issue_for("subject"));
    }

    #[test]
    fn test_turnstile_token_required() {
        let mut raw = contact();
        raw.as_object_mut().unwrap().remove("turnstileToken");
        assert!(validate(&raw).unwrap_err().has_issue_for("turnstileToken"));
    }

    #[test]
    fn test_wrong_type_for_consent() {
        let mut raw = contact();
        raw["marketingConsent"] = json!("yes");
        assert!(validate(&raw).unwrap_err().has_issue_for("marketingConsent"));
    }
}

#[cfg(test)]
mod product_tests {
    use super::*;

    #[test]
    fn test_numeric_and_text_quantity() {
        let LeadInput::Product(lead) = validate(&product()).unwrap() else {
            panic!("expected product");
        };
        assert_eq!(lead.quantity, Quantity::Text("1-2 pallets".into()));

        let mut raw = product();
        raw["quantity"] = json!(120);
        let LeadInput::Product(lead) = validate(&raw).unwrap() else {
            panic!("expected product");
        };
        assert_eq!(lead.quantity, Quantity::Count(120.0));
    }

    #[test]
    fn test_huge_quantity_displays_in_full() {
        let mut raw = product();
        raw["quantity"] = json!(1e25);
        let LeadInput::Product(lead) = validate(&raw).unwrap() else {
            panic!("expected product");
        };
        assert_eq!(lead.quantity.to_string(), "10000000000000000000000000");
    }

    #[test]
    fn test_quantity_required() {
        let mut raw = product();
        raw.as_object_mut().unwrap().remove("quantity");
        assert!(validate(&raw).unwrap_err().has_issue_for("quantity"));

        raw["quantity"] = json!(true);
        assert!(validate(&raw).unwrap_err().has_issue_for("quantity"));

        raw["quantity"] = json!(-3);
        assert!(validate(&raw).unwrap_err().has_issue_for("quantity"));
    }

    #[test]
    fn test_requirements_length_limit() {
        let mut raw = product();
        raw["requirements"] = json!("r".repeat(2001));
        assert!(validate(&raw).unwrap_err().has_issue_for("requirements"));
    }
}

#[cfg(test)]
mod email_validation_tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user@example.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));
        assert!(is_valid_email("user_name@example-domain.com"));
        assert!(is_valid_email("a@b.com"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@examplecom"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email("user @example.com"));
        assert!(!is_valid_email("user@exam ple.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_newsletter_email_rejected() {
        let err = validate(&json!({"type": "newsletter", "email": "not-an-email"})).unwrap_err();
        assert!(err.has_issue_for("email"));
        assert_eq!(err.issues.len(), 1);
    }
}
