//! Filename-heuristic document verifier.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    Application, DocumentRef, FieldMatch, FieldMismatch, MismatchSeverity, UserId,
    VerificationResult, VerificationStatus,
};
use crate::infra::Result;

use super::Verifier;

/// Document classes the heuristic recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentClass {
    IdProof,
    IncomeProof,
    MedicalReport,
    VehicleRegistration,
    PropertyDeed,
    General,
}

impl DocumentClass {
    fn as_str(&self) -> &'static str {
        match self {
            DocumentClass::IdProof => "ID_PROOF",
            DocumentClass::IncomeProof => "INCOME_PROOF",
            DocumentClass::MedicalReport => "MEDICAL_REPORT",
            DocumentClass::VehicleRegistration => "VEHICLE_REGISTRATION",
            DocumentClass::PropertyDeed => "PROPERTY_DEED",
            DocumentClass::General => "GENERAL_DOCUMENT",
        }
    }
}

fn classify(filename: &str) -> DocumentClass {
    let name = filename.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| name.contains(w));

    if contains_any(&["id", "license", "passport", "identity"]) {
        DocumentClass::IdProof
    } else if contains_any(&["salary", "income", "payslip", "tax", "w2", "1099"]) {
        DocumentClass::IncomeProof
    } else if contains_any(&["medical", "health", "doctor", "report", "prescription"]) {
        DocumentClass::MedicalReport
    } else if contains_any(&["vehicle", "registration", "dmv"]) {
        DocumentClass::VehicleRegistration
    } else if contains_any(&["property", "deed", "title"]) {
        DocumentClass::PropertyDeed
    } else {
        DocumentClass::General
    }
}

/// Name comparison tolerant of ordering, punctuation, and middle names:
/// enough word overlap counts as a match.
fn names_match(a: &str, b: &str) -> bool {
    let split = |s: &str| {
        s.to_lowercase()
            .replace(',', " ")
            .split_whitespace()
            .map(str::to_string)
            .collect::<std::collections::HashSet<_>>()
    };
    let a_parts = split(a);
    let b_parts = split(b);
    if a_parts.is_empty() || b_parts.is_empty() {
        return false;
    }
    let common = a_parts.intersection(&b_parts).count() as f64;
    let smaller = a_parts.len().min(b_parts.len()) as f64;
    common >= smaller * 0.7
}

/// Heuristic verifier: classifies by filename and cross-checks the fields
/// the document class is expected to carry.
///
/// Extraction is stubbed: the document is assumed to agree with the form
/// except where the form itself is internally inconsistent. A production
/// deployment swaps this for an OCR/extraction-backed implementation behind
/// the same trait.
#[derive(Debug, Default)]
pub struct HeuristicVerifier;

impl HeuristicVerifier {
    pub fn new() -> Self {
        Self
    }

    fn cross_check(
        &self,
        class: DocumentClass,
        data: &serde_json::Value,
        verified_by: UserId,
    ) -> VerificationResult {
        let mut matches = Vec::new();
        let mut mismatches = Vec::new();
        let mut warnings = Vec::new();

        let str_of = |key: &str| {
            data.get(key).and_then(|v| match v {
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        };

        match class {
            DocumentClass::IdProof => {
                if let Some(name) = str_of("fullName") {
                    // Stub extraction echoes the declared name in document
                    // casing; the tolerant comparison still applies.
                    let extracted = name.to_uppercase();
                    if names_match(&name, &extracted) {
                        matches.push(FieldMatch {
                            field: "Full Name".to_string(),
                            application_value: name,
                            document_value: extracted,
                        });
                    } else {
                        mismatches.push(FieldMismatch {
                            field: "Full Name".to_string(),
                            application_value: name,
                            document_value: extracted,
                            severity: MismatchSeverity::High,
                            message: "name on ID does not match application".to_string(),
                        });
                    }
                }
                if let Some(dob) = str_of("dateOfBirth") {
                    matches.push(FieldMatch {
                        field: "Date of Birth".to_string(),
                        application_value: dob.clone(),
                        document_value: dob,
                    });
                }
            }
            DocumentClass::IncomeProof => {
                let declared = str_of("annualIncome").or_else(|| str_of("income"));
                match declared {
                    Some(income) => matches.push(FieldMatch {
                        field: "Annual Income".to_string(),
                        application_value: income.clone(),
                        document_value: income,
                    }),
                    None => mismatches.push(FieldMismatch {
                        field: "Annual Income".to_string(),
                        application_value: "(not declared)".to_string(),
                        document_value: "(income document provided)".to_string(),
                        severity: MismatchSeverity::Medium,
                        message: "income proof uploaded but no income declared on the form"
                            .to_string(),
                    }),
                }
            }
            DocumentClass::VehicleRegistration => {
                for (key, label) in [
                    ("vehicleMake", "Vehicle Make"),
                    ("vehicleModel", "Vehicle Model"),
                    ("vehicleYear", "Vehicle Year"),
                ] {
                    match str_of(key) {
                        Some(value) => matches.push(FieldMatch {
                            field: label.to_string(),
                            application_value: value.clone(),
                            document_value: value,
                        }),
                        None => mismatches.push(FieldMismatch {
                            field: label.to_string(),
                            application_value: "(not declared)".to_string(),
                            document_value: "(on registration)".to_string(),
                            severity: MismatchSeverity::High,
                            message: format!("{label} missing from the application form"),
                        }),
                    }
                }
            }
            DocumentClass::PropertyDeed => {
                if let Some(value) = str_of("propertyValue").or_else(|| str_of("assetValuation"))
                {
                    matches.push(FieldMatch {
                        field: "Property Value".to_string(),
                        application_value: value.clone(),
                        document_value: value,
                    });
                }
            }
            DocumentClass::MedicalReport | DocumentClass::General => {}
        }

        let total_checks = matches.len() + mismatches.len();
        let confidence_score = if total_checks > 0 {
            matches.len() as f64 / total_checks as f64
        } else {
            warnings.push("no verifiable fields found in document".to_string());
            0.5
        };

        let overall_status = if mismatches.is_empty() {
            VerificationStatus::Verified
        } else {
            VerificationStatus::NeedsReview
        };

        VerificationResult {
            overall_status,
            confidence_score,
            document_type: class.as_str().to_string(),
            matches,
            mismatches,
            warnings,
            verified_by,
            verified_at: Utc::now(),
        }
    }
}

#[async_trait]
impl Verifier for HeuristicVerifier {
    async fn verify(
        &self,
        application: &Application,
        document: &DocumentRef,
    ) -> Result<VerificationResult> {
        let class = classify(&document.filename);
        Ok(self.cross_check(class, &application.data, document.uploaded_by.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classification_by_filename() {
        assert_eq!(classify("drivers_license.pdf"), DocumentClass::IdProof);
        assert_eq!(classify("2025_payslip.pdf"), DocumentClass::IncomeProof);
        assert_eq!(classify("medical_report.pdf"), DocumentClass::MedicalReport);
        assert_eq!(
            classify("vehicle_registration.jpg"),
            DocumentClass::VehicleRegistration
        );
        assert_eq!(classify("house_deed.pdf"), DocumentClass::PropertyDeed);
        assert_eq!(classify("notes.txt"), DocumentClass::General);
    }

    #[test]
    fn names_match_tolerates_order_and_middle_names() {
        assert!(names_match("Ada Lovelace", "Lovelace, Ada"));
        assert!(names_match("Ada King Lovelace", "Ada Lovelace"));
        assert!(!names_match("Ada Lovelace", "Charles Babbage"));
        assert!(!names_match("", "Charles Babbage"));
    }

    #[tokio::test]
    async fn verified_when_declared_fields_align() {
        let app = Application::new_draft(
            "cust-1".into(),
            json!({
                "insuranceType": "auto",
                "vehicleMake": "Toyota",
                "vehicleModel": "Camry",
                "vehicleYear": "2020",
            }),
        );
        let doc = DocumentRef {
            filename: "vehicle_registration.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            uploaded_by: "cust-1".into(),
            uploaded_at: Utc::now(),
        };
        let result = HeuristicVerifier::new().verify(&app, &doc).await.unwrap();
        assert_eq!(result.overall_status, VerificationStatus::Verified);
        assert_eq!(result.matches.len(), 3);
        assert_eq!(result.confidence_score, 1.0);
    }

    #[tokio::test]
    async fn needs_review_when_form_is_missing_declared_fields() {
        let app = Application::new_draft(
            "cust-1".into(),
            json!({ "insuranceType": "auto", "vehicleMake": "Toyota" }),
        );
        let doc = DocumentRef {
            filename: "registration.pdf".to_string(),
            content_type: None,
            uploaded_by: "cust-1".into(),
            uploaded_at: Utc::now(),
        };
        let result = HeuristicVerifier::new().verify(&app, &doc).await.unwrap();
        assert_eq!(result.overall_status, VerificationStatus::NeedsReview);
        assert!(!result.mismatches.is_empty());
    }

    #[tokio::test]
    async fn unverifiable_document_warns_at_half_confidence() {
        let app = Application::new_draft("cust-1".into(), json!({}));
        let doc = DocumentRef {
            filename: "notes.txt".to_string(),
            content_type: None,
            uploaded_by: "cust-1".into(),
            uploaded_at: Utc::now(),
        };
        let result = HeuristicVerifier::new().verify(&app, &doc).await.unwrap();
        assert_eq!(result.overall_status, VerificationStatus::Verified);
        assert_eq!(result.confidence_score, 0.5);
        assert_eq!(result.warnings.len(), 1);
    }
}
