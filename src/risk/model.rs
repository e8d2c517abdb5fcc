//! Reference risk model and premium advisory.
//!
//! Type-aware scoring: baseline financial-ratio components shared by every
//! line of business, plus line-specific components, combined as a weighted
//! sum on a 0-100 scale. Deterministic for identical input, and monotonic
//! in the leverage ratios: more coverage per unit income, or more debt per
//! unit income, never lowers the score.

use std::collections::BTreeMap;

use chrono::{Datelike, Utc};

use crate::domain::{
    ApplicationId, PremiumRange, RiskAssessment, RiskLevel, WhatIfOutcome, WhatIfParams,
};

use super::RiskModel;

/// Base monthly premium per line of business, in currency units.
fn base_premium(insurance_type: &str) -> f64 {
    match insurance_type {
        "auto" => 120.0,
        "health" => 180.0,
        "life" => 200.0,
        "property" => 160.0,
        _ => 150.0,
    }
}

/// The standard scoring model.
///
/// `reference_year` anchors vehicle-age computation so an assessment is a
/// pure function of its inputs.
pub struct StandardRiskModel {
    reference_year: i32,
}

impl StandardRiskModel {
    pub fn new() -> Self {
        Self {
            reference_year: Utc::now().year(),
        }
    }

    pub fn with_reference_year(reference_year: i32) -> Self {
        Self { reference_year }
    }
}

impl Default for StandardRiskModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskModel for StandardRiskModel {
    fn assess(&self, application_id: &ApplicationId, data: &serde_json::Value) -> RiskAssessment {
        let insurance_type = str_field(data, "insuranceType")
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();

        // Denominators are floored at 1 so ratios stay finite; absolute
        // income still drives the income-level component.
        let income = first_amount(data, &["income", "annualIncome"])
            .filter(|v| *v > 0.0)
            .unwrap_or(1.0);
        let asset_valuation = first_amount(data, &["assetValuation", "propertyValue"])
            .filter(|v| *v > 0.0)
            .unwrap_or(1.0);
        let debt = first_amount(data, &["debt"]).unwrap_or(0.0);
        let coverage = first_amount(data, &["coverageNeeds", "coverageAmount"]).unwrap_or(0.0);

        let dti_score = score_ratio(debt / income, 0.05, 0.6);
        let cov_income_score = score_ratio(coverage / income, 0.1, 3.0);
        let cov_asset_score = score_ratio(coverage / asset_valuation, 0.05, 1.5);
        let income_level_score = income_level(income);

        let mut components: BTreeMap<String, f64> = BTreeMap::new();
        components.insert("dti".into(), round2(dti_score));
        components.insert("coverage_to_income".into(), round2(cov_income_score));
        components.insert("coverage_to_asset".into(), round2(cov_asset_score));
        components.insert("income_level".into(), round2(income_level_score));

        let weights: BTreeMap<&str, f64> = match insurance_type.as_str() {
            "auto" => {
                let history_score = match str_field(data, "drivingHistory")
                    .map(|s| s.to_lowercase())
                    .as_deref()
                {
                    Some("clean") => 10.0,
                    Some("minor violations") => 40.0,
                    Some("major violations") => 75.0,
                    Some("accidents") => 85.0,
                    _ => 30.0,
                };
                let miles = first_amount(data, &["annualMileage"]).unwrap_or(12_000.0);
                let mileage_score = clamp(miles / 50_000.0 * 100.0);
                let vehicle_year = first_amount(data, &["vehicleYear"])
                    .unwrap_or(self.reference_year as f64);
                let vehicle_age = (self.reference_year - vehicle_year as i32).max(0);
                let vehicle_age_score = clamp(vehicle_age as f64 / 20.0 * 100.0);
                // Very young and very old drivers both score higher.
                let driver_age = first_amount(data, &["age"]).unwrap_or(30.0);
                let driver_age_score = if driver_age <= 20.0 {
                    80.0
                } else if driver_age <= 25.0 {
                    60.0
                } else if driver_age <= 65.0 {
                    20.0
                } else {
                    50.0
                };

                components.insert("driving_history".into(), history_score);
                components.insert("annual_mileage".into(), round2(mileage_score));
                components.insert("vehicle_age".into(), round2(vehicle_age_score));
                components.insert("driver_age".into(), driver_age_score);

                BTreeMap::from([
                    ("driving_history", 0.25),
                    ("annual_mileage", 0.10),
                    ("vehicle_age", 0.08),
                    ("driver_age", 0.10),
                    ("coverage_to_income", 0.18),
                    ("coverage_to_asset", 0.05),
                    ("dti", 0.15),
                    ("income_level", 0.09),
                ])
            }
            "health" => {
                let conditions = str_field(data, "preExistingConditions").unwrap_or_default();
                let condition_count = conditions
                    .replace(',', " ")
                    .split_whitespace()
                    .count() as f64;
                let pre_existing_score = clamp(condition_count * 15.0);
                let family_score = if str_field(data, "familyHistory")
                    .map(|s| !s.trim().is_empty())
                    .unwrap_or(false)
                {
                    30.0
                } else {
                    0.0
                };
                let medical = str_field(data, "medicalHistory").unwrap_or_default();
                let medical_score = if medical.trim().len() > 50 {
                    20.0
                } else if !medical.trim().is_empty() {
                    10.0
                } else {
                    0.0
                };
                let age = first_amount(data, &["age"]).unwrap_or(35.0);
                let age_score = clamp(age);

                components.insert("pre_existing".into(), pre_existing_score);
                components.insert("family_history".into(), family_score);
                components.insert("medical_history".into(), medical_score);
                components.insert("age".into(), round2(age_score));

                BTreeMap::from([
                    ("pre_existing", 0.25),
                    ("family_history", 0.07),
                    ("medical_history", 0.08),
                    ("age", 0.16),
                    ("coverage_to_income", 0.20),
                    ("dti", 0.10),
                    ("coverage_to_asset", 0.05),
                    ("income_level", 0.09),
                ])
            }
            "life" => {
                let smoking = str_field(data, "smokingStatus")
                    .map(|s| s.to_lowercase())
                    .unwrap_or_default();
                let smoking_score = match smoking.as_str() {
                    "non-smoker" => 10.0,
                    "occasional smoker" => 40.0,
                    "regular smoker" => 80.0,
                    "" => 10.0,
                    _ => 30.0,
                };
                let condition = str_field(data, "healthCondition")
                    .map(|s| s.to_lowercase())
                    .unwrap_or_default();
                let health_score = match condition.as_str() {
                    "excellent" => 10.0,
                    "good" => 25.0,
                    "fair" => 50.0,
                    "poor" => 80.0,
                    "" => 30.0,
                    _ => 40.0,
                };
                let age = first_amount(data, &["age"]).unwrap_or(35.0);
                let age_score = clamp(age);

                components.insert("smoking".into(), smoking_score);
                components.insert("health_condition".into(), health_score);
                components.insert("age".into(), round2(age_score));

                BTreeMap::from([
                    ("age", 0.25),
                    ("smoking", 0.25),
                    ("health_condition", 0.20),
                    ("coverage_to_income", 0.15),
                    ("dti", 0.10),
                    ("income_level", 0.05),
                ])
            }
            "property" => {
                let property_type = str_field(data, "propertyType")
                    .map(|s| s.to_lowercase())
                    .unwrap_or_default();
                let property_score = match property_type.as_str() {
                    "apartment" => 20.0,
                    "condo" => 25.0,
                    "house" => 35.0,
                    "villa" => 45.0,
                    "" => 35.0,
                    _ => 30.0,
                };
                let material = str_field(data, "constructionMaterial")
                    .map(|s| s.to_lowercase())
                    .unwrap_or_default();
                let material_score = match material.as_str() {
                    "concrete" => 10.0,
                    "brick" => 20.0,
                    "steel" => 15.0,
                    "wood" => 50.0,
                    "" => 35.0,
                    _ => 30.0,
                };
                let declared_coverage =
                    first_amount(data, &["coverageAmount"]).unwrap_or(0.0);
                let cov_asset_prop =
                    score_ratio(declared_coverage / asset_valuation, 0.2, 1.5);

                components.insert("property_type".into(), property_score);
                components.insert("construction_material".into(), material_score);
                components.insert("coverage_to_asset".into(), round2(cov_asset_prop));
                if let Some(age) = first_amount(data, &["age"]).filter(|a| *a > 0.0) {
                    components.insert("age".into(), round2(clamp(age)));
                }

                BTreeMap::from([
                    ("property_type", 0.15),
                    ("construction_material", 0.10),
                    ("coverage_to_asset", 0.25),
                    ("coverage_to_income", 0.15),
                    ("dti", 0.15),
                    ("age", 0.05),
                    ("income_level", 0.15),
                ])
            }
            _ => {
                let age = first_amount(data, &["age"]).unwrap_or(35.0);
                components.insert("age".into(), round2(clamp(age)));

                BTreeMap::from([
                    ("age", 0.20),
                    ("coverage_to_income", 0.35),
                    ("coverage_to_asset", 0.15),
                    ("dti", 0.15),
                    ("income_level", 0.15),
                ])
            }
        };

        let mut score: f64 = weights
            .iter()
            .map(|(name, weight)| weight * components.get(*name).copied().unwrap_or(0.0))
            .sum();
        score = clamp(score);

        // Hard floors for very low absolute income.
        if income < 10_000.0 {
            score = score.max(55.0);
        } else if income < 20_000.0 {
            score = score.max(40.0);
        }
        score = round2(score);

        let top_drivers = top_drivers(&components, &weights);
        let premium_range = premium_range(&insurance_type, score);

        RiskAssessment {
            application_id: *application_id,
            insurance_type: if insurance_type.is_empty() {
                "generic".to_string()
            } else {
                insurance_type
            },
            risk_score: score,
            risk_level: RiskLevel::from_score(score),
            components,
            top_drivers,
            premium_range,
        }
    }

    fn what_if(&self, application_id: &ApplicationId, params: &WhatIfParams) -> WhatIfOutcome {
        let base = 200.0;
        let deductible = if params.deductible > 0.0 {
            params.deductible
        } else {
            1000.0
        };
        let term = if params.term > 0 { params.term } else { 12 };

        let premium_adjustment = (1000.0 / deductible) * 0.1;
        let term_adjustment = (f64::from(term) / 12.0) * 0.05;
        let simulated = base * (1.0 + premium_adjustment + term_adjustment);

        WhatIfOutcome {
            application_id: *application_id,
            simulated_premium: round2(simulated),
            premium_adjustment_pct: round1(premium_adjustment * 100.0),
            term_adjustment_pct: round1(term_adjustment * 100.0),
            deductible,
            term_months: term,
        }
    }
}

/// Advisory premium band around the risk-adjusted base premium.
fn premium_range(insurance_type: &str, score: f64) -> PremiumRange {
    let recommended = base_premium(insurance_type) * (1.0 + score / 100.0);
    PremiumRange {
        min: round2(recommended * 0.9),
        max: round2(recommended * 1.1),
        recommended: round2(recommended),
    }
}

/// Top contributing factors by weighted contribution, formatted for display.
fn top_drivers(components: &BTreeMap<String, f64>, weights: &BTreeMap<&str, f64>) -> Vec<String> {
    let mut contributions: Vec<(String, f64)> = components
        .iter()
        .map(|(name, value)| {
            let weight = weights.get(name.as_str()).copied().unwrap_or(0.0);
            (name.clone(), value * weight)
        })
        .collect();
    contributions.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    contributions
        .into_iter()
        .take(4)
        .map(|(name, contribution)| {
            format!("{}: +{}", title_case(&name), round1(contribution))
        })
        .collect()
}

/// Map a ratio to 0-100 risk with linear interpolation between caps.
fn score_ratio(ratio: f64, low: f64, high: f64) -> f64 {
    if ratio <= low {
        0.0
    } else if ratio >= high {
        100.0
    } else {
        (ratio - low) / (high - low) * 100.0
    }
}

/// Penalize low absolute income regardless of ratios.
fn income_level(income: f64) -> f64 {
    if income <= 10_000.0 {
        95.0
    } else if income <= 20_000.0 {
        85.0
    } else if income <= 40_000.0 {
        70.0
    } else if income <= 80_000.0 {
        50.0
    } else if income <= 120_000.0 {
        35.0
    } else {
        20.0
    }
}

fn clamp(x: f64) -> f64 {
    x.clamp(0.0, 100.0)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn str_field<'a>(data: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(|v| v.as_str())
}

/// First present and parseable amount among `keys`.
fn first_amount(data: &serde_json::Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| data.get(*key))
        .find_map(parse_amount)
}

/// Parse numeric form values: raw numbers, `"1,200"`, or `"100k"`.
pub fn parse_amount(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let s = s.trim().replace(',', "");
            if s.is_empty() {
                return None;
            }
            let (digits, multiplier) = match s.to_lowercase().strip_suffix('k') {
                Some(stripped) => (stripped.to_string(), 1000.0),
                None => (s, 1.0),
            };
            digits.parse::<f64>().ok().map(|v| v * multiplier)
        }
        _ => None,
    }
}
