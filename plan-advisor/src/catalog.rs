//! The fixed plan catalog.
//!
//! Catalog order matters: ranking ties are broken by position in [`CATALOG`].

use serde::Serialize;

/// Name of the plan the user holds today. The skip shortcut keeps it, and RAG
/// questions that do not name a plan are answered about it.
pub const CURRENT_PLAN_NAME: &str = "Horizon Blue";

/// Coverage attributes of one insurance plan.
///
/// `vaccination_copay` is tri-state: `None` means vaccinations are not covered,
/// `Some(0)` means they are fully covered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: u32,
    pub name: &'static str,
    pub out_of_network_coverage: &'static str,
    pub individual_deductible: u32,
    pub family_deductible: u32,
    pub maternity_coinsurance: u32,
    pub physician_copay: u32,
    pub diagnostic_copay: u32,
    pub imaging_copay: u32,
    pub generic_drug_copay: u32,
    pub outpatient_surgery_copay: u32,
    pub emergency_room_charge: u32,
    pub durable_equipment_coinsurance: u32,
    pub vaccination_copay: Option<u32>,
    /// Vector-store collection holding this plan's documents
    #[serde(skip)]
    pub collection: &'static str,
    /// File name of the plan's reference document
    #[serde(skip)]
    pub document: &'static str,
}

impl Plan {
    /// Link to the plan's reference document under `base_url`.
    pub fn document_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.document)
    }

    pub fn maternity_label(&self) -> String {
        match self.maternity_coinsurance {
            0 => "Full Coverage".to_string(),
            pct => format!("{}% Coinsurance", pct),
        }
    }

    pub fn vaccination_label(&self) -> String {
        match self.vaccination_copay {
            None => "Not Covered".to_string(),
            Some(0) => "Fully Covered".to_string(),
            Some(copay) => format!("${} Copay", copay),
        }
    }

    /// Human-readable coverage lines, in display order.
    pub fn features(&self) -> Vec<String> {
        vec![
            format!("Individual Deductible: ${}", self.individual_deductible),
            format!("Family Deductible: ${}", self.family_deductible),
            format!("Physician Visit Copay: ${}", self.physician_copay),
            format!("Diagnostic Test Copay: ${}", self.diagnostic_copay),
            format!("Generic Drugs Copay: ${}", self.generic_drug_copay),
            format!("Emergency Room Care: ${}", self.emergency_room_charge),
            format!("Maternity Coverage: {}", self.maternity_label()),
            format!("Vaccination Coverage: {}", self.vaccination_label()),
        ]
    }
}

pub static CATALOG: [Plan; 5] = [
    Plan {
        id: 1,
        name: "AmeriHealth Platinum",
        out_of_network_coverage: "Not covered",
        individual_deductible: 0,
        family_deductible: 0,
        maternity_coinsurance: 0,
        physician_copay: 10,
        diagnostic_copay: 30,
        imaging_copay: 60,
        generic_drug_copay: 15,
        outpatient_surgery_copay: 0,
        emergency_room_charge: 100,
        durable_equipment_coinsurance: 50,
        vaccination_copay: Some(0),
        collection: "ameriplatinum-index",
        document: "AmeriHealth_Platinum.pdf",
    },
    Plan {
        id: 2,
        name: "AmeriHealth Gold",
        out_of_network_coverage: "Not covered",
        individual_deductible: 1500,
        family_deductible: 3000,
        maternity_coinsurance: 20,
        physician_copay: 15,
        diagnostic_copay: 60,
        imaging_copay: 20,
        generic_drug_copay: 10,
        outpatient_surgery_copay: 60,
        emergency_room_charge: 20,
        durable_equipment_coinsurance: 50,
        vaccination_copay: None,
        collection: "amerigold-index",
        document: "AmeriHealth_Gold.pdf",
    },
    Plan {
        id: 3,
        name: "AmeriHealth Silver",
        out_of_network_coverage: "Not covered",
        individual_deductible: 2500,
        family_deductible: 5000,
        maternity_coinsurance: 20,
        physician_copay: 30,
        diagnostic_copay: 50,
        imaging_copay: 50,
        generic_drug_copay: 20,
        outpatient_surgery_copay: 60,
        emergency_room_charge: 20,
        durable_equipment_coinsurance: 50,
        vaccination_copay: None,
        collection: "amerisilver-index",
        document: "AmeriHealth_Silver.pdf",
    },
    Plan {
        id: 4,
        name: "Horizon Blue",
        out_of_network_coverage: "Not covered",
        individual_deductible: 1500,
        family_deductible: 3000,
        maternity_coinsurance: 0,
        physician_copay: 20,
        diagnostic_copay: 0,
        imaging_copay: 0,
        generic_drug_copay: 10,
        outpatient_surgery_copay: 150,
        emergency_room_charge: 100,
        durable_equipment_coinsurance: 50,
        vaccination_copay: Some(10),
        collection: "horizonblue",
        document: "Horizon_Blue.pdf",
    },
    Plan {
        id: 5,
        name: "UnitedHealthcare Oxford",
        out_of_network_coverage: "Not covered",
        individual_deductible: 0,
        family_deductible: 0,
        maternity_coinsurance: 0,
        physician_copay: 10,
        diagnostic_copay: 60,
        imaging_copay: 10,
        generic_drug_copay: 5,
        outpatient_surgery_copay: 500,
        emergency_room_charge: 100,
        durable_equipment_coinsurance: 0,
        vaccination_copay: Some(0),
        collection: "oxford-index",
        document: "UnitedHealthcare_Oxford.pdf",
    },
];

/// Look up a plan by its display name.
pub fn find_plan(name: &str) -> Option<&'static Plan> {
    CATALOG.iter().find(|plan| plan.name == name)
}

/// The plan the user currently holds.
pub fn current_plan() -> &'static Plan {
    // CURRENT_PLAN_NAME is one of the catalog entries
    find_plan(CURRENT_PLAN_NAME).unwrap_or(&CATALOG[3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vaccination_keeps_null_and_zero_apart() {
        let gold = find_plan("AmeriHealth Gold").unwrap();
        let platinum = find_plan("AmeriHealth Platinum").unwrap();
        let horizon = find_plan("Horizon Blue").unwrap();

        assert_eq!(gold.vaccination_label(), "Not Covered");
        assert_eq!(platinum.vaccination_label(), "Fully Covered");
        assert_eq!(horizon.vaccination_label(), "$10 Copay");
    }

    #[test]
    fn features_render_maternity_forms() {
        let silver = find_plan("AmeriHealth Silver").unwrap();
        let features = silver.features();
        assert_eq!(features.len(), 8);
        assert_eq!(features[0], "Individual Deductible: $2500");
        assert!(features.contains(&"Maternity Coverage: 20% Coinsurance".to_string()));
        assert!(features.contains(&"Vaccination Coverage: Not Covered".to_string()));

        let oxford = find_plan("UnitedHealthcare Oxford").unwrap();
        assert!(
            oxford
                .features()
                .contains(&"Maternity Coverage: Full Coverage".to_string())
        );
    }

    #[test]
    fn null_vaccination_serializes_as_null() {
        let gold = serde_json::to_value(find_plan("AmeriHealth Gold").unwrap()).unwrap();
        assert!(gold["vaccinationCopay"].is_null());

        let platinum = serde_json::to_value(find_plan("AmeriHealth Platinum").unwrap()).unwrap();
        assert_eq!(platinum["vaccinationCopay"], 0);
        assert!(platinum.get("collection").is_none());
    }

    #[test]
    fn document_url_joins_base() {
        let horizon = current_plan();
        assert_eq!(horizon.name, "Horizon Blue");
        assert_eq!(horizon.document_url("/plans/"), "/plans/Horizon_Blue.pdf");
        assert_eq!(
            horizon.document_url("https://docs.example.com"),
            "https://docs.example.com/Horizon_Blue.pdf"
        );
    }
}
