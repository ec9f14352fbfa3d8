//! Additive plan scoring against the survey answers.
//!
//! Every factor reads its answer through [`Answers::given`] and friends, so a
//! skipped question contributes exactly nothing.

use serde::Serialize;

use crate::{
    answers::Answers,
    catalog::{CATALOG, Plan},
    survey::question_ids,
};

/// Number of plans offered to the user.
pub const TOP_N: usize = 3;

/// Hospital network assumed when the question was skipped or never answered.
pub const DEFAULT_HOSPITAL: &str = "Local Hospital Network";

const INDIVIDUAL_FAMILY_SIZE: &str = "Self";
const MATERNITY_SERVICE: &str = "Maternity coverage";
const ROUTINE_CARE_NEEDS: [&str; 2] = ["Regular doctor visits", "Ongoing conditions"];
const MATERNITY_BONUS: f64 = 20.0;
const HOSPITAL_BONUS: f64 = 10.0;

/// Contribution of each scoring factor for one plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub deductible: f64,
    pub maternity: f64,
    pub diagnostics: f64,
    pub prescriptions: f64,
    pub emergency_room: f64,
    pub routine_care: f64,
    pub hospital: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.deductible
            + self.maternity
            + self.diagnostics
            + self.prescriptions
            + self.emergency_room
            + self.routine_care
            + self.hospital
    }
}

fn amount(value: u32) -> f64 {
    f64::from(value)
}

pub fn breakdown(plan: &Plan, answers: &Answers) -> ScoreBreakdown {
    let mut parts = ScoreBreakdown::default();

    match answers.choice(question_ids::FAMILY_SIZE) {
        Some(INDIVIDUAL_FAMILY_SIZE) => {
            parts.deductible = (3000.0 - amount(plan.individual_deductible)) / 600.0;
        }
        Some(_) => {
            parts.deductible = (5000.0 - amount(plan.family_deductible)) / 1000.0;
        }
        None => {}
    }

    let needs_maternity = answers.is_yes(question_ids::MATERNITY_PLANNING)
        || answers.selected(question_ids::ADDITIONAL_SERVICES, MATERNITY_SERVICE);
    if needs_maternity && plan.maternity_coinsurance == 0 {
        parts.maternity = MATERNITY_BONUS;
    }

    if answers.is_yes(question_ids::DIAGNOSTIC_TESTS) {
        parts.diagnostics = (100.0 - amount(plan.diagnostic_copay)) / 20.0
            + (100.0 - amount(plan.imaging_copay)) / 20.0;
    }

    if answers.is_yes(question_ids::PRESCRIPTION_DRUGS) {
        parts.prescriptions = (20.0 - amount(plan.generic_drug_copay)) / 4.0;
    }

    parts.emergency_room = match answers.choice(question_ids::EMERGENCY_ROOM) {
        Some("Frequently") => (200.0 - amount(plan.emergency_room_charge)) / 40.0,
        Some("Occasionally") => (150.0 - amount(plan.emergency_room_charge)) / 30.0,
        _ => 0.0,
    };

    if ROUTINE_CARE_NEEDS
        .iter()
        .any(|need| answers.selected(question_ids::HEALTHCARE_NEEDS, need))
    {
        parts.routine_care = (30.0 - amount(plan.physician_copay)) / 6.0;
    }

    let hospital = answers
        .choice(question_ids::PREFERRED_HOSPITAL)
        .unwrap_or(DEFAULT_HOSPITAL);
    if hospital != DEFAULT_HOSPITAL {
        parts.hospital = HOSPITAL_BONUS;
    }

    parts
}

/// Unrounded suitability of `plan` for `answers`.
pub fn score(plan: &Plan, answers: &Answers) -> f64 {
    breakdown(plan, answers).total()
}

/// Round to two decimals for display.
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPlan<'a> {
    pub plan: &'a Plan,
    pub score: f64,
}

/// Top [`TOP_N`] plans by descending unrounded score. The sort is stable, so
/// equal scores keep the order of `plans`.
pub fn rank<'a>(plans: &'a [Plan], answers: &Answers) -> Vec<ScoredPlan<'a>> {
    let mut scored: Vec<ScoredPlan<'a>> = plans
        .iter()
        .map(|plan| ScoredPlan {
            plan,
            score: score(plan, answers),
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(TOP_N);
    scored
}

/// A ranked plan in the shape shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub name: String,
    pub features: Vec<String>,
    pub match_score: f64,
    pub plan_details: Plan,
}

impl Recommendation {
    pub fn new(plan: &Plan, score: f64) -> Self {
        Self {
            name: plan.name.to_string(),
            features: plan.features(),
            match_score: round_score(score),
            plan_details: *plan,
        }
    }
}

/// Rank the whole catalog and render the top plans.
pub fn recommend(answers: &Answers) -> Vec<Recommendation> {
    rank(&CATALOG, answers)
        .into_iter()
        .map(|scored| Recommendation::new(scored.plan, scored.score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::find_plan, survey::SKIP};

    fn fixture() -> Answers {
        Answers::from_pairs([
            (question_ids::FAMILY_SIZE, "Self + Spouse + 2 Children"),
            (question_ids::DIAGNOSTIC_TESTS, "Yes"),
            (question_ids::PRESCRIPTION_DRUGS, "No"),
            (question_ids::EMERGENCY_ROOM, "Frequently"),
            (question_ids::PREFERRED_HOSPITAL, "Mayo Clinic"),
        ])
    }

    #[test]
    fn scoring_is_deterministic() {
        let answers = fixture();
        for plan in CATALOG.iter() {
            let first = score(plan, &answers);
            for _ in 0..10 {
                assert_eq!(score(plan, &answers), first);
            }
        }
    }

    #[test]
    fn family_fixture_ranks_horizon_blue_first() {
        let ranked = recommend(&fixture());
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Horizon Blue", "UnitedHealthcare Oxford", "AmeriHealth Platinum"]
        );
        assert_eq!(ranked[0].match_score, 24.5);
        assert_eq!(ranked[1].match_score, 24.0);
        assert_eq!(ranked[2].match_score, 23.0);
    }

    #[test]
    fn fixture_factors_for_gold() {
        let gold = find_plan("AmeriHealth Gold").unwrap();
        let parts = breakdown(gold, &fixture());
        assert_eq!(parts.deductible, 2.0);
        assert_eq!(parts.diagnostics, 6.0);
        assert_eq!(parts.emergency_room, 4.5);
        assert_eq!(parts.hospital, 10.0);
        assert_eq!(parts.prescriptions, 0.0);
        assert_eq!(parts.total(), 22.5);
    }

    #[test]
    fn individual_deductible_for_self() {
        let answers = Answers::from_pairs([(question_ids::FAMILY_SIZE, "Self")]);
        let silver = find_plan("AmeriHealth Silver").unwrap();
        assert_eq!(breakdown(silver, &answers).deductible, (3000.0 - 2500.0) / 600.0);
    }

    #[test]
    fn skip_zeroes_every_factor() {
        let full = Answers::from_pairs([
            (question_ids::FAMILY_SIZE, "Self + Spouse"),
            (question_ids::ADDITIONAL_SERVICES, "Maternity coverage"),
            (question_ids::HEALTHCARE_NEEDS, "Regular doctor visits"),
            (question_ids::DIAGNOSTIC_TESTS, "Yes"),
            (question_ids::PRESCRIPTION_DRUGS, "Yes"),
            (question_ids::EMERGENCY_ROOM, "Occasionally"),
            (question_ids::MATERNITY_PLANNING, "Yes"),
            (question_ids::PREFERRED_HOSPITAL, "Johns Hopkins"),
        ]);
        let skipped = Answers::from_pairs([
            (question_ids::FAMILY_SIZE, SKIP),
            (question_ids::ADDITIONAL_SERVICES, SKIP),
            (question_ids::HEALTHCARE_NEEDS, SKIP),
            (question_ids::DIAGNOSTIC_TESTS, SKIP),
            (question_ids::PRESCRIPTION_DRUGS, SKIP),
            (question_ids::EMERGENCY_ROOM, SKIP),
            (question_ids::MATERNITY_PLANNING, SKIP),
            (question_ids::PREFERRED_HOSPITAL, SKIP),
        ]);

        for plan in CATALOG.iter() {
            assert_eq!(breakdown(plan, &skipped), ScoreBreakdown::default());
            assert!(score(plan, &skipped) <= score(plan, &full));
        }
    }

    #[test]
    fn unanswered_hospital_defaults_to_local_network() {
        let plan = &CATALOG[0];
        assert_eq!(breakdown(plan, &Answers::new()).hospital, 0.0);

        let local = Answers::from_pairs([(question_ids::PREFERRED_HOSPITAL, DEFAULT_HOSPITAL)]);
        assert_eq!(breakdown(plan, &local).hospital, 0.0);

        let other = Answers::from_pairs([(question_ids::PREFERRED_HOSPITAL, "Other")]);
        assert_eq!(breakdown(plan, &other).hospital, HOSPITAL_BONUS);
    }

    #[test]
    fn maternity_bonus_needs_zero_coinsurance() {
        let answers = Answers::from_pairs([(question_ids::MATERNITY_PLANNING, "Yes")]);
        assert_eq!(
            breakdown(find_plan("Horizon Blue").unwrap(), &answers).maternity,
            MATERNITY_BONUS
        );
        assert_eq!(
            breakdown(find_plan("AmeriHealth Gold").unwrap(), &answers).maternity,
            0.0
        );
    }

    #[test]
    fn empty_answers_keep_catalog_order() {
        let first = rank(&CATALOG, &Answers::new());
        let second = rank(&CATALOG, &Answers::new());
        assert_eq!(first, second);

        let names: Vec<&str> = first.iter().map(|s| s.plan.name).collect();
        assert_eq!(
            names,
            vec!["AmeriHealth Platinum", "AmeriHealth Gold", "AmeriHealth Silver"]
        );
    }

    #[test]
    fn rank_is_sorted_and_capped() {
        let ranked = rank(&CATALOG, &fixture());
        assert_eq!(ranked.len(), TOP_N);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));

        let short = rank(&CATALOG[..2], &fixture());
        assert_eq!(short.len(), 2);
    }

    #[test]
    fn display_score_is_rounded() {
        assert_eq!(round_score(1.0 / 3.0), 0.33);
        assert_eq!(round_score(2.0 / 3.0), 0.67);
        assert_eq!(round_score(24.5), 24.5);
    }
}
