//! The standard v1.1 item bank loaded by `carhythm seed`.
//!
//! Presentation order is RIASEC (Likert, forced choice, ranking), then
//! Big Five, then behavioral.

use crate::models::{Item, ItemOption, Module};

// (item_id, domain tag, tags)
const RIASEC_LIKERT: [(&str, &str, [&str; 2]); 18] = [
    ("R1", "R", ["problem_solving", "self_reliance"]),
    ("I1", "I", ["curiosity", "analytical_thinking"]),
    ("A1", "A", ["self_expression", "creativity"]),
    ("S1", "S", ["teaching", "helping"]),
    ("E1", "E", ["leadership", "organization"]),
    ("C1", "C", ["planning", "detail_orientation"]),
    ("R2", "R", ["experiential_learning", "hands_on"]),
    ("I2", "I", ["research_driven", "knowledge_seeking"]),
    ("A2", "A", ["content_creation", "storytelling"]),
    ("S2", "S", ["community_support", "altruism"]),
    ("E2", "E", ["public_speaking", "influence"]),
    ("C2", "C", ["task_completion", "orderliness"]),
    ("R3", "R", ["assembly", "visual_learning"]),
    ("I3", "I", ["efficiency", "planning"]),
    ("A3", "A", ["environment_design", "aesthetic_sense"]),
    ("S3", "S", ["social_bonding", "community_building"]),
    ("E3", "E", ["initiative", "decision_making"]),
    ("C3", "C", ["structured_approach", "step_by_step"]),
];

// Two-option items; option A carries the first domain, B the second
const FORCED_CHOICE: [(&str, &str, &str); 6] = [
    ("FC_RI_1", "R", "I"),
    ("FC_IA_1", "I", "A"),
    ("FC_AS_1", "A", "S"),
    ("FC_SE_1", "S", "E"),
    ("FC_EC_1", "E", "C"),
    ("FC_CR_1", "C", "R"),
];

const RANKINGS: [&str; 3] = ["RANK1", "RANK2", "RANK3"];

// (item_id, trait letter, reverse scored, tags)
const BIG_FIVE: [(&str, &str, bool, [&str; 2]); 25] = [
    ("BF_O1", "O", false, ["novelty_seeking", "adventure"]),
    ("BF_O2", "O", false, ["diversity_appreciation", "perspective_taking"]),
    ("BF_O3", "O", false, ["aesthetic_sensitivity", "observation"]),
    ("BF_O4", "O", false, ["technical_curiosity", "how_things_work"]),
    ("BF_O5", "O", false, ["integrative_thinking", "innovation"]),
    ("BF_C1", "C", false, ["systematic", "reliable"]),
    ("BF_C2", "C", false, ["responsibility", "discipline"]),
    ("BF_C3", "C", false, ["attention_to_detail", "accuracy"]),
    ("BF_C4", "C", false, ["dependability", "trustworthy"]),
    ("BF_C5", "C", false, ["time_management", "balance"]),
    ("BF_E1", "E", false, ["social_initiation", "outgoing"]),
    ("BF_E2", "E", false, ["digital_socializing", "energy_from_others"]),
    ("BF_E3", "E", false, ["inclusion", "social_awareness"]),
    ("BF_E4", "E", false, ["relationship_maintenance", "networking"]),
    ("BF_E5", "E", false, ["humor", "stress_relief"]),
    ("BF_A1", "A", false, ["trust", "positive_regard"]),
    ("BF_A2", "A", false, ["empathy", "supportive"]),
    ("BF_A3", "A", false, ["equality", "respect"]),
    ("BF_A4", "A", false, ["collaboration", "collective_success"]),
    ("BF_A5", "A", false, ["active_listening", "presence"]),
    // Worded as emotional stability, so every item is reversed into neuroticism
    ("BF_N1", "N", true, ["adaptability", "flexibility"]),
    ("BF_N2", "N", true, ["self_confidence", "resilience"]),
    ("BF_N3", "N", true, ["mood_stability", "emotional_regulation"]),
    ("BF_N4", "N", true, ["work_life_balance", "recovery"]),
    ("BF_N5", "N", true, ["coping_skills", "stress_management"]),
];

const BEHAVIORAL: [(&str, &str, bool, [&str; 2]); 21] = [
    ("BH_M1", "motivation_type", false, ["intrinsic_motivation", "purpose_driven"]),
    ("BH_M2", "motivation_type", false, ["self_directed_learning", "autonomy"]),
    ("BH_M3", "motivation_type", true, ["extrinsic_motivation", "validation_seeking"]),
    ("BH_G1", "grit_persistence", false, ["perseverance", "mastery_orientation"]),
    ("BH_G2", "grit_persistence", false, ["adaptability", "problem_solving"]),
    ("BH_G3", "grit_persistence", true, ["impatience", "outcome_dependent"]),
    ("BH_SE1", "self_efficacy", false, ["confidence", "resourcefulness"]),
    ("BH_SE2", "self_efficacy", false, ["tech_confidence", "learning_agency"]),
    ("BH_SE3", "self_efficacy", true, ["self_doubt", "helplessness"]),
    ("BH_R1", "resilience", false, ["focus_under_pressure", "multitasking"]),
    ("BH_R2", "resilience", false, ["bounce_back", "solution_oriented"]),
    ("BH_R3", "resilience", true, ["frustration_tolerance", "emotional_reactivity"]),
    ("BH_L1", "learning_orientation", false, ["growth_mindset", "effort_belief"]),
    ("BH_L2", "learning_orientation", false, ["challenge_seeking", "skill_building"]),
    ("BH_L3", "learning_orientation", true, ["perfectionism", "fear_of_failure"]),
    ("BH_EM1", "empathy", false, ["emotional_detection", "sensitivity"]),
    ("BH_EM2", "empathy", false, ["perspective_taking", "impact_awareness"]),
    ("BH_EM3", "empathy", false, ["trusted_advisor", "supportive"]),
    ("BH_T1", "task_start_tempo", true, ["procrastination_risk", "deadline_driven"]),
    ("BH_T2", "task_start_tempo", false, ["task_initiation", "momentum_builder"]),
    ("BH_T3", "task_start_tempo", true, ["over_planning", "perfectionism"]),
];

fn ranking_options() -> Vec<ItemOption> {
    ["R", "I", "A", "S", "E", "C"]
        .iter()
        .map(|d| ItemOption::new(&d.to_lowercase(), d))
        .collect()
}

pub fn riasec_items() -> Vec<Item> {
    let likert = RIASEC_LIKERT
        .iter()
        .map(|(id, domain, tags)| Item::likert(id, Module::Riasec, domain, false).with_tags(tags));
    let forced = FORCED_CHOICE.iter().map(|(id, a, b)| {
        Item::forced_choice(id, vec![ItemOption::new("A", a), ItemOption::new("B", b)])
    });
    let ranked = RANKINGS.iter().map(|id| Item::ranking(id, ranking_options()));
    likert.chain(forced).chain(ranked).collect()
}

pub fn big_five_items() -> Vec<Item> {
    BIG_FIVE
        .iter()
        .map(|(id, t, reverse, tags)| {
            Item::likert(id, Module::BigFive, t, *reverse).with_tags(tags)
        })
        .collect()
}

pub fn behavioral_items() -> Vec<Item> {
    BEHAVIORAL
        .iter()
        .map(|(id, t, reverse, tags)| {
            Item::likert(id, Module::Behavioral, t, *reverse).with_tags(tags)
        })
        .collect()
}

pub fn standard_items() -> Vec<Item> {
    let mut items = riasec_items();
    items.extend(big_five_items());
    items.extend(behavioral_items());
    items
}
