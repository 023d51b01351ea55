use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// Assessment modules; each owns a fixed set of domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Riasec,
    BigFive,
    Behavioral,
}

impl Module {
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Riasec => "riasec",
            Module::BigFive => "big_five",
            Module::Behavioral => "behavioral",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "riasec" | "interests" => Some(Module::Riasec),
            "big_five" | "bigfive" | "big-five" | "personality" => Some(Module::BigFive),
            "behavioral" | "behavioural" | "work_rhythm" => Some(Module::Behavioral),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Module::Riasec => "RIASEC",
            Module::BigFive => "Big Five",
            Module::Behavioral => "Behavioral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    #[serde(rename = "likert_5")]
    Likert5,
    ForcedChoice,
    Ranking,
}

impl ScaleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleType::Likert5 => "likert_5",
            ScaleType::ForcedChoice => "forced_choice",
            ScaleType::Ranking => "ranking",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "likert_5" | "likert" | "slider" => Some(ScaleType::Likert5),
            "forced_choice" | "mcq" => Some(ScaleType::ForcedChoice),
            "ranking" | "ordering" => Some(ScaleType::Ranking),
            _ => None,
        }
    }
}

/// Holland interest domains, declared in canonical priority order.
///
/// The derived `Ord` is the tie-break order used by the rank resolver, so the
/// variant order here must stay R, I, A, S, E, C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiasecDomain {
    #[serde(rename = "R")]
    Realistic,
    #[serde(rename = "I")]
    Investigative,
    #[serde(rename = "A")]
    Artistic,
    #[serde(rename = "S")]
    Social,
    #[serde(rename = "E")]
    Enterprising,
    #[serde(rename = "C")]
    Conventional,
}

impl RiasecDomain {
    pub const ALL: [RiasecDomain; 6] = [
        RiasecDomain::Realistic,
        RiasecDomain::Investigative,
        RiasecDomain::Artistic,
        RiasecDomain::Social,
        RiasecDomain::Enterprising,
        RiasecDomain::Conventional,
    ];

    pub fn code(&self) -> char {
        match self {
            RiasecDomain::Realistic => 'R',
            RiasecDomain::Investigative => 'I',
            RiasecDomain::Artistic => 'A',
            RiasecDomain::Social => 'S',
            RiasecDomain::Enterprising => 'E',
            RiasecDomain::Conventional => 'C',
        }
    }

    pub fn priority(&self) -> usize {
        *self as usize
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "r" | "realistic" => Some(RiasecDomain::Realistic),
            "i" | "investigative" => Some(RiasecDomain::Investigative),
            "a" | "artistic" => Some(RiasecDomain::Artistic),
            "s" | "social" => Some(RiasecDomain::Social),
            "e" | "enterprising" => Some(RiasecDomain::Enterprising),
            "c" | "conventional" => Some(RiasecDomain::Conventional),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiasecDomain::Realistic => "Realistic",
            RiasecDomain::Investigative => "Investigative",
            RiasecDomain::Artistic => "Artistic",
            RiasecDomain::Social => "Social",
            RiasecDomain::Enterprising => "Enterprising",
            RiasecDomain::Conventional => "Conventional",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BigFiveTrait {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

impl BigFiveTrait {
    pub const ALL: [BigFiveTrait; 5] = [
        BigFiveTrait::Openness,
        BigFiveTrait::Conscientiousness,
        BigFiveTrait::Extraversion,
        BigFiveTrait::Agreeableness,
        BigFiveTrait::Neuroticism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BigFiveTrait::Openness => "openness",
            BigFiveTrait::Conscientiousness => "conscientiousness",
            BigFiveTrait::Extraversion => "extraversion",
            BigFiveTrait::Agreeableness => "agreeableness",
            BigFiveTrait::Neuroticism => "neuroticism",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "o" | "openness" => Some(BigFiveTrait::Openness),
            "c" | "conscientiousness" => Some(BigFiveTrait::Conscientiousness),
            "e" | "extraversion" => Some(BigFiveTrait::Extraversion),
            "a" | "agreeableness" => Some(BigFiveTrait::Agreeableness),
            "n" | "neuroticism" | "emotional_stability" => Some(BigFiveTrait::Neuroticism),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehavioralTrait {
    MotivationType,
    GritPersistence,
    SelfEfficacy,
    Resilience,
    LearningOrientation,
    Empathy,
    TaskStartTempo,
}

impl BehavioralTrait {
    pub const ALL: [BehavioralTrait; 7] = [
        BehavioralTrait::MotivationType,
        BehavioralTrait::GritPersistence,
        BehavioralTrait::SelfEfficacy,
        BehavioralTrait::Resilience,
        BehavioralTrait::LearningOrientation,
        BehavioralTrait::Empathy,
        BehavioralTrait::TaskStartTempo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BehavioralTrait::MotivationType => "motivation_type",
            BehavioralTrait::GritPersistence => "grit_persistence",
            BehavioralTrait::SelfEfficacy => "self_efficacy",
            BehavioralTrait::Resilience => "resilience",
            BehavioralTrait::LearningOrientation => "learning_orientation",
            BehavioralTrait::Empathy => "empathy",
            BehavioralTrait::TaskStartTempo => "task_start_tempo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "motivation_type" | "motivation" => Some(BehavioralTrait::MotivationType),
            "grit_persistence" | "grit" => Some(BehavioralTrait::GritPersistence),
            "self_efficacy" => Some(BehavioralTrait::SelfEfficacy),
            "resilience" => Some(BehavioralTrait::Resilience),
            "learning_orientation" | "learning" => Some(BehavioralTrait::LearningOrientation),
            "empathy" => Some(BehavioralTrait::Empathy),
            "task_start_tempo" | "procrastination" => Some(BehavioralTrait::TaskStartTempo),
            _ => None,
        }
    }
}

/// A scored domain, qualified by its module.
///
/// Written as `<module>.<key>`, e.g. `riasec.A` or `behavioral.empathy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Domain {
    Riasec(RiasecDomain),
    BigFive(BigFiveTrait),
    Behavioral(BehavioralTrait),
}

impl Domain {
    pub fn module(&self) -> Module {
        match self {
            Domain::Riasec(_) => Module::Riasec,
            Domain::BigFive(_) => Module::BigFive,
            Domain::Behavioral(_) => Module::Behavioral,
        }
    }

    // Resolve an item's domain tag within the item's module
    pub fn from_tag(module: Module, tag: &str) -> Option<Self> {
        match module {
            Module::Riasec => RiasecDomain::from_str(tag).map(Domain::Riasec),
            Module::BigFive => BigFiveTrait::from_str(tag).map(Domain::BigFive),
            Module::Behavioral => BehavioralTrait::from_str(tag).map(Domain::Behavioral),
        }
    }

    pub fn key(&self) -> String {
        match self {
            Domain::Riasec(d) => d.code().to_string(),
            Domain::BigFive(t) => t.as_str().to_string(),
            Domain::Behavioral(t) => t.as_str().to_string(),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let (module, tag) = s.split_once('.')?;
        Domain::from_tag(Module::from_str(module)?, tag)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module().as_str(), self.key())
    }
}

impl TryFrom<String> for Domain {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Domain::from_str(&value).ok_or_else(|| format!("unknown domain '{value}'"))
    }
}

impl From<Domain> for String {
    fn from(value: Domain) -> Self {
        value.to_string()
    }
}

// Ordered strength buckets; derived Ord gives Low < Medium < High < Very High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StrengthLabel {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl StrengthLabel {
    pub fn label(&self) -> &'static str {
        match self {
            StrengthLabel::Low => "Low",
            StrengthLabel::Medium => "Medium",
            StrengthLabel::High => "High",
            StrengthLabel::VeryHigh => "Very High",
        }
    }
}

// === Questionnaire items and answers ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOption {
    pub value: String,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: String,
    pub module: Module,
    pub domain: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub reverse_scored: bool,
    pub scale_type: ScaleType,
    pub scale_min: f64,
    pub scale_max: f64,
    #[serde(default)]
    pub options: Vec<ItemOption>,
}

impl Item {
    pub fn likert(item_id: &str, module: Module, domain: &str, reverse_scored: bool) -> Self {
        Self {
            item_id: item_id.to_string(),
            module,
            domain: Some(domain.to_string()),
            tags: vec![],
            reverse_scored,
            scale_type: ScaleType::Likert5,
            scale_min: 1.0,
            scale_max: 5.0,
            options: vec![],
        }
    }

    pub fn forced_choice(item_id: &str, options: Vec<ItemOption>) -> Self {
        Self {
            item_id: item_id.to_string(),
            module: Module::Riasec,
            domain: None,
            tags: vec![],
            reverse_scored: false,
            scale_type: ScaleType::ForcedChoice,
            scale_min: 1.0,
            scale_max: 5.0,
            options,
        }
    }

    pub fn ranking(item_id: &str, options: Vec<ItemOption>) -> Self {
        Self {
            scale_type: ScaleType::Ranking,
            ..Self::forced_choice(item_id, options)
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn option(&self, value: &str) -> Option<&ItemOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

impl ItemOption {
    pub fn new(value: &str, domain: &str) -> Self {
        Self {
            value: value.to_string(),
            domain: domain.to_string(),
            points: None,
        }
    }
}

/// Raw answer value as submitted; its kind must match the item's scale type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawValue {
    Scalar(f64),
    Selected(Vec<String>),
    Ranked(Vec<String>),
}

impl RawValue {
    // Parse CLI input according to the item it answers
    pub fn parse_for(item: &Item, input: &str) -> Option<Self> {
        match item.scale_type {
            ScaleType::Likert5 => input.trim().parse::<f64>().ok().map(RawValue::Scalar),
            ScaleType::ForcedChoice => Some(RawValue::Selected(split_list(input))),
            ScaleType::Ranking => Some(RawValue::Ranked(split_list(input))),
        }
    }
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// One catalog item joined with a session's answer, `None` when unanswered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub item: Item,
    pub value: Option<RawValue>,
}

// === Scores ===

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiasecScores {
    pub realistic: Option<f64>,
    pub investigative: Option<f64>,
    pub artistic: Option<f64>,
    pub social: Option<f64>,
    pub enterprising: Option<f64>,
    pub conventional: Option<f64>,
}

impl RiasecScores {
    pub fn get(&self, domain: RiasecDomain) -> Option<f64> {
        match domain {
            RiasecDomain::Realistic => self.realistic,
            RiasecDomain::Investigative => self.investigative,
            RiasecDomain::Artistic => self.artistic,
            RiasecDomain::Social => self.social,
            RiasecDomain::Enterprising => self.enterprising,
            RiasecDomain::Conventional => self.conventional,
        }
    }

    pub fn from_fn(f: impl Fn(RiasecDomain) -> Option<f64>) -> Self {
        Self {
            realistic: f(RiasecDomain::Realistic),
            investigative: f(RiasecDomain::Investigative),
            artistic: f(RiasecDomain::Artistic),
            social: f(RiasecDomain::Social),
            enterprising: f(RiasecDomain::Enterprising),
            conventional: f(RiasecDomain::Conventional),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BigFiveScores {
    pub openness: Option<f64>,
    pub conscientiousness: Option<f64>,
    pub extraversion: Option<f64>,
    pub agreeableness: Option<f64>,
    pub neuroticism: Option<f64>,
}

impl BigFiveScores {
    pub fn get(&self, t: BigFiveTrait) -> Option<f64> {
        match t {
            BigFiveTrait::Openness => self.openness,
            BigFiveTrait::Conscientiousness => self.conscientiousness,
            BigFiveTrait::Extraversion => self.extraversion,
            BigFiveTrait::Agreeableness => self.agreeableness,
            BigFiveTrait::Neuroticism => self.neuroticism,
        }
    }

    pub fn from_fn(f: impl Fn(BigFiveTrait) -> Option<f64>) -> Self {
        Self {
            openness: f(BigFiveTrait::Openness),
            conscientiousness: f(BigFiveTrait::Conscientiousness),
            extraversion: f(BigFiveTrait::Extraversion),
            agreeableness: f(BigFiveTrait::Agreeableness),
            neuroticism: f(BigFiveTrait::Neuroticism),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BehavioralScores {
    pub motivation_type: Option<f64>,
    pub grit_persistence: Option<f64>,
    pub self_efficacy: Option<f64>,
    pub resilience: Option<f64>,
    pub learning_orientation: Option<f64>,
    pub empathy: Option<f64>,
    pub task_start_tempo: Option<f64>,
}

impl BehavioralScores {
    pub fn get(&self, t: BehavioralTrait) -> Option<f64> {
        match t {
            BehavioralTrait::MotivationType => self.motivation_type,
            BehavioralTrait::GritPersistence => self.grit_persistence,
            BehavioralTrait::SelfEfficacy => self.self_efficacy,
            BehavioralTrait::Resilience => self.resilience,
            BehavioralTrait::LearningOrientation => self.learning_orientation,
            BehavioralTrait::Empathy => self.empathy,
            BehavioralTrait::TaskStartTempo => self.task_start_tempo,
        }
    }

    pub fn from_fn(f: impl Fn(BehavioralTrait) -> Option<f64>) -> Self {
        Self {
            motivation_type: f(BehavioralTrait::MotivationType),
            grit_persistence: f(BehavioralTrait::GritPersistence),
            self_efficacy: f(BehavioralTrait::SelfEfficacy),
            resilience: f(BehavioralTrait::Resilience),
            learning_orientation: f(BehavioralTrait::LearningOrientation),
            empathy: f(BehavioralTrait::Empathy),
            task_start_tempo: f(BehavioralTrait::TaskStartTempo),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrengthLabels {
    pub riasec: BTreeMap<RiasecDomain, StrengthLabel>,
    pub big_five: BTreeMap<BigFiveTrait, StrengthLabel>,
    pub behavioral: BTreeMap<BehavioralTrait, StrengthLabel>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IkigaiZones {
    pub love: f64,
    pub mastery: f64,
    pub contribution: f64,
    pub sustainability: f64,
}

// Problems found while scoring; recorded on the profile, never raised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    UnknownDomain { item_id: String, tag: String },
    InvalidAnswer { item_id: String, reason: String },
    ZeroMaxPossible { domain: Domain },
    MissingRiasecDomain { domain: RiasecDomain },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::UnknownDomain { item_id, tag } => {
                write!(f, "item {item_id}: unknown domain tag '{tag}', excluded")
            }
            DataWarning::InvalidAnswer { item_id, reason } => {
                write!(f, "item {item_id}: {reason}, excluded")
            }
            DataWarning::ZeroMaxPossible { domain } => {
                write!(f, "{domain}: no maximum score available, labelled Medium")
            }
            DataWarning::MissingRiasecDomain { domain } => {
                write!(f, "RIASEC {} has no answers, Holland code withheld", domain.label())
            }
        }
    }
}

/// Everything about a profile besides the per-domain raw scores.
///
/// Persisted as one payload through `codec`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDetail {
    pub ruleset_version: String,
    pub top_domain: Option<RiasecDomain>,
    pub labels: StrengthLabels,
    pub flags: BTreeMap<String, bool>,
    pub zones: IkigaiZones,
    pub warnings: Vec<DataWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentScore {
    pub id: i64,
    pub session_id: String,
    pub riasec: RiasecScores,
    pub holland_code: Option<String>,
    pub riasec_complete: bool,
    pub big_five: BigFiveScores,
    pub big_five_complete: bool,
    pub behavioral: BehavioralScores,
    pub behavioral_complete: bool,
    pub detail: ProfileDetail,
    pub calculated_at: String,
    pub last_updated: String,
}

impl AssessmentScore {
    pub fn is_complete(&self, module: Module) -> bool {
        match module {
            Module::Riasec => self.riasec_complete,
            Module::BigFive => self.big_five_complete,
            Module::Behavioral => self.behavioral_complete,
        }
    }
}

// Row of the scored-sessions listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub session_id: String,
    pub holland_code: Option<String>,
    pub riasec_complete: bool,
    pub big_five_complete: bool,
    pub behavioral_complete: bool,
    pub last_updated: String,
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
