use super::domain::{AnswerOption, Points, Question, QuestionKind, Section};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

pub const PUMP_COMPLIANCE_SECTION_ID: &str = "pump_compliance";
pub const DEFAULT_ACCENT_COLOR: &str = "#009639";
/// Upper bound on any single question's points or option value.
pub const MAX_QUESTION_POINTS: u32 = 10_000;

/// Ordered, validated set of inspection sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuestionBank {
    sections: Vec<Section>,
}

impl QuestionBank {
    pub fn standard() -> Self {
        Self {
            sections: standard_sections(),
        }
    }

    pub fn from_sections(sections: Vec<Section>) -> Result<Self, BankError> {
        let mut section_ids = HashSet::new();
        let mut question_ids = HashSet::new();

        for section in &sections {
            if !section_ids.insert(section.id.as_str()) {
                return Err(BankError::DuplicateSection(section.id.clone()));
            }

            for question in &section.questions {
                if !question_ids.insert(question.id.as_str()) {
                    return Err(BankError::DuplicateQuestion(question.id.clone()));
                }

                if question.max_points > MAX_QUESTION_POINTS {
                    return Err(BankError::PointsOutOfRange {
                        question: question.id.clone(),
                        points: question.max_points,
                    });
                }

                let mut option_texts = HashSet::new();
                for option in &question.options {
                    if let Some(points) = option
                        .points
                        .value()
                        .filter(|points| *points > MAX_QUESTION_POINTS)
                    {
                        return Err(BankError::PointsOutOfRange {
                            question: question.id.clone(),
                            points,
                        });
                    }
                    if !option_texts.insert(option.text.as_str()) {
                        return Err(BankError::DuplicateOption {
                            question: question.id.clone(),
                            option: option.text.clone(),
                        });
                    }
                }

                if let Some(trigger) = question
                    .numeric_input_triggers
                    .iter()
                    .find(|trigger| !option_texts.contains(trigger.as_str()))
                {
                    return Err(BankError::UnknownTrigger {
                        question: question.id.clone(),
                        trigger: trigger.clone(),
                    });
                }
            }
        }

        Ok(Self { sections })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, BankError> {
        let sections: Vec<Section> = serde_json::from_reader(reader)?;
        Self::from_sections(sections)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| BankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Sections rendered as question lists, i.e. everything but the pump grid.
    pub fn question_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(|section| !section.is_visual_block())
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.sections
            .iter()
            .flat_map(|section| section.questions.iter())
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions().find(|question| question.id == id)
    }

    pub fn contains_question(&self, id: &str) -> bool {
        self.question(id).is_some()
    }
}

/// Static configuration loaded once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionCatalog {
    pub accent_color: String,
    pub locations: Vec<String>,
    pub sections: QuestionBank,
}

impl InspectionCatalog {
    pub fn standard() -> Self {
        Self {
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            locations: standard_locations(),
            sections: QuestionBank::standard(),
        }
    }

    pub fn new(
        bank: QuestionBank,
        locations: Vec<String>,
        accent_color: impl Into<String>,
    ) -> Result<Self, BankError> {
        if locations.is_empty() {
            return Err(BankError::NoLocations);
        }

        Ok(Self {
            accent_color: accent_color.into(),
            locations,
            sections: bank,
        })
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.sections
    }

    pub fn default_location(&self) -> &str {
        self.locations.first().map(String::as_str).unwrap_or_default()
    }

    pub fn is_known_location(&self, location: &str) -> bool {
        self.locations.iter().any(|known| known == location)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("question bank is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("section id '{0}' appears more than once")]
    DuplicateSection(String),
    #[error("question id '{0}' appears more than once")]
    DuplicateQuestion(String),
    #[error("question '{question}' lists option '{option}' more than once")]
    DuplicateOption { question: String, option: String },
    #[error("question '{question}' has numeric trigger '{trigger}' that matches no option")]
    UnknownTrigger { question: String, trigger: String },
    #[error("question '{question}' scores {points} points; at most {} allowed", MAX_QUESTION_POINTS)]
    PointsOutOfRange { question: String, points: u32 },
    #[error("at least one inspection location must be configured")]
    NoLocations,
}

pub fn standard_locations() -> Vec<String> {
    [
        "BP Main Street #123",
        "Amoco Highway 101",
        "Downtown Express Fuel",
        "Route 66 Gas & Go",
        "City Center Petroleum",
        "Centreville BP",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn yes_no(id: &str, text: &str, points: u32) -> Question {
    Question {
        id: id.to_string(),
        text: text.to_string(),
        kind: QuestionKind::Standard,
        options: vec![
            AnswerOption {
                text: "Yes".to_string(),
                points: Points::Scored(points),
                is_positive: true,
            },
            AnswerOption {
                text: "No".to_string(),
                points: Points::Scored(0),
                is_positive: false,
            },
        ],
        max_points: points,
        numeric_input_triggers: Vec::new(),
    }
}

fn yes_no_na(id: &str, text: &str, points: u32) -> Question {
    let mut question = yes_no(id, text, points);
    question.options.push(AnswerOption {
        text: "N/A".to_string(),
        points: Points::NotApplicable,
        is_positive: false,
    });
    question
}

fn section(id: &str, title: &str, questions: Vec<Question>) -> Section {
    Section {
        id: id.to_string(),
        title: title.to_string(),
        questions,
    }
}

fn standard_sections() -> Vec<Section> {
    vec![
        section(PUMP_COMPLIANCE_SECTION_ID, "Pump Compliance Status", Vec::new()),
        section(
            "exterior_signage_canopy",
            "Exterior Signage & Canopy",
            vec![
                yes_no("Q1", "Are all MID and price signs clearly visible and free from obstructions and missing numbers or letters?", 5),
                yes_no("Q2", "Are all MID elements, price signs, and accompanying high-rise signs well-maintained, free of damage?", 3),
                yes_no("Q3", "Is the branded canopy fascia well maintained and free of dirt, peeling, dents, rust, other damage, and free of unapproved signage or objects?", 1),
                yes_no("Q4", "Is the branded canopy deck well maintained and free of dirt, peeling paint, dents, rust, and other damage?", 1),
                yes_no("Q5", "Are the canopy columns and canopy flags under the branded canopy well maintained and free of dirt, peeling paint, dents, rust, graffiti, other damage, and free of unapproved signage or objects present?", 1),
            ],
        ),
        section(
            "pumps_dispensers",
            "Pumps & Dispensers",
            vec![
                yes_no("Q6", "Are all bp branded dispenser elements clean?", 6),
                yes_no("Q7", "Are all pumps (under the bp/Amoco branded canopy) fully operational?", 8),
                yes_no("Q8", "Are all bp/Amoco branded dispensers free of dents, damage, rust, and graffiti?", 2),
                yes_no("Q9", "Are all dispenser price screens and keypads on bp/Amoco branded dispensers free of damage?", 2),
                yes_no("Q10", "Are all bp/Amoco branded dispensers free of torn or peeling decals and excessive adhesive residue?", 2),
                yes_no("Q11", "Are all nozzle covers on bp/Amoco branded dispensers clean and free of damage?", 2),
                yes_no_na("Q12", "For a card transaction, was your receipt received at your pump?", 5),
                yes_no("Q13", "Are the pump islands under the branded canopy well maintained?", 2),
            ],
        ),
        section(
            "forecourt_lot",
            "Forecourt & Lot",
            vec![
                yes_no("Q14", "Are the site's bollards well maintained?", 2),
                yes_no("Q15", "Are amenity bins available at each pump island and free of damage?", 2),
                yes_no("Q16", "Are amenity bins clean and not overflowing?", 2),
                yes_no("Q17", "Are paper towels available next to each pump island?", 1),
                yes_no("Q18", "Is there at least one squeegee with washer fluid available for each pump island?", 1),
                yes_no("Q19", "Are the lot, grass and landscaping areas well maintained and free of fresh oil puddles, unauthorized vehicles, trash, debris, weeds, and poorly stored materials?", 2),
                yes_no("Q20", "Are the paved areas well maintained and free of excessive potholes?", 2),
                yes_no("Q21", "Are the curbs, bumper stops, storefront sidewalks, and perimeter light poles well maintained?", 3),
            ],
        ),
        section(
            "decals_promotions",
            "Decals & Promotions",
            vec![
                yes_no_na("Q22", "For this dispenser, is the current bp POP campaign posted in accordance with program requirements?", 2),
                yes_no("Q23", "Are ALL decals, canisters, and brochures posted in accordance with program requirements?", 2),
                yes_no("Q24", "Are ALL decals and brochures in the c-store posted in accordance with program requirements?", 1),
                yes_no_na("Q25", "Are third party signage and POP hardware posted in accordance with program requirements?", 1),
            ],
        ),
        section(
            "cstore_interior",
            "C-Store Interior & Appearance",
            vec![
                yes_no("Q26", "Is the building clean and free of dents, damage, dirt, missing fixtures/materials, and unapproved signage or objects?", 2),
                yes_no("Q27", "Are the building windows 50% clear of obstructions and signage and allow for an unobstructed view to and from the pumps?", 2),
                yes_no("Q28", "When you walk in the store, is the overall store appearance clean and free of damage and unapproved materials?", 2),
                yes_no("Q29", "Is the inside of the store well-lit?", 3),
                yes_no("Q30", "Are the food service and product areas clean and well maintained?", 3),
                yes_no("Q31", "Are the food service and product areas well stocked?", 3),
                yes_no("Q32", "Are the products clearly labelled with accurate prices?", 2),
            ],
        ),
        section(
            "restrooms_personnel",
            "Restrooms & Personnel",
            vec![
                yes_no("Q33", "Is the restroom available, clean and stocked with supplies?", 6),
                yes_no("Q34", "Is the restroom functioning and in acceptable condition?", 4),
                yes_no("Q35", "Are site personnel wearing an appropriate and clean uniform?", 3),
                yes_no("Q36", "Are site personnel wearing a name or brand tag?", 3),
                yes_no("Q37", "Was the CSR polite, professional, and attentive?", 6),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn standard_bank_has_pump_grid_first_and_thirty_seven_questions() {
        let bank = QuestionBank::standard();
        assert_eq!(bank.sections()[0].id, PUMP_COMPLIANCE_SECTION_ID);
        assert_eq!(bank.sections().len(), 7);
        assert_eq!(bank.questions().count(), 37);
        assert_eq!(bank.question_sections().count(), 6);

        let receipt = bank.question("Q12").expect("Q12 present");
        assert!(receipt
            .options
            .iter()
            .any(|option| option.points == Points::NotApplicable));
    }

    #[test]
    fn standard_bank_passes_its_own_validation() {
        let bank = QuestionBank::standard();
        let rebuilt =
            QuestionBank::from_sections(bank.sections().to_vec()).expect("standard bank valid");
        assert_eq!(rebuilt, bank);
    }

    #[test]
    fn loads_bank_in_the_browser_json_shape() {
        let json = r#"[
            {"id": "pump_compliance", "title": "Pump Compliance Status", "questions": []},
            {"id": "canopy", "title": "Canopy", "questions": [
                {"id": "Q1", "text": "Is the canopy lit?", "type": "standard",
                 "options": [{"text": "Yes", "points": 5, "isPositive": true}, {"text": "No", "points": 0}],
                 "maxPoints": 5},
                {"id": "Q2", "text": "Nozzles out of service", "type": "numericInput",
                 "options": [{"text": "None", "points": 2}, {"text": "Some", "points": 0}, {"text": "Skip", "points": "-"}],
                 "maxPoints": 2, "conditionalNumericInputTriggers": ["Some"]}
            ]}
        ]"#;

        let bank = QuestionBank::from_reader(Cursor::new(json)).expect("bank parses");
        let numeric = bank.question("Q2").expect("Q2 loaded");
        assert_eq!(numeric.kind, QuestionKind::NumericInput);
        assert_eq!(numeric.numeric_input_triggers, vec!["Some".to_string()]);
        assert_eq!(numeric.options[2].points, Points::Unscored);
        assert!(bank.question("Q1").expect("Q1 loaded").options[0].is_positive);
    }

    #[test]
    fn rejects_duplicate_question_ids() {
        let duplicated = vec![
            section("a", "A", vec![yes_no("Q1", "first", 1)]),
            section("b", "B", vec![yes_no("Q1", "second", 1)]),
        ];
        match QuestionBank::from_sections(duplicated) {
            Err(BankError::DuplicateQuestion(id)) => assert_eq!(id, "Q1"),
            other => panic!("expected duplicate question error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_triggers_without_matching_option() {
        let mut question = yes_no("Q1", "count", 1);
        question.kind = QuestionKind::NumericInput;
        question.numeric_input_triggers = vec!["Maybe".to_string()];
        match QuestionBank::from_sections(vec![section("a", "A", vec![question])]) {
            Err(BankError::UnknownTrigger { trigger, .. }) => assert_eq!(trigger, "Maybe"),
            other => panic!("expected unknown trigger error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_oversized_point_values() {
        let mut question = yes_no("Q1", "huge", 1);
        question.options[0].points = Points::Scored(4_000_000_000);
        match QuestionBank::from_sections(vec![section("a", "A", vec![question])]) {
            Err(BankError::PointsOutOfRange { question, points }) => {
                assert_eq!(question, "Q1");
                assert_eq!(points, 4_000_000_000);
            }
            other => panic!("expected points out of range error, got {other:?}"),
        }

        let json = r#"[{"id": "a", "title": "A", "questions": [
            {"id": "Q1", "text": "huge", "type": "standard",
             "options": [{"text": "Yes", "points": 1}], "maxPoints": 4000000000}
        ]}]"#;
        assert!(matches!(
            QuestionBank::from_reader(Cursor::new(json)),
            Err(BankError::PointsOutOfRange { .. })
        ));
    }

    #[test]
    fn catalog_requires_locations() {
        let err = InspectionCatalog::new(QuestionBank::standard(), Vec::new(), "#000000")
            .expect_err("empty location list rejected");
        assert!(matches!(err, BankError::NoLocations));
    }
}
