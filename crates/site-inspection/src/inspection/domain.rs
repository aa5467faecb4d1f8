use serde::{Deserialize, Serialize};
use std::fmt;

/// Point value carried by an answer option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PointsRepr", into = "PointsRepr")]
pub enum Points {
    Scored(u32),
    /// Selecting the option removes the question from the possible score.
    NotApplicable,
    /// Never contributes points.
    Unscored,
}

impl Points {
    pub const fn value(self) -> Option<u32> {
        match self {
            Self::Scored(points) => Some(points),
            Self::NotApplicable | Self::Unscored => None,
        }
    }

    pub const fn is_not_applicable(self) -> bool {
        matches!(self, Self::NotApplicable)
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scored(points) => write!(f, "{points}"),
            Self::NotApplicable => f.write_str("N/A"),
            Self::Unscored => f.write_str("-"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PointsRepr {
    Number(u32),
    Marker(String),
}

impl TryFrom<PointsRepr> for Points {
    type Error = String;

    fn try_from(value: PointsRepr) -> Result<Self, Self::Error> {
        match value {
            PointsRepr::Number(points) => Ok(Self::Scored(points)),
            PointsRepr::Marker(marker) => match marker.trim() {
                "N/A" => Ok(Self::NotApplicable),
                "-" => Ok(Self::Unscored),
                other => Err(format!(
                    "unsupported points marker '{other}', expected a number, \"N/A\" or \"-\""
                )),
            },
        }
    }
}

impl From<Points> for PointsRepr {
    fn from(value: Points) -> Self {
        match value {
            Points::Scored(points) => Self::Number(points),
            Points::NotApplicable => Self::Marker("N/A".to_string()),
            Points::Unscored => Self::Marker("-".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub text: String,
    pub points: Points,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_positive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    Standard,
    NumericInput,
    Informational,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub options: Vec<AnswerOption>,
    pub max_points: u32,
    #[serde(
        default,
        rename = "conditionalNumericInputTriggers",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub numeric_input_triggers: Vec<String>,
}

impl Question {
    /// Exact text match; stale answers simply resolve to `None`.
    pub fn option(&self, text: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.text == text)
    }

    /// Whether the question takes part in the question count and progress.
    pub fn is_counted(&self) -> bool {
        self.max_points > 0
            || self
                .options
                .iter()
                .any(|option| option.points != Points::Unscored)
    }

    pub fn shows_numeric_input(&self, answer: Option<&str>) -> bool {
        self.kind == QuestionKind::NumericInput
            && answer.is_some_and(|answer| {
                self.numeric_input_triggers
                    .iter()
                    .any(|trigger| trigger == answer)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Section {
    /// The pump grid section is drawn as an image rather than as questions.
    pub fn is_visual_block(&self) -> bool {
        self.id == super::bank::PUMP_COMPLIANCE_SECTION_ID
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PumpStatus {
    #[default]
    Compliant,
    NonCompliant,
}

impl PumpStatus {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Compliant => Self::NonCompliant,
            Self::NonCompliant => Self::Compliant,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Compliant => "Compliant",
            Self::NonCompliant => "Non-Compliant",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_question() -> Question {
        Question {
            id: "Q90".to_string(),
            text: "How many nozzles are out of service?".to_string(),
            kind: QuestionKind::NumericInput,
            options: vec![
                AnswerOption {
                    text: "None".to_string(),
                    points: Points::Scored(2),
                    is_positive: true,
                },
                AnswerOption {
                    text: "Some".to_string(),
                    points: Points::Scored(0),
                    is_positive: false,
                },
            ],
            max_points: 2,
            numeric_input_triggers: vec!["Some".to_string()],
        }
    }

    #[test]
    fn points_parse_from_numbers_and_markers() {
        let parsed: Vec<Points> =
            serde_json::from_str(r#"[5, "N/A", "-"]"#).expect("points parse");
        assert_eq!(
            parsed,
            vec![Points::Scored(5), Points::NotApplicable, Points::Unscored]
        );

        let err = serde_json::from_str::<Points>(r#""maybe""#).expect_err("marker rejected");
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn points_serialize_back_to_markers() {
        let json = serde_json::to_string(&vec![Points::NotApplicable, Points::Scored(3)])
            .expect("points serialize");
        assert_eq!(json, r#"["N/A",3]"#);
    }

    #[test]
    fn numeric_input_shown_only_for_trigger_answers() {
        let question = numeric_question();
        assert!(question.shows_numeric_input(Some("Some")));
        assert!(!question.shows_numeric_input(Some("None")));
        assert!(!question.shows_numeric_input(None));
    }

    #[test]
    fn question_with_only_unscored_options_is_not_counted() {
        let question = Question {
            id: "I1".to_string(),
            text: "Note the weather conditions".to_string(),
            kind: QuestionKind::Informational,
            options: vec![AnswerOption {
                text: "Clear".to_string(),
                points: Points::Unscored,
                is_positive: false,
            }],
            max_points: 0,
            numeric_input_triggers: Vec::new(),
        };
        assert!(!question.is_counted());
        assert!(numeric_question().is_counted());
    }

    #[test]
    fn pump_status_toggles_between_states() {
        assert_eq!(PumpStatus::Compliant.toggled(), PumpStatus::NonCompliant);
        assert_eq!(PumpStatus::NonCompliant.toggled(), PumpStatus::Compliant);
        assert_eq!(
            serde_json::to_string(&PumpStatus::NonCompliant).expect("serializes"),
            r#""non-compliant""#
        );
    }
}
