//! Read-side statistics over every stored answer.
//!
//! Nothing is cached: every report is recomputed from the full answer set.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::DashboardConfig;
use crate::model::{
    common::question::{QuestionId, QuestionType},
    db::{answer::AnswerCore, question::Question},
};

/// The statistic reported for one question, depending on its type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Breakdown {
    /// How many answers hold each value. Every option is present, and values
    /// outside the options are counted under their literal text.
    Choice { counts: BTreeMap<String, u64> },
    /// Mean of the numeric answers; `None` when there are none.
    Scale { mean: Option<f64>, count: u64 },
    /// Free text is only counted.
    FreeText { count: u64 },
}

/// The breakdown for one catalog question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionSummary {
    pub id: QuestionId,
    pub number: u32,
    pub body: String,
    #[serde(flatten)]
    pub breakdown: Breakdown,
}

/// Running totals for one question.
#[derive(Debug)]
enum Accumulator {
    Choice(BTreeMap<String, u64>),
    Scale { sum: f64, numeric: u64 },
    FreeText(u64),
}

impl Accumulator {
    fn for_question(question: &Question) -> Self {
        match question.kind {
            QuestionType::Choice => Self::Choice(
                question
                    .options
                    .iter()
                    .map(|option| (option.clone(), 0))
                    .collect(),
            ),
            QuestionType::Scale => Self::Scale {
                sum: 0.0,
                numeric: 0,
            },
            QuestionType::FreeText => Self::FreeText(0),
        }
    }

    fn record(&mut self, value: &str) {
        match self {
            Self::Choice(counts) => *counts.entry(value.to_string()).or_default() += 1,
            Self::Scale { sum, numeric } => {
                // Non-numeric values cannot take part in a mean.
                if let Ok(n) = value.trim().parse::<f64>() {
                    if n.is_finite() {
                        *sum += n;
                        *numeric += 1;
                    }
                }
            }
            Self::FreeText(count) => *count += 1,
        }
    }

    fn finish(self) -> Breakdown {
        match self {
            Self::Choice(counts) => Breakdown::Choice { counts },
            Self::Scale { sum, numeric } => Breakdown::Scale {
                mean: (numeric > 0).then(|| sum / numeric as f64),
                count: numeric,
            },
            Self::FreeText(count) => Breakdown::FreeText { count },
        }
    }
}

/// Folds answers into per-question statistics for a catalog.
pub struct Tally<'a> {
    catalog: &'a [Question],
    totals: HashMap<QuestionId, Accumulator>,
}

impl<'a> Tally<'a> {
    pub fn new(catalog: &'a [Question]) -> Self {
        let totals = catalog
            .iter()
            .map(|question| (question.id, Accumulator::for_question(question)))
            .collect();
        Self { catalog, totals }
    }

    /// Count one stored answer. Answers to questions outside the catalog are ignored.
    pub fn record(&mut self, answer: &AnswerCore) {
        if let Some(totals) = self.totals.get_mut(&answer.question_id) {
            totals.record(&answer.value);
        }
    }

    /// Summaries for every catalog question, in catalog order.
    pub fn finish(self) -> Vec<QuestionSummary> {
        let Self { catalog, mut totals } = self;
        let mut catalog = catalog.iter().collect::<Vec<_>>();
        catalog.sort_by_key(|question| question.number);
        catalog
            .into_iter()
            .filter_map(|question| {
                let breakdown = totals.remove(&question.id)?.finish();
                Some(QuestionSummary {
                    id: question.id,
                    number: question.number,
                    body: question.body.clone(),
                    breakdown,
                })
            })
            .collect()
    }
}

/// Summarise a set of answers against a catalog.
pub fn aggregate<'a>(
    catalog: &[Question],
    answers: impl IntoIterator<Item = &'a AnswerCore>,
) -> Vec<QuestionSummary> {
    let mut tally = Tally::new(catalog);
    for answer in answers {
        tally.record(answer);
    }
    tally.finish()
}

/// The admin dashboard: the designated breakdowns, plus every question's summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub headset_data: BTreeMap<String, u64>,
    pub store_data: BTreeMap<String, u64>,
    pub usage_data: BTreeMap<String, u64>,
    /// Mean rating by question ID.
    pub quality_data: BTreeMap<QuestionId, Option<f64>>,
    pub questions: Vec<QuestionSummary>,
}

impl Dashboard {
    pub fn new(questions: Vec<QuestionSummary>, layout: &DashboardConfig) -> Self {
        let counts_for = |number: u32| {
            questions
                .iter()
                .find(|summary| summary.number == number)
                .and_then(|summary| match &summary.breakdown {
                    Breakdown::Choice { counts } => Some(counts.clone()),
                    _ => None,
                })
                .unwrap_or_default()
        };
        let quality_data = questions
            .iter()
            .filter(|summary| layout.quality.contains(&summary.number))
            .filter_map(|summary| match summary.breakdown {
                Breakdown::Scale { mean, .. } => Some((summary.id, mean)),
                _ => None,
            })
            .collect();

        Self {
            headset_data: counts_for(layout.headset),
            store_data: counts_for(layout.store),
            usage_data: counts_for(layout.usage),
            quality_data,
            questions,
        }
    }
}
