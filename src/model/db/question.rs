use log::info;
use mongodb::{bson::doc, options::FindOptions};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::question::{QuestionId, QuestionType},
    mongodb::{is_duplicate_key_error, Coll},
};

/// A single survey question, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable unique ID.
    #[serde(rename = "_id")]
    pub id: QuestionId,
    /// 1-based display position.
    pub number: u32,
    /// Question text.
    pub body: String,
    /// How the question is answered and aggregated.
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// Possible answers; only meaningful for choice questions.
    #[serde(default)]
    pub options: Vec<String>,
}

impl Question {
    /// Options are present iff this is a choice question.
    pub fn is_well_formed(&self) -> bool {
        (self.kind == QuestionType::Choice) != self.options.is_empty()
    }

    /// Sort options for reading the catalog in display order.
    pub fn in_display_order() -> FindOptions {
        FindOptions::builder().sort(doc! { "number": 1 }).build()
    }

    /// The full catalog, ordered by question number.
    pub async fn catalog(questions: &Coll<Question>) -> Result<Vec<Question>> {
        let catalog = questions
            .find(None, Self::in_display_order())
            .await?
            .try_collect()
            .await?;
        Ok(catalog)
    }
}

/// Seed the question catalog if it is empty. The catalog is never modified
/// afterwards.
pub async fn ensure_catalog_seeded(questions: &Coll<Question>) -> Result<()> {
    if questions.count_documents(None, None).await? > 0 {
        return Ok(());
    }

    let catalog = seed_catalog();
    info!("Seeding question catalog with {} questions", catalog.len());
    match questions.insert_many(catalog, None).await {
        Ok(_) => Ok(()),
        // Another instance seeded concurrently.
        Err(e) if is_duplicate_key_error(&e) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// The Bigscreen user survey.
pub fn seed_catalog() -> Vec<Question> {
    use QuestionType::{Choice, FreeText, Scale};

    let questions: [(QuestionType, &str, &[&str]); 20] = [
        (FreeText, "Your age", &[]),
        (Choice, "Your gender", &["Male", "Female", "Prefer not to say"]),
        (Scale, "Number of people in your household (adults & children)", &[]),
        (FreeText, "Your profession", &[]),
        (
            Choice,
            "Which brand of VR headset do you use?",
            &["Oculus Quest", "Oculus Rift/s", "HTC Vive", "Windows Mixed Reality", "Valve Index"],
        ),
        (
            Choice,
            "Where do you buy VR content?",
            &["SteamVR", "Oculus Store", "Viveport", "Windows Store"],
        ),
        (
            Choice,
            "Which headset are you planning to buy in the near future?",
            &["Oculus Quest", "Oculus Go", "HTC Vive Pro", "PSVR", "Other", "None"],
        ),
        (Scale, "How many people in your household use your VR headset for Bigscreen?", &[]),
        (
            Choice,
            "You primarily use Bigscreen for:",
            &["Watching TV live", "Watching movies", "Working", "Solo gaming", "Team gaming"],
        ),
        (Scale, "How would you rate the image quality on Bigscreen?", &[]),
        (Scale, "How would you rate the ease of use of Bigscreen’s interface?", &[]),
        (Scale, "How would you rate Bigscreen’s network connection?", &[]),
        (Scale, "How would you rate the quality of 3D graphics in Bigscreen?", &[]),
        (Scale, "How would you rate the audio quality in Bigscreen?", &[]),
        (
            Choice,
            "Would you like more precise notifications during your Bigscreen sessions?",
            &["Yes", "No"],
        ),
        (
            Choice,
            "Would you like to invite a friend to join your session via their smartphone?",
            &["Yes", "No"],
        ),
        (Choice, "Would you like to record TV shows to watch later?", &["Yes", "No"]),
        (Choice, "Would you like to play exclusive games on Bigscreen?", &["Yes", "No"]),
        (FreeText, "What new feature should exist on Bigscreen?", &[]),
        (FreeText, "Any other comments or suggestions?", &[]),
    ];

    questions
        .into_iter()
        .zip(1..)
        .map(|((kind, body, options), number)| Question {
            id: number,
            number,
            body: body.to_string(),
            kind,
            options: options.iter().map(ToString::to_string).collect(),
        })
        .collect()
}
