//! Trivium server binary.
//!
//! Serves a built-in question set. `TRIVIUM_ADDR` overrides the bind
//! address; `RUST_LOG` controls log filtering.

use std::sync::Arc;

use trivium::{Question, StaticQuestionSource, TriviumError, TriviumServer};

#[tokio::main]
async fn main() -> Result<(), TriviumError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trivium=info".into()),
        )
        .init();

    let addr = std::env::var("TRIVIUM_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let server = TriviumServer::builder()
        .bind(&addr)
        .question_source(Arc::new(StaticQuestionSource::new(
            builtin_questions(),
        )))
        .build()
        .await?;

    // Open one room so the server is playable out of the box.
    let code = server.registration().create_room().await;
    tracing::info!(%code, "demo room ready");

    server.run().await
}

fn builtin_questions() -> Vec<Question> {
    fn q(
        text: &str,
        category: &str,
        answer: &str,
        wrong: Option<[&str; 3]>,
        tier: u8,
    ) -> Question {
        Question {
            text: text.to_string(),
            category: category.to_string(),
            answer: answer.to_string(),
            wrong_answers: wrong
                .map(|w| w.map(str::to_string)),
            tier,
        }
    }

    vec![
        q(
            "What is the capital of France?",
            "Geography",
            "Paris",
            Some(["London", "Berlin", "Madrid"]),
            1,
        ),
        q(
            "How many legs does a spider have?",
            "Nature",
            "8",
            Some(["6", "10", "12"]),
            1,
        ),
        q(
            "What planet is known as the Red Planet?",
            "Space",
            "Mars",
            Some(["Venus", "Jupiter", "Mercury"]),
            1,
        ),
        q(
            "Which ocean is the largest?",
            "Geography",
            "Pacific",
            Some(["Atlantic", "Indian", "Arctic"]),
            2,
        ),
        q(
            "What gas do plants absorb from the atmosphere?",
            "Science",
            "Carbon dioxide",
            Some(["Oxygen", "Nitrogen", "Hydrogen"]),
            2,
        ),
        q(
            "Who painted the Mona Lisa?",
            "Art",
            "Leonardo da Vinci",
            Some(["Michelangelo", "Raphael", "Donatello"]),
            2,
        ),
        q(
            "What is the chemical symbol for gold?",
            "Science",
            "Au",
            Some(["Ag", "Gd", "Go"]),
            3,
        ),
        q(
            "In what year did the Berlin Wall fall?",
            "History",
            "1989",
            Some(["1987", "1991", "1993"]),
            3,
        ),
        q(
            "Which composer wrote the Moonlight Sonata?",
            "Music",
            "Beethoven",
            None,
            3,
        ),
        q(
            "What is the longest river in Asia?",
            "Geography",
            "Yangtze",
            Some(["Mekong", "Ganges", "Indus"]),
            4,
        ),
        q(
            "What particle carries the electromagnetic force?",
            "Science",
            "Photon",
            Some(["Gluon", "Electron", "Neutrino"]),
            4,
        ),
        q(
            "Which treaty ended the Thirty Years' War?",
            "History",
            "Peace of Westphalia",
            None,
            5,
        ),
        q(
            "What is the only metal that is liquid at room temperature?",
            "Science",
            "Mercury",
            Some(["Gallium", "Bromine", "Cesium"]),
            4,
        ),
        q(
            "Which mathematician proved Fermat's Last Theorem?",
            "Mathematics",
            "Andrew Wiles",
            None,
            5,
        ),
    ]
}
