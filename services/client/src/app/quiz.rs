//! services/client/src/app/quiz.rs

use chaekgoeul_core::{
    domain::{BookId, Difficulty, QuizAnswer, QuizQuestion, QuizRequest, QuizResult, QuizType},
    ports::{PortError, PortResult, QuizApi},
};
use std::sync::Arc;
use tracing::{error, info};

pub struct QuizService {
    api: Arc<dyn QuizApi>,
}

impl QuizService {
    pub fn new(api: Arc<dyn QuizApi>) -> Self {
        Self { api }
    }

    pub async fn generate(
        &self,
        book_id: BookId,
        quiz_type: QuizType,
        difficulty: Difficulty,
    ) -> PortResult<Vec<QuizQuestion>> {
        if book_id <= 0 {
            return Err(PortError::Validation(format!("invalid book id {}", book_id)));
        }
        let request = QuizRequest {
            book_id,
            quiz_type,
            difficulty,
        };
        let questions = self.api.generate_quiz(&request).await.map_err(|e| {
            error!(book_id, "Quiz generation failed: {}", e);
            e
        })?;
        info!(book_id, count = questions.len(), "Quiz generated.");
        Ok(questions)
    }

    pub async fn submit(&self, answers: &[QuizAnswer]) -> PortResult<QuizResult> {
        if answers.is_empty() {
            return Err(PortError::Validation("no answers to submit".to_string()));
        }
        self.api.submit_quiz(answers).await.map_err(|e| {
            error!("Quiz submission failed: {}", e);
            e
        })
    }
}
