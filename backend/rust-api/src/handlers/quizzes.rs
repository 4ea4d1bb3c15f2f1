use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{ApiError, InvalidStateError},
    extractors::AppJson,
    metrics::{record_answer, QUIZ_SESSIONS_TOTAL},
    models::{
        session::Progress, QuestionView, ResultSummary, SessionView, StartQuizRequest,
        SubmitAnswerRequest, SubmitAnswerResponse,
    },
    services::{quiz_session::Phase, session_store::SessionHandle, AppState},
};

fn lookup(state: &AppState, session_id: &str) -> Result<(Uuid, SessionHandle), ApiError> {
    let id = Uuid::parse_str(session_id).map_err(|_| ApiError::session_not_found(session_id))?;
    let handle = state
        .sessions
        .get(&id)
        .ok_or_else(|| ApiError::session_not_found(session_id))?;
    Ok((id, handle))
}

fn validate_start(req: &StartQuizRequest) -> Result<(), ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;
    if req.topic.trim().is_empty() {
        return Err(ApiError::bad_request("Validation error: topic is blank"));
    }
    Ok(())
}

/// POST /api/v1/quizzes - create a session and generate its questions
pub async fn create_quiz(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<StartQuizRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_start(&req)?;
    tracing::info!(
        "Creating quiz: topic={}, questions={}",
        req.topic,
        req.question_count
    );

    let (id, handle) = state.sessions.create();
    let mut session = handle.lock().await;
    session.start(&req.topic, req.question_count)?;
    session
        .ensure_questions(state.generator.as_ref())
        .await
        .map_err(|e| ApiError::from(e).with_session(id))?;

    Ok((
        StatusCode::CREATED,
        Json(SessionView::new(id, &session, state.sessions.created_at(&id))),
    ))
}

/// POST /api/v1/quizzes/:id/start - choose a new topic after a restart
pub async fn start_quiz(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    AppJson(req): AppJson<StartQuizRequest>,
) -> Result<Json<SessionView>, ApiError> {
    validate_start(&req)?;
    let (id, handle) = lookup(&state, &session_id)?;
    tracing::info!(
        "Starting quiz {}: topic={}, questions={}",
        id,
        req.topic,
        req.question_count
    );

    let mut session = handle.lock().await;
    session.start(&req.topic, req.question_count)?;
    session
        .ensure_questions(state.generator.as_ref())
        .await
        .map_err(|e| ApiError::from(e).with_session(id))?;

    Ok(Json(SessionView::new(
        id,
        &session,
        state.sessions.created_at(&id),
    )))
}

/// POST /api/v1/quizzes/:id/generate - resume question generation after a failure
pub async fn generate_questions(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let (id, handle) = lookup(&state, &session_id)?;
    let mut session = handle.lock().await;

    let added = session
        .ensure_questions(state.generator.as_ref())
        .await
        .map_err(|e| ApiError::from(e).with_session(id))?;
    tracing::info!("Resumed generation for quiz {}: {} new questions", id, added);

    Ok(Json(SessionView::new(
        id,
        &session,
        state.sessions.created_at(&id),
    )))
}

/// GET /api/v1/quizzes/:id
pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let (id, handle) = lookup(&state, &session_id)?;
    let session = handle.lock().await;
    Ok(Json(SessionView::new(
        id,
        &session,
        state.sessions.created_at(&id),
    )))
}

/// GET /api/v1/quizzes/:id/question
pub async fn current_question(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<QuestionView>, ApiError> {
    let (_, handle) = lookup(&state, &session_id)?;
    let session = handle.lock().await;
    let question = session.current_question()?;
    Ok(Json(QuestionView::new(session.current_index() + 1, question)))
}

/// POST /api/v1/quizzes/:id/answers
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    AppJson(req): AppJson<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, ApiError> {
    let (id, handle) = lookup(&state, &session_id)?;
    let mut session = handle.lock().await;

    let correct_answer = session.current_question()?.correct_answer().to_string();
    let outcome = session.submit_answer(&req.answer)?;
    record_answer(outcome.is_correct);

    tracing::info!(
        "Answer processed: quiz={}, question={}, correct={}, score={}",
        id,
        session.current_index() + 1,
        outcome.is_correct,
        session.score()
    );

    Ok(Json(SubmitAnswerResponse {
        correct: outcome.is_correct,
        correct_answer,
        explanation: outcome.explanation,
        score: session.score(),
        progress: Progress::from(session.progress()),
    }))
}

/// POST /api/v1/quizzes/:id/next
pub async fn next_question(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let (id, handle) = lookup(&state, &session_id)?;
    let mut session = handle.lock().await;

    session.advance()?;
    if session.phase() == Phase::Completed {
        QUIZ_SESSIONS_TOTAL.with_label_values(&["completed"]).inc();
        tracing::info!(
            "Quiz completed: {} with score {}/{}",
            id,
            session.score(),
            session.questions().len()
        );
    }

    Ok(Json(SessionView::new(
        id,
        &session,
        state.sessions.created_at(&id),
    )))
}

/// GET /api/v1/quizzes/:id/result
pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ResultSummary>, ApiError> {
    let (_, handle) = lookup(&state, &session_id)?;
    let session = handle.lock().await;

    if session.phase() != Phase::Completed {
        let (submitted, total) = session.progress();
        return Err(InvalidStateError::NotCompleted { submitted, total }.into());
    }

    Ok(Json(session.summary()?))
}

/// POST /api/v1/quizzes/:id/restart - back to topic selection
pub async fn restart_quiz(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let (id, handle) = lookup(&state, &session_id)?;
    let mut session = handle.lock().await;

    session.restart();
    QUIZ_SESSIONS_TOTAL.with_label_values(&["restarted"]).inc();
    tracing::info!("Quiz restarted: {}", id);

    Ok(Json(SessionView::new(
        id,
        &session,
        state.sessions.created_at(&id),
    )))
}

/// DELETE /api/v1/quizzes/:id
pub async fn delete_quiz(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = Uuid::parse_str(&session_id).map_err(|_| ApiError::session_not_found(&session_id))?;
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::session_not_found(&session_id))
    }
}
