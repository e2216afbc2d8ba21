//! Handler tests: the router is driven with `oneshot` against the in-memory
//! store, mock fetchers and mock completion backends.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use radar_api::{router, AppState};
use radar_common::{Llm, NewStory, NewsSource, Platform, Question, Quiz, Story};
use radar_scout::testing::{MockCompletion, MockFetcher};
use radar_scout::{NewsFetcher, ScriptGenerator};
use radar_store::testing::MemoryStore;
use radar_store::StoryStore;

// --- Helpers ---

fn app_with(
    store: &Arc<MemoryStore>,
    fetchers: Vec<Arc<dyn NewsFetcher>>,
    scripts: ScriptGenerator,
) -> Router {
    router(Arc::new(AppState {
        stories: store.clone(),
        scrape_log: store.clone(),
        quizzes: store.clone(),
        fetchers,
        scripts,
    }))
}

fn app(store: &Arc<MemoryStore>) -> Router {
    app_with(
        store,
        Vec::new(),
        ScriptGenerator::new(store.clone(), store.clone()),
    )
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(json!(null));
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn with_json(app: Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

fn story(title: &str, platform: Platform, score: i32, days_ago: i64) -> Story {
    Story {
        id: Uuid::new_v4(),
        platform,
        title: title.to_string(),
        content: format!("{title} body"),
        url: format!("https://news.test/{}", Uuid::new_v4()),
        date: Utc::now() - Duration::days(days_ago),
        category: None,
        score,
        created_at: Utc::now(),
    }
}

fn quiz_fixture() -> (Quiz, Vec<Question>) {
    let quiz = Quiz {
        id: Uuid::new_v4(),
        title: "Binary".into(),
        created_at: Utc::now(),
    };
    let questions = (0..2)
        .map(|i| Question {
            id: Uuid::new_v4(),
            quiz_id: quiz.id,
            question_text: format!("Question {i}"),
            choices: vec!["0".into(), "1".into()],
            correct_choice: 1,
        })
        .collect();
    (quiz, questions)
}

/// Story store whose writes blow up, to reach the handler's last-resort path.
struct PanickingStories;

#[async_trait]
impl StoryStore for PanickingStories {
    async fn upsert_stories(&self, _stories: &[NewStory]) -> Result<u64> {
        panic!("PanickingStories: connection pool poisoned");
    }

    async fn stories_since(&self, _since: DateTime<Utc>) -> Result<Vec<Story>> {
        Ok(Vec::new())
    }

    async fn list_stories(&self) -> Result<Vec<Story>> {
        Ok(Vec::new())
    }
}

// --- Health ---

#[tokio::test]
async fn health_check() {
    let store = Arc::new(MemoryStore::new());
    let response = app(&store)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}

// --- Scrape ---

#[tokio::test]
async fn scrape_reports_counts_with_partial_failure() {
    let store = Arc::new(MemoryStore::new());
    let fetchers: Vec<Arc<dyn NewsFetcher>> = vec![
        Arc::new(MockFetcher::titles(
            NewsSource::HackerNews,
            &[("A", "https://t/a"), ("B", "https://t/b")],
        )),
        Arc::new(MockFetcher::failing(NewsSource::Arxiv, "503")),
    ];
    let app = app_with(
        &store,
        fetchers,
        ScriptGenerator::new(store.clone(), store.clone()),
    );

    let (status, body) = get(app, "/api/scrape").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["sources"], 2);
    assert_eq!(body["successfulSources"], 1);
    assert_eq!(body["failedSources"], 1);
    assert!(body["timestamp"].is_string());
    assert_eq!(store.story_count(), 2);
}

#[tokio::test]
async fn scrape_soft_fails_with_200() {
    let store = Arc::new(MemoryStore::new());
    let fetchers: Vec<Arc<dyn NewsFetcher>> = vec![Arc::new(MockFetcher::titles(
        NewsSource::GoogleNews,
        &[("A", "https://t/a")],
    ))];
    let app = router(Arc::new(AppState {
        stories: Arc::new(PanickingStories),
        scrape_log: store.clone(),
        quizzes: store.clone(),
        fetchers,
        scripts: ScriptGenerator::new(store.clone(), store.clone()),
    }));

    let (status, body) = get(app, "/api/scrape").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Some sources failed to scrape");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("connection pool poisoned"));
    assert_eq!(store.log_sources(), vec!["GET-handler"]);
}

#[tokio::test]
async fn sequential_scrape_answers_success() {
    let store = Arc::new(MemoryStore::new());
    let fetchers: Vec<Arc<dyn NewsFetcher>> = vec![Arc::new(MockFetcher::titles(
        NewsSource::TheDecoder,
        &[("A", "https://t/a")],
    ))];
    let app = app_with(
        &store,
        fetchers,
        ScriptGenerator::new(store.clone(), store.clone()),
    );

    let (status, body) = with_json(app, "POST", "/api/scrape", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(store.story_count(), 1);
}

// --- Weekly script ---

#[tokio::test]
async fn unknown_llm_is_rejected_before_anything_runs() {
    let store = Arc::new(MemoryStore::new().with_stories(vec![
        story("a", Platform::Reddit, 1, 1),
        story("b", Platform::Reddit, 2, 1),
        story("c", Platform::Reddit, 3, 1),
    ]));

    let (status, body) = get(app(&store), "/api/generate-weekly-script?llm=gpt-9").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("gpt-9"));
    assert!(store.scripts().is_empty());
}

#[tokio::test]
async fn no_recent_news_is_404_and_too_few_is_400() {
    let store = Arc::new(MemoryStore::new().with_stories(vec![story("old", Platform::X, 9, 30)]));
    let (status, _) = get(app(&store), "/api/generate-weekly-script").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let store = Arc::new(MemoryStore::new().with_stories(vec![story("new", Platform::X, 9, 1)]));
    let (status, body) = get(app(&store), "/api/generate-weekly-script").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Not enough stories to generate a script");
}

#[tokio::test]
async fn all_backends_failing_returns_fallback_prompt() {
    let store = Arc::new(MemoryStore::new().with_stories(vec![
        story("Alpha", Platform::Reddit, 30, 1),
        story("Beta", Platform::HackerNews, 20, 2),
        story("Gamma", Platform::X, 10, 3),
    ]));
    let scripts = ScriptGenerator::new(store.clone(), store.clone())
        .with_backend(Llm::OpenAi, Arc::new(MockCompletion::failing("gpt", "401")))
        .with_backend(Llm::Zephyr, Arc::new(MockCompletion::failing("zephyr", "down")));
    let app = app_with(&store, Vec::new(), scripts);

    let (status, body) = get(app, "/api/generate-weekly-script").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scripts"].as_array().unwrap().len(), 2);
    assert_eq!(body["scripts"][0]["status"], "error");
    let prompt = body["fallback_prompt"].as_str().unwrap();
    for title in ["Alpha", "Beta", "Gamma"] {
        assert!(prompt.contains(title));
    }
    assert_eq!(store.scripts().len(), 2);
}

#[tokio::test]
async fn selected_backend_success_has_no_fallback() {
    let store = Arc::new(MemoryStore::new().with_stories(vec![
        story("Alpha", Platform::Reddit, 30, 1),
        story("Beta", Platform::HackerNews, 20, 2),
        story("Gamma", Platform::X, 10, 3),
    ]));
    let scripts = ScriptGenerator::new(store.clone(), store.clone())
        .with_backend(Llm::Mistral, Arc::new(MockCompletion::replying("mistral", "Hook!")));
    let app = app_with(&store, Vec::new(), scripts);

    let (status, body) = get(app, "/api/generate-weekly-script?llm=mistral").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scripts"][0]["llm"], "mistral");
    assert_eq!(body["scripts"][0]["script_text"], "Hook!");
    assert!(body.get("fallback_prompt").is_none());
}

// --- News ---

#[tokio::test]
async fn news_filters_and_sorts() {
    let store = Arc::new(MemoryStore::new().with_stories(vec![
        story("Reddit low", Platform::Reddit, 5, 1),
        story("Reddit high", Platform::Reddit, 50, 3),
        story("HN item", Platform::HackerNews, 99, 2),
    ]));

    let (status, body) = get(app(&store), "/api/news?platform=Reddit&sort=score").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Reddit high", "Reddit low"]);

    let (status, body) = get(app(&store), "/api/news?q=hn").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = get(app(&store), "/api/news?category=gossip").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// --- Quizzes ---

#[tokio::test]
async fn questions_hide_the_answer_key() {
    let (quiz, questions) = quiz_fixture();
    let store = Arc::new(MemoryStore::new().with_quiz(quiz.clone(), questions));

    let (status, body) = get(app(&store), &format!("/api/quizzes/{}/questions", quiz.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert!(body[0].get("correct_choice").is_none());

    let (status, _) = get(app(&store), &format!("/api/quizzes/{}/questions", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn progress_round_trip() {
    let (quiz, questions) = quiz_fixture();
    let store = Arc::new(MemoryStore::new().with_quiz(quiz.clone(), questions.clone()));
    let uri = format!("/api/quizzes/{}/progress/S-1", quiz.id);

    let (status, _) = get(app(&store), &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let answers = json!({ questions[0].id.to_string(): 1 });
    let (status, _) = with_json(
        app(&store),
        "PUT",
        &uri,
        json!({ "student_name": "Ada", "answers": answers, "current_question": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(app(&store), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_question"], 1);
    assert_eq!(body["student_name"], "Ada");
}

#[tokio::test]
async fn progress_must_fit_the_quiz() {
    let (quiz, questions) = quiz_fixture();
    let store = Arc::new(MemoryStore::new().with_quiz(quiz.clone(), questions.clone()));
    let uri = format!("/api/quizzes/{}/progress/S-1", quiz.id);

    let past_the_end = json!({ "student_name": "Ada", "answers": {}, "current_question": 2 });
    let stranger = json!({
        "student_name": "Ada",
        "answers": { Uuid::new_v4().to_string(): 0 },
        "current_question": 0,
    });
    let out_of_range = json!({
        "student_name": "Ada",
        "answers": { questions[0].id.to_string(): 9 },
        "current_question": 0,
    });
    for body in [past_the_end, stranger, out_of_range] {
        let (status, _) = with_json(app(&store), "PUT", &uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert!(store.progress_writes().is_empty());

    let (status, _) = with_json(
        app(&store),
        "PUT",
        &format!("/api/quizzes/{}/progress/S-1", Uuid::new_v4()),
        json!({ "student_name": "Ada", "answers": {}, "current_question": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submission_is_created_once() {
    let (quiz, questions) = quiz_fixture();
    let store = Arc::new(MemoryStore::new().with_quiz(quiz.clone(), questions.clone()));
    let uri = format!("/api/quizzes/{}/submissions", quiz.id);
    let body = json!({
        "name": "Ada",
        "admission_number": "S-1",
        "answers": { questions[0].id.to_string(): 1, questions[1].id.to_string(): 0 },
    });

    let (status, created) = with_json(app(&store), "POST", &uri, body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["score"], 50);

    let (status, _) = with_json(app(&store), "POST", &uri, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(store.submissions().len(), 1);

    let (status, view) = get(app(&store), &format!("{uri}/S-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["submitted"], true);
    assert_eq!(view["revision"].as_array().unwrap().len(), 2);

    let (status, _) = with_json(
        app(&store),
        "PUT",
        &format!("/api/quizzes/{}/progress/S-1", quiz.id),
        json!({ "student_name": "Ada", "answers": {}, "current_question": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_submissions_are_rejected_without_writing() {
    let (quiz, questions) = quiz_fixture();
    let store = Arc::new(MemoryStore::new().with_quiz(quiz.clone(), questions.clone()));
    let uri = format!("/api/quizzes/{}/submissions", quiz.id);

    let incomplete = json!({
        "name": "Ada",
        "admission_number": "S-1",
        "answers": { questions[0].id.to_string(): 1 },
    });
    let nameless = json!({
        "name": " ",
        "admission_number": "S-1",
        "answers": { questions[0].id.to_string(): 1, questions[1].id.to_string(): 0 },
    });
    let out_of_range = json!({
        "name": "Ada",
        "admission_number": "S-1",
        "answers": { questions[0].id.to_string(): 1, questions[1].id.to_string(): 5 },
    });

    for body in [incomplete, nameless, out_of_range] {
        let (status, _) = with_json(app(&store), "POST", &uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert!(store.submissions().is_empty());
}

#[tokio::test]
async fn leaderboard_ranks_by_score() {
    let (quiz, questions) = quiz_fixture();
    let store = Arc::new(MemoryStore::new().with_quiz(quiz.clone(), questions.clone()));
    let uri = format!("/api/quizzes/{}/submissions", quiz.id);

    for (adm, first, second) in [("S-1", 0, 0), ("S-2", 1, 1), ("S-3", 1, 0)] {
        let body = json!({
            "name": adm,
            "admission_number": adm,
            "answers": { questions[0].id.to_string(): first, questions[1].id.to_string(): second },
        });
        let (status, _) = with_json(app(&store), "POST", &uri, body).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, board) = get(app(&store), &format!("/api/quizzes/{}/leaderboard", quiz.id)).await;

    assert_eq!(status, StatusCode::OK);
    let order: Vec<&str> = board
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["admission_number"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["S-2", "S-3", "S-1"]);
}
