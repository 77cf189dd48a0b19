mod common;

use chaekgoeul_core::{
    domain::{ApplicationStatus, Credentials, Difficulty, QuizAnswer, QuizType, Scene},
    ports::{ApplicationApi, AuthApi, BookApi, KeyValueStore, PortError, SummaryApi},
};
use client_lib::adapters::HttpApi;
use client_lib::app::applications::ApplicationService;
use client_lib::app::catalog::{BookCatalog, RECENT_SEARCHES_KEY};
use client_lib::app::quiz::QuizService;
use common::{expired_token, session, valid_token, FakeBookApi, Session};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests sent without credentials.
struct NoAuthorization;

impl Match for NoAuthorization {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

fn api_for(server: &MockServer, s: &Session) -> HttpApi {
    HttpApi::new(
        server.uri(),
        Duration::from_secs(5),
        s.guard.clone(),
        s.navigator.clone(),
    )
    .unwrap()
}

#[tokio::test]
async fn valid_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    let s = session();
    let token = valid_token();
    s.tokens.save(&token, None).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/book/popular"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "소년이 온다", "author": "한강", "likeCount": 12}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let books = api_for(&server, &s).popular_books().await.unwrap();
    assert_eq!(books[0].title, "소년이 온다");
    assert_eq!(books[0].like_count, Some(12));
}

#[tokio::test]
async fn expired_token_is_never_sent() {
    let server = MockServer::start().await;
    let s = session();
    s.tokens.save(&expired_token(), None).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/book/recent"))
        .and(NoAuthorization)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let books = api_for(&server, &s).recent_books().await.unwrap();
    assert!(books.is_empty());
    assert_eq!(s.tokens.access_token().await.unwrap(), None);
}

#[tokio::test]
async fn unauthorized_response_clears_the_session() {
    let server = MockServer::start().await;
    let s = session();
    s.tokens.save(&valid_token(), None).await.unwrap();
    s.navigator.navigate("/mypage").await.unwrap();

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = api_for(&server, &s).me().await.unwrap_err();

    assert_eq!(err, PortError::Unauthorized);
    assert_eq!(s.tokens.access_token().await.unwrap(), None);
    assert_eq!(s.navigator.current_path().await, "/");
    assert_eq!(
        s.navigator.take_redirect_path().await.unwrap().as_deref(),
        Some("/mypage")
    );
}

#[tokio::test]
async fn forbidden_is_treated_like_unauthorized() {
    let server = MockServer::start().await;
    let s = session();
    s.tokens.save(&valid_token(), None).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/apply/all"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = api_for(&server, &s).list_applications().await.unwrap_err();
    assert_eq!(err, PortError::Unauthorized);
    assert_eq!(s.tokens.access_token().await.unwrap(), None);
}

#[tokio::test]
async fn other_statuses_map_to_port_errors() {
    let server = MockServer::start().await;
    let s = session();

    Mock::given(method("GET"))
        .and(path("/book/banner"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no banner"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/book/popular"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let api = api_for(&server, &s);
    assert_eq!(
        api.banner_book().await.unwrap_err(),
        PortError::NotFound("no banner".to_string())
    );
    assert!(matches!(
        api.popular_books().await.unwrap_err(),
        PortError::Unexpected(msg) if msg.contains("boom")
    ));
}

#[tokio::test]
async fn login_reads_the_access_token() {
    let server = MockServer::start().await;
    let s = session();

    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(body_json(json!({"username": "reader", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "abc.def.ghi"})))
        .mount(&server)
        .await;

    let token = api_for(&server, &s)
        .login(&Credentials {
            username: "reader".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(token, "abc.def.ghi");
}

#[tokio::test]
async fn liked_list_accepts_both_shapes() {
    let server = MockServer::start().await;
    let s = session();
    let api = api_for(&server, &s);

    let ids_only = Mock::given(method("GET"))
        .and(path("/book/like/view"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount_as_scoped(&server)
        .await;
    let liked = api.liked_books().await.unwrap();
    assert_eq!(liked.ids, vec![1, 2, 3]);
    assert!(liked.books.is_empty());
    drop(ids_only);

    Mock::given(method("GET"))
        .and(path("/book/like/view"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 4, "title": "파친코"}])),
        )
        .mount(&server)
        .await;
    let liked = api.liked_books().await.unwrap();
    assert_eq!(liked.ids, vec![4]);
    assert_eq!(liked.books[0].title, "파친코");
}

#[tokio::test]
async fn toggle_accepts_bare_and_wrapped_flags() {
    let server = MockServer::start().await;
    let s = session();
    let api = api_for(&server, &s);

    Mock::given(method("POST"))
        .and(path("/book/like/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/book/like/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"liked": false})))
        .mount(&server)
        .await;

    assert!(api.toggle_like(7).await.unwrap());
    assert!(!api.toggle_like(8).await.unwrap());
}

#[tokio::test]
async fn summary_endpoints_send_the_book_id() {
    let server = MockServer::start().await;
    let s = session();
    let api = api_for(&server, &s);

    Mock::given(method("POST"))
        .and(path("/summaries"))
        .and(body_json(json!({"bookId": 7})))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/summaries/lookup"))
        .and(body_json(json!({"bookId": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"page": 1, "content": "첫 장면", "imageUrl": "https://img.example/1.png"},
            {"page": 2, "content": "둘째 장면"}
        ])))
        .mount(&server)
        .await;

    api.request_summary(7).await.unwrap();
    let scenes = api.lookup_summary(7).await.unwrap();
    assert_eq!(
        scenes,
        vec![
            Scene {
                page: 1,
                content: "첫 장면".to_string(),
                image_url: Some("https://img.example/1.png".to_string()),
            },
            Scene {
                page: 2,
                content: "둘째 장면".to_string(),
                image_url: None,
            },
        ]
    );
}

#[tokio::test]
async fn non_array_lookup_reads_as_pending() {
    let server = MockServer::start().await;
    let s = session();

    Mock::given(method("POST"))
        .and(path("/summaries/lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "PENDING"})))
        .mount(&server)
        .await;

    assert!(api_for(&server, &s).lookup_summary(7).await.unwrap().is_empty());
}

#[tokio::test]
async fn reject_sends_the_reason() {
    let server = MockServer::start().await;
    let s = session();

    Mock::given(method("PATCH"))
        .and(path("/apply/3/reject"))
        .and(body_json(json!({"reason": "중복 신청"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "title": "희랍어 시간", "status": "REJECTED", "rejectReason": "중복 신청"
        })))
        .mount(&server)
        .await;

    let application = api_for(&server, &s)
        .reject_application(3, "중복 신청")
        .await
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Rejected);
    assert_eq!(application.reject_reason.as_deref(), Some("중복 신청"));
}

#[tokio::test]
async fn failed_search_shows_no_results_but_is_remembered() {
    let server = MockServer::start().await;
    let s = session();

    Mock::given(method("GET"))
        .and(path("/book/search"))
        .and(query_param("query", "어린 왕자"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = BookCatalog::new(Arc::new(api_for(&server, &s)), s.durable.clone());
    assert!(catalog.search("  어린 왕자 ").await.unwrap().is_empty());
    assert_eq!(catalog.recent_searches().await.unwrap(), vec!["어린 왕자".to_string()]);
    assert!(s.durable.get(RECENT_SEARCHES_KEY).await.unwrap().is_some());

    assert!(matches!(
        catalog.search("   ").await,
        Err(PortError::Validation(_))
    ));
}

#[tokio::test]
async fn recent_searches_can_be_forgotten_and_cleared() {
    let s = session();
    let catalog = BookCatalog::new(Arc::new(FakeBookApi::default()), s.durable.clone());

    catalog.search("어린 왕자").await.unwrap();
    catalog.search("데미안").await.unwrap();
    catalog.search("모모").await.unwrap();
    assert_eq!(
        catalog.recent_searches().await.unwrap(),
        vec!["모모".to_string(), "데미안".to_string(), "어린 왕자".to_string()]
    );

    catalog.forget_search(" 데미안 ").await.unwrap();
    catalog.forget_search("없는 검색어").await.unwrap();
    assert_eq!(
        catalog.recent_searches().await.unwrap(),
        vec!["모모".to_string(), "어린 왕자".to_string()]
    );

    catalog.clear_recent_searches().await.unwrap();
    assert!(catalog.recent_searches().await.unwrap().is_empty());
    assert!(s.durable.get(RECENT_SEARCHES_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn quiz_round_trip_uses_backend_shapes() {
    let server = MockServer::start().await;
    let s = session();

    Mock::given(method("POST"))
        .and(path("/quiz/generate"))
        .and(body_json(json!({"bookId": 7, "type": "OX", "difficulty": "EASY"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"quizId": 31, "question": "주인공은 여우를 만났다.", "options": ["O", "X"]}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/quiz/submit/batch"))
        .and(body_json(json!([{"quizId": 31, "answer": "O"}])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "score": 1, "total": 1, "results": [{"quizId": 31, "correct": true}]
        })))
        .mount(&server)
        .await;

    let quiz = QuizService::new(Arc::new(api_for(&server, &s)));
    let questions = quiz.generate(7, QuizType::Ox, Difficulty::Easy).await.unwrap();
    assert_eq!(questions[0].options, vec!["O".to_string(), "X".to_string()]);

    let result = quiz
        .submit(&[QuizAnswer {
            quiz_id: 31,
            answer: "O".to_string(),
        }])
        .await
        .unwrap();
    assert_eq!(result.score, 1);
    assert!(result.results[0].correct);

    assert!(matches!(quiz.submit(&[]).await, Err(PortError::Validation(_))));
    assert!(matches!(
        quiz.generate(0, QuizType::Ox, Difficulty::Easy).await,
        Err(PortError::Validation(_))
    ));
}

#[tokio::test]
async fn applications_are_listed_and_approved() {
    let server = MockServer::start().await;
    let s = session();

    Mock::given(method("GET"))
        .and(path("/apply/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "title": "희랍어 시간", "status": "PENDING"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/apply/3/approve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "title": "희랍어 시간", "status": "APPROVED"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let applications = ApplicationService::new(Arc::new(api_for(&server, &s)));
    assert_eq!(applications.list().await.unwrap()[0].status, ApplicationStatus::Pending);
    assert_eq!(
        applications.approve(3).await.unwrap().status,
        ApplicationStatus::Approved
    );
    assert!(matches!(
        applications.reject(3, "  ").await,
        Err(PortError::Validation(_))
    ));
}
